//! Scene Module
//!
//! The camera core never owns scene objects. It reads their transforms through
//! the [`SceneProvider`] trait and refers to them by [`ObjectId`].
//!
//! [`SceneGraph`] is a small in-memory implementation with parented frames,
//! used by the demo binary and the tests. A moving platform is modelled as a
//! parent frame that the avatar is attached to (a "subworld").
//!
//! Coordinate convention: Z is up, an object's forward ("view") axis is its
//! local +Y and its right axis is local +X.

use std::collections::HashMap;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Handle to an object owned by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// Result of a line-of-sight probe that hit a camera blocker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LosHit {
    /// World-space hit point
    pub point: Vec3,
    /// Surface normal at the hit point
    pub normal: Vec3,
}

/// Read-only view of the scene as seen by the camera system.
///
/// Every query may return `None` when the object has not been loaded yet.
/// Camera code treats that as "try again next frame".
pub trait SceneProvider {
    /// Local-to-world matrix of an object.
    fn local_to_world(&self, id: ObjectId) -> Option<Mat4>;

    /// World-to-local matrix of an object.
    fn world_to_local(&self, id: ObjectId) -> Option<Mat4> {
        self.local_to_world(id).map(|m| m.inverse())
    }

    /// The local player's avatar, if one is loaded.
    fn local_player(&self) -> Option<ObjectId>;

    /// The subworld frame the local avatar is currently parented to.
    fn avatar_subworld(&self) -> Option<ObjectId> {
        None
    }

    /// Find an object by name (case-insensitive).
    fn find_object(&self, _name: &str) -> Option<ObjectId> {
        None
    }

    /// Find a direct child of `parent` by name (case-insensitive).
    fn find_child(&self, _parent: ObjectId, _name: &str) -> Option<ObjectId> {
        None
    }

    /// Probe for camera blockers between `from` and `to`, returning the hit
    /// closest to `from`.
    fn line_of_sight(&self, _from: Vec3, _to: Vec3) -> Option<LosHit> {
        None
    }
}

/// Translation part of a matrix.
#[inline]
pub fn translation(m: &Mat4) -> Vec3 {
    m.w_axis.truncate()
}

/// Forward ("view") axis of a matrix (local +Y).
#[inline]
pub fn view_axis(m: &Mat4) -> Vec3 {
    m.y_axis.truncate()
}

/// Right axis of a matrix (local +X).
#[inline]
pub fn right_axis(m: &Mat4) -> Vec3 {
    m.x_axis.truncate()
}

/// Up axis of a matrix (local +Z).
#[inline]
pub fn up_axis(m: &Mat4) -> Vec3 {
    m.z_axis.truncate()
}

/// A node in the in-memory scene graph.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    /// Transform relative to the parent (or the world when unparented)
    pub local: Mat4,
    pub parent: Option<ObjectId>,
}

/// Spherical camera blocker used for line-of-sight probes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blocker {
    pub center: Vec3,
    pub radius: f32,
}

/// Minimal scene graph implementing [`SceneProvider`].
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: HashMap<ObjectId, SceneNode>,
    next_id: u32,
    local_player: Option<ObjectId>,
    blockers: Vec<Blocker>,
}

impl SceneGraph {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an unparented object.
    pub fn spawn(&mut self, name: &str, transform: Mat4) -> ObjectId {
        self.insert(name, transform, None)
    }

    /// Add an object parented to `parent`; `local` is relative to the parent.
    pub fn spawn_child(&mut self, parent: ObjectId, name: &str, local: Mat4) -> ObjectId {
        self.insert(name, local, Some(parent))
    }

    fn insert(&mut self, name: &str, local: Mat4, parent: Option<ObjectId>) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            SceneNode {
                name: name.to_string(),
                local,
                parent,
            },
        );
        id
    }

    /// Remove an object. Children are re-rooted at their current world pose.
    pub fn despawn(&mut self, id: ObjectId) {
        let children: Vec<ObjectId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.parent == Some(id))
            .map(|(&child, _)| child)
            .collect();
        for child in children {
            let world = self.local_to_world(child).unwrap_or(Mat4::IDENTITY);
            if let Some(node) = self.nodes.get_mut(&child) {
                node.local = world;
                node.parent = None;
            }
        }
        self.nodes.remove(&id);
        if self.local_player == Some(id) {
            self.local_player = None;
        }
    }

    pub fn node(&self, id: ObjectId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    /// Look an object up by name (case-insensitive).
    pub fn find_by_name(&self, name: &str) -> Option<ObjectId> {
        self.nodes
            .iter()
            .find(|(_, n)| n.name.eq_ignore_ascii_case(name))
            .map(|(&id, _)| id)
    }

    /// Replace an object's parent-relative transform.
    pub fn set_local(&mut self, id: ObjectId, local: Mat4) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.local = local;
        }
    }

    /// Move an object by `delta` in its parent's frame.
    pub fn translate(&mut self, id: ObjectId, delta: Vec3) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.local = Mat4::from_translation(delta) * node.local;
        }
    }

    /// Re-parent an object, keeping its world pose.
    pub fn set_parent(&mut self, id: ObjectId, parent: Option<ObjectId>) {
        let Some(world) = self.local_to_world(id) else {
            return;
        };
        let local = match parent.and_then(|p| self.local_to_world(p)) {
            Some(parent_world) => parent_world.inverse() * world,
            None => world,
        };
        if let Some(node) = self.nodes.get_mut(&id) {
            node.local = local;
            node.parent = parent;
        }
    }

    pub fn set_local_player(&mut self, id: Option<ObjectId>) {
        self.local_player = id;
    }

    pub fn add_blocker(&mut self, center: Vec3, radius: f32) {
        self.blockers.push(Blocker { center, radius });
    }

    pub fn clear_blockers(&mut self) {
        self.blockers.clear();
    }
}

impl SceneProvider for SceneGraph {
    fn local_to_world(&self, id: ObjectId) -> Option<Mat4> {
        let mut node = self.nodes.get(&id)?;
        let mut world = node.local;
        // Depth guard keeps a malformed parent cycle from spinning forever.
        let mut depth = 0;
        while let Some(parent) = node.parent {
            node = self.nodes.get(&parent)?;
            world = node.local * world;
            depth += 1;
            if depth > 64 {
                return None;
            }
        }
        Some(world)
    }

    fn local_player(&self) -> Option<ObjectId> {
        self.local_player
    }

    fn find_object(&self, name: &str) -> Option<ObjectId> {
        self.find_by_name(name)
    }

    fn avatar_subworld(&self) -> Option<ObjectId> {
        self.nodes.get(&self.local_player?)?.parent
    }

    fn find_child(&self, parent: ObjectId, name: &str) -> Option<ObjectId> {
        self.nodes
            .iter()
            .find(|(_, n)| n.parent == Some(parent) && n.name.eq_ignore_ascii_case(name))
            .map(|(&id, _)| id)
    }

    fn line_of_sight(&self, from: Vec3, to: Vec3) -> Option<LosHit> {
        let segment = to - from;
        let length = segment.length();
        if length <= f32::EPSILON {
            return None;
        }
        let dir = segment / length;

        let mut closest: Option<(f32, LosHit)> = None;
        for blocker in &self.blockers {
            // Ray-sphere intersection, nearest root only
            let oc = from - blocker.center;
            let b = oc.dot(dir);
            let c = oc.length_squared() - blocker.radius * blocker.radius;
            let disc = b * b - c;
            if disc < 0.0 {
                continue;
            }
            let t = -b - disc.sqrt();
            if t < 0.0 || t > length {
                continue;
            }
            if closest.as_ref().is_some_and(|(best, _)| *best <= t) {
                continue;
            }
            let point = from + dir * t;
            let normal = (point - blocker.center).normalize_or_zero();
            closest = Some((t, LosHit { point, normal }));
        }
        closest.map(|(_, hit)| hit)
    }
}
