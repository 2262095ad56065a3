//! Handle-addressed transform storage and the per-frame update.

use super::handle::TransformId;
use super::mirror::TransformMirror;
use super::parse::{self, TransformParseError};
use crate::math::{Matrix4, Quaternion, Vector3};

/// Slot flag: the slot is free for reuse.
const FLAG_FREE: u32 = 1;

/// Sentinel parent index for roots.
const INVALID_INDEX: u32 = u32::MAX;

/// Capacity always grows in multiples of this.
const GROWTH_ALIGN: usize = 8;

/// Structure-of-arrays transform storage with a depth-ordered dirty
/// list and an optional GPU mirror.
///
/// All operations are expected on a single thread; mutations applied
/// before [`TransformSystem::update`] are visible in the mirror after
/// it returns.
pub struct TransformSystem {
    position: Vec<Vector3>,
    rotation: Vec<Quaternion>,
    scale: Vec<Vector3>,
    local: Vec<Matrix4>,
    world: Vec<Matrix4>,
    parent: Vec<u32>,
    depth: Vec<u8>,
    flags: Vec<u32>,
    user: Vec<u64>,
    /// Handles whose local matrix (and world subtree) must be rebuilt.
    dirty: Vec<u32>,
    allocated: u32,
    mirror: Option<Box<dyn TransformMirror>>,
    mirror_warned: bool,
}

impl Default for TransformSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformSystem {
    /// Create a system with the minimum capacity. Slot 0 is claimed as
    /// the engine default transform and is never handed out.
    pub fn new() -> Self {
        let mut system = Self {
            position: Vec::new(),
            rotation: Vec::new(),
            scale: Vec::new(),
            local: Vec::new(),
            world: Vec::new(),
            parent: Vec::new(),
            depth: Vec::new(),
            flags: Vec::new(),
            user: Vec::new(),
            dirty: Vec::new(),
            allocated: 0,
            mirror: None,
            mirror_warned: false,
        };
        system.ensure_allocated(GROWTH_ALIGN);
        system.flags[0] &= !FLAG_FREE;
        system.allocated = 1;
        system
    }

    /// Attach the GPU mirror that receives the world-matrix block after
    /// every update.
    pub fn attach_mirror(&mut self, mirror: Box<dyn TransformMirror>) {
        self.mirror = Some(mirror);
    }

    /// Number of live slots, including the reserved default slot.
    #[inline]
    pub fn allocated(&self) -> u32 {
        self.allocated
    }

    /// Total slots across all columns.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.flags.len()
    }

    /// Number of handles currently waiting for recomputation.
    #[inline]
    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// The cached world-matrix block, indexed by handle.
    #[inline]
    pub fn world_matrices(&self) -> &[Matrix4] {
        &self.world
    }

    /// Log `allocated/capacity`, for the debug console.
    pub fn dump(&self) {
        log::info!(
            "transform system: {}/{} allocated",
            self.allocated,
            self.capacity()
        );
    }

    // =========== Allocation ===========

    /// Grow every column to hold at least `n` slots, rounded up to a
    /// multiple of 8. Growth is monotonic; existing contents are kept.
    pub fn ensure_allocated(&mut self, n: usize) {
        let target = n.div_ceil(GROWTH_ALIGN) * GROWTH_ALIGN;
        if target <= self.flags.len() {
            return;
        }
        self.position.resize(target, Vector3::ZERO);
        self.rotation.resize(target, Quaternion::IDENTITY);
        self.scale.resize(target, Vector3::ONE);
        self.local.resize(target, Matrix4::IDENTITY);
        self.world.resize(target, Matrix4::IDENTITY);
        self.parent.resize(target, INVALID_INDEX);
        self.depth.resize(target, 0);
        self.flags.resize(target, FLAG_FREE);
        self.user.resize(target, 0);
    }

    fn handle_create(&mut self) -> u32 {
        for i in 1..self.flags.len() {
            if self.flags[i] & FLAG_FREE != 0 {
                self.activate_slot(i);
                return i as u32;
            }
        }
        let first_new = self.flags.len();
        self.ensure_allocated(first_new * 2);
        self.activate_slot(first_new);
        first_new as u32
    }

    fn activate_slot(&mut self, i: usize) {
        self.position[i] = Vector3::ZERO;
        self.rotation[i] = Quaternion::IDENTITY;
        self.scale[i] = Vector3::ONE;
        self.local[i] = Matrix4::IDENTITY;
        self.world[i] = Matrix4::IDENTITY;
        self.parent[i] = INVALID_INDEX;
        self.depth[i] = 0;
        self.user[i] = 0;
        self.flags[i] &= !FLAG_FREE;
        self.allocated += 1;
    }

    /// Resolve a handle to its slot, warning on misuse.
    fn check(&self, id: TransformId, op: &str) -> Option<usize> {
        let i = id.index() as usize;
        if !id.is_valid() || i >= self.flags.len() || self.flags[i] & FLAG_FREE != 0 {
            log::warn!("transform {op}: invalid handle {id}");
            return None;
        }
        Some(i)
    }

    // =========== Creation ===========

    /// Allocate an identity transform. The fresh slot's matrices are
    /// already current, so it is not marked dirty.
    pub fn create(&mut self, user: u64) -> TransformId {
        let i = self.handle_create();
        self.user[i as usize] = user;
        TransformId::from_index(i)
    }

    /// Allocate a transform at a position.
    pub fn from_position(&mut self, position: Vector3, user: u64) -> TransformId {
        let id = self.create(user);
        self.position[id.index() as usize] = position;
        self.dirty_add(id.index());
        id
    }

    /// Allocate a transform with a rotation.
    pub fn from_rotation(&mut self, rotation: Quaternion, user: u64) -> TransformId {
        let id = self.create(user);
        self.rotation[id.index() as usize] = rotation;
        self.dirty_add(id.index());
        id
    }

    /// Allocate a transform with a position and rotation.
    pub fn from_position_rotation(
        &mut self,
        position: Vector3,
        rotation: Quaternion,
        user: u64,
    ) -> TransformId {
        let id = self.create(user);
        let i = id.index() as usize;
        self.position[i] = position;
        self.rotation[i] = rotation;
        self.dirty_add(id.index());
        id
    }

    /// Allocate a transform with full TRS.
    pub fn from_position_rotation_scale(
        &mut self,
        position: Vector3,
        rotation: Quaternion,
        scale: Vector3,
        user: u64,
    ) -> TransformId {
        let id = self.create(user);
        let i = id.index() as usize;
        self.position[i] = position;
        self.rotation[i] = rotation;
        self.scale[i] = scale;
        self.dirty_add(id.index());
        id
    }

    /// Allocate a copy of another transform's local TRS. An invalid
    /// original yields an identity transform.
    pub fn clone_of(&mut self, original: TransformId, user: u64) -> TransformId {
        let src = self.check(original, "clone_of");
        let id = self.create(user);
        if let Some(s) = src {
            let i = id.index() as usize;
            self.position[i] = self.position[s];
            self.rotation[i] = self.rotation[s];
            self.scale[i] = self.scale[s];
        }
        self.dirty_add(id.index());
        id
    }

    /// Allocate a transform from the textual form: ten floats
    /// `"px py pz qx qy qz qw sx sy sz"`, or nine floats with the middle
    /// three as XYZ Euler degrees. No handle is allocated on error.
    pub fn from_str_form(
        &mut self,
        s: &str,
        user: u64,
    ) -> Result<TransformId, TransformParseError> {
        let (position, rotation, scale) = parse::parse_trs(s)?;
        Ok(self.from_position_rotation_scale(position, rotation, scale, user))
    }

    /// Format a transform's local TRS as the canonical ten-float form.
    /// Invalid handles yield the identity form.
    pub fn to_str_form(&self, id: TransformId) -> String {
        match self.check(id, "to_str_form") {
            Some(i) => parse::format_trs(&self.position[i], &self.rotation[i], &self.scale[i]),
            None => parse::format_trs(&Vector3::ZERO, &Quaternion::IDENTITY, &Vector3::ONE),
        }
    }

    /// Release a handle. Pending dirty entries for the slot are ignored
    /// by the next update.
    pub fn destroy(&mut self, id: TransformId) {
        let Some(i) = self.check(id, "destroy") else {
            return;
        };
        self.flags[i] |= FLAG_FREE;
        self.parent[i] = INVALID_INDEX;
        self.depth[i] = 0;
        self.user[i] = 0;
        self.allocated -= 1;
    }

    // =========== Mutators ===========

    /// Set the local position.
    pub fn position_set(&mut self, id: TransformId, position: Vector3) {
        let Some(i) = self.check(id, "position_set") else {
            return;
        };
        self.position[i] = position;
        self.mark_subtree_dirty(i as u32);
    }

    /// Add a translation to the local position.
    pub fn translate(&mut self, id: TransformId, translation: Vector3) {
        let Some(i) = self.check(id, "translate") else {
            return;
        };
        self.position[i] += translation;
        self.mark_subtree_dirty(i as u32);
    }

    /// Set the local rotation.
    pub fn rotation_set(&mut self, id: TransformId, rotation: Quaternion) {
        let Some(i) = self.check(id, "rotation_set") else {
            return;
        };
        self.rotation[i] = rotation;
        self.mark_subtree_dirty(i as u32);
    }

    /// Apply a rotation on top of the local rotation.
    pub fn rotate(&mut self, id: TransformId, rotation: Quaternion) {
        let Some(i) = self.check(id, "rotate") else {
            return;
        };
        self.rotation[i] = self.rotation[i].multiply(&rotation).normalized();
        self.mark_subtree_dirty(i as u32);
    }

    /// Set the local scale.
    pub fn scale_set(&mut self, id: TransformId, scale: Vector3) {
        let Some(i) = self.check(id, "scale_set") else {
            return;
        };
        self.scale[i] = scale;
        self.mark_subtree_dirty(i as u32);
    }

    /// Multiply the local scale component-wise.
    pub fn scale_by(&mut self, id: TransformId, scale: Vector3) {
        let Some(i) = self.check(id, "scale_by") else {
            return;
        };
        self.scale[i] = self.scale[i].multiply(&scale);
        self.mark_subtree_dirty(i as u32);
    }

    /// Set position and rotation together.
    pub fn position_rotation_set(
        &mut self,
        id: TransformId,
        position: Vector3,
        rotation: Quaternion,
    ) {
        let Some(i) = self.check(id, "position_rotation_set") else {
            return;
        };
        self.position[i] = position;
        self.rotation[i] = rotation;
        self.mark_subtree_dirty(i as u32);
    }

    /// Set the full local TRS together.
    pub fn position_rotation_scale_set(
        &mut self,
        id: TransformId,
        position: Vector3,
        rotation: Quaternion,
        scale: Vector3,
    ) {
        let Some(i) = self.check(id, "position_rotation_scale_set") else {
            return;
        };
        self.position[i] = position;
        self.rotation[i] = rotation;
        self.scale[i] = scale;
        self.mark_subtree_dirty(i as u32);
    }

    /// Translate and rotate in one step.
    pub fn translate_rotate(
        &mut self,
        id: TransformId,
        translation: Vector3,
        rotation: Quaternion,
    ) {
        let Some(i) = self.check(id, "translate_rotate") else {
            return;
        };
        self.position[i] += translation;
        self.rotation[i] = self.rotation[i].multiply(&rotation).normalized();
        self.mark_subtree_dirty(i as u32);
    }

    /// Replace the user payload.
    pub fn user_set(&mut self, id: TransformId, user: u64) {
        let Some(i) = self.check(id, "user_set") else {
            return;
        };
        self.user[i] = user;
        self.mark_subtree_dirty(i as u32);
    }

    /// Reparent a transform. Pass [`TransformId::INVALID`] to detach.
    ///
    /// Depths of the whole subtree are recomputed in the same walk that
    /// marks it dirty. The caller must keep the parent relation acyclic.
    pub fn parent_set(&mut self, id: TransformId, new_parent: TransformId) {
        let Some(i) = self.check(id, "parent_set") else {
            return;
        };
        let parent_index = if new_parent.is_valid() {
            match self.check(new_parent, "parent_set (parent)") {
                Some(p) => p as u32,
                None => return,
            }
        } else {
            INVALID_INDEX
        };

        self.parent[i] = parent_index;
        for t in self.subtree_of(i as u32) {
            let ti = t as usize;
            let p = self.parent[ti];
            self.depth[ti] = if p == INVALID_INDEX {
                0
            } else {
                self.depth[p as usize].saturating_add(1)
            };
            self.dirty_add(t);
        }
    }

    // =========== Accessors ===========

    /// Cached local position. Invalid handles yield zero.
    pub fn position_get(&self, id: TransformId) -> Vector3 {
        self.check(id, "position_get")
            .map(|i| self.position[i])
            .unwrap_or(Vector3::ZERO)
    }

    /// Cached local rotation. Invalid handles yield identity.
    pub fn rotation_get(&self, id: TransformId) -> Quaternion {
        self.check(id, "rotation_get")
            .map(|i| self.rotation[i])
            .unwrap_or(Quaternion::IDENTITY)
    }

    /// Cached local scale. Invalid handles yield one.
    pub fn scale_get(&self, id: TransformId) -> Vector3 {
        self.check(id, "scale_get")
            .map(|i| self.scale[i])
            .unwrap_or(Vector3::ONE)
    }

    /// User payload. Invalid handles yield zero.
    pub fn user_get(&self, id: TransformId) -> u64 {
        self.check(id, "user_get")
            .map(|i| self.user[i])
            .unwrap_or(0)
    }

    /// Parent handle, or [`TransformId::INVALID`] for roots.
    pub fn parent_get(&self, id: TransformId) -> TransformId {
        match self.check(id, "parent_get") {
            Some(i) if self.parent[i] != INVALID_INDEX => {
                TransformId::from_index(self.parent[i])
            }
            _ => TransformId::INVALID,
        }
    }

    /// Depth below the root (0 for roots).
    pub fn depth_get(&self, id: TransformId) -> u8 {
        self.check(id, "depth_get")
            .map(|i| self.depth[i])
            .unwrap_or(0)
    }

    /// Cached local matrix. Stale while the handle is dirty.
    pub fn local_get(&self, id: TransformId) -> Matrix4 {
        self.check(id, "local_get")
            .map(|i| self.local[i])
            .unwrap_or(Matrix4::IDENTITY)
    }

    /// Cached world matrix. Stale while the handle or an ancestor is
    /// dirty.
    pub fn world_get(&self, id: TransformId) -> Matrix4 {
        self.check(id, "world_get")
            .map(|i| self.world[i])
            .unwrap_or(Matrix4::IDENTITY)
    }

    /// Translation column of the cached world matrix.
    pub fn world_position_get(&self, id: TransformId) -> Vector3 {
        self.world_get(id).get_position()
    }

    /// World rotation, composed from parent-chain rotations top-down.
    ///
    /// Walks TRS fields instead of decomposing the world matrix so the
    /// result stays free of scale shear.
    pub fn world_rotation_get(&self, id: TransformId) -> Quaternion {
        let Some(i) = self.check(id, "world_rotation_get") else {
            return Quaternion::IDENTITY;
        };
        let mut rotation = self.rotation[i];
        let mut p = self.parent[i];
        while p != INVALID_INDEX {
            rotation = self.rotation[p as usize].multiply(&rotation);
            p = self.parent[p as usize];
        }
        rotation
    }

    /// World scale, composed component-wise along the parent chain.
    pub fn world_scale_get(&self, id: TransformId) -> Vector3 {
        let Some(i) = self.check(id, "world_scale_get") else {
            return Vector3::ONE;
        };
        let mut scale = self.scale[i];
        let mut p = self.parent[i];
        while p != INVALID_INDEX {
            scale = self.scale[p as usize].multiply(&scale);
            p = self.parent[p as usize];
        }
        scale
    }

    // =========== Per-frame update ===========

    /// Recompute the world matrices of every dirty subtree and copy the
    /// world-matrix block into the attached mirror.
    ///
    /// Dirty handles are processed shallowest first, so a parent's world
    /// matrix is always current before its children read it. Calling
    /// update again with no intervening mutation changes nothing.
    pub fn update(&mut self) {
        {
            let depths = &self.depth;
            self.dirty.sort_unstable_by_key(|&t| depths[t as usize]);
        }

        let dirty = std::mem::take(&mut self.dirty);
        for &t in &dirty {
            let i = t as usize;
            if self.flags[i] & FLAG_FREE != 0 {
                continue;
            }
            self.local[i] =
                Matrix4::compose(&self.position[i], &self.rotation[i], &self.scale[i]);
            let p = self.parent[i];
            self.world[i] = if p == INVALID_INDEX {
                self.local[i]
            } else {
                self.world[p as usize].multiply(&self.local[i])
            };
        }
        let mut dirty = dirty;
        dirty.clear();
        self.dirty = dirty;

        if let Some(mirror) = self.mirror.as_mut() {
            if self.world.len() > mirror.capacity_matrices() && !self.mirror_warned {
                log::warn!(
                    "transform capacity {} exceeds mirror capacity {}; extra matrices are not uploaded",
                    self.world.len(),
                    mirror.capacity_matrices()
                );
                self.mirror_warned = true;
            }
            mirror.write(&self.world);
        }
    }

    // =========== Dirty tracking ===========

    fn dirty_add(&mut self, index: u32) {
        if !self.dirty.contains(&index) {
            self.dirty.push(index);
        }
    }

    /// Mark a slot and all its live descendants dirty.
    fn mark_subtree_dirty(&mut self, root: u32) {
        for t in self.subtree_of(root) {
            self.dirty_add(t);
        }
    }

    /// Collect a slot and its live descendants, parents before children.
    fn subtree_of(&self, root: u32) -> Vec<u32> {
        let mut out = vec![root];
        let mut cursor = 0;
        while cursor < out.len() {
            let t = out[cursor];
            cursor += 1;
            for c in 1..self.parent.len() as u32 {
                if self.parent[c as usize] == t && self.flags[c as usize] & FLAG_FREE == 0 {
                    out.push(c);
                }
            }
        }
        out
    }
}
