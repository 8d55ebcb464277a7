//! Seam to the world/level model
//!
//! The runner coordinates edits and checkpoints but never implements
//! undo-log mechanics itself; those live behind [`WorldModel`]. An undo
//! checkpoint is opaque here: the runner only asks for one to be
//! created or for the last one to be restored.

use crate::error::OpResult;
use crate::progress::OpContext;

/// Which parts of editable state a checkpoint captures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotScope {
    /// World data (chunks, blocks, entities)
    pub world: bool,
    /// Editor-side state that is undoable but not part of the world
    pub non_world: bool,
}

impl SnapshotScope {
    /// Capture everything
    pub const ALL: Self = Self {
        world: true,
        non_world: true,
    };

    /// Capture world data only
    pub const WORLD: Self = Self {
        world: true,
        non_world: false,
    };
}

impl Default for SnapshotScope {
    fn default() -> Self {
        Self::ALL
    }
}

/// The world/level model as the runner sees it
pub trait WorldModel: Send + Sync {
    /// Discard any mutation made since the last checkpoint.
    /// Must be idempotent when there is nothing to restore.
    fn restore_last_undo_point(&self);

    /// Create a checkpoint immediately
    fn create_undo_point(&self, scope: SnapshotScope);

    /// Create a checkpoint incrementally, reporting progress through
    /// `ctx`. Returns whether any change was actually captured.
    fn create_undo_point_iter(&self, ctx: &OpContext, scope: SnapshotScope) -> OpResult<bool>;

    /// Run pre-save normalization. Returns whether it changed anything.
    fn pre_save_operation(&self, ctx: &OpContext) -> OpResult<bool>;

    /// Write all modified chunks out, reporting per-chunk progress
    /// through `ctx`.
    fn save_iter(&self, ctx: &OpContext) -> OpResult<()>;

    /// Step back one checkpoint
    fn undo(&self);

    /// Step forward one checkpoint
    fn redo(&self);
}
