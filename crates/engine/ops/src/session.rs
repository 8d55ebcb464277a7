//! Edit session façade
//!
//! Ties the runner, the world model, and the renderer together behind
//! the entry points a front-end actually calls: run an edit, save,
//! undo, redo. Session happenings are published on a broadcast channel
//! so interested components (toolbars, history views) can react
//! without being wired to each other.

use crate::error::{OpResult, RunError};
use crate::progress::OpContext;
use crate::runner::{OperationRunner, RunOptions};
use crate::surface::RenderBridge;
use crate::world::{SnapshotScope, WorldModel};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Something happened to the edit history or the world on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditEvent {
    /// Stepped back one checkpoint
    Undo,
    /// Stepped forward one checkpoint
    Redo,
    /// A fresh undo checkpoint exists
    CheckpointCreated,
    /// The world was written to disk
    Saved,
}

/// One editing session over a world
pub struct EditSession {
    runner: Arc<OperationRunner>,
    world: Arc<dyn WorldModel>,
    renderer: Arc<dyn RenderBridge>,
    events: broadcast::Sender<EditEvent>,
}

impl EditSession {
    /// Open a session
    pub fn new(
        runner: Arc<OperationRunner>,
        world: Arc<dyn WorldModel>,
        renderer: Arc<dyn RenderBridge>,
    ) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            runner,
            world,
            renderer,
            events,
        }
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<EditEvent> {
        self.events.subscribe()
    }

    /// Run a user editing operation.
    ///
    /// Cancelable, and followed by an implicit undo checkpoint so the
    /// edit can be stepped back later.
    pub async fn run_operation<T, F>(
        &self,
        title: &str,
        message: &str,
        op: F,
    ) -> Result<T, RunError>
    where
        T: Send + 'static,
        F: FnOnce(&OpContext) -> OpResult<T> + Send + 'static,
    {
        let out = self
            .runner
            .run(RunOptions::new(title).message(message), op)
            .await?;
        let _ = self.events.send(EditEvent::CheckpointCreated);
        Ok(out)
    }

    /// Save the world: pre-save normalization, checkpoint or restore
    /// depending on whether it changed anything, then write chunks.
    /// Not cancelable; a partially written save is worse than a slow
    /// one.
    pub async fn save(&self) -> Result<(), RunError> {
        let world = Arc::clone(&self.world);
        self.runner
            .run(
                RunOptions::new("Saving world")
                    .message("Please wait")
                    .cancelable(false)
                    .checkpoint(false),
                move |ctx| {
                    ctx.update(0.0, "Running pre-save operations");
                    if world.pre_save_operation(ctx)? {
                        world.create_undo_point_iter(ctx, SnapshotScope::ALL)?;
                    } else {
                        world.restore_last_undo_point();
                    }
                    ctx.update(0.0, "Saving chunks");
                    world.save_iter(ctx)?;
                    Ok(())
                },
            )
            .await?;
        let _ = self.events.send(EditEvent::Saved);
        Ok(())
    }

    /// Step back one checkpoint
    pub fn undo(&self) {
        self.world.undo();
        self.renderer.rebuild_changed();
        let _ = self.events.send(EditEvent::Undo);
    }

    /// Step forward one checkpoint
    pub fn redo(&self) {
        self.world.redo();
        self.renderer.rebuild_changed();
        let _ = self.events.send(EditEvent::Redo);
    }

    /// Create a checkpoint immediately, outside any operation
    pub fn create_undo_point(&self, scope: SnapshotScope) {
        self.world.create_undo_point(scope);
        let _ = self.events.send(EditEvent::CheckpointCreated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;
    use crate::error::OpError;
    use crate::surface::{LogDiagnostics, NullProgressUi};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingWorld {
        undos: AtomicUsize,
        redos: AtomicUsize,
        saves: AtomicUsize,
        checkpoints: AtomicUsize,
        restores: AtomicUsize,
        pre_save_changes: bool,
    }

    impl WorldModel for CountingWorld {
        fn restore_last_undo_point(&self) {
            self.restores.fetch_add(1, Ordering::SeqCst);
        }

        fn create_undo_point(&self, _scope: SnapshotScope) {
            self.checkpoints.fetch_add(1, Ordering::SeqCst);
        }

        fn create_undo_point_iter(
            &self,
            _ctx: &OpContext,
            _scope: SnapshotScope,
        ) -> OpResult<bool> {
            self.checkpoints.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }

        fn pre_save_operation(&self, _ctx: &OpContext) -> OpResult<bool> {
            Ok(self.pre_save_changes)
        }

        fn save_iter(&self, ctx: &OpContext) -> OpResult<()> {
            for i in 0..4u32 {
                ctx.step(i as f32 / 4.0, "saving")?;
            }
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn undo(&self) {
            self.undos.fetch_add(1, Ordering::SeqCst);
        }

        fn redo(&self) {
            self.redos.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct CountingRenderer {
        rebuilds: AtomicUsize,
    }

    impl RenderBridge for CountingRenderer {
        fn disable_threads(&self) {}

        fn enable_threads(&self) {}

        fn rebuild_changed(&self) {
            self.rebuilds.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn session(world: Arc<CountingWorld>) -> (EditSession, Arc<CountingRenderer>) {
        let renderer = Arc::new(CountingRenderer::default());
        let runner = Arc::new(OperationRunner::new(
            RunnerConfig {
                poll_interval_ms: 10,
                min_duration_ms: 0,
            },
            world.clone(),
            renderer.clone(),
            Arc::new(NullProgressUi),
            Arc::new(LogDiagnostics),
        ));
        (
            EditSession::new(runner, world, renderer.clone()),
            renderer,
        )
    }

    #[tokio::test]
    async fn test_run_operation_emits_checkpoint_event() {
        let world = Arc::new(CountingWorld::default());
        let (session, _renderer) = session(world.clone());
        let mut events = session.subscribe();

        let out = session
            .run_operation("Edit", "Running", |_ctx| Ok(5))
            .await
            .unwrap();
        assert_eq!(out, 5);
        assert_eq!(world.checkpoints.load(Ordering::SeqCst), 1);
        assert_eq!(events.recv().await.unwrap(), EditEvent::CheckpointCreated);
    }

    #[tokio::test]
    async fn test_failed_operation_emits_no_event() {
        let world = Arc::new(CountingWorld::default());
        let (session, _renderer) = session(world.clone());
        let mut events = session.subscribe();

        let err = session
            .run_operation("Edit", "Running", |_ctx| {
                Err::<(), _>(OpError::operation("nope"))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Op(OpError::Operation(_))));
        assert!(matches!(
            events.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_save_flow_without_pre_save_changes() {
        let world = Arc::new(CountingWorld::default());
        let (session, _renderer) = session(world.clone());
        let mut events = session.subscribe();

        session.save().await.unwrap();
        assert_eq!(world.saves.load(Ordering::SeqCst), 1);
        // pre-save changed nothing: restore instead of checkpoint
        assert_eq!(world.restores.load(Ordering::SeqCst), 1);
        assert_eq!(world.checkpoints.load(Ordering::SeqCst), 0);
        assert_eq!(events.recv().await.unwrap(), EditEvent::Saved);
    }

    #[tokio::test]
    async fn test_save_flow_with_pre_save_changes() {
        let world = Arc::new(CountingWorld {
            pre_save_changes: true,
            ..CountingWorld::default()
        });
        let (session, _renderer) = session(world.clone());

        session.save().await.unwrap();
        assert_eq!(world.saves.load(Ordering::SeqCst), 1);
        assert_eq!(world.checkpoints.load(Ordering::SeqCst), 1);
        assert_eq!(world.restores.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_undo_redo_rebuild_and_emit() {
        let world = Arc::new(CountingWorld::default());
        let (session, renderer) = session(world.clone());
        let mut events = session.subscribe();

        session.undo();
        session.redo();
        assert_eq!(world.undos.load(Ordering::SeqCst), 1);
        assert_eq!(world.redos.load(Ordering::SeqCst), 1);
        assert_eq!(renderer.rebuilds.load(Ordering::SeqCst), 2);
        assert_eq!(events.recv().await.unwrap(), EditEvent::Undo);
        assert_eq!(events.recv().await.unwrap(), EditEvent::Redo);
    }
}
