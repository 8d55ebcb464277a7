//! Exercises the operation runner against an in-memory demo world:
//! progress-reporting edits, cooperative cancellation, failure
//! rollback, and the full save flow.

mod progress;
mod world;

use clap::{Parser, Subcommand};
use cubedit_ops::{EditSession, OpContext, OpError, OperationRunner, RunError, RunnerConfig};
use progress::{ConsoleDiagnostics, ConsoleProgress, LoggingRenderer};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use world::DemoWorld;

#[derive(Parser, Debug)]
#[command(name = "opstool")]
#[command(about = "Run editing operations against a demo voxel world", long_about = None)]
struct Args {
    /// World edge length in cells
    #[arg(long, default_value_t = 32)]
    size: usize,

    /// Where `save` writes the world
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fill the world with a value, layer by layer
    Fill {
        /// Cell value to fill with
        #[arg(long, default_value_t = 7)]
        value: u8,
        /// Simulate the user pressing cancel after this many milliseconds
        #[arg(long)]
        cancel_after_ms: Option<u64>,
    },
    /// Run an operation that fails partway through, demonstrating rollback
    Fail,
    /// Run an operation that panics partway through
    Panic,
    /// Save the world through the full save flow
    Save,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let cancel_after = match &args.command {
        Command::Fill {
            cancel_after_ms: Some(ms),
            ..
        } => Some(Duration::from_millis(*ms)),
        _ => None,
    };

    let world = Arc::new(DemoWorld::new(args.size, args.out.clone()));
    let renderer = Arc::new(LoggingRenderer);
    let runner = Arc::new(OperationRunner::new(
        RunnerConfig::load(),
        world.clone(),
        renderer.clone(),
        Arc::new(ConsoleProgress::new(cancel_after)),
        Arc::new(ConsoleDiagnostics),
    ));
    let session = EditSession::new(runner, world.clone(), renderer);

    match args.command {
        Command::Fill { value, .. } => fill(&session, &world, value).await,
        Command::Fail => fail(&session, &world).await,
        Command::Panic => panic_op(&session, &world).await,
        Command::Save => {
            session.save().await?;
            println!("world saved");
            Ok(())
        }
    }
}

async fn fill(session: &EditSession, world: &Arc<DemoWorld>, value: u8) -> anyhow::Result<()> {
    let size = world.size();
    let op_world = world.clone();
    let result = session
        .run_operation("Fill world", "Filling layers", move |ctx: &OpContext| {
            for z in 0..size {
                ctx.step(z as f32 / size as f32, format!("Filling layer {z}"))?;
                op_world.fill_layer(z, value);
                std::thread::sleep(Duration::from_millis(15));
            }
            Ok(size * size * size)
        })
        .await;

    match result {
        Ok(filled) => {
            println!("filled {filled} cells with {value}");
            Ok(())
        }
        Err(RunError::Op(OpError::Aborted)) => {
            println!(
                "cancelled; world rolled back ({} cells still hold {value})",
                world.count_value(value)
            );
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

async fn fail(session: &EditSession, world: &Arc<DemoWorld>) -> anyhow::Result<()> {
    let size = world.size();
    let op_world = world.clone();
    let result = session
        .run_operation("Doomed edit", "Editing", move |ctx: &OpContext| {
            for z in 0..size {
                ctx.step(z as f32 / size as f32, format!("Editing layer {z}"))?;
                op_world.fill_layer(z, 200);
                if z == size / 2 {
                    return Err(OpError::operation("simulated failure at the halfway layer"));
                }
                std::thread::sleep(Duration::from_millis(10));
            }
            Ok(())
        })
        .await;

    report_rollback(result, world, 200)
}

async fn panic_op(session: &EditSession, world: &Arc<DemoWorld>) -> anyhow::Result<()> {
    let size = world.size();
    let op_world = world.clone();
    let result = session
        .run_operation("Buggy edit", "Editing", move |ctx: &OpContext| {
            for z in 0..size {
                ctx.step(z as f32 / size as f32, format!("Editing layer {z}"))?;
                op_world.fill_layer(z, 200);
                if z == size / 2 {
                    panic!("layer {z} hit a bug");
                }
                std::thread::sleep(Duration::from_millis(10));
            }
            Ok(())
        })
        .await;

    report_rollback(result, world, 200)
}

fn report_rollback(
    result: Result<(), RunError>,
    world: &Arc<DemoWorld>,
    value: u8,
) -> anyhow::Result<()> {
    match result {
        Ok(()) => anyhow::bail!("operation unexpectedly succeeded"),
        Err(_) => {
            let leftover = world.count_value(value);
            println!("operation failed and was rolled back; {leftover} cells still hold {value}");
            anyhow::ensure!(leftover == 0, "rollback left {leftover} modified cells");
            Ok(())
        }
    }
}
