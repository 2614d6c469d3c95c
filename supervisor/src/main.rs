//! # DigSiNet Supervisor
//!
//! Component C7: parses the CLI, loads configuration, and dispatches to
//! one of the three top-level actions.
//!
//! Grounded on `examples/original_source/digsinet.py`'s `main` and
//! `examples/jonathanbelolo-composable-rust/examples/production-agent`'s
//! `tracing-subscriber`/shutdown-signal shape.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod boot;
mod broker;
mod cleanup;
mod cli;
mod error;
mod resolve;

use clap::Parser;
use cli::{Action, Cli};
use std::sync::Arc;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug, cli.task_debug);

    match cli.action() {
        Action::Cleanup => {
            if !cli.yes_i_really_mean_it {
                tracing::error!("refusing forceful cleanup without --yes-i-really-mean-it");
                std::process::exit(1);
            }
            cleanup::cleanup().await;
        }
        Action::Stop => {
            let settings = digsinet_config::load(&cli.config)?;
            cleanup::stop(&settings).await;
        }
        Action::Start => run(&cli).await?,
    }

    Ok(())
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = digsinet_config::load(&cli.config)?;
    let supervisor = Arc::new(boot::boot(settings, cli.reconfigure).await?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let loop_supervisor = Arc::clone(&supervisor);
    let loop_handle = tokio::spawn(async move { loop_supervisor.run(shutdown_rx).await });

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received, stopping gracefully"),
        Err(error) => tracing::error!(%error, "unable to listen for shutdown signal"),
    }

    let _ = shutdown_tx.send(true);
    if let Err(error) = loop_handle.await {
        tracing::warn!(%error, "tick loop task panicked during shutdown");
    }

    match Arc::try_unwrap(supervisor) {
        Ok(supervisor) => supervisor.shutdown().await,
        Err(_) => tracing::warn!("supervisor still has outstanding references at shutdown"),
    }

    Ok(())
}

/// Install a `tracing-subscriber` formatting layer, raised to debug level by
/// `--debug`, with `--task-debug` raising only the `digsinet::task` target
/// (grounded on the source's separate "task debug" flag, which only affects
/// per-task `logger.info(f"*** Realnet got task: ...")` lines).
///
/// Grounded on `production-agent/src/main.rs`'s `init_tracing`.
fn init_tracing(debug: bool, task_debug: bool) {
    let mut default_filter = if debug { "debug".to_string() } else { "info".to_string() };
    if task_debug {
        default_filter.push_str(",digsinet::task=debug");
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_target(true)
        .init();
}
