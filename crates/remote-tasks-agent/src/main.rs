//! Remote task client.
//!
//! Connects to the controller, sends a snapshot of the working directory and
//! then answers task descriptors until told to exit.
//!
//! Run with: cargo run -p remote-tasks-agent -- --host 127.0.0.1 --port 9999

mod cli;

use anyhow::Context;
use clap::Parser;
use remote_tasks_core::{TracingObserver, Transport};
use remote_tasks_executor::TaskExecutor;
use remote_tasks_session::CommandLoop;
use remote_tasks_transport::TcpChannel;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli
        .resolve_config()
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    let executor =
        TaskExecutor::from_current_dir().context("Failed to read current directory")?;

    let mut channel = TcpChannel::open(&config)
        .await
        .context("Failed to connect to controller")?;

    let mut command_loop = CommandLoop::new(config, executor, TracingObserver);
    command_loop.handshake(&mut channel).await;
    let summary = command_loop.run(&mut channel).await;
    channel.close().await;

    tracing::info!(
        termination = ?summary.termination,
        tasks = summary.tasks_handled,
        "Session finished"
    );
    Ok(())
}
