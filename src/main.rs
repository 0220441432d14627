//! sidecar-fs: read-only filesystem sidecar
//!
//! Registers `file-sidecar-<machine>` with the host on stdout, then answers
//! framed requests from stdin until the host closes the stream.

use anyhow::{Context, Result};
use clap::Parser;
use sidecar_fs::cli::Args;
use sidecar_fs::protocol::pipe::PipeTransport;
use sidecar_fs::protocol::SidecarServer;
use tracing::info;

#[compio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    args.validate()?;

    // stdout carries the protocol, logs go to stderr
    tracing_subscriber::fmt()
        .with_max_level(args.output.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    info!("Starting sidecar-fs v{}", env!("CARGO_PKG_VERSION"));

    let transport = PipeTransport::from_stdio().context("Failed to open stdio transport")?;
    let mut server = SidecarServer::with_default_resolver(transport);

    server
        .start(args.machine_name())
        .await
        .context("Failed to announce registrations")?;

    let stats = server.serve().await.context("Session ended abnormally")?;
    info!(
        "Session closed: {} requests, {} failed, {} malformed",
        stats.requests, stats.failures, stats.malformed
    );

    Ok(())
}
