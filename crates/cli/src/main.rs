//! Ferrous-Resolver binary: config loading, chain wiring, background jobs,
//! and the UDP/TCP listener that drives the chain end to end. The listener
//! socket is an external collaborator per the resolver chain's own scope
//! (DoT/DoH listener termination and the HTTP admin surface are out of
//! scope entirely), but a runnable binary needs something to bind.

mod bootstrap;
mod di;
mod server;

use std::net::SocketAddr;

use clap::Parser;
use ferrous_resolver_domain::CliOverrides;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "ferrous-resolver")]
#[command(version)]
#[command(about = "Recursive-style DNS front-end: block, rewrite, cache, or forward")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(short = 'c', long)]
    config: Option<String>,

    /// Bind address override (applies to both UDP and TCP listeners).
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// DNS listener port override.
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Log level override (`error` | `warn` | `info` | `debug` | `trace`).
    #[arg(short = 'l', long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        bind_address: cli.bind.clone(),
        dns_port: cli.port,
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), overrides)?;
    bootstrap::init_logging(&config);

    info!("ferrous-resolver starting");

    let app = di::wire(&config).await?;
    app.jobs.start().await;

    let bind_addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.dns_port).parse()?;

    let shutdown = app.shutdown.clone();
    let head = app.chain.head;

    let udp = tokio::spawn(server::udp::run(bind_addr, head.clone(), shutdown.clone()));
    let tcp = tokio::spawn(server::tcp::run(bind_addr, head, shutdown.clone()));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("received shutdown signal");
        }
    }
    shutdown.cancel();

    if let Err(e) = udp.await? {
        error!(error = %e, "UDP listener exited with error");
    }
    if let Err(e) = tcp.await? {
        error!(error = %e, "TCP listener exited with error");
    }

    info!("ferrous-resolver stopped");
    Ok(())
}
