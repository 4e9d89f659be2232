//! # Sluice DNS
//!
//! Forwarding DNS server with hot-reloadable upstreams and managed
//! upstream list files.

use clap::Parser;
use mimalloc::MiMalloc;
use sluice_dns_api::create_api_routes;
use sluice_dns_application::ports::{ProxySettings, ResolutionServer};
use sluice_dns_domain::CliOverrides;
use sluice_dns_jobs::{JobRunner, UpstreamFilesSyncJob};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

mod bootstrap;
mod di;
mod server;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[command(name = "sluice-dns")]
#[command(version)]
#[command(about = "Forwarding DNS server with managed upstream lists")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<String>,

    /// DNS server port
    #[arg(short = 'd', long)]
    dns_port: Option<u16>,

    /// Web API port
    #[arg(short = 'w', long)]
    web_port: Option<u16>,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Directory for cached upstream files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = bootstrap::load_config(
        cli.config.as_deref(),
        CliOverrides {
            dns_port: cli.dns_port,
            web_port: cli.web_port,
            bind_address: cli.bind,
            data_dir: cli.data_dir,
            log_level: cli.log_level,
        },
    )?;
    bootstrap::init_logging(&config);

    let shutdown = CancellationToken::new();
    let services = di::Services::build(&config, cli.config.map(PathBuf::from), shutdown.clone())?;

    let listen_addrs = config.server.dns_listen_addrs();
    if listen_addrs.is_empty() {
        anyhow::bail!("bind address {} is not an IP address", config.server.bind_address);
    }
    services
        .reload
        .initialize(ProxySettings::primary(&config.dns, listen_addrs))
        .await?;

    let jobs = JobRunner::new()
        .with_upstream_files_sync(
            UpstreamFilesSyncJob::new(services.app_state.refresh_files.clone())
                .with_interval(config.upstream_files.check_interval_secs)
                .with_cancellation(shutdown.clone()),
        )
        .start()
        .await;

    let web_addr = SocketAddr::new(config.server.bind_address.parse()?, config.server.web_port);
    let web = tokio::spawn(server::start_web_server(
        web_addr,
        create_api_routes(services.app_state.clone()),
        shutdown.clone(),
    ));

    info!("Server ready, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    shutdown.cancel();
    for job in jobs {
        let _ = job.await;
    }
    match web.await {
        Ok(Err(e)) => error!(error = %e, "Web server failed"),
        Err(e) => error!(error = %e, "Web server task failed"),
        Ok(Ok(())) => {}
    }

    services.server.stop().await?;
    if let Some(bundle) = services.server.current() {
        if let Err(e) = bundle.release() {
            error!(error = %e, "Failed to release upstream configuration");
        }
    }

    info!("Sluice DNS stopped");
    Ok(())
}
