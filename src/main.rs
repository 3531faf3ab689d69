use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use colored::*;
use log::{error, info};
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

use portscan::{create_router, AppState, NmapProbe, ScanJobManager, ServiceConfig};

fn print_banner(addr: &SocketAddr, config: &ServiceConfig) {
    println!("{}", "portscan - nmap scan job service".truecolor(231, 76, 60).bold());
    println!(
        "{} {}",
        "[~] Listening at".bright_blue(),
        format!("http://{}", addr).bright_cyan().bold()
    );
    println!(
        "{} {} (timeout {}s)",
        "[~] Probe binary:".bright_blue(),
        config.probe.nmap_path.bright_cyan(),
        config.probe.timeout_secs
    );
    println!(
        "{} {}s ({:?})",
        "[~] Result retention:".bright_blue(),
        config.jobs.retention_secs,
        config.jobs.retention_policy
    );
    println!();
}

fn cli() -> Command {
    Command::new("portscan-server")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Runs nmap scans as asynchronous jobs behind a JSON API")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML configuration file (default: ~/.portscan.toml)"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("ADDR")
                .help("Address to bind the HTTP server to"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Port to bind the HTTP server to")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("nmap-path")
                .long("nmap-path")
                .value_name("PATH")
                .help("Path to the nmap binary"),
        )
        .arg(
            Arg::new("retention")
                .long("retention")
                .value_name("SECS")
                .help("Seconds a finished scan stays retrievable")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Default log filter when RUST_LOG is unset (error, warn, info, debug, trace)"),
        )
}

/// Config file first, command line flags on top. A malformed file aborts
/// startup instead of being silently replaced by defaults.
fn load_config(matches: &ArgMatches) -> anyhow::Result<ServiceConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => ServiceConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config file {}", path))?,
        None => ServiceConfig::load_default_config().with_context(|| {
            format!(
                "Failed to load {}",
                ServiceConfig::default_config_path().display()
            )
        })?,
    };

    if let Some(host) = matches.get_one::<String>("host") {
        config.server.host = host.clone();
    }
    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }
    if let Some(path) = matches.get_one::<String>("nmap-path") {
        config.probe.nmap_path = path.clone();
    }
    if let Some(retention) = matches.get_one::<u64>("retention") {
        config.jobs.retention_secs = *retention;
    }
    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.clone();
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let config = load_config(&matches)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    let host: IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server.host))?;
    let addr = SocketAddr::new(host, config.server.port);

    let probe = Arc::new(NmapProbe::new(config.probe.clone()));
    let manager = ScanJobManager::new(probe, config.jobs.clone());
    let app = create_router(AppState::new(manager.clone()));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    print_banner(&addr, &config);
    info!("portscan backend listening at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    manager.shutdown();
    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = until_signal(
        "SIGTERM",
        signal::unix::signal(signal::unix::SignalKind::terminate()).map(|mut stream| async move {
            stream.recv().await;
        }),
    );

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

/// Wait for an installed signal handler. A handler that could not be
/// installed never fires, so the server keeps running.
async fn until_signal<F>(name: &str, handler: std::io::Result<F>)
where
    F: Future<Output = ()>,
{
    match handler {
        Ok(fired) => fired.await,
        Err(e) => {
            error!("Failed to install {} handler: {}", name, e);
            std::future::pending::<()>().await;
        }
    }
}
