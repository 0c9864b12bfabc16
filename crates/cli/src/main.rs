use clap::Parser;
use netresolve_core::HostHandle;
use netresolve_domain::config::{CliOverrides, Config};
use netresolve_domain::{HostInfoValue, QueryKind};
use netresolve_runtime::SystemHostResolver;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "netresolve")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Host-resolution facility demo CLI")]
struct Cli {
    /// Host name to resolve.
    name: String,

    /// Look up only IPv4 addresses.
    #[arg(long)]
    ipv4: bool,

    /// Look up only IPv6 addresses.
    #[arg(long)]
    ipv6: bool,

    /// Run the lookup asynchronously (install a callback) instead of
    /// blocking the calling thread.
    #[arg(long)]
    async_mode: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Per-query timeout in milliseconds.
    #[arg(long)]
    query_timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(CliOverrides {
        log_level: cli.log_level.clone(),
        query_timeout_ms: cli.query_timeout_ms,
    })?;

    let log_level = config.logging.level.parse().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_target(true)
        .with_max_level(log_level)
        .init();

    info!(name = %cli.name, "starting resolution");

    let resolver = Arc::new(SystemHostResolver::from_system_config()?);
    let handle = HostHandle::create_with_name(cli.name.clone(), resolver)?;

    let kind = if cli.ipv4 {
        QueryKind::Ipv4Addresses
    } else if cli.ipv6 {
        QueryKind::Ipv6Addresses
    } else {
        QueryKind::Addresses
    };

    if cli.async_mode {
        run_async(&handle, kind).await?;
    } else {
        run_blocking(&handle, kind)?;
    }

    Ok(())
}

fn run_blocking(handle: &HostHandle, kind: QueryKind) -> anyhow::Result<()> {
    handle.start_info_resolution(kind)?;
    print_result(handle, kind);
    Ok(())
}

async fn run_async(handle: &HostHandle, kind: QueryKind) -> anyhow::Result<()> {
    let done = Arc::new(tokio::sync::Notify::new());
    let done_clone = done.clone();
    handle.set_client(Some(Arc::new(move |_h, _k, _err| {
        done_clone.notify_one();
    })));
    handle.start_info_resolution(kind)?;
    done.notified().await;
    print_result(handle, kind);
    Ok(())
}

fn print_result(handle: &HostHandle, kind: QueryKind) {
    match handle.get_info(kind).flatten() {
        Some(HostInfoValue::Addresses(addresses)) => {
            for addr in addresses {
                println!("{addr}");
            }
        }
        _ => {
            if let Some(err) = handle.error() {
                eprintln!("resolution failed: {err}");
            } else {
                eprintln!("no result");
            }
        }
    }
}

