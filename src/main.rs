//! dirsize-exporter — per-subdirectory disk usage as Prometheus gauges.
//!
//! Thin binary entry point. Scanning lives in `dirsize-core`; the metrics
//! registry, endpoint and polling loop live in `dirsize-server`.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use dirsize_server::{http, start_poller, CliArgs, ExporterConfig, MetricsRegistry};
use std::process::ExitCode;
use tokio::sync::oneshot;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse();
    setup_logging(args.verbose);

    let config = ExporterConfig::from_args(args).context("Invalid configuration")?;
    info!("dirsize-exporter {} starting", env!("CARGO_PKG_VERSION"));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let registry = MetricsRegistry::new(config.detailed_processing_time);
    let listen_addr = config.listen_addr;

    runtime.block_on(async move {
        let (stop_server, server_stopped) = oneshot::channel::<()>();
        let mut server = tokio::spawn(http::serve(listen_addr, registry.clone(), async move {
            let _ = server_stopped.await;
        }));

        let mut poller = start_poller(config, registry).context("Failed to spawn poller thread")?;

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, shutting down");
                poller.stop();
                let _ = stop_server.send(());
                server.await.context("Metrics endpoint task failed")??;
                Ok(())
            }
            exit = &mut poller.exited => {
                let _ = stop_server.send(());
                match exit {
                    Ok(result) => result.context("Scan cycle aborted"),
                    Err(_) => Err(anyhow!("Poller thread exited unexpectedly")),
                }
            }
            served = &mut server => {
                poller.stop();
                served.context("Metrics endpoint task failed")??;
                Err(anyhow!("Metrics endpoint stopped unexpectedly"))
            }
        }
    })
}

fn setup_logging(verbose: bool) {
    let default = if verbose {
        "dirsize=debug,warn"
    } else {
        "dirsize=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .init();
}
