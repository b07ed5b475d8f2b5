//! Endpoint tour server
//!
//! A small JSON API demonstrating typed request decoding: path, query,
//! header, cookie and body parameters, constraint validation with
//! field-addressed errors, and a generated OpenAPI document.

use anyhow::{anyhow, Context};
use clap::Parser;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

mod api;
mod config;
mod dispatch;
mod handler;
mod http;
mod logger;
mod models;
mod openapi;
mod routing;
mod server;
mod validation;

/// Endpoint tour HTTP server
#[derive(Parser, Debug)]
#[command(name = "endpoint-tour", version, about)]
struct Cli {
    /// Configuration file, with or without the `.toml` extension
    #[arg(short, long, default_value = "config")]
    config: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::Config::load_from(&cli.config)
        .with_context(|| format!("failed to load configuration from `{}`", cli.config))?;

    let workers = cfg.worker_threads().map_err(|e| anyhow!(e))?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> anyhow::Result<()> {
    let _log_guard = logger::init(&cfg)?;

    let addr = cfg.get_socket_addr().map_err(|e| anyhow!(e))?;
    let state =
        Arc::new(config::AppState::new(cfg).context("failed to build application state")?);
    let listener =
        server::create_listener(addr).with_context(|| format!("failed to bind {addr}"))?;

    logger::log_server_start(&addr, &state.config, state.dispatcher.routes().len());

    let signals = Arc::new(server::SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals));

    server::start_server_loop(
        listener,
        state,
        Arc::new(AtomicUsize::new(0)),
        Arc::clone(&signals.shutdown),
    )
    .await;

    Ok(())
}
