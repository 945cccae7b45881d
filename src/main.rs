use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;

use fsd::config::{AppState, Config, Overrides};
use fsd::logger;
use fsd::server::{self, create_reusable_listener, ListenerKind, ServerLoopConfig, SignalHandler};
use fsd::stats::FsCounters;

/// Time allowed for open connections to finish after a shutdown signal
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Static file server with conditional GET, byte ranges and outcome counters
#[derive(Parser, Debug)]
#[command(name = "fsd", version, about)]
struct Cli {
    /// Configuration file (extension optional; missing file means defaults)
    #[arg(short, long, default_value = "config")]
    config: String,

    /// Address to listen on, e.g. 127.0.0.1:8080 or :8080
    #[arg(long)]
    addr: Option<String>,

    /// Directory to serve
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Enable byte range requests
    #[arg(long)]
    byte_range: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let overrides = Overrides {
        addr: cli.addr,
        dir: cli.dir,
        byte_range: cli.byte_range.then_some(true),
    };
    let cfg = Config::load_from(&cli.config, &overrides)?;

    logger::init(&cfg)?;
    if cfg.fs.compress {
        logger::log_warning("fs.compress is set but compression is not supported; serving identity");
    }

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let app_addr = cfg.get_socket_addr()?;
    let stats_addr = if cfg.server.stats_enabled {
        Some(cfg.get_stats_socket_addr()?)
    } else {
        None
    };

    let state = AppState::new(cfg, Arc::new(FsCounters::new()))
        .map_err(|e| format!("Cannot serve root directory: {e}"))?;
    let state = Arc::new(state);

    let app_listener = create_reusable_listener(app_addr)?;
    let stats_listener = stats_addr.map(create_reusable_listener).transpose()?;

    let signals = Arc::new(SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals))?;

    logger::log_server_start(&app_addr, stats_addr.as_ref(), &state.config);

    let stats_task = stats_listener.map(|listener| {
        tokio::spawn(server::start_server_loop(
            listener,
            Arc::clone(&state),
            Arc::new(AtomicUsize::new(0)),
            ServerLoopConfig {
                kind: ListenerKind::Stats,
                signals: Arc::clone(&signals),
                drain_timeout: DRAIN_TIMEOUT,
            },
        ))
    });

    server::start_server_loop(
        app_listener,
        Arc::clone(&state),
        Arc::new(AtomicUsize::new(0)),
        ServerLoopConfig {
            kind: ListenerKind::Files,
            signals,
            drain_timeout: DRAIN_TIMEOUT,
        },
    )
    .await;

    if let Some(task) = stats_task {
        if let Err(e) = task.await {
            logger::log_api_error(&format!("Stats listener task failed: {e}"));
        }
    }

    let totals = state.counters.snapshot();
    logger::log_info(&format!(
        "Server stopped after {} request(s), {} body bytes served",
        totals.calls, totals.ok_body_bytes
    ));
    Ok(())
}
