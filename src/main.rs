use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use portfolio_server::config::Config;
use portfolio_server::logger;
use portfolio_server::server::signal::{self, ShutdownSignal};
use portfolio_server::server::{self, create_reusable_listener};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.socket_addr()?;

    // With fail_fast set, a missing root document is a startup error;
    // otherwise the server starts and answers 404 per request.
    if let Err(e) = cfg.ensure_root_document() {
        if cfg.site.fail_fast {
            return Err(e.into());
        }
        logger::log_warning(&e);
    }

    // A failed bind (port already taken, privileged port) propagates out of
    // main and the process exits non-zero.
    let listener = create_reusable_listener(addr)?;

    let cfg = Arc::new(cfg);
    let shutdown = Arc::new(ShutdownSignal::new());
    signal::start_signal_handler(Arc::clone(&shutdown));

    logger::log_server_start(&addr, &cfg);

    let active_connections = Arc::new(AtomicUsize::new(0));
    server::run_accept_loop(listener, cfg, active_connections, shutdown).await;

    // The accept loop only returns on a termination signal: exit 0.
    Ok(())
}
