use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use cardlytics_server::state::AppState;

/// `cardlytics health` — liveness probe for Docker HEALTHCHECK.
///
/// Calls `GET http://localhost:$CARDLYTICS_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("CARDLYTICS_PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Health-check subcommand — handled before tokio does any real work so
    // the binary stays cheap as a Docker HEALTHCHECK probe.
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }

    // Structured JSON logging. Level controlled via RUST_LOG env var.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cardlytics=info".parse()?),
        )
        .json()
        .init();

    let cfg = cardlytics_core::config::Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Ensure the data directory exists before opening the snapshot file.
    std::fs::create_dir_all(&cfg.data_dir)?;
    let snapshot_path = format!("{}/cardlytics.json", cfg.data_dir);
    let store = cardlytics_docstore::DocStore::open(&snapshot_path)
        .map_err(|e| anyhow::anyhow!("failed to open document store: {e}"))?;

    match cfg.collector_url.as_deref() {
        Some(url) => info!(collector_url = url, "Collector side channel enabled"),
        None => info!("Collector side channel disabled (CARDLYTICS_COLLECTOR_URL unset)"),
    }

    let state = Arc::new(AppState::new(store, cfg.clone()));

    // Spawn the background snapshot task.
    {
        let store = Arc::clone(&state.store);
        let interval = cfg.snapshot_interval();
        tokio::spawn(async move {
            store.run_snapshot_loop(interval).await;
        });
    }

    let addr = format!("0.0.0.0:{}", cfg.port);
    let app = cardlytics_server::app::build_app(Arc::clone(&state));

    info!(port = cfg.port, "Cardlytics listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let state_for_shutdown = Arc::clone(&state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    // Final snapshot so a clean shutdown loses nothing.
    match tokio::time::timeout(
        std::time::Duration::from_secs(5),
        state_for_shutdown.store.snapshot(),
    )
    .await
    {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "Final snapshot failed"),
        Err(_) => tracing::warn!("Final snapshot timed out"),
    }

    Ok(())
}
