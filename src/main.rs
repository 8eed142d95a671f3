mod aggregator;
mod handlers;
mod models;
mod routes;
mod sources;
mod utils;
use axum::serve;
use routes::{init_tracing, make_app};
use tokio::net::TcpListener;
use tracing::{error, info};
use utils::config::Config;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    init_tracing();

    let config = Config::init();
    let bind_addr = config.bind_addr.clone();

    let app = match make_app(config) {
        Ok(app) => app,
        Err(err) => {
            error!("Failed to initialize application: {}", err);
            std::process::exit(1);
        }
    };

    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Failed to bind {}: {}", bind_addr, err);
            std::process::exit(1);
        }
    };
    info!("Listening on http://{}", bind_addr);

    if let Err(err) = serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }
    info!("Server stopped, caches dropped");
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
