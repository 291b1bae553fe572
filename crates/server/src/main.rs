use std::net::SocketAddr;
use std::path::PathBuf;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod error;
mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("messbook_server=info,tower_http=info")),
        )
        .init();

    let db_path = std::env::var("MESSBOOK_DB").unwrap_or_else(|_| "messbook.db".to_string());
    let port: u16 = std::env::var("MESSBOOK_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(4000);

    let pool = messbook_storage::create_db(&PathBuf::from(&db_path)).await?;
    tracing::info!(db = %db_path, "database ready");

    let app = routes::router(pool)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
