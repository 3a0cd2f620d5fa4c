mod config;
mod routes;

use std::sync::Arc;

use axum::middleware;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::routes::AppState;
use lotto_db::db::{count_draws, migrate, open_db};

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    init_logging();

    let db_path = config.db_path();
    {
        let conn = open_db(&db_path)?;
        migrate(&conn)?;
        let draws = count_draws(&conn)?;
        tracing::info!(draws, path = %db_path.display(), "base ouverte");
        if draws == 0 {
            tracing::warn!("base vide : lancez `lotto fetch` ou `lotto import` avant d'interroger le serveur");
        }
    }

    let state = Arc::new(AppState {
        db_path,
        options: config.report_options(),
        reference: config.reference,
    });

    let app = routes::router(state).layer(middleware::from_fn(logging_middleware));

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "serveur en écoute");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn logging_middleware(
    req: axum::extract::Request,
    next: middleware::Next,
) -> axum::response::Response {
    let method = req.method().clone();
    let uri = req.uri().clone();

    let start = std::time::Instant::now();
    let response = next.run(req).await;
    let duration = start.elapsed();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        duration_ms = duration.as_millis(),
        "requête terminée"
    );

    response
}
