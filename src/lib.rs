use std::sync::Arc;

pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;

#[cfg(test)]
mod test_support;

use crate::core::{config::Settings, state::AppState, telemetry};
use crate::repositories::store::PgStore;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(settings.telemetry())?;
    core::metrics::init(settings.telemetry())?;

    let db_pool = db::init_pool(settings.database()).await?;
    db::run_migrations(&db_pool).await?;

    let store = Arc::new(PgStore::new(db_pool.clone()));
    let state = AppState::new(settings, store.clone(), store);

    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        max_questions = state.settings().exam().max_questions_per_exam,
        "Exam service listening"
    );

    let result =
        axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await;

    db_pool.close().await;
    tracing::info!("Database pool closed");

    result?;

    Ok(())
}
