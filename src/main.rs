mod admin;
mod app;
mod auth;
mod cars;
mod config;
mod contact;
mod error;
mod http;
mod mailer;
mod payments;
mod requests;
mod state;
mod storage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "offisho=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = state::AppState::init().await?;

    // Run migrations if present
    if let Err(e) = sqlx::migrate!("./migrations").run(&state.db).await {
        tracing::warn!(error = %e, "migrations folder not found or migration failed; continuing");
    }

    if let Err(e) = auth::services::ensure_admin(&state.db).await {
        tracing::warn!(error = %e, "admin bootstrap failed; continuing");
    }

    let addr = state.config.bind_address();
    let app = app::build_app(state);
    app::serve(app, &addr).await
}
