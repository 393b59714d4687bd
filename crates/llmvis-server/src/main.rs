mod api;
mod middleware;

use std::sync::Arc;

use llmvis_analysis::Pipeline;
use llmvis_clients::{QueryClient, TranslationClient};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::RateLimitState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = llmvis_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = llmvis_db::PoolConfig::from_app_config(&config);
    let pool = llmvis_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = llmvis_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let translator = TranslationClient::new(
        &config.translation_service_url,
        config.client_timeout_secs,
        &config.client_user_agent,
    )?;
    let querier = QueryClient::new(
        &config.llm_service_url,
        config.client_timeout_secs,
        &config.client_user_agent,
    )?;
    let pipeline = Pipeline::new(translator, querier, config.translation, config.query);

    let state = AppState {
        pool,
        pipeline: Arc::new(pipeline),
        analysis_timeout: config.analysis_timeout(),
    };
    let app = build_app(state, RateLimitState::per_minute(config.rate_limit_per_minute));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "llmvis-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
