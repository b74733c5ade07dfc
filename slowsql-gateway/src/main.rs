//! slowsql-gateway — HTTP front for the slow-SQL analyzer script.
//!
//! Configuration comes from environment variables (optionally via `.env`);
//! see [`slowsql_gateway::config`] for the full table.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use slowsql_gateway::{analyzer::ScriptAnalyzer, config::GatewayConfig, router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("slowsql_gateway=info".parse()?),
        )
        .json()
        .init();

    let config = GatewayConfig::from_env()?;

    info!(
        data_dir = %config.data_dir.display(),
        interpreter = %config.interpreter,
        script = %config.script.display(),
        max_concurrent_analyzers = ?config.max_concurrent_analyzers,
        analyzer_timeout = ?config.analyzer_timeout,
        "analyzer configured"
    );

    let analyzer = ScriptAnalyzer::from_config(&config);
    let bind_addr = config.bind_addr.clone();

    let state = Arc::new(AppState {
        config,
        analyzer: Arc::new(analyzer),
    });

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = bind_addr, "slowsql-gateway listening");

    axum::serve(listener, app).await?;

    Ok(())
}
