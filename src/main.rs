use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use atestado_core::{CoreConfig, config::session_idle_ttl_from_env_value};

/// Main entry point for the Atestado application
///
/// Serves the certificate form REST API (with Swagger UI at `/swagger-ui`).
///
/// # Environment Variables
/// - `ATESTADO_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `ATESTADO_CID_SEARCH_URL`: ICD-10 search endpoint (default: NLM Clinical Tables)
/// - `ATESTADO_CID_DEBOUNCE_MS`: quiet period before a CID search is sent (default: 500)
/// - `ATESTADO_LOCALITY`: place printed before the certificate date (default: "Goiânia/GO")
/// - `ATESTADO_STYLESHEET_URL`: style script loaded by the print document
/// - `ATESTADO_SESSION_IDLE_SECS`: idle time before a form session is dropped (default: 1800)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration is invalid or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("atestado=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("ATESTADO_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = Arc::new(CoreConfig::from_env_values(
        std::env::var("ATESTADO_CID_SEARCH_URL").ok(),
        std::env::var("ATESTADO_CID_DEBOUNCE_MS").ok(),
        std::env::var("ATESTADO_LOCALITY").ok(),
        std::env::var("ATESTADO_STYLESHEET_URL").ok(),
    )?
    .with_session_idle_ttl(session_idle_ttl_from_env_value(
        std::env::var("ATESTADO_SESSION_IDLE_SECS").ok(),
    )?));

    tracing::info!("++ Starting Atestado REST on {}", rest_addr);
    tracing::info!(
        "CID search via {} (debounce {:?})",
        cfg.cid_search_url(),
        cfg.cid_debounce()
    );
    tracing::info!("Idle sessions dropped after {:?}", cfg.session_idle_ttl());

    let state = AppState::new(cfg)?;
    let _sweeper = state.spawn_idle_sweeper();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
