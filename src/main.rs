use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use session_api::audit::reader::AuditReader;
use session_api::audit::writer::AuditWriter;
use session_api::config::Config;
use session_api::handlers::{self, AppState};
use session_api::session::store::SessionStore;
use session_api::store;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    tracing::info!(
        "starting with {:?} store at {}:{}, session TTL {}s",
        config.store_backend,
        config.store_host,
        config.store_port,
        config.session_ttl_secs
    );

    // Failure to reach the store at startup is fatal.
    let kv = match store::connect(&config).await {
        Ok(kv) => kv,
        Err(e) => {
            tracing::error!("failed to connect to store: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = kv.ping().await {
        tracing::error!("store is unreachable: {}", e);
        std::process::exit(1);
    }

    let ttl = config.session_ttl();
    let audit = AuditWriter::new(kv.clone(), ttl, config.audit_ua_from_ip);
    let state = AppState {
        store: kv.clone(),
        sessions: SessionStore::new(kv.clone(), audit.clone(), ttl),
        logs: AuditReader::new(kv),
        audit: audit.clone(),
    };

    let app = handlers::build_router(state);

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("failed to bind {}: {}", config.bind_addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("listening on {}", config.bind_addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("server error: {}", e);
        std::process::exit(1);
    }

    // Persist whatever the audit queue still holds before exiting.
    audit.flush().await;
    tracing::info!("shut down");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
}
