//! Contest backend entrypoint wiring REST, SSE and the storage backend.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use ct_contest_back::{
    auth::jwt::JwtKeys,
    config::{AppConfig, StoreBackend},
    dao::contest_store::memory::MemoryContestStore,
    routes,
    services::auth_service,
    state::{AppState, SharedState},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config, JwtKeys::from_env());

    match StoreBackend::from_env() {
        StoreBackend::Memory => {
            warn!("using the in-memory store; data is lost on restart");
            app_state
                .install_store(Arc::new(MemoryContestStore::new()))
                .await;
        }
        StoreBackend::Mongo => spawn_mongo_supervisor(app_state.clone()),
    }

    tokio::spawn(bootstrap_admin(app_state.clone()));

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

#[cfg(feature = "mongo-store")]
fn spawn_mongo_supervisor(state: SharedState) {
    use ct_contest_back::{
        dao::{
            contest_store::{
                ContestStore,
                mongodb::{MongoConfig, MongoContestStore},
            },
            storage::StorageError,
        },
        services::storage_supervisor,
    };

    tokio::spawn(storage_supervisor::run(state, || async {
        let config = MongoConfig::from_env().await.map_err(StorageError::from)?;
        let store = MongoContestStore::connect(config)
            .await
            .map_err(StorageError::from)?;
        Ok(Arc::new(store) as Arc<dyn ContestStore>)
    }));
}

#[cfg(not(feature = "mongo-store"))]
fn spawn_mongo_supervisor(state: SharedState) {
    error!("built without `mongo-store`; falling back to the in-memory store");
    tokio::spawn(async move {
        state
            .install_store(Arc::new(MemoryContestStore::new()))
            .await;
    });
}

/// Create the first MASTER account once storage is reachable, if requested.
async fn bootstrap_admin(state: SharedState) {
    let Some((username, password)) = auth_service::bootstrap_credentials_from_env() else {
        return;
    };

    let mut degraded = state.degraded_watcher();
    if degraded.wait_for(|value| !*value).await.is_err() {
        return;
    }

    if let Err(err) = auth_service::bootstrap_master(&state, username, password).await {
        error!(error = %err, "failed to create bootstrap master account");
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; only Ctrl+C stops the server");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
