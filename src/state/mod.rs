pub mod lifecycle;
mod sse;
pub mod transitions;

use std::{
    future::Future,
    sync::Arc,
    time::{Duration, SystemTime},
};

use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::{
    auth::jwt::JwtKeys,
    config::AppConfig,
    dao::{contest_store::ContestStore, models::ContestEntity},
    error::ServiceError,
    services::sse_events::broadcast_system_status,
};

pub use self::lifecycle::{ContestEvent, LifecycleAction, Plan};
pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);

/// Central application state: storage handle, realtime hub and runtime settings.
pub struct AppState {
    store: RwLock<Option<Arc<dyn ContestStore>>>,
    sse: SseHub,
    config: AppConfig,
    jwt: JwtKeys,
    degraded: watch::Sender<bool>,
    transition_gate: Mutex<()>,
    transition_timeout: Option<Duration>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, jwt: JwtKeys) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            store: RwLock::new(None),
            sse: SseHub::new(config.sse_capacity),
            transition_timeout: config.transition_timeout,
            config,
            jwt,
            degraded: degraded_tx,
            transition_gate: Mutex::new(()),
        })
    }

    /// Obtain a handle to the current contest store, if one is installed.
    pub async fn contest_store(&self) -> Option<Arc<dyn ContestStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Current contest store, or [`ServiceError::Degraded`] when none is installed.
    pub async fn require_store(&self) -> Result<Arc<dyn ContestStore>, ServiceError> {
        self.contest_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new contest store implementation and leave degraded mode.
    pub async fn install_store(&self, store: Arc<dyn ContestStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current contest store and enter degraded mode.
    pub async fn clear_store(&self) {
        {
            let mut guard = self.store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update the degraded flag, notifying watchers and SSE clients on change.
    pub fn update_degraded(&self, value: bool) {
        let changed = self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });

        if changed {
            if value {
                warn!("entering degraded mode");
            } else {
                info!("leaving degraded mode");
            }
            broadcast_system_status(self, value);
        }
    }

    /// Broadcast hub backing `/sse/contest`.
    pub fn sse(&self) -> &SseHub {
        &self.sse
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Keys used to sign and verify session tokens.
    pub fn jwt(&self) -> &JwtKeys {
        &self.jwt
    }

    /// Run one lifecycle transition as a serialized read-modify-write.
    ///
    /// The contest is loaded and the action planned, then `work` resolves the
    /// concrete [`ContestEvent`] (e.g. by capturing standings). Those steps are
    /// bounded by the transition timeout; on expiry nothing is written. The
    /// event is then applied and the contest saved in a single write.
    pub async fn run_transition<F, Fut>(
        &self,
        action: LifecycleAction,
        work: F,
    ) -> Result<(ContestEntity, Plan), ServiceError>
    where
        F: FnOnce(Arc<dyn ContestStore>) -> Fut,
        Fut: Future<Output = Result<ContestEvent, ServiceError>>,
    {
        let _gate = self.transition_gate.lock().await;
        let store = self.require_store().await?;

        let prepare = async {
            let contest = store.load_contest().await?;
            contest.plan(action)?;
            let event = work(store.clone()).await?;
            Ok::<_, ServiceError>((contest, event))
        };

        let (mut contest, event) = match self.transition_timeout {
            Some(limit) => match timeout(limit, prepare).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!(%action, timeout_ms = limit.as_millis(), "contest transition timed out");
                    return Err(ServiceError::Timeout);
                }
            },
            None => prepare.await?,
        };

        let plan = contest.apply(event, SystemTime::now())?;
        store.save_contest(contest.clone()).await?;
        info!(%action, from = ?plan.from, to = ?plan.to, "contest transition applied");
        Ok((contest, plan))
    }
}
