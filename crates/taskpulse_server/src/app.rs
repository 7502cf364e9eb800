//! Server assembly.
//!
//! # Responsibility
//! - Wire storage, scheduler session and presenters from configuration.
//! - Serve the router until cancelled, then stop the scheduler.
//!
//! # Invariants
//! - One scheduler session per process, sharing the CRUD service's store.
//! - Shutdown waits for the scheduler loop to exit.

use crate::error::ServerError;
use crate::presenters::{LogCue, NotificationFeed, PushOutbox};
use crate::routes::router;
use axum::http::HeaderValue;
use log::{info, warn};
use std::sync::Arc;
use std::time::Instant;
use taskpulse_core::config::NotificationConfig;
use taskpulse_core::{
    open_repository, run_scheduler, Channel, Clock, Config, NotificationDispatcher, Profile,
    SchedulerSession, SchedulerSettings, SystemClock, TaskRepository, TaskService, TaskStore,
};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TaskService>,
    pub session: Arc<SchedulerSession>,
    pub feed: Arc<NotificationFeed>,
    pub push: Arc<PushOutbox>,
    pub clock: Arc<dyn Clock>,
    pub started_at: Instant,
}

/// Builds the state for `repo`. Must run inside a tokio runtime.
pub fn build_state(
    repo: Arc<dyn TaskRepository>,
    clock: Arc<dyn Clock>,
    settings: &SchedulerSettings,
    notifications: &NotificationConfig,
) -> AppState {
    let store = Arc::new(TaskStore::new(repo));
    let feed = Arc::new(NotificationFeed::new());
    let push = Arc::new(PushOutbox::new(reqwest::Client::new(), Handle::current()));

    let mut dispatcher =
        NotificationDispatcher::new(push.clone(), settings.snooze_minutes, settings.modal_timeout);
    if notifications.native {
        dispatcher = dispatcher.with_presenter(Channel::Native, push.clone());
    }
    if notifications.modal {
        dispatcher = dispatcher.with_presenter(Channel::Modal, feed.clone());
    }
    if notifications.cue {
        dispatcher = dispatcher.with_presenter(Channel::Cue, Arc::new(LogCue));
    }

    let session = Arc::new(SchedulerSession::new(
        store.clone(),
        clock.clone(),
        dispatcher,
        settings,
    ));

    AppState {
        service: Arc::new(TaskService::new(store, clock.clone())),
        session,
        feed,
        push,
        clock,
        started_at: Instant::now(),
    }
}

/// Runs the HTTP server and scheduler until `cancel` fires.
pub async fn run_server(
    config: &Config,
    profile: Profile,
    cancel: CancellationToken,
) -> Result<(), ServerError> {
    let settings = config.scheduler.to_settings();
    let database_path = config.database_path(profile)?;
    let repo = open_repository(config.storage.backend, &database_path)?;
    let state = build_state(
        repo,
        Arc::new(SystemClock),
        &settings,
        &config.notifications,
    );

    let scheduler = tokio::spawn(run_scheduler(
        state.session.clone(),
        None,
        settings.poll_interval,
        cancel.child_token(),
    ));

    let app = router(state).layer(cors_layer(&config.server.cors_origins));
    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    let addr = listener.local_addr()?;
    info!(
        "event=server_start module=server status=ok addr={addr} backend={:?}",
        config.storage.backend
    );

    let shutdown = cancel.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await;

    cancel.cancel();
    if let Err(err) = scheduler.await {
        warn!("event=scheduler_stop module=server status=error error={err}");
    }
    info!("event=server_stop module=server status=ok");
    served.map_err(ServerError::from)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("event=cors_origin module=server status=skip origin={origin}");
                None
            }
        })
        .collect();
    CorsLayer::permissive().allow_origin(AllowOrigin::list(allowed))
}
