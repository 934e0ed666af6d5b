//! Top-level synchronizer handle.
//!
//! [`NotificationSync`] owns the store and the push channel task:
//! [`start`](NotificationSync::start) performs the initial feed pull and
//! keeps it synchronized until [`shutdown`](NotificationSync::shutdown),
//! which announces departure and waits for the task to exit.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use glowdesk_client::session::TokenSource;
use glowdesk_core::types::DbId;

use crate::api::NotificationApi;
use crate::channel::{run_channel, ChannelState};
use crate::store::NotificationStore;

/// Synchronizer configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Push channel base URL, e.g. `ws://host/ws`.
    pub ws_url: String,
    /// The business (tenant) whose notification group to join.
    pub business_id: DbId,
    /// First reconnect delay.
    pub initial_backoff: Duration,
    /// Upper bound on the reconnect delay.
    pub max_backoff: Duration,
}

impl SyncConfig {
    /// Config with the default backoff window (1s..30s).
    pub fn new(ws_url: impl Into<String>, business_id: DbId) -> Self {
        Self {
            ws_url: ws_url.into(),
            business_id,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

/// Owns the notification store and its push channel task.
///
/// Created once per authenticated session, after the business id is
/// known. Dropping the handle without calling `shutdown` leaves the
/// channel running until the process exits.
///
/// # Usage
///
/// ```no_run
/// use std::sync::Arc;
///
/// use glowdesk_client::config::ClientConfig;
/// use glowdesk_client::http::ApiClient;
/// use glowdesk_core::toast::TracingToast;
/// use glowdesk_notify::api::RestNotificationApi;
/// use glowdesk_notify::sync::{NotificationSync, SyncConfig};
///
/// # async fn wire(business_id: i64) {
/// let config = ClientConfig::from_env();
/// let client = ApiClient::bootstrap(&config, Arc::new(TracingToast));
///
/// let sync = NotificationSync::start(
///     SyncConfig::new(config.ws_url.clone(), business_id),
///     Arc::new(RestNotificationApi::new(client.clone())),
///     client.session().clone(),
/// );
///
/// let unread = sync.store().unread_count().await;
/// # let _ = unread;
/// # }
/// ```
pub struct NotificationSync {
    store: Arc<NotificationStore>,
    state_rx: watch::Receiver<ChannelState>,
    cancel: CancellationToken,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl NotificationSync {
    /// Pull the initial feed and spawn the push channel loop.
    pub fn start(
        config: SyncConfig,
        api: Arc<dyn NotificationApi>,
        tokens: Arc<dyn TokenSource>,
    ) -> Arc<Self> {
        let store = Arc::new(NotificationStore::new(api));
        let (state_tx, state_rx) = watch::channel(ChannelState::Disconnected);
        let cancel = CancellationToken::new();

        let task = {
            let store = store.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokens.access_token().is_some() {
                    store.refresh().await;
                }
                run_channel(config, tokens, store, state_tx, cancel).await;
                tracing::debug!("Notification sync task exited");
            })
        };

        Arc::new(Self {
            store,
            state_rx,
            cancel,
            task: Mutex::new(Some(task)),
        })
    }

    /// The store holding the synchronized notification state.
    pub fn store(&self) -> &Arc<NotificationStore> {
        &self.store
    }

    /// Current push channel state.
    pub fn channel_state(&self) -> ChannelState {
        *self.state_rx.borrow()
    }

    /// Watch receiver for channel state transitions.
    pub fn state_changes(&self) -> watch::Receiver<ChannelState> {
        self.state_rx.clone()
    }

    /// Tear the channel down: leave the business group, close the
    /// connection, and wait (bounded) for the task to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let task = self
            .task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(task) = task {
            let _ = tokio::time::timeout(Duration::from_secs(5), task).await;
        }
    }
}
