//! Session lifecycle and single-flight token refresh.
//!
//! [`SessionManager`] owns the access/refresh token pair and coordinates
//! the one piece of real concurrency policy in the client: when several
//! requests hit an expired access token at once, exactly one refresh call
//! goes out and every blocked request is released with its result, in
//! arrival order.

use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::oneshot;

use glowdesk_core::session::{TokenPair, TokenStore};

use crate::error::ApiError;

/// Where the session currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No token pair is held; requests go out unauthenticated.
    Unauthenticated,
    /// A token pair is held and no refresh is in flight.
    Authenticated,
    /// A refresh call is outstanding; expired requests are queued on it.
    Refreshing,
}

/// Supplies the current access token to collaborators that attach it
/// themselves (the push channel authenticates its connection URL with it).
pub trait TokenSource: Send + Sync {
    fn access_token(&self) -> Option<String>;
}

/// Performs the actual refresh call. Injected so the single-flight
/// coordination can be exercised without a network.
#[async_trait::async_trait]
pub trait RefreshTransport: Send + Sync {
    /// Exchange a refresh token for a new token pair.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError>;
}

/// One request blocked on the in-flight refresh. Receives the new access
/// token, or an error when the refresh fails.
type Waiter = oneshot::Sender<Result<String, ApiError>>;

#[derive(Default)]
struct RefreshQueue {
    in_flight: bool,
    waiters: Vec<Waiter>,
}

/// What `refreshed_access_token` decided for this caller.
enum Role {
    /// First expired request: perform the refresh and settle the queue.
    Leader,
    /// A refresh is already out: wait for its result.
    Follower(oneshot::Receiver<Result<String, ApiError>>),
}

/// Owns the token pair and the refresh queue.
///
/// Constructed once at application start and shared (`Arc`) between the
/// HTTP client, the push channel, and the UI layer.
pub struct SessionManager {
    store: Arc<dyn TokenStore>,
    transport: Arc<dyn RefreshTransport>,
    tokens: RwLock<Option<TokenPair>>,
    refresh: Mutex<RefreshQueue>,
}

impl SessionManager {
    /// Create a manager, restoring any persisted token pair so a previous
    /// session survives a restart.
    pub fn new(store: Arc<dyn TokenStore>, transport: Arc<dyn RefreshTransport>) -> Self {
        let tokens = store.load();
        if tokens.is_some() {
            tracing::debug!("Restored persisted session tokens");
        }
        Self {
            store,
            transport,
            tokens: RwLock::new(tokens),
            refresh: Mutex::new(RefreshQueue::default()),
        }
    }

    /// Current access token, if authenticated.
    pub fn access_token(&self) -> Option<String> {
        self.read_tokens().map(|t| t.access)
    }

    /// Whether a token pair is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.read_tokens().is_some()
    }

    /// Current lifecycle position.
    pub fn status(&self) -> SessionStatus {
        let refreshing = self.lock_queue().in_flight;
        if refreshing {
            SessionStatus::Refreshing
        } else if self.is_authenticated() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Unauthenticated
        }
    }

    /// Store a new token pair. All subsequent requests use it immediately.
    pub fn set_tokens(&self, access: impl Into<String>, refresh: impl Into<String>) {
        self.set_token_pair(TokenPair {
            access: access.into(),
            refresh: refresh.into(),
        });
    }

    /// Store a new token pair, persisting it through the token store.
    pub fn set_token_pair(&self, tokens: TokenPair) {
        self.store.save(&tokens);
        *self.write_tokens() = Some(tokens);
    }

    /// Drop the token pair. Subsequent requests go out unauthenticated
    /// until `set_tokens` is called again.
    pub fn clear_tokens(&self) {
        self.store.clear();
        *self.write_tokens() = None;
    }

    /// Obtain a fresh access token, sharing one refresh call between every
    /// concurrent caller.
    ///
    /// The first caller becomes the leader and performs the refresh; callers
    /// arriving while it is outstanding are queued and released in arrival
    /// order with the leader's result. On refresh failure the session is
    /// cleared and every queued caller gets [`ApiError::SessionExpired`].
    pub async fn refreshed_access_token(&self) -> Result<String, ApiError> {
        let role = {
            let mut queue = self.lock_queue();
            if queue.in_flight {
                let (tx, rx) = oneshot::channel();
                queue.waiters.push(tx);
                Role::Follower(rx)
            } else {
                queue.in_flight = true;
                Role::Leader
            }
        };

        match role {
            Role::Follower(rx) => match rx.await {
                Ok(result) => result,
                // Leader dropped without settling; treat as a failed refresh.
                Err(_) => Err(ApiError::SessionExpired),
            },
            Role::Leader => self.lead_refresh().await,
        }
    }

    /// Perform the refresh call and settle the waiter queue atomically.
    async fn lead_refresh(&self) -> Result<String, ApiError> {
        let refresh_token = self.read_tokens().map(|t| t.refresh);

        let result = match refresh_token {
            Some(token) => self.transport.refresh(&token).await,
            None => Err(ApiError::SessionExpired),
        };

        let outcome = match result {
            Ok(pair) => {
                let access = pair.access.clone();
                self.set_token_pair(pair);
                tracing::debug!("Access token refreshed");
                Ok(access)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, clearing session");
                self.clear_tokens();
                Err(ApiError::SessionExpired)
            }
        };

        let waiters = {
            let mut queue = self.lock_queue();
            queue.in_flight = false;
            std::mem::take(&mut queue.waiters)
        };

        for waiter in waiters {
            let message = match &outcome {
                Ok(access) => Ok(access.clone()),
                Err(_) => Err(ApiError::SessionExpired),
            };
            // A waiter that gave up on its request may have dropped the
            // receiving half; that is fine.
            let _ = waiter.send(message);
        }

        outcome
    }

    // ---- lock helpers ----

    fn read_tokens(&self) -> Option<TokenPair> {
        self.tokens
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn write_tokens(&self) -> std::sync::RwLockWriteGuard<'_, Option<TokenPair>> {
        self.tokens.write().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, RefreshQueue> {
        self.refresh.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TokenSource for SessionManager {
    fn access_token(&self) -> Option<String> {
        SessionManager::access_token(self)
    }
}
