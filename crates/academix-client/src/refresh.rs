//! Auth token refresh coordination
//!
//! A small state machine (`Idle` | `Refreshing`) that intercepts 401
//! responses. The first call to observe an expired credential becomes the
//! refresher and issues exactly one call to the refresh endpoint; every
//! other call observing a 401 during that cycle parks on a oneshot waiter.
//! When the cycle settles, all waiters are resolved with the new token or
//! rejected together, atomically, exactly once.
//!
//! The coordinator is also the sole owner of the session record: it rotates
//! the token on a successful refresh, and when the backend rejects the
//! refresh it clears the session entirely (memory and durable store) so
//! callers observe a hard "logged out" state. A transport failure or a
//! malformed response is not a verdict on the credential: the cycle's
//! waiters share that error and the session stays in place, so a later 401
//! can start a fresh refresh attempt.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use academix_core::domain::{ApiEnvelope, ApiError, StoredSession};
use academix_core::ports::SessionStore;

/// Path of the refresh endpoint, relative to the backend base URL
const REFRESH_PATH: &str = "/auth/refresh-token";

/// Payload of a successful refresh response
#[derive(Debug, Deserialize)]
struct RefreshData {
    token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshPhase {
    Idle,
    Refreshing,
}

struct RefreshState {
    phase: RefreshPhase,
    /// Callers parked on the current cycle, in arrival order
    waiters: VecDeque<oneshot::Sender<Result<String, ApiError>>>,
}

/// Single-flight credential refresh coordinator
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
    session: Mutex<Option<StoredSession>>,
    store: Arc<dyn SessionStore>,
    http: reqwest::Client,
    base_url: String,
}

impl RefreshCoordinator {
    /// Creates a coordinator for the given backend and durable store
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            state: Mutex::new(RefreshState {
                phase: RefreshPhase::Idle,
                waiters: VecDeque::new(),
            }),
            session: Mutex::new(None),
            store,
            http,
            base_url: base_url.into(),
        }
    }

    /// Loads a previously persisted session into memory.
    ///
    /// Returns true if a session was restored.
    pub async fn restore(&self) -> anyhow::Result<bool> {
        match self.store.load().await? {
            Some(session) => {
                info!(user = %session.profile.email, "Restored persisted session");
                *self.session.lock().unwrap() = Some(session);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Installs a freshly created session (login) and persists it
    pub async fn install_session(&self, session: StoredSession) {
        *self.session.lock().unwrap() = Some(session.clone());
        if let Err(e) = self.store.save(&session).await {
            warn!(error = %e, "Failed to persist session, continuing in memory");
        }
    }

    /// Destroys the session in memory and in the durable store
    pub async fn clear_session(&self) {
        *self.session.lock().unwrap() = None;
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "Failed to clear persisted session");
        }
    }

    /// Returns the current bearer token, if a session exists
    pub fn current_token(&self) -> Option<String> {
        self.session
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    /// Returns a copy of the current session, if any
    pub fn session_snapshot(&self) -> Option<StoredSession> {
        self.session.lock().unwrap().clone()
    }

    /// Returns true while a live session exists
    pub fn has_session(&self) -> bool {
        self.session.lock().unwrap().is_some()
    }

    /// Entry point for calls that received a 401 with `is_retry == false`.
    ///
    /// Joins the in-progress refresh cycle if one exists, otherwise becomes
    /// the refresher. Resolves with the new bearer token the caller must
    /// replay with, or with the shared failure of the cycle.
    pub async fn handle_unauthorized(&self) -> Result<String, ApiError> {
        let waiter = {
            let mut state = self.state.lock().unwrap();
            match state.phase {
                RefreshPhase::Refreshing => {
                    let (tx, rx) = oneshot::channel();
                    state.waiters.push_back(tx);
                    debug!(waiters = state.waiters.len(), "Joining refresh cycle");
                    Some(rx)
                }
                RefreshPhase::Idle => {
                    state.phase = RefreshPhase::Refreshing;
                    None
                }
            }
        };

        match waiter {
            Some(rx) => rx.await.map_err(|_| ApiError::SessionExpired)?,
            None => self.run_cycle().await,
        }
    }

    /// Runs one complete refresh cycle as the refresher.
    async fn run_cycle(&self) -> Result<String, ApiError> {
        info!("Starting credential refresh cycle");

        match self.request_new_token().await {
            Ok(token) => {
                let rotated = {
                    let mut session = self.session.lock().unwrap();
                    if let Some(current) = session.as_mut() {
                        *current = current.with_token(&token);
                    }
                    session.clone()
                };

                if let Some(session) = rotated {
                    if let Err(e) = self.store.save(&session).await {
                        warn!(error = %e, "Failed to persist rotated token, continuing in memory");
                    }
                }

                info!("Credential refresh succeeded");
                self.finish_cycle(Ok(token.clone()));
                Ok(token)
            }
            Err(err) => {
                let outcome = if matches!(
                    err,
                    ApiError::Network(_) | ApiError::InvalidResponse(_)
                ) {
                    // No verdict from the backend; keep the session so a
                    // later 401 can start a new cycle
                    warn!(error = %err, "Credential refresh did not complete, keeping session");
                    err
                } else {
                    warn!(error = %err, "Credential refresh rejected, ending session");
                    self.clear_session().await;
                    ApiError::SessionExpired
                };
                self.finish_cycle(Err(outcome.clone()));
                Err(outcome)
            }
        }
    }

    /// Issues the single outbound refresh call of a cycle.
    async fn request_new_token(&self) -> Result<String, ApiError> {
        let session = self
            .session
            .lock()
            .unwrap()
            .clone()
            .ok_or(ApiError::SessionExpired)?;

        let url = format!("{}{}", self.base_url, REFRESH_PATH);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&session.access_token)
            .header("X-Device-Id", &session.device_id)
            .header("X-Tenant-Id", &session.tenant_id)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(
                status.as_u16(),
                "refresh endpoint rejected the credential",
            ));
        }

        let envelope: ApiEnvelope<RefreshData> = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        envelope
            .into_data()
            .map(|data| data.token)
            .map_err(ApiError::InvalidResponse)
    }

    /// Settles the cycle: transitions back to `Idle` and delivers the shared
    /// outcome to every waiter. Exactly one of resolve-all / reject-all runs
    /// per cycle; both the transition and the drain happen under one lock.
    fn finish_cycle(&self, outcome: Result<String, ApiError>) {
        let waiters = {
            let mut state = self.state.lock().unwrap();
            state.phase = RefreshPhase::Idle;
            std::mem::take(&mut state.waiters)
        };

        debug!(waiters = waiters.len(), "Settling refresh cycle");
        for waiter in waiters {
            // A dropped receiver only means that caller went away
            let _ = waiter.send(outcome.clone());
        }
    }

    /// Number of callers parked on the current cycle
    pub fn waiter_count(&self) -> usize {
        self.state.lock().unwrap().waiters.len()
    }
}
