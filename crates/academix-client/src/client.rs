//! Academix backend HTTP client
//!
//! The façade every data-fetch function goes through. Wires the request key
//! resolver, response cache, in-flight coalescer, dispatch gate, and refresh
//! coordinator into one request/response cycle and attaches the standard
//! session headers (bearer token, device identity, tenant identity) to every
//! outbound call.
//!
//! Control flow for a GET: key → cache (hit short-circuits) → coalescer
//! (dedup) → gate (admission) → transport. A 401 on a first attempt is routed
//! to the refresh coordinator and the call is replayed exactly once with the
//! refreshed token; a 401 on a replay surfaces as a final failure.

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use academix_core::config::ClientConfig;
use academix_core::domain::{ApiError, StoredSession};
use academix_core::ports::{Clock, SessionStore, SystemClock};

use crate::cache::ResponseCache;
use crate::coalesce::{Coalescer, Outcome};
use crate::refresh::RefreshCoordinator;
use crate::request_key::RequestKey;
use crate::throttle::DispatchGate;

/// HTTP client for the Academix course-delivery backend
///
/// One instance per process/session: the cache, in-flight table, and
/// throttle state all live here, not in ambient globals, so tests can
/// instantiate isolated clients with their own clock and mock backend.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tenant_id: String,
    cache: Arc<ResponseCache>,
    coalescer: Coalescer,
    gate: Arc<DispatchGate>,
    refresh: Arc<RefreshCoordinator>,
}

impl ApiClient {
    /// Creates a client from configuration with the system clock
    pub fn new(config: &ClientConfig, store: Arc<dyn SessionStore>) -> Self {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    /// Creates a client with an explicit clock (useful for testing)
    pub fn with_clock(
        config: &ClientConfig,
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let http = reqwest::Client::new();
        let cache = Arc::new(ResponseCache::new(
            chrono::Duration::seconds(config.cache.ttl_seconds as i64),
            clock,
        ));
        let gate = Arc::new(DispatchGate::new(
            std::time::Duration::from_millis(config.throttle.cooldown_ms),
            config.throttle.jitter_min_ms,
            config.throttle.jitter_max_ms,
        ));
        let refresh = Arc::new(RefreshCoordinator::new(
            http.clone(),
            config.backend.base_url.clone(),
            store,
        ));

        Self {
            http,
            base_url: config.backend.base_url.clone(),
            tenant_id: config.backend.tenant_id.clone(),
            cache: Arc::clone(&cache),
            coalescer: Coalescer::new(cache),
            gate,
            refresh,
        }
    }

    /// Loads a previously persisted session so it survives a restart.
    ///
    /// Returns true if a session was restored.
    pub async fn restore_session(&self) -> anyhow::Result<bool> {
        self.refresh.restore().await
    }

    /// Returns a copy of the current session, if any
    pub fn session(&self) -> Option<StoredSession> {
        self.refresh.session_snapshot()
    }

    /// Returns true while a live session exists
    pub fn is_authenticated(&self) -> bool {
        self.refresh.has_session()
    }

    /// Returns the response cache (e.g. for an occasional `purge_expired`)
    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub(crate) fn auth(&self) -> &Arc<RefreshCoordinator> {
        &self.refresh
    }

    pub(crate) fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Issues a GET through the full orchestration pipeline.
    ///
    /// Identical concurrent calls (same path, same parameters in any order)
    /// share one network call; fresh cached payloads short-circuit entirely.
    pub async fn get_json(&self, path: &str, params: &[(String, String)]) -> Outcome {
        let key = RequestKey::resolve(path, params);
        let factory = self.dispatch_factory(
            Method::GET,
            path.to_string(),
            params.to_vec(),
            None,
            key.clone(),
        );
        self.coalescer.execute(&key, factory).await
    }

    /// Issues a POST.
    ///
    /// Mutations pass the dispatch gate and the 401-replay path but are
    /// never cached or coalesced: two distinct mutations must both reach the
    /// backend even when textually identical.
    pub async fn post_json(&self, path: &str, body: Option<Value>) -> Outcome {
        let key = RequestKey::resolve(path, &[]);
        // Permit drop (return or abandonment) reopens the gate
        let _permit = self.gate.admit(&key).await;
        send_with_retry(
            self.http.clone(),
            self.base_url.clone(),
            self.tenant_id.clone(),
            Arc::clone(&self.refresh),
            Method::POST,
            path.to_string(),
            Vec::new(),
            body,
        )
        .await
    }

    /// Builds the factory the coalescer runs when a GET is genuinely new.
    fn dispatch_factory(
        &self,
        method: Method,
        path: String,
        params: Vec<(String, String)>,
        body: Option<Value>,
        key: RequestKey,
    ) -> impl FnOnce() -> BoxFuture<'static, Outcome> {
        let http = self.http.clone();
        let base_url = self.base_url.clone();
        let tenant_id = self.tenant_id.clone();
        let refresh = Arc::clone(&self.refresh);
        let gate = Arc::clone(&self.gate);

        move || {
            async move {
                // Permit drop on return, success and failure alike, reopens
                // the gate after the cool-down
                let _permit = gate.admit(&key).await;
                send_with_retry(http, base_url, tenant_id, refresh, method, path, params, body)
                    .await
            }
            .boxed()
        }
    }
}

/// Sends one logical call, recovering a first 401 through the refresh
/// coordinator and replaying at most once.
#[allow(clippy::too_many_arguments)]
async fn send_with_retry(
    http: reqwest::Client,
    base_url: String,
    tenant_id: String,
    refresh: Arc<RefreshCoordinator>,
    method: Method,
    path: String,
    params: Vec<(String, String)>,
    body: Option<Value>,
) -> Outcome {
    // Explicit retry tag: set at most once, never inferred from ambient state
    let mut is_retry = false;

    loop {
        let url = join_url(&base_url, &path);
        let mut request = http.request(method.clone(), &url);

        if !params.is_empty() {
            request = request.query(&params);
        }

        match refresh.session_snapshot() {
            Some(session) => {
                request = request
                    .bearer_auth(&session.access_token)
                    .header("X-Device-Id", &session.device_id)
                    .header("X-Tenant-Id", &session.tenant_id);
            }
            None => {
                request = request.header("X-Tenant-Id", &tenant_id);
            }
        }

        if let Some(body) = &body {
            request = request.json(body);
        }

        debug!(%method, url = %url, is_retry, "Dispatching request");
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED && !is_retry && refresh.has_session() {
            debug!(url = %url, "Received 401, entering refresh cycle");
            refresh.handle_unauthorized().await?;
            is_retry = true;
            continue;
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = message_from_body(&text, status.as_u16());
            if is_retry && status == StatusCode::UNAUTHORIZED {
                warn!(url = %url, "Replayed call rejected again, surfacing failure");
            }
            return Err(ApiError::from_status(status.as_u16(), message));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        if text.is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()));
    }
}

/// Joins the base URL and a path with exactly one separator
fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Extracts a human-readable message from an error response body.
///
/// Prefers the envelope's `message` field, falls back to the raw body, then
/// to the bare status code.
fn message_from_body(text: &str, status: u16) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            return message.to_string();
        }
    }
    if !text.trim().is_empty() {
        return text.trim().to_string();
    }
    format!("HTTP {}", status)
}
