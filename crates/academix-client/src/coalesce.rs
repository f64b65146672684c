//! In-flight request coalescing
//!
//! Guarantees one live network call per request key: the first caller for a
//! key registers a shared completion handle, every concurrent caller for the
//! same key attaches to that handle, and all of them observe the identical
//! outcome. The check-and-insert happens under one lock so two callers can
//! never both become "the first".
//!
//! Settlement discipline: when the underlying call settles, its pending
//! entry is removed regardless of outcome, and the cache is populated only
//! on success. A failure therefore never poisons the cache; the next call
//! after a failure starts a fresh attempt.
//!
//! Registered requests run as spawned tasks, so a call abandoned by every
//! caller (timeout, dropped future) still runs to settlement: it releases
//! its pending entry and populates the cache on success.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use tracing::debug;

use academix_core::domain::ApiError;

use crate::cache::ResponseCache;
use crate::request_key::RequestKey;

/// Outcome delivered to every caller of a coalesced request
pub type Outcome = Result<Value, ApiError>;

type SharedOutcome = Shared<BoxFuture<'static, Outcome>>;

/// Ensures at most one pending request exists per key at any instant
pub struct Coalescer {
    cache: Arc<ResponseCache>,
    pending: Arc<Mutex<HashMap<RequestKey, SharedOutcome>>>,
}

impl Coalescer {
    /// Creates a coalescer populating the given cache on success
    pub fn new(cache: Arc<ResponseCache>) -> Self {
        Self {
            cache,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Executes a logical request for `key`.
    ///
    /// 1. A fresh cache entry short-circuits: the factory is never invoked.
    /// 2. An existing pending request for the key is awaited instead of
    ///    invoking the factory.
    /// 3. Otherwise the factory's future is registered as the pending
    ///    request and driven to settlement.
    pub async fn execute<F>(&self, key: &RequestKey, factory: F) -> Outcome
    where
        F: FnOnce() -> BoxFuture<'static, Outcome>,
    {
        if let Some(payload) = self.cache.get(key) {
            debug!(key = %key, "Cache hit, short-circuiting request");
            return Ok(payload);
        }

        let shared = {
            let mut pending = self.pending.lock().unwrap();
            match pending.get(key) {
                Some(existing) => {
                    debug!(key = %key, "Joining in-flight request");
                    existing.clone()
                }
                None => {
                    debug!(key = %key, "Registering new in-flight request");
                    // Spawned so the call settles even if every caller goes
                    // away before it completes.
                    let task = tokio::spawn(Self::settle(
                        Arc::clone(&self.cache),
                        Arc::clone(&self.pending),
                        key.clone(),
                        factory(),
                    ));
                    let shared = async move {
                        match task.await {
                            Ok(outcome) => outcome,
                            Err(e) => {
                                Err(ApiError::Network(format!("request task failed: {}", e)))
                            }
                        }
                    }
                    .boxed()
                    .shared();
                    pending.insert(key.clone(), shared.clone());
                    shared
                }
            }
        };

        shared.await
    }

    /// Drives the underlying call and applies the settlement rules.
    async fn settle(
        cache: Arc<ResponseCache>,
        pending: Arc<Mutex<HashMap<RequestKey, SharedOutcome>>>,
        key: RequestKey,
        inner: BoxFuture<'static, Outcome>,
    ) -> Outcome {
        let outcome = inner.await;

        // Remove the pending entry before fanning out so a caller arriving
        // after settlement starts a fresh request instead of attaching to a
        // finished one.
        pending.lock().unwrap().remove(&key);

        match &outcome {
            Ok(payload) => cache.set(&key, payload.clone()),
            Err(err) => debug!(key = %key, error = %err, "Request settled with error"),
        }

        outcome
    }

    /// Number of requests currently in flight
    pub fn pending_len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}
