//! Global dispatch throttle
//!
//! A coarse valve over *new* dispatches (calls that were neither served from
//! cache nor attached to an in-flight request). While one dispatch is live,
//! further distinct keys queue and re-check admission after a randomized
//! jitter delay so a burst of UI-driven calls does not re-synchronize into a
//! stampede. The gate reopens only after the live call settles plus a fixed
//! cool-down.
//!
//! Admission is witnessed by a [`DispatchPermit`]: dropping the permit, on
//! normal settlement or when the holding future is abandoned mid-flight,
//! schedules the cool-down and reopens the gate. A wedged-open gate is not
//! representable.
//!
//! This is deliberately one global boolean gate, not a per-endpoint rate
//! limiter: cheap backpressure against bursts of logically-identical calls,
//! nothing more.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::request_key::RequestKey;

#[derive(Debug, Default)]
struct GateState {
    busy: bool,
    /// Keys waiting for admission, in first-seen order
    queued: Vec<RequestKey>,
}

/// Admission gate for new dispatches
pub struct DispatchGate {
    state: Mutex<GateState>,
    cooldown: Duration,
    jitter_min_ms: u64,
    jitter_max_ms: u64,
}

/// Witness of an admitted dispatch.
///
/// Dropping the permit schedules the cool-down and then reopens the gate,
/// whether the dispatch finished or its holder was dropped mid-flight.
#[must_use = "the gate stays closed until the permit is dropped"]
pub struct DispatchPermit {
    gate: Arc<DispatchGate>,
}

impl Drop for DispatchPermit {
    fn drop(&mut self) {
        let gate = Arc::clone(&self.gate);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(gate.cooldown).await;
                    gate.reopen();
                });
            }
            // Runtime already gone (shutdown): skip the cool-down
            Err(_) => gate.reopen(),
        }
    }
}

impl DispatchGate {
    /// Creates a gate with the given cool-down and jitter bounds
    pub fn new(cooldown: Duration, jitter_min_ms: u64, jitter_max_ms: u64) -> Self {
        Self {
            state: Mutex::new(GateState::default()),
            cooldown,
            jitter_min_ms: jitter_min_ms.min(jitter_max_ms),
            jitter_max_ms: jitter_max_ms.max(1),
        }
    }

    /// Waits until `key` is admitted for dispatch.
    ///
    /// If the gate is idle the key is admitted immediately and the gate
    /// becomes busy. Otherwise the key joins the queue and re-checks after a
    /// randomized delay. The gate stays closed until the returned permit is
    /// dropped, plus the cool-down.
    pub async fn admit(self: &Arc<Self>, key: &RequestKey) -> DispatchPermit {
        loop {
            {
                let mut state = self.state.lock().unwrap();
                if !state.busy {
                    state.busy = true;
                    state.queued.retain(|queued| queued != key);
                    debug!(key = %key, "Dispatch admitted");
                    return DispatchPermit {
                        gate: Arc::clone(self),
                    };
                }
                if !state.queued.iter().any(|queued| queued == key) {
                    debug!(key = %key, "Gate busy, queueing dispatch");
                    state.queued.push(key.clone());
                }
            }

            // Jitter desynchronizes queued callers re-checking admission.
            let wait_ms = {
                let mut rng = rand::thread_rng();
                rng.gen_range(self.jitter_min_ms..=self.jitter_max_ms)
            };
            tokio::time::sleep(Duration::from_millis(wait_ms)).await;
        }
    }

    fn reopen(&self) {
        let mut state = self.state.lock().unwrap();
        state.busy = false;
        debug!(queued = state.queued.len(), "Gate reopened after cool-down");
    }

    /// Number of keys currently waiting for admission
    pub fn queued_len(&self) -> usize {
        self.state.lock().unwrap().queued.len()
    }

    /// Returns true while a dispatch is live or cooling down
    pub fn is_busy(&self) -> bool {
        self.state.lock().unwrap().busy
    }
}
