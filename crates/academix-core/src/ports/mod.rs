//! Port definitions (trait interfaces for adapters)
//!
//! Ports use `anyhow::Result` because errors at port boundaries are
//! adapter-specific and don't need domain-level classification.

pub mod clock;
pub mod session_store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use session_store::SessionStore;
