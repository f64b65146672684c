//! Academix Client - API request orchestration layer
//!
//! Async client for the Academix course-delivery backend. For every
//! outbound call it decides whether to serve a cached answer, coalesce with
//! an identical in-flight call, throttle the dispatch, or (when the server
//! reports an expired credential) transparently refresh the credential and
//! replay the call exactly once.
//!
//! ## Modules
//!
//! - [`request_key`] - Canonical identity for logical requests
//! - [`cache`] - TTL-bounded response cache
//! - [`coalesce`] - Single-flight coalescing of identical in-flight calls
//! - [`throttle`] - Coarse global dispatch gate with jittered queueing
//! - [`refresh`] - Single-flight auth token refresh coordination
//! - [`client`] - The `ApiClient` façade wiring it all together
//! - [`endpoints`] - Thin consumer functions (courses, lessons, enrollment)
//! - [`store`] - Durable session store adapters
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use academix_client::client::ApiClient;
//! use academix_client::store::FileSessionStore;
//! use academix_core::config::ClientConfig;
//! use academix_core::domain::CourseQuery;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::load_or_default(&ClientConfig::default_path());
//! let store = Arc::new(FileSessionStore::new(FileSessionStore::default_path()));
//! let client = ApiClient::new(&config, store);
//!
//! client.restore_session().await?;
//! let courses = client.get_courses(&CourseQuery::default()).await?;
//! println!("{} courses", courses.len());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod coalesce;
pub mod endpoints;
pub mod refresh;
pub mod request_key;
pub mod store;
pub mod throttle;

pub use client::ApiClient;
pub use request_key::RequestKey;
