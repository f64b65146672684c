//! Session store port (driven/secondary port)
//!
//! The durable client-side key-value store the session record survives a
//! reload in. The contract is deliberately all-or-nothing: `save` persists
//! the whole record (token, profile, authenticated flag), `clear` removes
//! all of it. Partial persistence is not representable.

use async_trait::async_trait;

use crate::domain::session::StoredSession;

/// Durable storage for the authenticated session
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the persisted session, if one exists
    async fn load(&self) -> anyhow::Result<Option<StoredSession>>;

    /// Persists the full session record, overwriting any previous one
    async fn save(&self, session: &StoredSession) -> anyhow::Result<()>;

    /// Removes the persisted session entirely
    async fn clear(&self) -> anyhow::Result<()>;
}
