//! Authenticated session record
//!
//! Defines the session state persisted across reloads: the bearer token,
//! the device/tenant identity sent with every request, the minimal user
//! profile, and the "is authenticated" flag. All of it is written and
//! cleared together.
//!
//! Ownership rule: after login, only the token refresh coordinator mutates
//! the session (token rotation on refresh, full clear on unrecoverable
//! refresh failure or logout). Every other component reads it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimal user profile returned by the login endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Backend identifier of the user
    pub id: String,
    /// Display name
    pub name: String,
    /// Email address used at login
    pub email: String,
}

/// The process-wide authenticated session
///
/// Created at login, mutated only by the refresh coordinator on a successful
/// token refresh, destroyed on logout or unrecoverable refresh failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    /// Bearer token attached to every outbound request
    pub access_token: String,
    /// Stable device identifier, generated once at login
    pub device_id: String,
    /// Tenant (organization) this session belongs to
    pub tenant_id: String,
    /// Minimal profile of the logged-in user
    pub profile: UserProfile,
    /// True while the session is considered live
    pub authenticated: bool,
}

impl StoredSession {
    /// Creates a new session at login time with a freshly generated device id
    pub fn new(
        access_token: impl Into<String>,
        tenant_id: impl Into<String>,
        profile: UserProfile,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            device_id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.into(),
            profile,
            authenticated: true,
        }
    }

    /// Returns a copy of this session carrying a rotated access token.
    ///
    /// Used by the refresh coordinator; everything except the token is
    /// preserved so device and tenant identity stay stable across refreshes.
    pub fn with_token(&self, access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            ..self.clone()
        }
    }
}
