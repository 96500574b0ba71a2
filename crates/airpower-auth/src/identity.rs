//! The projected identity attached to authenticated requests.

use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::user::UserRecord;

/// The minimal view of a user that handlers see.
///
/// Exactly these three fields are cached and attached to requests;
/// password hashes and account status never leave the auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User id, the token subject.
    pub id: String,
    /// User email address.
    pub email: String,
    /// Role name, e.g. `"viewer"` or `"admin"`.
    pub role: String,
}

impl Identity {
    /// Projects a full user record down to the identity view.
    #[must_use]
    pub fn from_user(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
        }
    }

    /// Returns `true` when the identity holds exactly `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }

    /// Fails with [`AuthError::InsufficientRole`] unless the identity
    /// holds `role`.
    pub fn require_role(&self, role: &str) -> Result<(), AuthError> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(AuthError::insufficient_role(role))
        }
    }

    /// Serializes the identity to its cached string form.
    pub fn to_cache_value(&self) -> Result<String, AuthError> {
        serde_json::to_string(self)
            .map_err(|e| AuthError::service_unavailable(format!("identity encoding failed: {e}")))
    }

    /// Parses a cached string back into an identity.
    pub fn from_cache_value(value: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(value)
    }
}
