//! User records and the store the authenticator resolves subjects from.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::AuthResult;

/// Lifecycle state of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// The account may authenticate.
    Active,
    /// The account exists but must not authenticate.
    Suspended,
}

/// A stored user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Stable user id, used as the token subject.
    pub id: String,
    /// Email address, unique across users.
    pub email: String,
    /// Role name.
    pub role: String,
    /// Password hash; absent for accounts provisioned out of band.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// Account lifecycle state.
    pub status: UserStatus,
    /// Creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl UserRecord {
    /// Creates a new active user.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        role: impl Into<String>,
        password_hash: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            role: role.into(),
            password_hash,
            status: UserStatus::Active,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Returns `true` when the account may authenticate.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

/// Persistence operations the auth layer needs for users.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Looks a user up by id; `Ok(None)` when no record exists.
    async fn find_by_id(&self, id: &str) -> AuthResult<Option<UserRecord>>;

    /// Looks a user up by email; `Ok(None)` when no record exists.
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<UserRecord>>;

    /// Stores a new user record.
    async fn create(&self, user: &UserRecord) -> AuthResult<()>;

    /// Lists all user records.
    async fn list(&self) -> AuthResult<Vec<UserRecord>>;

    /// Updates the lifecycle state of a user.
    async fn set_status(&self, id: &str, status: UserStatus) -> AuthResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_is_active() {
        let user = UserRecord::new("u1", "a@example.com", "viewer", None);
        assert!(user.is_active());
    }

    #[test]
    fn suspended_user_is_not_active() {
        let mut user = UserRecord::new("u1", "a@example.com", "viewer", None);
        user.status = UserStatus::Suspended;
        assert!(!user.is_active());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&UserStatus::Suspended).unwrap();
        assert_eq!(json, "\"suspended\"");
    }
}
