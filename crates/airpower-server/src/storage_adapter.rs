//! Adapters exposing the document store to the auth layer.

use async_trait::async_trait;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use airpower_auth::{ActivityLog, AuthError, AuthResult, UserRecord, UserStatus, UserStorage};
use airpower_storage::{DynDocumentStorage, Query, StoredDocument};

const USERS: &str = "users";
const ACTIVITY: &str = "activity";

/// User store backed by the `users` document collection.
pub struct DocumentUserStore {
    storage: DynDocumentStorage,
}

impl DocumentUserStore {
    pub fn new(storage: DynDocumentStorage) -> Self {
        Self { storage }
    }

    fn decode(doc: &StoredDocument) -> AuthResult<UserRecord> {
        serde_json::from_value(doc.document.clone())
            .map_err(|e| AuthError::service_unavailable(format!("corrupt user record: {e}")))
    }

    fn encode(user: &UserRecord) -> AuthResult<serde_json::Value> {
        serde_json::to_value(user)
            .map_err(|e| AuthError::service_unavailable(format!("user encoding failed: {e}")))
    }
}

#[async_trait]
impl UserStorage for DocumentUserStore {
    async fn find_by_id(&self, id: &str) -> AuthResult<Option<UserRecord>> {
        self.storage
            .read(USERS, id)
            .await?
            .as_ref()
            .map(Self::decode)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<UserRecord>> {
        let query = Query::new()
            .filter("email", serde_json::Value::String(email.to_string()))
            .limit(1);
        let docs = self.storage.find(USERS, &query).await?;
        docs.first().map(Self::decode).transpose()
    }

    async fn create(&self, user: &UserRecord) -> AuthResult<()> {
        self.storage.create(USERS, &Self::encode(user)?).await?;
        Ok(())
    }

    async fn list(&self) -> AuthResult<Vec<UserRecord>> {
        let docs = self.storage.find(USERS, &Query::new()).await?;
        docs.iter().map(Self::decode).collect()
    }

    async fn set_status(&self, id: &str, status: UserStatus) -> AuthResult<()> {
        let doc = self
            .storage
            .read(USERS, id)
            .await?
            .ok_or_else(|| AuthError::unknown_subject(id))?;
        let mut user = Self::decode(&doc)?;
        user.status = status;
        self.storage.update(USERS, id, &Self::encode(&user)?).await?;
        Ok(())
    }
}

/// Activity log persisting one document per request to the `activity`
/// collection. Failures are logged and swallowed.
pub struct DocumentActivityLog {
    storage: DynDocumentStorage,
}

impl DocumentActivityLog {
    pub fn new(storage: DynDocumentStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl ActivityLog for DocumentActivityLog {
    async fn record(&self, user_id: &str, method: &str, path: &str) {
        let id = airpower_core::new_id();
        let at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        let entry = serde_json::json!({
            "id": id,
            "user_id": user_id,
            "method": method,
            "path": path,
            "at": at,
        });
        if let Err(err) = self.storage.create(ACTIVITY, &entry).await {
            tracing::warn!(error = %err, user_id, "failed to record activity");
        }
    }
}
