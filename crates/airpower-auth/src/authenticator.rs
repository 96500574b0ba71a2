//! The token authentication flow.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::IdentityCache;
use crate::error::AuthError;
use crate::identity::Identity;
use crate::jwt::TokenVerifier;
use crate::user::UserStorage;

/// Authenticates bearer tokens into [`Identity`] values.
///
/// The flow is: extract the bearer token, probe the cache, and only on a
/// miss verify the signature, resolve the subject, and check the account
/// status before projecting and caching the identity.
pub struct TokenAuthenticator {
    verifier: Arc<dyn TokenVerifier>,
    users: Arc<dyn UserStorage>,
    cache: Arc<dyn IdentityCache>,
    cache_ttl: Duration,
}

impl TokenAuthenticator {
    /// Creates an authenticator over its three collaborators.
    #[must_use]
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        users: Arc<dyn UserStorage>,
        cache: Arc<dyn IdentityCache>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            verifier,
            users,
            cache,
            cache_ttl,
        }
    }

    /// The cache this authenticator writes through.
    #[must_use]
    pub fn cache(&self) -> &Arc<dyn IdentityCache> {
        &self.cache
    }

    /// Authenticates the value of an `Authorization` header.
    ///
    /// `header` is the raw header value, or `None` when the request did
    /// not carry one. Any failure aborts the whole flow; a cached entry
    /// short-circuits verification and user resolution entirely.
    pub async fn authenticate(&self, header: Option<&str>) -> Result<Identity, AuthError> {
        let token = extract_bearer(header)?;

        if let Some(cached) = self.cache.get(token).await? {
            match Identity::from_cache_value(&cached) {
                Ok(identity) => return Ok(identity),
                Err(err) => {
                    // Treat a corrupt entry as a miss and drop it so the
                    // next request does not hit it again.
                    tracing::warn!(error = %err, "discarding corrupt cache entry");
                    self.cache.invalidate(token).await?;
                }
            }
        }

        let claims = self.verifier.verify(token).await?;

        let user = self
            .users
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| AuthError::unknown_subject(&claims.sub))?;

        if !user.is_active() {
            return Err(AuthError::InactiveAccount);
        }

        let identity = Identity::from_user(&user);
        let value = identity.to_cache_value()?;
        self.cache.set(token, &value, self.cache_ttl).await?;

        Ok(identity)
    }
}

/// Pulls the token out of a bearer `Authorization` header value.
///
/// Anything other than `Bearer <nonempty token>` is a missing credential,
/// including other schemes such as `Basic`.
fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or_else(|| AuthError::missing_credential("no authorization header"))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::missing_credential("authorization header is not a bearer token"))?;
    if token.is_empty() {
        return Err(AuthError::missing_credential("empty bearer token"));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::cache::LocalIdentityCache;
    use crate::jwt::Claims;
    use crate::user::{UserRecord, UserStatus};
    use crate::AuthResult;

    /// Verifier that accepts any token whose text names an existing
    /// subject, counting calls.
    struct CountingVerifier {
        calls: AtomicUsize,
        expired: bool,
        invalid: bool,
    }

    impl CountingVerifier {
        fn ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                expired: false,
                invalid: false,
            }
        }

        fn expired() -> Self {
            Self {
                expired: true,
                ..Self::ok()
            }
        }

        fn invalid() -> Self {
            Self {
                invalid: true,
                ..Self::ok()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenVerifier for CountingVerifier {
        async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.expired {
                return Err(AuthError::ExpiredCredential);
            }
            if self.invalid {
                return Err(AuthError::invalid_credential("bad signature"));
            }
            // Token text doubles as the subject for these tests.
            Ok(Claims::new(token, Duration::from_secs(60)))
        }
    }

    /// User store over a fixed slice, counting lookups.
    struct CountingUserStore {
        users: Vec<UserRecord>,
        lookups: AtomicUsize,
    }

    impl CountingUserStore {
        fn with(users: Vec<UserRecord>) -> Self {
            Self {
                users,
                lookups: AtomicUsize::new(0),
            }
        }

        fn lookups(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UserStorage for CountingUserStore {
        async fn find_by_id(&self, id: &str) -> AuthResult<Option<UserRecord>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self.users.iter().find(|u| u.id == id).cloned())
        }

        async fn find_by_email(&self, email: &str) -> AuthResult<Option<UserRecord>> {
            Ok(self.users.iter().find(|u| u.email == email).cloned())
        }

        async fn create(&self, _user: &UserRecord) -> AuthResult<()> {
            Ok(())
        }

        async fn list(&self) -> AuthResult<Vec<UserRecord>> {
            Ok(self.users.clone())
        }

        async fn set_status(&self, _id: &str, _status: UserStatus) -> AuthResult<()> {
            Ok(())
        }
    }

    fn user(id: &str) -> UserRecord {
        UserRecord::new(id, format!("{id}@example.com"), "viewer", None)
    }

    fn authenticator(
        verifier: Arc<CountingVerifier>,
        users: Arc<CountingUserStore>,
    ) -> (TokenAuthenticator, Arc<LocalIdentityCache>) {
        let cache = Arc::new(LocalIdentityCache::new());
        let auth = TokenAuthenticator::new(
            verifier,
            users,
            cache.clone(),
            Duration::from_secs(3600),
        );
        (auth, cache)
    }

    #[tokio::test]
    async fn valid_token_yields_identity_and_caches_it() {
        let verifier = Arc::new(CountingVerifier::ok());
        let users = Arc::new(CountingUserStore::with(vec![user("u1")]));
        let (auth, cache) = authenticator(verifier.clone(), users.clone());

        let identity = auth.authenticate(Some("Bearer u1")).await.unwrap();

        assert_eq!(identity.id, "u1");
        assert_eq!(identity.email, "u1@example.com");
        assert_eq!(identity.role, "viewer");
        assert_eq!(verifier.calls(), 1);
        assert_eq!(users.lookups(), 1);
        // The raw token is the cache key.
        assert!(cache.get("u1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn second_authenticate_of_same_token_skips_collaborators() {
        let verifier = Arc::new(CountingVerifier::ok());
        let users = Arc::new(CountingUserStore::with(vec![user("u1")]));
        let (auth, _cache) = authenticator(verifier.clone(), users.clone());

        let first = auth.authenticate(Some("Bearer u1")).await.unwrap();
        let second = auth.authenticate(Some("Bearer u1")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(verifier.calls(), 1);
        assert_eq!(users.lookups(), 1);
    }

    #[tokio::test]
    async fn missing_header_is_missing_credential() {
        let verifier = Arc::new(CountingVerifier::ok());
        let users = Arc::new(CountingUserStore::with(vec![]));
        let (auth, _) = authenticator(verifier.clone(), users);

        let err = auth.authenticate(None).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredential { .. }));
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_missing_credential() {
        let verifier = Arc::new(CountingVerifier::ok());
        let users = Arc::new(CountingUserStore::with(vec![]));
        let (auth, _) = authenticator(verifier.clone(), users);

        let err = auth.authenticate(Some("Basic abc123")).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredential { .. }));
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn empty_bearer_token_is_missing_credential() {
        let verifier = Arc::new(CountingVerifier::ok());
        let users = Arc::new(CountingUserStore::with(vec![]));
        let (auth, _) = authenticator(verifier, users);

        let err = auth.authenticate(Some("Bearer ")).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredential { .. }));
    }

    #[tokio::test]
    async fn expired_token_is_not_cached() {
        let verifier = Arc::new(CountingVerifier::expired());
        let users = Arc::new(CountingUserStore::with(vec![user("u1")]));
        let (auth, cache) = authenticator(verifier, users.clone());

        let err = auth.authenticate(Some("Bearer u1")).await.unwrap_err();
        assert!(matches!(err, AuthError::ExpiredCredential));
        assert_eq!(users.lookups(), 0);
        assert_eq!(cache.stats().size, 0);
    }

    #[tokio::test]
    async fn bad_signature_is_invalid_credential() {
        let verifier = Arc::new(CountingVerifier::invalid());
        let users = Arc::new(CountingUserStore::with(vec![user("u1")]));
        let (auth, _) = authenticator(verifier, users.clone());

        let err = auth.authenticate(Some("Bearer u1")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential { .. }));
        assert_eq!(users.lookups(), 0);
    }

    #[tokio::test]
    async fn unknown_subject_is_rejected_and_not_cached() {
        let verifier = Arc::new(CountingVerifier::ok());
        let users = Arc::new(CountingUserStore::with(vec![]));
        let (auth, cache) = authenticator(verifier, users);

        let err = auth.authenticate(Some("Bearer ghost")).await.unwrap_err();
        assert!(matches!(err, AuthError::UnknownSubject { subject } if subject == "ghost"));
        assert_eq!(cache.stats().size, 0);
    }

    #[tokio::test]
    async fn suspended_account_is_rejected_and_not_cached() {
        let mut suspended = user("u1");
        suspended.status = UserStatus::Suspended;
        let verifier = Arc::new(CountingVerifier::ok());
        let users = Arc::new(CountingUserStore::with(vec![suspended]));
        let (auth, cache) = authenticator(verifier, users);

        let err = auth.authenticate(Some("Bearer u1")).await.unwrap_err();
        assert!(matches!(err, AuthError::InactiveAccount));
        assert_eq!(cache.stats().size, 0);
    }

    #[tokio::test]
    async fn corrupt_cache_entry_falls_through_to_verification() {
        let verifier = Arc::new(CountingVerifier::ok());
        let users = Arc::new(CountingUserStore::with(vec![user("u1")]));
        let (auth, cache) = authenticator(verifier.clone(), users);

        cache
            .set("u1", "{not json", Duration::from_secs(60))
            .await
            .unwrap();

        let identity = auth.authenticate(Some("Bearer u1")).await.unwrap();
        assert_eq!(identity.id, "u1");
        assert_eq!(verifier.calls(), 1);
        // The corrupt value was replaced by the fresh projection.
        let cached = cache.get("u1").await.unwrap().unwrap();
        assert!(Identity::from_cache_value(&cached).is_ok());
    }

    #[tokio::test]
    async fn invalidating_subject_forces_reverification() {
        let verifier = Arc::new(CountingVerifier::ok());
        let users = Arc::new(CountingUserStore::with(vec![user("u1")]));
        let (auth, cache) = authenticator(verifier.clone(), users);

        auth.authenticate(Some("Bearer u1")).await.unwrap();
        cache.invalidate_subject("u1").await.unwrap();
        auth.authenticate(Some("Bearer u1")).await.unwrap();

        assert_eq!(verifier.calls(), 2);
    }
}
