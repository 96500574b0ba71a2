//! # airpower-auth
//!
//! Bearer token authentication for the Airpower server.
//!
//! The central piece is the [`TokenAuthenticator`]: it resolves the
//! `Authorization: Bearer <token>` header of every inbound request to an
//! [`Identity`] projection `{ id, email, role }`, using a read-through
//! [`IdentityCache`] keyed by the raw credential string to skip redundant
//! signature verification and user lookups.
//!
//! ## Modules
//!
//! - [`authenticator`] - the authenticate flow (extract, cache probe,
//!   verify, resolve, status check, project and cache)
//! - [`jwt`] - HS256 token issuing and verification
//! - [`cache`] - the identity cache trait and in-memory implementation
//! - [`identity`] - the authenticated identity projection and role guard
//! - [`user`] - the user record and user storage trait
//! - [`extract`] - axum extractors and the HTTP error mapping
//! - [`audit`] - best-effort activity logging
//! - [`config`] - authentication configuration

pub mod audit;
pub mod authenticator;
pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod identity;
pub mod jwt;
pub mod user;

pub use audit::{ActivityLog, TracingActivityLog};
pub use authenticator::TokenAuthenticator;
pub use cache::{CacheStats, IdentityCache, LocalIdentityCache, NoopIdentityCache};
pub use config::AuthConfig;
pub use error::AuthError;
pub use extract::{AdminAuth, AuthState, BearerAuth};
pub use identity::Identity;
pub use jwt::{Claims, JwtService, TokenVerifier};
pub use user::{UserRecord, UserStatus, UserStorage};

/// Type alias for authentication results.
pub type AuthResult<T> = Result<T, AuthError>;
