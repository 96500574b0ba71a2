//! Authentication error taxonomy.
//!
//! Every failure of the authenticate flow is one of these kinds. All are
//! terminal for the current request; the HTTP mapping lives in
//! [`crate::extract`].

/// Errors that can occur during authentication and authorization.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request carries no usable bearer credential.
    #[error("Missing credential: {message}")]
    MissingCredential {
        /// Description of what was missing or malformed.
        message: String,
    },

    /// The credential's signature does not verify or the token is
    /// malformed.
    #[error("Invalid credential: {message}")]
    InvalidCredential {
        /// Description of why the credential is invalid.
        message: String,
    },

    /// The credential's expiry timestamp has passed.
    #[error("Credential expired")]
    ExpiredCredential,

    /// The credential verified but its subject has no user record.
    #[error("Unknown subject: {subject}")]
    UnknownSubject {
        /// The subject id with no matching user record.
        subject: String,
    },

    /// The resolved user account is not active.
    #[error("Account is not active")]
    InactiveAccount,

    /// The authenticated identity lacks the required role.
    #[error("Insufficient role: requires {required}")]
    InsufficientRole {
        /// The role the operation requires.
        required: String,
    },

    /// A cache or store collaborator failed; nothing is retried.
    #[error("Service unavailable: {message}")]
    ServiceUnavailable {
        /// Description of the infrastructure failure.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `MissingCredential` error.
    #[must_use]
    pub fn missing_credential(message: impl Into<String>) -> Self {
        Self::MissingCredential {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidCredential` error.
    #[must_use]
    pub fn invalid_credential(message: impl Into<String>) -> Self {
        Self::InvalidCredential {
            message: message.into(),
        }
    }

    /// Creates a new `UnknownSubject` error.
    #[must_use]
    pub fn unknown_subject(subject: impl Into<String>) -> Self {
        Self::UnknownSubject {
            subject: subject.into(),
        }
    }

    /// Creates a new `InsufficientRole` error.
    #[must_use]
    pub fn insufficient_role(required: impl Into<String>) -> Self {
        Self::InsufficientRole {
            required: required.into(),
        }
    }

    /// Creates a new `ServiceUnavailable` error.
    #[must_use]
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    /// Returns `true` for the kinds the HTTP layer maps to 401.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential { .. }
                | Self::InvalidCredential { .. }
                | Self::ExpiredCredential
                | Self::UnknownSubject { .. }
        )
    }

    /// Returns `true` for the kinds the HTTP layer maps to 403.
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::InactiveAccount | Self::InsufficientRole { .. })
    }
}

impl From<airpower_storage::StorageError> for AuthError {
    fn from(err: airpower_storage::StorageError) -> Self {
        Self::service_unavailable(err.to_string())
    }
}
