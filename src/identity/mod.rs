//! Identity provider abstraction.
//!
//! The checklist only needs a stable user id and a role from the identity
//! provider. Registration input is validated locally before any provider call,
//! and provider failures are mapped to a fixed set of user-facing messages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::model::UserId;

pub mod memory;

pub use memory::MemoryIdentity;

/// Minimum password length accepted by providers.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Role stored alongside the user profile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// An authenticated account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub user_id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub mobile_number: Option<String>,
    pub role: Role,
}

impl Account {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Input of the registration form.
#[derive(Clone, Debug, Default)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
    pub mobile_number: String,
}

impl Registration {
    /// Check the form before anything is sent to the provider.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        let mobile = self.mobile_number.trim();
        if !mobile.is_empty() && !is_valid_mobile_number(mobile) {
            return Err(ValidationError::InvalidMobileNumber);
        }
        Ok(())
    }

    pub fn display_name(&self) -> Option<String> {
        let name = self.full_name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }

    pub fn mobile_number(&self) -> Option<String> {
        let mobile = self.mobile_number.trim();
        (!mobile.is_empty()).then(|| mobile.to_string())
    }
}

/// 10 to 15 ASCII digits, nothing else.
fn is_valid_mobile_number(number: &str) -> bool {
    (10..=15).contains(&number.len()) && number.chars().all(|c| c.is_ascii_digit())
}

/// Form errors caught before any network call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{}", MSG_PASSWORD_MISMATCH)]
    PasswordMismatch,

    #[error("{}", MSG_INVALID_MOBILE_NUMBER)]
    InvalidMobileNumber,
}

/// Identity provider failures, displayed as user-facing messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{}", MSG_INVALID_EMAIL)]
    InvalidEmail,

    #[error("{}", MSG_USER_DISABLED)]
    UserDisabled,

    #[error("{}", MSG_USER_NOT_FOUND)]
    UserNotFound,

    #[error("{}", MSG_WRONG_PASSWORD)]
    WrongPassword,

    #[error("{}", MSG_INVALID_CREDENTIAL)]
    InvalidCredential,

    #[error("{}", MSG_EMAIL_IN_USE)]
    EmailAlreadyInUse,

    #[error("{}", MSG_WEAK_PASSWORD)]
    WeakPassword,

    #[error("{}", MSG_NETWORK_FAILURE)]
    Network,

    #[error("{}", MSG_REQUIRES_RECENT_LOGIN)]
    RequiresRecentLogin,

    #[error("{}", MSG_NOT_SIGNED_IN)]
    NotSignedIn,

    #[error("Error: {0}")]
    Other(String),
}

impl AuthError {
    /// Message shown when this error interrupts account deletion.
    pub fn deletion_message(&self) -> String {
        match self {
            AuthError::WrongPassword | AuthError::InvalidCredential => MSG_DELETE_WRONG_PASSWORD.to_string(),
            other => other.to_string(),
        }
    }
}

/// Identity provider that all authentication backends must implement.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns the provider type identifier (e.g., "memory").
    fn provider_type(&self) -> &str;

    /// Create an account with role [`Role::User`]. The new account is signed in.
    async fn register(&self, registration: &Registration) -> Result<Account, AuthError>;

    /// Sign in with email and password.
    async fn authenticate(&self, email: &str, password: &str) -> Result<Account, AuthError>;

    /// The signed-in account, if any.
    async fn current_user(&self) -> Option<Account>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Re-authenticate the signed-in account with `password`, then delete it.
    async fn delete_account(&self, password: &str) -> Result<Account, AuthError>;
}
