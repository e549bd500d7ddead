//! In-process identity provider.

use std::collections::HashMap;

use async_trait::async_trait;
use log::{info, warn};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Account, AuthError, IdentityProvider, Registration, Role, MIN_PASSWORD_LEN};
use crate::model::UserId;

struct StoredAccount {
    account: Account,
    password_digest: Vec<u8>,
    disabled: bool,
}

#[derive(Default)]
struct State {
    // keyed by lowercased email
    accounts: HashMap<String, StoredAccount>,
    current: Option<String>,
}

/// Identity provider keeping accounts in memory.
///
/// Passwords are kept only as salted SHA-256 digests.
#[derive(Default)]
pub struct MemoryIdentity {
    state: Mutex<State>,
}

fn digest(email_key: &str, password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(email_key.as_bytes());
    hasher.update([0u8]);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

fn email_key(email: &str) -> Result<String, AuthError> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    };
    if !valid {
        return Err(AuthError::InvalidEmail);
    }
    Ok(email.to_lowercase())
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account with an explicit role, e.g. an administrator.
    pub async fn insert_account(&self, email: &str, password: &str, role: Role) -> Result<Account, AuthError> {
        let key = email_key(email)?;
        let account = Account {
            user_id: UserId::new(Uuid::new_v4().simple().to_string()),
            email: email.trim().to_string(),
            display_name: None,
            mobile_number: None,
            role,
        };
        let mut state = self.state.lock().await;
        if state.accounts.contains_key(&key) {
            return Err(AuthError::EmailAlreadyInUse);
        }
        state.accounts.insert(
            key.clone(),
            StoredAccount {
                account: account.clone(),
                password_digest: digest(&key, password),
                disabled: false,
            },
        );
        Ok(account)
    }

    /// Disable an account; later sign-ins fail with [`AuthError::UserDisabled`].
    pub async fn disable(&self, email: &str) -> Result<(), AuthError> {
        let key = email_key(email)?;
        let mut state = self.state.lock().await;
        let stored = state.accounts.get_mut(&key).ok_or(AuthError::UserNotFound)?;
        stored.disabled = true;
        if state.current.as_deref() == Some(key.as_str()) {
            state.current = None;
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn register(&self, registration: &Registration) -> Result<Account, AuthError> {
        registration.validate()?;
        let key = email_key(&registration.email)?;
        if registration.password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let mut state = self.state.lock().await;
        if state.accounts.contains_key(&key) {
            return Err(AuthError::EmailAlreadyInUse);
        }

        let account = Account {
            user_id: UserId::new(Uuid::new_v4().simple().to_string()),
            email: registration.email.trim().to_string(),
            display_name: registration.display_name(),
            mobile_number: registration.mobile_number(),
            role: Role::User,
        };
        state.accounts.insert(
            key.clone(),
            StoredAccount {
                account: account.clone(),
                password_digest: digest(&key, &registration.password),
                disabled: false,
            },
        );
        state.current = Some(key);
        info!("👤 Registered user {}", account.user_id);
        Ok(account)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Account, AuthError> {
        let key = email_key(email)?;
        let mut state = self.state.lock().await;
        let stored = state.accounts.get(&key).ok_or(AuthError::UserNotFound)?;
        if stored.disabled {
            return Err(AuthError::UserDisabled);
        }
        if stored.password_digest != digest(&key, password) {
            warn!("Rejected sign-in for user {}", stored.account.user_id);
            return Err(AuthError::WrongPassword);
        }
        let account = stored.account.clone();
        state.current = Some(key);
        Ok(account)
    }

    async fn current_user(&self) -> Option<Account> {
        let state = self.state.lock().await;
        let key = state.current.as_ref()?;
        state.accounts.get(key).map(|stored| stored.account.clone())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.state.lock().await.current = None;
        Ok(())
    }

    async fn delete_account(&self, password: &str) -> Result<Account, AuthError> {
        let mut state = self.state.lock().await;
        let key = state.current.clone().ok_or(AuthError::NotSignedIn)?;
        let stored = state.accounts.get(&key).ok_or(AuthError::UserNotFound)?;
        if stored.password_digest != digest(&key, password) {
            return Err(AuthError::WrongPassword);
        }
        let removed = state.accounts.remove(&key).ok_or(AuthError::UserNotFound)?;
        state.current = None;
        info!("🗑️ Deleted user {}", removed.account.user_id);
        Ok(removed.account)
    }
}
