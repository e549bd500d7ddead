//! Application state machine.
//!
//! [`App`] owns the collaborators (identity provider, document store) and a
//! single [`AppState`]. Every screen the user can be on is one variant, so
//! there is no combination of flags that can disagree with itself.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::{debug, error, info, warn};

use crate::config::Config;
use crate::constants::{
    BANNER_CONFLICT, BANNER_LOAD_FAILED, BANNER_REFUSED, BANNER_SAVE_FAILED, MSG_ACCOUNT_DELETED, MSG_NO_ADMIN_PORTAL,
    MSG_REGISTRATION_SUCCESS,
};
use crate::identity::{Account, AuthError, IdentityProvider, Registration};
use crate::lifecycle::{Lifecycle, Mutation, Outcome};
use crate::store::{DocumentStore, StoreError};
use crate::sync::{SyncError, SyncService};
use crate::views::{ArchiveLog, ChecklistView, Partition, SearchQuery};

/// Everything the signed-in user is looking at.
#[derive(Clone)]
pub struct Workspace {
    pub account: Account,
    pub sync: SyncService,
    pub query: SearchQuery,
    pub partition: Partition,
    /// Error banner shown above the lists until dismissed
    pub banner: Option<String>,
    /// Celebration is shown until this instant
    pub celebration_until: Option<DateTime<Utc>>,
}

impl Workspace {
    fn new(account: Account, sync: SyncService) -> Self {
        Self {
            account,
            sync,
            query: SearchQuery::default(),
            partition: Partition::Active,
            banner: None,
            celebration_until: None,
        }
    }

    /// Filtered view of the current mirror.
    pub fn view(&self) -> ChecklistView {
        ChecklistView::build(&self.sync.snapshot(), self.partition, &self.query)
    }

    pub fn archive_log(&self) -> ArchiveLog {
        ArchiveLog::build(&self.sync.snapshot())
    }

    pub fn is_celebrating(&self, now: DateTime<Utc>) -> bool {
        self.celebration_until.is_some_and(|until| now < until)
    }
}

/// Screen the application is on.
#[derive(Clone, Default)]
pub enum AppState {
    /// Waiting to learn whether someone is signed in
    #[default]
    Loading,
    /// Sign-in screen, optionally with a message from the last attempt
    SignedOut { notice: Option<String> },
    /// A sign-in or registration request is in flight
    Authenticating,
    Ready(Workspace),
    /// Admin accounts are sent to the external admin portal
    Redirected { portal_url: String },
    /// The checklist could not be loaded
    Error { message: String },
}

impl AppState {
    pub fn name(&self) -> &'static str {
        match self {
            AppState::Loading => "loading",
            AppState::SignedOut { .. } => "signed_out",
            AppState::Authenticating => "authenticating",
            AppState::Ready(_) => "ready",
            AppState::Redirected { .. } => "redirected",
            AppState::Error { .. } => "error",
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppState::SignedOut { notice } => f.debug_struct("SignedOut").field("notice", notice).finish(),
            AppState::Ready(workspace) => f.debug_tuple("Ready").field(&workspace.account.user_id).finish(),
            AppState::Redirected { portal_url } => f.debug_struct("Redirected").field("portal_url", portal_url).finish(),
            AppState::Error { message } => f.debug_struct("Error").field("message", message).finish(),
            other => f.write_str(other.name()),
        }
    }
}

/// User interactions handled while a workspace is open.
#[derive(Debug, Clone)]
pub enum Action {
    // View operations
    Search(String),
    ShowArchived(bool),
    TogglePartition,
    DismissBanner,

    // Document operations
    Mutate(Mutation),
}

pub struct App {
    config: Config,
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    state: AppState,
}

impl App {
    pub fn new(config: Config, identity: Arc<dyn IdentityProvider>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            config,
            identity,
            store,
            state: AppState::Loading,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn workspace(&self) -> Option<&Workspace> {
        match &self.state {
            AppState::Ready(workspace) => Some(workspace),
            _ => None,
        }
    }

    fn workspace_mut(&mut self) -> Option<&mut Workspace> {
        match &mut self.state {
            AppState::Ready(workspace) => Some(workspace),
            _ => None,
        }
    }

    /// Resume the provider's current session, or show the sign-in screen.
    pub async fn start(&mut self) {
        self.state = AppState::Loading;
        match self.identity.current_user().await {
            Some(account) => self.enter(account).await,
            None => self.state = AppState::SignedOut { notice: None },
        }
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) {
        self.state = AppState::Authenticating;
        match self.identity.authenticate(email, password).await {
            Ok(account) => {
                info!("✅ Signed in as {}", account.email);
                self.enter(account).await;
            }
            Err(e) => {
                warn!("Sign-in failed: {}", e);
                self.state = AppState::SignedOut {
                    notice: Some(e.to_string()),
                };
            }
        }
    }

    /// Register a new account, create its empty checklist and sign out
    /// again so the user logs in with the new credentials.
    pub async fn register(&mut self, registration: &Registration) {
        if let Err(e) = registration.validate() {
            self.state = AppState::SignedOut {
                notice: Some(e.to_string()),
            };
            return;
        }

        self.state = AppState::Authenticating;
        let account = match self.identity.register(registration).await {
            Ok(account) => account,
            Err(e) => {
                warn!("Registration failed: {}", e);
                self.state = AppState::SignedOut {
                    notice: Some(e.to_string()),
                };
                return;
            }
        };
        info!("✅ Registered {} as {}", account.email, account.user_id);

        let notice = match self.store.create_document(&account.user_id).await {
            Ok(()) | Err(StoreError::AlreadyExists(_)) => MSG_REGISTRATION_SUCCESS.to_string(),
            Err(e) => {
                error!("❌ Failed to create document for {}: {}", account.user_id, e);
                format!("{}: {}", BANNER_LOAD_FAILED, e)
            }
        };
        if let Err(e) = self.identity.sign_out().await {
            warn!("Sign-out after registration failed: {}", e);
        }
        self.state = AppState::SignedOut { notice: Some(notice) };
    }

    pub async fn sign_out(&mut self) {
        self.close_workspace();
        if let Err(e) = self.identity.sign_out().await {
            warn!("Sign-out failed: {}", e);
        }
        self.state = AppState::SignedOut { notice: None };
    }

    /// Delete the signed-in account after re-authenticating with `password`.
    ///
    /// On failure the user stays where they are; an open workspace shows the
    /// reason in its banner.
    pub async fn delete_account(&mut self, password: &str) -> Result<(), AuthError> {
        match self.identity.delete_account(password).await {
            Ok(account) => {
                self.close_workspace();
                if let Err(e) = self.store.delete_document(&account.user_id).await {
                    warn!("Failed to delete document for {}: {}", account.user_id, e);
                }
                info!("Deleted account {}", account.user_id);
                self.state = AppState::SignedOut {
                    notice: Some(MSG_ACCOUNT_DELETED.to_string()),
                };
                Ok(())
            }
            Err(e) => {
                if let Some(workspace) = self.workspace_mut() {
                    workspace.banner = Some(e.deletion_message());
                }
                Err(e)
            }
        }
    }

    /// Handle a user action. Returns the lifecycle outcome for mutations
    /// that reached the store.
    pub async fn dispatch(&mut self, action: Action) -> Option<Outcome> {
        let celebration = Duration::seconds(self.config.display.celebration_seconds as i64);
        let Some(workspace) = self.workspace_mut() else {
            debug!("Ignoring {:?} outside a workspace", action);
            return None;
        };

        match action {
            Action::Search(query) => workspace.query = SearchQuery::new(query),
            Action::ShowArchived(archived) => {
                workspace.partition = if archived { Partition::Archived } else { Partition::Active };
            }
            Action::TogglePartition => workspace.partition = workspace.partition.toggled(),
            Action::DismissBanner => workspace.banner = None,
            Action::Mutate(mutation) => {
                return match workspace.sync.apply(mutation).await {
                    Ok(outcome) => {
                        if outcome.celebrates() {
                            workspace.celebration_until = Some(Utc::now() + celebration);
                        }
                        Some(outcome)
                    }
                    Err(e) => {
                        workspace.banner = Some(banner_for(&e));
                        None
                    }
                };
            }
        }
        None
    }

    pub fn view(&self) -> Option<ChecklistView> {
        self.workspace().map(Workspace::view)
    }

    pub fn archive_log(&self) -> Option<ArchiveLog> {
        self.workspace().map(Workspace::archive_log)
    }

    pub fn is_celebrating(&self, now: DateTime<Utc>) -> bool {
        self.workspace().is_some_and(|workspace| workspace.is_celebrating(now))
    }

    /// Try again after a load failure, or reload the open workspace.
    pub async fn retry(&mut self) {
        if let Some(workspace) = self.workspace_mut() {
            match workspace.sync.reload().await {
                Ok(()) => workspace.banner = None,
                Err(e) => workspace.banner = Some(format!("{}: {}", BANNER_LOAD_FAILED, e)),
            }
            return;
        }
        if matches!(self.state, AppState::Error { .. }) {
            self.start().await;
        }
    }

    async fn enter(&mut self, account: Account) {
        if account.is_admin() {
            let portal_url = self.config.admin.portal_url.clone();
            info!("Redirecting admin {} to the admin portal", account.email);
            self.state = if portal_url.is_empty() {
                AppState::Error {
                    message: MSG_NO_ADMIN_PORTAL.to_string(),
                }
            } else {
                AppState::Redirected { portal_url }
            };
            return;
        }

        self.state = AppState::Loading;
        let lifecycle = Lifecycle::new(self.config.lifecycle.policy());
        let connected = match SyncService::connect(Arc::clone(&self.store), account.user_id.clone(), lifecycle).await {
            Err(StoreError::NotFound(_)) => {
                info!("No document for {} yet, creating one", account.user_id);
                match self.store.create_document(&account.user_id).await {
                    Ok(()) => SyncService::connect(Arc::clone(&self.store), account.user_id.clone(), lifecycle).await,
                    Err(e) => Err(e),
                }
            }
            other => other,
        };

        self.state = match connected {
            Ok(sync) => AppState::Ready(Workspace::new(account, sync)),
            Err(e) => {
                error!("❌ Failed to load checklist for {}: {}", account.user_id, e);
                AppState::Error {
                    message: format!("{}: {}", BANNER_LOAD_FAILED, e),
                }
            }
        };
    }

    fn close_workspace(&self) {
        if let Some(workspace) = self.workspace() {
            workspace.sync.shutdown();
        }
    }
}

fn banner_for(error: &SyncError) -> String {
    match error {
        SyncError::Lifecycle(e) => format!("{}: {}", BANNER_REFUSED, e),
        e if e.is_conflict() => BANNER_CONFLICT.to_string(),
        SyncError::Store(e) => format!("{}: {}", BANNER_SAVE_FAILED, e),
    }
}
