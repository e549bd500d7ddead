use std::sync::Arc;

use chrono::{Duration, Utc};
use checklist::app::{Action, App, AppState};
use checklist::config::Config;
use checklist::constants::{
    BANNER_REFUSED, MSG_ACCOUNT_DELETED, MSG_DELETE_WRONG_PASSWORD, MSG_NO_ADMIN_PORTAL, MSG_REGISTRATION_SUCCESS,
    MSG_WRONG_PASSWORD,
};
use checklist::identity::{IdentityProvider, MemoryIdentity, Registration, Role};
use checklist::lifecycle::{Mutation, Outcome};
use checklist::model::Task;
use checklist::store::{DocumentStore, MemoryStore};
use checklist::views::Partition;

const EMAIL: &str = "ada@example.com";
const PASSWORD: &str = "secret1";

struct Harness {
    identity: Arc<MemoryIdentity>,
    store: Arc<MemoryStore>,
    app: App,
}

fn harness(config: Config) -> Harness {
    let identity = Arc::new(MemoryIdentity::new());
    let store = Arc::new(MemoryStore::new());
    let app = App::new(config, identity.clone(), store.clone());
    Harness { identity, store, app }
}

fn registration() -> Registration {
    Registration {
        email: EMAIL.to_string(),
        password: PASSWORD.to_string(),
        confirm_password: PASSWORD.to_string(),
        full_name: "Ada".to_string(),
        mobile_number: String::new(),
    }
}

async fn signed_in(config: Config) -> Harness {
    let mut h = harness(config);
    h.app.register(&registration()).await;
    h.app.sign_in(EMAIL, PASSWORD).await;
    assert!(matches!(h.app.state(), AppState::Ready(_)), "{:?}", h.app.state());
    h
}

async fn add_task(app: &mut App, text: &str) -> String {
    let task = Task::new(text);
    let id = task.id.clone();
    assert_eq!(app.dispatch(Action::Mutate(Mutation::AddTask(task))).await, Some(Outcome::Updated));
    id
}

fn notice(state: &AppState) -> Option<&str> {
    match state {
        AppState::SignedOut { notice } => notice.as_deref(),
        _ => None,
    }
}

#[tokio::test]
async fn test_start_without_session_shows_sign_in() {
    let mut h = harness(Config::default());
    assert!(matches!(h.app.state(), AppState::Loading));
    h.app.start().await;
    assert!(matches!(h.app.state(), AppState::SignedOut { notice: None }));
}

#[tokio::test]
async fn test_register_creates_document_and_signs_out() {
    let mut h = harness(Config::default());
    h.app.register(&registration()).await;

    assert_eq!(notice(h.app.state()), Some(MSG_REGISTRATION_SUCCESS));
    assert_eq!(h.identity.current_user().await, None);

    let account = h.identity.authenticate(EMAIL, PASSWORD).await.unwrap();
    let doc = h.store.fetch_document(&account.user_id).await.unwrap();
    assert!(doc.tasks.is_empty() && doc.lists.is_empty());
}

#[tokio::test]
async fn test_register_validation_error_is_shown() {
    let mut h = harness(Config::default());
    let mut form = registration();
    form.mobile_number = "12".to_string();
    h.app.register(&form).await;

    assert!(notice(h.app.state()).is_some());
    assert!(h.identity.authenticate(EMAIL, PASSWORD).await.is_err());
}

#[tokio::test]
async fn test_sign_in_failure_shows_message() {
    let mut h = harness(Config::default());
    h.app.register(&registration()).await;
    h.app.sign_in(EMAIL, "wrong1").await;
    assert_eq!(notice(h.app.state()), Some(MSG_WRONG_PASSWORD));
}

#[tokio::test]
async fn test_resume_session_on_start() {
    let mut h = harness(Config::default());
    h.identity
        .insert_account(EMAIL, PASSWORD, Role::User)
        .await
        .unwrap();
    h.identity.authenticate(EMAIL, PASSWORD).await.unwrap();

    // No document yet; one is created on entry
    h.app.start().await;
    assert!(matches!(h.app.state(), AppState::Ready(_)));
    let view = h.app.view().unwrap();
    assert!(view.is_empty());
}

#[tokio::test]
async fn test_admin_is_redirected() {
    let mut config = Config::default();
    config.admin.portal_url = "https://admin.example.com".to_string();
    let mut h = harness(config);
    h.identity
        .insert_account("root@example.com", "hunter22", Role::Admin)
        .await
        .unwrap();

    h.app.sign_in("root@example.com", "hunter22").await;
    match h.app.state() {
        AppState::Redirected { portal_url } => assert_eq!(portal_url, "https://admin.example.com"),
        other => panic!("expected redirect, got {other:?}"),
    }
    assert!(h.app.view().is_none());
}

#[tokio::test]
async fn test_admin_without_portal_is_an_error() {
    let mut h = harness(Config::default());
    h.identity
        .insert_account("root@example.com", "hunter22", Role::Admin)
        .await
        .unwrap();
    h.app.sign_in("root@example.com", "hunter22").await;
    match h.app.state() {
        AppState::Error { message } => assert_eq!(message, MSG_NO_ADMIN_PORTAL),
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_completing_task_celebrates_and_moves_to_archive() {
    let mut h = signed_in(Config::default()).await;
    let id = add_task(&mut h.app, "Buy milk").await;
    assert!(!h.app.is_celebrating(Utc::now()));

    let outcome = h.app.dispatch(Action::Mutate(Mutation::ToggleTask(id.clone()))).await;
    assert_eq!(outcome, Some(Outcome::Completed));
    assert!(h.app.is_celebrating(Utc::now()));
    assert!(!h.app.is_celebrating(Utc::now() + Duration::seconds(5)));

    assert!(h.app.view().unwrap().tasks.is_empty());
    h.app.dispatch(Action::ShowArchived(true)).await;
    let archived = h.app.view().unwrap();
    assert_eq!(archived.partition, Partition::Archived);
    assert_eq!(archived.tasks[0].id, id);
    assert_eq!(h.app.archive_log().unwrap().completed_tasks.len(), 1);

    h.app.dispatch(Action::TogglePartition).await;
    assert_eq!(h.app.view().unwrap().partition, Partition::Active);
}

#[tokio::test]
async fn test_search_filters_view() {
    let mut h = signed_in(Config::default()).await;
    add_task(&mut h.app, "Buy milk").await;
    add_task(&mut h.app, "Call plumber").await;

    h.app.dispatch(Action::Search("MILK".to_string())).await;
    let view = h.app.view().unwrap();
    assert_eq!(view.tasks.len(), 1);
    assert_eq!(view.tasks[0].text, "Buy milk");

    h.app.dispatch(Action::Search(String::new())).await;
    assert_eq!(h.app.view().unwrap().tasks.len(), 2);
}

#[tokio::test]
async fn test_refused_toggle_shows_banner() {
    let mut config = Config::default();
    config.lifecycle.allow_toggle_archived = false;
    let mut h = signed_in(config).await;
    let id = add_task(&mut h.app, "Buy milk").await;
    h.app.dispatch(Action::Mutate(Mutation::ArchiveTask(id.clone()))).await;

    let outcome = h.app.dispatch(Action::Mutate(Mutation::ToggleTask(id))).await;
    assert_eq!(outcome, None);
    let banner = h.app.workspace().unwrap().banner.clone().unwrap();
    assert!(banner.starts_with(BANNER_REFUSED));

    h.app.dispatch(Action::DismissBanner).await;
    assert!(h.app.workspace().unwrap().banner.is_none());
}

#[tokio::test]
async fn test_sign_out_closes_workspace() {
    let mut h = signed_in(Config::default()).await;
    h.app.sign_out().await;
    assert!(matches!(h.app.state(), AppState::SignedOut { notice: None }));
    assert!(h.app.workspace().is_none());
    assert_eq!(h.app.dispatch(Action::DismissBanner).await, None);
}

#[tokio::test]
async fn test_delete_account() {
    let mut h = signed_in(Config::default()).await;
    let user_id = h.app.workspace().unwrap().account.user_id.clone();

    assert!(h.app.delete_account("wrong1").await.is_err());
    assert_eq!(
        h.app.workspace().unwrap().banner.as_deref(),
        Some(MSG_DELETE_WRONG_PASSWORD)
    );

    h.app.delete_account(PASSWORD).await.unwrap();
    assert_eq!(notice(h.app.state()), Some(MSG_ACCOUNT_DELETED));
    assert!(h.store.fetch_document(&user_id).await.is_err());
}

#[tokio::test]
async fn test_retry_reloads_workspace() {
    let mut h = signed_in(Config::default()).await;
    h.app.retry().await;
    assert!(matches!(h.app.state(), AppState::Ready(_)));
    assert!(h.app.workspace().unwrap().banner.is_none());
}
