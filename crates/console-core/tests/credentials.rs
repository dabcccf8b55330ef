//! Credential lifecycle tests against a scripted identity service

use async_trait::async_trait;
use console_core::client::models::{Project, TokenResponse};
use console_core::{
    ApiError, ChangeKind, CredentialError, CredentialManager, CredentialState, CredentialStores,
    HttpError, IdentityApi, MemoryStorage, Storage,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Identity service with scripted answers
#[derive(Default)]
struct FakeIdentity {
    projects: Option<Vec<Project>>,
    /// Project ID to HTTP status returned by the exchange
    rejections: HashMap<String, u16>,
    /// Project ID to artificial exchange latency
    delays: HashMap<String, Duration>,
    exchanges: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeIdentity {
    fn with_projects(ids: &[&str]) -> Self {
        Self {
            projects: Some(
                ids.iter()
                    .map(|id| Project {
                        id: id.to_string(),
                        name: format!("project {id}"),
                        description: None,
                    })
                    .collect(),
            ),
            ..Self::default()
        }
    }

    fn reject(mut self, project: &str, status: u16) -> Self {
        self.rejections.insert(project.to_string(), status);
        self
    }

    fn delay(mut self, project: &str, delay: Duration) -> Self {
        self.delays.insert(project.to_string(), delay);
        self
    }

    fn exchanges(&self) -> Vec<String> {
        self.exchanges.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityApi for FakeIdentity {
    async fn list_projects(&self, _token: &str) -> Result<Vec<Project>, ApiError> {
        self.projects
            .clone()
            .ok_or_else(|| ApiError::Status(HttpError::new(500, None)))
    }

    async fn exchange_token(
        &self,
        _token: &str,
        project_id: &str,
    ) -> Result<TokenResponse, ApiError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.exchanges.lock().unwrap().push(project_id.to_string());

        if let Some(delay) = self.delays.get(project_id) {
            tokio::time::sleep(*delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(status) = self.rejections.get(project_id) {
            return Err(ApiError::Status(HttpError::new(*status, None)));
        }
        Ok(TokenResponse {
            token: format!("scoped-{project_id}"),
            email: None,
            expiry: None,
        })
    }
}

struct Harness {
    session: Arc<dyn Storage>,
    local: Arc<dyn Storage>,
    manager: Arc<CredentialManager<FakeIdentity>>,
}

fn harness(api: FakeIdentity) -> Harness {
    harness_with(api, None)
}

fn harness_with(api: FakeIdentity, persisted_project: Option<&str>) -> Harness {
    let session: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let local: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    if let Some(project) = persisted_project {
        local.set("project", project).unwrap();
    }
    let stores = Arc::new(CredentialStores::open(session.clone(), local.clone()).unwrap());
    Harness {
        session,
        local,
        manager: Arc::new(CredentialManager::new(api, stores)),
    }
}

#[tokio::test]
async fn test_empty_project_list_changes_nothing() {
    let h = harness_with(FakeIdentity::with_projects(&[]), Some("b"));

    let err = h.manager.set_credentials("access", "a@example.com").await;
    assert!(matches!(err, Err(CredentialError::NoProjects)));

    assert!(h.session.get("token").unwrap().is_none());
    assert!(h.session.get("email").unwrap().is_none());
    assert_eq!(h.local.get("project").unwrap().as_deref(), Some("b"));
    assert!(h.manager.api().exchanges().is_empty());
}

#[tokio::test]
async fn test_unavailable_project_list_changes_nothing() {
    let h = harness(FakeIdentity::default());

    let err = h.manager.set_credentials("access", "a@example.com").await;
    assert!(matches!(err, Err(CredentialError::ProjectsUnavailable(_))));
    assert_eq!(h.manager.state(), CredentialState::Anonymous);
}

#[tokio::test]
async fn test_selects_first_project_without_persisted() {
    let h = harness(FakeIdentity::with_projects(&["a", "b"]));

    let project = h
        .manager
        .set_credentials("access", "a@example.com")
        .await
        .unwrap();

    assert_eq!(project, "a");
    assert_eq!(h.manager.token().as_deref(), Some("scoped-a"));
    assert_eq!(h.manager.email().as_deref(), Some("a@example.com"));
    assert_eq!(h.manager.state(), CredentialState::Scoped);
}

#[tokio::test]
async fn test_selects_persisted_project() {
    let h = harness_with(FakeIdentity::with_projects(&["a", "b"]), Some("b"));

    let project = h.manager.set_credentials("access", "e").await.unwrap();
    assert_eq!(project, "b");
    assert_eq!(h.manager.api().exchanges(), vec!["b"]);
}

#[tokio::test]
async fn test_falls_back_when_persisted_project_gone() {
    let h = harness_with(FakeIdentity::with_projects(&["a", "b"]), Some("z"));

    let project = h.manager.set_credentials("access", "e").await.unwrap();
    assert_eq!(project, "a");
    assert_eq!(h.local.get("project").unwrap().as_deref(), Some("a"));
}

#[tokio::test]
async fn test_failed_exchange_writes_nothing() {
    let h = harness(FakeIdentity::with_projects(&["a"]).reject("a", 500));

    let err = h.manager.set_credentials("access", "e").await;
    assert!(matches!(err, Err(CredentialError::ExchangeFailed(_))));
    assert!(h.manager.project().is_none());
    assert!(h.manager.email().is_none());
    assert!(h.manager.token().is_none());
}

#[tokio::test]
async fn test_token_written_after_project_and_email() {
    let h = harness(FakeIdentity::with_projects(&["a"]));
    let stores = h.manager.stores().clone();
    let observed = Arc::new(Mutex::new(Vec::new()));

    let reader = stores.clone();
    let seen = observed.clone();
    stores.token.subscribe(move |token, kind| {
        if kind == ChangeKind::Create {
            seen.lock().unwrap().push((
                token.cloned(),
                reader.project.get(),
                reader.email.get(),
            ));
        }
    });

    h.manager.set_credentials("access", "e@x").await.unwrap();

    assert_eq!(
        *observed.lock().unwrap(),
        vec![(
            Some("scoped-a".to_string()),
            Some("a".to_string()),
            Some("e@x".to_string())
        )]
    );
}

#[tokio::test]
async fn test_update_rescopes() {
    let h = harness(FakeIdentity::with_projects(&["a", "b"]));
    h.manager.set_credentials("access", "e").await.unwrap();

    h.manager.update_credentials("scoped-a", "b").await.unwrap();
    assert_eq!(h.manager.project().as_deref(), Some("b"));
    assert_eq!(h.manager.token().as_deref(), Some("scoped-b"));
    assert_eq!(h.manager.email().as_deref(), Some("e"));
}

#[tokio::test]
async fn test_update_failure_keeps_prior_state() {
    let h = harness(FakeIdentity::with_projects(&["a", "b"]).reject("b", 403));
    h.manager.set_credentials("access", "e").await.unwrap();

    let err = h.manager.update_credentials("scoped-a", "b").await;
    assert!(matches!(err, Err(CredentialError::ExchangeFailed(_))));
    assert_eq!(h.manager.project().as_deref(), Some("a"));
    assert_eq!(h.manager.token().as_deref(), Some("scoped-a"));
}

#[tokio::test]
async fn test_update_unauthorized_clears_credentials() {
    let h = harness(FakeIdentity::with_projects(&["a", "b"]).reject("b", 401));
    h.manager.set_credentials("access", "e").await.unwrap();

    let err = h.manager.update_credentials("scoped-a", "b").await;
    assert!(matches!(err, Err(CredentialError::Unauthorized)));
    assert_eq!(h.manager.state(), CredentialState::Anonymous);
    assert!(h.manager.email().is_none());
    assert!(h.manager.project().is_none());
}

#[tokio::test]
async fn test_remove_credentials_notifies() {
    let h = harness(FakeIdentity::with_projects(&["a"]));
    h.manager.set_credentials("access", "e").await.unwrap();

    let removed = Arc::new(AtomicUsize::new(0));
    let counter = removed.clone();
    h.manager.stores().token.subscribe(move |token, kind| {
        if kind == ChangeKind::Remove {
            assert!(token.is_none());
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    h.manager.remove_credentials().await.unwrap();
    assert_eq!(removed.load(Ordering::SeqCst), 1);
    assert_eq!(h.manager.state(), CredentialState::Anonymous);

    // The project choice does not outlive a sign-out.
    assert!(h.manager.project().is_none());
    assert!(h.local.get("project").unwrap().is_none());
}

#[tokio::test]
async fn test_overlapping_rescopes_are_serialised() {
    let api = FakeIdentity::with_projects(&["a", "b", "c"])
        .delay("b", Duration::from_millis(50));
    let h = harness(api);
    h.manager.set_credentials("access", "e").await.unwrap();

    let slow = {
        let manager = h.manager.clone();
        tokio::spawn(async move { manager.update_credentials("scoped-a", "b").await })
    };
    tokio::time::sleep(Duration::from_millis(5)).await;
    let fast = {
        let manager = h.manager.clone();
        tokio::spawn(async move { manager.update_credentials("scoped-a", "c").await })
    };

    slow.await.unwrap().unwrap();
    fast.await.unwrap().unwrap();

    // The later call runs after the slow one instead of being overtaken.
    assert_eq!(h.manager.project().as_deref(), Some("c"));
    assert_eq!(h.manager.token().as_deref(), Some("scoped-c"));
    assert_eq!(h.manager.api().max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(h.manager.api().exchanges(), vec!["a", "b", "c"]);
}
