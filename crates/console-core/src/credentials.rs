//! Credential lifecycle: acquire, rescope and clear project-scoped tokens
//!
//! Credentials live in three independently persisted cells. The token cell
//! is what dependent views treat as "signed in", so it is always written
//! last, after the project and email it belongs to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::client::models::{Project, TokenResponse};
use crate::client::{ApiClient, ApiError};
use crate::store::{Persisted, Storage, StoreError, StringCodec, StringStore};

/// Session storage key of the scoped token
pub const TOKEN_KEY: &str = "token";

/// Session storage key of the signed-in user's email
pub const EMAIL_KEY: &str = "email";

/// Local storage key of the selected project
pub const PROJECT_KEY: &str = "project";

/// Credential error type
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("no projects available")]
    NoProjects,

    #[error("unable to list projects: {0}")]
    ProjectsUnavailable(#[source] ApiError),

    #[error("token exchange failed: {0}")]
    ExchangeFailed(#[source] ApiError),

    #[error("token rejected as unauthorized, credentials cleared")]
    Unauthorized,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Identity operations the credential manager needs from the API
#[async_trait]
pub trait IdentityApi: Send + Sync {
    async fn list_projects(&self, token: &str) -> Result<Vec<Project>, ApiError>;

    async fn exchange_token(
        &self,
        token: &str,
        project_id: &str,
    ) -> Result<TokenResponse, ApiError>;
}

#[async_trait]
impl IdentityApi for ApiClient {
    async fn list_projects(&self, token: &str) -> Result<Vec<Project>, ApiError> {
        ApiClient::list_projects(self, token).await
    }

    async fn exchange_token(
        &self,
        token: &str,
        project_id: &str,
    ) -> Result<TokenResponse, ApiError> {
        ApiClient::exchange_token(self, token, project_id).await
    }
}

/// Where the credential lifecycle currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialState {
    /// No token
    Anonymous,
    /// Token without a resolved project
    Unscoped,
    /// Token bound to a project
    Scoped,
}

impl std::fmt::Display for CredentialState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialState::Anonymous => write!(f, "anonymous"),
            CredentialState::Unscoped => write!(f, "unscoped"),
            CredentialState::Scoped => write!(f, "scoped"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Scoped,
    Unscoped,
}

/// Snapshot of the credential cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialBundle {
    pub token: Option<String>,
    pub scope: Scope,
    pub project: Option<String>,
}

/// The persisted cells backing a credential manager
#[derive(Debug)]
pub struct CredentialStores {
    pub token: StringStore,
    pub email: StringStore,
    pub project: StringStore,
}

impl CredentialStores {
    /// Token and email live in session storage, the project choice in local
    /// storage so it survives a restart; all three are cleared on sign-out
    pub fn open(session: Arc<dyn Storage>, local: Arc<dyn Storage>) -> Result<Self, StoreError> {
        Ok(Self {
            token: Persisted::open(TOKEN_KEY, session.clone(), StringCodec)?,
            email: Persisted::open(EMAIL_KEY, session, StringCodec)?,
            project: Persisted::open(PROJECT_KEY, local, StringCodec)?,
        })
    }
}

/// Pick the persisted project when it is still offered, else the first one
pub fn select_project<'a>(projects: &'a [Project], persisted: Option<&str>) -> Option<&'a Project> {
    persisted
        .and_then(|id| projects.iter().find(|p| p.id == id))
        .or_else(|| projects.first())
}

/// Drives the credential lifecycle.
///
/// All lifecycle operations take the same lock, so overlapping rescoping
/// calls run one after the other in call order.
pub struct CredentialManager<A> {
    api: A,
    stores: Arc<CredentialStores>,
    lifecycle: Mutex<()>,
}

impl<A: IdentityApi> CredentialManager<A> {
    pub fn new(api: A, stores: Arc<CredentialStores>) -> Self {
        Self {
            api,
            stores,
            lifecycle: Mutex::new(()),
        }
    }

    pub fn stores(&self) -> &Arc<CredentialStores> {
        &self.stores
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn token(&self) -> Option<String> {
        self.stores.token.get()
    }

    pub fn email(&self) -> Option<String> {
        self.stores.email.get()
    }

    pub fn project(&self) -> Option<String> {
        self.stores.project.get()
    }

    pub fn state(&self) -> CredentialState {
        match (self.stores.token.get(), self.stores.project.get()) {
            (None, _) => CredentialState::Anonymous,
            (Some(_), None) => CredentialState::Unscoped,
            (Some(_), Some(_)) => CredentialState::Scoped,
        }
    }

    pub fn bundle(&self) -> CredentialBundle {
        let project = self.stores.project.get();
        CredentialBundle {
            token: self.stores.token.get(),
            scope: if project.is_some() {
                Scope::Scoped
            } else {
                Scope::Unscoped
            },
            project,
        }
    }

    /// Scope a freshly issued access token to a project and persist it.
    ///
    /// Nothing is written unless both the project listing and the exchange
    /// succeed. Returns the selected project ID.
    pub async fn set_credentials(
        &self,
        access_token: &str,
        email: &str,
    ) -> Result<String, CredentialError> {
        let _guard = self.lifecycle.lock().await;

        let projects = self.api.list_projects(access_token).await.map_err(|e| {
            tracing::warn!("Unable to list projects: {}", e);
            CredentialError::ProjectsUnavailable(e)
        })?;

        let persisted = self.stores.project.get();
        let project = match select_project(&projects, persisted.as_deref()) {
            Some(project) => project,
            None => {
                tracing::warn!("No projects available for {}", email);
                return Err(CredentialError::NoProjects);
            }
        };

        if persisted.as_deref().is_some_and(|id| id != project.id) {
            tracing::info!(
                "Persisted project no longer available, falling back to {}",
                project.id
            );
        }

        let scoped = self
            .api
            .exchange_token(access_token, &project.id)
            .await
            .map_err(|e| {
                tracing::warn!("Token exchange for project {} failed: {}", project.id, e);
                CredentialError::ExchangeFailed(e)
            })?;

        self.stores.project.set(project.id.clone())?;
        self.stores.email.set(email.to_string())?;
        self.stores.token.set(scoped.token)?;

        tracing::info!("Credentials scoped to project {}", project.id);
        Ok(project.id.clone())
    }

    /// Rescope to an explicit project.
    ///
    /// An unauthorized rejection clears all credentials; any other failure
    /// leaves the current ones in place.
    pub async fn update_credentials(
        &self,
        access_token: &str,
        project_id: &str,
    ) -> Result<(), CredentialError> {
        let _guard = self.lifecycle.lock().await;

        match self.api.exchange_token(access_token, project_id).await {
            Ok(scoped) => {
                self.stores.project.set(project_id.to_string())?;
                self.stores.token.set(scoped.token)?;
                tracing::info!("Credentials rescoped to project {}", project_id);
                Ok(())
            }
            Err(e) if e.is_unauthorized() => {
                tracing::info!("Token rejected while rescoping, signing out");
                self.clear()?;
                Err(CredentialError::Unauthorized)
            }
            Err(e) => {
                tracing::warn!("Rescoping to project {} failed: {}", project_id, e);
                Err(CredentialError::ExchangeFailed(e))
            }
        }
    }

    /// Forget the token, email and project
    pub async fn remove_credentials(&self) -> Result<(), CredentialError> {
        let _guard = self.lifecycle.lock().await;
        self.clear()?;
        tracing::info!("Credentials removed");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.stores.token.remove()?;
        self.stores.email.remove()?;
        self.stores.project.remove()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;

    fn project(id: &str) -> Project {
        Project {
            id: id.to_string(),
            name: format!("project {id}"),
            description: None,
        }
    }

    #[test]
    fn test_select_first_without_persisted() {
        let projects = vec![project("a"), project("b")];
        assert_eq!(select_project(&projects, None).unwrap().id, "a");
    }

    #[test]
    fn test_select_persisted() {
        let projects = vec![project("a"), project("b")];
        assert_eq!(select_project(&projects, Some("b")).unwrap().id, "b");
    }

    #[test]
    fn test_select_falls_back_when_persisted_missing() {
        let projects = vec![project("a"), project("b")];
        assert_eq!(select_project(&projects, Some("z")).unwrap().id, "a");
        assert!(select_project(&[], Some("z")).is_none());
    }

    #[test]
    fn test_state_and_bundle() {
        let session: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let local: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let stores = Arc::new(CredentialStores::open(session, local).unwrap());
        let manager = CredentialManager::new(ApiClient::new("http://127.0.0.1:1"), stores.clone());

        assert_eq!(manager.state(), CredentialState::Anonymous);

        stores.token.set("t".to_string()).unwrap();
        assert_eq!(manager.state(), CredentialState::Unscoped);
        assert_eq!(manager.bundle().scope, Scope::Unscoped);

        stores.project.set("p".to_string()).unwrap();
        assert_eq!(manager.state(), CredentialState::Scoped);
        assert_eq!(
            manager.bundle(),
            CredentialBundle {
                token: Some("t".to_string()),
                scope: Scope::Scoped,
                project: Some("p".to_string()),
            }
        );
    }

    #[test]
    fn test_scope_serialization() {
        assert_eq!(serde_json::to_string(&Scope::Scoped).unwrap(), "\"scoped\"");
        assert_eq!(
            serde_json::to_string(&Scope::Unscoped).unwrap(),
            "\"unscoped\""
        );
    }
}
