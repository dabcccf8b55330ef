//! Console context
//!
//! Owns every piece of client state: the storage backends, the API client
//! and the stores built on them. Front ends construct one `Console` and
//! pass it where needed.

use std::sync::Arc;

use crate::client::ApiClient;
use crate::config::ConsoleConfig;
use crate::credentials::{CredentialManager, CredentialStores};
use crate::errors::ErrorQueue;
use crate::menu::{default_menu, Navigation};
use crate::store::{FileStorage, MemoryStorage, Storage};
use crate::{ConsoleError, Result};

pub struct Console {
    config: ConsoleConfig,
    session: Arc<dyn Storage>,
    local: Arc<dyn Storage>,
    credentials: CredentialManager<ApiClient>,
    navigation: Navigation,
    errors: ErrorQueue,
}

impl Console {
    /// Open the console with storage documents under the configured state
    /// directory
    pub fn open(config: ConsoleConfig) -> Result<Self> {
        config.validate()?;
        let session: Arc<dyn Storage> =
            Arc::new(FileStorage::open(config.session_storage_path())?);
        let local: Arc<dyn Storage> = Arc::new(FileStorage::open(config.local_storage_path())?);
        Self::assemble(config, session, local)
    }

    /// Open the console with nothing written to disk
    pub fn in_memory(config: ConsoleConfig) -> Result<Self> {
        config.validate()?;
        Self::assemble(
            config,
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
        )
    }

    /// Build the console over explicit backends
    pub fn with_storage(
        config: ConsoleConfig,
        session: Arc<dyn Storage>,
        local: Arc<dyn Storage>,
    ) -> Result<Self> {
        config.validate()?;
        Self::assemble(config, session, local)
    }

    fn assemble(
        config: ConsoleConfig,
        session: Arc<dyn Storage>,
        local: Arc<dyn Storage>,
    ) -> Result<Self> {
        let client = ApiClient::new(&config.base_url);
        let stores = Arc::new(CredentialStores::open(session.clone(), local.clone())?);
        let credentials = CredentialManager::new(client, stores);
        let navigation = Navigation::new(
            default_menu(),
            config.default_navigation.clone(),
            local.clone(),
        )?;
        let errors = ErrorQueue::new()?;

        tracing::debug!("Console opened against {}", config.base_url);

        Ok(Self {
            config,
            session,
            local,
            credentials,
            navigation,
            errors,
        })
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn client(&self) -> &ApiClient {
        self.credentials.api()
    }

    pub fn credentials(&self) -> &CredentialManager<ApiClient> {
        &self.credentials
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    pub fn errors(&self) -> &ErrorQueue {
        &self.errors
    }

    pub fn session_storage(&self) -> &Arc<dyn Storage> {
        &self.session
    }

    pub fn local_storage(&self) -> &Arc<dyn Storage> {
        &self.local
    }

    /// The scoped token, or `NotSignedIn`
    pub fn token(&self) -> Result<String> {
        self.credentials.token().ok_or(ConsoleError::NotSignedIn)
    }

    /// Sign in with a username and password and scope the session to a
    /// project. Returns the selected project ID.
    pub async fn login_with_password(&self, username: &str, password: &str) -> Result<String> {
        let issued = self.client().password_token(username, password).await?;
        let email = issued.email.as_deref().unwrap_or(username);
        Ok(self.credentials.set_credentials(&issued.token, email).await?)
    }

    /// Scope an externally issued access token (e.g. from an OIDC login)
    pub async fn login_with_token(&self, access_token: &str, email: &str) -> Result<String> {
        Ok(self
            .credentials
            .set_credentials(access_token, email)
            .await?)
    }

    /// Rescope the current session to another project
    pub async fn switch_project(&self, project_id: &str) -> Result<()> {
        let token = self.token()?;
        Ok(self
            .credentials
            .update_credentials(&token, project_id)
            .await?)
    }

    pub async fn logout(&self) -> Result<()> {
        self.credentials.remove_credentials().await?;
        self.session.clear()?;
        Ok(())
    }

    /// Tear down: drop every subscription, leaving persisted values alone
    pub fn close(self) {
        let stores = self.credentials.stores();
        stores.token.clear_subscribers();
        stores.email.clear_subscribers();
        stores.project.clear_subscribers();
        self.navigation.clear_subscribers();
        self.errors.clear_subscribers();
        tracing::debug!("Console closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialState;

    #[test]
    fn test_in_memory_console() {
        let console = Console::in_memory(ConsoleConfig::default()).unwrap();

        assert_eq!(console.credentials().state(), CredentialState::Anonymous);
        assert!(matches!(console.token(), Err(ConsoleError::NotSignedIn)));
        assert_eq!(
            console.navigation().selected().as_deref(),
            Some("dashboard")
        );
        assert!(console.errors().is_empty());
        console.close();
    }

    #[test]
    fn test_open_persists_under_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConsoleConfig::new().with_state_dir(dir.path());

        let console = Console::open(config.clone()).unwrap();
        console.navigation().select("kubernetes-clusters").unwrap();
        console
            .credentials()
            .stores()
            .project
            .set("p-1".to_string())
            .unwrap();
        console.close();

        let reopened = Console::open(config).unwrap();
        assert_eq!(
            reopened.navigation().selected().as_deref(),
            Some("kubernetes-clusters")
        );
        assert_eq!(reopened.credentials().project().as_deref(), Some("p-1"));
    }

    #[test]
    fn test_invalid_default_navigation_rejected() {
        let config = ConsoleConfig::new().with_default_navigation("kubernetes");
        assert!(matches!(
            Console::in_memory(config),
            Err(ConsoleError::Menu(_))
        ));
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let console = Console::in_memory(ConsoleConfig::default()).unwrap();
        let stores = console.credentials().stores();
        stores.project.set("p-1".to_string()).unwrap();
        stores.email.set("a@example.com".to_string()).unwrap();
        stores.token.set("t".to_string()).unwrap();

        console.logout().await.unwrap();
        assert_eq!(console.credentials().state(), CredentialState::Anonymous);
        assert!(console.credentials().email().is_none());
        assert!(console.credentials().project().is_none());
    }
}
