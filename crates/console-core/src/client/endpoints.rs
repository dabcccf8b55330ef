//! Typed wrappers over the console REST surface

use reqwest::Method;

use super::models::{
    Application, ApplicationBundle, ApplicationCredential, ApplicationCredentialRequest,
    AvailabilityZone, Cluster, ControlPlane, ExternalNetwork, Flavor, Image, KeyPair, Project,
    TokenRequest, TokenResponse,
};
use super::{ApiClient, ApiError, Auth, RequestOptions};

const OPENSTACK: &str = "/api/v1/providers/openstack";

fn bearer(token: &str) -> RequestOptions {
    RequestOptions::new().with_token(token)
}

fn bearer_with<T: serde::Serialize>(token: &str, body: &T) -> Result<RequestOptions, ApiError> {
    Ok(bearer(token).with_body(serde_json::to_value(body)?))
}

impl ApiClient {
    /// Issue a token: exchanges a bearer token, or logs in with basic credentials
    pub async fn create_token(
        &self,
        auth: Auth,
        scope: Option<&TokenRequest>,
    ) -> Result<TokenResponse, ApiError> {
        let path = match auth {
            Auth::Bearer(_) => "/api/v1/auth/tokens/token",
            _ => "/api/v1/auth/tokens/password",
        };

        let mut opts = RequestOptions {
            auth,
            body: None,
        };
        if let Some(scope) = scope {
            opts.body = Some(serde_json::to_value(scope)?);
        }

        self.json(Method::POST, path, opts).await
    }

    /// Exchange `token` for one scoped to `project_id`
    pub async fn exchange_token(
        &self,
        token: &str,
        project_id: &str,
    ) -> Result<TokenResponse, ApiError> {
        let scope = TokenRequest::for_project(project_id);
        self.create_token(Auth::Bearer(token.to_string()), Some(&scope))
            .await
    }

    /// Obtain an unscoped token with a username and password
    pub async fn password_token(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenResponse, ApiError> {
        let auth = Auth::Basic {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.create_token(auth, None).await
    }

    pub async fn list_projects(&self, token: &str) -> Result<Vec<Project>, ApiError> {
        self.json(Method::GET, &format!("{OPENSTACK}/projects"), bearer(token))
            .await
    }

    pub async fn list_flavors(&self, token: &str) -> Result<Vec<Flavor>, ApiError> {
        self.json(Method::GET, &format!("{OPENSTACK}/flavors"), bearer(token))
            .await
    }

    pub async fn list_images(&self, token: &str) -> Result<Vec<Image>, ApiError> {
        self.json(Method::GET, &format!("{OPENSTACK}/images"), bearer(token))
            .await
    }

    pub async fn list_key_pairs(&self, token: &str) -> Result<Vec<KeyPair>, ApiError> {
        self.json(Method::GET, &format!("{OPENSTACK}/key-pairs"), bearer(token))
            .await
    }

    pub async fn list_compute_availability_zones(
        &self,
        token: &str,
    ) -> Result<Vec<AvailabilityZone>, ApiError> {
        self.json(
            Method::GET,
            &format!("{OPENSTACK}/availability-zones/compute"),
            bearer(token),
        )
        .await
    }

    pub async fn list_block_storage_availability_zones(
        &self,
        token: &str,
    ) -> Result<Vec<AvailabilityZone>, ApiError> {
        self.json(
            Method::GET,
            &format!("{OPENSTACK}/availability-zones/block-storage"),
            bearer(token),
        )
        .await
    }

    pub async fn list_external_networks(
        &self,
        token: &str,
    ) -> Result<Vec<ExternalNetwork>, ApiError> {
        self.json(
            Method::GET,
            &format!("{OPENSTACK}/external-networks"),
            bearer(token),
        )
        .await
    }

    pub async fn create_application_credential(
        &self,
        token: &str,
        request: &ApplicationCredentialRequest,
    ) -> Result<ApplicationCredential, ApiError> {
        self.json(
            Method::POST,
            &format!("{OPENSTACK}/application-credentials"),
            bearer_with(token, request)?,
        )
        .await
    }

    pub async fn delete_application_credential(
        &self,
        token: &str,
        name: &str,
    ) -> Result<(), ApiError> {
        self.ignore_body(
            Method::DELETE,
            &format!("{OPENSTACK}/application-credentials/{name}"),
            bearer(token),
        )
        .await
    }

    /// Provision the platform project for the current scope
    pub async fn create_project(&self, token: &str) -> Result<(), ApiError> {
        self.ignore_body(Method::POST, "/api/v1/project", bearer(token))
            .await
    }

    pub async fn list_control_planes(&self, token: &str) -> Result<Vec<ControlPlane>, ApiError> {
        self.json(Method::GET, "/api/v1/controlplanes", bearer(token))
            .await
    }

    pub async fn get_control_plane(
        &self,
        token: &str,
        control_plane: &str,
    ) -> Result<ControlPlane, ApiError> {
        self.json(
            Method::GET,
            &format!("/api/v1/controlplanes/{control_plane}"),
            bearer(token),
        )
        .await
    }

    pub async fn create_control_plane(
        &self,
        token: &str,
        control_plane: &ControlPlane,
    ) -> Result<(), ApiError> {
        self.ignore_body(
            Method::POST,
            "/api/v1/controlplanes",
            bearer_with(token, control_plane)?,
        )
        .await
    }

    pub async fn update_control_plane(
        &self,
        token: &str,
        control_plane: &ControlPlane,
    ) -> Result<(), ApiError> {
        self.ignore_body(
            Method::PUT,
            &format!("/api/v1/controlplanes/{}", control_plane.name),
            bearer_with(token, control_plane)?,
        )
        .await
    }

    pub async fn delete_control_plane(
        &self,
        token: &str,
        control_plane: &str,
    ) -> Result<(), ApiError> {
        self.ignore_body(
            Method::DELETE,
            &format!("/api/v1/controlplanes/{control_plane}"),
            bearer(token),
        )
        .await
    }

    pub async fn list_clusters(
        &self,
        token: &str,
        control_plane: &str,
    ) -> Result<Vec<Cluster>, ApiError> {
        self.json(
            Method::GET,
            &format!("/api/v1/controlplanes/{control_plane}/clusters"),
            bearer(token),
        )
        .await
    }

    pub async fn get_cluster(
        &self,
        token: &str,
        control_plane: &str,
        cluster: &str,
    ) -> Result<Cluster, ApiError> {
        self.json(
            Method::GET,
            &format!("/api/v1/controlplanes/{control_plane}/clusters/{cluster}"),
            bearer(token),
        )
        .await
    }

    pub async fn create_cluster(
        &self,
        token: &str,
        control_plane: &str,
        cluster: &Cluster,
    ) -> Result<(), ApiError> {
        self.ignore_body(
            Method::POST,
            &format!("/api/v1/controlplanes/{control_plane}/clusters"),
            bearer_with(token, cluster)?,
        )
        .await
    }

    pub async fn update_cluster(
        &self,
        token: &str,
        control_plane: &str,
        cluster: &Cluster,
    ) -> Result<(), ApiError> {
        self.ignore_body(
            Method::PUT,
            &format!(
                "/api/v1/controlplanes/{control_plane}/clusters/{}",
                cluster.name
            ),
            bearer_with(token, cluster)?,
        )
        .await
    }

    pub async fn delete_cluster(
        &self,
        token: &str,
        control_plane: &str,
        cluster: &str,
    ) -> Result<(), ApiError> {
        self.ignore_body(
            Method::DELETE,
            &format!("/api/v1/controlplanes/{control_plane}/clusters/{cluster}"),
            bearer(token),
        )
        .await
    }

    /// Kubeconfig for a cluster, as raw bytes
    pub async fn get_cluster_kubeconfig(
        &self,
        token: &str,
        control_plane: &str,
        cluster: &str,
    ) -> Result<Vec<u8>, ApiError> {
        self.binary(
            Method::GET,
            &format!("/api/v1/controlplanes/{control_plane}/clusters/{cluster}/kubeconfig"),
            bearer(token),
        )
        .await
    }

    pub async fn list_control_plane_bundles(
        &self,
        token: &str,
    ) -> Result<Vec<ApplicationBundle>, ApiError> {
        self.json(
            Method::GET,
            "/api/v1/applicationbundles/controlPlane",
            bearer(token),
        )
        .await
    }

    pub async fn list_cluster_bundles(
        &self,
        token: &str,
    ) -> Result<Vec<ApplicationBundle>, ApiError> {
        self.json(Method::GET, "/api/v1/applicationbundles/cluster", bearer(token))
            .await
    }

    pub async fn list_applications(&self, token: &str) -> Result<Vec<Application>, ApiError> {
        self.json(Method::GET, "/api/v1/applications", bearer(token))
            .await
    }
}
