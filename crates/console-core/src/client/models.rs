//! Resource types exchanged with the console API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fields the client does not model, kept so updates round-trip them
pub type Extra = serde_json::Map<String, serde_json::Value>;

/// Body of a token exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRequest {
    pub project: ProjectScope,
}

impl TokenRequest {
    pub fn for_project(id: impl Into<String>) -> Self {
        Self {
            project: ProjectScope { id: id.into() },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectScope {
    pub id: String,
}

/// Issued token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Compute flavor; memory is in GiB
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flavor {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub cpus: u32,
    pub memory: u32,

    #[serde(default)]
    pub gpus: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPair {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityZone {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalNetwork {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationCredentialRequest {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationCredential {
    pub id: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

/// Versioned application bundle offered for control planes and clusters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationBundle {
    pub name: String,
    pub version: String,

    #[serde(default)]
    pub preview: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_of_life: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_readable_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(flatten)]
    pub extra: Extra,
}

/// Server-side status shared by provisioned resources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatus {
    pub creation_time: DateTime<Utc>,
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPlane {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_bundle: Option<ApplicationBundle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ResourceStatus>,

    #[serde(flatten)]
    pub extra: Extra,
}

impl ControlPlane {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            application_bundle: None,
            status: None,
            extra: Extra::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_bundle: Option<ApplicationBundle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ResourceStatus>,

    #[serde(flatten)]
    pub extra: Extra,
}

impl Cluster {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            application_bundle: None,
            status: None,
            extra: Extra::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_request_shape() {
        let body = serde_json::to_value(TokenRequest::for_project("p-1")).unwrap();
        assert_eq!(body, serde_json::json!({"project": {"id": "p-1"}}));
    }

    #[test]
    fn test_flavor_without_gpus() {
        let flavor: Flavor =
            serde_json::from_str(r#"{"name":"m1","cpus":4,"memory":8}"#).unwrap();
        assert_eq!(flavor.gpus, 0);
    }

    #[test]
    fn test_control_plane_keeps_unknown_fields() {
        let raw = serde_json::json!({
            "name": "cp-1",
            "applicationBundle": {"name": "b", "version": "1.2.0", "preview": true},
            "status": {"creationTime": "2026-01-01T00:00:00Z", "status": "Provisioned"},
            "timeout": 600
        });

        let cp: ControlPlane = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(cp.name, "cp-1");
        assert!(cp.application_bundle.as_ref().unwrap().preview);
        assert_eq!(cp.status.as_ref().unwrap().status, "Provisioned");
        assert_eq!(cp.extra.get("timeout"), Some(&serde_json::json!(600)));

        let back = serde_json::to_value(&cp).unwrap();
        assert_eq!(back["timeout"], serde_json::json!(600));
        assert_eq!(back["applicationBundle"]["version"], "1.2.0");
    }
}
