//! Error types for the console core

use thiserror::Error;

use crate::client::ApiError;
use crate::credentials::CredentialError;
use crate::menu::MenuError;
use crate::oidc::OidcError;
use crate::store::StoreError;

/// Console error type
#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Credential error: {0}")]
    Credentials(#[from] CredentialError),

    #[error("Menu error: {0}")]
    Menu(#[from] MenuError),

    #[error("OIDC error: {0}")]
    Oidc(#[from] OidcError),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ConsoleError {
    fn from(e: serde_json::Error) -> Self {
        ConsoleError::Serialization(e.to_string())
    }
}

/// Result type for console operations
pub type Result<T> = std::result::Result<T, ConsoleError>;
