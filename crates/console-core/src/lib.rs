//! Console Core - client data and state layer for the cloud console
//!
//! This crate holds everything the console front ends share: the typed
//! REST client, the persisted reactive stores that carry credentials and
//! navigation state across restarts, and the small rendering helpers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Console                           │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌──────────────────┐  ┌────────────┐  ┌─────────────┐   │
//! │  │ CredentialManager│  │ Navigation │  │ ErrorQueue  │   │
//! │  └────┬────────┬────┘  └─────┬──────┘  └──────┬──────┘   │
//! │       │        │             │                │          │
//! │  ┌────▼────┐ ┌─▼─────────────▼────────────────▼──────┐   │
//! │  │ApiClient│ │        Persisted<V, Codec>            │   │
//! │  └─────────┘ └──────────────────┬────────────────────┘   │
//! │                                 │                        │
//! │                  ┌──────────────▼──────────────┐         │
//! │                  │ Storage (memory / file)     │         │
//! │                  └─────────────────────────────┘         │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Features
//!
//! - **Persisted stores**: one observable cell type over any backend/codec
//! - **Typed client**: `Result<Body, ApiError>` instead of status callbacks
//! - **Credentials**: acquire, rescope and clear tokens, serialised
//! - **Navigation**: static menu with breadcrumbs and self-healing selection

pub mod client;
pub mod config;
pub mod console;
pub mod credentials;
pub mod error;
pub mod errors;
pub mod format;
pub mod menu;
pub mod oidc;
pub mod store;
pub mod time;

pub use client::{ApiClient, ApiError, Auth, Body, HttpError, RequestOptions};
pub use client::models;
pub use config::ConsoleConfig;
pub use console::Console;
pub use credentials::{
    CredentialBundle, CredentialError, CredentialManager, CredentialState, CredentialStores,
    IdentityApi, Scope,
};
pub use error::{ConsoleError, Result};
pub use errors::ErrorQueue;
pub use menu::{MenuError, MenuNode, Navigation};
pub use store::{
    ChangeKind, Codec, FileStorage, JsonCodec, MemoryStorage, Persisted, Storage, StoreError,
    StringCodec, StringStore, SubscriberId,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default API endpoint
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:6080";

/// Default navigation entry
pub const DEFAULT_NAVIGATION: &str = "dashboard";
