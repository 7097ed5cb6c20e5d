//! Back-end SDK
//!
//! Authentication and document storage behind two traits, so handlers never
//! know whether they talk to Firebase or to the local SQLite database.
//!
//! ```rust,no_run
//! use daya::sdk::{Sdk, SdkConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sdk = Sdk::bootstrap(&SdkConfig::in_memory())?;
//!     let uid = sdk.auth().sign_up("owner@example.com", "rahasia1").await?;
//!     let session = sdk.auth().sign_in("owner@example.com", "rahasia1").await?;
//!     assert_eq!(sdk.auth().verify(&session.token).await?, uid);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod error;
pub mod firebase;
pub mod project;
pub mod sqlite;
pub mod store;

pub use auth::{AuthProvider, AuthSession, LocalAuth, MIN_PASSWORD_LEN};
pub use error::SdkError;
pub use firebase::{FirebaseAuth, FirestoreStore};
pub use project::ProjectConfig;
pub use sqlite::SqliteStore;
pub use store::{
    to_fields, Direction, Document, DocumentStore, FieldFilter, Fields, FilterOp, OrderBy, Query,
};

use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// SQLite path that opens a private in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// Which auth and document store back end to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// SQLite documents and bcrypt passwords
    #[default]
    Local,
    /// Firebase identity toolkit and Firestore REST
    Firebase,
}

#[derive(Debug, Clone)]
pub struct SdkConfig {
    pub backend: BackendKind,
    pub project: ProjectConfig,
    pub sqlite_path: String,
    pub request_timeout_ms: u64,
    pub bcrypt_cost: u32,
}

impl SdkConfig {
    /// Local back end on a throwaway database
    pub fn in_memory() -> Self {
        Self {
            backend: BackendKind::Local,
            project: ProjectConfig::default(),
            sqlite_path: IN_MEMORY.to_string(),
            request_timeout_ms: 10_000,
            bcrypt_cost: 4,
        }
    }
}

/// Initialised back-end handles
#[derive(Clone)]
pub struct Sdk {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn DocumentStore>,
}

impl Sdk {
    /// Connect the configured back end
    pub fn bootstrap(config: &SdkConfig) -> Result<Self, SdkError> {
        let sdk = match config.backend {
            BackendKind::Local => {
                let store: Arc<dyn DocumentStore> = if config.sqlite_path == IN_MEMORY {
                    Arc::new(SqliteStore::in_memory()?)
                } else {
                    Arc::new(SqliteStore::open(Path::new(&config.sqlite_path))?)
                };
                let auth = LocalAuth::new(Arc::clone(&store)).with_cost(config.bcrypt_cost);
                Self::from_parts(Arc::new(auth), store)
            }
            BackendKind::Firebase => Self::from_parts(
                Arc::new(FirebaseAuth::new(config.project.clone(), config.request_timeout_ms)?),
                Arc::new(FirestoreStore::new(config.project.clone(), config.request_timeout_ms)?),
            ),
        };

        tracing::info!(
            auth = sdk.auth.name(),
            store = sdk.store.name(),
            "Back end initialised"
        );
        Ok(sdk)
    }

    pub fn from_parts(auth: Arc<dyn AuthProvider>, store: Arc<dyn DocumentStore>) -> Self {
        Self { auth, store }
    }

    pub fn auth(&self) -> &Arc<dyn AuthProvider> {
        &self.auth
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bootstrap_local() {
        let sdk = Sdk::bootstrap(&SdkConfig::in_memory()).unwrap();
        assert_eq!(sdk.auth().name(), "local");
        assert_eq!(sdk.store().name(), "sqlite");
        sdk.store().ping().await.unwrap();
    }

    #[test]
    fn test_bootstrap_firebase_requires_project() {
        let config = SdkConfig {
            backend: BackendKind::Firebase,
            ..SdkConfig::in_memory()
        };
        assert!(matches!(Sdk::bootstrap(&config), Err(SdkError::Config(_))));

        let config = SdkConfig {
            backend: BackendKind::Firebase,
            project: ProjectConfig::new("key", "daya-iot"),
            ..SdkConfig::in_memory()
        };
        let sdk = Sdk::bootstrap(&config).unwrap();
        assert_eq!(sdk.store().name(), "firestore");
    }
}
