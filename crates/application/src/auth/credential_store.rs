//! Credential store port and in-memory adapter.

use async_trait::async_trait;
use tokio::sync::RwLock;

use atrium_domain::Credential;

/// Credential store failures.
#[derive(Debug, thiserror::Error)]
pub enum CredentialStoreError {
    /// Underlying storage I/O failed.
    #[error("credential storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored document could not be (de)serialized.
    #[error("credential serialization error: {0}")]
    Serialization(String),
}

/// Port for persisting the credential pair.
///
/// Readers must tolerate the pair changing between calls: the refresh path
/// rewrites the access half while requests are in flight, so callers
/// re-read per request rather than caching a loaded credential.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the stored pair. Missing or unreadable storage reads as `None`.
    async fn load(&self) -> Option<Credential>;

    /// Replace the stored pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the pair cannot be written.
    async fn store(&self, credential: &Credential) -> Result<(), CredentialStoreError>;

    /// Replace only the access half, keeping the stored refresh token.
    /// A no-op when no pair is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated pair cannot be written.
    async fn store_access_token(&self, access_token: &str) -> Result<(), CredentialStoreError>;

    /// Purge both halves.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be cleared.
    async fn clear(&self) -> Result<(), CredentialStoreError>;
}

/// In-memory credential store, used by tests and short-lived tools.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: RwLock<Option<Credential>>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with a credential pair.
    #[must_use]
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: RwLock::new(Some(credential)),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Option<Credential> {
        self.credential.read().await.clone()
    }

    async fn store(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        *self.credential.write().await = Some(credential.clone());
        Ok(())
    }

    async fn store_access_token(&self, access_token: &str) -> Result<(), CredentialStoreError> {
        let mut guard = self.credential.write().await;
        if let Some(credential) = guard.as_mut() {
            credential.access_token = access_token.to_string();
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialStoreError> {
        *self.credential.write().await = None;
        Ok(())
    }
}
