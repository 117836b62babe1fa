//! File-backed credential store.
//!
//! The credential pair is persisted as a small JSON document with fixed
//! `accessToken` / `refreshToken` keys, the desktop equivalent of the
//! cookie pair the web console keeps. The file lives under the user config
//! directory; add it to backup exclusions rather than version control.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::warn;

use atrium_application::{CredentialStore, CredentialStoreError};
use atrium_domain::Credential;

/// Credential store backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store backed by the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store at the default location under the user config dir,
    /// `<config>/atrium/credentials.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if no user config directory can be determined.
    pub fn default_location() -> Result<Self, CredentialStoreError> {
        let base = dirs::config_dir().ok_or_else(|| {
            CredentialStoreError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "no user config directory",
            ))
        })?;
        Ok(Self::new(base.join("atrium").join("credentials.json")))
    }

    /// The file this store reads and writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_pair(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_vec_pretty(credential)
            .map_err(|e| CredentialStoreError::Serialization(e.to_string()))?;
        fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Option<Credential> {
        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "credential file unreadable");
                return None;
            }
        };

        match serde_json::from_slice(&content) {
            Ok(credential) => Some(credential),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "credential file corrupt");
                None
            }
        }
    }

    async fn store(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        self.write_pair(credential).await
    }

    async fn store_access_token(&self, access_token: &str) -> Result<(), CredentialStoreError> {
        let Some(mut credential) = self.load().await else {
            return Ok(());
        };
        credential.access_token = access_token.to_string();
        self.write_pair(&credential).await
    }

    async fn clear(&self) -> Result<(), CredentialStoreError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CredentialStoreError::Io(e)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> FileCredentialStore {
        FileCredentialStore::new(dir.path().join("atrium").join("credentials.json"))
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert_eq!(store.load().await, None);

        let cred = Credential::new("tok-a", "tok-r");
        store.store(&cred).await.unwrap();
        assert_eq!(store.load().await, Some(cred));
    }

    #[tokio::test]
    async fn test_persisted_document_uses_fixed_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .store(&Credential::new("tok-a", "tok-r"))
            .await
            .unwrap();

        let raw = tokio::fs::read_to_string(store.path()).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["accessToken"], "tok-a");
        assert_eq!(value["refreshToken"], "tok-r");
    }

    #[tokio::test]
    async fn test_store_access_token_rewrites_only_access_half() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .store(&Credential::new("tok-old", "tok-r"))
            .await
            .unwrap();

        store.store_access_token("tok-new").await.unwrap();
        assert_eq!(
            store.load().await,
            Some(Credential::new("tok-new", "tok-r"))
        );
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .store(&Credential::new("tok-a", "tok-r"))
            .await
            .unwrap();

        store.clear().await.unwrap();
        assert_eq!(store.load().await, None);
        // Clearing an already-empty store is a no-op.
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        tokio::fs::create_dir_all(store.path().parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(store.path(), b"not json").await.unwrap();
        assert_eq!(store.load().await, None);
    }
}
