use std::{
    io,
    path::{Path, PathBuf},
};

use {async_trait::async_trait, pesan_channels::SessionArtifacts, tracing::info};

/// Directory where the bridge keeps linked-device credentials.
#[derive(Debug, Clone)]
pub struct AuthStateDir {
    path: PathBuf,
}

impl AuthStateDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionArtifacts for AuthStateDir {
    async fn cleanup(&self) -> io::Result<()> {
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => {
                info!(path = %self.path.display(), "removed persisted session state");
                Ok(())
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cleanup_removes_session_dir() {
        let dir = tempfile::tempdir().unwrap();
        let session = dir.path().join(".wwebjs_auth");
        std::fs::create_dir_all(session.join("session/Default")).unwrap();
        std::fs::write(session.join("session/Default/Cookies"), b"x").unwrap();

        let store = AuthStateDir::new(&session);
        store.cleanup().await.unwrap();
        assert!(!session.exists());
    }

    #[tokio::test]
    async fn cleanup_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = AuthStateDir::new(dir.path().join("never-created"));
        store.cleanup().await.unwrap();
        store.cleanup().await.unwrap();
    }
}
