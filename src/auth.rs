//! Authentication session
//!
//! Process-wide session state: the signed-in user and their API token.
//! The session is restored from a JSON cache file at app start and torn down
//! on sign-out. It is constructed once and injected into the controller and
//! transport by reference, so the core stays testable without any ambient
//! global lookup.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Marketplace role of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Agricultural employer
    Productor,
    /// Agricultural worker
    Trabajador,
}

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    /// Backend user id
    pub id: i64,
    /// First name
    pub name: String,
    /// Last name
    pub lastname: String,
    /// Account email
    pub email: String,
    /// Marketplace role
    pub role: UserRole,
}

/// Serialized session cache contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionData {
    user: Option<AuthUser>,
    token: Option<String>,
}

/// Process-wide authentication session
///
/// Holds the current user and API token behind an async lock. An optional
/// cache file keeps the session across app restarts.
#[derive(Debug)]
pub struct Session {
    data: RwLock<SessionData>,
    cache_path: Option<PathBuf>,
}

impl Session {
    /// Create a signed-out session with no cache file
    pub fn new() -> Self {
        Self {
            data: RwLock::new(SessionData::default()),
            cache_path: None,
        }
    }

    /// Create a signed-out session that persists to the given cache file
    pub fn with_cache<P: AsRef<Path>>(path: P) -> Self {
        Self {
            data: RwLock::new(SessionData::default()),
            cache_path: Some(path.as_ref().to_path_buf()),
        }
    }

    /// Restore a session from its cache file
    ///
    /// Returns a signed-out session if the file does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or deserialized
    pub fn restore<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            debug!("No session cache at {}, starting signed out", path_ref.display());
            return Ok(Self::with_cache(path_ref));
        }

        let json = std::fs::read_to_string(path_ref)
            .map_err(|e| Error::Storage(format!("Failed to read session cache: {}", e)))?;
        let data: SessionData = serde_json::from_str(&json)?;

        if let Some(user) = &data.user {
            info!("Restored session for user {}", user.id);
        }

        Ok(Self {
            data: RwLock::new(data),
            cache_path: Some(path_ref.to_path_buf()),
        })
    }

    /// Sign in with a user and API token
    ///
    /// Persists the session to the cache file, when one is configured.
    pub async fn sign_in(&self, user: AuthUser, token: String) -> Result<()> {
        let mut guard = self.data.write().await;
        guard.user = Some(user);
        guard.token = Some(token);
        self.persist(&guard)?;
        Ok(())
    }

    /// Sign out, clearing the session and removing the cache file
    ///
    /// Safe to call when already signed out.
    pub async fn sign_out(&self) -> Result<()> {
        let mut guard = self.data.write().await;
        if guard.user.is_none() && guard.token.is_none() {
            return Ok(());
        }
        guard.user = None;
        guard.token = None;

        if let Some(path) = &self.cache_path {
            if path.exists() {
                std::fs::remove_file(path)
                    .map_err(|e| Error::Storage(format!("Failed to remove session cache: {}", e)))?;
            }
        }
        info!("Signed out");
        Ok(())
    }

    /// The currently signed-in user, if any
    pub async fn current_user(&self) -> Option<AuthUser> {
        self.data.read().await.user.clone()
    }

    /// The current API token, if signed in
    pub async fn token(&self) -> Option<String> {
        self.data.read().await.token.clone()
    }

    /// Whether a user is signed in with a token
    pub async fn is_authenticated(&self) -> bool {
        let guard = self.data.read().await;
        guard.user.is_some() && guard.token.is_some()
    }

    fn persist(&self, data: &SessionData) -> Result<()> {
        if let Some(path) = &self.cache_path {
            let json = serde_json::to_string_pretty(data)?;
            std::fs::write(path, json)
                .map_err(|e| Error::Storage(format!("Failed to write session cache: {}", e)))?;
        }
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_user() -> AuthUser {
        AuthUser {
            id: 42,
            name: "Carlos".to_string(),
            lastname: "Mejía".to_string(),
            email: "carlos@example.com".to_string(),
            role: UserRole::Productor,
        }
    }

    #[tokio::test]
    async fn test_new_session_is_signed_out() {
        let session = Session::new();
        assert!(!session.is_authenticated().await);
        assert!(session.current_user().await.is_none());
        assert!(session.token().await.is_none());
    }

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let session = Session::new();
        session
            .sign_in(create_test_user(), "token-123".to_string())
            .await
            .expect("Failed to sign in");

        assert!(session.is_authenticated().await);
        assert_eq!(session.current_user().await.map(|u| u.id), Some(42));
        assert_eq!(session.token().await.as_deref(), Some("token-123"));

        session.sign_out().await.expect("Failed to sign out");
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_sign_out_is_safe_when_signed_out() {
        let session = Session::new();
        session.sign_out().await.expect("First sign out failed");
        session.sign_out().await.expect("Repeated sign out failed");
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_restore_round_trip() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("session.json");

        let session = Session::with_cache(&path);
        session
            .sign_in(create_test_user(), "token-abc".to_string())
            .await
            .expect("Failed to sign in");

        let restored = Session::restore(&path).expect("Failed to restore session");
        assert!(restored.is_authenticated().await);
        assert_eq!(restored.current_user().await.map(|u| u.id), Some(42));
        assert_eq!(restored.token().await.as_deref(), Some("token-abc"));
    }

    #[tokio::test]
    async fn test_restore_missing_file_starts_signed_out() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("absent.json");

        let session = Session::restore(&path).expect("Failed to restore session");
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_sign_out_removes_cache_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("session.json");

        let session = Session::with_cache(&path);
        session
            .sign_in(create_test_user(), "token-abc".to_string())
            .await
            .expect("Failed to sign in");
        assert!(path.exists());

        session.sign_out().await.expect("Failed to sign out");
        assert!(!path.exists());
    }
}
