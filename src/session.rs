//! The operator's session: token and display name, mirrored to a JSON file.
//!
//! The store is only reachable through [`crate::AppState`], so a handler
//! cannot touch the session without the router having provided it.

use crate::errors::AppError;
use crate::models::Session;
use crate::storage::{clear_session, load_session, persist_session};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::Mutex;
use tracing::info;

/// A session as seen by one request, tagged with the epoch it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session: Session,
    pub epoch: u64,
}

impl SessionSnapshot {
    /// The stored token, if it is non-empty.
    pub fn token(&self) -> Option<&str> {
        self.session.token.as_deref().filter(|token| !token.is_empty())
    }

    pub fn display_name(&self) -> &str {
        self.session.display_name.as_deref().unwrap_or("")
    }
}

#[derive(Debug)]
struct Inner {
    session: Session,
    /// Advances on every login and logout.
    epoch: u64,
}

#[derive(Clone)]
pub struct SessionStore {
    path: PathBuf,
    inner: Arc<Mutex<Inner>>,
}

impl SessionStore {
    pub fn new(path: PathBuf, session: Session) -> Self {
        Self {
            path,
            inner: Arc::new(Mutex::new(Inner { session, epoch: 0 })),
        }
    }

    pub async fn load(path: PathBuf) -> Self {
        let session = load_session(&path).await;
        if session.is_authenticated() {
            info!("restored session from {}", path.display());
        }
        Self::new(path, session)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock().await;
        SessionSnapshot {
            session: inner.session.clone(),
            epoch: inner.epoch,
        }
    }

    pub async fn login(
        &self,
        token: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<SessionSnapshot, AppError> {
        let session = Session {
            token: Some(token.into()),
            display_name: Some(display_name.into()),
        };

        let mut inner = self.inner.lock().await;
        persist_session(&self.path, &session).await?;
        inner.session = session;
        inner.epoch += 1;
        info!(epoch = inner.epoch, "admin logged in");

        Ok(SessionSnapshot {
            session: inner.session.clone(),
            epoch: inner.epoch,
        })
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        // memory only changes once the file is gone, so a restart cannot revive the token
        clear_session(&self.path).await?;
        inner.session = Session::default();
        inner.epoch += 1;
        info!(epoch = inner.epoch, "admin logged out");
        Ok(())
    }
}
