//! Keeps the signed-in session in a JSON file so a restart does not sign the
//! user out.
//!
//! Errors are logged and swallowed: an unreadable or foreign file simply
//! means "no stored session".
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, warn};

use super::Session;

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    user_pool_id: String,
    client_id: String,
}

/// On-disk shape. The pool and client ids keep a file written for one
/// deployment from being picked up by another.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    user_pool_id: String,
    client_id: String,
    session: Session,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>, user_pool_id: &str, client_id: &str) -> Self {
        Self {
            path: path.into(),
            user_pool_id: user_pool_id.to_owned(),
            client_id: client_id.to_owned(),
        }
    }

    pub async fn load(&self) -> Option<Session> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "session_store: failed to read session file");
                return None;
            }
        };

        let stored = match serde_json::from_slice::<StoredSession>(&bytes) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "session_store: ignoring malformed session file");
                return None;
            }
        };

        if stored.user_pool_id != self.user_pool_id || stored.client_id != self.client_id {
            debug!(path = %self.path.display(), "session_store: session belongs to another app client");
            return None;
        }

        Some(stored.session)
    }

    pub async fn save(&self, session: &Session) {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(dir).await {
                warn!(path = %self.path.display(), error = %e, "session_store: failed to create directory");
                return;
            }
        }

        let stored = StoredSession {
            user_pool_id: self.user_pool_id.clone(),
            client_id: self.client_id.clone(),
            session: session.clone(),
        };
        let content = match serde_json::to_vec_pretty(&stored) {
            Ok(content) => content,
            Err(e) => {
                warn!(error = %e, "session_store: failed to serialise session");
                return;
            }
        };

        if let Err(e) = write_private(&self.path, &content).await {
            warn!(path = %self.path.display(), error = %e, "session_store: failed to write session file");
        } else {
            debug!(path = %self.path.display(), "session_store: saved");
        }
    }

    pub async fn clear(&self) {
        match fs::remove_file(&self.path).await {
            Ok(()) => debug!(path = %self.path.display(), "session_store: cleared"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "session_store: failed to remove session file")
            }
        }
    }
}

/// The file holds refresh tokens, so on unix it is readable by the owner only,
/// including when an older file with wider permissions is overwritten.
async fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .await?;
    }
    file.write_all(content).await?;
    file.flush().await
}
