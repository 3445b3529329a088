//! Persisted auth token access.
//!
//! The surrounding application writes a token file at login; this module
//! only reads it. The token rides on REST calls as a bearer header and its
//! identity fields are what `join` carries onto the realtime channel. The
//! core never mints or verifies tokens.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use broadcast_core::{Result, SessionError};

/// Participant identity carried by the channel `join` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub viewer_id: String,
    pub display_name: String,
}

/// Token file contents, as persisted by the login flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
    pub viewer_id: String,
    pub display_name: String,
}

impl StoredToken {
    pub fn identity(&self) -> Identity {
        Identity {
            viewer_id: self.viewer_id.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

/// Reads the persisted token, with an environment override for hosts that
/// inject credentials directly.
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self) -> Result<StoredToken> {
        if let (Ok(token), Ok(viewer_id)) =
            (env::var("BROADCAST_AUTH_TOKEN"), env::var("BROADCAST_AUTH_VIEWER_ID"))
        {
            let display_name =
                env::var("BROADCAST_AUTH_DISPLAY_NAME").unwrap_or_else(|_| viewer_id.clone());
            return Ok(StoredToken {
                token,
                viewer_id,
                display_name,
            });
        }

        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            SessionError::State(format!(
                "no persisted auth token at {}: {e}",
                self.path.display()
            ))
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| SessionError::State(format!("unreadable auth token file: {e}")))
    }
}
