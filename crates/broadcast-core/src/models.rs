//! Session data model.
//!
//! These types mirror the backend's JSON representation of a broadcast
//! session. The record is owned by the broadcaster's controller; everything
//! else reads it through published snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::SessionError;

/// Lifecycle phase of a broadcast session.
///
/// `Idle` through `Ended` form the main path; `Failed` is reachable from
/// `Starting` (backend rejection, devices retained) or from `Live`
/// (unrecoverable channel failure, full cleanup).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    DeviceReady,
    Starting,
    Live,
    Ending,
    Ended,
    Failed,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::DeviceReady => "device_ready",
            Self::Starting => "starting",
            Self::Live => "live",
            Self::Ending => "ending",
            Self::Ended => "ended",
            Self::Failed => "failed",
        }
    }

    /// Terminal phases hold no resources and accept no further commands
    /// besides shutdown.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended | Self::Failed)
    }
}

/// Session category (for discovery/filtering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionCategory {
    Music,
    Talk,
    Performance,
    Education,
    Other,
}

/// Canonical session record as assigned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<SessionCategory>,
    #[serde(default)]
    pub ticketed: bool,
    #[serde(default)]
    pub ticket_price: Option<f64>,
    #[serde(default = "default_chat_enabled")]
    pub chat_enabled: bool,
    pub status: SessionPhase,
    /// Playback endpoint for viewers; independent of channel health.
    #[serde(default)]
    pub media_url: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

fn default_chat_enabled() -> bool {
    true
}

/// Request to create a new broadcast session.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    pub category: Option<SessionCategory>,

    #[serde(default)]
    pub ticketed: bool,

    #[serde(default)]
    pub ticket_price: Option<f64>,

    #[serde(default = "default_chat_enabled")]
    pub chat_enabled: bool,
}

impl CreateSessionRequest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            category: None,
            ticketed: false,
            ticket_price: None,
            chat_enabled: true,
        }
    }

    /// Guard validation, run before any network call is issued.
    pub fn check(&self) -> Result<(), SessionError> {
        self.validate()
            .map_err(|e| SessionError::State(e.to_string()))?;
        if self.ticketed && self.ticket_price.is_none() {
            return Err(SessionError::State(
                "ticketed session requires a ticket price".into(),
            ));
        }
        if let Some(price) = self.ticket_price {
            if price < 0.0 {
                return Err(SessionError::State("ticket price must not be negative".into()));
            }
        }
        Ok(())
    }
}
