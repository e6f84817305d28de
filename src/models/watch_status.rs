use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::{fmt::Display, str::FromStr};

use crate::error::AppError;

use super::ContentType;

/// A status that is persisted as a record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    CurrentlyWatching,
    WatchLater,
    Watched,
    Rewatch,
}

impl WatchStatus {
    pub const ALL: [WatchStatus; 4] = [
        WatchStatus::CurrentlyWatching,
        WatchStatus::WatchLater,
        WatchStatus::Watched,
        WatchStatus::Rewatch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WatchStatus::CurrentlyWatching => "currently_watching",
            WatchStatus::WatchLater => "watch_later",
            WatchStatus::Watched => "watched",
            WatchStatus::Rewatch => "rewatch",
        }
    }
}

impl Display for WatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WatchStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        WatchStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| AppError::InvalidInput("Invalid status value".to_string()))
    }
}

/// Status as seen at the API boundary. `None` is never stored: it is the
/// absence of a record, so "never set" and "cleared" look the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusSelection {
    Active(WatchStatus),
    None,
}

impl StatusSelection {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusSelection::Active(status) => status.as_str(),
            StatusSelection::None => "none",
        }
    }
}

impl From<WatchStatus> for StatusSelection {
    fn from(status: WatchStatus) -> Self {
        StatusSelection::Active(status)
    }
}

impl From<Option<WatchStatus>> for StatusSelection {
    fn from(status: Option<WatchStatus>) -> Self {
        status.map_or(StatusSelection::None, StatusSelection::Active)
    }
}

impl FromStr for StatusSelection {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "none" => Ok(StatusSelection::None),
            other => other.parse().map(StatusSelection::Active),
        }
    }
}

impl Display for StatusSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StatusSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Composite key identifying at most one record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchStatusKey {
    pub user_id: String,
    pub content_id: String,
    pub content_type: ContentType,
}

impl WatchStatusKey {
    pub fn new(
        user_id: impl Into<String>,
        content_id: impl Into<String>,
        content_type: ContentType,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            content_id: content_id.into(),
            content_type,
        }
    }
}

/// Persisted per-user status annotation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchStatusRecord {
    pub user_id: String,
    pub content_id: String,
    pub content_type: ContentType,
    pub status: WatchStatus,
    pub last_season: Option<i32>,
    pub last_episode: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WatchStatusRecord {
    pub fn matches(&self, key: &WatchStatusKey) -> bool {
        self.user_id == key.user_id
            && self.content_id == key.content_id
            && self.content_type == key.content_type
    }
}

/// Requested change to one key. Unset season/episode fields are left as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchStatusUpdate {
    pub status: StatusSelection,
    pub last_season: Option<i32>,
    pub last_episode: Option<i32>,
}

impl WatchStatusUpdate {
    pub fn status(status: StatusSelection) -> Self {
        Self {
            status,
            last_season: None,
            last_episode: None,
        }
    }
}

/// What an upsert did to the stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
    Removed,
    /// `none` requested for a key that had no record
    Unchanged,
}
