use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use super::envelope::ResponseEnvelope;
use crate::error::SyncError;

/// Identifier the provider assigned to an uploaded video. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(try_from = "String", into = "String")]
pub struct RemoteVideoId(String);

impl RemoteVideoId {
    pub fn new(value: impl Into<String>) -> Result<Self, SyncError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(SyncError::Transfer(
                "Remote video id must not be empty".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RemoteVideoId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RemoteVideoId {
    type Error = SyncError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RemoteVideoId> for String {
    fn from(id: RemoteVideoId) -> Self {
        id.0
    }
}

/// Persisted link between a local asset and its copy at the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct VideoMetadata {
    pub id: Uuid,
    /// Owning asset; at most one record exists per asset
    pub asset_id: Uuid,
    pub remote_id: RemoteVideoId,
    pub thumbnail_uri: String,
    pub hls_uri: String,
    pub dash_uri: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoMetadata {
    /// Create a record from a verified upload response
    ///
    /// Fails with `SyncError::Transfer` when the envelope is not successful or
    /// does not carry `result.uid`.
    pub fn from_envelope(asset_id: Uuid, envelope: &ResponseEnvelope) -> Result<Self, SyncError> {
        let uid = match (envelope.is_success(), envelope.uid()) {
            (true, Some(uid)) => uid,
            _ => {
                return Err(SyncError::Transfer(format!(
                    "The video UID was not set in the provider response. Errors: {}",
                    envelope.error_information()
                )))
            }
        };

        let now = Utc::now();
        let playback = PlaybackUris::from_result(&envelope.result);
        Ok(Self {
            id: Uuid::new_v4(),
            asset_id,
            remote_id: RemoteVideoId::new(uid)?,
            thumbnail_uri: playback.thumbnail,
            hls_uri: playback.hls,
            dash_uri: playback.dash,
            created_at: now,
            updated_at: now,
        })
    }

    /// Overwrite the cached remote state with a successful refresh response
    pub fn apply_envelope(&mut self, envelope: &ResponseEnvelope) {
        if let Some(uid) = envelope.uid() {
            if let Ok(remote_id) = RemoteVideoId::new(uid) {
                self.remote_id = remote_id;
            }
        }

        let playback = PlaybackUris::from_result(&envelope.result);
        self.thumbnail_uri = playback.thumbnail;
        self.hls_uri = playback.hls;
        self.dash_uri = playback.dash;
        self.updated_at = Utc::now();
    }
}

/// Playback URIs found in a provider video record; empty when omitted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PlaybackUris {
    thumbnail: String,
    hls: String,
    dash: String,
}

impl PlaybackUris {
    fn from_result(result: &JsonValue) -> Self {
        let text = |value: Option<&JsonValue>| {
            value
                .and_then(JsonValue::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Self {
            thumbnail: text(result.get("thumbnail")),
            hls: text(result.pointer("/playback/hls")),
            dash: text(result.pointer("/playback/dash")),
        }
    }
}
