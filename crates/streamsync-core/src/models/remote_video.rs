use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::envelope::ResponseEnvelope;

/// One video as reported by the provider's list endpoint. Reporting only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteVideo {
    pub uid: String,
    pub name: Option<String>,
    pub ready_to_stream: bool,
    /// Size in bytes
    pub size: u64,
    /// Duration in seconds; the provider reports -1 while still processing
    pub duration: Option<f64>,
    pub width: u32,
    pub height: u32,
}

impl RemoteVideo {
    fn from_value(value: &JsonValue) -> Self {
        let as_u32 = |pointer: &str| {
            value
                .pointer(pointer)
                .and_then(JsonValue::as_u64)
                .unwrap_or(0) as u32
        };

        Self {
            uid: value
                .get("uid")
                .and_then(JsonValue::as_str)
                .unwrap_or_default()
                .to_string(),
            name: value
                .pointer("/meta/name")
                .and_then(JsonValue::as_str)
                .map(str::to_string),
            ready_to_stream: value
                .get("readyToStream")
                .and_then(JsonValue::as_bool)
                .unwrap_or(false),
            size: value
                .get("size")
                .and_then(JsonValue::as_f64)
                .map(|size| size.max(0.0) as u64)
                .unwrap_or(0),
            duration: value.get("duration").and_then(JsonValue::as_f64),
            width: as_u32("/input/width"),
            height: as_u32("/input/height"),
        }
    }

    /// Typed records from a list response; empty when `result` is not a list
    pub fn list_from(envelope: &ResponseEnvelope) -> Vec<RemoteVideo> {
        envelope
            .result
            .as_array()
            .map(|videos| videos.iter().map(RemoteVideo::from_value).collect())
            .unwrap_or_default()
    }

    pub fn size_mb(&self) -> f64 {
        self.size as f64 / (1024.0 * 1024.0)
    }

    pub fn dimensions(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Totals shown under the video table
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RemoteVideoTotals {
    pub minutes: f64,
    pub megabytes: f64,
}

impl RemoteVideoTotals {
    pub fn of(videos: &[RemoteVideo]) -> Self {
        let seconds: f64 = videos
            .iter()
            .filter_map(|video| video.duration)
            .filter(|duration| *duration > 0.0)
            .sum();
        let bytes: u64 = videos.iter().map(|video| video.size).sum();

        Self {
            minutes: seconds / 60.0,
            megabytes: bytes as f64 / (1024.0 * 1024.0),
        }
    }
}
