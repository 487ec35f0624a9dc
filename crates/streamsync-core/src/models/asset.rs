use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// A file owned by the host asset library
///
/// The sync core only ever reads an asset. `path` points at a local copy of
/// the resource bytes that stays readable for the duration of an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Asset {
    pub id: Uuid,
    pub title: String,
    pub filename: String,
    pub content_type: String,
    pub file_size: u64,
    pub path: PathBuf,
}

impl Asset {
    pub fn is_video(&self) -> bool {
        self.content_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("video/")
    }

    /// Title for log output, falling back to the filename
    pub fn display_name(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.filename
        } else {
            &self.title
        }
    }
}
