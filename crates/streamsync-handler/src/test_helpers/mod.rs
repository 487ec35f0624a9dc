//! Test helpers for handler unit tests
//!
//! Provides an in-process provider double and asset fixtures. Metadata is
//! stored with `streamsync_db::InMemoryMetadataRepository`.

pub mod mock_gateway;

pub use mock_gateway::MockVideoGateway;

use std::path::PathBuf;
use streamsync_core::models::Asset;
use uuid::Uuid;

pub fn video_asset(title: &str) -> Asset {
    Asset {
        id: Uuid::new_v4(),
        title: title.to_string(),
        filename: format!("{}.mp4", title.to_lowercase().replace(' ', "-")),
        content_type: "video/mp4".to_string(),
        file_size: 1024,
        path: PathBuf::from("/tmp/streamsync-test.mp4"),
    }
}

pub fn image_asset() -> Asset {
    Asset {
        content_type: "image/png".to_string(),
        filename: "poster.png".to_string(),
        ..video_asset("Poster")
    }
}
