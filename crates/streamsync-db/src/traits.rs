//! Metadata repository trait
//!
//! All repository backends must implement this trait so the asset handler can
//! run against any persistence layer.

use async_trait::async_trait;
use streamsync_core::models::{RemoteVideoId, VideoMetadata};
use streamsync_core::SyncResult;
use uuid::Uuid;

#[async_trait]
pub trait MetadataRepository: Send + Sync {
    /// Record owned by the given asset, if any
    async fn find_by_asset(&self, asset_id: Uuid) -> SyncResult<Option<VideoMetadata>>;

    async fn find_by_remote_id(
        &self,
        remote_id: &RemoteVideoId,
    ) -> SyncResult<Option<VideoMetadata>>;

    async fn find_all(&self) -> SyncResult<Vec<VideoMetadata>>;

    /// Insert a new record. An asset owns at most one record.
    async fn add(&self, metadata: &VideoMetadata) -> SyncResult<()>;

    async fn update(&self, metadata: &VideoMetadata) -> SyncResult<()>;

    async fn remove(&self, metadata: &VideoMetadata) -> SyncResult<()>;

    /// Flush pending writes so they survive an error raised afterwards
    async fn persist_all(&self) -> SyncResult<()>;
}
