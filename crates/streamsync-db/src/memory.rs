use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use streamsync_core::models::{RemoteVideoId, VideoMetadata};
use streamsync_core::{SyncError, SyncResult};
use uuid::Uuid;

use crate::traits::MetadataRepository;

/// In-process metadata repository keyed by record id
#[derive(Clone, Default)]
pub struct InMemoryMetadataRepository {
    records: Arc<Mutex<HashMap<Uuid, VideoMetadata>>>,
    flushes: Arc<AtomicUsize>,
}

impl InMemoryMetadataRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `persist_all` was called
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.records().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn records(&self) -> SyncResult<MutexGuard<'_, HashMap<Uuid, VideoMetadata>>> {
        self.records
            .lock()
            .map_err(|_| SyncError::Internal("metadata store lock poisoned".to_string()))
    }
}

#[async_trait]
impl MetadataRepository for InMemoryMetadataRepository {
    async fn find_by_asset(&self, asset_id: Uuid) -> SyncResult<Option<VideoMetadata>> {
        Ok(self
            .records()?
            .values()
            .find(|record| record.asset_id == asset_id)
            .cloned())
    }

    async fn find_by_remote_id(
        &self,
        remote_id: &RemoteVideoId,
    ) -> SyncResult<Option<VideoMetadata>> {
        Ok(self
            .records()?
            .values()
            .find(|record| &record.remote_id == remote_id)
            .cloned())
    }

    async fn find_all(&self) -> SyncResult<Vec<VideoMetadata>> {
        let mut records: Vec<VideoMetadata> = self.records()?.values().cloned().collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }

    async fn add(&self, metadata: &VideoMetadata) -> SyncResult<()> {
        let mut records = self.records()?;
        if records
            .values()
            .any(|record| record.asset_id == metadata.asset_id)
        {
            return Err(SyncError::InvalidInput(format!(
                "Asset {} already has video metadata",
                metadata.asset_id
            )));
        }
        records.insert(metadata.id, metadata.clone());
        Ok(())
    }

    async fn update(&self, metadata: &VideoMetadata) -> SyncResult<()> {
        let mut records = self.records()?;
        match records.get_mut(&metadata.id) {
            Some(record) => {
                *record = metadata.clone();
                Ok(())
            }
            None => Err(SyncError::InvalidInput(format!(
                "Video metadata {} does not exist",
                metadata.id
            ))),
        }
    }

    async fn remove(&self, metadata: &VideoMetadata) -> SyncResult<()> {
        self.records()?.remove(&metadata.id);
        Ok(())
    }

    async fn persist_all(&self) -> SyncResult<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
