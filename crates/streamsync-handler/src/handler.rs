//! Asset sync state machine
//!
//! An asset is either untracked (no metadata record) or tracked by exactly one
//! `VideoMetadata` record. Records change only after the remote result is
//! known, except when a failed refresh probe shows the remote copy is gone: the
//! stale record is removed before the asset is uploaded again. A server error
//! on the refresh lookup proves nothing about the remote copy and leaves the
//! record as it was.

use async_trait::async_trait;
use std::sync::Arc;
use streamsync_client::VideoGateway;
use streamsync_core::hooks::AssetLifecycle;
use streamsync_core::models::{Asset, VideoMetadata};
use streamsync_core::{SyncError, SyncResult};
use streamsync_db::MetadataRepository;

/// What `upload_if_necessary` did with an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Not a video, or the gateway has no credentials
    Skipped,
    /// Remote copy exists; cached playback URIs were refreshed
    Refreshed,
    /// The video was uploaded and a new record stored
    Uploaded,
}

impl SyncOutcome {
    pub fn was_uploaded(&self) -> bool {
        matches!(self, SyncOutcome::Uploaded)
    }
}

/// Progress of a batch upload, reported around each asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchEvent<'a> {
    Started(&'a Asset),
    Finished(&'a Asset, SyncOutcome),
}

pub struct AssetHandler {
    gateway: Arc<dyn VideoGateway>,
    repository: Arc<dyn MetadataRepository>,
}

impl AssetHandler {
    pub fn new(gateway: Arc<dyn VideoGateway>, repository: Arc<dyn MetadataRepository>) -> Self {
        Self {
            gateway,
            repository,
        }
    }

    fn should_process(&self, asset: &Asset) -> bool {
        if !asset.is_video() {
            return false;
        }

        if !self.gateway.is_ready() {
            tracing::warn!(
                asset_id = %asset.id,
                "Video streaming is installed, but no credentials are configured. Processing is skipped"
            );
            return false;
        }

        true
    }

    /// Make sure the asset has a live remote copy and an up-to-date record
    #[tracing::instrument(skip(self, asset), fields(asset_id = %asset.id))]
    pub async fn upload_if_necessary(&self, asset: &Asset) -> SyncResult<SyncOutcome> {
        if !self.should_process(asset) {
            return Ok(SyncOutcome::Skipped);
        }

        if let Some(mut metadata) = self.repository.find_by_asset(asset.id).await? {
            let envelope = self.gateway.get(&metadata.remote_id).await?;
            if envelope.is_success() {
                if envelope.uid().is_none() {
                    return Err(SyncError::Transfer(format!(
                        "Refresh of video {} returned no video record. {}",
                        metadata.remote_id,
                        envelope.error_information()
                    )));
                }
                metadata.apply_envelope(&envelope);
                self.repository.update(&metadata).await?;
                tracing::debug!(
                    remote_id = %metadata.remote_id,
                    "Remote video exists, playback metadata refreshed"
                );
                return Ok(SyncOutcome::Refreshed);
            }

            if envelope.is_server_error() {
                return Err(SyncError::Transfer(format!(
                    "Could not check video {}. {}",
                    metadata.remote_id,
                    envelope.error_information()
                )));
            }

            tracing::info!(
                remote_id = %metadata.remote_id,
                error_information = %envelope.error_information(),
                "Remote video is gone, uploading again"
            );
            self.repository.remove(&metadata).await?;
        }

        self.upload(asset).await
    }

    async fn upload(&self, asset: &Asset) -> SyncResult<SyncOutcome> {
        let created = match self.gateway.upload(asset).await {
            Ok(envelope) => VideoMetadata::from_envelope(asset.id, &envelope),
            Err(e) => Err(e),
        };

        let metadata = match created {
            Ok(metadata) => metadata,
            Err(e) => {
                // Keep whatever was already written before reporting the failure
                if let Err(flush_err) = self.repository.persist_all().await {
                    tracing::error!(error = %flush_err, "Failed to flush metadata after upload failure");
                }
                return Err(e);
            }
        };

        self.repository.add(&metadata).await?;
        tracing::info!(
            remote_id = %metadata.remote_id,
            title = %asset.display_name(),
            "Video metadata stored"
        );

        Ok(SyncOutcome::Uploaded)
    }

    /// Delete the remote copy and drop the record
    ///
    /// A failed remote delete is logged; the record is removed regardless.
    #[tracing::instrument(skip(self, asset), fields(asset_id = %asset.id))]
    pub async fn remove_remote(&self, asset: &Asset) -> SyncResult<()> {
        if !self.should_process(asset) {
            return Ok(());
        }

        let Some(metadata) = self.repository.find_by_asset(asset.id).await? else {
            return Ok(());
        };

        let envelope = self.gateway.delete(&metadata.remote_id).await?;
        if !envelope.is_success() {
            tracing::warn!(
                title = %asset.display_name(),
                remote_id = %metadata.remote_id,
                error_information = %envelope.error_information(),
                "Video could not be deleted from the streaming provider"
            );
        }

        self.repository.remove(&metadata).await
    }

    /// Cached playback record for rendering, without contacting the provider
    pub async fn metadata_for(&self, asset: &Asset) -> SyncResult<Option<VideoMetadata>> {
        if !asset.is_video() {
            return Ok(None);
        }
        self.repository.find_by_asset(asset.id).await
    }

    /// Sync each asset in order, stopping at the first error
    ///
    /// `on_progress` sees `Started` before each asset is synced, so the asset
    /// that failed has always been announced. Returns the number of assets that
    /// were uploaded.
    pub async fn upload_all<F>(&self, assets: &[Asset], mut on_progress: F) -> SyncResult<usize>
    where
        F: FnMut(BatchEvent<'_>),
    {
        let mut uploaded = 0;
        for asset in assets {
            on_progress(BatchEvent::Started(asset));
            let outcome = self.upload_if_necessary(asset).await?;
            if outcome.was_uploaded() {
                uploaded += 1;
            }
            on_progress(BatchEvent::Finished(asset, outcome));
        }

        tracing::info!(total = assets.len(), uploaded = uploaded, "Batch upload finished");
        Ok(uploaded)
    }
}

#[async_trait]
impl AssetLifecycle for AssetHandler {
    async fn asset_created(&self, asset: &Asset) -> SyncResult<()> {
        self.upload_if_necessary(asset).await.map(|_| ())
    }

    async fn asset_removed(&self, asset: &Asset) -> SyncResult<()> {
        self.remove_remote(asset).await
    }

    async fn asset_updated(&self, asset: &Asset) -> SyncResult<()> {
        self.upload_if_necessary(asset).await.map(|_| ())
    }

    async fn asset_resource_replaced(&self, asset: &Asset) -> SyncResult<()> {
        self.remove_remote(asset).await?;
        self.upload_if_necessary(asset).await.map(|_| ())
    }
}
