//! Hooks and traits for host integration
//!
//! The host content-management framework owns assets and dispatches their
//! lifecycle events. These traits are the seams between the host and the sync
//! core: the host calls `AssetLifecycle`, the core reads `AssetLibrary`.

use async_trait::async_trait;

use crate::error::SyncResult;
use crate::models::Asset;

/// Asset lifecycle events raised by the host
///
/// The host invokes one event at a time per asset and waits for it to finish.
#[async_trait]
pub trait AssetLifecycle: Send + Sync {
    async fn asset_created(&self, asset: &Asset) -> SyncResult<()>;

    async fn asset_removed(&self, asset: &Asset) -> SyncResult<()>;

    /// Label or description changed; used to verify the remote copy still exists
    async fn asset_updated(&self, asset: &Asset) -> SyncResult<()>;

    /// The asset's file was swapped for a new one
    async fn asset_resource_replaced(&self, asset: &Asset) -> SyncResult<()>;
}

/// Read access to the host's video assets, for batch commands
#[async_trait]
pub trait AssetLibrary: Send + Sync {
    async fn find_all_videos(&self) -> SyncResult<Vec<Asset>>;
}
