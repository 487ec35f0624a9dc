//! Asset synchronization for streamsync
//!
//! `AssetHandler` reacts to host lifecycle events and reconciles each video
//! asset with its remote copy. `LocalAssetLibrary` enumerates video files in a
//! directory for batch uploads.

pub mod handler;
pub mod library;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use handler::{AssetHandler, BatchEvent, SyncOutcome};
pub use library::LocalAssetLibrary;
