//! Data models for the application
//!
//! Each sub-module represents one piece of the sync domain: the host asset,
//! the provider's response envelope, the persisted metadata record and the
//! remote video listing.

mod asset;
pub mod envelope;
mod remote_video;
mod video_metadata;

// Re-export all models for convenient imports
pub use asset::*;
pub use envelope::{EnvelopeOrigin, ProviderError, ResponseEnvelope};
pub use remote_video::*;
pub use video_metadata::*;
