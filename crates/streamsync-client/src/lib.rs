//! HTTP client for the streaming provider.
//!
//! `TransportClient` sends bearer-authenticated requests and hands back raw
//! responses. `ChunkedUploader` drives the tus resumable upload protocol on top
//! of it, and `StreamGateway` exposes the provider's video operations behind the
//! `VideoGateway` trait the sync handler depends on.

pub mod gateway;
pub mod transport;
pub mod tus;

pub use gateway::{StreamGateway, VideoGateway};
pub use transport::{RawResponse, RequestBody, TransportClient};
pub use tus::{ChunkedUploader, UploadConfig, UploadSession};
