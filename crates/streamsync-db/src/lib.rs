//! Metadata persistence for streamsync
//!
//! `MetadataRepository` is the interface the sync core uses to read and write
//! `VideoMetadata` records. `PostgresMetadataRepository` backs it with sqlx;
//! `InMemoryMetadataRepository` keeps records in process for embedding and tests.

mod memory;
mod postgres;
mod traits;

pub use memory::InMemoryMetadataRepository;
pub use postgres::{connect, run_migrations, PostgresMetadataRepository};
pub use traits::MetadataRepository;
