use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres};
use std::time::Duration;
use streamsync_core::models::{RemoteVideoId, VideoMetadata};
use streamsync_core::{SyncError, SyncResult};
use uuid::Uuid;

use crate::traits::MetadataRepository;

const CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Open a connection pool for the metadata database
pub async fn connect(database_url: &str, max_connections: u32) -> SyncResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(CONNECTION_TIMEOUT_SECS))
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Apply the SQL migrations shipped in `migrations/`
pub async fn run_migrations(pool: &PgPool) -> SyncResult<()> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| SyncError::Database(e.into()))?;

    tracing::info!("Video metadata migrations applied");
    Ok(())
}

/// Repository for video metadata records
#[derive(Clone)]
pub struct PostgresMetadataRepository {
    pool: PgPool,
}

impl PostgresMetadataRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetadataRepository for PostgresMetadataRepository {
    #[tracing::instrument(skip(self), fields(db.table = "video_metadata", db.operation = "select"))]
    async fn find_by_asset(&self, asset_id: Uuid) -> SyncResult<Option<VideoMetadata>> {
        let metadata = sqlx::query_as::<Postgres, VideoMetadata>(
            r#"
            SELECT id, asset_id, remote_id, thumbnail_uri, hls_uri, dash_uri, created_at, updated_at
            FROM video_metadata
            WHERE asset_id = $1
            "#,
        )
        .bind(asset_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(metadata)
    }

    #[tracing::instrument(skip(self), fields(db.table = "video_metadata", db.operation = "select", remote_id = %remote_id))]
    async fn find_by_remote_id(
        &self,
        remote_id: &RemoteVideoId,
    ) -> SyncResult<Option<VideoMetadata>> {
        let metadata = sqlx::query_as::<Postgres, VideoMetadata>(
            r#"
            SELECT id, asset_id, remote_id, thumbnail_uri, hls_uri, dash_uri, created_at, updated_at
            FROM video_metadata
            WHERE remote_id = $1
            LIMIT 1
            "#,
        )
        .bind(remote_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(metadata)
    }

    #[tracing::instrument(skip(self), fields(db.table = "video_metadata", db.operation = "select"))]
    async fn find_all(&self) -> SyncResult<Vec<VideoMetadata>> {
        let records = sqlx::query_as::<Postgres, VideoMetadata>(
            r#"
            SELECT id, asset_id, remote_id, thumbnail_uri, hls_uri, dash_uri, created_at, updated_at
            FROM video_metadata
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    #[tracing::instrument(skip(self, metadata), fields(db.table = "video_metadata", db.operation = "insert", db.record_id = %metadata.id))]
    async fn add(&self, metadata: &VideoMetadata) -> SyncResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO video_metadata (
                id, asset_id, remote_id, thumbnail_uri, hls_uri, dash_uri, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(metadata.id)
        .bind(metadata.asset_id)
        .bind(metadata.remote_id.as_str())
        .bind(&metadata.thumbnail_uri)
        .bind(&metadata.hls_uri)
        .bind(&metadata.dash_uri)
        .bind(metadata.created_at)
        .bind(metadata.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(SyncError::InvalidInput(format!(
                    "Asset {} already has video metadata",
                    metadata.asset_id
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(skip(self, metadata), fields(db.table = "video_metadata", db.operation = "update", db.record_id = %metadata.id))]
    async fn update(&self, metadata: &VideoMetadata) -> SyncResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE video_metadata
            SET remote_id = $2, thumbnail_uri = $3, hls_uri = $4, dash_uri = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(metadata.id)
        .bind(metadata.remote_id.as_str())
        .bind(&metadata.thumbnail_uri)
        .bind(&metadata.hls_uri)
        .bind(&metadata.dash_uri)
        .bind(metadata.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(SyncError::InvalidInput(format!(
                "Video metadata {} does not exist",
                metadata.id
            )));
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, metadata), fields(db.table = "video_metadata", db.operation = "delete", db.record_id = %metadata.id))]
    async fn remove(&self, metadata: &VideoMetadata) -> SyncResult<()> {
        sqlx::query("DELETE FROM video_metadata WHERE id = $1")
            .bind(metadata.id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn persist_all(&self) -> SyncResult<()> {
        // Statements run outside explicit transactions and are already committed.
        tracing::debug!("persist_all: video metadata writes are committed per statement");
        Ok(())
    }
}
