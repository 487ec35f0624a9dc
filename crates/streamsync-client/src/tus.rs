//! tus 1.0.0 resumable upload engine
//!
//! An upload opens a session with `POST`, sends the file in bounded chunks with
//! `PATCH`, and confirms completion with a `HEAD` probe on the session URL. The
//! provider reports the new video id in the `stream-media-id` header of that
//! probe. Sessions live for a single call; nothing is resumed across restarts.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, LOCATION};
use reqwest::Url;
use serde_json::json;
use std::io::SeekFrom;
use std::path::Path;
use std::time::{Duration, Instant};
use streamsync_core::config::{MAX_STALLED_CHUNK_ATTEMPTS, MIN_CHUNK_SIZE, RECOMMENDED_CHUNK_SIZE};
use streamsync_core::models::ResponseEnvelope;
use streamsync_core::{StreamConfig, SyncError, SyncResult};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use uuid::Uuid;

use crate::transport::{RequestBody, TransportClient};

pub const TUS_VERSION: &str = "1.0.0";
const OFFSET_OCTET_STREAM: &str = "application/offset+octet-stream";
const MEDIA_ID_HEADER: &str = "stream-media-id";

const TUS_RESUMABLE: &str = "tus-resumable";
const UPLOAD_LENGTH: &str = "upload-length";
const UPLOAD_METADATA: &str = "upload-metadata";
const UPLOAD_OFFSET: &str = "upload-offset";

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(8);

/// Chunking and stall-retry settings
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub chunk_size: u64,
    /// Consecutive zero-progress chunks tolerated before giving up
    pub max_stalled_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size: RECOMMENDED_CHUNK_SIZE,
            max_stalled_attempts: MAX_STALLED_CHUNK_ATTEMPTS,
            initial_backoff: INITIAL_BACKOFF,
            max_backoff: MAX_BACKOFF,
        }
    }
}

impl UploadConfig {
    pub fn from_stream_config(config: &StreamConfig) -> Self {
        Self {
            chunk_size: config.chunk_size_bytes,
            max_stalled_attempts: config.max_stalled_chunk_attempts,
            ..Self::default()
        }
    }

    /// Configured chunk size, raised to the provider minimum
    pub fn effective_chunk_size(&self) -> u64 {
        self.chunk_size.max(MIN_CHUNK_SIZE)
    }

    /// Delay before retrying after the given number of consecutive stalls
    fn backoff_for(&self, stalls: u32) -> Duration {
        let factor = 2u32.saturating_pow(stalls.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// State of one in-flight upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    /// Correlation key for log lines of this upload
    pub session_key: Uuid,
    pub location: String,
    pub total_size: u64,
    pub offset: u64,
}

impl UploadSession {
    pub fn remaining(&self) -> u64 {
        self.total_size.saturating_sub(self.offset)
    }

    pub fn is_complete(&self) -> bool {
        self.offset >= self.total_size
    }
}

#[derive(Debug, Clone)]
pub struct ChunkedUploader {
    transport: TransportClient,
    config: UploadConfig,
}

impl ChunkedUploader {
    pub fn new(transport: TransportClient, config: UploadConfig) -> Self {
        Self { transport, config }
    }

    /// Upload a local file and return the synthesized finalize envelope
    ///
    /// The envelope is successful only when the `HEAD` probe answered 200.
    pub async fn upload(&self, path: &Path, filename: &str) -> SyncResult<ResponseEnvelope> {
        let mut file = File::open(path).await?;
        let total_size = file.metadata().await?.len();

        let mut session = self.create_session(total_size, filename).await?;
        tracing::info!(
            session_key = %session.session_key,
            location = %session.location,
            total_size = total_size,
            filename = %filename,
            "tus upload session opened"
        );

        let chunk_size = self.config.effective_chunk_size();
        let mut stalls = 0u32;

        while !session.is_complete() {
            let length = chunk_size.min(session.remaining());
            let chunk = read_chunk(&mut file, session.offset, length).await?;

            let started = Instant::now();
            let new_offset = self.send_chunk(&session, chunk).await?;
            let elapsed = started.elapsed();

            if new_offset > session.total_size {
                return Err(SyncError::Transfer(format!(
                    "Provider reported offset {} beyond upload length {}",
                    new_offset, session.total_size
                )));
            }

            if new_offset <= session.offset {
                stalls += 1;
                if stalls >= self.config.max_stalled_attempts {
                    return Err(SyncError::Transfer(format!(
                        "Upload stalled at offset {} of {} after {} attempts",
                        session.offset, session.total_size, stalls
                    )));
                }

                let delay = self.config.backoff_for(stalls);
                tracing::warn!(
                    session_key = %session.session_key,
                    offset = session.offset,
                    attempt = stalls,
                    delay_ms = delay.as_millis() as u64,
                    "tus chunk made no progress, retrying"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            stalls = 0;
            let uploaded = new_offset - session.offset;
            session.offset = new_offset;

            tracing::info!(
                session_key = %session.session_key,
                uploaded_bytes = uploaded,
                offset = session.offset,
                total_size = session.total_size,
                bytes_per_second = throughput(uploaded, elapsed),
                "tus chunk uploaded"
            );
        }

        self.finalize(&session).await
    }

    async fn create_session(&self, total_size: u64, filename: &str) -> SyncResult<UploadSession> {
        let url = self.transport.stream_url("");

        let mut headers = base_headers();
        headers.insert(UPLOAD_LENGTH, HeaderValue::from(total_size));
        let metadata = format!("name {}", STANDARD.encode(filename));
        headers.insert(
            UPLOAD_METADATA,
            HeaderValue::from_str(&metadata)
                .map_err(|e| SyncError::InvalidInput(format!("Invalid upload metadata: {}", e)))?,
        );

        let response = self
            .transport
            .post(&url, headers, RequestBody::Empty)
            .await?;

        if !response.is_success() {
            return Err(SyncError::Transfer(format!(
                "Provider rejected tus session creation. {}",
                response.envelope().error_information()
            )));
        }

        let location = response
            .header(LOCATION.as_str())
            .filter(|location| !location.trim().is_empty())
            .ok_or_else(|| {
                SyncError::Transfer("tus session response has no Location header".to_string())
            })?;

        let location = Url::parse(&url)
            .and_then(|base| base.join(location.trim()))
            .map_err(|e| SyncError::Transfer(format!("Invalid tus session location: {}", e)))?;

        Ok(UploadSession {
            session_key: Uuid::new_v4(),
            location: location.to_string(),
            total_size,
            offset: 0,
        })
    }

    /// Send one chunk; returns the offset the provider acknowledged
    async fn send_chunk(&self, session: &UploadSession, chunk: Vec<u8>) -> SyncResult<u64> {
        let mut headers = base_headers();
        headers.insert(UPLOAD_OFFSET, HeaderValue::from(session.offset));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(OFFSET_OCTET_STREAM));

        let response = self
            .transport
            .patch(&session.location, headers, RequestBody::Bytes(chunk))
            .await?;

        if !response.is_success() {
            return Err(SyncError::Transfer(format!(
                "Provider rejected tus chunk at offset {}. {}",
                session.offset,
                response.envelope().error_information()
            )));
        }

        response
            .header(UPLOAD_OFFSET)
            .and_then(|offset| offset.trim().parse::<u64>().ok())
            .ok_or_else(|| {
                SyncError::Transfer(
                    "tus chunk response has a missing or malformed Upload-Offset header"
                        .to_string(),
                )
            })
    }

    async fn finalize(&self, session: &UploadSession) -> SyncResult<ResponseEnvelope> {
        let response = self
            .transport
            .head(&session.location, base_headers())
            .await?;

        if response.status != 200 {
            tracing::warn!(
                session_key = %session.session_key,
                status = response.status,
                "tus finalize probe did not confirm the upload"
            );
            return Ok(ResponseEnvelope::headers_only(
                response.status,
                false,
                json!({}),
            ));
        }

        let result = match response.header(MEDIA_ID_HEADER) {
            Some(uid) => json!({ "uid": uid }),
            None => json!({}),
        };

        tracing::debug!(session_key = %session.session_key, "tus upload finalized");
        Ok(ResponseEnvelope::headers_only(response.status, true, result))
    }
}

fn base_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(TUS_RESUMABLE, HeaderValue::from_static(TUS_VERSION));
    headers
}

async fn read_chunk(file: &mut File, offset: u64, length: u64) -> SyncResult<Vec<u8>> {
    file.seek(SeekFrom::Start(offset)).await?;
    let mut buffer = vec![0u8; length as usize];
    file.read_exact(&mut buffer).await?;
    Ok(buffer)
}

fn throughput(bytes: u64, elapsed: Duration) -> u64 {
    let seconds = elapsed.as_secs_f64();
    if seconds > 0.0 {
        (bytes as f64 / seconds) as u64
    } else {
        bytes
    }
}
