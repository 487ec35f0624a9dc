//! Configuration module
//!
//! This module provides the provider credentials, transfer settings and
//! database settings read from the environment.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

// Common constants
pub const DEFAULT_API_ENDPOINT: &str = "https://api.cloudflare.com/client/v4/";
pub const REQUEST_TIMEOUT_SECS: u64 = 300;
/// Chunk size recommended by the provider for resumable uploads (50 MiB)
pub const RECOMMENDED_CHUNK_SIZE: u64 = 52_428_800;
/// Smallest chunk the provider accepts for every chunk but the last (5 MiB)
pub const MIN_CHUNK_SIZE: u64 = 5_242_880;
pub const MAX_STALLED_CHUNK_ATTEMPTS: u32 = 5;
const DB_MAX_CONNECTIONS: u32 = 5;

/// How video bytes are sent to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadProtocol {
    /// Resumable tus upload in bounded chunks
    #[default]
    Tus,
    /// Single multipart POST of the whole file
    Multipart,
}

impl Display for UploadProtocol {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadProtocol::Tus => write!(f, "tus"),
            UploadProtocol::Multipart => write!(f, "multipart"),
        }
    }
}

impl FromStr for UploadProtocol {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tus" => Ok(UploadProtocol::Tus),
            "multipart" => Ok(UploadProtocol::Multipart),
            other => Err(anyhow::anyhow!(
                "STREAM_UPLOAD_PROTOCOL must be 'tus' or 'multipart', got '{}'",
                other
            )),
        }
    }
}

/// Streaming provider configuration
#[derive(Clone, Debug)]
pub struct StreamConfig {
    // Authentication
    pub api_token: String,
    pub account_id: String,
    // Transfer
    pub api_endpoint: String,
    pub proxy_url: Option<String>,
    pub request_timeout_secs: u64,
    pub upload_protocol: UploadProtocol,
    pub chunk_size_bytes: u64,
    pub max_stalled_chunk_attempts: u32,
    // Database
    pub database_url: Option<String>,
    pub db_max_connections: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            account_id: String::new(),
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            proxy_url: None,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            upload_protocol: UploadProtocol::Tus,
            chunk_size_bytes: RECOMMENDED_CHUNK_SIZE,
            max_stalled_chunk_attempts: MAX_STALLED_CHUNK_ATTEMPTS,
            database_url: None,
            db_max_connections: DB_MAX_CONNECTIONS,
        }
    }
}

impl StreamConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let upload_protocol = env::var("STREAM_UPLOAD_PROTOCOL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse::<UploadProtocol>())
            .transpose()?
            .unwrap_or_default();

        let config = StreamConfig {
            api_token: env::var("STREAM_API_TOKEN").unwrap_or_default(),
            account_id: env::var("STREAM_ACCOUNT_ID").unwrap_or_default(),
            api_endpoint: env::var("STREAM_API_ENDPOINT")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string()),
            proxy_url: env::var("STREAM_PROXY_URL").ok().filter(|s| !s.is_empty()),
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            upload_protocol,
            chunk_size_bytes: env::var("STREAM_CHUNK_SIZE_BYTES")
                .unwrap_or_else(|_| RECOMMENDED_CHUNK_SIZE.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("STREAM_CHUNK_SIZE_BYTES must be a valid number"))?,
            max_stalled_chunk_attempts: env::var("STREAM_MAX_STALLED_CHUNK_ATTEMPTS")
                .unwrap_or_else(|_| MAX_STALLED_CHUNK_ATTEMPTS.to_string())
                .parse()
                .map_err(|_| {
                    anyhow::anyhow!("STREAM_MAX_STALLED_CHUNK_ATTEMPTS must be a valid number")
                })?,
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| DB_MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(DB_MAX_CONNECTIONS),
        };

        config.validate()?;
        Ok(config)
    }

    /// Both the token and the account identifier are present
    ///
    /// Missing credentials are not a load error: the plugin stays installed and
    /// skips processing until they are configured.
    pub fn has_credentials(&self) -> bool {
        !self.api_token.trim().is_empty() && !self.account_id.trim().is_empty()
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.chunk_size_bytes < MIN_CHUNK_SIZE {
            return Err(anyhow::anyhow!(
                "STREAM_CHUNK_SIZE_BYTES must be at least {} bytes",
                MIN_CHUNK_SIZE
            ));
        }

        if self.max_stalled_chunk_attempts == 0 {
            return Err(anyhow::anyhow!(
                "STREAM_MAX_STALLED_CHUNK_ATTEMPTS must be greater than zero"
            ));
        }

        if !(self.api_endpoint.starts_with("https://") || self.api_endpoint.starts_with("http://"))
        {
            return Err(anyhow::anyhow!(
                "STREAM_API_ENDPOINT must be an http(s) URL"
            ));
        }

        if let Some(proxy) = &self.proxy_url {
            if !proxy.contains("://") {
                return Err(anyhow::anyhow!(
                    "STREAM_PROXY_URL must include a scheme, e.g. http://proxy:3128"
                ));
            }
        }

        if let Some(url) = &self.database_url {
            if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        Ok(())
    }

    pub fn database_url(&self) -> Result<&str, anyhow::Error> {
        self.database_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set for this command"))
    }
}
