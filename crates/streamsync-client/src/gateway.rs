//! Remote video operations
//!
//! Every remote call first checks that credentials are configured, so a
//! misconfigured install fails with `SyncError::Configuration` before any
//! network access.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use streamsync_core::models::{Asset, RemoteVideoId, ResponseEnvelope};
use streamsync_core::{StreamConfig, SyncError, SyncResult, UploadProtocol};

use crate::transport::{RequestBody, TransportClient};
use crate::tus::{ChunkedUploader, UploadConfig};

/// Operations the sync handler needs from the streaming provider
///
/// Remote failures are reported in the returned envelope. `Err` is reserved for
/// configuration, transport, transfer and I/O faults.
#[async_trait]
pub trait VideoGateway: Send + Sync {
    /// Credentials are configured; remote calls would otherwise fail
    fn is_ready(&self) -> bool;

    async fn upload(&self, asset: &Asset) -> SyncResult<ResponseEnvelope>;

    async fn get(&self, id: &RemoteVideoId) -> SyncResult<ResponseEnvelope>;

    async fn delete(&self, id: &RemoteVideoId) -> SyncResult<ResponseEnvelope>;

    async fn list(&self) -> SyncResult<ResponseEnvelope>;
}

/// `VideoGateway` backed by the provider's stream REST API
#[derive(Debug, Clone)]
pub struct StreamGateway {
    transport: TransportClient,
    uploader: ChunkedUploader,
    protocol: UploadProtocol,
}

impl StreamGateway {
    pub fn new(config: &StreamConfig) -> SyncResult<Self> {
        let transport = TransportClient::new(config)?;
        Ok(Self::with_transport(
            transport,
            UploadConfig::from_stream_config(config),
            config.upload_protocol,
        ))
    }

    pub fn with_transport(
        transport: TransportClient,
        upload_config: UploadConfig,
        protocol: UploadProtocol,
    ) -> Self {
        let uploader = ChunkedUploader::new(transport.clone(), upload_config);
        Self {
            transport,
            uploader,
            protocol,
        }
    }

    pub fn protocol(&self) -> UploadProtocol {
        self.protocol
    }

    async fn upload_multipart(&self, asset: &Asset) -> SyncResult<ResponseEnvelope> {
        let file = tokio::fs::File::open(&asset.path).await?;
        let length = file.metadata().await?.len();

        let part = Part::stream_with_length(Body::from(file), length)
            .file_name(asset.filename.clone())
            .mime_str(&asset.content_type)
            .map_err(|e| {
                SyncError::InvalidInput(format!(
                    "Invalid content type {}: {}",
                    asset.content_type, e
                ))
            })?;
        let form = Form::new().part("file", part);

        let response = self
            .transport
            .post(
                &self.transport.stream_url(""),
                HeaderMap::new(),
                RequestBody::Multipart(form),
            )
            .await?;

        Ok(response.envelope())
    }
}

#[async_trait]
impl VideoGateway for StreamGateway {
    fn is_ready(&self) -> bool {
        self.transport.is_ready()
    }

    async fn upload(&self, asset: &Asset) -> SyncResult<ResponseEnvelope> {
        self.transport.ensure_ready()?;

        tracing::debug!(
            asset_id = %asset.id,
            filename = %asset.filename,
            protocol = %self.protocol,
            file_size = asset.file_size,
            "Uploading video to streaming provider"
        );

        let result = match self.protocol {
            UploadProtocol::Tus => self.uploader.upload(&asset.path, &asset.filename).await,
            UploadProtocol::Multipart => self.upload_multipart(asset).await,
        };

        match &result {
            Ok(envelope) => match (envelope.is_success(), envelope.uid()) {
                (true, Some(uid)) => tracing::info!(
                    filename = %asset.filename,
                    remote_id = %uid,
                    "Video uploaded to streaming provider"
                ),
                _ => tracing::error!(
                    filename = %asset.filename,
                    error_information = %envelope.error_information(),
                    "Video upload to streaming provider failed"
                ),
            },
            Err(e) => tracing::error!(
                filename = %asset.filename,
                error = %e,
                "Video upload to streaming provider failed"
            ),
        }

        result
    }

    async fn get(&self, id: &RemoteVideoId) -> SyncResult<ResponseEnvelope> {
        self.transport.ensure_ready()?;
        let response = self
            .transport
            .get(&self.transport.stream_url(id.as_str()))
            .await?;
        Ok(response.envelope().reject_not_found().reject_error_status())
    }

    async fn delete(&self, id: &RemoteVideoId) -> SyncResult<ResponseEnvelope> {
        self.transport.ensure_ready()?;
        let response = self
            .transport
            .delete(&self.transport.stream_url(id.as_str()))
            .await?;
        Ok(response.envelope().reject_not_found().reject_error_status())
    }

    async fn list(&self) -> SyncResult<ResponseEnvelope> {
        self.transport.ensure_ready()?;
        let response = self.transport.get(&self.transport.stream_url("")).await?;
        Ok(response.envelope().reject_error_status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use std::io::Write;
    use std::path::PathBuf;
    use streamsync_core::models::RemoteVideo;
    use tempfile::NamedTempFile;
    use uuid::Uuid;

    fn config(server: &ServerGuard, token: &str) -> StreamConfig {
        StreamConfig {
            api_token: token.to_string(),
            account_id: "acct".to_string(),
            api_endpoint: server.url(),
            ..StreamConfig::default()
        }
    }

    fn asset(path: PathBuf, size: u64) -> Asset {
        Asset {
            id: Uuid::new_v4(),
            title: "Clip".to_string(),
            filename: "clip.mp4".to_string(),
            content_type: "video/mp4".to_string(),
            file_size: size,
            path,
        }
    }

    fn id(value: &str) -> RemoteVideoId {
        RemoteVideoId::new(value).unwrap()
    }

    const BAD_GATEWAY_PAGE: &str =
        "<html><head><title>502 Bad Gateway</title></head><body>502 Bad Gateway</body></html>";

    #[tokio::test]
    async fn empty_token_fails_before_network_access() {
        let mut server = Server::new_async().await;
        let any_get = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let any_delete = server
            .mock("DELETE", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let any_post = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let gateway = StreamGateway::new(&config(&server, "")).unwrap();
        assert!(!gateway.is_ready());

        let err = gateway.get(&id("abc")).await.unwrap_err();
        assert!(err.is_configuration());
        let err = gateway.delete(&id("abc")).await.unwrap_err();
        assert!(err.is_configuration());
        let err = gateway.list().await.unwrap_err();
        assert!(err.is_configuration());
        let err = gateway
            .upload(&asset(PathBuf::from("/nonexistent.mp4"), 0))
            .await
            .unwrap_err();
        assert!(err.is_configuration());

        any_get.assert_async().await;
        any_delete.assert_async().await;
        any_post.assert_async().await;
    }

    #[tokio::test]
    async fn html_error_page_on_get_is_unsuccessful() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/accounts/acct/stream/vid-1")
            .with_status(502)
            .with_header("content-type", "text/html")
            .with_body(BAD_GATEWAY_PAGE)
            .create_async()
            .await;

        let gateway = StreamGateway::new(&config(&server, "token")).unwrap();
        let envelope = gateway.get(&id("vid-1")).await.unwrap();

        assert!(!envelope.is_success());
        assert!(envelope.is_server_error());
        assert_eq!(envelope.uid(), None);
        assert_eq!(envelope.http_status, 502);
    }

    #[tokio::test]
    async fn html_error_page_on_delete_is_unsuccessful() {
        let mut server = Server::new_async().await;
        server
            .mock("DELETE", "/accounts/acct/stream/vid-1")
            .with_status(500)
            .with_body(BAD_GATEWAY_PAGE)
            .create_async()
            .await;

        let gateway = StreamGateway::new(&config(&server, "token")).unwrap();
        let envelope = gateway.delete(&id("vid-1")).await.unwrap();

        assert!(!envelope.is_success());
        assert!(envelope.error_information().starts_with("StatusCode: 500."));
    }

    #[tokio::test]
    async fn html_error_page_on_list_is_unsuccessful() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/accounts/acct/stream")
            .with_status(503)
            .with_body(BAD_GATEWAY_PAGE)
            .create_async()
            .await;

        let gateway = StreamGateway::new(&config(&server, "token")).unwrap();
        let envelope = gateway.list().await.unwrap();

        assert!(!envelope.is_success());
        assert!(RemoteVideo::list_from(&envelope).is_empty());
    }

    #[tokio::test]
    async fn get_returns_video_record() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/accounts/acct/stream/vid-1")
            .with_status(200)
            .with_body(
                r#"{"success":true,"errors":[],"messages":[],"result":{"uid":"vid-1","thumbnail":"https://t","playback":{"hls":"https://h","dash":"https://d"}}}"#,
            )
            .create_async()
            .await;

        let gateway = StreamGateway::new(&config(&server, "token")).unwrap();
        let envelope = gateway.get(&id("vid-1")).await.unwrap();

        assert!(envelope.is_success());
        assert_eq!(envelope.uid(), Some("vid-1"));
    }

    #[tokio::test]
    async fn get_missing_video_is_unsuccessful() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/accounts/acct/stream/gone")
            .with_status(404)
            .create_async()
            .await;

        let gateway = StreamGateway::new(&config(&server, "token")).unwrap();
        let envelope = gateway.get(&id("gone")).await.unwrap();

        assert!(!envelope.is_success());
        assert_eq!(envelope.http_status, 404);
    }

    #[tokio::test]
    async fn delete_missing_video_is_unsuccessful() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/accounts/acct/stream/missing-id")
            .match_header("authorization", "Bearer token")
            .with_status(404)
            .with_body(r#"{"success":false,"errors":[{"code":10003,"message":"Not Found"}],"messages":[],"result":null}"#)
            .create_async()
            .await;

        let gateway = StreamGateway::new(&config(&server, "token")).unwrap();
        let envelope = gateway.delete(&id("missing-id")).await.unwrap();

        assert!(!envelope.is_success());
        assert!(envelope.error_information().contains("Not Found [Code: 10003]"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn delete_with_empty_body_succeeds() {
        let mut server = Server::new_async().await;
        server
            .mock("DELETE", "/accounts/acct/stream/vid-1")
            .with_status(200)
            .create_async()
            .await;

        let gateway = StreamGateway::new(&config(&server, "token")).unwrap();
        let envelope = gateway.delete(&id("vid-1")).await.unwrap();
        assert!(envelope.is_success());
        assert!(envelope.is_headers_only());
    }

    #[tokio::test]
    async fn list_returns_all_videos() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/accounts/acct/stream")
            .with_status(200)
            .with_body(
                r#"{"success":true,"errors":[],"messages":[],"result":[{"uid":"a","readyToStream":true,"size":1048576,"duration":60},{"uid":"b","readyToStream":false}]}"#,
            )
            .create_async()
            .await;

        let gateway = StreamGateway::new(&config(&server, "token")).unwrap();
        let envelope = gateway.list().await.unwrap();
        let videos = RemoteVideo::list_from(&envelope);

        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].uid, "a");
        assert!(videos[0].ready_to_stream);
    }

    #[tokio::test]
    async fn multipart_upload_posts_file_part() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/accounts/acct/stream")
            .match_header(
                "content-type",
                Matcher::Regex("multipart/form-data".to_string()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="file"; filename="clip.mp4""#.to_string()),
                Matcher::Regex("not really a video".to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"success":true,"errors":[],"messages":[],"result":{"uid":"vid-mp"}}"#)
            .create_async()
            .await;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"not really a video").unwrap();
        file.flush().unwrap();

        let mut config = config(&server, "token");
        config.upload_protocol = UploadProtocol::Multipart;
        let gateway = StreamGateway::new(&config).unwrap();

        let envelope = gateway
            .upload(&asset(file.path().to_path_buf(), 18))
            .await
            .unwrap();

        assert!(envelope.is_success());
        assert_eq!(envelope.uid(), Some("vid-mp"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn tus_upload_is_the_default() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/accounts/acct/stream")
            .match_header("tus-resumable", "1.0.0")
            .with_status(201)
            .with_header("location", "/tus/s1")
            .create_async()
            .await;
        server
            .mock("PATCH", "/tus/s1")
            .with_status(204)
            .with_header("upload-offset", "4")
            .create_async()
            .await;
        server
            .mock("HEAD", "/tus/s1")
            .with_status(200)
            .with_header("stream-media-id", "vid-tus")
            .create_async()
            .await;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"data").unwrap();

        let gateway = StreamGateway::new(&config(&server, "token")).unwrap();
        assert_eq!(gateway.protocol(), UploadProtocol::Tus);

        let envelope = gateway
            .upload(&asset(file.path().to_path_buf(), 4))
            .await
            .unwrap();
        assert_eq!(envelope.uid(), Some("vid-tus"));
    }
}
