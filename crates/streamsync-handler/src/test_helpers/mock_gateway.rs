//! Provider double for testing without network access

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use streamsync_client::VideoGateway;
use streamsync_core::models::{Asset, RemoteVideoId, ResponseEnvelope};
use streamsync_core::{SyncError, SyncResult};

#[derive(Default)]
struct MockState {
    videos: HashMap<String, JsonValue>,
    next_uid: usize,
    uploads: usize,
    gets: usize,
    deletes: usize,
}

/// In-memory provider that records every call
#[derive(Clone)]
pub struct MockVideoGateway {
    ready: bool,
    fail_uploads: bool,
    fail_deletes: bool,
    state: Arc<Mutex<MockState>>,
}

impl MockVideoGateway {
    pub fn new() -> Self {
        Self {
            ready: true,
            fail_uploads: false,
            fail_deletes: false,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Gateway without credentials
    pub fn not_ready() -> Self {
        Self {
            ready: false,
            ..Self::new()
        }
    }

    /// Every upload fails with a transfer error
    pub fn failing_uploads() -> Self {
        Self {
            fail_uploads: true,
            ..Self::new()
        }
    }

    /// Every delete answers with an unsuccessful envelope
    pub fn failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Self::new()
        }
    }

    /// Drop a video on the provider side without telling the handler
    pub fn forget(&self, uid: &str) {
        self.state.lock().unwrap().videos.remove(uid);
    }

    /// Change the playback URL the provider reports for a video
    pub fn set_hls(&self, uid: &str, hls: &str) {
        if let Some(video) = self.state.lock().unwrap().videos.get_mut(uid) {
            video["playback"]["hls"] = json!(hls);
        }
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.state.lock().unwrap().videos.contains_key(uid)
    }

    pub fn remote_count(&self) -> usize {
        self.state.lock().unwrap().videos.len()
    }

    pub fn upload_count(&self) -> usize {
        self.state.lock().unwrap().uploads
    }

    pub fn get_count(&self) -> usize {
        self.state.lock().unwrap().gets
    }

    pub fn delete_count(&self) -> usize {
        self.state.lock().unwrap().deletes
    }

    fn success(result: JsonValue) -> ResponseEnvelope {
        let body = json!({"success": true, "errors": [], "messages": [], "result": result});
        ResponseEnvelope::parse(200, body.to_string().as_bytes())
    }

    fn not_found() -> ResponseEnvelope {
        let body = json!({
            "success": false,
            "errors": [{"code": 10003, "message": "Not Found"}],
            "messages": [],
            "result": null
        });
        ResponseEnvelope::parse(404, body.to_string().as_bytes()).reject_not_found()
    }
}

#[async_trait]
impl VideoGateway for MockVideoGateway {
    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn upload(&self, asset: &Asset) -> SyncResult<ResponseEnvelope> {
        let mut state = self.state.lock().unwrap();
        state.uploads += 1;

        if self.fail_uploads {
            return Err(SyncError::Transfer(format!(
                "simulated upload failure for {}",
                asset.filename
            )));
        }

        state.next_uid += 1;
        let uid = format!("vid-{}", state.next_uid);
        let video = json!({
            "uid": uid,
            "thumbnail": format!("https://videodelivery.test/{}/thumbnail.jpg", uid),
            "playback": {
                "hls": format!("https://videodelivery.test/{}/manifest/video.m3u8", uid),
                "dash": format!("https://videodelivery.test/{}/manifest/video.mpd", uid)
            },
            "meta": {"name": asset.filename}
        });
        state.videos.insert(uid, video.clone());

        Ok(Self::success(video))
    }

    async fn get(&self, id: &RemoteVideoId) -> SyncResult<ResponseEnvelope> {
        let mut state = self.state.lock().unwrap();
        state.gets += 1;

        Ok(match state.videos.get(id.as_str()) {
            Some(video) => Self::success(video.clone()),
            None => Self::not_found(),
        })
    }

    async fn delete(&self, id: &RemoteVideoId) -> SyncResult<ResponseEnvelope> {
        let mut state = self.state.lock().unwrap();
        state.deletes += 1;

        if self.fail_deletes {
            return Ok(Self::not_found());
        }

        Ok(match state.videos.remove(id.as_str()) {
            Some(_) => ResponseEnvelope::parse(200, b""),
            None => Self::not_found(),
        })
    }

    async fn list(&self) -> SyncResult<ResponseEnvelope> {
        let state = self.state.lock().unwrap();
        let videos: Vec<JsonValue> = state.videos.values().cloned().collect();
        Ok(Self::success(JsonValue::Array(videos)))
    }
}
