//! Shared test fixtures
//!
//! - `ScriptedBackend`: in-process backend whose answers are released by the
//!   test through oneshot gates, so settlement order is fully controlled
//! - `spawn_mock_server`: runs an axum router on an ephemeral local port

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use axum::Router;
use imd_common::models::{AudioRecommendations, MetadataRecommendations};
use imd_common::{AudioFeatures, RecommendedSong, SongInfo};
use imd_ui::api::{ApiError, AudioUpload, RecommendationBackend};
use tokio::sync::oneshot;

pub type NameReply = Result<MetadataRecommendations, ApiError>;
pub type AudioReply = Result<AudioRecommendations, ApiError>;

/// Backend that answers only when the test says so
#[derive(Default)]
pub struct ScriptedBackend {
    name_gates: Mutex<HashMap<String, oneshot::Receiver<NameReply>>>,
    audio_gates: Mutex<HashMap<String, oneshot::Receiver<AudioReply>>>,
    library_replies: Mutex<VecDeque<Result<Vec<SongInfo>, ApiError>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending answer for a name query; send on the returned
    /// sender to settle it
    pub fn gate_name(&self, query: &str) -> oneshot::Sender<NameReply> {
        let (tx, rx) = oneshot::channel();
        self.name_gates.lock().unwrap().insert(query.to_string(), rx);
        tx
    }

    /// Register a pending answer for an audio query, keyed by file name
    pub fn gate_audio(&self, file_name: &str) -> oneshot::Sender<AudioReply> {
        let (tx, rx) = oneshot::channel();
        self.audio_gates
            .lock()
            .unwrap()
            .insert(file_name.to_string(), rx);
        tx
    }

    /// Queue the answer for the next `list_songs` call
    pub fn push_library(&self, reply: Result<Vec<SongInfo>, ApiError>) {
        self.library_replies.lock().unwrap().push_back(reply);
    }

    /// Calls seen so far, e.g. `"name:Blue Monday"`, `"audio:clip.mp3"`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RecommendationBackend for ScriptedBackend {
    async fn list_songs(&self) -> Result<Vec<SongInfo>, ApiError> {
        self.record("songs".to_string());
        self.library_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("no library reply scripted".to_string())))
    }

    async fn search_by_name(&self, song_name: &str) -> NameReply {
        self.record(format!("name:{}", song_name));
        let gate = self
            .name_gates
            .lock()
            .unwrap()
            .remove(song_name)
            .unwrap_or_else(|| panic!("no reply scripted for name query {:?}", song_name));

        gate.await
            .unwrap_or_else(|_| Err(ApiError::Network("gate dropped".to_string())))
    }

    async fn search_by_audio(&self, upload: AudioUpload) -> AudioReply {
        self.record(format!("audio:{}", upload.file_name));
        let gate = self
            .audio_gates
            .lock()
            .unwrap()
            .remove(&upload.file_name)
            .unwrap_or_else(|| panic!("no reply scripted for upload {:?}", upload.file_name));

        gate.await
            .unwrap_or_else(|_| Err(ApiError::Network("gate dropped".to_string())))
    }
}

/// Ranked recommendation with a score
pub fn recommended(rank: u32, track: &str, artist: &str) -> RecommendedSong {
    RecommendedSong {
        rank: Some(rank),
        track_name: track.to_string(),
        artist_name: artist.to_string(),
        similarity_score: Some(1.0 - f64::from(rank) / 100.0),
        genre: None,
    }
}

pub fn name_reply(songs: Vec<RecommendedSong>) -> NameReply {
    Ok(MetadataRecommendations {
        recommendations: songs,
    })
}

pub fn sample_features() -> AudioFeatures {
    AudioFeatures {
        tempo: 120.0,
        spectral_centroid: 2000.0,
        rms_energy: 0.1,
        chroma: [0.25; 12],
        mfccs: vec![],
    }
}

pub fn audio_reply(songs: Vec<RecommendedSong>) -> AudioReply {
    Ok(AudioRecommendations {
        recommendations: songs,
        query_audio_features: sample_features(),
    })
}

/// Backend failure carrying a `detail` message
pub fn backend_error(status: u16, detail: Option<&str>) -> ApiError {
    ApiError::Backend {
        status,
        detail: detail.map(str::to_string),
    }
}

/// Serve `router` on 127.0.0.1 with an OS-assigned port; returns the base URL
pub async fn spawn_mock_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("mock server address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock server");
    });

    format!("http://{}/api/v1", addr)
}

/// Let spawned tasks run up to their next await point
pub async fn settle_tasks() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
