//! Shared fakes and helpers for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use docqa_rag::{
    server::{router, state::AppState},
    Backend, EmbeddingProvider, Error, LlmProvider, RagConfig, Result,
};
use tempfile::TempDir;

/// Deterministic letter-frequency embedder that counts backend calls
#[derive(Default)]
pub struct FakeEmbedder {
    pub batch_calls: AtomicUsize,
    pub query_calls: AtomicUsize,
    /// Reject every request, as an unreachable backend would
    pub fail: AtomicBool,
    /// Delay inside `embed_batch` to widen race windows
    pub delay: Option<Duration>,
}

impl FakeEmbedder {
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn batches(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }
}

/// 26 letter counts plus a constant component so no vector is zero
pub fn letter_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0; 27];
    v[26] = 1.0;
    for c in text.to_lowercase().chars().filter(char::is_ascii_lowercase) {
        v[(c as u8 - b'a') as usize] += 1.0;
    }
    v
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::embedding("connection refused"));
        }
        Ok(letter_vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::embedding("connection refused"));
        }
        Ok(texts.iter().map(|t| letter_vector(t)).collect())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.fail.load(Ordering::SeqCst))
    }

    fn name(&self) -> &str {
        "fake"
    }

    fn model(&self) -> &str {
        "letters"
    }
}

/// Answers every prompt with a fixed sentence and remembers the prompts
#[derive(Default)]
pub struct FakeLlm {
    pub prompts: parking_lot::Mutex<Vec<String>>,
}

impl FakeLlm {
    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().last().cloned()
    }
}

#[async_trait]
impl LlmProvider for FakeLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        Ok("Beta is the second letter of the Greek alphabet.".to_string())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "fake"
    }

    fn model(&self) -> &str {
        "fixed"
    }
}

/// Router over fake backends with a temporary upload directory
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub embedder: Arc<FakeEmbedder>,
    pub llm: Arc<FakeLlm>,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(configure: impl FnOnce(&mut RagConfig)) -> Self {
        Self::build(FakeEmbedder::default(), configure)
    }

    pub fn build(embedder: FakeEmbedder, configure: impl FnOnce(&mut RagConfig)) -> Self {
        let upload_dir = tempfile::tempdir().unwrap();
        let mut config = RagConfig::default();
        config.server.upload_dir = upload_dir.path().to_path_buf();
        configure(&mut config);

        let embedder = Arc::new(embedder);
        let llm = Arc::new(FakeLlm::default());
        let backend = Backend::new(embedder.clone(), llm.clone());
        let state = AppState::new(config, backend);

        Self {
            router: router(state.clone()),
            state,
            embedder,
            llm,
            upload_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        use tower::ServiceExt;
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn upload_request(filename: &str, content: &[u8]) -> Request<Body> {
    let boundary = "docqa-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap()
}

pub fn ask_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/ask")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
