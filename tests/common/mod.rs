// Shared test doubles for the integration tests.
#![allow(dead_code)]

use anyhow::{anyhow, bail, Result};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use therapy_sessions::call::{CallEvent, VoiceClient};
use therapy_sessions::config::VoiceConfig;
use therapy_sessions::store::{Document, DocumentStore, MemoryStore, Query, StoredDocument, Write};
use therapy_sessions::{GenerationRequest, StructuredGenerator};
use tokio::sync::mpsc;

/// Generator returning queued responses in order
#[derive(Default)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<Value, String>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_ok(&self, value: Value) {
        self.responses.lock().unwrap().push_back(Ok(value));
    }

    pub fn push_err(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl StructuredGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Value> {
        self.requests.lock().unwrap().push(request.clone());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(anyhow!(message)),
            None => bail!("no scripted response left"),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Store wrapper counting reads and writes
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    writes: AtomicUsize,
    reads: AtomicUsize,
    fail_commits: std::sync::atomic::AtomicBool,
    before_commit: Mutex<Vec<Write>>,
}

impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn fail_commits(&self) {
        self.fail_commits.store(true, Ordering::SeqCst);
    }

    /// Apply `writes` right before the next commit, as a concurrent writer would
    pub fn race_next_commit(&self, writes: Vec<Write>) {
        *self.before_commit.lock().unwrap() = writes;
    }

    pub async fn count(&self, collection: &str) -> usize {
        self.inner.count(collection).await
    }
}

#[async_trait::async_trait]
impl DocumentStore for CountingStore {
    fn new_id(&self) -> String {
        self.inner.new_id()
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get(collection, id).await
    }

    async fn set(&self, collection: &str, id: &str, data: Document) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(collection, id, data).await
    }

    async fn update(&self, collection: &str, id: &str, fields: Document) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.update(collection, id, fields).await
    }

    async fn query(&self, query: &Query) -> Result<Vec<StoredDocument>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.query(query).await
    }

    async fn commit(&self, writes: Vec<Write>) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_commits.load(Ordering::SeqCst) {
            bail!("store unavailable");
        }
        let competing = std::mem::take(&mut *self.before_commit.lock().unwrap());
        if !competing.is_empty() {
            self.inner.commit(competing).await?;
        }
        self.inner.commit(writes).await
    }
}

/// Voice client driven directly by the test
#[derive(Default)]
pub struct TestVoice {
    sender: Mutex<Option<mpsc::Sender<CallEvent>>>,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub mutes: Mutex<Vec<bool>>,
    pub fail_start: bool,
}

impl TestVoice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail_start: true,
            ..Self::default()
        })
    }

    pub async fn emit(&self, event: CallEvent) {
        let sender = self.sender.lock().unwrap().clone();
        sender
            .expect("call not started")
            .send(event)
            .await
            .expect("event loop gone");
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl VoiceClient for TestVoice {
    async fn start(&self, _assistant_id: &str) -> Result<mpsc::Receiver<CallEvent>> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            bail!("microphone permission denied");
        }
        let (tx, rx) = mpsc::channel(32);
        *self.sender.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if let Some(sender) = self.sender.lock().unwrap().take() {
            let _ = sender.try_send(CallEvent::CallEnd);
        }
    }

    fn set_muted(&self, muted: bool) {
        self.mutes.lock().unwrap().push(muted);
    }

    fn name(&self) -> &str {
        "test"
    }
}

pub fn voice_config() -> VoiceConfig {
    VoiceConfig {
        api_token: "web-token".to_string(),
        assistant_id: "therapist-assistant".to_string(),
    }
}

pub fn session_plan(prompt_count: usize, tags: &[&str]) -> Value {
    let prompts: Vec<String> = (1..=prompt_count).map(|i| format!("P{}", i)).collect();
    json!({ "prompts": prompts, "tags": tags })
}

pub fn insight_output(mood_score: f64) -> Value {
    json!({
        "emotionalState": "Anxious but hopeful",
        "moodScore": mood_score,
        "keyThemes": ["work pressure", "sleep"],
        "copingStrategies": ["Deep breathing"],
        "recommendedActions": ["Try 4-7-8 breathing", "Set work boundaries", "Short evening walks"],
        "finalAssessment": "The client showed insight into their stress triggers."
    })
}
