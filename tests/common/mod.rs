#![allow(dead_code)]

use async_trait::async_trait;
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use emotion_bench::{
    backend::{ApiFlavor, Backend, Completion, ModelProfile},
    error::BackendError,
    ScenarioRecord,
};

pub const JOY_ACHIEVEMENT: &str = r#"{"emotion":"joy","cause":"achievement"}"#;

#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Empty,
    Status(u16),
    Timeout,
}

impl Reply {
    pub fn text(s: &str) -> Self {
        Reply::Text(s.to_string())
    }
}

/// In-memory backend: pops scripted replies, then repeats `fallback`.
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    profile: ModelProfile,
}

impl ScriptedBackend {
    pub fn always(reply: Reply) -> Self {
        Self::scripted(Vec::new(), reply)
    }

    pub fn scripted(replies: Vec<Reply>, fallback: Reply) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fallback,
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            profile: ModelProfile::for_model(&ApiFlavor::OpenAiChat, "gpt-4.1-nano"),
        }
    }

    pub fn with_model_profile(mut self, model: &str) -> Self {
        self.profile = ModelProfile::for_model(&ApiFlavor::OpenAiChat, model);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn model(&self) -> &str {
        "scripted"
    }

    fn profile(&self) -> &ModelProfile {
        &self.profile
    }

    async fn complete(&self, prompt: &str, _profile: &ModelProfile) -> Result<Completion, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        let ok = |text: String| Completion { status: 200, text, elapsed: Duration::from_millis(1) };
        match reply {
            Reply::Text(t) => Ok(ok(t)),
            Reply::Empty => Ok(ok(String::new())),
            Reply::Status(status) => Err(BackendError::Status { status, body: "upstream error".into() }),
            Reply::Timeout => Err(BackendError::Timeout("deadline elapsed".into())),
        }
    }
}

pub fn scenario(qid: &str, emotion: &str, cause: &str) -> ScenarioRecord {
    ScenarioRecord {
        qid: qid.into(),
        scenario: format!("scenario for {qid}"),
        subject: "Alex".into(),
        emotion_choices: vec!["joy".into(), "anger".into(), "sadness".into()],
        cause_choices: vec!["achievement".into(), "loss".into()],
        emotion_label: Some(emotion.into()),
        cause_label: Some(cause.into()),
    }
}
