use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::{json, Map as JsonMap, Value};
use std::time::{Duration, Instant};

use crate::error::BackendError;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const COMPLETIONS_BASE_URL: &str = "http://localhost:8000/api";

// identifiers that reject `temperature` and want `max_completion_tokens`
const REASONING_PREFIXES: &[&str] = &["gpt-5", "o1", "o3", "o4"];

/// Wire shape of the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFlavor {
    /// `POST {base}/chat/completions`, text at `choices[0].message.content`
    OpenAiChat,
    /// `POST {base}/completions`, text at `choices[0].text`
    Completions { user_id: Option<String> },
}

impl ApiFlavor {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ApiFlavor::OpenAiChat => OPENAI_BASE_URL,
            ApiFlavor::Completions { .. } => COMPLETIONS_BASE_URL,
        }
    }

    fn path(&self) -> &'static str {
        match self {
            ApiFlavor::OpenAiChat => "chat/completions",
            ApiFlavor::Completions { .. } => "completions",
        }
    }
}

/// Request parameters that depend on the model identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelProfile {
    pub temperature: Option<f64>,
    pub max_output_tokens: u32,
    pub token_field: &'static str,
    pub json_mode: bool,
    /// switch to the simplified prompt after an empty or unreadable completion
    pub simplify_on_empty: bool,
}

impl ModelProfile {
    pub fn for_model(flavor: &ApiFlavor, model: &str) -> Self {
        match flavor {
            ApiFlavor::Completions { .. } => Self {
                temperature: Some(0.0),
                max_output_tokens: 500,
                token_field: "max_tokens",
                json_mode: false,
                simplify_on_empty: false,
            },
            ApiFlavor::OpenAiChat if is_reasoning_model(model) => Self {
                temperature: None,
                max_output_tokens: 2000,
                token_field: "max_completion_tokens",
                json_mode: true,
                simplify_on_empty: true,
            },
            ApiFlavor::OpenAiChat => Self {
                temperature: Some(0.0),
                max_output_tokens: 150,
                token_field: "max_tokens",
                json_mode: true,
                simplify_on_empty: false,
            },
        }
    }

    /// Settings for the connectivity check: short, free-form output.
    pub fn probe(&self) -> Self {
        Self {
            temperature: self.temperature.map(|_| 0.7),
            max_output_tokens: 100,
            json_mode: false,
            simplify_on_empty: false,
            ..self.clone()
        }
    }
}

pub fn is_reasoning_model(model: &str) -> bool {
    let model = model.to_ascii_lowercase();
    REASONING_PREFIXES.iter().any(|p| model.starts_with(p))
}

/// Raw text of one successful (2xx) exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub status: u16,
    pub text: String,
    pub elapsed: Duration,
}

#[async_trait]
pub trait Backend: Send + Sync {
    fn model(&self) -> &str;
    fn profile(&self) -> &ModelProfile;
    fn describe(&self) -> String {
        self.model().to_string()
    }

    /// One request, no retries. Non-2xx responses come back as
    /// `BackendError::Status`.
    async fn complete(&self, prompt: &str, profile: &ModelProfile)
        -> Result<Completion, BackendError>;
}

pub struct HttpBackend {
    client: reqwest::Client,
    flavor: ApiFlavor,
    base_url: String,
    api_key: Option<String>,
    model: String,
    profile: ModelProfile,
}

impl HttpBackend {
    pub fn new(
        flavor: ApiFlavor,
        base_url: Option<String>,
        api_key: Option<String>,
        model: String,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = build_client(timeout)?;
        let base_url = base_url.unwrap_or_else(|| flavor.default_base_url().to_string());
        let profile = ModelProfile::for_model(&flavor, &model);
        Ok(Self { client, flavor, base_url, api_key, model, profile })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.flavor.path())
    }

    pub fn build_request(&self, prompt: &str, profile: &ModelProfile) -> Value {
        let mut body = JsonMap::new();
        body.insert("model".into(), json!(self.model));
        match &self.flavor {
            ApiFlavor::OpenAiChat => {
                body.insert("messages".into(), json!([{ "role": "user", "content": prompt }]));
            }
            ApiFlavor::Completions { user_id } => {
                body.insert("prompt".into(), json!(prompt));
                if let Some(id) = user_id {
                    body.insert("user_id".into(), json!(id));
                }
            }
        }
        body.insert(profile.token_field.into(), json!(profile.max_output_tokens));
        if let Some(t) = profile.temperature {
            body.insert("temperature".into(), json!(t));
        }
        if profile.json_mode {
            body.insert("response_format".into(), json!({ "type": "json_object" }));
        }
        Value::Object(body)
    }

    /// Pull the completion text out of a decoded 2xx body.
    pub fn interpret(&self, body: &Value) -> Result<String, BackendError> {
        let choice = body["choices"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| BackendError::Malformed(format!("no choices in response: {body}")))?;
        let text = match self.flavor {
            ApiFlavor::OpenAiChat => &choice["message"]["content"],
            ApiFlavor::Completions { .. } => &choice["text"],
        };
        // null content is an empty completion, not a layout surprise
        Ok(text.as_str().unwrap_or_default().to_string())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn model(&self) -> &str {
        &self.model
    }

    fn profile(&self) -> &ModelProfile {
        &self.profile
    }

    fn describe(&self) -> String {
        format!("{} @ {}", self.model, self.endpoint())
    }

    async fn complete(
        &self,
        prompt: &str,
        profile: &ModelProfile,
    ) -> Result<Completion, BackendError> {
        let url = self.endpoint();
        let body = self.build_request(prompt, profile);

        let mut req = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let started = Instant::now();
        let resp = req.send().await?;
        let status = resp.status();
        let raw = resp.text().await?;
        let elapsed = started.elapsed();
        log::info!(
            "POST {url} -> {} in {:.2}s ({} bytes)",
            status.as_u16(),
            elapsed.as_secs_f64(),
            raw.len()
        );

        if !status.is_success() {
            return Err(BackendError::Status { status: status.as_u16(), body: excerpt(&raw) });
        }
        if raw.trim().is_empty() {
            return Ok(Completion { status: status.as_u16(), text: String::new(), elapsed });
        }

        let decoded: Value = serde_json::from_str(&raw).map_err(|e| {
            BackendError::Malformed(format!("{e}; raw body: {}", excerpt(&raw)))
        })?;
        let text = self.interpret(&decoded)?;
        Ok(Completion { status: status.as_u16(), text, elapsed })
    }
}

fn build_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let client = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .no_proxy()
        .build()?;

    Ok(client)
}

fn excerpt(raw: &str) -> String {
    const MAX: usize = 500;
    match raw.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}…", &raw[..cut]),
        None => raw.to_string(),
    }
}
