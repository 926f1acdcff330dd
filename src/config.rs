use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use std::{path::PathBuf, time::Duration};

use crate::{
    backend::{ApiFlavor, HttpBackend},
    controller::OnExhaustedRetries,
    retry::RetryPolicy,
    slots::model_dir_name,
};

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4.1-nano";
pub const DEFAULT_COMPLETIONS_MODEL: &str = "agir-learner";

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const MODEL_VAR: &str = "GPT_MODEL";

// these break client initialisation against the backend when set
pub const PROXY_VARS: &[&str] = &[
    "http_proxy",
    "https_proxy",
    "HTTP_PROXY",
    "HTTPS_PROXY",
    "OPENAI_PROXY",
    "openai_proxy",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// OpenAI-style chat completions
    Openai,
    /// plain `/completions` endpoint with a prompt field
    Completions,
}

/// Flags shared by the driver binary.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Scenario JSONL
    #[arg(long, default_value = "EU.jsonl")]
    pub input: PathBuf,

    /// Parent of the per-model run directories
    #[arg(long = "results-dir", default_value = "results")]
    pub results_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = BackendKind::Openai)]
    pub backend: BackendKind,

    /// Model identifier; falls back to $GPT_MODEL
    #[arg(long)]
    pub model: Option<String>,

    #[arg(long = "base-url")]
    pub base_url: Option<String>,

    /// Falls back to $OPENAI_API_KEY
    #[arg(long = "api-key", value_name = "KEY")]
    pub api_key: Option<String>,

    /// Sent as `user_id` by the completions backend
    #[arg(long = "user-id")]
    pub user_id: Option<String>,

    /// Cap on the number of new items processed
    #[arg(long)]
    pub limit: Option<usize>,

    /// Skip items already recorded in the latest run directory
    #[arg(long)]
    pub resume: bool,

    /// Only check that the backend answers
    #[arg(long = "test-connection")]
    pub test_connection: bool,

    #[arg(long = "max-attempts", default_value_t = 3)]
    pub max_attempts: u32,

    #[arg(long = "retry-delay-secs", default_value_t = 5)]
    pub retry_delay_secs: u64,

    #[arg(long = "on-exhausted", value_enum, default_value_t = OnExhaustedRetries::Abort)]
    pub on_exhausted: OnExhaustedRetries,

    #[arg(long = "timeout-secs", default_value_t = 120)]
    pub timeout_secs: u64,

    #[arg(long = "log-dir", default_value = "logs")]
    pub log_dir: PathBuf,
}

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub results_root: PathBuf,
    pub flavor: ApiFlavor,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub limit: Option<usize>,
    pub resume: bool,
    pub test_connection: bool,
    pub retry: RetryPolicy,
    pub on_exhausted: OnExhaustedRetries,
    pub timeout: Duration,
    pub log_dir: PathBuf,
}

impl RunConfig {
    /// `env` is consulted for anything the flags leave unset.
    pub fn resolve(args: RunArgs, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let flavor = match args.backend {
            BackendKind::Openai => ApiFlavor::OpenAiChat,
            BackendKind::Completions => ApiFlavor::Completions { user_id: args.user_id.clone() },
        };
        let default_model = match flavor {
            ApiFlavor::OpenAiChat => DEFAULT_CHAT_MODEL,
            ApiFlavor::Completions { .. } => DEFAULT_COMPLETIONS_MODEL,
        };
        let model = args
            .model
            .or_else(|| env(MODEL_VAR))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default_model.to_string());
        let api_key = args.api_key.or_else(|| env(API_KEY_VAR)).filter(|k| !k.is_empty());

        if flavor == ApiFlavor::OpenAiChat && api_key.is_none() {
            bail!("API key not found: pass --api-key or set {API_KEY_VAR}");
        }

        Ok(Self {
            input: args.input,
            results_root: args.results_dir,
            flavor,
            base_url: args.base_url,
            api_key,
            model,
            limit: args.limit,
            resume: args.resume,
            test_connection: args.test_connection,
            retry: RetryPolicy::new(args.max_attempts, Duration::from_secs(args.retry_delay_secs)),
            on_exhausted: args.on_exhausted,
            timeout: Duration::from_secs(args.timeout_secs),
            log_dir: args.log_dir,
        })
    }

    /// Nominal run directory name for this model.
    pub fn slot_base(&self) -> String {
        model_dir_name(&self.model)
    }

    pub fn build_backend(&self) -> Result<HttpBackend> {
        HttpBackend::new(
            self.flavor.clone(),
            self.base_url.clone(),
            self.api_key.clone(),
            self.model.clone(),
            self.timeout,
        )
    }
}

/// Drop proxy settings from the process environment; returns the names that
/// were set. Call before any HTTP client is built.
pub fn clear_proxy_env() -> Vec<&'static str> {
    let mut cleared = Vec::new();
    for var in PROXY_VARS {
        if std::env::var_os(var).is_some() {
            log::info!("Clearing environment variable {var} before client initialisation");
            std::env::remove_var(var);
            cleared.push(*var);
        }
    }
    cleared
}
