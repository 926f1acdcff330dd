//! Resumable emotion-attribution benchmark runner.
//!
//! Scenarios are read from JSONL, sent one at a time to a text-generation
//! backend, the structured answer is recovered from the completion and
//! scored against the gold labels. Progress is written after every item so a
//! run can be picked up again after it was killed.

pub mod backend;
pub mod client;
pub mod config;
pub mod controller;
pub mod dataset;
pub mod error;
pub mod extract;
pub mod ledger;
pub mod logging;
pub mod prompt;
pub mod results;
pub mod retry;
pub mod score;
pub mod slots;

pub use backend::{ApiFlavor, Backend, Completion, HttpBackend, ModelProfile};
pub use client::QueryClient;
pub use config::RunConfig;
pub use controller::{OnExhaustedRetries, RunReport, Runner};
pub use dataset::{load_scenarios, ScenarioRecord};
pub use extract::{extract, ExtractedAnswer};
pub use ledger::{ProcessedIds, ProgressLedger};
pub use results::{ResultsLog, Summary};
pub use retry::{Decision, FailureClass, RetryPolicy};
pub use score::{score, EvaluationRecord};
pub use slots::RunLayout;
