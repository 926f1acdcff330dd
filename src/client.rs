use std::time::Instant;
use tokio::time::sleep;

use crate::{
    backend::{Backend, Completion},
    error::{BackendError, ExtractError, QueryError},
    extract::{extract_with_layer, ExtractedAnswer},
    prompt::{Prompt, PROBE_PROMPT},
    retry::{Decision, FailureClass, RetryPolicy},
};

/// Wraps a backend with the retry policy and the answer extractor.
pub struct QueryClient<B> {
    backend: B,
    policy: RetryPolicy,
}

impl<B: Backend> QueryClient<B> {
    pub fn new(backend: B, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Ask until an answer can be extracted or the policy gives up.
    /// `label` only shows up in the log.
    pub async fn query(&self, label: &str, prompt: &Prompt) -> Result<ExtractedAnswer, QueryError> {
        let profile = self.backend.profile().clone();
        let max = self.policy.max_attempts;
        let started = Instant::now();
        let mut simplified = false;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            log::info!(
                "[call] {label} attempt {attempt}/{max} model={}{}",
                self.backend.describe(),
                if simplified { " (simplified prompt)" } else { "" }
            );

            let (class, detail) = match self.backend.complete(prompt.text(simplified), &profile).await {
                Ok(completion) => match extract_with_layer(&completion.text) {
                    Ok((answer, layer)) => {
                        log::info!(
                            "[ok]   {label} attempt {attempt}/{max} status={} took {:.2}s via {layer:?}: {answer:?}",
                            completion.status,
                            completion.elapsed.as_secs_f64()
                        );
                        return Ok(answer);
                    }
                    Err(ExtractError::Empty) => {
                        (FailureClass::EmptyBody, format!("status {} with empty completion", completion.status))
                    }
                    Err(e) => (FailureClass::Unparseable, format!("{e}: {:?}", completion.text)),
                },
                Err(e) => (e.class(), e.to_string()),
            };

            log::warn!(
                "[warn] {label} attempt {attempt}/{max} failed after {:.2}s ({class}): {detail}",
                started.elapsed().as_secs_f64()
            );

            match self.policy.decide(attempt, started.elapsed(), class, profile.simplify_on_empty) {
                Decision::Retry { delay, simplify } => {
                    if simplify && !simplified {
                        log::info!("{label}: switching to the simplified prompt");
                        simplified = true;
                    }
                    log::info!("retrying in {} seconds...", delay.as_secs_f64());
                    sleep(delay).await;
                }
                Decision::GiveUp => {
                    log::error!("[fail] {label} giving up after {attempt} attempt(s)");
                    return Err(QueryError::Exhausted { attempts: attempt, last: class, detail });
                }
            }
        }
    }

    /// Single request with the probe prompt; no retries, no extraction.
    pub async fn probe(&self) -> Result<Completion, BackendError> {
        let profile = self.backend.profile().probe();
        log::info!("=== connection test against {} ===", self.backend.describe());
        let completion = self.backend.complete(PROBE_PROMPT, &profile).await?;
        log::info!(
            "connection test status={} took {:.2}s, reply: {:?}",
            completion.status,
            completion.elapsed.as_secs_f64(),
            completion.text
        );
        Ok(completion)
    }
}
