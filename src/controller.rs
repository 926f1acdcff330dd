use clap::ValueEnum;
use indicatif::ProgressBar;

use crate::{
    backend::Backend,
    client::QueryClient,
    config::RunConfig,
    dataset::ScenarioRecord,
    error::RunError,
    ledger::{ProcessedIds, ProgressLedger},
    prompt::Prompt,
    results::{ResultsLog, Summary},
    score::score,
    slots::RunLayout,
};

/// What happens to the run when one item runs out of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnExhaustedRetries {
    /// stop the whole run
    Abort,
    /// log the item, leave it unrecorded and move on
    #[value(name = "skip")]
    SkipItem,
}

/// Where a processed item ended up. An aborting item has no state: the run
/// returns `RunError::Aborted` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    /// result line and ledger entry written
    Persisted,
    /// retries exhausted under `OnExhaustedRetries::SkipItem`
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// already in the ledger before this pass
    pub previously_done: usize,
    pub outcomes: Vec<(String, ItemState)>,
    /// over the whole results file of the slot
    pub summary: Summary,
}

impl RunReport {
    pub fn persisted(&self) -> impl Iterator<Item = &str> {
        self.with_state(ItemState::Persisted)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &str> {
        self.with_state(ItemState::Skipped)
    }

    fn with_state(&self, state: ItemState) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(move |(_, s)| *s == state)
            .map(|(qid, _)| qid.as_str())
    }
}

/// Records still to do, in dataset order, capped by `limit`.
pub fn pending_items<'a>(
    data: &'a [ScenarioRecord],
    done: &ProcessedIds,
    limit: Option<usize>,
) -> Vec<&'a ScenarioRecord> {
    data.iter()
        .filter(|r| !done.contains(&r.qid))
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

/// One sequential pass over the dataset into a single run slot.
pub struct Runner<B> {
    client: QueryClient<B>,
    ledger: ProgressLedger,
    results: ResultsLog,
    on_exhausted: OnExhaustedRetries,
    resume: bool,
    limit: Option<usize>,
    bar: ProgressBar,
}

impl<B: Backend> Runner<B> {
    pub fn new(client: QueryClient<B>, layout: &RunLayout, on_exhausted: OnExhaustedRetries) -> Self {
        Self {
            client,
            ledger: layout.ledger(),
            results: layout.results(),
            on_exhausted,
            resume: false,
            limit: None,
            bar: ProgressBar::hidden(),
        }
    }

    pub fn from_config(client: QueryClient<B>, layout: &RunLayout, cfg: &RunConfig) -> Self {
        Self::new(client, layout, cfg.on_exhausted)
            .resume(cfg.resume)
            .limit(cfg.limit)
    }

    pub fn resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.bar = bar;
        self
    }

    pub fn client(&self) -> &QueryClient<B> {
        &self.client
    }

    pub async fn run(&self, data: &[ScenarioRecord]) -> Result<RunReport, RunError> {
        let mut done = if self.resume {
            self.ledger.load().map_err(RunError::LoadLedger)?
        } else {
            ProcessedIds::new()
        };
        let previously_done = done.len();
        if self.resume && previously_done > 0 {
            log::info!("Resuming from previous run. {previously_done} items already processed.");
        }

        let todo = pending_items(data, &done, self.limit);
        log::info!("Processing {} items...", todo.len());
        self.bar.set_length(todo.len() as u64);

        let mut outcomes = Vec::with_capacity(todo.len());
        for rec in todo {
            let state = self.process(rec, &mut done).await?;
            outcomes.push((rec.qid.clone(), state));
            self.bar.inc(1);
        }
        self.bar.finish_with_message("done");

        log::info!("Testing complete. Processed {} items in total.", done.len());

        let records = self.results.read_all().map_err(RunError::ReadResults)?;
        let summary = Summary::from_records(&records);
        Ok(RunReport { previously_done, outcomes, summary })
    }

    async fn process(&self, rec: &ScenarioRecord, done: &mut ProcessedIds) -> Result<ItemState, RunError> {
        let prompt = Prompt::for_scenario(rec);
        let answer = match self.client.query(&rec.qid, &prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                return match self.on_exhausted {
                    OnExhaustedRetries::Abort => {
                        log::error!("{}: {e}; aborting run", rec.qid);
                        self.bar.abandon_with_message("aborted");
                        Err(RunError::Aborted { qid: rec.qid.clone(), source: e })
                    }
                    OnExhaustedRetries::SkipItem => {
                        log::warn!("Skipping item {} due to failed query: {e}", rec.qid);
                        Ok(ItemState::Skipped)
                    }
                };
            }
        };

        let evaluation = score(&answer, rec)?;

        // result line first, ledger second: a crash in between redoes the
        // item instead of losing it
        self.results
            .append(&evaluation)
            .map_err(|source| RunError::Persist { qid: rec.qid.clone(), source })?;
        done.insert(rec.qid.clone());
        self.ledger
            .save(done)
            .map_err(|source| RunError::Persist { qid: rec.qid.clone(), source })?;

        log::info!(
            "[done] {} emotion_correct={} cause_correct={}",
            rec.qid,
            evaluation.emotion_correct,
            evaluation.cause_correct
        );
        Ok(ItemState::Persisted)
    }
}
