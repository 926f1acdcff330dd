use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{ledger::ProgressLedger, results::ResultsLog};

pub const PROGRESS_FILE: &str = "progress.json";
pub const RESULTS_FILE: &str = "results.jsonl";

/// `gpt-4.1-nano` -> `gpt-4-1-nano`
pub fn model_dir_name(model: &str) -> String {
    model.replace('.', "-")
}

/// `base` is version 1, `base-vN` is version N (N >= 2).
pub fn slot_version(base: &str, name: &str) -> Option<u32> {
    if name == base {
        return Some(1);
    }
    let n: u32 = name.strip_prefix(base)?.strip_prefix("-v")?.parse().ok()?;
    (n >= 2).then_some(n)
}

pub fn slot_name(base: &str, version: u32) -> String {
    if version <= 1 {
        base.to_string()
    } else {
        format!("{base}-v{version}")
    }
}

/// One past the highest slot for `base`. Gaps are never filled, so the
/// newest run is always the latest slot.
pub fn next_run_slot<S: AsRef<str>>(base: &str, existing: &[S]) -> String {
    let highest = existing
        .iter()
        .filter_map(|n| slot_version(base, n.as_ref()))
        .max()
        .unwrap_or(0);
    slot_name(base, highest + 1)
}

/// Highest existing slot for `base`, if any.
pub fn latest_run_slot<S: AsRef<str>>(base: &str, existing: &[S]) -> Option<String> {
    existing
        .iter()
        .filter_map(|n| slot_version(base, n.as_ref()))
        .max()
        .map(|v| slot_name(base, v))
}

/// Files of the run slot chosen for this invocation.
#[derive(Debug, Clone)]
pub struct RunLayout {
    pub slot: String,
    pub dir: PathBuf,
    pub reused: bool,
}

impl RunLayout {
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let slot = dir
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { slot, dir, reused: true }
    }

    /// Pick and create the slot. With `resume` the latest slot is reused so
    /// its ledger is found; otherwise a fresh sibling is allocated and
    /// earlier results stay untouched.
    pub fn prepare(results_root: &Path, base: &str, resume: bool) -> Result<Self> {
        fs::create_dir_all(results_root)
            .with_context(|| format!("failed to create {}", results_root.display()))?;
        let existing = list_dir_names(results_root)?;

        let (slot, reused) = match (resume, latest_run_slot(base, &existing)) {
            (true, Some(latest)) => (latest, true),
            _ => (next_run_slot(base, &existing), false),
        };
        let dir = results_root.join(&slot);
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;

        if reused {
            log::info!("Resuming in existing run directory {}", dir.display());
        } else if slot != base {
            log::info!(
                "{} already holds earlier runs, results go to {}",
                results_root.join(base).display(),
                dir.display()
            );
        } else {
            log::info!("Results will be stored in: {}", dir.display());
        }

        Ok(Self { slot, dir, reused })
    }

    pub fn progress_path(&self) -> PathBuf {
        self.dir.join(PROGRESS_FILE)
    }

    pub fn results_path(&self) -> PathBuf {
        self.dir.join(RESULTS_FILE)
    }

    pub fn ledger(&self) -> ProgressLedger {
        ProgressLedger::new(self.progress_path())
    }

    pub fn results(&self) -> ResultsLog {
        ResultsLog::new(self.results_path())
    }
}

fn list_dir_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}
