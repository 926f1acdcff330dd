use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

use crate::{error::PersistError, score::EvaluationRecord};

/// Append-only `results.jsonl` of one run slot.
#[derive(Debug, Clone)]
pub struct ResultsLog {
    path: PathBuf,
}

impl ResultsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The whole line goes out in a single write so a kill never leaves half
    /// a record behind a complete one.
    pub fn append(&self, rec: &EvaluationRecord) -> Result<(), PersistError> {
        let mut line = serde_json::to_string(rec)?;
        line.push('\n');
        let mut f = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        f.write_all(line.as_bytes())?;
        f.sync_data()?;
        Ok(())
    }

    pub fn read_all(&self) -> Result<Vec<EvaluationRecord>, PersistError> {
        read_records(&self.path)
    }
}

pub fn read_records(path: &Path) -> Result<Vec<EvaluationRecord>, PersistError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let reader = BufReader::new(fs::File::open(path)?);
    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        out.push(serde_json::from_str(&line)?);
    }
    Ok(out)
}

/// Run-level accuracy over every persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Summary {
    pub total_items: usize,
    pub emotion_accuracy: f64,
    pub cause_accuracy: f64,
    pub both_correct_accuracy: f64,
}

impl Summary {
    pub fn from_records(records: &[EvaluationRecord]) -> Self {
        let total = records.len();
        let frac = |n: usize| if total > 0 { n as f64 / total as f64 } else { 0.0 };
        let emotion = records.iter().filter(|r| r.emotion_correct).count();
        let cause = records.iter().filter(|r| r.cause_correct).count();
        let both = records.iter().filter(|r| r.both_correct).count();
        Self {
            total_items: total,
            emotion_accuracy: frac(emotion),
            cause_accuracy: frac(cause),
            both_correct_accuracy: frac(both),
        }
    }

    /// `key: value` lines, accuracies as percentages.
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("total_items: {}", self.total_items),
            format!("emotion_accuracy: {:.2}%", self.emotion_accuracy * 100.0),
            format!("cause_accuracy: {:.2}%", self.cause_accuracy * 100.0),
            format!("both_correct_accuracy: {:.2}%", self.both_correct_accuracy * 100.0),
        ]
    }
}
