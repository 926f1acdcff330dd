use chrono::Local;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use crate::error::PersistError;

/// Completed qids in completion order, with O(1) membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessedIds {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl ProcessedIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if `qid` was already present.
    pub fn insert(&mut self, qid: impl Into<String>) -> bool {
        let qid = qid.into();
        if !self.seen.insert(qid.clone()) {
            return false;
        }
        self.order.push(qid);
        true
    }

    pub fn contains(&self, qid: &str) -> bool {
        self.seen.contains(qid)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ProcessedIds {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut ids = Self::new();
        for id in iter {
            ids.insert(id);
        }
        ids
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct LedgerFile {
    #[serde(default)]
    processed_ids: Vec<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

/// `progress.json` of one run slot.
#[derive(Debug, Clone)]
pub struct ProgressLedger {
    path: PathBuf,
}

impl ProgressLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Empty when no ledger has been written yet.
    pub fn load(&self) -> Result<ProcessedIds, PersistError> {
        if !self.path.exists() {
            return Ok(ProcessedIds::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        let file: LedgerFile = serde_json::from_str(&raw)?;
        Ok(file.processed_ids.into_iter().collect())
    }

    /// Rewrites the whole ledger through a temp file and a rename, so a
    /// reader never sees a half-written file.
    pub fn save(&self, ids: &ProcessedIds) -> Result<(), PersistError> {
        let file = LedgerFile {
            processed_ids: ids.iter().map(str::to_string).collect(),
            updated_at: Some(Local::now().to_rfc3339()),
        };
        let bytes = serde_json::to_vec(&file)?;
        write_atomic(&self.path, &bytes)?;
        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("progress.json");
    let tmp = path.with_file_name(format!(".{name}.tmp.{}", std::process::id()));
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path)
}
