use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// One emotion-attribution scenario, one line of the input JSONL.
///
/// Gold labels are optional at load time so a record lacking them fails when
/// it is scored, not when the whole dataset is read.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScenarioRecord {
    pub qid: String,
    pub scenario: String,
    pub subject: String,
    pub emotion_choices: Vec<String>,
    pub cause_choices: Vec<String>,
    #[serde(default)]
    pub emotion_label: Option<String>,
    #[serde(default)]
    pub cause_label: Option<String>,
}

pub fn load_scenarios(path: &Path) -> Result<Vec<ScenarioRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let records = parse_scenarios(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    ensure!(!records.is_empty(), "dataset is empty: {}", path.display());
    Ok(records)
}

// blank lines are tolerated, everything else must be a record
pub fn parse_scenarios(raw: &str) -> Result<Vec<ScenarioRecord>> {
    let mut records = Vec::new();
    for (i, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let rec: ScenarioRecord = serde_json::from_str(line)
            .with_context(|| format!("line {} is not a scenario record", i + 1))?;
        records.push(rec);
    }
    Ok(records)
}
