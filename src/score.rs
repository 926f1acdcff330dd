use serde::{Deserialize, Serialize};

use crate::{dataset::ScenarioRecord, error::ScoreError, extract::ExtractedAnswer};

/// One line of `results.jsonl`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EvaluationRecord {
    pub qid: String,
    pub scenario: String,
    pub subject: String,
    pub true_emotion: String,
    pub predicted_emotion: String,
    pub emotion_correct: bool,
    pub true_cause: String,
    pub predicted_cause: String,
    pub cause_correct: bool,
    pub both_correct: bool,
}

/// Exact, case-sensitive string match on both labels.
pub fn score(extracted: &ExtractedAnswer, rec: &ScenarioRecord) -> Result<EvaluationRecord, ScoreError> {
    let true_emotion = rec.emotion_label.clone().ok_or_else(|| ScoreError::MissingGold {
        qid: rec.qid.clone(),
        field: "emotion_label",
    })?;
    let true_cause = rec.cause_label.clone().ok_or_else(|| ScoreError::MissingGold {
        qid: rec.qid.clone(),
        field: "cause_label",
    })?;

    let emotion_correct = extracted.emotion == true_emotion;
    let cause_correct = extracted.cause == true_cause;

    Ok(EvaluationRecord {
        qid: rec.qid.clone(),
        scenario: rec.scenario.clone(),
        subject: rec.subject.clone(),
        true_emotion,
        predicted_emotion: extracted.emotion.clone(),
        emotion_correct,
        true_cause,
        predicted_cause: extracted.cause.clone(),
        cause_correct,
        both_correct: emotion_correct && cause_correct,
    })
}
