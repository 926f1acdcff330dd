use thiserror::Error;

use crate::retry::FailureClass;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("completion is empty")]
    Empty,
    #[error("no emotion/cause pair found in completion")]
    NoAnswer,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response body: {0}")]
    Malformed(String),
}

impl BackendError {
    pub fn class(&self) -> FailureClass {
        match self {
            BackendError::Timeout(_) => FailureClass::Timeout,
            BackendError::Connect(_) => FailureClass::Connect,
            BackendError::Transport(_) => FailureClass::Transport,
            BackendError::Status { status, .. } => FailureClass::Status(*status),
            BackendError::Malformed(_) => FailureClass::Unparseable,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout(e.to_string())
        } else if e.is_connect() {
            BackendError::Connect(e.to_string())
        } else if e.is_decode() {
            BackendError::Malformed(e.to_string())
        } else {
            BackendError::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("gave up after {attempts} attempt(s), last failure {last}: {detail}")]
    Exhausted {
        attempts: u32,
        last: FailureClass,
        detail: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("record {qid} has no {field}")]
    MissingGold { qid: String, field: &'static str },
}

/// Failure writing the ledger or the results log.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("run aborted at {qid}: {source}")]
    Aborted {
        qid: String,
        #[source]
        source: QueryError,
    },
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error("failed to read progress ledger: {0}")]
    LoadLedger(#[source] PersistError),
    #[error("failed to read results: {0}")]
    ReadResults(#[source] PersistError),
    #[error("failed to persist {qid}: {source}")]
    Persist {
        qid: String,
        #[source]
        source: PersistError,
    },
}
