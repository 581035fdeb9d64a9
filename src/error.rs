use std::io;

use thiserror::Error;

use crate::types::{ItemId, UserId};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A raw row with the wrong number of fields or a field that does not parse.
    #[error("Malformed record {record}: {reason}")]
    Format { record: u64, reason: String },

    #[error("User {user} (rating item {item}) does not occur in the training data")]
    UnknownUser { user: UserId, item: ItemId },

    #[error("Cannot compute error metrics over an empty set of predictions")]
    EmptyEvaluation,

    #[error("Evaluation was cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn format(record: u64, reason: impl Into<String>) -> Self {
        Error::Format { record, reason: reason.into() }
    }
}
