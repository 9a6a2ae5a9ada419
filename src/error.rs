use thiserror::Error;

/// Errors reported by reading, navigation and session operations.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("text is empty, nothing to prepare")]
    EmptyInput,
    #[error("text has not been prepared for reading")]
    NotPrepared,
    #[error("{value} is out of range ({min}..={max})")]
    OutOfRange { value: String, min: String, max: String },
    #[error("speech engine failed: {0}")]
    EngineFailure(String),
    #[error("session could not be imported: {0}")]
    ImportMalformed(String),
    /// A callback from a superseded utterance. Filtered internally, never shown.
    #[error("stale callback from utterance {seq} (current: {current:?})")]
    StaleCallback { seq: u64, current: Option<u64> },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ReaderError {
    pub fn out_of_range(value: impl ToString, min: impl ToString, max: impl ToString) -> Self {
        Self::OutOfRange {
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }
}

pub type ReaderResult<T> = Result<T, ReaderError>;
