use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("Comment record has a missing or unparsable timestamp: {0:?}")]
    MalformedRecord(String),

    #[error("Comment record has no text after trimming")]
    EmptyContent,

    #[error("Invalid layout configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to decode comment source: {0}")]
    UpstreamDecodeFailure(String),
}

impl LayoutError {
    /// Record-level errors are dropped by the engine; everything else aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LayoutError::MalformedRecord(_) | LayoutError::EmptyContent
        )
    }
}

pub type Result<T> = std::result::Result<T, LayoutError>;
