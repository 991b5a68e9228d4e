use thiserror::Error;

/// Errors that can abort an OFX to QIF conversion
#[derive(Error, Debug)]
pub enum ConvertError {
    /// An aggregate was closed while only the document root was open
    #[error("Unbalanced aggregate: </{name}> closes nothing")]
    UnbalancedAggregate { name: String },

    /// The document ended with aggregates still open
    #[error("Document ended with {open} unclosed aggregate(s)")]
    UnclosedAggregates { open: usize },

    /// The markup could not be split into headers, tags and values
    #[error("Malformed OFX markup: {0}")]
    MalformedMarkup(String),

    /// Content is not recognizable as OFX
    #[error("Unsupported file format")]
    UnsupportedFormat,

    /// Reading the input or writing the output failed
    #[error("Failed to read or write content: {0}")]
    ReadContentFailed(#[from] std::io::Error),

    /// The builder was invoked with neither content nor a file path
    #[error("Content or filepath is required")]
    MissingContentAndFilepath,

    /// An options file is not valid JSON for [`crate::ConvertOptions`]
    #[error("Invalid options file: {0}")]
    InvalidOptions(#[from] serde_json::Error),

    /// A DTUSER value is not a `yyyyMMdd` date (only raised with `DatePolicy::Strict`)
    #[error("Invalid OFX date: {0:?}")]
    DateInvalidFormat(String),
}

impl ConvertError {
    /// Structural errors mean the aggregate nesting of the document is broken.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ConvertError::UnbalancedAggregate { .. } | ConvertError::UnclosedAggregates { .. }
        )
    }
}

/// Convenience alias for results carrying a [`ConvertError`]
pub type ConvertResult<T> = Result<T, ConvertError>;
