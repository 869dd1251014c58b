use std::error::Error as StdError;

/// Crate-wide result type for sink operations.
pub type Result<T> = std::result::Result<T, DeliveryError>;

/// A sink failed to hand off a notification.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// Payload or sink configuration is invalid.
    #[error("invalid delivery input: {message}")]
    InvalidInput { message: String },

    /// The remote end answered with a non-success status.
    #[error("{sink} rejected delivery with HTTP {status}")]
    Rejected { sink: &'static str, status: u16 },

    /// Wrapped transport error.
    #[error("delivery failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl DeliveryError {
    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Configuration problems will not fix themselves on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::InvalidInput { .. } => false,
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
            Self::External { .. } => true,
        }
    }
}
