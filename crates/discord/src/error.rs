use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Discord(#[from] serenity::Error),

    #[error("invalid Discord id {value:?} for {field}")]
    InvalidId { field: &'static str, value: String },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Parse a snowflake string; Discord ids are never zero.
pub(crate) fn parse_snowflake(field: &'static str, value: &str) -> Result<u64> {
    match value.trim().parse::<u64>() {
        Ok(id) if id != 0 => Ok(id),
        _ => Err(Error::InvalidId {
            field,
            value: value.to_string(),
        }),
    }
}
