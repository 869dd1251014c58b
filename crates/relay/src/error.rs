use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("owner id is not configured")]
    MissingOwner,
}

pub type Result<T> = std::result::Result<T, Error>;
