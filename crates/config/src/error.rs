use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Failure to turn a config file into a [`crate::VoicewatchConfig`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid {format} config in {}: {message}", path.display())]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },

    #[error("unsupported config format: .{ext}")]
    UnsupportedFormat { ext: String },
}

impl Error {
    #[must_use]
    pub fn parse(path: &Path, format: &'static str, err: impl Display) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            format,
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_names_file_and_format() {
        let err = Error::parse(Path::new("/etc/vw.yaml"), "YAML", "bad indent");
        assert_eq!(err.to_string(), "invalid YAML config in /etc/vw.yaml: bad indent");
    }

    #[test]
    fn read_error_keeps_io_source() {
        let err = Error::Read {
            path: PathBuf::from("/missing.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().starts_with("failed to read /missing.toml"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
