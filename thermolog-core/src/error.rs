use thiserror::Error;

/// Failures from the Reading Store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[source] sqlx::Error),

    #[error("Write error: {0}")]
    Write(#[source] sqlx::Error),

    #[error("Read error: {0}")]
    Read(#[source] sqlx::Error),
}

/// Failures from a temperature source. One per fetch, never partial.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Error fetching {source_name} temperature: {message}")]
    Fetch {
        source_name: String,
        message: String,
    },

    #[error("Error parsing {source_name} temperature: {message}")]
    Parse {
        source_name: String,
        message: String,
    },
}

impl SourceError {
    pub fn fetch(source_name: &str, message: impl Into<String>) -> Self {
        Self::Fetch {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    pub fn parse(source_name: &str, message: impl Into<String>) -> Self {
        Self::Parse {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

#[derive(Error, Debug)]
pub enum ThermologError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}
