use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Malformed log line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("Too many endpoints ({limit} or less)")]
    TooManyEndpoints { limit: usize },

    #[error("Source unavailable: {path}: {source}")]
    SourceUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to write delimited output: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Attribute an I/O failure raised while writing the report to the
    /// destination it was written to. Other errors pass through unchanged.
    pub(crate) fn at_destination(self, path: &str) -> Self {
        let path = path.to_string();
        match self {
            Error::Io(source) => Error::SourceUnavailable { path, source },
            Error::Json(e) if e.is_io() => Error::SourceUnavailable {
                path,
                source: e.into(),
            },
            Error::Csv(e) if e.is_io_error() => match e.into_kind() {
                csv::ErrorKind::Io(source) => Error::SourceUnavailable { path, source },
                kind => Error::SourceUnavailable {
                    path,
                    source: std::io::Error::other(format!("{:?}", kind)),
                },
            },
            other => other,
        }
    }
}

/// Problems detected while validating a run configuration, before any
/// input is read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid sort key '{0}'")]
    InvalidSortKey(String),

    #[error("invalid output format '{0}' (expected table, markdown, tsv, csv or json)")]
    InvalidFormat(String),

    #[error("invalid percentile '{0}' (expected an integer between 0 and 100)")]
    InvalidPercentile(String),

    #[error("invalid column '{0}'")]
    InvalidColumn(String),

    #[error("invalid matching group: {0}")]
    InvalidPattern(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("invalid location '{0}' (expected Local, UTC or an offset like +09:00)")]
    InvalidLocation(String),

    #[error("endpoint limit must be greater than zero")]
    InvalidLimit,
}

pub type Result<T> = std::result::Result<T, Error>;
