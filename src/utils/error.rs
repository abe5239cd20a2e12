use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Remote data error: {message} ({url})")]
    RemoteData { message: String, url: String },

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Malformed response from {url}: {message}")]
    MalformedResponse { url: String, message: String },

    #[error("Malformed item: {message}")]
    MalformedData { message: String },

    #[error("Chapter aggregation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FeedError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FeedError::MalformedData { .. } | FeedError::Cancelled => ErrorSeverity::Low,
            FeedError::Transport(_) | FeedError::HttpStatus { .. } => ErrorSeverity::Medium,
            FeedError::RemoteData { .. }
            | FeedError::MalformedResponse { .. }
            | FeedError::Serialization(_)
            | FeedError::Csv(_) => ErrorSeverity::High,
            FeedError::Io(_) | FeedError::ConfigParse { .. } | FeedError::InvalidConfigValue { .. } => {
                ErrorSeverity::Critical
            }
        }
    }

    /// Failures a caller may reasonably retry. The engine itself never does.
    pub fn is_retryable(&self) -> bool {
        match self {
            FeedError::Transport(e) => e.is_timeout() || e.is_connect(),
            FeedError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            FeedError::ConfigParse { .. } | FeedError::InvalidConfigValue { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;
