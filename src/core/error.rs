use std::fmt;

/// Error types for urlscan operations
#[derive(Debug)]
pub enum UrlScanError {
    /// IO error (stdin, output destination, etc.)
    Io(std::io::Error),

    /// Stat or read failure while classifying a single path
    Classification { path: String, message: String },

    /// Invalid ignore pattern
    Pattern(regex::Error),

    /// HTTP client construction error
    Http(reqwest::Error),

    /// Configuration error
    Config(String),

    /// TOML parsing error
    TomlParsing(toml::de::Error),

    /// Path expansion error
    PathExpansion(String),

    /// Invalid argument error
    InvalidArgument(String),

    /// A worker task panicked or was cancelled
    Pipeline(String),
}

impl UrlScanError {
    pub fn classification(path: impl Into<String>, message: impl Into<String>) -> Self {
        UrlScanError::Classification {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for UrlScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlScanError::Io(err) => write!(f, "IO error: {err}"),
            UrlScanError::Classification { path, message } => {
                write!(f, "Classification error: {message} {path:?}")
            }
            UrlScanError::Pattern(err) => write!(f, "Ignore pattern error: {err}"),
            UrlScanError::Http(err) => write!(f, "HTTP error: {err}"),
            UrlScanError::Config(msg) => write!(f, "Configuration error: {msg}"),
            UrlScanError::TomlParsing(err) => write!(f, "TOML parsing error: {err}"),
            UrlScanError::PathExpansion(msg) => write!(f, "Path expansion error: {msg}"),
            UrlScanError::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
            UrlScanError::Pipeline(msg) => write!(f, "Pipeline error: {msg}"),
        }
    }
}

impl std::error::Error for UrlScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UrlScanError::Io(err) => Some(err),
            UrlScanError::Pattern(err) => Some(err),
            UrlScanError::Http(err) => Some(err),
            UrlScanError::TomlParsing(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for UrlScanError {
    fn from(err: std::io::Error) -> Self {
        UrlScanError::Io(err)
    }
}

impl From<regex::Error> for UrlScanError {
    fn from(err: regex::Error) -> Self {
        UrlScanError::Pattern(err)
    }
}

impl From<reqwest::Error> for UrlScanError {
    fn from(err: reqwest::Error) -> Self {
        UrlScanError::Http(err)
    }
}

impl From<toml::de::Error> for UrlScanError {
    fn from(err: toml::de::Error) -> Self {
        UrlScanError::TomlParsing(err)
    }
}

impl From<tokio::task::JoinError> for UrlScanError {
    fn from(err: tokio::task::JoinError) -> Self {
        UrlScanError::Pipeline(err.to_string())
    }
}

/// Type alias for Results using UrlScanError
pub type Result<T> = std::result::Result<T, UrlScanError>;
