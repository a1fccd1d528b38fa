use std::fmt;
use std::path::PathBuf;

/// Outcome of a single liveness check.
///
/// A check either produced an HTTP status line (for example `200 OK`) or
/// failed at the transport level, in which case a human readable
/// description of the failure is kept instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The server answered; `text` is the full status line
    Status { code: u16, text: String },
    /// DNS, connect, TLS, timeout or malformed URL failure
    Error(String),
}

impl CheckOutcome {
    /// True for any 2xx status.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Status { code, .. } if (200..300).contains(code))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Status { text, .. } => text,
            Self::Error(description) => description,
        }
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A located URL occurrence.
///
/// Created once by extraction with no result, completed once by a
/// liveness check and then handed to the output sink. The result can
/// only be attached by consuming the match, so a completed match can
/// never be reset or completed twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    source: String,
    line: usize,
    column: usize,
    url: String,
    result: Option<CheckOutcome>,
}

/// Errors that can occur when building a `Match`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// URL is empty
    MissingUrl,
    /// Source name is empty
    MissingSource,
    /// Line number is zero
    InvalidLineNumber,
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingUrl => write!(f, "URL is required and cannot be empty"),
            Self::MissingSource => write!(f, "Source is required and cannot be empty"),
            Self::InvalidLineNumber => write!(f, "Line number must be greater than 0"),
        }
    }
}

impl std::error::Error for MatchError {}

impl Match {
    /// Create a new unchecked Match.
    ///
    /// # Arguments
    /// * `source` - File path or logical name such as `stdin` (must not be empty)
    /// * `line` - 1-based line number (must be > 0)
    /// * `column` - 0-based byte offset of the URL within its line
    /// * `url` - The exact matched text (must not be empty)
    ///
    /// # Examples
    /// ```
    /// use urlscan::core::types::Match;
    ///
    /// let m = Match::new("README.md", 3, 10, "https://example.com").unwrap();
    /// assert_eq!(m.line(), 3);
    /// assert!(m.result().is_none());
    /// ```
    pub fn new(
        source: impl Into<String>,
        line: usize,
        column: usize,
        url: impl Into<String>,
    ) -> Result<Self, MatchError> {
        let source = source.into();
        let url = url.into();

        if url.is_empty() {
            return Err(MatchError::MissingUrl);
        }
        if source.is_empty() {
            return Err(MatchError::MissingSource);
        }
        if line == 0 {
            return Err(MatchError::InvalidLineNumber);
        }

        Ok(Self {
            source,
            line,
            column,
            url,
            result: None,
        })
    }

    /// Attach the liveness outcome, consuming the unchecked match.
    pub fn complete(self, outcome: CheckOutcome) -> Self {
        debug_assert!(self.result.is_none(), "match completed twice");
        Self {
            result: Some(outcome),
            ..self
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn result(&self) -> Option<&CheckOutcome> {
        self.result.as_ref()
    }

    pub fn is_checked(&self) -> bool {
        self.result.is_some()
    }
}

/// What the classifier decided about one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Scannable text and its full raw content
    Text(Vec<u8>),
    /// Binary, SCM internals, or otherwise not worth scanning
    NotText,
    Directory,
}

impl Classification {
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

/// A unit of work for the producers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A filesystem path that still needs classification
    Path(PathBuf),
    /// Raw content under a logical source name, e.g. `stdin`
    Text { name: String, text: Vec<u8> },
}

impl Input {
    /// Name used as `Match::source` for matches from this input.
    pub fn source_name(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Text { name, .. } => name.clone(),
        }
    }
}

impl From<PathBuf> for Input {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[test]
    fn test_match_new() {
        let m = Match::new("file1", 1, 0, "https://example.com").unwrap();

        assert_eq!(m.source(), "file1");
        assert_eq!(m.line(), 1);
        assert_eq!(m.column(), 0);
        assert_eq!(m.url(), "https://example.com");
        assert!(!m.is_checked());
    }

    #[test]
    fn test_match_new__validation() {
        assert_eq!(
            Match::new("file", 1, 0, ""),
            Err(MatchError::MissingUrl)
        );
        assert_eq!(
            Match::new("", 1, 0, "https://example.com"),
            Err(MatchError::MissingSource)
        );
        assert_eq!(
            Match::new("file", 0, 0, "https://example.com"),
            Err(MatchError::InvalidLineNumber)
        );
    }

    #[test]
    fn test_match_complete__keeps_location() {
        let m = Match::new("stdin", 4, 7, "https://example.com").unwrap();
        let checked = m.complete(CheckOutcome::Status {
            code: 200,
            text: "200 OK".to_string(),
        });

        assert_eq!(checked.source(), "stdin");
        assert_eq!(checked.line(), 4);
        assert_eq!(checked.column(), 7);
        assert_eq!(checked.result().map(CheckOutcome::as_str), Some("200 OK"));
    }

    #[test]
    fn test_check_outcome__is_success() {
        let ok = CheckOutcome::Status {
            code: 204,
            text: "204 No Content".to_string(),
        };
        let not_found = CheckOutcome::Status {
            code: 404,
            text: "404 Not Found".to_string(),
        };
        let error = CheckOutcome::Error("dns error".to_string());

        assert!(ok.is_success());
        assert!(!not_found.is_success());
        assert!(!error.is_success());
        assert_eq!(error.to_string(), "dns error");
    }

    #[test]
    fn test_match_error_display() {
        assert_eq!(
            MatchError::InvalidLineNumber.to_string(),
            "Line number must be greater than 0"
        );
        assert_eq!(
            MatchError::MissingSource.to_string(),
            "Source is required and cannot be empty"
        );
    }

    #[test]
    fn test_input_source_name() {
        let path = Input::from(PathBuf::from("docs/README.md"));
        let text = Input::Text {
            name: "stdin".to_string(),
            text: Vec::new(),
        };

        assert_eq!(path.source_name(), "docs/README.md");
        assert_eq!(text.source_name(), "stdin");
    }
}
