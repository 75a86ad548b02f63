use std::fmt::{Display, Formatter};

/// Classification of upstream acquisition failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// The upstream call did not complete within its per-call timeout.
    Timeout,
    /// The upstream answered with a non-success HTTP status.
    HttpStatus,
    /// The payload's status marker was not "OK" or a required field array
    /// was absent or undecodable.
    BadShape,
    /// No upstream candidate produced data; all fan-out calls failed.
    Unavailable,
    /// Every fallback attempt failed. Terminal; callers must not retry.
    Exhausted,
    /// A per-symbol resource is absent from the upstream directory.
    SymbolNotFound,
    Internal,
}

/// Structured error used across the acquisition pipeline and the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Timeout,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn http_status(status: u16) -> Self {
        Self {
            kind: SourceErrorKind::HttpStatus,
            message: format!("upstream responded with HTTP {status}"),
            retryable: status >= 500,
        }
    }

    pub fn bad_shape(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::BadShape,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn exhausted(attempts: u32) -> Self {
        Self {
            kind: SourceErrorKind::Exhausted,
            message: format!("no upstream returned valid data after {attempts} attempt(s)"),
            retryable: false,
        }
    }

    pub fn symbol_not_found(symbol: &str) -> Self {
        Self {
            kind: SourceErrorKind::SymbolNotFound,
            message: format!("symbol '{symbol}' is not present in the upstream directory"),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Timeout => "source.timeout",
            SourceErrorKind::HttpStatus => "source.http_status",
            SourceErrorKind::BadShape => "source.bad_shape",
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::Exhausted => "source.exhausted",
            SourceErrorKind::SymbolNotFound => "source.symbol_not_found",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_side_http_errors_are_retryable() {
        assert!(SourceError::http_status(503).retryable());
        assert!(!SourceError::http_status(404).retryable());
    }

    #[test]
    fn exhausted_is_terminal() {
        let error = SourceError::exhausted(5);
        assert_eq!(error.kind(), SourceErrorKind::Exhausted);
        assert!(!error.retryable());
        assert_eq!(error.code(), "source.exhausted");
    }
}
