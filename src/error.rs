//! Application error type.
//!
//! Every fallible operation returns `AppError`. The `kind` decides the process
//! exit code and lets callers tell a transport failure from a malformed payload
//! without string matching.

/// Broad failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid CLI/env configuration or a concurrent run holding the lock.
    Config,
    /// Connection failure or non-2xx HTTP status.
    Transport,
    /// Malformed payload: bad date suffix, non-numeric tenor, missing table row.
    Parse,
    /// Reading or writing a cache entry failed.
    Cache,
    /// Saving or opening the workbook failed.
    Output,
    /// Reading or writing a single cell failed.
    Cell,
}

impl ErrorKind {
    fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Config => 2,
            ErrorKind::Transport => 3,
            ErrorKind::Parse => 4,
            ErrorKind::Cache => 5,
            ErrorKind::Output => 6,
            ErrorKind::Cell => 7,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cache, message)
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Output, message)
    }

    pub fn cell(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cell, message)
    }

    /// Prefix the message with where the failure happened (a date, URL or path).
    pub fn context(self, ctx: impl std::fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_keeps_kind_and_prefixes_message() {
        let err = AppError::parse("invalid date format").context("2022-02-01");
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.to_string(), "2022-02-01: invalid date format");
        assert_eq!(err.exit_code(), 4);
    }
}
