use std::fmt;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeErrorKind {
    /// A required argument was empty or otherwise unusable.
    InvalidArg,
    /// A media type string could not be parsed.
    Parse,
    NotFound,
    Io,
    Failed,
}

impl MimeErrorKind {
    fn describe(self) -> &'static str {
        match self {
            Self::InvalidArg => "invalid argument",
            Self::Parse => "parse error",
            Self::NotFound => "not found",
            Self::Io => "i/o error",
            Self::Failed => "failed",
        }
    }
}

/// Error returned by registration, the system database and the hierarchy.
#[derive(Debug)]
pub struct MimeError {
    kind: MimeErrorKind,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl MimeError {
    pub fn new(kind: MimeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        kind: MimeErrorKind,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self {
            source: Some(source),
            ..Self::new(kind, message)
        }
    }

    pub fn kind(&self) -> MimeErrorKind {
        self.kind
    }
}

impl fmt::Display for MimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.describe(), self.message)
    }
}

impl std::error::Error for MimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_deref().map(|e| e as &dyn std::error::Error)
    }
}

impl From<io::Error> for MimeError {
    fn from(err: io::Error) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::NotFound => MimeErrorKind::NotFound,
            io::ErrorKind::InvalidInput => MimeErrorKind::InvalidArg,
            io::ErrorKind::InvalidData => MimeErrorKind::Parse,
            _ => MimeErrorKind::Io,
        };
        let message = err.to_string();
        Self::with_source(kind, message, Box::new(err))
    }
}

pub type MimeResult<T> = Result<T, MimeError>;
