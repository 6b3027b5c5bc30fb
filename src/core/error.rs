use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    Configuration,
    Transport,
    StaleSnapshot,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    service: Option<String>,
    expected_seqnum: Option<u64>,
    actual_seqnum: Option<u64>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            service: None,
            expected_seqnum: None,
            actual_seqnum: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }

    pub fn expected_seqnum(&self) -> Option<u64> {
        self.expected_seqnum
    }

    pub fn actual_seqnum(&self) -> Option<u64> {
        self.actual_seqnum
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_seqnums(mut self, expected: u64, actual: u64) -> Self {
        self.expected_seqnum = Some(expected);
        self.actual_seqnum = Some(actual);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(service) = &self.service {
            write!(f, " (service: {service})")?;
        }
        if let (Some(expected), Some(actual)) = (self.expected_seqnum, self.actual_seqnum) {
            write!(f, " (expected seqnum: {expected}, got: {actual})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::Configuration => 3,
        ErrorKind::Transport => 4,
        ErrorKind::StaleSnapshot => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, to_exit_code};
    use std::error::Error as StdError;

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Internal, 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::Configuration, 3),
            (ErrorKind::Transport, 4),
            (ErrorKind::StaleSnapshot, 5),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn display_includes_context() {
        let err = Error::new(ErrorKind::StaleSnapshot)
            .with_message("snapshot is stale")
            .with_service("com.example.Foo")
            .with_seqnums(8, 7);
        assert_eq!(
            err.to_string(),
            "StaleSnapshot: snapshot is stale (service: com.example.Foo) (expected seqnum: 8, got: 7)"
        );
    }

    #[test]
    fn source_is_chained() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "bus hung up");
        let err = Error::new(ErrorKind::Transport).with_source(io);
        let source = err.source().expect("source");
        assert_eq!(source.to_string(), "bus hung up");
    }
}
