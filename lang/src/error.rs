use crate::vm::value::Value;
use std::fmt;

/// Category of a failure signalled by the runtime or the table library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A value had the wrong type (or lacked the hooks to act like one)
    Type,
    /// A positional argument violated its documented bounds
    Argument,
    /// A structural limit was exceeded or a callback failed
    Runtime,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Type => write!(f, "type error"),
            ErrorKind::Argument => write!(f, "argument error"),
            ErrorKind::Runtime => write!(f, "runtime error"),
        }
    }
}

/// Error raised while executing a native operation.
///
/// Every failure aborts the current operation; there is no local recovery
/// and no rollback of mutations already performed.
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    pub cause: Option<Box<RuntimeError>>,
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Runtime, message)
    }

    /// "bad argument #2 to 'insert' (position out of bounds)"
    pub fn bad_argument(position: usize, function: &str, extra: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::Argument,
            format!("bad argument #{position} to '{function}' ({extra})"),
        )
    }

    /// "bad argument #1 to 'sort' (table expected, got nil)"
    ///
    /// `got` is `None` when the argument was not supplied at all.
    pub fn type_mismatch(
        position: usize,
        function: &str,
        expected: &str,
        got: Option<&Value>,
    ) -> Self {
        let got = got.map_or("no value", Value::type_name);
        Self::new(
            ErrorKind::Type,
            format!("bad argument #{position} to '{function}' ({expected} expected, got {got})"),
        )
    }

    /// Wrap an error raised by a callback, keeping it reachable via `source()`
    pub fn wrap(self, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: Some(Box::new(self)),
        }
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}
