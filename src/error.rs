//! Top-level error and failure classification for a resolve-then-request invocation.

use crate::metadata::ResolutionError;
use thiserror::Error;

/// Errors that abort an invocation before any network activity.
///
/// Failures of the request itself are not represented here: they are reported through
/// [`Outcome::RequestFailed`](crate::get::Outcome::RequestFailed) and do not abort.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A required argument was missing or malformed.
    #[error("{0}")]
    Argument(String),

    /// The trust registry could not resolve the entity to a server.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

impl Error {
    /// Returns the failure kind used by the exit policy.
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Argument(_) => FailureKind::Argument,
            Error::Resolution(_) => FailureKind::Resolution,
        }
    }
}

/// Coarse classification of everything that can go wrong in one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Missing or invalid command-line options.
    Argument,
    /// Metadata unreadable, entity unknown, or no server matching the tags.
    Resolution,
    /// Connection, TLS handshake, certificate or pin failure during the GET.
    Request,
}

impl FailureKind {
    /// Process exit code for this kind when exit codes reflect failures.
    pub const fn exit_code(self) -> u8 {
        match self {
            FailureKind::Argument => 2,
            FailureKind::Resolution => 3,
            FailureKind::Request => 4,
        }
    }
}

/// Renders an error and its `source()` chain as one line, causes joined by `": "`.
///
/// Duplicated adjacent messages (a wrapper that displays its source verbatim) are collapsed.
pub fn render_chain(err: &dyn std::error::Error) -> String {
    let mut parts: Vec<String> = vec![err.to_string()];
    let mut source = err.source();

    while let Some(cause) = source {
        let text = cause.to_string();
        if parts.last().map_or(true, |last| !last.contains(&text)) {
            parts.push(text);
        }
        source = cause.source();
    }

    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Layer {
        msg: &'static str,
        inner: Option<Box<Layer>>,
    }

    impl fmt::Display for Layer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.msg)
        }
    }

    impl std::error::Error for Layer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            self.inner
                .as_deref()
                .map(|e| e as &(dyn std::error::Error + 'static))
        }
    }

    #[test]
    fn test_render_chain_joins_causes() {
        let err = Layer {
            msg: "error sending request",
            inner: Some(Box::new(Layer {
                msg: "connection refused",
                inner: None,
            })),
        };

        assert_eq!(render_chain(&err), "error sending request: connection refused");
    }

    #[test]
    fn test_render_chain_collapses_repeated_message() {
        let err = Layer {
            msg: "handshake failed: bad pin",
            inner: Some(Box::new(Layer {
                msg: "bad pin",
                inner: None,
            })),
        };

        assert_eq!(render_chain(&err), "handshake failed: bad pin");
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            FailureKind::Argument.exit_code(),
            FailureKind::Resolution.exit_code(),
            FailureKind::Request.exit_code(),
        ];

        assert!(codes.iter().all(|c| *c != 0));
        assert_ne!(codes[0], codes[1]);
        assert_ne!(codes[1], codes[2]);
        assert_ne!(codes[0], codes[2]);
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(
            Error::Argument("missing --entity".into()).kind(),
            FailureKind::Argument
        );
        assert_eq!(
            Error::Resolution(ResolutionError::EntityNotFound("E9".into())).kind(),
            FailureKind::Resolution
        );
    }
}
