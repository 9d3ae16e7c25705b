//! Error types for the execution-context identifier's slow path.
//!
//! Nothing else in this crate returns a recoverable error: memory transfer,
//! pointer extraction and pooling are precondition-based.

use std::num::ParseIntError;

/// A diagnostic description of the current execution unit could not be
/// turned into an identifier.
///
/// The resolver treats this as fatal: the host broke its contract and
/// there is no fallback for the identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextIdError {
    /// The description did not start with the expected unit label.
    #[error("description {description:?} does not start with {expected:?}")]
    MissingPrefix {
        /// The full description as produced by the host.
        description: String,
        /// The label the parser looked for.
        expected: &'static str,
    },
    /// The label was present but no identifier token followed it.
    #[error("description {0:?} has no identifier token")]
    MissingId(String),
    /// The identifier token is not a base-10 unsigned integer.
    #[error("identifier token {token:?} is not a number")]
    InvalidId {
        /// The offending token.
        token: String,
        /// Underlying integer parse failure.
        #[source]
        source: ParseIntError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = ContextIdError::MissingPrefix {
            description: "thread 4".into(),
            expected: "context ",
        };
        assert_eq!(
            err.to_string(),
            r#"description "thread 4" does not start with "context ""#
        );

        let err = ContextIdError::MissingId("context ".into());
        assert_eq!(err.to_string(), r#"description "context " has no identifier token"#);
    }

    #[test]
    fn invalid_id_keeps_source() {
        let source = "x1".parse::<u64>().unwrap_err();
        let err = ContextIdError::InvalidId {
            token: "x1".into(),
            source,
        };
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.to_string(), r#"identifier token "x1" is not a number"#);
    }
}
