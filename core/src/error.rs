//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// An anchor or record pattern failed to compile.
    #[display("Pattern Error: {_0}")]
    Pattern(regex::Error),

    /// The patch plan could not be parsed.
    #[display("Config Error: {_0}")]
    Config(serde_yaml::Error),

    /// A required anchor (pattern or record field) is absent from the document.
    #[from(ignore)]
    #[display("Anchor not found: {anchor}")]
    AnchorNotFound {
        /// Description of the anchor that was looked up.
        anchor: String,
    },

    /// An anchor matched more often than the operation allows.
    #[from(ignore)]
    #[display("Ambiguous anchor '{anchor}': {found} matches, at most {max} allowed")]
    AmbiguousMatch {
        /// Description of the anchor.
        anchor: String,
        /// Number of matches found.
        found: usize,
        /// Declared maximum.
        max: usize,
    },

    /// A template references an unknown placeholder or is structurally broken.
    #[from(ignore)]
    #[display("Malformed template '{template}': {reason}")]
    MalformedTemplate {
        /// Shortened template text.
        template: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A record literal could not be parsed.
    #[from(ignore)]
    #[display("Invalid record literal: {_0}")]
    InvalidRecord(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Io(e) => Some(e),
            AppError::Pattern(e) => Some(e),
            AppError::Config(e) => Some(e),
            _ => None,
        }
    }
}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_conversion() {
        let io_err = Error::new(ErrorKind::Other, "test");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_string_conversion() {
        let msg = String::from("something wrong");
        let app_err: AppError = msg.into();
        match app_err {
            AppError::General(s) => assert_eq!(s, "something wrong"),
            _ => panic!("String should convert to AppError::General"),
        }
    }

    #[test]
    fn test_ambiguous_display() {
        let err = AppError::AmbiguousMatch {
            anchor: "ncf-block".into(),
            found: 3,
            max: 1,
        };
        assert_eq!(
            err.to_string(),
            "Ambiguous anchor 'ncf-block': 3 matches, at most 1 allowed"
        );
    }

    #[test]
    fn test_regex_conversion_keeps_source() {
        let err: AppError = regex::Regex::new("(").unwrap_err().into();
        assert!(matches!(err, AppError::Pattern(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
