use thiserror::Error;

/// Errors that can occur while compiling an instrument definition
///
/// Only hard failures surface through this type. Unknown opcodes and values
/// that fail conversion are soft skips: they are logged, recorded in the
/// [`SamplerErrorContext`](crate::parser::SamplerErrorContext) and otherwise
/// ignored. A voice player query never produces an error at all.
#[derive(Error, Debug)]
pub enum Error {
    /// Hard lexer failure
    ///
    /// The whole instrument definition must be rejected. Typical causes:
    /// - Whitespace or a nested `<` inside a `<tag>`
    /// - A tag left open at the end of the input
    /// - A malformed `#include` directive, or a failing include handler
    #[error("{message} at line {line}")]
    Lex {
        /// What went wrong
        message: String,
        /// Line number where the error occurred (1-based)
        line: usize,
    },

    /// The token stream does not form `<tag>` sections of `key=value` pairs
    #[error("Parse error at line {line}: {message}")]
    Parse {
        /// What went wrong
        message: String,
        /// Line number where the error occurred (1-based)
        line: usize,
    },

    /// A region compiled but its values are inconsistent
    ///
    /// For example `lokey=60 hikey=40`, or a velocity outside 0..=127.
    #[error("Invalid region at line {line}: {message}")]
    InvalidRegion {
        /// What went wrong
        message: String,
        /// Line of the `<region>` tag (1-based)
        line: usize,
    },

    /// A candidate was added to a voice player after `finalize()`
    #[error("Voice player is already finalized")]
    AlreadyFinalized,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Build a lexer error from a 0-based line counter.
    pub(crate) fn lex(message: impl Into<String>, zero_based_line: usize) -> Self {
        Error::Lex {
            message: message.into(),
            line: zero_based_line + 1,
        }
    }

    /// Build a parse error from a 0-based token line.
    pub(crate) fn parse(message: impl Into<String>, zero_based_line: usize) -> Self {
        Error::Parse {
            message: message.into(),
            line: zero_based_line + 1,
        }
    }
}
