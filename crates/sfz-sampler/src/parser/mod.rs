//! SFZ front end
//!
//! Lexer, token grouping and the typed opcode schema.

mod diagnostics;
mod error;
mod lex;
mod parse;
mod types;
pub mod opcodes;
pub mod path_utils;

// Export main types
pub use diagnostics::SamplerErrorContext;
pub use error::Error;
pub use lex::{IncludeHandler, Lexer, DEFAULT_MAX_INCLUDE_DEPTH};
pub use parse::parse_tokens;
pub use types::{KeyValueList, KeyValuePair, SfzSection, SfzSectionType, Token, TokenKind};

pub use opcodes::{
    compile, key_text_to_type, CompiledOpcodes, DiscreteValue, Opcode, OpcodeType, Value,
};

pub type Result<T> = std::result::Result<T, Error>;

/// Lex instrument text; any `#include` fails
pub fn lex_str(content: &str) -> Result<Vec<Token>> {
    Lexer::new().lex(content)
}

/// Lex and group instrument text into sections
pub fn parse_sfz_str(content: &str) -> Result<Vec<SfzSection>> {
    let tokens = lex_str(content)?;
    parse_tokens(&tokens)
}
