use crate::parser::error::Error;
use crate::parser::types::{KeyValuePair, SfzSection, SfzSectionType, Token, TokenKind};

/// Result type alias for parser functions
type Result<T> = std::result::Result<T, Error>;

/// Group a token stream into sections of key/value pairs
///
/// Each `<tag>` opens a section; every `key = value` triple that follows
/// belongs to it until the next tag.
///
/// # Errors
///
/// Will return an error if:
/// - A tag name is not a known section type
/// - An opcode appears before the first tag
/// - A key is not followed by `=` and a value
pub fn parse_tokens(tokens: &[Token]) -> Result<Vec<SfzSection>> {
    let mut sections: Vec<SfzSection> = Vec::new();
    let mut iter = tokens.iter().peekable();

    while let Some(token) = iter.next() {
        match &token.kind {
            TokenKind::Tag(name) => {
                let section_type = SfzSectionType::from_header(name).ok_or_else(|| {
                    Error::parse(format!("Unknown section type: {}", name), token.line)
                })?;
                sections.push(SfzSection::new(section_type, token.line));
            }
            TokenKind::Equal => {
                return Err(Error::parse("'=' without an opcode name", token.line));
            }
            TokenKind::Identifier(key) => {
                let section = sections.last_mut().ok_or_else(|| {
                    Error::parse(format!("opcode {} outside of any section", key), token.line)
                })?;

                match iter.next() {
                    Some(Token {
                        kind: TokenKind::Equal,
                        ..
                    }) => {}
                    _ => {
                        return Err(Error::parse(
                            format!("expected '=' after {}", key),
                            token.line,
                        ))
                    }
                }

                let value = match iter.peek().copied() {
                    Some(Token {
                        kind: TokenKind::Identifier(value),
                        ..
                    }) => value,
                    _ => {
                        return Err(Error::parse(
                            format!("missing value for {}", key),
                            token.line,
                        ))
                    }
                };
                iter.next();

                section.pairs.push(KeyValuePair {
                    key: key.clone(),
                    value: value.clone(),
                    line: token.line,
                });
            }
        }
    }

    Ok(sections)
}
