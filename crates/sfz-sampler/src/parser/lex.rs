//! Character-level lexer for instrument definitions
//!
//! Turns text into `<tag>`, identifier and `=` tokens. Identifier termination
//! depends on the schema: after a key whose opcode is string-typed (such as
//! `sample`), whitespace no longer ends the identifier, so sample paths may
//! contain spaces. An `=` arriving in that mode is split back out: the text
//! after the last whitespace run becomes the next key.

use crate::parser::error::Error;
use crate::parser::opcodes::{key_text_to_type, OpcodeType};
use crate::parser::types::Token;

type Result<T> = std::result::Result<T, Error>;

const INCLUDE: &str = "include";

/// Default limit for nested `#include` directives
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 8;

/// Callback resolving an `#include "file"` directive
///
/// It receives the file name without quotes and returns the text to lex in
/// place of the directive. Reading the file is up to the caller.
pub type IncludeHandler<'a> = &'a mut dyn FnMut(&str) -> anyhow::Result<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ready,
    InTag,
    InComment,
    InInclude(IncludeState),
    InIdentifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IncludeState {
    MatchingOpcode,
    MatchingSpace,
    MatchingFileName,
}

/// Single-use lexer
///
/// ```
/// use sfz_sampler::parser::Lexer;
///
/// let tokens = Lexer::new().lex("<region>sample=piano C4.wav key=60").unwrap();
/// assert_eq!(tokens.len(), 7);
/// ```
pub struct Lexer<'h> {
    tokens: Vec<Token>,
    state: State,
    current: String,
    current_line: usize,
    space_count: usize,
    last_identifier_type: OpcodeType,
    include_handler: Option<IncludeHandler<'h>>,
    include_depth: usize,
    max_include_depth: usize,
}

impl Default for Lexer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'h> Lexer<'h> {
    /// A lexer that rejects `#include`
    pub fn new() -> Self {
        Self {
            tokens: Vec::new(),
            state: State::Ready,
            current: String::new(),
            current_line: 0,
            space_count: 0,
            last_identifier_type: OpcodeType::Unknown,
            include_handler: None,
            include_depth: 0,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }

    /// A lexer that resolves `#include` through `handler`
    pub fn with_include_handler(handler: IncludeHandler<'h>) -> Self {
        Self {
            include_handler: Some(handler),
            ..Self::new()
        }
    }

    pub fn max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// Lex `content` into tokens, or fail as a whole
    pub fn lex(mut self, content: &str) -> Result<Vec<Token>> {
        self.process(content)?;
        log::debug!("lexed {} tokens", self.tokens.len());
        Ok(self.tokens)
    }

    fn process(&mut self, content: &str) -> Result<()> {
        for c in content.chars() {
            if c == '\n' {
                self.current_line += 1;
            }
            self.proc_next_char(c)?;
        }
        self.proc_end()
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T> {
        Err(Error::lex(message, self.current_line))
    }

    fn proc_next_char(&mut self, c: char) -> Result<()> {
        match self.state {
            State::Ready => self.proc_fresh_char(c),
            State::InTag => self.proc_tag_char(c),
            State::InComment => {
                if c == '\n' || c == '\r' {
                    self.state = State::Ready;
                }
                Ok(())
            }
            State::InInclude(sub_state) => self.proc_include_char(sub_state, c),
            State::InIdentifier => self.proc_identifier_char(c),
        }
    }

    fn proc_fresh_char(&mut self, c: char) -> Result<()> {
        if c.is_ascii_whitespace() {
            return Ok(());
        }
        match c {
            '<' => {
                self.current.clear();
                self.state = State::InTag;
            }
            '/' => self.state = State::InComment,
            '=' => self.tokens.push(Token::equal(self.current_line)),
            '#' => {
                self.current.clear();
                self.state = State::InInclude(IncludeState::MatchingOpcode);
            }
            _ => {
                self.current.clear();
                self.current.push(c);
                self.state = State::InIdentifier;
            }
        }
        Ok(())
    }

    fn proc_tag_char(&mut self, c: char) -> Result<()> {
        if c.is_ascii_whitespace() {
            return self.error("whitespace in tag");
        }
        match c {
            '<' => self.error("nested tag"),
            '>' => {
                let name = std::mem::take(&mut self.current);
                self.tokens.push(Token::tag(name, self.current_line));
                self.state = State::Ready;
                Ok(())
            }
            _ => {
                self.current.push(c);
                Ok(())
            }
        }
    }

    fn proc_identifier_char(&mut self, c: char) -> Result<()> {
        if c == '=' {
            return self.proc_equals_in_identifier();
        }

        // terminate, then let Ready see the same character
        if c == '<' || c == '\n' {
            self.complete_identifier();
            self.state = State::Ready;
            return self.proc_fresh_char(c);
        }

        // values of string opcodes may contain spaces
        if c.is_ascii_whitespace() && self.last_identifier_type != OpcodeType::String {
            self.complete_identifier();
            self.state = State::Ready;
            return Ok(());
        }

        self.current.push(c);
        Ok(())
    }

    fn proc_equals_in_identifier(&mut self) -> Result<()> {
        if self.last_identifier_type == OpcodeType::String {
            // "my sample.wav  lokey" -> "my sample.wav", "lokey"
            let text = std::mem::take(&mut self.current);
            let text = text.trim_end();
            let Some(split) = text.rfind(|c: char| c.is_ascii_whitespace()) else {
                return self.error("equals sign in identifier");
            };
            let file_name = text[..split].trim_end().to_string();
            let next_key = text[split + 1..].to_string();
            self.push_identifier(file_name);
            self.push_identifier(next_key);
        } else {
            self.complete_identifier();
        }
        self.state = State::Ready;
        self.proc_fresh_char('=')
    }

    fn proc_include_char(&mut self, sub_state: IncludeState, c: char) -> Result<()> {
        match sub_state {
            IncludeState::MatchingOpcode => {
                self.current.push(c);
                if !INCLUDE.starts_with(self.current.as_str()) {
                    return self.error("Malformed #include");
                }
                if self.current == INCLUDE {
                    self.current.clear();
                    self.space_count = 0;
                    self.state = State::InInclude(IncludeState::MatchingSpace);
                }
                Ok(())
            }
            IncludeState::MatchingSpace => {
                if c.is_ascii_whitespace() {
                    self.space_count += 1;
                    return Ok(());
                }
                if self.space_count == 0 {
                    return self.error("Malformed #include");
                }
                self.current.clear();
                self.current.push(c);
                self.state = State::InInclude(IncludeState::MatchingFileName);
                Ok(())
            }
            IncludeState::MatchingFileName => {
                if c == '\n' {
                    return self.error("unterminated #include file name");
                }
                self.current.push(c);
                if c == '"' && self.current.len() > 1 {
                    let quoted = std::mem::take(&mut self.current);
                    self.state = State::Ready;
                    return self.handle_include(quoted.trim_matches('"'));
                }
                Ok(())
            }
        }
    }

    fn handle_include(&mut self, file_name: &str) -> Result<()> {
        if self.include_depth >= self.max_include_depth {
            return self.error(format!(
                "#include of {} nested deeper than {}",
                file_name, self.max_include_depth
            ));
        }

        let line = self.current_line;
        let content = match self.include_handler.as_deref_mut() {
            Some(handler) => handler(file_name).map_err(|e| {
                Error::lex(format!("can't include {}: {:#}", file_name, e), line)
            })?,
            None => return Err(Error::lex("can't process include file", line)),
        };
        log::debug!("including {} at depth {}", file_name, self.include_depth + 1);

        // lex the included text in place, with its own line numbers
        self.current_line = 0;
        self.include_depth += 1;
        let result = self.process(&content);
        self.include_depth -= 1;
        self.current_line = line;
        self.current.clear();
        self.state = State::Ready;

        result.map_err(|e| match e {
            Error::Lex { message, line } => Error::Lex {
                message: format!("{} in {}", message, file_name),
                line,
            },
            other => other,
        })
    }

    fn proc_end(&mut self) -> Result<()> {
        match self.state {
            State::InIdentifier => {
                self.complete_identifier();
                self.state = State::Ready;
                Ok(())
            }
            State::InTag => self.error("unterminated tag"),
            _ => Ok(()),
        }
    }

    fn complete_identifier(&mut self) {
        let text = std::mem::take(&mut self.current);
        let trimmed = text.trim_end();
        if trimmed.len() == text.len() {
            self.push_identifier(text);
        } else {
            self.push_identifier(trimmed.to_string());
        }
    }

    fn push_identifier(&mut self, text: String) {
        self.last_identifier_type = key_text_to_type(&text);
        self.tokens.push(Token::identifier(text, self.current_line));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::types::TokenKind;

    fn count(tokens: &[Token]) -> (usize, usize, usize) {
        let tags = tokens.iter().filter(|t| t.as_tag().is_some()).count();
        let ids = tokens.iter().filter(|t| t.as_identifier().is_some()).count();
        let equals = tokens.iter().filter(|t| t.kind == TokenKind::Equal).count();
        (tags, ids, equals)
    }

    fn identifiers(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().filter_map(Token::as_identifier).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(Lexer::new().lex("").unwrap().is_empty());
        assert!(Lexer::new().lex("  \n\t ").unwrap().is_empty());
    }

    #[test]
    fn test_single_tag() {
        let tokens = Lexer::new().lex("<region>").unwrap();
        assert_eq!(tokens, vec![Token::tag("region", 0)]);
    }

    #[test]
    fn test_region_on_one_line() {
        let tokens = Lexer::new()
            .lex("<region>sample=a lorand=0 hirand=1")
            .unwrap();
        assert_eq!(count(&tokens), (1, 6, 3));
        assert_eq!(
            identifiers(&tokens),
            vec!["sample", "a", "lorand", "0", "hirand", "1"]
        );
    }

    #[test]
    fn test_comments_and_lines() {
        let content = "// a comment\n<group>\nlovel=1 hivel=64\n<region> key=c4 sample=piano C4.wav\n";
        let tokens = Lexer::new().lex(content).unwrap();
        assert_eq!(count(&tokens), (2, 8, 4));
        assert_eq!(
            identifiers(&tokens),
            vec!["lovel", "1", "hivel", "64", "key", "c4", "sample", "piano C4.wav"]
        );
        assert_eq!(tokens[0], Token::tag("group", 1));
        assert_eq!(tokens[1], Token::identifier("lovel", 2));
    }

    #[test]
    fn test_space_in_sample_followed_by_opcode() {
        let tokens = Lexer::new()
            .lex("<region>sample=my sample.wav   lokey=3 hikey=5")
            .unwrap();
        assert_eq!(
            identifiers(&tokens),
            vec!["sample", "my sample.wav", "lokey", "3", "hikey", "5"]
        );
        assert_eq!(count(&tokens), (1, 6, 3));
    }

    #[test]
    fn test_sample_then_tag_on_same_line() {
        let tokens = Lexer::new()
            .lex("<region>sample=a.wav <region>sample=b.wav\r\n")
            .unwrap();
        assert_eq!(identifiers(&tokens), vec!["sample", "a.wav", "sample", "b.wav"]);
        assert_eq!(count(&tokens), (2, 4, 2));
    }

    #[test]
    fn test_equals_inside_sample_without_space_fails() {
        let err = Lexer::new().lex("<region>sample=a=b.wav").unwrap_err();
        assert_eq!(err.to_string(), "equals sign in identifier at line 1");
    }

    #[test]
    fn test_unterminated_tag_fails() {
        let err = Lexer::new().lex("<region>key=60\n<regi").unwrap_err();
        assert_eq!(err.to_string(), "unterminated tag at line 2");
    }

    #[test]
    fn test_bad_tags_fail() {
        assert!(Lexer::new().lex("<reg ion>").is_err());
        assert!(Lexer::new().lex("<<region>").is_err());
        assert!(Lexer::new().lex("<region\n>").is_err());
    }

    #[test]
    fn test_malformed_include_fails() {
        assert!(Lexer::new().lex("#inclxde \"a.sfz\"").is_err());
        assert!(Lexer::new().lex("#include\"a.sfz\"").is_err());
        assert!(Lexer::new().lex("#include \"a.sfz\n\"").is_err());
    }

    #[test]
    fn test_include_without_handler_fails() {
        let err = Lexer::new().lex("\n#include \"a.sfz\"").unwrap_err();
        assert_eq!(err.to_string(), "can't process include file at line 2");
    }

    #[test]
    fn test_include_with_handler() {
        let mut requested = Vec::new();
        let mut handler = |name: &str| -> anyhow::Result<String> {
            requested.push(name.to_string());
            Ok("<region>sample=x.wav".to_string())
        };
        let tokens = Lexer::with_include_handler(&mut handler)
            .lex("#include \"inc.sfz\"\n<region>key=60")
            .unwrap();
        assert_eq!(count(&tokens), (2, 4, 2));
        assert_eq!(identifiers(&tokens), vec!["sample", "x.wav", "key", "60"]);
        assert_eq!(tokens[4], Token::tag("region", 1));
        assert_eq!(requested, vec!["inc.sfz".to_string()]);
    }

    #[test]
    fn test_include_handler_error_fails() {
        let mut handler =
            |name: &str| -> anyhow::Result<String> { anyhow::bail!("no such file {}", name) };
        let err = Lexer::with_include_handler(&mut handler)
            .lex("#include \"gone.sfz\"")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "can't include gone.sfz: no such file gone.sfz at line 1"
        );
    }

    #[test]
    fn test_recursive_include_is_bounded() {
        let mut handler =
            |_: &str| -> anyhow::Result<String> { Ok("#include \"self.sfz\"".to_string()) };
        let result = Lexer::with_include_handler(&mut handler)
            .max_include_depth(3)
            .lex("#include \"self.sfz\"");
        assert!(matches!(result, Err(Error::Lex { .. })));
    }

    #[test]
    fn test_final_identifier_is_flushed() {
        let tokens = Lexer::new().lex("<region>key=60").unwrap();
        assert_eq!(tokens.last(), Some(&Token::identifier("60", 0)));
    }
}
