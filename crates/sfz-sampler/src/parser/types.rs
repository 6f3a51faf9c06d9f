use std::fmt;

/// One lexical item of an instrument definition
///
/// Every token remembers the 0-based source line it ended on so later stages
/// can point diagnostics back at the text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What kind of token this is, with its text
    pub kind: TokenKind,
    /// 0-based line number
    pub line: usize,
}

/// The three token shapes produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A `<name>` marker, holding the name without brackets
    Tag(String),
    /// An opcode key or an opcode value
    Identifier(String),
    /// The `=` between a key and its value
    Equal,
}

impl Token {
    pub fn tag(name: impl Into<String>, line: usize) -> Self {
        Self {
            kind: TokenKind::Tag(name.into()),
            line,
        }
    }

    pub fn identifier(text: impl Into<String>, line: usize) -> Self {
        Self {
            kind: TokenKind::Identifier(text.into()),
            line,
        }
    }

    pub fn equal(line: usize) -> Self {
        Self {
            kind: TokenKind::Equal,
            line,
        }
    }

    /// The identifier text, if this is an identifier
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Identifier(text) => Some(text),
            _ => None,
        }
    }

    /// The tag name, if this is a tag
    pub fn as_tag(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Tag(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenKind::Tag(name) => write!(f, "#{} tag={}", self.line, name),
            TokenKind::Identifier(text) => write!(f, "#{} id={}", self.line, text),
            TokenKind::Equal => write!(f, "#{} Equal", self.line),
        }
    }
}

/// A raw `key=value` opcode assignment, before type conversion
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValuePair {
    pub key: String,
    pub value: String,
    /// 0-based line of the key
    pub line: usize,
}

impl KeyValuePair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            line: 0,
        }
    }
}

/// The per-section list of opcode assignments, in source order
pub type KeyValueList = Vec<KeyValuePair>;

/// Types of SFZ sections
///
/// Sections are delimited by angle brackets, like `<region>`, and contain
/// `parameter=value` pairs. Parameters cascade from `<global>` through
/// `<master>` and `<group>` down to each `<region>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SfzSectionType {
    /// Settings applied to all regions
    Global,
    /// Instrument-wide settings such as `default_path`
    Control,
    /// Settings applied to the groups that follow
    Master,
    /// Settings applied to the regions that follow
    Group,
    /// A single playable sample zone
    Region,
    /// A response curve definition
    Curve,
    /// An effect definition
    Effect,
}

impl SfzSectionType {
    /// Returns the section type for a tag name (without angle brackets)
    pub fn from_header(header: &str) -> Option<Self> {
        match header.to_lowercase().as_str() {
            "global" => Some(Self::Global),
            "control" => Some(Self::Control),
            "master" => Some(Self::Master),
            "group" => Some(Self::Group),
            "region" => Some(Self::Region),
            "curve" => Some(Self::Curve),
            "effect" => Some(Self::Effect),
            _ => None,
        }
    }

    /// Returns the section header as it appears in a file, e.g. `<region>`
    pub fn header_str(&self) -> &'static str {
        match self {
            Self::Global => "<global>",
            Self::Control => "<control>",
            Self::Master => "<master>",
            Self::Group => "<group>",
            Self::Region => "<region>",
            Self::Curve => "<curve>",
            Self::Effect => "<effect>",
        }
    }
}

/// One `<tag>` section and the opcode assignments that follow it
#[derive(Debug, Clone, PartialEq)]
pub struct SfzSection {
    pub section_type: SfzSectionType,
    /// 0-based line of the opening tag
    pub line: usize,
    pub pairs: KeyValueList,
}

impl SfzSection {
    pub fn new(section_type: SfzSectionType, line: usize) -> Self {
        Self {
            section_type,
            line,
            pairs: Vec::new(),
        }
    }

    /// Gets the raw value of the last assignment to `key`, if any
    pub fn get_opcode_str(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|pair| pair.key == key)
            .map(|pair| pair.value.as_str())
    }
}
