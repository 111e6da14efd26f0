//! Error types for OpenDDL parsing.

use std::fmt;
use thiserror::Error;

/// Result type for OpenDDL parsing operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// A one-based line and column in the source text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Parse context carrying filename for error reporting.
#[derive(Clone, Debug, Default)]
pub struct ParseContext {
    pub filename: Option<String>,
}

impl ParseContext {
    /// Create a new parse context.
    pub fn new(filename: Option<&str>) -> Self {
        Self {
            filename: filename.map(String::from),
        }
    }

    /// Format a location suffix for error messages.
    pub fn loc_suffix(&self, pos: Position) -> String {
        match &self.filename {
            Some(name) => format!(" at {} of <{}>", pos, name),
            None => format!(" at {}", pos),
        }
    }
}

/// The grammar violation behind a [`ParseError`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A `/*` comment with no closing `*/`.
    #[error("Unterminated block comment")]
    UnterminatedComment,

    /// A string literal with no closing quote.
    #[error("Unterminated string")]
    UnterminatedString,

    /// A character literal with no closing quote.
    #[error("Unterminated character literal")]
    UnterminatedChar,

    /// Unknown or malformed backslash escape.
    #[error("Bad escape sequence \"{0}\"")]
    BadEscape(String),

    /// Text that looked like base64 but does not decode.
    #[error("Invalid base64 \"{0}\"")]
    InvalidBase64(String),

    /// A derived structure identifier from the reserved `[a-z][0-9]*` space.
    #[error("Illegal structure name \"{0}\"")]
    IllegalStructureName(String),

    /// Neither a data type nor an identifier where a structure must start.
    #[error("Structure expected, found {0}")]
    StructureExpected(String),

    /// A specific token was required.
    #[error("Expected \"{0}\", found {1}")]
    Expected(String, String),

    /// No literal grammar matched where a value must appear.
    #[error("Value expected, found {0}")]
    ValueExpected(String),

    /// A sigil or property slot with no identifier after it.
    #[error("Identifier expected, found {0}")]
    IdentifierExpected(String),

    /// `()` with nothing inside.
    #[error("Empty property list")]
    EmptyPropertyList,

    /// A decimal float too large for `f64` outside a float structure, where
    /// no bit-pattern spelling exists for the resulting infinity.
    #[error("Float literal \"{0}\" overflows")]
    FloatOverflow(String),

    /// Array size that is not a positive integer literal.
    #[error("Invalid array size {0}")]
    InvalidArraySize(String),

    /// Derived structures nested beyond the configured limit.
    #[error("Nesting deeper than {0} structures")]
    NestingTooDeep(usize),
}

impl ErrorKind {
    /// Attach a source location.
    pub fn at(self, ctx: &ParseContext, pos: Position) -> ParseError {
        ParseError {
            location: ctx.loc_suffix(pos),
            kind: self,
            line: pos.line,
            column: pos.column,
        }
    }
}

/// A fatal parse error. Parsing of the document stops at the first one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}{location}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub line: usize,
    pub column: usize,
    location: String,
}

impl ParseError {
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// The message without location information.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

/// Describe the upcoming text for an error message.
pub(crate) fn describe(rest: &str) -> String {
    match rest.chars().next() {
        None => "end of input".to_string(),
        Some(c) if c.is_whitespace() => format!("{:?}", c),
        Some(c) => format!("\"{}\"", c),
    }
}
