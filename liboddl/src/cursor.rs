//! Source cursor.
//!
//! The cursor owns the source text, the current byte offset, and the current
//! line number. It skips whitespace and comments, offers prefix matching, and
//! turns offsets into one-based line/column positions for diagnostics.
//! Advisories found while scanning are logged and collected here so the
//! parser can hand them to the finished document.

use tracing::warn;

use crate::error::{describe, ErrorKind, ParseContext, ParseError, Position, Result};
use crate::lint::{Diagnostic, DiagnosticKind};

/// A saved cursor state for bounded lookahead.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Mark {
    offset: usize,
    line: usize,
    warnings: usize,
}

pub(crate) struct Cursor<'a> {
    src: &'a str,
    offset: usize,
    line: usize,
    ctx: ParseContext,
    warnings: Vec<Diagnostic>,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(src: &'a str, ctx: ParseContext) -> Self {
        Self {
            src,
            offset: 0,
            line: 1,
            ctx,
            warnings: Vec::new(),
        }
    }

    /// The unconsumed remainder of the source.
    pub(crate) fn rest(&self) -> &'a str {
        &self.src[self.offset..]
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.offset >= self.src.len()
    }

    /// Consume `len` bytes, counting the newlines crossed.
    pub(crate) fn advance(&mut self, len: usize) {
        let end = (self.offset + len).min(self.src.len());
        self.line += self.src[self.offset..end].matches('\n').count();
        self.offset = end;
    }

    /// Consume `literal` if the remainder starts with it.
    pub(crate) fn eat(&mut self, literal: &str) -> bool {
        if self.rest().starts_with(literal) {
            self.advance(literal.len());
            true
        } else {
            false
        }
    }

    /// Skip whitespace, `//` comments, and `/* */` comments.
    pub(crate) fn skip_trivia(&mut self) -> Result<()> {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            if trimmed.len() != rest.len() {
                self.advance(rest.len() - trimmed.len());
                continue;
            }
            if rest.starts_with("//") {
                match rest.find('\n') {
                    Some(i) => self.advance(i + 1),
                    None => {
                        self.warn(
                            0,
                            DiagnosticKind::CommentWithoutNewline,
                            "comment has no trailing newline".to_string(),
                        );
                        self.advance(rest.len());
                    }
                }
                continue;
            }
            if rest.starts_with("/*") {
                match rest[2..].find("*/") {
                    Some(i) => self.advance(i + 4),
                    None => return Err(self.error(ErrorKind::UnterminatedComment)),
                }
                continue;
            }
            return Ok(());
        }
    }

    /// Skip trivia, then require `literal`.
    pub(crate) fn expect(&mut self, literal: &str) -> Result<()> {
        self.skip_trivia()?;
        if self.eat(literal) {
            Ok(())
        } else {
            Err(self.error(ErrorKind::Expected(
                literal.to_string(),
                describe(self.rest()),
            )))
        }
    }

    pub(crate) fn position(&self) -> Position {
        self.position_ahead(0)
    }

    /// Position of the byte `ahead` bytes past the cursor.
    pub(crate) fn position_ahead(&self, ahead: usize) -> Position {
        let offset = (self.offset + ahead).min(self.src.len());
        let line = self.line + self.src[self.offset..offset].matches('\n').count();
        let line_start = self.src[..offset].rfind('\n').map_or(0, |i| i + 1);
        let column = self.src[line_start..offset].chars().count() + 1;
        Position::new(line, column)
    }

    pub(crate) fn error(&self, kind: ErrorKind) -> ParseError {
        kind.at(&self.ctx, self.position())
    }

    pub(crate) fn error_ahead(&self, kind: ErrorKind, ahead: usize) -> ParseError {
        kind.at(&self.ctx, self.position_ahead(ahead))
    }

    /// Record an advisory and emit it to the log.
    pub(crate) fn warn(&mut self, ahead: usize, kind: DiagnosticKind, message: String) {
        let pos = self.position_ahead(ahead);
        match &self.ctx.filename {
            Some(file) => warn!(file = %file, line = pos.line, column = pos.column, "{}", message),
            None => warn!(line = pos.line, column = pos.column, "{}", message),
        }
        self.warnings.push(Diagnostic::warning(kind, message, pos));
    }

    pub(crate) fn mark(&self) -> Mark {
        Mark {
            offset: self.offset,
            line: self.line,
            warnings: self.warnings.len(),
        }
    }

    pub(crate) fn reset(&mut self, mark: Mark) {
        self.offset = mark.offset;
        self.line = mark.line;
        self.warnings.truncate(mark.warnings);
    }

    pub(crate) fn into_warnings(self) -> Vec<Diagnostic> {
        self.warnings
    }
}
