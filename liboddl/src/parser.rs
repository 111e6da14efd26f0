//! Structure parser.
//!
//! Recursive descent over the cursor. Each structure is resolved to a
//! primitive or derived structure from its first token and parsed strictly
//! left to right; nested calls receive their nesting depth by value and
//! return their structure to the caller, which appends it to its own list.
//!
//! Literal values are parsed by trying an ordered list of candidate grammars.
//! A candidate only wins when its match runs up to a list delimiter, so a
//! shorter grammar cannot steal the prefix of a longer token (the data type
//! `f` versus the base64 text `face`).

use num_traits::ToPrimitive;
use tracing::debug;

use crate::cursor::Cursor;
use crate::datatype::DataType;
use crate::document::{
    DerivedStructure, Document, PrimitiveData, PrimitiveStructure, Property, Structure,
};
use crate::error::{describe, ErrorKind, ParseContext, Position, Result};
use crate::literal::{self, Numeral, Recognized};
use crate::options::ParseOptions;
use crate::value::{Literal, Name};

/// One literal grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grammar {
    String,
    Bool,
    Reference,
    Type,
    Number,
    Base64,
}

/// Candidate order for values whose type is not known in advance.
const UNTYPED: [Grammar; 6] = [
    Grammar::String,
    Grammar::Bool,
    Grammar::Reference,
    Grammar::Type,
    Grammar::Number,
    Grammar::Base64,
];

impl Grammar {
    fn of(data_type: DataType) -> Grammar {
        match data_type {
            DataType::Bool => Grammar::Bool,
            DataType::String => Grammar::String,
            DataType::Ref => Grammar::Reference,
            DataType::Type => Grammar::Type,
            DataType::Base64 => Grammar::Base64,
            _ => Grammar::Number,
        }
    }
}

/// Candidate order for a value: the declared type's own grammar first, then
/// the untyped order, so a mistyped value is still read and left for the
/// linter to report.
fn candidates(data_type: Option<DataType>) -> impl Iterator<Item = Grammar> {
    let own = data_type.map(Grammar::of);
    own.into_iter()
        .chain(UNTYPED.into_iter().filter(move |&g| Some(g) != own))
}

/// Give an untyped numeral the type of its structure. In float structures,
/// radix-prefixed integers are IEEE-754 bit patterns of the structure's width
/// and other integers are converted by value.
fn numeral_literal(numeral: Numeral, data_type: Option<DataType>) -> Literal {
    match (numeral, data_type.and_then(DataType::float_bits)) {
        (Numeral::Float(f), _) => Literal::Float(f),
        (Numeral::Integer { value, bits: true }, Some(width)) => {
            match literal::float_from_bits(&value, width) {
                Some(f) => Literal::Float(f),
                None => Literal::Integer(value),
            }
        }
        (Numeral::Integer { value, bits: false }, Some(_)) => match value.to_f64() {
            Some(f) => Literal::Float(f),
            None => Literal::Integer(value),
        },
        (Numeral::Integer { value, .. }, None) => Literal::Integer(value),
    }
}

/// The text of the token at the start of `rest`, quoted, for messages.
fn token_text(rest: &str) -> String {
    let token: String = rest
        .chars()
        .take_while(|&c| !c.is_whitespace() && !matches!(c, ']' | '{' | '}' | ','))
        .collect();
    if token.is_empty() {
        describe(rest)
    } else {
        format!("\"{}\"", token)
    }
}

/// Nesting state handed to each level of the recursion.
#[derive(Debug, Clone, Copy)]
struct Scope {
    depth: usize,
}

impl Scope {
    const TOP: Scope = Scope { depth: 0 };

    fn nested(self) -> Scope {
        Scope {
            depth: self.depth + 1,
        }
    }

    fn is_top(self) -> bool {
        self.depth == 0
    }
}

/// Parse a complete document.
pub(crate) fn parse_document(src: &str, options: &ParseOptions) -> Result<Document> {
    let ctx = ParseContext::new(options.filename.as_deref());
    let mut parser = Parser {
        cursor: Cursor::new(src, ctx),
        max_depth: options.max_depth,
    };
    let structures = parser.parse_structures(Scope::TOP)?;
    let warnings = parser.cursor.into_warnings();
    debug!(
        structures = structures.len(),
        warnings = warnings.len(),
        "parsed document"
    );
    Ok(Document::from_parts(structures, warnings))
}

struct Parser<'a> {
    cursor: Cursor<'a>,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    /// Parse structures up to the end of input (top level) or up to, but not
    /// including, the closing brace of the enclosing structure.
    fn parse_structures(&mut self, scope: Scope) -> Result<Vec<Structure>> {
        let mut structures = Vec::new();
        loop {
            self.cursor.skip_trivia()?;
            if self.cursor.is_eof() {
                if scope.is_top() {
                    return Ok(structures);
                }
                return Err(self
                    .cursor
                    .error(ErrorKind::Expected("}".to_string(), describe(""))));
            }
            if !scope.is_top() && self.cursor.peek() == Some('}') {
                return Ok(structures);
            }
            structures.push(self.parse_structure(scope)?);
        }
    }

    fn parse_structure(&mut self, scope: Scope) -> Result<Structure> {
        if scope.depth + 1 > self.max_depth {
            return Err(self.cursor.error(ErrorKind::NestingTooDeep(self.max_depth)));
        }
        let position = self.cursor.position();
        let rest = self.cursor.rest();

        if let Some((data_type, len)) = DataType::recognize(rest) {
            self.cursor.advance(len);
            return Ok(Structure::Primitive(
                self.parse_primitive(data_type, position)?,
            ));
        }

        if let Some(len) = literal::identifier(rest) {
            let identifier = &rest[..len];
            if literal::is_reserved_identifier(identifier) {
                return Err(self
                    .cursor
                    .error(ErrorKind::IllegalStructureName(identifier.to_string())));
            }
            self.cursor.advance(len);
            return Ok(Structure::Derived(self.parse_derived(
                identifier,
                position,
                scope.nested(),
            )?));
        }

        Err(self.cursor.error(ErrorKind::StructureExpected(describe(rest))))
    }

    /// An optional `$name` or `%name`.
    fn parse_name(&mut self) -> Result<Option<Name>> {
        self.cursor.skip_trivia()?;
        let rest = self.cursor.rest();
        if !rest.starts_with(|c: char| c == '$' || c == '%') {
            return Ok(None);
        }
        match literal::name(rest) {
            Some((name, len)) => {
                self.cursor.advance(len);
                Ok(Some(name))
            }
            None => Err(self
                .cursor
                .error_ahead(ErrorKind::IdentifierExpected(describe(&rest[1..])), 1)),
        }
    }

    // ========================================================================
    // Derived structures
    // ========================================================================

    fn parse_derived(
        &mut self,
        identifier: &str,
        position: Position,
        scope: Scope,
    ) -> Result<DerivedStructure> {
        let name = self.parse_name()?;
        self.cursor.skip_trivia()?;
        let properties = if self.cursor.eat("(") {
            self.parse_properties()?
        } else {
            Vec::new()
        };
        self.cursor.expect("{")?;
        let children = self.parse_structures(scope)?;
        self.cursor.expect("}")?;
        Ok(DerivedStructure {
            identifier: identifier.to_string(),
            name,
            properties,
            children,
            position,
        })
    }

    /// Property list after the opening parenthesis.
    fn parse_properties(&mut self) -> Result<Vec<Property>> {
        self.cursor.skip_trivia()?;
        if self.cursor.peek() == Some(')') {
            return Err(self.cursor.error(ErrorKind::EmptyPropertyList));
        }
        let mut properties = Vec::new();
        loop {
            self.cursor.skip_trivia()?;
            let position = self.cursor.position();
            let rest = self.cursor.rest();
            let len = literal::identifier(rest).ok_or_else(|| {
                self.cursor
                    .error(ErrorKind::IdentifierExpected(describe(rest)))
            })?;
            self.cursor.advance(len);
            self.cursor.skip_trivia()?;
            let value = if self.cursor.eat("=") {
                self.parse_literal(None)?
            } else {
                Literal::Bool(true)
            };
            properties.push(Property {
                key: rest[..len].to_string(),
                value,
                position,
            });
            self.cursor.skip_trivia()?;
            if self.cursor.eat(",") {
                continue;
            }
            if self.cursor.eat(")") {
                return Ok(properties);
            }
            return Err(self.cursor.error(ErrorKind::Expected(
                ")".to_string(),
                describe(self.cursor.rest()),
            )));
        }
    }

    // ========================================================================
    // Primitive structures
    // ========================================================================

    fn parse_primitive(
        &mut self,
        data_type: DataType,
        position: Position,
    ) -> Result<PrimitiveStructure> {
        self.cursor.skip_trivia()?;
        let mut value_positions = Vec::new();
        let mut group_positions = Vec::new();
        let (name, data) = if self.cursor.eat("[") {
            let size = self.parse_array_size()?;
            self.cursor.expect("]")?;
            self.cursor.skip_trivia()?;
            let star = self.cursor.eat("*");
            let name = self.parse_name()?;
            self.cursor.expect("{")?;
            let groups =
                self.parse_groups(data_type, &mut value_positions, &mut group_positions)?;
            (name, PrimitiveData::Array { size, star, groups })
        } else {
            let name = self.parse_name()?;
            self.cursor.expect("{")?;
            let values = self.parse_values(data_type, &mut value_positions)?;
            (name, PrimitiveData::Flat(values))
        };
        Ok(PrimitiveStructure {
            data_type,
            name,
            data,
            position,
            value_positions,
            group_positions,
        })
    }

    fn parse_array_size(&mut self) -> Result<usize> {
        self.cursor.skip_trivia()?;
        let rest = self.cursor.rest();
        let size = match literal::number(rest) {
            Ok(Some(lexeme)) => match lexeme.value {
                Numeral::Integer { value, .. } => value
                    .to_usize()
                    .filter(|&n| n > 0)
                    .map(|n| (n, lexeme.len)),
                Numeral::Float(_) => None,
            },
            _ => None,
        };
        match size {
            Some((n, len)) => {
                self.cursor.advance(len);
                Ok(n)
            }
            None => Err(self
                .cursor
                .error(ErrorKind::InvalidArraySize(token_text(rest)))),
        }
    }

    /// Comma-separated values up to and including the closing brace.
    fn parse_values(
        &mut self,
        data_type: DataType,
        positions: &mut Vec<Position>,
    ) -> Result<Vec<Literal>> {
        let mut values = Vec::new();
        self.cursor.skip_trivia()?;
        if self.cursor.eat("}") {
            return Ok(values);
        }
        loop {
            self.cursor.skip_trivia()?;
            positions.push(self.cursor.position());
            values.push(self.parse_literal(Some(data_type))?);
            self.cursor.skip_trivia()?;
            if self.cursor.eat(",") {
                continue;
            }
            if self.cursor.eat("}") {
                return Ok(values);
            }
            return Err(self.cursor.error(ErrorKind::Expected(
                "}".to_string(),
                describe(self.cursor.rest()),
            )));
        }
    }

    /// Comma-separated `{ ... }` groups up to and including the closing brace.
    fn parse_groups(
        &mut self,
        data_type: DataType,
        value_positions: &mut Vec<Position>,
        group_positions: &mut Vec<Position>,
    ) -> Result<Vec<Vec<Literal>>> {
        let mut groups = Vec::new();
        self.cursor.skip_trivia()?;
        if self.cursor.eat("}") {
            return Ok(groups);
        }
        loop {
            self.cursor.skip_trivia()?;
            group_positions.push(self.cursor.position());
            self.cursor.expect("{")?;
            groups.push(self.parse_values(data_type, value_positions)?);
            self.cursor.skip_trivia()?;
            if self.cursor.eat(",") {
                continue;
            }
            if self.cursor.eat("}") {
                return Ok(groups);
            }
            return Err(self.cursor.error(ErrorKind::Expected(
                "}".to_string(),
                describe(self.cursor.rest()),
            )));
        }
    }

    // ========================================================================
    // Literals
    // ========================================================================

    /// A single value, typed by the enclosing structure if there is one.
    ///
    /// Undecodable base64 is only reported once no other grammar matches, so
    /// `z {12}` still reads the integer and leaves it to the linter.
    fn parse_literal(&mut self, data_type: Option<DataType>) -> Result<Literal> {
        self.cursor.skip_trivia()?;
        let mut bad_base64 = None;
        for grammar in candidates(data_type) {
            let mark = self.cursor.mark();
            match self.recognize(grammar, data_type) {
                Ok(Some(literal)) => {
                    if self.at_delimiter()? {
                        return Ok(literal);
                    }
                    self.cursor.reset(mark);
                }
                Ok(None) => {}
                Err(e) if grammar == Grammar::Base64 => {
                    self.cursor.reset(mark);
                    bad_base64 = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(bad_base64.unwrap_or_else(|| {
            self.cursor
                .error(ErrorKind::ValueExpected(describe(self.cursor.rest())))
        }))
    }

    /// Whether the next token ends a value.
    fn at_delimiter(&mut self) -> Result<bool> {
        self.cursor.skip_trivia()?;
        Ok(matches!(self.cursor.peek(), None | Some(',' | '}' | ')')))
    }

    fn recognize(
        &mut self,
        grammar: Grammar,
        data_type: Option<DataType>,
    ) -> Result<Option<Literal>> {
        let rest = self.cursor.rest();
        match grammar {
            Grammar::String => self.string(),
            Grammar::Bool => Ok(literal::boolean(rest).map(|(b, len)| {
                self.cursor.advance(len);
                Literal::Bool(b)
            })),
            Grammar::Reference => Ok(literal::reference(rest).map(|(r, len)| {
                self.cursor.advance(len);
                Literal::Reference(r)
            })),
            Grammar::Type => Ok(DataType::recognize(rest).map(|(t, len)| {
                self.cursor.advance(len);
                Literal::Type(t)
            })),
            Grammar::Number => {
                let mark = self.cursor.mark();
                let numeral = self.lexeme(literal::number(rest))?;
                let len = rest.len() - self.cursor.rest().len();
                let float_structure = data_type.and_then(DataType::float_bits).is_some();
                if let Some(Numeral::Float(f)) = &numeral {
                    // Only float structures can spell an infinity, as a bit pattern.
                    if !f.is_finite() && !float_structure && self.at_delimiter()? {
                        self.cursor.reset(mark);
                        return Err(self
                            .cursor
                            .error(ErrorKind::FloatOverflow(rest[..len].to_string())));
                    }
                }
                Ok(numeral.map(|n| numeral_literal(n, data_type)))
            }
            Grammar::Base64 => {
                // Undecodable text is only a base64 error where base64 is expected.
                let recognized = match literal::base64(rest) {
                    Err(_) if data_type.is_some_and(|t| t != DataType::Base64) => Ok(None),
                    other => other,
                };
                Ok(self.lexeme(recognized)?.map(Literal::Base64))
            }
        }
    }

    /// One or more adjacent string literals, concatenated.
    fn string(&mut self) -> Result<Option<Literal>> {
        let mut value = match self.lexeme(literal::string(self.cursor.rest()))? {
            Some(s) => s,
            None => return Ok(None),
        };
        loop {
            let mark = self.cursor.mark();
            self.cursor.skip_trivia()?;
            match self.lexeme(literal::string(self.cursor.rest()))? {
                Some(more) => value.push_str(&more),
                None => {
                    self.cursor.reset(mark);
                    return Ok(Some(Literal::String(value)));
                }
            }
        }
    }

    /// Accept a recognizer's result at the cursor: report its advisories,
    /// consume it, or turn a malformed literal into a fatal error.
    fn lexeme<T>(&mut self, recognized: Recognized<T>) -> Result<Option<T>> {
        match recognized {
            Ok(Some(lexeme)) => {
                for note in lexeme.notes {
                    self.cursor.warn(note.offset, note.kind, note.message);
                }
                self.cursor.advance(lexeme.len);
                Ok(Some(lexeme.value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(self.cursor.error_ahead(e.kind, e.offset)),
        }
    }
}
