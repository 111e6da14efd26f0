//! OpenDDL (Open Data Description Language) reader and writer.
//!
//! OpenDDL documents are trees of structures. Primitive structures hold typed
//! lists of literal values; derived structures carry a user-defined
//! identifier, optional properties, and nested structures. Any structure may
//! be named locally (`$name`) or globally (`%name`) and referenced by name.
//!
//! # Parsing Pipeline
//!
//! 1. **Cursor**: Walks the source text, skipping whitespace and comments and
//!    tracking line numbers for diagnostics.
//!
//! 2. **Literal Recognizers**: Pure functions that match numbers, strings,
//!    references, data types, and base64 at the cursor.
//!
//! 3. **Structure Parser**: Recursive descent over structures, trying an
//!    ordered list of literal grammars for each value.
//!
//! The resulting [`Document`] can be checked with [`Document::check`] and
//! written back with [`Document::write`].

mod cursor;
mod datatype;
mod document;
mod encode;
mod error;
mod lint;
pub mod literal;
mod options;
mod parser;
mod value;

pub use datatype::DataType;
pub use document::{
    DerivedStructure, Document, NodePath, PrimitiveData, PrimitiveStructure, Property, Structure,
};
pub use encode::{encode, Format};
pub use error::{ErrorKind, ParseError, Position, Result};
pub use lint::{check, Diagnostic, DiagnosticKind, Severity};
pub use options::{ParseOptions, DEFAULT_MAX_DEPTH};
pub use value::{Literal, Name, NameKind, Reference};

/// Parse an OpenDDL document from a string.
///
/// # Example
///
/// ```
/// use liboddl::{parse, Format};
///
/// let doc = parse("Metric (key = \"up\") { string {\"z\"} }").unwrap();
/// assert_eq!(doc.write(Format::Minimized), "Metric(key=\"up\"){s{\"z\"}}");
/// ```
pub fn parse(input: &str) -> Result<Document> {
    parse_with_options(input, &ParseOptions::default())
}

/// Parse an OpenDDL document from a string with a filename for error messages.
pub fn parse_with_filename(input: &str, filename: Option<&str>) -> Result<Document> {
    let mut options = ParseOptions::default();
    options.filename = filename.map(str::to_string);
    parse_with_options(input, &options)
}

/// Parse with explicit options.
pub fn parse_with_options(input: &str, options: &ParseOptions) -> Result<Document> {
    parser::parse_document(input, options)
}
