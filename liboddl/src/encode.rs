//! Encode documents back to OpenDDL text.
//!
//! Two layouts share one tree walk: a minimized form with only the
//! separators the grammar requires, and a pretty form with one structure per
//! line. Either one parses back to a tree equal to the one written.

use num_bigint::{BigInt, Sign};

use crate::datatype::DataType;
use crate::document::{
    DerivedStructure, Document, PrimitiveData, PrimitiveStructure, Property, Structure,
};
use crate::literal;
use crate::value::Literal;

/// Output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Single line, no optional whitespace
    Minimized,
    /// Indented, one structure per line
    Pretty,
}

const INDENT: &str = "    ";

/// Encode a document in the specified format.
pub fn encode(doc: &Document, format: Format) -> String {
    let mut out = String::new();
    for structure in doc.structures() {
        match format {
            Format::Minimized => encode_min(structure, &mut out),
            Format::Pretty => encode_pretty(structure, 0, &mut out),
        }
    }
    out
}

// =============================================================================
// Minimized
// =============================================================================

fn encode_min(structure: &Structure, out: &mut String) {
    match structure {
        Structure::Primitive(p) => {
            out.push_str(p.data_type.canonical());
            if let PrimitiveData::Array { size, star, .. } = &p.data {
                out.push_str(&array_suffix(*size, *star));
                if let Some(name) = &p.name {
                    out.push_str(&name.to_string());
                }
            } else if let Some(name) = &p.name {
                out.push(' ');
                out.push_str(&name.to_string());
            }
            out.push_str(&encode_data(p, ","));
        }
        Structure::Derived(d) => {
            out.push_str(&d.identifier);
            if let Some(name) = &d.name {
                out.push(' ');
                out.push_str(&name.to_string());
            }
            if !d.properties.is_empty() {
                out.push_str(&encode_properties(&d.properties, "=", ","));
            }
            out.push('{');
            for child in &d.children {
                encode_min(child, out);
            }
            out.push('}');
        }
    }
}

// =============================================================================
// Pretty
// =============================================================================

fn encode_pretty(structure: &Structure, indent: usize, out: &mut String) {
    let pad = INDENT.repeat(indent);
    out.push_str(&pad);
    match structure {
        Structure::Primitive(p) => {
            out.push_str(&primitive_head(p));
            out.push(' ');
            out.push_str(&encode_data(p, ", "));
            out.push('\n');
        }
        Structure::Derived(d) => {
            out.push_str(&derived_head(d));
            if d.children.is_empty() {
                out.push_str(" {}\n");
                return;
            }
            out.push('\n');
            out.push_str(&pad);
            out.push_str("{\n");
            for child in &d.children {
                encode_pretty(child, indent + 1, out);
            }
            out.push_str(&pad);
            out.push_str("}\n");
        }
    }
}

fn primitive_head(p: &PrimitiveStructure) -> String {
    let mut head = p.data_type.canonical().to_string();
    if let PrimitiveData::Array { size, star, .. } = &p.data {
        head.push_str(&array_suffix(*size, *star));
    }
    if let Some(name) = &p.name {
        head.push(' ');
        head.push_str(&name.to_string());
    }
    head
}

fn derived_head(d: &DerivedStructure) -> String {
    let mut head = d.identifier.clone();
    if let Some(name) = &d.name {
        head.push(' ');
        head.push_str(&name.to_string());
    }
    if !d.properties.is_empty() {
        head.push(' ');
        head.push_str(&encode_properties(&d.properties, " = ", ", "));
    }
    head
}

// =============================================================================
// Shared pieces
// =============================================================================

fn array_suffix(size: usize, star: bool) -> String {
    if star {
        format!("[{}]*", size)
    } else {
        format!("[{}]", size)
    }
}

fn encode_properties(properties: &[Property], assign: &str, sep: &str) -> String {
    let items: Vec<String> = properties
        .iter()
        .map(|p| format!("{}{}{}", p.key, assign, encode_literal(&p.value, None)))
        .collect();
    format!("({})", items.join(sep))
}

/// The braced value list of a primitive structure.
fn encode_data(p: &PrimitiveStructure, sep: &str) -> String {
    let list = |values: &[Literal]| -> String {
        let items: Vec<String> = values
            .iter()
            .map(|v| encode_literal(v, Some(p.data_type)))
            .collect();
        format!("{{{}}}", items.join(sep))
    };
    match &p.data {
        PrimitiveData::Flat(values) => list(values),
        PrimitiveData::Array { groups, .. } => {
            let items: Vec<String> = groups.iter().map(|g| list(g)).collect();
            format!("{{{}}}", items.join(sep))
        }
    }
}

fn encode_literal(value: &Literal, data_type: Option<DataType>) -> String {
    match value {
        Literal::Bool(true) => "true".to_string(),
        Literal::Bool(false) => "false".to_string(),
        Literal::Integer(n) => encode_integer(n, data_type),
        Literal::Float(f) => {
            let text = encode_float(*f, data_type.and_then(DataType::float_bits));
            if data_type == Some(DataType::Base64) && reads_as_base64(&text) {
                // `1e20` is also base64; a fraction ends the run.
                text.replacen('e', ".0e", 1)
            } else {
                text
            }
        }
        Literal::String(s) => literal::quote(s),
        Literal::Reference(r) => r.to_string(),
        Literal::Type(t) => t.canonical().to_string(),
        Literal::Base64(bytes) => encode_blob(bytes, data_type),
    }
}

/// Integers in float structures are written as the bit patterns they were
/// read as; decimal would read back as a float.
fn encode_integer(n: &BigInt, data_type: Option<DataType>) -> String {
    if data_type.and_then(DataType::float_bits).is_some() {
        let sign = if n.sign() == Sign::Minus { "-" } else { "" };
        return format!("{}0x{:X}", sign, n.magnitude());
    }
    let text = n.to_string();
    if data_type == Some(DataType::Base64) && reads_as_base64(&text) {
        // A separator ends the base64 run early.
        let mut split = text;
        split.insert(1, '_');
        return split;
    }
    text
}

/// Base64 text that reads back as the same bytes. A `/` never directly
/// follows another, since `//` would start a comment, and text that an
/// earlier grammar would read whole is broken after its first character.
fn encode_blob(bytes: &[u8], data_type: Option<DataType>) -> String {
    let text = literal::encode_base64(bytes);
    let mut out = String::with_capacity(text.len() + 2);
    for c in text.chars() {
        if c == '/' && out.ends_with('/') {
            out.push(' ');
        }
        out.push(c);
    }
    if data_type != Some(DataType::Base64) && shadows_base64(&text) {
        out.insert(1, ' ');
    }
    out
}

/// Whether a grammar tried before base64 reads all of `text`.
fn shadows_base64(text: &str) -> bool {
    let whole = |len: usize| len == text.len();
    literal::boolean(text).is_some_and(|(_, len)| whole(len))
        || literal::reference(text).is_some_and(|(_, len)| whole(len))
        || DataType::recognize(text).is_some_and(|(_, len)| whole(len))
        || matches!(literal::number(text), Ok(Some(lexeme)) if whole(lexeme.len))
}

/// Whether all of `text` is valid base64.
fn reads_as_base64(text: &str) -> bool {
    matches!(literal::base64(text), Ok(Some(lexeme)) if lexeme.len == text.len())
}

/// Shortest decimal that reads back to the same `f64`. Infinities and NaN
/// have no decimal spelling and are written as bit patterns of `width`.
fn encode_float(f: f64, width: Option<u32>) -> String {
    if !f.is_finite() {
        return format!("0x{:X}", literal::nonfinite_bits(f, width.unwrap_or(64)));
    }
    let abs = f.abs();
    let s = if abs >= 1e16 || (abs < 1e-5 && abs != 0.0) {
        format!("{:e}", f)
    } else {
        format!("{}", f)
    };
    if s.contains('.') || s.contains('e') {
        s
    } else {
        format!("{}.0", s)
    }
}
