//! Literal recognizers.
//!
//! Each recognizer looks at the start of a slice and either reports no match
//! (`Ok(None)`), a match with its decoded value and length, or a
//! [`LiteralError`] when the text clearly starts a literal of its kind but
//! cannot be completed (an unterminated string, an undecodable base64 run).
//! None of them skip leading trivia and none of them decide whether a missing
//! literal is an error; that is the parser's job.

use base64::prelude::*;
use num_bigint::{BigInt, Sign};
use num_traits::{Num, ToPrimitive};

use crate::error::ErrorKind;
use crate::lint::DiagnosticKind;
use crate::value::{Name, NameKind, Reference};

/// A successful match.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme<T> {
    pub value: T,
    /// Bytes consumed.
    pub len: usize,
    /// Advisories found inside the literal.
    pub notes: Vec<Note>,
}

impl<T> Lexeme<T> {
    fn new(value: T, len: usize) -> Self {
        Self {
            value,
            len,
            notes: Vec::new(),
        }
    }
}

/// An advisory at a byte offset relative to the start of the literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub offset: usize,
    pub kind: DiagnosticKind,
    pub message: String,
}

/// A literal that started matching but is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralError {
    pub offset: usize,
    pub kind: ErrorKind,
}

impl LiteralError {
    fn new(offset: usize, kind: ErrorKind) -> Self {
        Self { offset, kind }
    }

    fn shifted(self, by: usize) -> Self {
        Self {
            offset: self.offset + by,
            kind: self.kind,
        }
    }
}

pub type Recognized<T> = std::result::Result<Option<Lexeme<T>>, LiteralError>;

/// A numeric literal before it is given a data type.
#[derive(Debug, Clone, PartialEq)]
pub enum Numeral {
    /// An integer. `bits` is set for `0x`/`0o`/`0b` literals, which float
    /// structures read as IEEE-754 bit patterns.
    Integer { value: BigInt, bits: bool },
    Float(f64),
}

/// Escape codes shared by decoding and encoding.
const ESCAPES: &[(char, char)] = &[
    ('"', '"'),
    ('\'', '\''),
    ('?', '?'),
    ('\\', '\\'),
    ('a', '\x07'),
    ('b', '\x08'),
    ('f', '\x0C'),
    ('n', '\n'),
    ('r', '\r'),
    ('t', '\t'),
    ('v', '\x0B'),
];

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// True when `rest` does not continue the token that just ended.
fn at_boundary(rest: &str) -> bool {
    !matches!(rest.chars().next(), Some(c) if is_ident_char(c) || c == '.')
}

/// Length of the identifier at the start of `s`, if any.
pub fn identifier(s: &str) -> Option<usize> {
    let mut chars = s.chars();
    if !chars.next().is_some_and(is_ident_start) {
        return None;
    }
    Some(1 + chars.take_while(|&c| is_ident_char(c)).count())
}

/// Identifiers of one lowercase letter and optional digits are reserved for
/// data types and may not name derived structures.
pub fn is_reserved_identifier(id: &str) -> bool {
    let mut chars = id.chars();
    matches!(chars.next(), Some('a'..='z')) && chars.all(|c| c.is_ascii_digit())
}

pub fn boolean(s: &str) -> Option<(bool, usize)> {
    for (word, value) in [("true", true), ("false", false)] {
        if let Some(after) = s.strip_prefix(word) {
            if at_boundary(after) {
                return Some((value, word.len()));
            }
        }
    }
    None
}

/// A `$local` or `%global` name.
pub fn name(s: &str) -> Option<(Name, usize)> {
    let kind = match s.chars().next()? {
        '$' => NameKind::Local,
        '%' => NameKind::Global,
        _ => return None,
    };
    let len = identifier(&s[1..])?;
    Some((Name::new(kind, &s[1..1 + len]), 1 + len))
}

/// `null`, or a name followed by `%member` segments.
pub fn reference(s: &str) -> Option<(Reference, usize)> {
    if let Some(after) = s.strip_prefix("null") {
        if at_boundary(after) {
            return Some((Reference::Null, 4));
        }
    }
    let (root, mut len) = name(s)?;
    let mut members = Vec::new();
    while s[len..].starts_with('%') {
        match identifier(&s[len + 1..]) {
            Some(n) => {
                members.push(s[len + 1..len + 1 + n].to_string());
                len += 1 + n;
            }
            None => break,
        }
    }
    Some((Reference::Path { root, members }, len))
}

/// Scan digits of `radix` separated by `_`.
///
/// Returns bytes consumed, the digits alone, and whether the separators were
/// leading, trailing, or doubled.
fn digit_run(s: &str, radix: u32) -> (usize, String, bool) {
    let mut len = 0;
    let mut digits = String::new();
    let mut irregular = false;
    let mut after_separator = true;
    for c in s.chars() {
        if c.is_digit(radix) {
            digits.push(c);
            after_separator = false;
        } else if c == '_' {
            irregular |= after_separator;
            after_separator = true;
        } else {
            break;
        }
        len += 1;
    }
    if len > 0 && after_separator {
        irregular = true;
    }
    (len, digits, irregular)
}

fn radix_prefix(s: &str) -> Option<u32> {
    let b = s.as_bytes();
    if b.len() < 2 || b[0] != b'0' {
        return None;
    }
    match b[1] {
        b'x' | b'X' => Some(16),
        b'o' | b'O' => Some(8),
        b'b' | b'B' => Some(2),
        _ => None,
    }
}

fn separator_note(offset: usize) -> Note {
    Note {
        offset,
        kind: DiagnosticKind::DigitSeparators,
        message: "irregular digit separators".to_string(),
    }
}

/// Integer, float, or character literal with an optional sign.
pub fn number(s: &str) -> Recognized<Numeral> {
    let (negative, start) = match s.as_bytes().first() {
        Some(b'-') => (true, 1),
        Some(b'+') => (false, 1),
        _ => (false, 0),
    };
    let body = &s[start..];

    if body.starts_with('\'') {
        let lexeme = match char_literal(body).map_err(|e| e.shifted(start))? {
            Some(lexeme) => lexeme,
            None => return Ok(None),
        };
        let mut value = BigInt::from(lexeme.value);
        if negative {
            value = -value;
        }
        let notes = lexeme
            .notes
            .into_iter()
            .map(|n| Note {
                offset: n.offset + start,
                ..n
            })
            .collect();
        return Ok(Some(Lexeme {
            value: Numeral::Integer { value, bits: false },
            len: start + lexeme.len,
            notes,
        }));
    }

    if let Some(radix) = radix_prefix(body) {
        let (len, digits, irregular) = digit_run(&body[2..], radix);
        // "0x" with no digits falls through to the decimal "0", which then
        // fails the boundary check.
        if !digits.is_empty() {
            let end = start + 2 + len;
            if !at_boundary(&s[end..]) {
                return Ok(None);
            }
            let mut value = match BigInt::from_str_radix(&digits, radix) {
                Ok(v) => v,
                Err(_) => return Ok(None),
            };
            if negative {
                value = -value;
            }
            let mut lexeme = Lexeme::new(Numeral::Integer { value, bits: true }, end);
            if irregular {
                lexeme.notes.push(separator_note(start + 2));
            }
            return Ok(Some(lexeme));
        }
    }

    decimal(s, body, start, negative)
}

fn decimal(s: &str, body: &str, start: usize, negative: bool) -> Recognized<Numeral> {
    let starts_with_digit = |t: &str| t.chars().next().is_some_and(|c| c.is_ascii_digit());

    let (mut end, int_digits, mut irregular) = if starts_with_digit(body) {
        digit_run(body, 10)
    } else {
        (0, String::new(), false)
    };
    let mut text = int_digits.clone();
    let mut is_float = false;

    if body[end..].starts_with('.') {
        let after_dot = &body[end + 1..];
        let (frac_len, frac_digits, frac_irregular) = if starts_with_digit(after_dot) {
            digit_run(after_dot, 10)
        } else {
            (0, String::new(), false)
        };
        if int_digits.is_empty() && frac_digits.is_empty() {
            return Ok(None);
        }
        end += 1 + frac_len;
        text.push('.');
        text.push_str(&frac_digits);
        irregular |= frac_irregular;
        is_float = true;
    }
    if text.is_empty() {
        return Ok(None);
    }

    if matches!(body[end..].chars().next(), Some('e' | 'E')) {
        let mut exp_end = end + 1;
        let mut exp_text = String::from("e");
        if let Some(sign @ ('+' | '-')) = body[exp_end..].chars().next() {
            exp_text.push(sign);
            exp_end += 1;
        }
        if starts_with_digit(&body[exp_end..]) {
            let (len, digits, exp_irregular) = digit_run(&body[exp_end..], 10);
            exp_text.push_str(&digits);
            text.push_str(&exp_text);
            end = exp_end + len;
            irregular |= exp_irregular;
            is_float = true;
        }
    }

    let total = start + end;
    if !at_boundary(&s[total..]) {
        return Ok(None);
    }

    let value = if is_float {
        let f: f64 = match text.parse() {
            Ok(f) => f,
            Err(_) => return Ok(None),
        };
        Numeral::Float(if negative { -f } else { f })
    } else {
        let mut value = match BigInt::from_str_radix(&text, 10) {
            Ok(v) => v,
            Err(_) => return Ok(None),
        };
        if negative {
            value = -value;
        }
        Numeral::Integer { value, bits: false }
    };
    let mut lexeme = Lexeme::new(value, total);
    if irregular {
        lexeme.notes.push(separator_note(start));
    }
    Ok(Some(lexeme))
}

fn needless_escape(offset: usize, code: char) -> Note {
    Note {
        offset,
        kind: DiagnosticKind::NeedlessEscape,
        message: format!("needless escape sequence \"\\{}\"", code),
    }
}

/// A single-quoted character literal; the value is the code point.
fn char_literal(s: &str) -> Recognized<u32> {
    let rest = match s.strip_prefix('\'') {
        Some(rest) => rest,
        None => return Ok(None),
    };
    let mut notes = Vec::new();
    let (ch, used) = match rest.chars().next() {
        None | Some('\n') => return Err(LiteralError::new(0, ErrorKind::UnterminatedChar)),
        Some('\'') => {
            return Err(LiteralError::new(
                0,
                ErrorKind::ValueExpected("empty character literal".to_string()),
            ))
        }
        Some('\\') => {
            let (ch, len) = escape(&rest[1..]).map_err(|kind| LiteralError::new(1, kind))?;
            if let Some(code @ ('"' | '?')) = rest[1..].chars().next() {
                notes.push(needless_escape(1, code));
            }
            (ch, 1 + len)
        }
        Some(c) => (c, c.len_utf8()),
    };
    if !rest[used..].starts_with('\'') {
        return Err(LiteralError::new(0, ErrorKind::UnterminatedChar));
    }
    Ok(Some(Lexeme {
        value: ch as u32,
        len: used + 2,
        notes,
    }))
}

/// Decode the escape whose code starts `s` (the text after the backslash).
///
/// Returns the character and the number of bytes of `s` consumed.
pub fn escape(s: &str) -> std::result::Result<(char, usize), ErrorKind> {
    let code = s
        .chars()
        .next()
        .ok_or_else(|| ErrorKind::BadEscape("\\".to_string()))?;
    if let Some(&(_, ch)) = ESCAPES.iter().find(|&&(c, _)| c == code) {
        return Ok((ch, 1));
    }
    let width = match code {
        'x' => 2,
        'u' => 4,
        'U' => 6,
        _ => return Err(ErrorKind::BadEscape(format!("\\{}", code))),
    };
    let hex = s
        .get(1..1 + width)
        .filter(|h| h.chars().all(|c| c.is_ascii_hexdigit()))
        .ok_or_else(|| ErrorKind::BadEscape(format!("\\{}", code)))?;
    let ch = u32::from_str_radix(hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| ErrorKind::BadEscape(format!("\\{}{}", code, hex)))?;
    Ok((ch, 1 + width))
}

/// A double-quoted string literal.
pub fn string(s: &str) -> Recognized<String> {
    if !s.starts_with('"') {
        return Ok(None);
    }
    let mut out = String::new();
    let mut notes = Vec::new();
    let mut i = 1;
    loop {
        let rest = &s[i..];
        match rest.chars().next() {
            None => return Err(LiteralError::new(0, ErrorKind::UnterminatedString)),
            Some('"') => {
                return Ok(Some(Lexeme {
                    value: out,
                    len: i + 1,
                    notes,
                }))
            }
            Some('\\') => {
                let (ch, len) = escape(&rest[1..]).map_err(|kind| LiteralError::new(i, kind))?;
                if let Some(code @ ('\'' | '?')) = rest[1..].chars().next() {
                    notes.push(needless_escape(i, code));
                }
                out.push(ch);
                i += 1 + len;
            }
            Some(c) => {
                out.push(c);
                i += c.len_utf8();
            }
        }
    }
}

/// Quote and escape `s` so that [`string`] decodes it back unchanged.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_ascii_control() => {
                match ESCAPES.iter().find(|&&(_, ch)| ch == c) {
                    Some(&(code, _)) => {
                        out.push('\\');
                        out.push(code);
                    }
                    None => out.push_str(&format!("\\x{:02X}", c as u32)),
                }
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn is_base64_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '+' || c == '/'
}

/// A run of base64 text, possibly spread over several lines, with up to two
/// `=` padding characters.
pub fn base64(s: &str) -> Recognized<Vec<u8>> {
    let mut data_end = 0;
    for (i, c) in s.char_indices() {
        let starts_comment = c == '/' && matches!(s[i + 1..].chars().next(), Some('/' | '*'));
        if is_base64_char(c) && !starts_comment {
            data_end = i + 1;
        } else if !(c.is_whitespace() && data_end > 0) {
            break;
        }
    }
    if data_end == 0 {
        return Ok(None);
    }
    let mut end = data_end;
    while end - data_end < 2 && s[end..].starts_with('=') {
        end += 1;
    }
    let text = &s[..end];
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    match BASE64_STANDARD.decode(compact.as_bytes()) {
        Ok(bytes) => Ok(Some(Lexeme::new(bytes, end))),
        Err(_) => Err(LiteralError::new(
            0,
            ErrorKind::InvalidBase64(text.to_string()),
        )),
    }
}

pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64_STANDARD.encode(bytes)
}

/// Read an integer literal as the bit pattern of a float of `width` bits.
pub fn float_from_bits(value: &BigInt, width: u32) -> Option<f64> {
    let bits = value.magnitude().to_u64()?;
    if width < 64 && bits >> width != 0 {
        return None;
    }
    let f = match width {
        16 => half_to_f64(bits as u16),
        32 => f32::from_bits(bits as u32) as f64,
        _ => f64::from_bits(bits),
    };
    Some(if value.sign() == Sign::Minus { -f } else { f })
}

/// Bit pattern used to write a non-finite float into a structure of `width`
/// bits, since the decimal grammar has no spelling for infinities or NaN.
pub fn nonfinite_bits(f: f64, width: u32) -> u64 {
    match width {
        16 => {
            if f.is_nan() {
                0x7E00
            } else if f > 0.0 {
                0x7C00
            } else {
                0xFC00
            }
        }
        32 => (f as f32).to_bits() as u64,
        _ => f.to_bits(),
    }
}

fn half_to_f64(h: u16) -> f64 {
    let sign = if h & 0x8000 != 0 { -1.0 } else { 1.0 };
    let exponent = i32::from((h >> 10) & 0x1F);
    let fraction = f64::from(h & 0x3FF);
    match exponent {
        0 => sign * fraction * 2f64.powi(-24),
        0x1F if fraction == 0.0 => sign * f64::INFINITY,
        0x1F => f64::NAN,
        e => sign * (1.0 + fraction / 1024.0) * 2f64.powi(e - 15),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(s: &str) -> BigInt {
        match number(s).unwrap().unwrap().value {
            Numeral::Integer { value, .. } => value,
            other => panic!("not an integer: {:?}", other),
        }
    }

    fn float(s: &str) -> f64 {
        match number(s).unwrap().unwrap().value {
            Numeral::Float(f) => f,
            other => panic!("not a float: {:?}", other),
        }
    }

    #[test]
    fn test_integer_bases() {
        assert_eq!(int("0b1010"), BigInt::from(10));
        assert_eq!(int("0o17"), BigInt::from(15));
        assert_eq!(int("0x1F"), BigInt::from(31));
        assert_eq!(int("0X1f"), BigInt::from(31));
        assert_eq!(int("42"), BigInt::from(42));
        assert_eq!(int("-42"), BigInt::from(-42));
        assert_eq!(int("+7"), BigInt::from(7));
        assert_eq!(int("-0x10"), BigInt::from(-16));
    }

    #[test]
    fn test_radix_literals_are_marked_as_bits() {
        let lexeme = number("0x3F800000").unwrap().unwrap();
        assert!(matches!(lexeme.value, Numeral::Integer { bits: true, .. }));
        let lexeme = number("1065353216").unwrap().unwrap();
        assert!(matches!(lexeme.value, Numeral::Integer { bits: false, .. }));
    }

    #[test]
    fn test_digit_separators() {
        assert_eq!(int("1_000"), BigInt::from(1000));
        assert!(number("1_000").unwrap().unwrap().notes.is_empty());
        assert_eq!(int("0xFF_FF"), BigInt::from(0xFFFF));
        let doubled = number("1__0").unwrap().unwrap();
        assert_eq!(doubled.notes.len(), 1);
        let trailing = number("0b1_").unwrap().unwrap();
        assert_eq!(trailing.notes.len(), 1);
    }

    #[test]
    fn test_floats() {
        assert_eq!(float("3.14"), 3.14);
        assert_eq!(float(".5"), 0.5);
        assert_eq!(float("1e3"), 1000.0);
        assert_eq!(float("-2.5E-1"), -0.25);
        assert!(float("-0.0").is_sign_negative());
    }

    #[test]
    fn test_number_lengths_and_boundaries() {
        assert_eq!(number("12, 3").unwrap().unwrap().len, 2);
        assert_eq!(number("1.5}").unwrap().unwrap().len, 3);
        assert_eq!(number("12abc").unwrap(), None);
        assert_eq!(number("0x").unwrap(), None);
        assert_eq!(number("abc").unwrap(), None);
        assert_eq!(number(".").unwrap(), None);
        assert_eq!(number("-").unwrap(), None);
        // Exponent without digits is not consumed.
        assert_eq!(number("1e").unwrap(), None);
    }

    #[test]
    fn test_char_literals() {
        assert_eq!(int("'A'"), BigInt::from(65));
        assert_eq!(int("'\\x41'"), BigInt::from(65));
        assert_eq!(int("'\\n'"), BigInt::from(10));
        assert_eq!(int("'\\u00e9'"), BigInt::from(0xE9));
        assert_eq!(int("'\\U01F600'"), BigInt::from(0x1F600));
        assert_eq!(int("'\\''"), BigInt::from(39));
        assert_eq!(number("'\\x41'").unwrap().unwrap().len, 6);
        assert_eq!(number("'\\?'").unwrap().unwrap().notes.len(), 1);
        assert_eq!(
            number("'A").unwrap_err().kind,
            ErrorKind::UnterminatedChar
        );
        assert_eq!(
            number("'\\q'").unwrap_err().kind,
            ErrorKind::BadEscape("\\q".into())
        );
    }

    #[test]
    fn test_strings() {
        let lexeme = string(r#""a\nb\"c" rest"#).unwrap().unwrap();
        assert_eq!(lexeme.value, "a\nb\"c");
        assert_eq!(lexeme.len, 9);
        assert!(lexeme.notes.is_empty());
        assert_eq!(string("abc").unwrap(), None);
        assert_eq!(
            string("\"abc").unwrap_err().kind,
            ErrorKind::UnterminatedString
        );
        let lexeme = string(r#""it\'s""#).unwrap().unwrap();
        assert_eq!(lexeme.value, "it's");
        assert_eq!(lexeme.notes[0].offset, 3);
    }

    #[test]
    fn test_string_escape_round_trip() {
        let source = r#""a\nb\"c""#;
        let decoded = string(source).unwrap().unwrap().value;
        assert_eq!(quote(&decoded), source);
        assert_eq!(quote("tab\there\x01\u{85}é"), "\"tab\\there\\x01\\u0085é\"");
        assert_eq!(quote("back\\slash"), r#""back\\slash""#);
    }

    #[test]
    fn test_bad_unicode_escape() {
        let err = string(r#""\uD800""#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadEscape("\\uD800".into()));
        assert_eq!(err.offset, 1);
        let err = string(r#""\x4""#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadEscape("\\x".into()));
    }

    #[test]
    fn test_base64() {
        let lexeme = base64("YWJj}").unwrap().unwrap();
        assert_eq!(lexeme.value, b"abc");
        assert_eq!(lexeme.len, 4);
        let lexeme = base64("YW\n  Jj ,").unwrap().unwrap();
        assert_eq!(lexeme.value, b"abc");
        assert_eq!(lexeme.len, 7);
        let lexeme = base64("YQ==)").unwrap().unwrap();
        assert_eq!(lexeme.value, b"a");
        assert_eq!(base64("}").unwrap(), None);
        assert_eq!(
            base64("YWJ}").unwrap_err().kind,
            ErrorKind::InvalidBase64("YWJ".into())
        );
    }

    #[test]
    fn test_base64_stops_at_comment() {
        let lexeme = base64("YWJj// note").unwrap().unwrap();
        assert_eq!(lexeme.len, 4);
    }

    #[test]
    fn test_references() {
        assert_eq!(reference("null,"), Some((Reference::Null, 4)));
        assert_eq!(reference("nullable"), None);
        let (r, len) = reference("$a%b%c}").unwrap();
        assert_eq!(len, 6);
        assert_eq!(r.to_string(), "$a%b%c");
        let (r, len) = reference("%geo").unwrap();
        assert_eq!(len, 4);
        assert_eq!(r.to_string(), "%geo");
        assert_eq!(reference("$"), None);
        assert_eq!(reference("abc"), None);
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(identifier("Metric {"), Some(6));
        assert_eq!(identifier("_x1"), Some(3));
        assert_eq!(identifier("1x"), None);
        assert!(is_reserved_identifier("b"));
        assert!(is_reserved_identifier("z12"));
        assert!(!is_reserved_identifier("B"));
        assert!(!is_reserved_identifier("ab"));
        assert!(!is_reserved_identifier("z1a"));
    }

    #[test]
    fn test_booleans() {
        assert_eq!(boolean("true)"), Some((true, 4)));
        assert_eq!(boolean("false"), Some((false, 5)));
        assert_eq!(boolean("trueish"), None);
    }

    #[test]
    fn test_float_bits() {
        assert_eq!(float_from_bits(&BigInt::from(0x3F80_0000u32), 32), Some(1.0));
        assert_eq!(float_from_bits(&BigInt::from(0x3C00), 16), Some(1.0));
        assert_eq!(float_from_bits(&BigInt::from(0xC000), 16), Some(-2.0));
        assert_eq!(float_from_bits(&BigInt::from(0x1_0000), 16), None);
        assert!(float_from_bits(&BigInt::from(0x7E00), 16).unwrap().is_nan());
        assert_eq!(
            float_from_bits(&BigInt::from(0x7FF0_0000_0000_0000u64), 64),
            Some(f64::INFINITY)
        );
        assert_eq!(nonfinite_bits(f64::NEG_INFINITY, 16), 0xFC00);
        assert_eq!(nonfinite_bits(f64::INFINITY, 32), 0x7F80_0000);
    }
}
