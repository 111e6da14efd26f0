//! Literal values, names, and references.

use num_bigint::BigInt;
use std::fmt;

use crate::datatype::DataType;

/// A typed literal: a property value or one datum of a primitive structure.
#[derive(Clone)]
pub enum Literal {
    Bool(bool),
    /// Arbitrary-precision integer; range is checked against the declared
    /// width by the linter, not the parser.
    Integer(BigInt),
    Float(f64),
    String(String),
    Reference(Reference),
    /// A data-type keyword.
    Type(DataType),
    /// Decoded base64 bytes.
    Base64(Vec<u8>),
}

impl Literal {
    /// Short description of the literal's kind for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Literal::Bool(_) => "bool",
            Literal::Integer(_) => "integer",
            Literal::Float(_) => "float",
            Literal::String(_) => "string",
            Literal::Reference(_) => "reference",
            Literal::Type(_) => "type",
            Literal::Base64(_) => "base64",
        }
    }

    /// Whether this literal is the kind a structure of `data_type` holds.
    pub fn conforms_to(&self, data_type: DataType) -> bool {
        match self {
            Literal::Bool(_) => data_type == DataType::Bool,
            Literal::Integer(_) => data_type.is_integer(),
            Literal::Float(_) => data_type.is_float(),
            Literal::String(_) => data_type == DataType::String,
            Literal::Reference(_) => data_type == DataType::Ref,
            Literal::Type(_) => data_type == DataType::Type,
            Literal::Base64(_) => data_type == DataType::Base64,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Literal::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<&BigInt> {
        match self {
            Literal::Integer(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Literal::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Literal::Reference(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<DataType> {
        match self {
            Literal::Type(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Literal::Base64(b) => Some(b),
            _ => None,
        }
    }
}

/// Floats compare by bit pattern, except that any two NaNs are equal, so a
/// parsed document always equals itself.
impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Literal::Bool(a), Literal::Bool(b)) => a == b,
            (Literal::Integer(a), Literal::Integer(b)) => a == b,
            (Literal::Float(a), Literal::Float(b)) => {
                (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
            }
            (Literal::String(a), Literal::String(b)) => a == b,
            (Literal::Reference(a), Literal::Reference(b)) => a == b,
            (Literal::Type(a), Literal::Type(b)) => a == b,
            (Literal::Base64(a), Literal::Base64(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::Float(x) => write!(f, "{:?}", x),
            Literal::String(s) => write!(f, "{:?}", s),
            Literal::Reference(r) => write!(f, "{}", r),
            Literal::Type(t) => write!(f, "{}", t),
            Literal::Base64(b) => {
                write!(f, "<")?;
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                write!(f, ">")
            }
        }
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<BigInt> for Literal {
    fn from(n: BigInt) -> Self {
        Literal::Integer(n)
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Literal::Integer(BigInt::from(n))
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Integer(BigInt::from(n))
    }
}

impl From<f64> for Literal {
    fn from(f: f64) -> Self {
        Literal::Float(f)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

impl From<Reference> for Literal {
    fn from(r: Reference) -> Self {
        Literal::Reference(r)
    }
}

impl From<DataType> for Literal {
    fn from(t: DataType) -> Self {
        Literal::Type(t)
    }
}

impl From<Vec<u8>> for Literal {
    fn from(b: Vec<u8>) -> Self {
        Literal::Base64(b)
    }
}

/// Which namespace a name lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
    /// `$name`: visible within the enclosing structure.
    Local,
    /// `%name`: visible document-wide.
    Global,
}

impl NameKind {
    pub fn sigil(self) -> char {
        match self {
            NameKind::Local => '$',
            NameKind::Global => '%',
        }
    }
}

/// The optional name of a structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    pub kind: NameKind,
    pub id: String,
}

impl Name {
    pub fn new(kind: NameKind, id: &str) -> Self {
        Self {
            kind,
            id: id.to_string(),
        }
    }

    pub fn local(id: &str) -> Self {
        Self::new(NameKind::Local, id)
    }

    pub fn global(id: &str) -> Self {
        Self::new(NameKind::Global, id)
    }

    pub fn is_global(&self) -> bool {
        self.kind == NameKind::Global
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.sigil(), self.id)
    }
}

/// A reference to a named structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    Null,
    /// A name followed by local names of successively nested substructures,
    /// written `$root%member%member`.
    Path { root: Name, members: Vec<String> },
}

impl Reference {
    pub fn to_name(name: Name) -> Self {
        Reference::Path {
            root: name,
            members: Vec::new(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Reference::Null)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Null => f.write_str("null"),
            Reference::Path { root, members } => {
                write!(f, "{}", root)?;
                for member in members {
                    write!(f, "%{}", member)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_equality() {
        assert_eq!(Literal::Float(f64::NAN), Literal::Float(-f64::NAN));
        assert_ne!(Literal::Float(0.0), Literal::Float(-0.0));
        assert_eq!(Literal::Float(1.5), Literal::Float(1.5));
        assert_ne!(Literal::Float(1.0), Literal::from(1));
    }

    #[test]
    fn test_conformance() {
        assert!(Literal::from(3).conforms_to(DataType::UInt8));
        assert!(!Literal::from(3).conforms_to(DataType::Float));
        assert!(Literal::from(1.0).conforms_to(DataType::Half));
        assert!(Literal::from("x").conforms_to(DataType::String));
        assert!(Literal::from(Reference::Null).conforms_to(DataType::Ref));
        assert!(!Literal::from(vec![1u8]).conforms_to(DataType::String));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Literal::from(true).as_bool(), Some(true));
        assert_eq!(Literal::from(7).as_integer(), Some(&BigInt::from(7)));
        assert_eq!(Literal::from(2.5).as_float(), Some(2.5));
        assert_eq!(Literal::from("s").as_str(), Some("s"));
        assert_eq!(Literal::from(DataType::Half).as_type(), Some(DataType::Half));
        assert_eq!(Literal::from(vec![1u8, 2]).as_bytes(), Some(&[1u8, 2][..]));
        assert!(Literal::from(Reference::Null)
            .as_reference()
            .is_some_and(Reference::is_null));

        let one = Literal::from(1);
        assert_eq!(one.as_bool(), None);
        assert_eq!(one.as_float(), None);
        assert_eq!(one.as_bytes(), None);
        assert!(!Reference::to_name(Name::local("x")).is_null());
    }

    #[test]
    fn test_reference_display() {
        let r = Reference::Path {
            root: Name::local("a"),
            members: vec!["b".into(), "c".into()],
        };
        assert_eq!(r.to_string(), "$a%b%c");
        assert_eq!(Reference::to_name(Name::global("g")).to_string(), "%g");
        assert_eq!(Reference::Null.to_string(), "null");
    }
}
