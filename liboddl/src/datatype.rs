//! Primitive data types and their keyword spellings.

use std::fmt;

/// The primitive data types a primitive structure can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Half,
    Float,
    Double,
    String,
    Ref,
    Type,
    Base64,
}

/// Every accepted spelling, longest first so that a shorter alias never
/// claims the prefix of a longer one (`float32` before `float` before `f`).
const ALIASES: &[(&str, DataType)] = &[
    ("unsigned_int16", DataType::UInt16),
    ("unsigned_int32", DataType::UInt32),
    ("unsigned_int64", DataType::UInt64),
    ("unsigned_int8", DataType::UInt8),
    ("float16", DataType::Half),
    ("float32", DataType::Float),
    ("float64", DataType::Double),
    ("double", DataType::Double),
    ("string", DataType::String),
    ("base64", DataType::Base64),
    ("uint16", DataType::UInt16),
    ("uint32", DataType::UInt32),
    ("uint64", DataType::UInt64),
    ("int16", DataType::Int16),
    ("int32", DataType::Int32),
    ("int64", DataType::Int64),
    ("uint8", DataType::UInt8),
    ("float", DataType::Float),
    ("int8", DataType::Int8),
    ("bool", DataType::Bool),
    ("half", DataType::Half),
    ("type", DataType::Type),
    ("i16", DataType::Int16),
    ("i32", DataType::Int32),
    ("i64", DataType::Int64),
    ("u16", DataType::UInt16),
    ("u32", DataType::UInt32),
    ("u64", DataType::UInt64),
    ("f16", DataType::Half),
    ("f32", DataType::Float),
    ("f64", DataType::Double),
    ("ref", DataType::Ref),
    ("i8", DataType::Int8),
    ("u8", DataType::UInt8),
    ("b", DataType::Bool),
    ("h", DataType::Half),
    ("f", DataType::Float),
    ("d", DataType::Double),
    ("s", DataType::String),
    ("r", DataType::Ref),
    ("t", DataType::Type),
    ("z", DataType::Base64),
];

impl DataType {
    /// All data types in declaration order.
    pub const ALL: [DataType; 16] = [
        DataType::Bool,
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::UInt8,
        DataType::UInt16,
        DataType::UInt32,
        DataType::UInt64,
        DataType::Half,
        DataType::Float,
        DataType::Double,
        DataType::String,
        DataType::Ref,
        DataType::Type,
        DataType::Base64,
    ];

    /// Match a data-type keyword at the start of `s`.
    ///
    /// Returns the data type and the number of bytes consumed. A keyword only
    /// matches when it is not immediately followed by another identifier
    /// character, so `floaty` and `f32x` are not data types.
    pub fn recognize(s: &str) -> Option<(DataType, usize)> {
        ALIASES.iter().find_map(|&(alias, dt)| {
            let after = s.strip_prefix(alias)?;
            match after.chars().next() {
                Some(c) if c.is_ascii_alphanumeric() || c == '_' => None,
                _ => Some((dt, alias.len())),
            }
        })
    }

    /// Look up an exact spelling.
    pub fn from_keyword(s: &str) -> Option<DataType> {
        ALIASES
            .iter()
            .find(|&&(alias, _)| alias == s)
            .map(|&(_, dt)| dt)
    }

    /// The canonical short spelling, used by the writer.
    pub fn canonical(self) -> &'static str {
        match self {
            DataType::Bool => "b",
            DataType::Int8 => "i8",
            DataType::Int16 => "i16",
            DataType::Int32 => "i32",
            DataType::Int64 => "i64",
            DataType::UInt8 => "u8",
            DataType::UInt16 => "u16",
            DataType::UInt32 => "u32",
            DataType::UInt64 => "u64",
            DataType::Half => "f16",
            DataType::Float => "f32",
            DataType::Double => "f64",
            DataType::String => "s",
            DataType::Ref => "r",
            DataType::Type => "t",
            DataType::Base64 => "z",
        }
    }

    /// The long spelling, such as `unsigned_int8`.
    pub fn long_name(self) -> &'static str {
        match self {
            DataType::Bool => "bool",
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::UInt8 => "unsigned_int8",
            DataType::UInt16 => "unsigned_int16",
            DataType::UInt32 => "unsigned_int32",
            DataType::UInt64 => "unsigned_int64",
            DataType::Half => "half",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::String => "string",
            DataType::Ref => "ref",
            DataType::Type => "type",
            DataType::Base64 => "base64",
        }
    }

    pub fn is_integer(self) -> bool {
        self.integer_bits().is_some()
    }

    pub fn is_float(self) -> bool {
        self.float_bits().is_some()
    }

    /// Width and signedness of an integer type.
    pub fn integer_bits(self) -> Option<(u32, bool)> {
        match self {
            DataType::Int8 => Some((8, true)),
            DataType::Int16 => Some((16, true)),
            DataType::Int32 => Some((32, true)),
            DataType::Int64 => Some((64, true)),
            DataType::UInt8 => Some((8, false)),
            DataType::UInt16 => Some((16, false)),
            DataType::UInt32 => Some((32, false)),
            DataType::UInt64 => Some((64, false)),
            _ => None,
        }
    }

    /// Width of a floating-point type.
    pub fn float_bits(self) -> Option<u32> {
        match self {
            DataType::Half => Some(16),
            DataType::Float => Some(32),
            DataType::Double => Some(64),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_longest_first() {
        for pair in ALIASES.windows(2) {
            assert!(pair[0].0.len() >= pair[1].0.len(), "{:?}", pair);
        }
    }

    #[test]
    fn test_float_aliases_normalize() {
        for s in ["float", "float32", "f32", "f"] {
            assert_eq!(DataType::recognize(s), Some((DataType::Float, s.len())));
            assert_eq!(DataType::Float.canonical(), "f32");
        }
        assert_eq!(DataType::from_keyword("double").map(DataType::canonical), Some("f64"));
        assert_eq!(DataType::from_keyword("bool").map(DataType::canonical), Some("b"));
        assert_eq!(DataType::from_keyword("base64").map(DataType::canonical), Some("z"));
    }

    #[test]
    fn test_recognize_boundaries() {
        assert_eq!(DataType::recognize("float32[3]"), Some((DataType::Float, 7)));
        assert_eq!(DataType::recognize("float {"), Some((DataType::Float, 5)));
        assert_eq!(DataType::recognize("f$x"), Some((DataType::Float, 1)));
        assert_eq!(DataType::recognize("floaty"), None);
        assert_eq!(DataType::recognize("f32x"), None);
        assert_eq!(DataType::recognize("Float"), None);
        assert_eq!(DataType::recognize("unsigned_int8{"), Some((DataType::UInt8, 13)));
    }

    #[test]
    fn test_every_canonical_spelling_round_trips() {
        for dt in DataType::ALL {
            assert_eq!(DataType::from_keyword(dt.canonical()), Some(dt));
            assert_eq!(DataType::from_keyword(dt.long_name()), Some(dt));
        }
    }
}
