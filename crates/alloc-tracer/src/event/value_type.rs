//! Built-in value type tags.
//!
//! Every allocated value carries one of these tags. The set is closed; classes
//! defined by user code are tracked separately through [`ClassId`](super::ClassId).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of an allocated value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum ValueType {
    None,
    Object,
    Class,
    Module,
    Float,
    String,
    Regexp,
    Array,
    Hash,
    Struct,
    Bignum,
    File,
    Data,
    Match,
    Complex,
    Rational,
    Symbol,
    // Runtime-internal objects (method caches, iseq wrappers, ...)
    Internal,
}

impl ValueType {
    /// Every tag, in declaration order
    pub const ALL: [ValueType; 18] = [
        Self::None,
        Self::Object,
        Self::Class,
        Self::Module,
        Self::Float,
        Self::String,
        Self::Regexp,
        Self::Array,
        Self::Hash,
        Self::Struct,
        Self::Bignum,
        Self::File,
        Self::Data,
        Self::Match,
        Self::Complex,
        Self::Rational,
        Self::Symbol,
        Self::Internal,
    ];

    /// Number of distinct tags
    pub const COUNT: usize = Self::ALL.len();

    /// Stable lowercase name used in reports
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Object => "object",
            Self::Class => "class",
            Self::Module => "module",
            Self::Float => "float",
            Self::String => "string",
            Self::Regexp => "regexp",
            Self::Array => "array",
            Self::Hash => "hash",
            Self::Struct => "struct",
            Self::Bignum => "bignum",
            Self::File => "file",
            Self::Data => "data",
            Self::Match => "match",
            Self::Complex => "complex",
            Self::Rational => "rational",
            Self::Symbol => "symbol",
            Self::Internal => "internal",
        }
    }

    /// Position of this tag in [`ValueType::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a type name is not one of the built-in tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownValueType(pub String);

impl fmt::Display for UnknownValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value type: {}", self.0)
    }
}

impl std::error::Error for UnknownValueType {}

impl FromStr for ValueType {
    type Err = UnknownValueType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        // Accept the runtime's "T_STRING" spelling as well as "string"
        let name = lowered.strip_prefix("t_").unwrap_or(&lowered);

        Self::ALL
            .iter()
            .copied()
            .find(|tag| tag.name() == name)
            .ok_or_else(|| UnknownValueType(s.to_string()))
    }
}

impl TryFrom<String> for ValueType {
    type Error = UnknownValueType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_all_order() {
        for (i, tag) in ValueType::ALL.iter().enumerate() {
            assert_eq!(tag.index(), i);
        }
    }

    #[test]
    fn test_parse_accepts_both_spellings() {
        assert_eq!("string".parse::<ValueType>().unwrap(), ValueType::String);
        assert_eq!("T_ARRAY".parse::<ValueType>().unwrap(), ValueType::Array);
        assert!("widget".parse::<ValueType>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&ValueType::Bignum).unwrap();
        assert_eq!(json, "\"bignum\"");

        let parsed: ValueType = serde_json::from_str("\"T_HASH\"").unwrap();
        assert_eq!(parsed, ValueType::Hash);
    }
}
