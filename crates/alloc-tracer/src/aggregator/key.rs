//! Aggregation keys: which events land in the same row.
//!
//! A key is the tuple of configured fields taken from an allocation event.
//! Example with the default `[path, line]` configuration:
//! `("app/models/user.rb", 42)`

use crate::event::{ClassId, ValueType};
use crate::utils::config::DEFAULT_KEY_FIELDS;
use crate::utils::error::TracerError;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// One configurable component of an aggregation key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyField {
    Path,
    Line,
    Type,
    Class,
}

impl KeyField {
    /// Column name used in headers
    pub fn name(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Line => "line",
            Self::Type => "type",
            Self::Class => "class",
        }
    }
}

impl fmt::Display for KeyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyField {
    type Err = TracerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "path" => Ok(Self::Path),
            "line" => Ok(Self::Line),
            "type" => Ok(Self::Type),
            "class" => Ok(Self::Class),
            _ => Err(TracerError::Configuration(format!(
                "unsupported key field: {}",
                s
            ))),
        }
    }
}

/// Parse and validate a list of key field names
///
/// **Public** - used by `setup` and by configuration loading
///
/// An empty list selects the default `[path, line]`. Order is preserved.
///
/// # Errors
/// * `TracerError::Configuration` - unknown or repeated field name
pub fn parse_key_fields<S: AsRef<str>>(names: &[S]) -> Result<Vec<KeyField>, TracerError> {
    if names.is_empty() {
        return Ok(DEFAULT_KEY_FIELDS.to_vec());
    }

    let mut fields = Vec::with_capacity(names.len());
    for name in names {
        let field: KeyField = name.as_ref().parse()?;
        if fields.contains(&field) {
            return Err(TracerError::Configuration(format!(
                "key field listed twice: {}",
                field
            )));
        }
        fields.push(field);
    }

    Ok(fields)
}

/// Value of one key component
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyValue {
    Path(Option<Arc<str>>),
    Line(u32),
    Type(ValueType),
    Class(Option<ClassId>),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(Some(path)) => f.write_str(path),
            Self::Path(None) => Ok(()),
            Self::Line(line) => write!(f, "{}", line),
            Self::Type(value_type) => write!(f, "{}", value_type),
            Self::Class(Some(class)) => write!(f, "{}", class),
            Self::Class(None) => f.write_str("<internal>"),
        }
    }
}

/// Ordered tuple of key values
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AggregationKey(Vec<KeyValue>);

impl AggregationKey {
    pub fn new(values: Vec<KeyValue>) -> Self {
        Self(values)
    }

    /// Key for the default `[path, line]` configuration
    pub fn site(path: &str, line: u32) -> Self {
        Self(vec![KeyValue::Path(Some(Arc::from(path))), KeyValue::Line(line)])
    }

    pub fn values(&self) -> &[KeyValue] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AggregationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{}", value)?;
        }
        Ok(())
    }
}

/// Build the aggregation key for one allocation
///
/// **Public** - pure function of its inputs and the field configuration
///
/// # Arguments
/// * `fields` - Configured key fields, in order
/// * `path` - Interned source path of the allocation site
/// * `line` - Source line of the allocation site
/// * `value_type` - Type tag of the allocated value
/// * `class` - Class of the allocated value, if any
pub fn build_key(
    fields: &[KeyField],
    path: Option<&Arc<str>>,
    line: u32,
    value_type: ValueType,
    class: Option<ClassId>,
) -> AggregationKey {
    let values = fields
        .iter()
        .map(|field| match field {
            KeyField::Path => KeyValue::Path(path.cloned()),
            KeyField::Line => KeyValue::Line(line),
            KeyField::Type => KeyValue::Type(value_type),
            KeyField::Class => KeyValue::Class(class),
        })
        .collect();

    AggregationKey(values)
}

/// Deduplicates source paths so rows and shadow records share one allocation
#[derive(Debug, Default)]
pub struct PathInterner {
    paths: HashSet<Arc<str>>,
}

impl PathInterner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, path: &str) -> Arc<str> {
        if let Some(existing) = self.paths.get(path) {
            return Arc::clone(existing);
        }

        let interned: Arc<str> = Arc::from(path);
        self.paths.insert(Arc::clone(&interned));
        interned
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Forget all paths; keys already built keep their own references
    pub fn clear(&mut self) {
        self.paths.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_fields_preserves_order() {
        let fields = parse_key_fields(&["class", "path", "line"]).unwrap();
        assert_eq!(fields, vec![KeyField::Class, KeyField::Path, KeyField::Line]);
    }

    #[test]
    fn test_parse_key_fields_empty_is_default() {
        let names: [&str; 0] = [];
        assert_eq!(
            parse_key_fields(&names).unwrap(),
            vec![KeyField::Path, KeyField::Line]
        );
    }

    #[test]
    fn test_parse_key_fields_rejects_unknown_and_duplicates() {
        assert!(matches!(
            parse_key_fields(&["path", "method"]),
            Err(TracerError::Configuration(_))
        ));
        assert!(matches!(
            parse_key_fields(&["line", "line"]),
            Err(TracerError::Configuration(_))
        ));
    }

    #[test]
    fn test_build_key_follows_field_order() {
        let path: Arc<str> = Arc::from("a.rb");
        let class = ClassId::from_raw(3);
        let key = build_key(
            &[KeyField::Type, KeyField::Line, KeyField::Class],
            Some(&path),
            10,
            ValueType::Array,
            Some(class),
        );

        assert_eq!(
            key.values(),
            &[
                KeyValue::Type(ValueType::Array),
                KeyValue::Line(10),
                KeyValue::Class(Some(class)),
            ]
        );
    }

    #[test]
    fn test_same_fields_same_key() {
        let path: Arc<str> = Arc::from("a.rb");
        let fields = [KeyField::Path, KeyField::Line];
        let a = build_key(&fields, Some(&path), 1, ValueType::String, None);
        let b = build_key(&fields, Some(&path), 1, ValueType::Array, None);
        assert_eq!(a, b);
        assert_eq!(a, AggregationKey::site("a.rb", 1));
    }

    #[test]
    fn test_path_interner_shares_allocations() {
        let mut interner = PathInterner::new();
        let a = interner.intern("lib/x.rb");
        let b = interner.intern("lib/x.rb");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(interner.len(), 1);

        interner.clear();
        assert!(interner.is_empty());
        assert_eq!(a.as_ref(), "lib/x.rb");
    }

    #[test]
    fn test_key_display() {
        let key = AggregationKey::site("a.rb", 7);
        assert_eq!(key.to_string(), "a.rb:7");
    }
}
