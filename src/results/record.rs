use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// The value of one field of a search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// A field with exactly one value.
    Single(String),
    /// A multi-valued field. Formats as its values joined by the delimiter of the reader that produced it.
    Multi {
        /// Values in document order.
        values: Vec<String>,
        /// Delimiter used by [`Display`].
        delimiter: Arc<str>,
    },
}

impl Field {
    pub(crate) fn from_values(mut values: Vec<String>, delimiter: &Arc<str>) -> Self {
        if values.len() == 1 {
            if let Some(value) = values.pop() {
                return Field::Single(value);
            }
        }

        Field::Multi {
            values,
            delimiter: Arc::clone(delimiter),
        }
    }

    /// The values of the field in document order.
    pub fn values(&self) -> &[String] {
        match self {
            Field::Single(value) => std::slice::from_ref(value),
            Field::Multi { values, .. } => values,
        }
    }

    /// The value of a single-valued field.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Field::Single(value) => Some(value),
            Field::Multi { .. } => None,
        }
    }

    /// True when the field has more or fewer than one value.
    pub fn is_multi(&self) -> bool {
        matches!(self, Field::Multi { .. })
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Single(value) => write!(f, "{}", value),
            Field::Multi { values, delimiter } => write!(f, "{}", values.join(delimiter)),
        }
    }
}

/// One search result: field names mapped to their values.
///
/// A record holds only the fields the server sent for it, which may be fewer than the field order of its result set
/// announced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: BTreeMap<String, Field>,
    segmented_raw: Option<String>,
}

impl Record {
    pub(crate) fn new(fields: BTreeMap<String, Field>, segmented_raw: Option<String>) -> Self {
        Self { fields, segmented_raw }
    }

    /// The field called `name`.
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Iterates over fields by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the record has no field.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The `_raw` markup with its highlighting segments, when the server sent one.
    pub fn segmented_raw(&self) -> Option<&str> {
        self.segmented_raw.as_deref()
    }
}
