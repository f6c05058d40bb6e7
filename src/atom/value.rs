use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// A property value parsed from the `content` element of an Atom entry.
///
/// The REST vocabulary nests `dict` and `list` elements arbitrarily deep, so the value is recursive. Scalars are
/// kept as the raw strings the server sent; use [`FromValue`] or a [`PropertyBag`] to get typed values.
///
/// [`FromValue`]: crate::FromValue
/// [`PropertyBag`]: crate::PropertyBag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A plain text value.
    Scalar(String),
    /// An ordered list of values, parsed from `<list><item>…</item></list>`.
    List(Vec<Value>),
    /// A dictionary of values, parsed from `<dict><key name="…">…</key></dict>`.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the text of a scalar value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the items of a list value.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries of a dictionary value.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up `name` when this value is a dictionary.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.as_map().and_then(|entries| entries.get(name))
    }

    /// Follows `path` through nested dictionaries.
    ///
    /// # Examples
    ///
    /// ```
    /// # use splunk_sdk::Value;
    /// # use std::collections::BTreeMap;
    /// let acl = Value::Map(BTreeMap::from([("Owner".to_owned(), Value::Scalar("admin".to_owned()))]));
    /// let content = Value::Map(BTreeMap::from([("Eai".to_owned(), Value::Map(BTreeMap::from([("Acl".to_owned(), acl)])))]));
    ///
    /// assert_eq!(Some("admin"), content.lookup(&["Eai", "Acl", "Owner"]).and_then(Value::as_str));
    /// ```
    pub fn lookup(&self, path: &[&str]) -> Option<&Value> {
        path.iter().try_fold(self, |value, name| value.get(name))
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Scalar(text) => write!(f, "{}", text),
            Value::List(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (index, (name, value)) in entries.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Scalar(text.to_owned())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Scalar(text)
    }
}
