use crate::atom::Value;
use crate::convert::{ConversionError, FromValue};
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Debug, Formatter};
use std::sync::{Mutex, PoisonError};

type Cache = HashMap<(Vec<String>, TypeId), Box<dyn Any + Send + Sync>>;

/// The properties of an entity with typed, cached access.
///
/// Absent properties read as `None`, malformed ones fail with a [`ConversionError`]. The first successful conversion
/// of a property to a type is cached, so later reads of the same property as the same type do not parse again.
///
/// # Examples
///
/// ```
/// # use splunk_sdk::{PropertyBag, Value};
/// # use std::collections::BTreeMap;
/// let properties = PropertyBag::new(BTreeMap::from([
///     ("Disabled".to_owned(), Value::from("0")),
///     ("TotalEventCount".to_owned(), Value::from("1024")),
/// ]));
///
/// assert_eq!(Some(false), properties.get::<bool>("Disabled").unwrap());
/// assert_eq!(Some(1024), properties.get::<u64>("TotalEventCount").unwrap());
/// assert_eq!(None, properties.get::<String>("HomePath").unwrap());
/// assert_eq!(5, properties.get_or("MaxHotBuckets", 5u64).unwrap());
/// ```
pub struct PropertyBag {
    values: BTreeMap<String, Value>,
    cache: Mutex<Cache>,
}

impl PropertyBag {
    /// Creates a bag over the given properties.
    pub fn new(values: BTreeMap<String, Value>) -> Self {
        Self {
            values,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a bag over the dictionary of an entry's content. Any other content yields an empty bag.
    pub fn from_content(content: Option<&Value>) -> Self {
        match content {
            Some(Value::Map(values)) => Self::new(values.clone()),
            _ => Self::new(BTreeMap::new()),
        }
    }

    /// The raw value of a property.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Names of all properties in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of top-level properties.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when there are no properties.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Converts a property to `T`, or returns `None` if it is absent.
    pub fn get<T>(&self, name: &str) -> Result<Option<T>, ConversionError>
    where
        T: FromValue + Clone + Send + Sync + 'static,
    {
        self.get_at(&[name])
    }

    /// Converts a property to `T`, or returns `default` if it is absent.
    pub fn get_or<T>(&self, name: &str, default: T) -> Result<T, ConversionError>
    where
        T: FromValue + Clone + Send + Sync + 'static,
    {
        Ok(self.get(name)?.unwrap_or(default))
    }

    /// Converts a property nested in dictionaries, such as `["Eai", "Acl", "Owner"]`, to `T`.
    pub fn get_at<T>(&self, path: &[&str]) -> Result<Option<T>, ConversionError>
    where
        T: FromValue + Clone + Send + Sync + 'static,
    {
        let key = (path.iter().map(|name| name.to_string()).collect::<Vec<_>>(), TypeId::of::<T>());

        if let Some(cached) = self.lock().get(&key).and_then(|cached| cached.downcast_ref::<T>()) {
            return Ok(Some(cached.clone()));
        }

        let value = match path.split_first() {
            Some((first, rest)) => self.values.get(*first).and_then(|value| value.lookup(rest)),
            None => None,
        };
        let Some(value) = value else {
            return Ok(None);
        };

        let converted = T::from_value(value)?;
        self.lock().insert(key, Box::new(converted.clone()));

        Ok(Some(converted))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Cache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn cached(&self) -> usize {
        self.lock().len()
    }
}

impl Clone for PropertyBag {
    fn clone(&self) -> Self {
        Self::new(self.values.clone())
    }
}

impl Debug for PropertyBag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.values.iter()).finish()
    }
}

impl PartialEq for PropertyBag {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}
