use std::fmt::Display;
use url::form_urlencoded;

/// An ordered list of `name=value` request arguments.
///
/// Arguments are encoded in insertion order, either as a URL query string or as a form body. The same name may
/// appear more than once, which is how the REST API receives multi-valued arguments such as `f` field lists.
///
/// # Examples
///
/// ```
/// # use splunk_sdk::ArgumentSet;
/// let args = ArgumentSet::new()
///     .with("search", "search index=main | head 10")
///     .with("count", 0)
///     .with("f", "host")
///     .with("f", "source");
///
/// assert_eq!("search=search+index%3Dmain+%7C+head+10&count=0&f=host&f=source", args.encode());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentSet {
    arguments: Vec<(String, String)>,
}

impl ArgumentSet {
    /// Creates an empty argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an argument and returns the set.
    pub fn with(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.push(name, value);
        self
    }

    /// Appends an argument.
    pub fn push(&mut self, name: impl Into<String>, value: impl Display) {
        self.arguments.push((name.into(), value.to_string()));
    }

    /// Appends an argument when `value` is present.
    pub fn push_opt<T: Display>(&mut self, name: impl Into<String>, value: Option<T>) {
        if let Some(value) = value {
            self.push(name, value);
        }
    }

    /// Appends every argument of `other`, keeping its order.
    pub fn extend(&mut self, other: &ArgumentSet) {
        self.arguments.extend(other.arguments.iter().cloned());
    }

    /// True when the set holds no argument.
    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    /// The value of the first argument called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterates over `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.arguments.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Percent-encodes the arguments as `name=value` pairs joined by `&`.
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

/// Makes a typed argument structure usable as request arguments.
pub trait ToArguments {
    /// Returns the arguments this value stands for, in the order the endpoint documents them.
    fn to_arguments(&self) -> ArgumentSet;
}

impl ToArguments for ArgumentSet {
    fn to_arguments(&self) -> ArgumentSet {
        self.clone()
    }
}

impl ToArguments for () {
    fn to_arguments(&self) -> ArgumentSet {
        ArgumentSet::new()
    }
}
