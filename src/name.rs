use crate::errors::Error;
use crate::Result;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The path of a REST resource relative to its namespace, e.g. `data/indexes/main`.
///
/// A resource name is an immutable, non-empty sequence of non-empty segments. Names compare lexicographically by
/// segment, so `data/indexes` sorts before `data/indexes/main`.
///
/// # Examples
///
/// ```
/// # use splunk_sdk::ResourceName;
/// # fn main() -> splunk_sdk::Result<()> {
/// let indexes: ResourceName = "data/indexes".parse()?;
/// let main = indexes.join("main")?;
///
/// assert_eq!("data/indexes/main", main.to_string());
/// assert_eq!("main", main.title());
/// assert!(indexes < main);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceName {
    segments: Vec<String>,
}

impl ResourceName {
    /// Creates a resource name from its segments.
    ///
    /// Fails when there are no segments or a segment is empty.
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();

        if segments.is_empty() {
            return Err(Error::invalid_operation("resource name must have at least one segment"));
        }
        if segments.iter().any(String::is_empty) {
            return Err(Error::invalid_operation(format!(
                "resource name {:?} contains an empty segment",
                segments
            )));
        }

        Ok(Self { segments })
    }

    /// Returns a new name with `segment` appended.
    pub fn join(&self, segment: impl Into<String>) -> Result<Self> {
        let mut segments = self.segments.clone();
        segments.push(segment.into());

        Self::new(segments)
    }

    /// The path segments in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The last segment, which is the title of the resource it names.
    pub fn title(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Name of the collection that contains this resource, if any.
    pub fn parent(&self) -> Option<Self> {
        match self.segments.len() {
            0 | 1 => None,
            length => Some(Self {
                segments: self.segments[..length - 1].to_vec(),
            }),
        }
    }
}

impl FromStr for ResourceName {
    type Err = Error;

    fn from_str(path: &str) -> Result<Self> {
        Self::new(path.trim_matches('/').split('/'))
    }
}

impl Display for ResourceName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// One half of a [`Namespace`]: a concrete user or app name, or the wildcard matching all of them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
    /// A concrete user or app name.
    Specific(String),
    /// Matches every user or app; valid only for collection-level queries.
    Wildcard,
}

impl Scope {
    const WILDCARD: &'static str = "-";

    fn from_name(name: &str) -> Self {
        match name {
            Self::WILDCARD | "" => Scope::Wildcard,
            name => Scope::Specific(name.to_owned()),
        }
    }

    fn as_segment(&self) -> &str {
        match self {
            Scope::Specific(name) => name,
            Scope::Wildcard => Self::WILDCARD,
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_segment())
    }
}

/// The `(user, app)` pair that qualifies a resource path.
///
/// The default namespace addresses the unscoped `/services` tree. Any other namespace addresses
/// `/servicesNS/<user>/<app>`, where either part may be the `-` wildcard.
///
/// # Examples
///
/// ```
/// # use splunk_sdk::Namespace;
/// let scoped = Namespace::new("admin", "search");
/// let all = Namespace::new("-", "-");
///
/// assert!(scoped.is_specific());
/// assert!(!all.is_specific());
/// assert_eq!(vec!["servicesNS", "admin", "search"], scoped.path_segments());
/// assert_eq!(vec!["services"], Namespace::default().path_segments());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Namespace {
    scopes: Option<(Scope, Scope)>,
}

impl Namespace {
    /// Creates a namespace for `user` and `app`. Use `-` for a wildcard.
    pub fn new(user: &str, app: &str) -> Self {
        Self {
            scopes: Some((Scope::from_name(user), Scope::from_name(app))),
        }
    }

    /// The user part, or `None` for the default namespace.
    pub fn user(&self) -> Option<&Scope> {
        self.scopes.as_ref().map(|(user, _)| user)
    }

    /// The app part, or `None` for the default namespace.
    pub fn app(&self) -> Option<&Scope> {
        self.scopes.as_ref().map(|(_, app)| app)
    }

    /// True for the unscoped `/services` namespace.
    pub fn is_default(&self) -> bool {
        self.scopes.is_none()
    }

    /// True when neither part is a wildcard. Entity-scoped requests need a specific or default namespace.
    pub fn is_specific(&self) -> bool {
        match &self.scopes {
            Some((Scope::Specific(_), Scope::Specific(_))) => true,
            Some(_) => false,
            None => true,
        }
    }

    /// The leading URL path segments for resources in this namespace.
    pub fn path_segments(&self) -> Vec<&str> {
        match &self.scopes {
            Some((user, app)) => vec!["servicesNS", user.as_segment(), app.as_segment()],
            None => vec!["services"],
        }
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}/", self.path_segments().join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_name() {
        let actual_error = ResourceName::new(Vec::<String>::new()).expect_err("Operation must fail");

        assert!(matches!(actual_error, Error::InvalidOperation(_)));
    }

    #[test]
    fn test_rejects_empty_segment() {
        assert!("data//indexes".parse::<ResourceName>().is_err());
    }

    #[test]
    fn test_parses_and_trims_slashes() {
        let name: ResourceName = "/search/jobs/".parse().unwrap();

        assert_eq!(["search", "jobs"], name.segments());
        assert_eq!("jobs", name.title());
    }

    #[test]
    fn test_orders_lexicographically_by_segment() {
        let a: ResourceName = "apps/local".parse().unwrap();
        let b: ResourceName = "apps/local/search".parse().unwrap();
        let c: ResourceName = "data/indexes".parse().unwrap();

        let mut names = vec![c.clone(), b.clone(), a.clone()];
        names.sort();

        assert_eq!(vec![a, b, c], names);
    }

    #[test]
    fn test_parent_of_nested_name() {
        let name: ResourceName = "saved/searches/Errors".parse().unwrap();

        assert_eq!(Some("saved/searches".parse().unwrap()), name.parent());
        assert_eq!(None, "apps".parse::<ResourceName>().unwrap().parent());
    }

    #[test]
    fn test_namespace_formats_as_path() {
        assert_eq!("/services/", Namespace::default().to_string());
        assert_eq!("/servicesNS/nobody/search/", Namespace::new("nobody", "search").to_string());
        assert_eq!("/servicesNS/-/-/", Namespace::new("-", "-").to_string());
    }

    #[test]
    fn test_namespace_with_one_wildcard_is_not_specific() {
        let namespace = Namespace::new("admin", "-");

        assert!(!namespace.is_specific());
        assert_eq!(Some(&Scope::Wildcard), namespace.app());
        assert_eq!(Some(&Scope::Specific("admin".to_owned())), namespace.user());
    }
}
