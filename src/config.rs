use crate::convert::{to_enum, ConversionError};
use crate::name::Namespace;
use crate::Result;
use serde::Deserialize;
use std::env;
use std::time::Duration;
use strum::{Display, EnumString};
use url::Url;

/// URL scheme the REST API is served over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Plain HTTP.
    Http,
    /// HTTP over TLS, which the management port uses out of the box.
    #[default]
    Https,
}

/// Where the server lives and how to talk to it.
///
/// The default points at the management port of a local server, `https://localhost:8089`, with a 60 second request
/// timeout.
///
/// # Examples
///
/// ```
/// # use splunk_sdk::{Namespace, Scheme, ServiceConfig};
/// # fn main() -> splunk_sdk::Result<()> {
/// let config = ServiceConfig::default()
///     .with_host("splunk.example.com")
///     .with_namespace(Namespace::new("admin", "search"))
///     .with_accept_invalid_certs(true);
///
/// assert_eq!(Scheme::Https, config.scheme);
/// assert_eq!("https://splunk.example.com:8089/", config.base_url()?.as_str());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// URL scheme.
    pub scheme: Scheme,
    /// Host name or address.
    pub host: String,
    /// Management port.
    pub port: u16,
    /// Namespace used by the service facade for entity-scoped requests.
    #[serde(skip)]
    pub namespace: Namespace,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Accepts self-signed server certificates, which local servers ship with.
    pub accept_invalid_certs: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::Https,
            host: "localhost".to_owned(),
            port: 8089,
            namespace: Namespace::default(),
            timeout_ms: 60_000,
            accept_invalid_certs: false,
        }
    }
}

impl ServiceConfig {
    /// Reads `SPLUNK_SCHEME`, `SPLUNK_HOST` and `SPLUNK_PORT` on top of the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(scheme) = lookup("SPLUNK_SCHEME") {
            config.scheme = to_enum(&scheme, "Scheme")?;
        }
        if let Some(host) = lookup("SPLUNK_HOST") {
            config.host = host.trim().to_owned();
        }
        if let Some(port) = lookup("SPLUNK_PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| ConversionError::new("UInt16", port.as_str()))?;
        }

        Ok(config)
    }

    /// Sets the URL scheme.
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Sets the host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the namespace of the service facade.
    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = namespace;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Accepts or rejects self-signed certificates.
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// The request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The URL every resource path is resolved against.
    pub fn base_url(&self) -> Result<Url> {
        Ok(Url::parse(&format!("{}://{}:{}", self.scheme, self.host, self.port))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_points_at_local_management_port() {
        let config = ServiceConfig::default();

        assert_eq!("https://localhost:8089/", config.base_url().unwrap().as_str());
        assert_eq!(Duration::from_secs(60), config.timeout());
        assert!(config.namespace.is_default());
    }

    #[test]
    fn test_environment_overrides_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("SPLUNK_SCHEME", "HTTP"),
            ("SPLUNK_HOST", "splunk.example.com"),
            ("SPLUNK_PORT", "8000"),
        ]))
        .unwrap();

        assert_eq!("http://splunk.example.com:8000/", config.base_url().unwrap().as_str());
    }

    #[test]
    fn test_blank_environment_keeps_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[("SPLUNK_HOST", "  ")])).unwrap();

        assert_eq!(ServiceConfig::default(), config);
    }

    #[test]
    fn test_invalid_port_fails_conversion() {
        let actual_error = ServiceConfig::from_lookup(lookup(&[("SPLUNK_PORT", "eighty")]))
            .expect_err("Operation must fail");

        assert!(matches!(actual_error, Error::Conversion(e) if e.expected() == "UInt16"));
    }

    #[test]
    fn test_keeps_sub_second_timeout() {
        let config = ServiceConfig::default().with_timeout(Duration::from_millis(1500));

        assert_eq!(Duration::from_millis(1500), config.timeout());
        assert_eq!(
            Duration::from_millis(500),
            config.with_timeout(Duration::from_millis(500)).timeout()
        );
    }

    #[test]
    fn test_deserializes_with_defaults() {
        let config: ServiceConfig =
            serde_json::from_str(r#"{"scheme": "http", "host": "10.0.0.5", "timeout_ms": 2500, "accept_invalid_certs": true}"#)
                .unwrap();

        assert_eq!(Scheme::Http, config.scheme);
        assert_eq!(8089, config.port);
        assert_eq!(Duration::from_millis(2500), config.timeout());
        assert!(config.accept_invalid_certs);
    }
}
