use crate::errors::Error;
use crate::http::{ArgumentSet, Method, Request, Response, Transport};
use crate::name::{Namespace, ResourceName};
use crate::Result;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{field, instrument, Span};
use url::Url;

/// Issues REST requests on behalf of a [`Service`] and every entity it creates.
///
/// Cloning a context is cheap and every clone shares the transport and the session key, so logging in through one
/// clone authorizes requests made through all of them.
///
/// [`Service`]: crate::Service
#[derive(Clone)]
pub struct Context {
    transport: Arc<dyn Transport>,
    base_url: Url,
    authorization: Arc<RwLock<Option<String>>>,
}

impl Context {
    /// Creates a context sending requests for resources under `base_url` through `transport`.
    pub fn new(transport: Arc<dyn Transport>, base_url: Url) -> Self {
        Self {
            transport,
            base_url,
            authorization: Arc::new(RwLock::new(None)),
        }
    }

    /// The scheme, host and port every resource path is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The session key sent with each request, if logged in.
    pub fn session_key(&self) -> Option<String> {
        self.authorization
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|authorization| authorization.trim_start_matches("Splunk ").to_owned())
    }

    /// Sets the session key sent as `Authorization: Splunk <key>`, or clears it.
    pub fn set_session_key(&self, session_key: Option<&str>) {
        *self.authorization.write().unwrap_or_else(PoisonError::into_inner) =
            session_key.map(|key| format!("Splunk {}", key));
    }

    /// Builds the absolute URL of `resource` in `namespace`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use splunk_sdk::{Context, Namespace, ReqwestTransport, ServiceConfig};
    /// # use std::sync::Arc;
    /// # fn main() -> splunk_sdk::Result<()> {
    /// let config = ServiceConfig::default();
    /// let context = Context::new(Arc::new(ReqwestTransport::new(&config)?), config.base_url()?);
    /// let url = context.url(&Namespace::new("admin", "search"), &"saved/searches/My Search".parse()?)?;
    ///
    /// assert_eq!("https://localhost:8089/servicesNS/admin/search/saved/searches/My%20Search", url.as_str());
    /// # Ok(())
    /// # }
    /// ```
    pub fn url(&self, namespace: &Namespace, resource: &ResourceName) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::invalid_operation(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(namespace.path_segments())
            .extend(resource.segments());

        Ok(url)
    }

    /// Sends a GET request with `args` as the query string.
    pub async fn get(&self, namespace: &Namespace, resource: &ResourceName, args: &ArgumentSet) -> Result<Response> {
        self.send(Method::Get, namespace, resource, args).await
    }

    /// Sends a POST request with `args` as the form body.
    pub async fn post(&self, namespace: &Namespace, resource: &ResourceName, args: &ArgumentSet) -> Result<Response> {
        self.send(Method::Post, namespace, resource, args).await
    }

    /// Sends a DELETE request with `args` as the query string.
    pub async fn delete(
        &self,
        namespace: &Namespace,
        resource: &ResourceName,
        args: &ArgumentSet,
    ) -> Result<Response> {
        self.send(Method::Delete, namespace, resource, args).await
    }

    /// Sends a request and fails with a [`RequestError`] unless the response status is a success.
    ///
    /// [`RequestError`]: crate::RequestError
    #[instrument(
        name = "rest_request",
        skip_all,
        fields(http.method = %method, http.path = %resource, http.status_code = field::Empty)
    )]
    pub async fn send(
        &self,
        method: Method,
        namespace: &Namespace,
        resource: &ResourceName,
        args: &ArgumentSet,
    ) -> Result<Response> {
        let mut url = self.url(namespace, resource)?;
        let form = match method {
            Method::Post => Some(args.encode()),
            Method::Get | Method::Delete => {
                if !args.is_empty() {
                    url.query_pairs_mut().extend_pairs(args.iter());
                }
                None
            }
        };
        let authorization = self
            .authorization
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let response = self
            .transport
            .send(Request {
                method,
                url,
                authorization,
                form,
            })
            .await?;
        Span::current().record("http.status_code", response.status());

        response.ensure_success().await
    }
}

impl Debug for Context {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("transport", &self.transport)
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.session_key().is_some())
            .finish()
    }
}
