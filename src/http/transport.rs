use crate::config::ServiceConfig;
use crate::http::{Body, Response};
use crate::Result;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::fmt::Debug;
use strum::Display;
use url::Url;

/// HTTP method of a REST request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    /// Reads a resource.
    Get,
    /// Creates or updates a resource, with arguments sent as a form body.
    Post,
    /// Removes a resource.
    Delete,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A request ready to be sent by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL, including the query string for GET and DELETE.
    pub url: Url,
    /// Value of the `Authorization` header, once logged in.
    pub authorization: Option<String>,
    /// URL-encoded form body for POST.
    pub form: Option<String>,
}

/// Sends requests and returns responses with streamed bodies.
///
/// [`ReqwestTransport`] is used unless a service is given another implementation, which is mostly useful in tests.
#[async_trait]
pub trait Transport: Debug + Send + Sync {
    /// Sends `request` and returns the response as soon as its headers arrive.
    async fn send(&self, request: Request) -> Result<Response>;
}

/// The default [`Transport`], backed by a [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a client honouring the timeout and certificate settings of `config`.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let mut builder = self.client.request(request.method.into(), request.url);

        if let Some(authorization) = request.authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }
        if let Some(form) = request.form {
            builder = builder
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(form);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();

        Ok(Response::new(status, Body::from_stream(response.bytes_stream())))
    }
}
