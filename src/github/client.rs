//! Minimal blocking GitHub REST client.

use headers::authorization::Bearer;
use headers::{Authorization, HeaderMapExt, UserAgent};
use hyper::client::HttpConnector;
use hyper::header::ACCEPT;
use hyper::{Body, Client, Method, Request, Uri};
use hyper_tls::HttpsConnector;
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use crate::call::ApiCallError;
use crate::constants::GITHUB_API_ENDPOINT;
use crate::github::rate_limiter::{RateLimit, RateLimitProvider};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct RateLimitResponse {
    resources: RateLimitResources,
}

#[derive(Debug, Deserialize)]
struct RateLimitResources {
    core: RateLimit,
}

/// GitHub API client driving its requests on a private runtime, so callers
/// stay synchronous.
pub struct GithubClient {
    client: Client<HttpsConnector<HttpConnector>>,
    runtime: Runtime,
    token: Option<Authorization<Bearer>>,
    endpoint: String,
}

impl GithubClient {
    /// Client for `api.github.com`. An empty token makes anonymous requests.
    pub fn new(token: &str) -> Result<Self, ApiCallError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let token = if token.is_empty() {
            None
        } else {
            let token = Authorization::bearer(token).map_err(|_| {
                ApiCallError::Http("GitHub token is not a valid header value".into())
            })?;
            Some(token)
        };
        let client = Client::builder()
            .pool_max_idle_per_host(0)
            .build(HttpsConnector::new());

        Ok(Self {
            client,
            runtime,
            token,
            endpoint: GITHUB_API_ENDPOINT.to_string(),
        })
    }

    /// Sends requests to `endpoint` instead, e.g. a GitHub Enterprise API.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// GETs `path` and decodes the JSON answer.
    ///
    /// Error statuses become [`ApiCallError::Api`] carrying the response
    /// payload (or its text, when it is not JSON).
    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiCallError> {
        self.runtime.block_on(self.fetch(path))
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiCallError> {
        let uri: Uri = format!("{}{}", self.endpoint, path)
            .parse()
            .map_err(|err: hyper::http::uri::InvalidUri| ApiCallError::Http(Box::new(err)))?;
        let mut request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(ACCEPT, "application/vnd.github+json")
            .body(Body::empty())?;
        request
            .headers_mut()
            .typed_insert(UserAgent::from_static(USER_AGENT));
        if let Some(token) = &self.token {
            request.headers_mut().typed_insert(token.clone());
        }

        let response = self.client.request(request).await?;
        let status = response.status();
        let body = hyper::body::to_bytes(response.into_body()).await?;
        debug!(path, status = status.as_u16(), bytes = body.len(), "GitHub response.");

        if !status.is_success() {
            let data = serde_json::from_slice(&body).unwrap_or_else(|_| {
                serde_json::Value::String(String::from_utf8_lossy(&body).into_owned())
            });
            return Err(ApiCallError::Api {
                status: status.as_u16(),
                data,
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

impl RateLimitProvider for GithubClient {
    fn rate_limit(&self) -> Result<RateLimit, ApiCallError> {
        let response: RateLimitResponse = self.get("/rate_limit")?;
        Ok(response.resources.core)
    }
}
