//! HTTP capability used by the listing client and the fetcher.
//!
//! [`DavTransport`] is the seam between the engine and the network: the
//! engine only ever asks for a `PROPFIND` or a `GET` of a fully-built URL and
//! receives the status code and the complete body. [`UreqTransport`] is the
//! production implementation; tests substitute an in-memory fake.

use thiserror::Error;
use tracing::debug;
use ureq::Agent;
use ureq::http;

use crate::config::Credentials;

/// Boxed error from the underlying HTTP stack.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The request could not be completed at the transport level.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connecting, sending, or receiving the response head failed.
    #[error("{method} {url}: request failed: {source}")]
    Request {
        method: &'static str,
        url: String,
        #[source]
        source: BoxError,
    },

    /// The response body could not be read to the end.
    #[error("{method} {url}: failed to read response body: {source}")]
    Body {
        method: &'static str,
        url: String,
        #[source]
        source: BoxError,
    },
}

/// Status code plus fully-read body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl DavResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking WebDAV request capability.
///
/// Every request carries the run's credentials. Non-2xx statuses are
/// returned as responses, not errors; only transport failures are `Err`.
pub trait DavTransport: Send + Sync {
    /// `PROPFIND` with `Depth: 1` and an empty body.
    fn propfind(&self, url: &str) -> Result<DavResponse, TransportError>;

    /// Plain `GET`.
    fn get(&self, url: &str) -> Result<DavResponse, TransportError>;
}

/// [`DavTransport`] backed by a `ureq` agent.
pub struct UreqTransport {
    agent: Agent,
    authorization: String,
}

impl UreqTransport {
    pub fn new(credentials: &Credentials) -> Self {
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .allow_non_standard_methods(true)
            .build();
        Self {
            agent: Agent::new_with_config(config),
            authorization: credentials.basic_auth_header(),
        }
    }

    fn send(
        &self,
        method: &'static str,
        url: &str,
        depth: Option<&str>,
    ) -> Result<DavResponse, TransportError> {
        let request_error = |source: BoxError| TransportError::Request {
            method,
            url: url.to_string(),
            source,
        };

        let mut builder = http::Request::builder()
            .method(method)
            .uri(url)
            .header("Content-Type", "application/xml")
            .header("Authorization", self.authorization.as_str());
        if let Some(depth) = depth {
            builder = builder.header("Depth", depth);
        }
        let request = builder.body(()).map_err(|e| request_error(Box::new(e)))?;

        let mut response = self
            .agent
            .run(request)
            .map_err(|e| request_error(Box::new(e)))?;
        let status = response.status().as_u16();
        debug!(method, url, status, "received response");

        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|e| TransportError::Body {
                method,
                url: url.to_string(),
                source: Box::new(e),
            })?;

        Ok(DavResponse { status, body })
    }
}

impl DavTransport for UreqTransport {
    fn propfind(&self, url: &str) -> Result<DavResponse, TransportError> {
        self.send("PROPFIND", url, Some("1"))
    }

    fn get(&self, url: &str) -> Result<DavResponse, TransportError> {
        self.send("GET", url, None)
    }
}
