//! Blocking HTTP client built on reqwest.

use std::fmt;
use std::io::Read;
use std::time::Duration;

use thiserror::Error;

/// Default timeout for HTTP requests in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors raised by the HTTP layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpError {
    /// The connection could not be established or the request failed to send.
    #[error("request to {url} failed: {reason}")]
    Connect { url: String, reason: String },

    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// The response body could not be read.
    #[error("failed to read response from {url}: {reason}")]
    Body { url: String, reason: String },

    /// The underlying client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

/// Status line and headers of a response, without the body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    /// HTTP status code.
    pub status: u16,
    /// Header pairs with lowercase names.
    headers: Vec<(String, String)>,
}

impl ResponseHead {
    /// Create a head with the given status and no headers.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
        }
    }

    /// Add a header (builder style).
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .push((name.as_ref().to_ascii_lowercase(), value.into()));
        self
    }

    /// Look up a header value, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parsed `Content-Length`, if present and numeric.
    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length")
            .and_then(|v| v.trim().parse::<u64>().ok())
    }

    /// `Content-Type`, if present and non-empty.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type").filter(|v| !v.trim().is_empty())
    }
}

/// A response whose body is read incrementally.
pub struct StreamResponse {
    /// Status and headers.
    pub head: ResponseHead,
    /// Body reader. Dropping it closes the connection.
    pub body: Box<dyn Read + Send>,
}

impl fmt::Debug for StreamResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamResponse")
            .field("head", &self.head)
            .finish_non_exhaustive()
    }
}

/// Trait for HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP HEAD request.
    ///
    /// Any status the server answers with is returned as `Ok`; only transport
    /// failures are errors.
    fn head(&self, url: &str) -> Result<ResponseHead, HttpError>;

    /// Performs an HTTP GET request and returns the whole body.
    ///
    /// Non-success statuses are reported as [`HttpError::Status`].
    fn get(&self, url: &str) -> Result<Vec<u8>, HttpError>;

    /// Performs an HTTP GET request and returns the body as a stream.
    ///
    /// Any status is returned as `Ok` so the caller can classify it.
    fn get_stream(&self, url: &str) -> Result<StreamResponse, HttpError>;
}

/// Real HTTP client implementation using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with default configuration.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new ReqwestClient with custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(DEFAULT_TIMEOUT_SECS)))
            .user_agent(concat!("precache/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// The timeout applied to every request.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn map_error(&self, url: &str, e: reqwest::Error) -> HttpError {
        if e.is_timeout() {
            HttpError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            HttpError::Connect {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

fn head_of(response: &reqwest::blocking::Response) -> ResponseHead {
    response
        .headers()
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
        .fold(ResponseHead::new(response.status().as_u16()), |head, (k, v)| {
            head.with_header(k, v)
        })
}

impl HttpClient for ReqwestClient {
    fn head(&self, url: &str) -> Result<ResponseHead, HttpError> {
        let response = self
            .client
            .head(url)
            .send()
            .map_err(|e| self.map_error(url, e))?;
        Ok(head_of(&response))
    }

    fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| self.map_error(url, e))?;

        if !response.status().is_success() {
            return Err(HttpError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| HttpError::Body {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    fn get_stream(&self, url: &str) -> Result<StreamResponse, HttpError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| self.map_error(url, e))?;

        Ok(StreamResponse {
            head: head_of(&response),
            body: Box::new(response),
        })
    }
}
