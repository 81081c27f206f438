//! Mock HTTP client for testing.
//!
//! Routes are keyed by exact URL. Unrouted URLs behave like a refused
//! connection. In proxy mode the mock also remembers which URLs have been
//! fetched with GET and answers later HEAD requests for them as cache hits,
//! which is how a caching server behaves once it holds an artifact.

use std::collections::{HashMap, HashSet};
use std::io::{self, Cursor, Read};
use std::sync::Arc;

use parking_lot::Mutex;

use super::client::{HttpClient, HttpError, ResponseHead, StreamResponse};

/// Callback invoked once a body reader has produced a given number of bytes.
pub type ReadHook = Arc<dyn Fn() + Send + Sync>;

/// Canned response for a mocked URL.
#[derive(Clone)]
pub struct MockResponse {
    pub head: ResponseHead,
    pub body: Vec<u8>,
    /// Fail the body read with `ConnectionReset` after this many bytes.
    pub fail_after: Option<usize>,
    /// Invoke the hook once this many bytes have been read.
    pub hook: Option<(usize, ReadHook)>,
}

impl MockResponse {
    /// A 200 response carrying `body` with a length and binary content type.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        Self {
            head: ResponseHead::new(200)
                .with_header("Content-Length", body.len().to_string())
                .with_header("Content-Type", "application/octet-stream"),
            body,
            fail_after: None,
            hook: None,
        }
    }

    /// A bodiless response with the given status.
    pub fn status(status: u16) -> Self {
        Self {
            head: ResponseHead::new(status),
            body: Vec::new(),
            fail_after: None,
            hook: None,
        }
    }

    /// Replace the head.
    pub fn with_head(mut self, head: ResponseHead) -> Self {
        self.head = head;
        self
    }

    /// Break the connection after `bytes` bytes of body.
    pub fn failing_after(mut self, bytes: usize) -> Self {
        self.fail_after = Some(bytes);
        self
    }

    /// Run `hook` once `bytes` bytes of body have been read.
    pub fn with_hook(mut self, bytes: usize, hook: ReadHook) -> Self {
        self.hook = Some((bytes, hook));
        self
    }
}

struct MockBody {
    data: Cursor<Vec<u8>>,
    read: usize,
    fail_after: Option<usize>,
    hook: Option<(usize, ReadHook)>,
}

impl Read for MockBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(limit) = self.fail_after {
            if self.read >= limit {
                return Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "connection reset by peer",
                ));
            }
        }
        // Small reads so hooks and failures land mid-transfer.
        let cap = buf.len().min(16);
        let cap = match self.fail_after {
            Some(limit) => cap.min(limit - self.read),
            None => cap,
        };
        let n = self.data.read(&mut buf[..cap])?;
        self.read += n;
        if let Some((at, hook)) = &self.hook {
            if self.read >= *at {
                hook();
                self.hook = None;
            }
        }
        Ok(n)
    }
}

/// Mock HTTP client recording every request it serves.
#[derive(Default)]
pub struct MockHttpClient {
    heads: Mutex<HashMap<String, ResponseHead>>,
    gets: Mutex<HashMap<String, MockResponse>>,
    stored: Mutex<HashSet<String>>,
    proxy_mode: bool,
    requests: Mutex<Vec<String>>,
}

impl MockHttpClient {
    /// Create an empty mock; every URL is unreachable until routed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that behaves like a caching server for GET routes.
    pub fn proxy() -> Self {
        Self {
            proxy_mode: true,
            ..Self::default()
        }
    }

    /// Route HEAD requests for `url`.
    pub fn on_head(&self, url: &str, head: ResponseHead) {
        self.heads.lock().insert(url.to_string(), head);
    }

    /// Route GET requests for `url`.
    pub fn on_get(&self, url: &str, response: MockResponse) {
        self.gets.lock().insert(url.to_string(), response);
    }

    /// Every request served so far, as `"METHOD url"`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    /// Number of requests whose URL contains `needle`.
    pub fn count_matching(&self, needle: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.contains(needle))
            .count()
    }

    fn record(&self, method: &str, url: &str) {
        self.requests.lock().push(format!("{} {}", method, url));
    }

    fn refused(url: &str) -> HttpError {
        HttpError::Connect {
            url: url.to_string(),
            reason: "connection refused".to_string(),
        }
    }
}

impl HttpClient for MockHttpClient {
    fn head(&self, url: &str) -> Result<ResponseHead, HttpError> {
        self.record("HEAD", url);
        if self.proxy_mode && self.stored.lock().contains(url) {
            let len = self
                .gets
                .lock()
                .get(url)
                .map(|r| r.body.len())
                .unwrap_or(0);
            return Ok(ResponseHead::new(200)
                .with_header("Content-Length", len.to_string())
                .with_header("Content-Type", "application/octet-stream")
                .with_header("X-Cache", "HIT from mock"));
        }
        if let Some(head) = self.heads.lock().get(url) {
            return Ok(head.clone());
        }
        if self.proxy_mode {
            if let Some(response) = self.gets.lock().get(url) {
                return Ok(response.head.clone());
            }
        }
        Err(Self::refused(url))
    }

    fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        self.record("GET", url);
        let response = self
            .gets
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| Self::refused(url))?;
        if !response.head.is_success() {
            return Err(HttpError::Status {
                url: url.to_string(),
                status: response.head.status,
            });
        }
        Ok(response.body)
    }

    fn get_stream(&self, url: &str) -> Result<StreamResponse, HttpError> {
        self.record("GET", url);
        let response = self
            .gets
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| Self::refused(url))?;
        let head = if self.proxy_mode && self.stored.lock().contains(url) {
            response.head.clone().with_header("X-Cache", "HIT from mock")
        } else {
            response.head.clone()
        };
        if self.proxy_mode && response.head.is_success() && response.fail_after.is_none() {
            self.stored.lock().insert(url.to_string());
        }
        Ok(StreamResponse {
            head,
            body: Box::new(MockBody {
                data: Cursor::new(response.body),
                read: 0,
                fail_after: response.fail_after,
                hook: response.hook,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_client_success() {
        let mock = MockHttpClient::new();
        mock.on_get("http://example.com", MockResponse::ok(vec![1, 2, 3, 4]));

        let result = mock.get("http://example.com");
        assert_eq!(result.unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(mock.requests(), vec!["GET http://example.com".to_string()]);
    }

    #[test]
    fn test_mock_client_unrouted_is_refused() {
        let mock = MockHttpClient::new();
        let result = mock.head("http://nowhere.invalid");
        assert!(matches!(result, Err(HttpError::Connect { .. })));
    }

    #[test]
    fn test_mock_body_fails_after_limit() {
        let mock = MockHttpClient::new();
        mock.on_get(
            "http://example.com/big",
            MockResponse::ok(vec![7u8; 100]).failing_after(40),
        );

        let mut stream = mock.get_stream("http://example.com/big").unwrap();
        let mut buf = Vec::new();
        let err = stream.body.read_to_end(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
        assert_eq!(buf.len(), 40);
    }

    #[test]
    fn test_proxy_mode_remembers_fetched_urls() {
        let mock = MockHttpClient::proxy();
        let url = "http://cache:49672/a.zip?source=example.com";
        mock.on_get(url, MockResponse::ok(vec![1u8; 10]));

        assert_eq!(mock.head(url).unwrap().header("x-cache"), None);

        let mut stream = mock.get_stream(url).unwrap();
        let mut sink = Vec::new();
        stream.body.read_to_end(&mut sink).unwrap();

        let head = mock.head(url).unwrap();
        assert_eq!(head.header("x-cache"), Some("HIT from mock"));
        assert_eq!(head.content_length(), Some(10));
    }
}
