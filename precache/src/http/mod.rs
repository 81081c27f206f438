//! HTTP client abstraction for testability
//!
//! Every network operation in the engine (liveness probes, feed retrieval,
//! cache probes, asset transfers) goes through the [`HttpClient`] trait so
//! that components can be exercised against [`MockHttpClient`] in tests.
//!
//! All calls are blocking and bounded by the timeout the client was built
//! with.

mod client;
#[cfg(test)]
mod mock;

pub use client::{HttpClient, HttpError, ReqwestClient, ResponseHead, StreamResponse};

#[cfg(test)]
pub use mock::{MockHttpClient, MockResponse};
