//! HTTP client module
//!
//! Thin reqwest wrapper for the table API.
//!
//! # Features
//!
//! - **Basic Auth**: credentials applied to every request
//! - **JSON Accept**: `Accept: application/json` on every request
//! - **Timeouts**: one configurable per-request timeout
//! - **Proxy**: optional proxy for all schemes
//! - **Rate Limiting**: optional token bucket using governor
//!
//! No request is retried. A failure is reported once and the caller decides
//! what it means.

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
