//! `retry-json-http` is a typed async HTTP GET client.
//!
//! [`JsonHttpClient::get`](HttpClient::get) normalizes the URI to `http://`,
//! retries transport faults with exponential backoff (`2^r` seconds before
//! retry `r`) and decodes a successful JSON body into the caller's type.
//! Non-2xx responses and empty bodies resolve to `T::default()`.
//!
//! Target types follow the camelCase convention: declare
//! `#[serde(rename_all = "camelCase")]` and incoming keys such as
//! `UserName` or `userName` both bind to `user_name`.

mod client;
mod decode;
mod error;
mod options;
mod retry;
mod transport;

pub use client::{normalize_uri, HttpClient, JsonHttpClient};
pub use error::HttpClientError;
pub use options::{ClientOptions, DEFAULT_SECTION, RETRIES_ENV};
pub use retry::{retry, RetryPolicy, Retrying};
pub use transport::{ReqwestTransport, Transport, TransportResponse};

pub type Result<T> = std::result::Result<T, HttpClientError>;
