/// Error type returned by this crate.
///
/// Non-2xx responses are not errors: they resolve to the target type's
/// default value. Only faults raised while performing an attempt end up here.
#[derive(Debug, thiserror::Error)]
pub enum HttpClientError {
    /// Network or request execution error raised by the transport.
    #[error("transport error: {0}")]
    Transport(Box<dyn std::error::Error + Send + Sync>),
    /// A successful response carried a body that is not valid JSON for the
    /// requested type.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    /// Client options could not be bound from configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for HttpClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(Box::new(err))
    }
}

impl HttpClientError {
    /// Returns the underlying `reqwest` error for transport faults raised by
    /// [`crate::ReqwestTransport`].
    pub fn as_reqwest(&self) -> Option<&reqwest::Error> {
        match self {
            Self::Transport(inner) => inner.downcast_ref::<reqwest::Error>(),
            _ => None,
        }
    }
}
