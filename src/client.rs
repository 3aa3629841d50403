use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::{
    decode::decode_body, retry::retry, ClientOptions, HttpClientError, ReqwestTransport, Result,
    RetryPolicy, Transport,
};

const HTTP_SCHEME: &str = "http://";

/// Prefixes `uri` with `http://` unless it already starts with it.
///
/// Only the exact `http://` prefix counts as a scheme, so `https://host`
/// becomes `http://https://host`.
pub fn normalize_uri(uri: &str) -> String {
    if uri.starts_with(HTTP_SCHEME) {
        uri.to_owned()
    } else {
        format!("{HTTP_SCHEME}{uri}")
    }
}

/// Typed GET capability.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetches `uri` and decodes a successful JSON response into `T`.
    ///
    /// Non-2xx responses and empty bodies yield `T::default()`. An error is
    /// returned only once every attempt has failed.
    async fn get<T>(&self, uri: &str) -> Result<T>
    where
        T: DeserializeOwned + Default + Send;
}

/// GET client that retries failed attempts with exponential backoff.
pub struct JsonHttpClient<R = ReqwestTransport> {
    transport: Arc<R>,
    options: ClientOptions,
}

impl<R> Clone for JsonHttpClient<R> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            options: self.options.clone(),
        }
    }
}

impl<R> fmt::Debug for JsonHttpClient<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonHttpClient")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl JsonHttpClient {
    /// Creates a client over a default `reqwest::Client`.
    pub fn new(options: ClientOptions) -> Self {
        Self::with_transport(ReqwestTransport::default(), options)
    }

    /// Creates a client with options bound from `section` of a JSON
    /// configuration document.
    pub fn from_section(config: &serde_json::Value, section: &str) -> Result<Self> {
        Ok(Self::new(ClientOptions::from_section(config, section)?))
    }
}

impl<R: Transport> JsonHttpClient<R> {
    pub fn with_transport(transport: R, options: ClientOptions) -> Self {
        Self::with_shared_transport(Arc::new(transport), options)
    }

    /// Creates a client over a transport that is already shared elsewhere.
    pub fn with_shared_transport(transport: Arc<R>, options: ClientOptions) -> Self {
        Self { transport, options }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// One request/response round trip. `request_uri` is the caller's URI as
    /// given; `uri` is its normalized form.
    async fn attempt<T>(&self, request_uri: &str, uri: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        #[cfg(feature = "tracing")]
        tracing::debug!("sending GET HTTP request to URI: {}", request_uri);
        #[cfg(not(feature = "tracing"))]
        let _ = request_uri;

        let response = self.transport.get(uri).await?;

        if !response.status.is_success() {
            #[cfg(feature = "tracing")]
            tracing::error!(
                "received an invalid response to GET HTTP request from URI: {}\n{}",
                uri,
                response
            );
            return Ok(T::default());
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "received a valid response to GET HTTP request from URI: {}\n{}",
            uri,
            response
        );

        decode_body(response.body.as_deref())
    }
}

#[async_trait]
impl<R: Transport> HttpClient for JsonHttpClient<R> {
    async fn get<T>(&self, uri: &str) -> Result<T>
    where
        T: DeserializeOwned + Default + Send,
    {
        let request_uri = uri;
        let uri = normalize_uri(request_uri);
        let uri = uri.as_str();
        let policy = RetryPolicy::from(&self.options);

        retry::<_, _, T, HttpClientError>(&policy, move || self.attempt::<T>(request_uri, uri))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use reqwest::StatusCode;
    use serde::Deserialize;

    use super::{normalize_uri, HttpClient, JsonHttpClient};
    use crate::{ClientOptions, HttpClientError, Transport, TransportResponse};

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct User {
        user_name: String,
    }

    type Scripted = std::result::Result<TransportResponse, &'static str>;

    struct ScriptedTransport {
        script: Mutex<VecDeque<Scripted>>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                seen: Mutex::default(),
            }
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, uri: &str) -> crate::Result<TransportResponse> {
            self.seen.lock().unwrap().push(uri.to_owned());
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Ok(response)) => Ok(response),
                Some(Err(message)) => Err(HttpClientError::Transport(message.into())),
                None => Err(HttpClientError::Transport("script exhausted".into())),
            }
        }
    }

    fn client(
        script: impl IntoIterator<Item = Scripted>,
        retries: u32,
    ) -> (JsonHttpClient<ScriptedTransport>, std::sync::Arc<ScriptedTransport>) {
        let transport = std::sync::Arc::new(ScriptedTransport::new(script));
        let client = JsonHttpClient::with_shared_transport(
            transport.clone(),
            ClientOptions { retries },
        );
        (client, transport)
    }

    fn ok(body: &'static str) -> Scripted {
        Ok(TransportResponse::new(StatusCode::OK, body))
    }

    #[test]
    fn normalize_prepends_scheme_once() {
        assert_eq!(normalize_uri("example.com:8080/users"), "http://example.com:8080/users");
        assert_eq!(normalize_uri("http://example.com/users"), "http://example.com/users");
        assert_eq!(normalize_uri("https://example.com"), "http://https://example.com");
    }

    #[tokio::test(start_paused = true)]
    async fn sends_normalized_uri() {
        let (client, transport) = client([ok(r#"{"userName":"alice"}"#)], 0);

        let user: User = client.get("api.local/users/1").await.unwrap();

        assert_eq!(user.user_name, "alice");
        assert_eq!(transport.seen(), vec!["http://api.local/users/1".to_owned()]);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_faults_are_retried_until_success() {
        let (client, transport) = client(
            [Err("refused"), Err("reset"), ok(r#"{"userName":"carol"}"#)],
            3,
        );

        let user: User = client.get("api.local/users").await.unwrap();

        assert_eq!(user.user_name, "carol");
        assert_eq!(transport.seen().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_surface_last_fault() {
        let (client, transport) = client([Err("one"), Err("two"), Err("three")], 2);

        let result: crate::Result<User> = client.get("api.local").await;
        let err = result.unwrap_err();

        assert!(matches!(&err, HttpClientError::Transport(inner) if inner.to_string() == "three"));
        assert_eq!(transport.seen().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn non_success_status_yields_default_without_retry() {
        let (client, transport) = client(
            [
                Ok(TransportResponse::new(StatusCode::NOT_FOUND, "nope")),
                ok(r#"{"userName":"never"}"#),
            ],
            3,
        );

        let user: User = client.get("api.local/missing").await.unwrap();

        assert_eq!(user, User::default());
        assert_eq!(transport.seen().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_or_absent_body_yields_default() {
        let (client, _) = client(
            [ok(""), Ok(TransportResponse::without_body(StatusCode::NO_CONTENT))],
            0,
        );

        let user: User = client.get("a").await.unwrap();
        assert_eq!(user, User::default());
        let maybe: Option<User> = client.get("a").await.unwrap();
        assert_eq!(maybe, None);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_body_is_retried_then_surfaces() {
        let (client, transport) = client([ok("{not json"), ok("{still not")], 1);

        let result: crate::Result<User> = client.get("api.local").await;

        assert!(matches!(result, Err(HttpClientError::Decode(_))));
        assert_eq!(transport.seen().len(), 2);
    }

    #[cfg(feature = "tracing")]
    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<Mutex<Vec<u8>>>);

    #[cfg(feature = "tracing")]
    impl CapturedLogs {
        fn lines(&self) -> Vec<String> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(str::to_owned)
                .collect()
        }
    }

    #[cfg(feature = "tracing")]
    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[cfg(feature = "tracing")]
    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[cfg(feature = "tracing")]
    #[tokio::test]
    async fn traces_requests_and_responses() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .without_time()
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (client, _) = client(
            [
                ok(r#"{"userName":"alice"}"#),
                Ok(TransportResponse::new(StatusCode::NOT_FOUND, "nope")),
            ],
            0,
        );
        let _: User = client.get("api.local/users/1").await.unwrap();
        let _: User = client.get("api.local/users/2").await.unwrap();

        let lines = logs.lines();
        let has = |level: &str, text: &str| {
            lines
                .iter()
                .any(|line| line.contains(level) && line.contains(text))
        };
        assert!(has(
            "DEBUG",
            "sending GET HTTP request to URI: api.local/users/1"
        ));
        assert!(has(
            "DEBUG",
            "received a valid response to GET HTTP request from URI: http://api.local/users/1"
        ));
        assert!(has(
            "ERROR",
            "received an invalid response to GET HTTP request from URI: http://api.local/users/2"
        ));
        assert!(lines
            .iter()
            .any(|line| line.contains("StatusCode: 404 Not Found")));
        assert!(!lines.iter().any(|line| line.contains("ERROR") && line.contains("users/1")));
    }

    #[test]
    fn debug_shows_options() {
        let (client, _) = client(Vec::new(), 4);
        assert!(format!("{client:?}").contains("retries: 4"));
    }
}
