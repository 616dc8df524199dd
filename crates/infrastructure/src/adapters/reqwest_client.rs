//! HTTP transport implementation using reqwest.
//!
//! This adapter implements the `HttpTransport` port. It applies the
//! connect, read and whole-request timeouts from [`ClientConfig`] and hands
//! every HTTP response back as-is; only failures to get a response are
//! errors.

use std::error::Error as _;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use storekeeper_application::ports::{HttpTransport, TransportError};
use storekeeper_domain::{ClientConfig, Header, HttpMethod, PendingRequest, ResponseSpec};
use tracing::trace;

const MAX_REDIRECTS: usize = 10;

/// HTTP transport backed by `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    timeout_ms: u64,
}

impl ReqwestTransport {
    /// Creates a transport configured from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout())
            .read_timeout(config.read_timeout())
            .timeout(config.request_timeout())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self {
            client,
            timeout_ms: config.request_timeout_ms,
        })
    }

    /// Creates a transport around an existing reqwest client.
    #[must_use]
    pub const fn with_client(client: Client, timeout_ms: u64) -> Self {
        Self { client, timeout_ms }
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
        }
    }

    /// Flattens an error and its sources into one message.
    fn describe(error: &reqwest::Error) -> String {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }

    fn host_of(error: &reqwest::Error) -> String {
        error
            .url()
            .and_then(Url::host_str)
            .unwrap_or("unknown")
            .to_string()
    }

    /// Maps reqwest errors to `TransportError`.
    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout { timeout_ms };
        }

        if error.is_connect() {
            let message = Self::describe(error);
            let lowered = message.to_lowercase();
            if lowered.contains("dns") || lowered.contains("resolve") {
                return TransportError::DnsError {
                    host: Self::host_of(error),
                    message,
                };
            }
            if lowered.contains("refused") {
                return TransportError::ConnectionRefused {
                    host: Self::host_of(error),
                    port: error
                        .url()
                        .and_then(Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            return TransportError::ConnectionFailed(message);
        }

        if error.is_redirect() {
            return TransportError::Other(format!("more than {MAX_REDIRECTS} redirects"));
        }

        TransportError::Other(Self::describe(error))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &PendingRequest) -> Result<ResponseSpec, TransportError> {
        let url = Url::parse(&request.url)
            .map_err(|e| TransportError::InvalidUrl(format!("{e}: {}", request.url)))?;

        let start = Instant::now();

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url);
        for header in &request.headers {
            builder = builder.header(&header.name, &header.value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, self.timeout_ms))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| Header::new(k.as_str(), v.to_str().unwrap_or("<binary>")))
            .collect();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::map_error(&e, self.timeout_ms))?;

        let duration = start.elapsed();
        trace!(
            request_id = %request.id,
            status,
            elapsed = ?duration,
            "Response received"
        );

        Ok(ResponseSpec {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
            duration,
        })
    }
}
