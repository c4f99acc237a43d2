//! HTTP client for the Markpad API with failure classification and retry.

use markpad_core::ai::{
    decode_frame, FrameDecoder, GenerateRequest, GenerationBuffer, GenerationStatus, StreamFrame,
};
use markpad_core::validation::{validate_document, validate_share_token};
use markpad_core::DEFAULT_MAX_DOCUMENT_SIZE;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Classified client failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Rejected locally before any request was sent.
    Invalid(String),
    /// Connection could not be established or was dropped.
    Network(String),
    /// The request did not complete within the configured timeout.
    Timeout,
    /// Non-retryable 4xx response.
    Client { status: u16, message: String },
    /// 429 response.
    RateLimited { retry_after: Option<u64> },
    /// 5xx response.
    Server { status: u16, message: String },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(message) => write!(f, "{}", message),
            Self::Network(message) => write!(f, "network error: {}", message),
            Self::Timeout => write!(f, "request timed out"),
            Self::Client { status, message } => write!(f, "{} ({})", message, status),
            Self::RateLimited {
                retry_after: Some(secs),
            } => write!(f, "rate limited; retry in {}s", secs),
            Self::RateLimited { retry_after: None } => write!(f, "rate limited"),
            Self::Server { status, message } => write!(f, "server error: {} ({})", message, status),
        }
    }
}

impl std::error::Error for ClientError {}

impl ClientError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout | Self::RateLimited { .. } | Self::Server { .. }
        )
    }

    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Exponential backoff policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt `attempt + 1`, where `attempt` starts at 1.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Extract a readable message from an error response body.
pub fn error_message_for_response(status: reqwest::StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
    }

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return value
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or(body)
            .to_string();
    }

    body.to_string()
}

/// Map a non-success status to a [`ClientError`].
pub fn classify_status(
    status: reqwest::StatusCode,
    retry_after: Option<u64>,
    body: &str,
) -> ClientError {
    let message = error_message_for_response(status, body);
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        ClientError::RateLimited { retry_after }
    } else if status.is_server_error() {
        ClientError::Server {
            status: status.as_u16(),
            message,
        }
    } else {
        ClientError::Client {
            status: status.as_u16(),
            message,
        }
    }
}

/// Build an endpoint URL by appending encoded path segments to `server`.
pub fn api_url(server: &str, segments: &[&str]) -> Result<reqwest::Url, ClientError> {
    let mut url = reqwest::Url::parse(server)
        .map_err(|err| ClientError::Invalid(format!("Invalid server URL '{}': {}", server, err)))?;
    let mut path = url
        .path_segments_mut()
        .map_err(|_| ClientError::Invalid("Server URL cannot be used as an API base".to_string()))?;
    path.pop_if_empty();
    for segment in segments {
        path.push(segment);
    }
    drop(path);
    Ok(url)
}

/// Markpad API client.
pub struct ApiClient {
    http: reqwest::Client,
    server: String,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(http: reqwest::Client, server: String, retry: RetryPolicy) -> Self {
        Self {
            http,
            server,
            retry,
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    /// Send a request built by `build`, retrying transient failures.
    ///
    /// # Errors
    /// Returns the last classified failure once attempts are exhausted, or
    /// the first non-retryable one.
    pub async fn send_with_retry<F>(&self, build: F) -> Result<reqwest::Response, ClientError>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let mut attempt = 1;
        loop {
            let error = match build(&self.http).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let retry_after = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|value| value.to_str().ok())
                        .and_then(|value| value.trim().parse::<u64>().ok());
                    let body = response.text().await.unwrap_or_default();
                    classify_status(status, retry_after, &body)
                }
                Err(err) => ClientError::from_transport(err),
            };

            if !error.is_retryable() || attempt >= self.retry.max_attempts {
                return Err(error);
            }
            let delay = self.retry.delay_after(attempt);
            eprintln!(
                "[retry] attempt {} failed ({}); retrying in {} ms",
                attempt,
                error,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn json_body(response: reqwest::Response) -> Result<Value, ClientError> {
        response
            .json::<Value>()
            .await
            .map_err(ClientError::from_transport)
    }

    /// Share a document.
    ///
    /// # Errors
    /// Returns [`ClientError::Invalid`] before sending when the document fails
    /// local validation.
    pub async fn share(&self, title: Option<&str>, content: &str) -> Result<Value, ClientError> {
        validate_document(title, content, DEFAULT_MAX_DOCUMENT_SIZE)
            .map_err(|err| ClientError::Invalid(err.to_string()))?;
        let url = api_url(&self.server, &["api", "documents"])?;
        let mut body = serde_json::json!({ "content": content });
        if let Some(title) = title {
            body["title"] = title.into();
        }
        let response = self
            .send_with_retry(|http| http.post(url.clone()).json(&body))
            .await?;
        Self::json_body(response).await
    }

    /// Fetch a shared document by token.
    ///
    /// # Errors
    /// Returns [`ClientError::Invalid`] for malformed tokens without a request.
    pub async fn get(&self, token: &str) -> Result<Value, ClientError> {
        validate_share_token(token).map_err(|err| ClientError::Invalid(err.to_string()))?;
        let url = api_url(&self.server, &["api", "documents", token])?;
        let response = self.send_with_retry(|http| http.get(url.clone())).await?;
        Self::json_body(response).await
    }

    /// Upload raw image bytes.
    ///
    /// # Errors
    /// Returns [`ClientError::Invalid`] for non-image content types.
    pub async fn upload_image(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<Value, ClientError> {
        let content_type = markpad_core::models::image::normalize_image_type(content_type)
            .ok_or_else(|| {
                ClientError::Invalid(format!("Unsupported image type '{}'", content_type))
            })?;
        let url = api_url(&self.server, &["api", "images"])?;
        let response = self
            .send_with_retry(|http| {
                http.post(url.clone())
                    .header(reqwest::header::CONTENT_TYPE, content_type.as_str())
                    .body(bytes.clone())
            })
            .await?;
        Self::json_body(response).await
    }

    /// Run a generation, reporting each frame to `on_frame` as it arrives.
    ///
    /// Retries apply only until the stream starts.
    ///
    /// # Errors
    /// Returns transport failures and non-success statuses; in-stream
    /// provider errors are recorded on the returned buffer instead.
    pub async fn generate<F>(
        &self,
        request: &GenerateRequest,
        mut on_frame: F,
    ) -> Result<GenerationBuffer, ClientError>
    where
        F: FnMut(&StreamFrame),
    {
        request
            .validate(DEFAULT_MAX_DOCUMENT_SIZE)
            .map_err(|err| ClientError::Invalid(err.to_string()))?;
        let url = api_url(&self.server, &["api", "ai", "generate"])?;
        let mut response = self
            .send_with_retry(|http| http.post(url.clone()).json(request))
            .await?;

        let mut decoder = FrameDecoder::new();
        let mut buffer = GenerationBuffer::new();
        loop {
            let chunk = response
                .chunk()
                .await
                .map_err(ClientError::from_transport)?;
            let finished = chunk.is_none();
            let payloads = match chunk {
                Some(bytes) => decoder.push(&bytes),
                None => decoder.finish().into_iter().collect(),
            };
            for payload in payloads {
                let frame = decode_frame(&payload)
                    .map_err(|err| ClientError::Network(format!("malformed frame: {}", err)))?;
                on_frame(&frame);
                buffer.push_frame(frame);
                if *buffer.status() != GenerationStatus::Streaming {
                    return Ok(buffer);
                }
            }
            if finished {
                return Ok(buffer);
            }
        }
    }
}
