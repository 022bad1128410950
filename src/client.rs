use std::env;
use std::pin::Pin;
use std::time::{Duration, Instant};

use futures::Stream;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::sse::process_sse;
use crate::types::{ChatCompletionChunk, ChatCompletionParams};

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/";
const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// A boxed stream of decoded chunks from one streamed completion.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk>> + Send>>;

/// Something that can stream a chat completion for a conversation.
///
/// [`OpenAi`] talks to the real service; tests substitute canned streams.
#[async_trait::async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Start a streamed completion for `params`.
    ///
    /// Errors returned here happen before any reply text is produced.
    /// Errors that happen later arrive as items of the stream.
    async fn stream(&self, params: ChatCompletionParams) -> Result<ChunkStream>;
}

/// Client for an OpenAI-compatible chat completions API.
#[derive(Debug, Clone)]
pub struct OpenAi {
    api_key: String,
    client: ReqwestClient,
    base_url: Url,
    timeout: Option<Duration>,
}

impl OpenAi {
    /// Create a new client.
    ///
    /// The API key can be provided directly or read from the OPENAI_API_KEY
    /// environment variable.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    ///
    /// No timeout is applied unless one is given: a streamed reply may take
    /// as long as the service needs.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => key,
            None => env::var(API_KEY_ENV).map_err(|_| {
                Error::authentication(
                    "API key not provided and OPENAI_API_KEY environment variable not set",
                )
            })?,
        };
        if api_key.trim().is_empty() {
            return Err(Error::authentication("API key is empty"));
        }

        let base_url = parse_base_url(base_url.as_deref().unwrap_or(DEFAULT_API_URL))?;

        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {}", e),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
        })
    }

    /// The base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn completions_url(&self) -> Result<Url> {
        Ok(self.base_url.join("chat/completions")?)
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| Error::authentication("API key contains invalid header characters"))?;
        headers.insert(header::AUTHORIZATION, bearer);
        Ok(headers)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|val| val.to_str().ok())
            .map(String::from);

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        error_from_response(status_code, &error_body, request_id, retry_after)
    }

    /// Send the conversation and get a streaming response.
    ///
    /// Streaming is forced on regardless of `params.stream`.
    pub async fn stream(&self, mut params: ChatCompletionParams) -> Result<ChunkStream> {
        params.stream = true;

        let url = self.completions_url()?;
        let mut headers = self.default_headers()?;
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );

        CLIENT_REQUESTS.click();
        tracing::debug!(
            model = %params.model,
            messages = params.messages.len(),
            "requesting streamed completion"
        );
        let start = Instant::now();

        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(&params)
            .send()
            .await
            .map_err(|e| {
                CLIENT_REQUEST_ERRORS.click();
                if e.is_timeout() {
                    Error::timeout(e.to_string(), self.timeout.map(|t| t.as_secs_f64()))
                } else if e.is_connect() {
                    Error::connection(e.to_string(), Some(Box::new(e)))
                } else {
                    Error::http_client(e.to_string(), Some(Box::new(e)))
                }
            })?;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            let err = Self::process_error_response(response).await;
            tracing::warn!(error = %err, "completion request rejected");
            return Err(err);
        }

        // Get the byte stream from the response
        let stream = response.bytes_stream();

        Ok(Box::pin(process_sse(stream)))
    }
}

#[async_trait::async_trait]
impl CompletionBackend for OpenAi {
    async fn stream(&self, params: ChatCompletionParams) -> Result<ChunkStream> {
        OpenAi::stream(self, params).await
    }
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    // Url::join drops the last path segment unless it ends in a slash.
    let mut base_url = base_url.trim().to_string();
    if !base_url.ends_with('/') {
        base_url.push('/');
    }
    let url = Url::parse(&base_url)?;
    if url.cannot_be_a_base() {
        return Err(Error::url(format!("{base_url} cannot be a base URL"), None));
    }
    Ok(url)
}

/// Map a non-success status and its body to the matching error variant.
fn error_from_response(
    status_code: u16,
    body: &str,
    request_id: Option<String>,
    retry_after: Option<u64>,
) -> Error {
    #[derive(Deserialize)]
    struct ErrorResponse {
        error: Option<ErrorDetail>,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        #[serde(rename = "type")]
        error_type: Option<String>,
        message: Option<String>,
        param: Option<String>,
        code: Option<serde_json::Value>,
    }

    let detail = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.error);
    let error_type = detail.as_ref().and_then(|e| {
        e.error_type.clone().or_else(|| {
            e.code
                .as_ref()
                .and_then(|code| code.as_str().map(String::from))
        })
    });
    let error_message = detail
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| body.to_string());
    let error_param = detail.as_ref().and_then(|e| e.param.clone());

    match status_code {
        400 => Error::bad_request(error_message, error_param),
        401 => Error::authentication(error_message),
        403 => Error::permission(error_message),
        404 => Error::not_found(error_message),
        408 => Error::timeout(error_message, None),
        429 => Error::rate_limit(error_message, retry_after),
        500 => Error::internal_server(error_message, request_id),
        502..=504 => Error::service_unavailable(error_message, retry_after),
        _ => Error::api(status_code, error_type, error_message, request_id),
    }
}
