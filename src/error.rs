//! Error types for termline.
//!
//! Every failure that can end a chat (a missing key, an unreachable or
//! unhappy completion service, a stream that cannot be decoded, a broken
//! terminal) is one [`Error`]. Nothing retries: the binary prints
//! [`Error::diagnostic`] and exits.

use std::error;
use std::fmt;
use std::io;
use std::str::Utf8Error;
use std::sync::Arc;

use rustyline::error::ReadlineError;

type Source = Arc<dyn error::Error + Send + Sync>;

fn shared(source: Option<Box<dyn error::Error + Send + Sync>>) -> Option<Source> {
    source.map(Arc::from)
}

/// Why a chat ended.
#[derive(Clone, Debug)]
pub enum Error {
    /// The completion service failed with a status no other variant covers,
    /// or sent an error payload in the middle of a stream.
    Api {
        status_code: u16,
        /// The `type` (or `code`) field of the error body.
        error_type: Option<String>,
        message: String,
        /// Value of the `x-request-id` header.
        request_id: Option<String>,
    },

    /// No API key, or the service rejected it (401).
    Authentication { message: String },

    /// The key may not use this model or endpoint (403).
    Permission { message: String },

    /// Unknown model or endpoint (404).
    NotFound { message: String },

    /// Rate limit or quota exhausted (429).
    RateLimit {
        message: String,
        /// Seconds from the `retry-after` header.
        retry_after: Option<u64>,
    },

    /// The service refused the request body (400).
    BadRequest {
        message: String,
        /// The offending request field, when the service names one.
        param: Option<String>,
    },

    /// The request or the service timed out (408, or the client timeout).
    Timeout {
        message: String,
        /// The configured client timeout in seconds.
        duration: Option<f64>,
    },

    /// The service could not be reached.
    Connection {
        message: String,
        source: Option<Source>,
    },

    /// The service failed internally (500).
    InternalServer {
        message: String,
        request_id: Option<String>,
    },

    /// A gateway in front of the service gave up (502, 503, 504).
    ServiceUnavailable {
        message: String,
        retry_after: Option<u64>,
    },

    /// A chunk or error body was not the JSON we expect.
    Serialization {
        message: String,
        source: Option<Source>,
    },

    /// Reading the prompt or writing the transcript failed.
    Io { message: String, source: Arc<io::Error> },

    /// reqwest failed for a reason other than connecting or timing out.
    HttpClient {
        message: String,
        source: Option<Source>,
    },

    /// The conversation or session was asked to do something out of order.
    Validation {
        message: String,
        param: Option<String>,
    },

    /// `OPENAI_BASE_URL` is not usable as a base URL.
    Url {
        message: String,
        source: Option<url::ParseError>,
    },

    /// The response body broke off mid-stream.
    Streaming {
        message: String,
        source: Option<Source>,
    },

    /// The response body was not valid UTF-8.
    Encoding {
        message: String,
        source: Option<Source>,
    },
}

impl Error {
    pub fn api(
        status_code: u16,
        error_type: Option<String>,
        message: impl Into<String>,
        request_id: Option<String>,
    ) -> Self {
        Error::Api {
            status_code,
            error_type,
            message: message.into(),
            request_id,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Error::Authentication {
            message: message.into(),
        }
    }

    pub fn permission(message: impl Into<String>) -> Self {
        Error::Permission {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound {
            message: message.into(),
        }
    }

    pub fn rate_limit(message: impl Into<String>, retry_after: Option<u64>) -> Self {
        Error::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    pub fn bad_request(message: impl Into<String>, param: Option<String>) -> Self {
        Error::BadRequest {
            message: message.into(),
            param,
        }
    }

    pub fn timeout(message: impl Into<String>, duration: Option<f64>) -> Self {
        Error::Timeout {
            message: message.into(),
            duration,
        }
    }

    pub fn connection(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Connection {
            message: message.into(),
            source: shared(source),
        }
    }

    pub fn internal_server(message: impl Into<String>, request_id: Option<String>) -> Self {
        Error::InternalServer {
            message: message.into(),
            request_id,
        }
    }

    pub fn service_unavailable(message: impl Into<String>, retry_after: Option<u64>) -> Self {
        Error::ServiceUnavailable {
            message: message.into(),
            retry_after,
        }
    }

    pub fn serialization(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            message: message.into(),
            source: shared(source),
        }
    }

    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            message: message.into(),
            source: Arc::new(source),
        }
    }

    pub fn http_client(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::HttpClient {
            message: message.into(),
            source: shared(source),
        }
    }

    pub fn validation(message: impl Into<String>, param: Option<String>) -> Self {
        Error::Validation {
            message: message.into(),
            param,
        }
    }

    pub fn url(message: impl Into<String>, source: Option<url::ParseError>) -> Self {
        Error::Url {
            message: message.into(),
            source,
        }
    }

    pub fn streaming(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Streaming {
            message: message.into(),
            source: shared(source),
        }
    }

    pub fn encoding(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Encoding {
            message: message.into(),
            source: shared(source),
        }
    }

    /// True when the API key is missing or was rejected.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::Authentication { .. })
    }

    /// True when the service itself, or a gateway in front of it, failed.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Error::InternalServer { .. } | Error::ServiceUnavailable { .. }
        )
    }

    /// True when a turn was attempted out of order.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// What the user can change to get past this error, if anything.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Error::Authentication { .. } => {
                Some("set OPENAI_API_KEY in the environment or in a .env file")
            }
            Error::Permission { .. } | Error::NotFound { .. } => {
                Some("check OPENAI_MODEL and OPENAI_BASE_URL")
            }
            Error::RateLimit { .. } | Error::ServiceUnavailable { .. } => {
                Some("wait a little before starting another chat")
            }
            Error::Connection { .. } | Error::Timeout { .. } => {
                Some("check the network and OPENAI_BASE_URL")
            }
            Error::Url { .. } => Some("OPENAI_BASE_URL must look like https://api.openai.com/v1"),
            _ => None,
        }
    }

    /// The error followed by its hint, as printed when a chat ends.
    pub fn diagnostic(&self) -> String {
        match self.hint() {
            Some(hint) => format!("{self}\n{hint}"),
            None => self.to_string(),
        }
    }

    fn summary(&self) -> (&str, &str) {
        match self {
            Error::Api {
                error_type,
                message,
                ..
            } => (
                error_type.as_deref().unwrap_or("completion service error"),
                message.as_str(),
            ),
            Error::Authentication { message } => ("authentication failed", message.as_str()),
            Error::Permission { message } => ("permission denied", message.as_str()),
            Error::NotFound { message } => ("not found", message.as_str()),
            Error::RateLimit { message, .. } => ("rate limited", message.as_str()),
            Error::BadRequest { message, .. } => ("request rejected", message.as_str()),
            Error::Timeout { message, .. } => ("timed out", message.as_str()),
            Error::Connection { message, .. } => ("connection failed", message.as_str()),
            Error::InternalServer { message, .. } => {
                ("completion service failed", message.as_str())
            }
            Error::ServiceUnavailable { message, .. } => {
                ("completion service unavailable", message.as_str())
            }
            Error::Serialization { message, .. } => ("malformed response", message.as_str()),
            Error::Io { message, .. } => ("terminal I/O failed", message.as_str()),
            Error::HttpClient { message, .. } => ("HTTP client error", message.as_str()),
            Error::Validation { message, .. } => ("invalid chat state", message.as_str()),
            Error::Url { message, .. } => ("bad base URL", message.as_str()),
            Error::Streaming { message, .. } => ("response stream broke", message.as_str()),
            Error::Encoding { message, .. } => ("undecodable response", message.as_str()),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (kind, message) = self.summary();
        write!(f, "{kind}: {message}")?;
        match self {
            Error::Api {
                status_code,
                request_id,
                ..
            } => {
                write!(f, " (HTTP {status_code}")?;
                if let Some(request_id) = request_id {
                    write!(f, ", request {request_id}")?;
                }
                f.write_str(")")
            }
            Error::InternalServer {
                request_id: Some(request_id),
                ..
            } => write!(f, " (request {request_id})"),
            Error::RateLimit {
                retry_after: Some(seconds),
                ..
            }
            | Error::ServiceUnavailable {
                retry_after: Some(seconds),
                ..
            } => write!(f, " (retry after {seconds}s)"),
            Error::BadRequest {
                param: Some(param), ..
            }
            | Error::Validation {
                param: Some(param), ..
            } => write!(f, " (field {param})"),
            Error::Timeout {
                duration: Some(duration),
                ..
            } => write!(f, " (after {duration}s)"),
            _ => Ok(()),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Connection { source, .. }
            | Error::Serialization { source, .. }
            | Error::HttpClient { source, .. }
            | Error::Streaming { source, .. }
            | Error::Encoding { source, .. } => source
                .as_deref()
                .map(|e| e as &(dyn error::Error + 'static)),
            Error::Io { source, .. } => Some(source.as_ref()),
            Error::Url { source, .. } => {
                source.as_ref().map(|e| e as &(dyn error::Error + 'static))
            }
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::io(err.to_string(), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(err.to_string(), Some(Box::new(err)))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::url(err.to_string(), Some(err))
    }
}

impl From<Utf8Error> for Error {
    fn from(err: Utf8Error) -> Self {
        Error::encoding(err.to_string(), Some(Box::new(err)))
    }
}

impl From<ReadlineError> for Error {
    fn from(err: ReadlineError) -> Self {
        match err {
            ReadlineError::Io(err) => Error::io(format!("prompt: {err}"), err),
            other => Error::io(
                format!("prompt: {other}"),
                io::Error::other(other.to_string()),
            ),
        }
    }
}

/// Result alias used throughout termline.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_names_type_status_and_request() {
        let err = Error::api(
            418,
            Some("teapot".to_string()),
            "short and stout",
            Some("req_123".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "teapot: short and stout (HTTP 418, request req_123)"
        );

        let err = Error::api(500, None, "boom", None);
        assert_eq!(
            err.to_string(),
            "completion service error: boom (HTTP 500)"
        );
    }

    #[test]
    fn retry_after_is_shown() {
        let err = Error::rate_limit("slow down", Some(7));
        assert_eq!(err.to_string(), "rate limited: slow down (retry after 7s)");

        let err = Error::service_unavailable("bad gateway", None);
        assert!(err.is_server_error());
        assert_eq!(
            err.to_string(),
            "completion service unavailable: bad gateway"
        );
    }

    #[test]
    fn missing_key_diagnostic_says_where_to_put_it() {
        let err = Error::authentication("API key is empty");
        assert!(err.is_authentication());
        assert_eq!(
            err.diagnostic(),
            "authentication failed: API key is empty\n\
             set OPENAI_API_KEY in the environment or in a .env file"
        );
    }

    #[test]
    fn decoding_failures_have_no_hint() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Serialization { .. }));
        assert!(error::Error::source(&err).is_some());
        assert_eq!(err.hint(), None);
        assert_eq!(err.diagnostic(), err.to_string());
    }

    #[test]
    fn validation_names_the_field() {
        let err = Error::validation("turn out of order", Some("role".to_string()));
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "invalid chat state: turn out of order (field role)"
        );
    }

    #[test]
    fn readline_eof_becomes_io() {
        let err: Error = ReadlineError::Eof.into();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().starts_with("terminal I/O failed: prompt:"));
    }
}
