//! Error types for request assembly, transport and envelope decoding.
//!
//! Every failure a caller can observe is one [`Error`] variant. Variants that
//! come from the backend envelope keep the server's `code` and `message`, and
//! variants that come from HTTP keep the status and raw body, so the error is
//! enough to log or display without re-reading the response.

use http::StatusCode;

/// Numeric codes for failures produced by this crate rather than the backend.
///
/// These sit outside the range backends use for their own `code` values so a
/// single integer is enough to tell the two apart.
pub mod codes {
    /// The response carried no usable status code.
    pub const STATUS_NOT_FOUND: i64 = 9000;
    /// The response carried no data.
    pub const DATA_NOT_FOUND: i64 = 9001;
    /// The response (or a request body) could not be transformed.
    pub const TRANSFORM: i64 = 9002;
    /// The request URL could not be built.
    pub const URL: i64 = 9003;
}

/// The main error type for requests made through a [`Client`](crate::Client).
///
/// # Examples
///
/// ```no_run
/// use netspec::{Client, Error, RequestSpec};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")?
///     .build()?;
///
/// match client.net_request::<serde_json::Value>(RequestSpec::get("users")).await {
///     Ok(users) => println!("users: {users}"),
///     Err(Error::ServerReported { code, message }) => {
///         eprintln!("backend refused ({code}): {message}");
///     }
///     Err(e) => eprintln!("request failed: {e}"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request URL could not be built from the endpoint and spec.
    ///
    /// Produced before anything is sent.
    #[error("URL error: {0}")]
    UrlConstruction(String),

    /// The response did not carry a status code the client could read.
    #[error("Status code not found: {0}")]
    StatusNotFound(String),

    /// The response body was empty where data was expected.
    #[error("Data not found (status {status})")]
    DataNotFound {
        /// The HTTP status code of the empty response
        status: StatusCode,
    },

    /// A response or request body could not be converted.
    ///
    /// This covers undecodable envelopes, envelopes with neither `data` nor
    /// `message`, and typed bodies that do not serialize to a JSON object.
    #[error("Data transform error: {0}")]
    Transform(String),

    /// The backend answered with an envelope describing a failure.
    ///
    /// # Fields
    ///
    /// * `code` - The envelope `code` (or HTTP status in loosely-typed mode)
    /// * `message` - The envelope `message`
    #[error("Server error {code}: {message}")]
    ServerReported {
        /// The code reported by the server
        code: i64,
        /// The message reported by the server
        message: String,
    },

    /// The transport failed to deliver the request or read the response.
    #[error("Network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The request timed out.
    #[error("Request timed out")]
    Timeout,

    /// The server returned a non-2xx HTTP status for a raw data request.
    #[error("HTTP error {status}: {raw_response}")]
    HttpError {
        /// The HTTP status code
        status: StatusCode,
        /// The raw response body
        raw_response: String,
    },

    /// Invalid configuration was provided to the client builder.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The request was cancelled before its result was delivered.
    #[error("Request cancelled")]
    Cancelled,
}

impl Error {
    /// Returns the numeric code associated with this error.
    ///
    /// Server-reported errors return the server's code, HTTP errors their
    /// status, and crate-level failures one of the constants in [`codes`].
    ///
    /// # Examples
    ///
    /// ```
    /// use netspec::{Error, error::codes};
    ///
    /// let err = Error::ServerReported { code: 0, message: "bad".to_string() };
    /// assert_eq!(err.code(), Some(0));
    ///
    /// let err = Error::Transform("no data and no message".to_string());
    /// assert_eq!(err.code(), Some(codes::TRANSFORM));
    ///
    /// assert_eq!(Error::Timeout.code(), None);
    /// ```
    pub fn code(&self) -> Option<i64> {
        match self {
            Error::UrlConstruction(_) => Some(codes::URL),
            Error::StatusNotFound(_) => Some(codes::STATUS_NOT_FOUND),
            Error::DataNotFound { .. } => Some(codes::DATA_NOT_FOUND),
            Error::Transform(_) => Some(codes::TRANSFORM),
            Error::ServerReported { code, .. } => Some(*code),
            Error::HttpError { status, .. } => Some(i64::from(status.as_u16())),
            Error::Network(_) => None,
            Error::Timeout => None,
            Error::ConfigurationError(_) => None,
            Error::Cancelled => None,
        }
    }

    /// Returns the message reported by the server, if this error carries one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Error::ServerReported { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Returns `true` if the failure was reported by the backend itself.
    pub fn is_server_reported(&self) -> bool {
        matches!(self, Error::ServerReported { .. })
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpError { status, .. } => Some(*status),
            Error::DataNotFound { status } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::HttpError { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Wraps an arbitrary transport failure.
    pub fn network(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Network(err.into())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else {
            Error::Network(Box::new(err))
        }
    }
}

/// A specialized `Result` type for requests.
///
/// This is a convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
