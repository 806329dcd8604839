//! Canonical error value for every endpoint call.
//!
//! # Design
//! `NkError` is a plain `(code, description)` pair with structural equality.
//! `0` means success, negative codes are local or transport sentinels, and
//! positive codes are HTTP or OCS status codes. The constructors that turn
//! raw responses into an `NkError` live in `normalize`; this module holds the
//! value type, the fixed constants, and the fallback description table.

/// Numeric sentinels used for local and transport-level failures.
pub mod codes {
    pub const SUCCESS: i64 = 0;
    pub const INTERNAL_ERROR: i64 = -9999;
    pub const BAD_URL: i64 = -1000;
    pub const TIMED_OUT: i64 = -1001;
    pub const CANNOT_CONNECT_TO_HOST: i64 = -1004;
    pub const NETWORK_CONNECTION_LOST: i64 = -1005;
    pub const NOT_CONNECTED_TO_INTERNET: i64 = -1009;
    pub const BAD_SERVER_RESPONSE: i64 = -1011;
    pub const USER_CANCELLED_AUTHENTICATION: i64 = -1012;
    pub const USER_AUTHENTICATION_REQUIRED: i64 = -1013;
    pub const CANNOT_DECODE_CONTENT_DATA: i64 = -1016;
    pub const SECURE_CONNECTION_FAILED: i64 = -1200;
    pub const SERVER_CERTIFICATE_UNTRUSTED: i64 = -1202;
}

/// A normalized error: one code, one human-readable description.
///
/// Values are immutable once built and compare equal when both fields match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
#[error("{description} (code {code})")]
pub struct NkError {
    code: i64,
    description: String,
}

impl NkError {
    pub fn new(code: i64, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_success(&self) -> bool {
        self.code == codes::SUCCESS
    }

    /// `(0, "")`.
    pub fn success() -> Self {
        Self::new(codes::SUCCESS, "")
    }

    /// The server URL could not be turned into a request URL.
    pub fn url_error() -> Self {
        Self::new(codes::BAD_URL, "Invalid server url")
    }

    pub fn xml_error() -> Self {
        Self::new(codes::BAD_SERVER_RESPONSE, "Invalid response, error decoding XML")
    }

    pub fn invalid_date() -> Self {
        Self::new(codes::BAD_SERVER_RESPONSE, "Invalid date format")
    }

    pub fn invalid_data() -> Self {
        Self::new(codes::CANNOT_DECODE_CONTENT_DATA, "Invalid data format")
    }

    /// Look up the fixed description for `code`, if the table has one.
    pub fn fallback_description(code: i64) -> Option<&'static str> {
        let description = match code {
            codes::INTERNAL_ERROR => "Internal error",
            codes::TIMED_OUT => "Time out",
            codes::CANNOT_CONNECT_TO_HOST => "The server appears to be down",
            codes::NETWORK_CONNECTION_LOST => {
                "It is not possible to connect to the server at this time"
            }
            codes::NOT_CONNECTED_TO_INTERNET => "Server connection error",
            codes::BAD_SERVER_RESPONSE => "Generic error",
            codes::USER_CANCELLED_AUTHENTICATION => {
                "It is not possible to connect to the server at this time"
            }
            codes::USER_AUTHENTICATION_REQUIRED => "User authentication required",
            codes::SECURE_CONNECTION_FAILED => "Connection SSL error, try again",
            codes::SERVER_CERTIFICATE_UNTRUSTED => "The certificate for this server is invalid",
            codes::SUCCESS => "",
            101 => "The name contains at least one invalid character",
            200 => "Transfer stopped",
            207 => "WebDAV multistatus",
            304 => "Resource not modified",
            400 => "Bad request",
            401 => "Unauthorized",
            403 => "You don't have permission to complete the operation",
            404 => "The requested resource could not be found",
            405 => "The requested method is not supported",
            409 => {
                "The request could not be completed due to a conflict with the current state of the resource"
            }
            412 => "The server does not meet one of the preconditions that the requester",
            413 => "The file is too large",
            423 => "WebDAV Locked: Trying to access locked resource",
            500 => "Internal server error",
            503 => "The server is temporarily unavailable",
            507 => "Storage quota is reached",
            codes::CANNOT_DECODE_CONTENT_DATA => "Invalid data format",
            _ => return None,
        };
        Some(description)
    }
}

impl Default for NkError {
    fn default() -> Self {
        Self::success()
    }
}

/// Failures raised while reading a response body before it is normalized.
///
/// These never reach callers directly; `client` maps each to one of the
/// fixed `NkError` constants.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("element <{0}> is never closed")]
    UnclosedElement(String),

    #[error("XML document has no root element")]
    NoRootElement,

    #[error("body is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("invalid date {0:?}")]
    Date(String),
}

impl From<DocumentError> for NkError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Json(_) | DocumentError::Utf8(_) => NkError::invalid_data(),
            DocumentError::Xml(_)
            | DocumentError::UnclosedElement(_)
            | DocumentError::NoRootElement => NkError::xml_error(),
            DocumentError::Date(_) => NkError::invalid_date(),
        }
    }
}
