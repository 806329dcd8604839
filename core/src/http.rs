//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests, responses and transport failures as
//! plain data. The core crate builds `HttpRequest` values and consumes
//! `HttpResponse` / `TransportError` values without ever touching the
//! network; the host executes the actual I/O.
//!
//! All fields use owned types (`String`, `Vec`) so values can cross FFI and
//! thread boundaries without lifetime concerns.

/// HTTP method for a request, including the WebDAV verbs the comments
/// endpoints use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Propfind,
    Proppatch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Propfind => "PROPFIND",
            HttpMethod::Proppatch => "PROPPATCH",
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `NextcloudClient::build_*` methods. `path` is the absolute URL.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// First header value named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// `body` is `None` when the transport delivered no payload at all (for
/// example a download written straight to disk), which is distinct from an
/// empty payload.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Some(body.into()),
        }
    }

    pub fn without_body(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Lossy UTF-8 view of the body, empty when there is none.
    pub fn body_text(&self) -> String {
        self.body
            .as_deref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }

    /// Generic one-line description, used when the body has nothing better.
    pub fn description(&self) -> String {
        format!("HTTP status code {}", self.status)
    }
}

/// An error reported by the platform networking layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformError {
    pub code: i64,
    pub description: String,
}

impl PlatformError {
    pub fn new(code: i64, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }
}

/// Why a request produced no HTTP response at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The upload body could not be created.
    UploadableFailed(PlatformError),
    /// The URL request could not be constructed.
    UrlRequestFailed(PlatformError),
    /// A request adapter (auth, headers) rejected the request.
    AdaptationFailed(PlatformError),
    /// The session was torn down, optionally with a cause.
    SessionInvalidated(Option<PlatformError>),
    /// The task ran and failed: timeout, DNS, TLS, connection refused.
    TaskFailed(PlatformError),
    /// Anything else, carrying the transport's own code and message.
    Other(PlatformError),
}

impl TransportError {
    pub fn platform_error(&self) -> Option<&PlatformError> {
        match self {
            TransportError::UploadableFailed(e)
            | TransportError::UrlRequestFailed(e)
            | TransportError::AdaptationFailed(e)
            | TransportError::TaskFailed(e)
            | TransportError::Other(e) => Some(e),
            TransportError::SessionInvalidated(e) => e.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webdav_methods_have_wire_names() {
        assert_eq!(HttpMethod::Propfind.as_str(), "PROPFIND");
        assert_eq!(HttpMethod::Proppatch.as_str(), "PROPPATCH");
        assert_eq!(HttpMethod::Delete.as_str(), "DELETE");
    }

    #[test]
    fn success_range_is_2xx() {
        assert!(HttpResponse::without_body(200).is_success());
        assert!(HttpResponse::without_body(207).is_success());
        assert!(!HttpResponse::without_body(199).is_success());
        assert!(!HttpResponse::without_body(300).is_success());
    }

    #[test]
    fn body_text_is_lossy() {
        assert_eq!(HttpResponse::new(200, "abc").body_text(), "abc");
        assert_eq!(HttpResponse::without_body(200).body_text(), "");
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = HttpRequest {
            method: HttpMethod::Get,
            path: "http://x".into(),
            headers: vec![("Content-Type".into(), "application/xml".into())],
            body: None,
        };
        assert_eq!(req.header("content-type"), Some("application/xml"));
        assert_eq!(req.header("accept"), None);
    }

    #[test]
    fn session_invalidated_without_cause_has_no_platform_error() {
        assert!(TransportError::SessionInvalidated(None).platform_error().is_none());
        let cause = PlatformError::new(-1001, "The request timed out.");
        assert_eq!(
            TransportError::TaskFailed(cause.clone()).platform_error(),
            Some(&cause)
        );
    }
}
