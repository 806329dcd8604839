//! Collapse raw failure shapes into one `NkError`.
//!
//! # Design
//! Four entry points, one per input shape: a bare status code, a JSON body, an
//! XML body, and a transport outcome that may carry any of the former. None
//! of them can fail. A missing field falls through to the next source and
//! the chain ends at an empty description.
//!
//! Any OCS `statuscode` in `[200, 300)` is reported as code `0`. Callers only
//! distinguish "ok" from a specific failure code, so the exact 2xx value
//! (201, 204, ...) is intentionally dropped.

use crate::document::{
    JsonDocument, OcsDocument, XmlDocument, DAV_ERROR_MESSAGE, OCS_DATA_MESSAGE, OCS_META_CODE,
    OCS_META_MESSAGE,
};
use crate::error::{codes, NkError};
use crate::http::{HttpResponse, TransportError};

const SESSION_INVALIDATED: &str = "Session was invalidated without error";

impl NkError {
    /// Build an error from a status code alone.
    ///
    /// The table entry for `code` wins over `fallback_description`; either
    /// way the text is prefixed with `"{code}: "`.
    pub fn from_status(code: i64, fallback_description: &str) -> Self {
        let text = Self::fallback_description(code).unwrap_or(fallback_description);
        Self::new(code, format!("{code}: {text}"))
    }

    /// Build an error from an OCS JSON envelope.
    ///
    /// Description order: `ocs.data.message`, `ocs.meta.message`, table.
    pub fn from_json(doc: &impl OcsDocument, fallback_status: Option<i64>) -> Self {
        let status = status_code(doc, fallback_status);
        let description = doc
            .get_string(OCS_DATA_MESSAGE)
            .or_else(|| doc.get_string(OCS_META_MESSAGE))
            .unwrap_or_else(|| table_or_empty(status));
        Self::new(canonical_code(status), description)
    }

    /// Build an error from an OCS XML envelope or a DAV error body.
    ///
    /// Description order: `ocs.data.message`, `ocs.meta.message`,
    /// `d:error.s:message`, table.
    pub fn from_xml(doc: &impl OcsDocument, fallback_status: Option<i64>) -> Self {
        let status = status_code(doc, fallback_status);
        let description = doc
            .get_string(OCS_DATA_MESSAGE)
            .or_else(|| doc.get_string(OCS_META_MESSAGE))
            .or_else(|| doc.get_string(DAV_ERROR_MESSAGE))
            .unwrap_or_else(|| table_or_empty(status));
        Self::new(canonical_code(status), description)
    }

    /// Parse `body` as JSON and normalize it. A body that is not JSON is
    /// treated as a document with no fields.
    pub fn from_json_bytes(body: &[u8], fallback_status: Option<i64>) -> Self {
        match JsonDocument::parse(body) {
            Ok(doc) => Self::from_json(&doc, fallback_status),
            Err(_) => Self::from_json(&JsonDocument::new(serde_json::Value::Null), fallback_status),
        }
    }

    /// Parse `body` as XML and normalize it. Malformed XML is treated as an
    /// empty document.
    pub fn from_xml_bytes(body: &[u8], fallback_status: Option<i64>) -> Self {
        Self::from_xml(&XmlDocument::parse(body), fallback_status)
    }

    /// Normalize a response body of unknown format: JSON first, then XML.
    pub fn from_body(body: &[u8], fallback_status: Option<i64>) -> Self {
        match JsonDocument::parse(body) {
            Ok(doc) => Self::from_json(&doc, fallback_status),
            Err(_) => Self::from_xml_bytes(body, fallback_status),
        }
    }

    /// Normalize the outcome of a failed request.
    ///
    /// A response always takes precedence over the transport failure: its
    /// body is normalized with the HTTP status as fallback, or, if it has no
    /// body, the status alone is used. Without a response the platform error
    /// is reported verbatim. With neither, the request is considered
    /// successful.
    pub fn from_transport_failure(
        failure: Option<&TransportError>,
        response: Option<&HttpResponse>,
    ) -> Self {
        if let Some(response) = response {
            let status = i64::from(response.status);
            return match response.body.as_deref() {
                Some(body) => Self::from_body(body, Some(status)),
                None => Self::from_status(status, &response.description()),
            };
        }

        match failure {
            Some(failure) => match failure.platform_error() {
                Some(err) => Self::new(err.code, err.description.clone()),
                None => Self::new(codes::INTERNAL_ERROR, SESSION_INVALIDATED),
            },
            None => Self::success(),
        }
    }
}

fn status_code(doc: &impl OcsDocument, fallback_status: Option<i64>) -> i64 {
    doc.get_int(OCS_META_CODE)
        .or(fallback_status)
        .unwrap_or(codes::CANNOT_DECODE_CONTENT_DATA)
}

fn canonical_code(status: i64) -> i64 {
    if (200..300).contains(&status) {
        codes::SUCCESS
    } else {
        status
    }
}

fn table_or_empty(status: i64) -> String {
    NkError::fallback_description(status)
        .unwrap_or_default()
        .to_string()
}
