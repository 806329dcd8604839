//! Stateless request builder and response parser for the comments and
//! dashboard endpoints.
//!
//! # Design
//! `NextcloudClient` holds only a `Session` and carries no mutable state
//! between calls. Each endpoint operation is split into a `build_*` method
//! that produces an `HttpRequest` and a `parse_*` method that consumes the
//! transport outcome. The caller executes the actual HTTP round-trip,
//! keeping the core deterministic and free of I/O dependencies.
//!
//! Every failure path goes through `NkError`: URL construction failures
//! surface from `build_*` as `NkError::url_error()`, and non-2xx responses or
//! transport failures are normalized in `parse_*`.

use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::dav;
use crate::document::{JsonDocument, OcsDocument, OCS_META_CODE};
use crate::error::{codes, DocumentError, NkError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, TransportError};
use crate::session::{RequestOptions, Session};
use crate::types::{
    Completion, DashboardApplication, DashboardItem, DashboardReply, DashboardWidget, NkComment,
};

const DASHBOARD_WIDGETS: &str = "ocs/v2.php/apps/dashboard/api/v1/widgets";
const DASHBOARD_WIDGET_ITEMS: &str = "ocs/v2.php/apps/dashboard/api/v1/widget-items";

/// What the host hands back after executing an `HttpRequest`.
pub type Outcome = Result<HttpResponse, TransportError>;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewComment<'a> {
    actor_type: &'a str,
    verb: &'a str,
    message: &'a str,
}

/// Synchronous, stateless client for one account.
///
/// Builds `HttpRequest` values and parses transport outcomes without
/// touching the network.
#[derive(Debug, Clone)]
pub struct NextcloudClient {
    session: Session,
}

impl NextcloudClient {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn account(&self) -> &str {
        &self.session.account
    }

    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    pub fn build_get_comments(
        &self,
        file_id: &str,
        options: &RequestOptions,
    ) -> Result<HttpRequest, NkError> {
        let mut headers = self.standard_headers(options, Some("application/xml"));
        headers.push(("Depth".to_string(), "1".to_string()));
        Ok(HttpRequest {
            method: HttpMethod::Propfind,
            path: self.comments_url(&[file_id])?,
            headers,
            body: Some(dav::PROPFIND_COMMENTS_BODY.to_string()),
        })
    }

    pub fn build_put_comments(
        &self,
        file_id: &str,
        message: &str,
        options: &RequestOptions,
    ) -> Result<HttpRequest, NkError> {
        let comment = NewComment {
            actor_type: "users",
            verb: "comment",
            message,
        };
        let body = serde_json::to_string(&comment).map_err(|_| NkError::invalid_data())?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.comments_url(&[file_id])?,
            headers: self.standard_headers(options, Some("application/json")),
            body: Some(body),
        })
    }

    pub fn build_update_comments(
        &self,
        file_id: &str,
        message_id: &str,
        message: &str,
        options: &RequestOptions,
    ) -> Result<HttpRequest, NkError> {
        Ok(HttpRequest {
            method: HttpMethod::Proppatch,
            path: self.comments_url(&[file_id, message_id])?,
            headers: self.standard_headers(options, Some("application/xml")),
            body: Some(dav::update_comment_body(message)),
        })
    }

    pub fn build_delete_comments(
        &self,
        file_id: &str,
        message_id: &str,
        options: &RequestOptions,
    ) -> Result<HttpRequest, NkError> {
        Ok(HttpRequest {
            method: HttpMethod::Delete,
            path: self.comments_url(&[file_id, message_id])?,
            headers: self.standard_headers(options, None),
            body: None,
        })
    }

    pub fn build_mark_as_read_comments(
        &self,
        file_id: &str,
        options: &RequestOptions,
    ) -> Result<HttpRequest, NkError> {
        Ok(HttpRequest {
            method: HttpMethod::Proppatch,
            path: self.comments_url(&[file_id])?,
            headers: self.standard_headers(options, Some("application/xml")),
            body: Some(dav::MARK_AS_READ_BODY.to_string()),
        })
    }

    pub fn parse_get_comments(&self, outcome: Outcome) -> Completion<Vec<NkComment>> {
        let result = check_status(outcome, "getComments").and_then(|response| {
            let body = response.body.ok_or_else(NkError::invalid_data)?;
            Ok(dav::parse_comments(&body)?)
        });
        self.complete(result)
    }

    pub fn parse_put_comments(&self, outcome: Outcome) -> Completion<()> {
        self.complete(check_status(outcome, "putComments").map(drop))
    }

    pub fn parse_update_comments(&self, outcome: Outcome) -> Completion<()> {
        self.complete(check_status(outcome, "updateComments").map(drop))
    }

    pub fn parse_delete_comments(&self, outcome: Outcome) -> Completion<()> {
        self.complete(check_status(outcome, "deleteComments").map(drop))
    }

    pub fn parse_mark_as_read_comments(&self, outcome: Outcome) -> Completion<()> {
        self.complete(check_status(outcome, "markAsReadComments").map(drop))
    }

    // -----------------------------------------------------------------------
    // Dashboard
    // -----------------------------------------------------------------------

    pub fn build_get_dashboard_widget(
        &self,
        options: &RequestOptions,
    ) -> Result<HttpRequest, NkError> {
        let url = match &options.endpoint {
            Some(endpoint) => parse_url(endpoint)?,
            None => self.ocs_url(DASHBOARD_WIDGETS)?,
        };
        Ok(HttpRequest {
            method: HttpMethod::Get,
            path: url.to_string(),
            headers: self.standard_headers(options, None),
            body: None,
        })
    }

    /// `items` is the widget id whose entries should be fetched.
    pub fn build_get_dashboard_widgets_application(
        &self,
        items: &str,
        options: &RequestOptions,
    ) -> Result<HttpRequest, NkError> {
        let url = match &options.endpoint {
            Some(endpoint) => parse_url(endpoint)?,
            None => {
                let mut url = self.ocs_url(DASHBOARD_WIDGET_ITEMS)?;
                url.query_pairs_mut().append_pair("widgets[]", items);
                url
            }
        };
        Ok(HttpRequest {
            method: HttpMethod::Get,
            path: url.to_string(),
            headers: self.standard_headers(options, None),
            body: None,
        })
    }

    pub fn parse_get_dashboard_widget(
        &self,
        outcome: Outcome,
    ) -> Completion<DashboardReply<Vec<DashboardWidget>>> {
        self.complete(parse_dashboard(outcome, "getDashboardWidget", widgets_from))
    }

    pub fn parse_get_dashboard_widgets_application(
        &self,
        outcome: Outcome,
    ) -> Completion<DashboardReply<Vec<DashboardApplication>>> {
        self.complete(parse_dashboard(
            outcome,
            "getDashboardWidgetsApplication",
            applications_from,
        ))
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn complete<T>(&self, result: Result<T, NkError>) -> Completion<T> {
        Completion::new(self.account(), result)
    }

    fn base_url(&self) -> Result<Url, NkError> {
        parse_url(&self.session.url_base)
    }

    /// `{url_base}/{dav}/comments/files/{segments...}`, each segment
    /// percent-encoded.
    fn comments_url(&self, segments: &[&str]) -> Result<String, NkError> {
        let mut url = self.base_url()?;
        {
            let mut path = url.path_segments_mut().map_err(|_| NkError::url_error())?;
            path.pop_if_empty()
                .extend(self.session.dav.split('/').filter(|s| !s.is_empty()))
                .extend(["comments", "files"])
                .extend(segments);
        }
        Ok(url.to_string())
    }

    fn ocs_url(&self, endpoint: &str) -> Result<Url, NkError> {
        let mut url = self.base_url()?;
        url.path_segments_mut()
            .map_err(|_| NkError::url_error())?
            .pop_if_empty()
            .extend(endpoint.split('/'));
        Ok(url)
    }

    fn standard_headers(
        &self,
        options: &RequestOptions,
        content_type: Option<&str>,
    ) -> Vec<(String, String)> {
        let user_agent = options
            .custom_user_agent
            .as_deref()
            .unwrap_or(&self.session.user_agent);
        let mut headers = vec![
            ("Authorization".to_string(), self.session.authorization()),
            ("User-Agent".to_string(), user_agent.to_string()),
            ("Accept".to_string(), "application/json".to_string()),
            ("OCS-APIRequest".to_string(), "true".to_string()),
        ];
        if let Some(content_type) = content_type {
            headers.push(("Content-Type".to_string(), content_type.to_string()));
        }
        headers.extend(options.custom_headers.iter().cloned());
        headers
    }
}

fn parse_url(raw: &str) -> Result<Url, NkError> {
    let url = Url::parse(raw).map_err(|_| NkError::url_error())?;
    if url.cannot_be_a_base() {
        return Err(NkError::url_error());
    }
    Ok(url)
}

/// Pass 2xx responses through; normalize everything else.
fn check_status(outcome: Outcome, operation: &str) -> Result<HttpResponse, NkError> {
    match outcome {
        Ok(response) if response.is_success() => {
            debug!("{operation}: HTTP {}", response.status);
            Ok(response)
        }
        Ok(response) => {
            let err = NkError::from_transport_failure(None, Some(&response));
            warn!("{operation}: HTTP {} -> {err}", response.status);
            Err(err)
        }
        Err(failure) => {
            let err = NkError::from_transport_failure(Some(&failure), None);
            warn!("{operation}: transport failure {failure:?} -> {err}");
            Err(err)
        }
    }
}

/// Shared OCS handling for both dashboard calls. A body that is not JSON is
/// `invalid_data`; an envelope whose `statuscode` is missing or outside 2xx
/// is normalized with the HTTP status as fallback.
fn parse_dashboard<T>(
    outcome: Outcome,
    operation: &str,
    factory: fn(&Value) -> Result<T, DocumentError>,
) -> Result<DashboardReply<T>, NkError> {
    let response = check_status(outcome, operation)?;
    let http_status = i64::from(response.status);
    let body = response.body.ok_or_else(NkError::invalid_data)?;
    let doc = JsonDocument::parse(&body)?;

    let code = doc.get_int(OCS_META_CODE).unwrap_or(codes::INTERNAL_ERROR);
    if !(200..300).contains(&code) {
        let err = NkError::from_json(&doc, Some(http_status));
        warn!("{operation}: OCS status {code} -> {err}");
        return Err(err);
    }

    let data = doc.root().pointer("/ocs/data").unwrap_or(&Value::Null);
    Ok(DashboardReply {
        items: factory(data)?,
        raw: String::from_utf8_lossy(&body).into_owned(),
    })
}

/// `ocs.data` maps widget id to widget. An empty PHP array arrives as `[]`.
fn widgets_from(data: &Value) -> Result<Vec<DashboardWidget>, DocumentError> {
    let Some(map) = data.as_object() else {
        return Ok(Vec::new());
    };
    let mut widgets = Vec::with_capacity(map.len());
    for (id, value) in map {
        let mut widget: DashboardWidget = serde_json::from_value(value.clone())?;
        if widget.id.is_empty() {
            widget.id = id.clone();
        }
        widgets.push(widget);
    }
    widgets.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
    Ok(widgets)
}

/// `ocs.data` maps widget id to its items: a bare list (v1) or an object
/// with an `items` list (v2).
fn applications_from(data: &Value) -> Result<Vec<DashboardApplication>, DocumentError> {
    let Some(map) = data.as_object() else {
        return Ok(Vec::new());
    };
    let mut applications = Vec::with_capacity(map.len());
    for (application, value) in map {
        let list = value.get("items").unwrap_or(value);
        let items: Vec<DashboardItem> = match list {
            Value::Array(_) => serde_json::from_value(list.clone())?,
            _ => Vec::new(),
        };
        applications.push(DashboardApplication {
            application: application.clone(),
            items,
        });
    }
    applications.sort_by(|a, b| a.application.cmp(&b.application));
    Ok(applications)
}
