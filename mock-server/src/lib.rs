use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const MOCK_USER: &str = "alice";
pub const MOCK_DISPLAY_NAME: &str = "Alice";
pub const MOCK_CREATED: &str = "Tue, 18 Oct 2022 10:00:00 GMT";

#[derive(Clone, Debug, PartialEq)]
pub struct Comment {
    pub id: u64,
    pub actor_id: String,
    pub actor_display_name: String,
    pub message: String,
    pub unread: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub actor_type: String,
    pub verb: String,
    pub message: String,
}

#[derive(Default)]
pub struct Store {
    next_id: u64,
    comments: HashMap<String, Vec<Comment>>,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/remote.php/dav/comments/files/{file_id}", any(comments_collection))
        .route(
            "/remote.php/dav/comments/files/{file_id}/{comment_id}",
            any(comment_entry),
        )
        .route("/ocs/v2.php/apps/dashboard/api/v1/widgets", get(widgets))
        .route("/ocs/v2.php/apps/dashboard/api/v1/widget-items", get(widget_items))
        .layer(middleware::from_fn(require_auth))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

async fn require_auth(request: Request, next: Next) -> Response {
    if request.headers().contains_key(header::AUTHORIZATION) {
        return next.run(request).await;
    }
    if request.uri().path().starts_with("/ocs/") {
        return ocs_failure(StatusCode::UNAUTHORIZED, 997, "Current user is not logged in");
    }
    dav_error(
        StatusCode::UNAUTHORIZED,
        "Sabre\\DAV\\Exception\\NotAuthenticated",
        "No public access to this resource.",
    )
}

// ---------------------------------------------------------------------------
// Comments (WebDAV)
// ---------------------------------------------------------------------------

async fn comments_collection(
    State(db): State<Db>,
    Path(file_id): Path<String>,
    method: Method,
    headers: HeaderMap,
    body: String,
) -> Response {
    match method.as_str() {
        "PROPFIND" => {
            let store = db.read().await;
            let comments = store.comments.get(&file_id).cloned().unwrap_or_default();
            multistatus(&file_id, &comments)
        }
        "POST" => {
            let is_json = headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.starts_with("application/json"));
            let input: NewComment = match serde_json::from_str(&body) {
                Ok(input) if is_json => input,
                _ => {
                    return dav_error(
                        StatusCode::BAD_REQUEST,
                        "Sabre\\DAV\\Exception\\BadRequest",
                        "Invalid comment payload",
                    )
                }
            };
            if input.actor_type != "users" || input.verb != "comment" {
                return dav_error(
                    StatusCode::BAD_REQUEST,
                    "Sabre\\DAV\\Exception\\BadRequest",
                    "Unsupported actor type or verb",
                );
            }
            let mut store = db.write().await;
            store.next_id += 1;
            let comment = Comment {
                id: store.next_id,
                actor_id: MOCK_USER.to_string(),
                actor_display_name: MOCK_DISPLAY_NAME.to_string(),
                message: input.message,
                unread: true,
            };
            store.comments.entry(file_id).or_default().push(comment);
            StatusCode::CREATED.into_response()
        }
        "PROPPATCH" => {
            let mut store = db.write().await;
            for comment in store.comments.entry(file_id).or_default().iter_mut() {
                comment.unread = false;
            }
            StatusCode::MULTI_STATUS.into_response()
        }
        _ => method_not_allowed(),
    }
}

async fn comment_entry(
    State(db): State<Db>,
    Path((file_id, comment_id)): Path<(String, String)>,
    method: Method,
    body: String,
) -> Response {
    let mut store = db.write().await;
    let comments = store.comments.entry(file_id).or_default();
    let position = comments.iter().position(|c| c.id.to_string() == comment_id);

    match (method.as_str(), position) {
        ("PROPPATCH", Some(index)) => match extract_message(&body) {
            Some(message) => {
                comments[index].message = message;
                StatusCode::MULTI_STATUS.into_response()
            }
            None => dav_error(
                StatusCode::BAD_REQUEST,
                "Sabre\\DAV\\Exception\\BadRequest",
                "Missing oc:message",
            ),
        },
        ("DELETE", Some(index)) => {
            comments.remove(index);
            StatusCode::NO_CONTENT.into_response()
        }
        ("PROPPATCH" | "DELETE", None) => dav_error(
            StatusCode::NOT_FOUND,
            "Sabre\\DAV\\Exception\\NotFound",
            "Comment not found",
        ),
        _ => method_not_allowed(),
    }
}

fn multistatus(file_id: &str, comments: &[Comment]) -> Response {
    let mut xml = String::from(
        r#"<?xml version="1.0"?>
<d:multistatus xmlns:d="DAV:" xmlns:s="http://sabredav.org/ns" xmlns:oc="http://owncloud.org/ns" xmlns:nc="http://nextcloud.org/ns">"#,
    );
    xml.push_str(&format!(
        "<d:response><d:href>/remote.php/dav/comments/files/{file_id}/</d:href>\
         <d:propstat><d:prop><oc:readMarker>{MOCK_CREATED}</oc:readMarker></d:prop>\
         <d:status>HTTP/1.1 200 OK</d:status></d:propstat></d:response>"
    ));
    for c in comments {
        xml.push_str(&format!(
            "<d:response><d:href>/remote.php/dav/comments/files/{file_id}/{id}</d:href>\
             <d:propstat><d:prop>\
             <oc:id>{id}</oc:id><oc:verb>comment</oc:verb><oc:actorType>users</oc:actorType>\
             <oc:actorId>{actor}</oc:actorId><oc:creationDateTime>{MOCK_CREATED}</oc:creationDateTime>\
             <oc:objectType>files</oc:objectType><oc:objectId>{file_id}</oc:objectId>\
             <oc:isUnread>{unread}</oc:isUnread><oc:message>{message}</oc:message>\
             <oc:actorDisplayName>{name}</oc:actorDisplayName>\
             </d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat></d:response>",
            id = c.id,
            actor = escape(&c.actor_id),
            unread = c.unread,
            message = escape(&c.message),
            name = escape(&c.actor_display_name),
        ));
    }
    xml.push_str("</d:multistatus>");
    xml_response(StatusCode::MULTI_STATUS, xml)
}

/// Pull the text of the `message` property out of a PROPPATCH body. The
/// element is matched by local name, so any namespace prefix is accepted.
fn extract_message(body: &str) -> Option<String> {
    let mut reader = Reader::from_str(body);
    let mut message: Option<String> = None;
    loop {
        match reader.read_event().ok()? {
            Event::Start(e) if message.is_none() && e.local_name().as_ref() == b"message" => {
                message = Some(String::new());
            }
            Event::Empty(e) if message.is_none() && e.local_name().as_ref() == b"message" => {
                return Some(String::new());
            }
            Event::Text(e) => {
                if let Some(text) = message.as_mut() {
                    text.push_str(&e.unescape().ok()?);
                }
            }
            Event::CData(e) => {
                if let Some(text) = message.as_mut() {
                    text.push_str(std::str::from_utf8(&e.into_inner()).ok()?);
                }
            }
            Event::End(e) if message.is_some() && e.local_name().as_ref() == b"message" => {
                return message;
            }
            Event::Eof => return None,
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Dashboard (OCS)
// ---------------------------------------------------------------------------

fn widget_catalog() -> Value {
    json!({
        "recommendations": {
            "id": "recommendations",
            "title": "Recommended files",
            "order": 0,
            "icon_class": "icon-files-dark",
            "icon_url": "/apps/files/img/files.svg",
            "widget_url": null,
            "item_icons_round": false,
            "buttons": []
        },
        "activity": {
            "id": "activity",
            "title": "Recent activity",
            "order": -5,
            "icon_class": "icon-activity",
            "icon_url": "/apps/activity/img/activity-dark.svg",
            "widget_url": "/apps/activity/",
            "item_icons_round": true,
            "buttons": [
                {"type": "more", "text": "More activities", "link": "/apps/activity/"}
            ]
        }
    })
}

fn widget_entries(widget: &str) -> Option<Value> {
    match widget {
        "activity" => Some(json!([
            {
                "subtitle": "You commented",
                "title": "report.pdf",
                "link": "/f/42",
                "iconUrl": "/apps/activity/img/comment.svg",
                "overlayIconUrl": "",
                "sinceId": 1666087200
            }
        ])),
        "recommendations" => Some(json!([])),
        _ => None,
    }
}

async fn widgets() -> Response {
    ocs_ok(widget_catalog())
}

async fn widget_items(Query(query): Query<HashMap<String, String>>) -> Response {
    let Some(widget) = query.get("widgets[]") else {
        return ocs_failure(StatusCode::BAD_REQUEST, 400, "Missing widgets[] parameter");
    };
    match widget_entries(widget) {
        Some(items) => {
            let mut data = serde_json::Map::new();
            data.insert(widget.clone(), items);
            ocs_ok(Value::Object(data))
        }
        None => ocs_failure(StatusCode::NOT_FOUND, 404, "Widget not found"),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn ocs_ok(data: Value) -> Response {
    Json(json!({
        "ocs": {
            "meta": {"status": "ok", "statuscode": 200, "message": "OK"},
            "data": data
        }
    }))
    .into_response()
}

fn ocs_failure(status: StatusCode, code: u32, message: &str) -> Response {
    let body = json!({
        "ocs": {
            "meta": {"status": "failure", "statuscode": code, "message": message},
            "data": []
        }
    });
    (status, Json(body)).into_response()
}

fn dav_error(status: StatusCode, exception: &str, message: &str) -> Response {
    let xml = format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<d:error xmlns:d="DAV:" xmlns:s="http://sabredav.org/ns">
  <s:exception>{}</s:exception>
  <s:message>{}</s:message>
</d:error>"#,
        escape(exception),
        escape(message)
    );
    xml_response(status, xml)
}

fn method_not_allowed() -> Response {
    dav_error(
        StatusCode::METHOD_NOT_ALLOWED,
        "Sabre\\DAV\\Exception\\MethodNotAllowed",
        "Method not allowed",
    )
}

fn xml_response(status: StatusCode, xml: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        xml,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_comment_reads_camel_case() {
        let input: NewComment =
            serde_json::from_str(r#"{"actorType":"users","verb":"comment","message":"hi"}"#)
                .unwrap();
        assert_eq!(input.actor_type, "users");
        assert_eq!(input.message, "hi");
    }

    #[test]
    fn new_comment_rejects_missing_message() {
        let result: Result<NewComment, _> =
            serde_json::from_str(r#"{"actorType":"users","verb":"comment"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn escape_roundtrips_through_extract() {
        let body = format!("<oc:message>{}</oc:message>", escape("a <b> & 'c'"));
        assert_eq!(extract_message(&body).as_deref(), Some("a <b> & 'c'"));
    }

    #[test]
    fn extract_message_accepts_any_prefix() {
        let body = r#"<d:propertyupdate xmlns:d="DAV:"><d:set><d:prop><x:message xmlns:x="http://owncloud.org/ns">hi there</x:message></d:prop></d:set></d:propertyupdate>"#;
        assert_eq!(extract_message(body).as_deref(), Some("hi there"));
    }

    #[test]
    fn extract_message_reads_cdata() {
        let body = "<oc:message><![CDATA[a < b & c]]></oc:message>";
        assert_eq!(extract_message(body).as_deref(), Some("a < b & c"));
    }

    #[test]
    fn extract_message_empty_element() {
        assert_eq!(extract_message("<oc:message/>").as_deref(), Some(""));
    }

    #[test]
    fn extract_message_missing() {
        assert_eq!(extract_message("<oc:readMarker>null</oc:readMarker>"), None);
    }

    #[test]
    fn unknown_widget_has_no_entries() {
        assert!(widget_entries("weather").is_none());
        assert!(widget_entries("activity").is_some());
    }

    #[test]
    fn catalog_is_keyed_by_id() {
        let catalog = widget_catalog();
        for (key, widget) in catalog.as_object().unwrap() {
            assert_eq!(widget["id"], *key);
        }
    }
}
