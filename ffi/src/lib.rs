//! C-ABI wrapper around `nckit-core`.
//!
//! # Overview
//! Exposes the comments and dashboard client plus the error normalizer
//! through `extern "C"` functions so any language with a C FFI can build
//! requests and interpret outcomes without linking to serde or quick-xml
//! directly.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Per-operation `build_*` / `parse_*` mirrors the core API 1:1.
//! - Builders return an `FfiBuildResult` (request or normalized error); parsers
//!   return a single `FfiResult` envelope with `FfiDataTag` + `void* data`.
//! - The C caller owns all returned pointers and must call the matching
//!   `nckit_free_*` function to release them.

pub mod types;

use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use nckit_core::{
    Completion, HttpRequest, NextcloudClient, NkError, Outcome, RequestOptions, Session,
};

use types::*;

type Built = Result<Result<HttpRequest, NkError>, &'static str>;

/// Read a required C string argument, reporting `name` when it is null or
/// not UTF-8.
///
/// # Safety
/// `ptr` must be null or a NUL-terminated string valid for the call.
unsafe fn required<'a>(ptr: *const c_char, name: &'static str) -> Result<&'a str, &'static str> {
    unsafe { read_str(ptr) }.ok_or(name)
}

/// Options carrying an optional endpoint override.
///
/// # Safety
/// `endpoint` must be null or a NUL-terminated string valid for the call.
unsafe fn endpoint_options(endpoint: *const c_char) -> RequestOptions {
    match unsafe { read_str(endpoint) } {
        Some(endpoint) => RequestOptions::default().with_endpoint(endpoint),
        None => RequestOptions::default(),
    }
}

fn build(
    client: *const FfiClient,
    operation: &str,
    f: impl FnOnce(&NextcloudClient) -> Built,
) -> *mut FfiBuildResult {
    catch_unwind(AssertUnwindSafe(|| {
        let Some(client) = (unsafe { client.as_ref() }) else {
            return FfiBuildResult::null_arg("client");
        };
        match f(&client.inner) {
            Ok(result) => FfiBuildResult::from_core(result),
            Err(name) => FfiBuildResult::null_arg(name),
        }
    }))
    .unwrap_or_else(|_| FfiBuildResult::panic(&format!("panic in {operation}")))
}

fn parse<T>(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
    operation: &str,
    parse: impl FnOnce(&NextcloudClient, Outcome) -> Completion<T>,
    ok: impl FnOnce(&str, T) -> *mut FfiResult,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        let Some(client) = (unsafe { client.as_ref() }) else {
            return FfiResult::null_arg("client");
        };
        let Some(response) = (unsafe { response.as_ref() }) else {
            return FfiResult::null_arg("response");
        };
        let outcome = unsafe { response.to_outcome() };
        let completion = parse(&client.inner, outcome);
        match completion.result {
            Ok(value) => ok(&completion.account, value),
            Err(err) => FfiResult::from_error(&completion.account, err),
        }
    }))
    .unwrap_or_else(|_| FfiResult::panic(&format!("panic in {operation}")))
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new client for one account.
///
/// Returns null if any argument is null or not UTF-8, or if an internal
/// panic occurs. The URL itself is validated lazily by each builder. The
/// caller must free the returned pointer with `nckit_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn nckit_client_new(
    account: *const c_char,
    url_base: *const c_char,
    user: *const c_char,
    password: *const c_char,
) -> *mut FfiClient {
    catch_unwind(|| {
        let args = unsafe {
            (
                read_str(account),
                read_str(url_base),
                read_str(user),
                read_str(password),
            )
        };
        let (Some(account), Some(url_base), Some(user), Some(password)) = args else {
            return std::ptr::null_mut();
        };
        let session = Session::new(account, url_base, user, password);
        Box::into_raw(Box::new(FfiClient {
            inner: NextcloudClient::new(session),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `nckit_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn nckit_client_free(client: *mut FfiClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build the PROPFIND listing the comments of `file_id`.
#[unsafe(no_mangle)]
pub extern "C" fn nckit_build_get_comments(
    client: *const FfiClient,
    file_id: *const c_char,
) -> *mut FfiBuildResult {
    build(client, "nckit_build_get_comments", |c| {
        let file_id = unsafe { required(file_id, "file_id")? };
        Ok(c.build_get_comments(file_id, &RequestOptions::default()))
    })
}

/// Build the POST adding `message` as a new comment on `file_id`.
#[unsafe(no_mangle)]
pub extern "C" fn nckit_build_put_comments(
    client: *const FfiClient,
    file_id: *const c_char,
    message: *const c_char,
) -> *mut FfiBuildResult {
    build(client, "nckit_build_put_comments", |c| {
        let file_id = unsafe { required(file_id, "file_id")? };
        let message = unsafe { required(message, "message")? };
        Ok(c.build_put_comments(file_id, message, &RequestOptions::default()))
    })
}

/// Build the PROPPATCH replacing the text of comment `message_id`.
#[unsafe(no_mangle)]
pub extern "C" fn nckit_build_update_comments(
    client: *const FfiClient,
    file_id: *const c_char,
    message_id: *const c_char,
    message: *const c_char,
) -> *mut FfiBuildResult {
    build(client, "nckit_build_update_comments", |c| {
        let file_id = unsafe { required(file_id, "file_id")? };
        let message_id = unsafe { required(message_id, "message_id")? };
        let message = unsafe { required(message, "message")? };
        Ok(c.build_update_comments(file_id, message_id, message, &RequestOptions::default()))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn nckit_build_delete_comments(
    client: *const FfiClient,
    file_id: *const c_char,
    message_id: *const c_char,
) -> *mut FfiBuildResult {
    build(client, "nckit_build_delete_comments", |c| {
        let file_id = unsafe { required(file_id, "file_id")? };
        let message_id = unsafe { required(message_id, "message_id")? };
        Ok(c.build_delete_comments(file_id, message_id, &RequestOptions::default()))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn nckit_build_mark_as_read_comments(
    client: *const FfiClient,
    file_id: *const c_char,
) -> *mut FfiBuildResult {
    build(client, "nckit_build_mark_as_read_comments", |c| {
        let file_id = unsafe { required(file_id, "file_id")? };
        Ok(c.build_mark_as_read_comments(file_id, &RequestOptions::default()))
    })
}

/// Build the dashboard widget listing. `endpoint` may be null; when set it
/// replaces the default OCS URL.
#[unsafe(no_mangle)]
pub extern "C" fn nckit_build_get_dashboard_widget(
    client: *const FfiClient,
    endpoint: *const c_char,
) -> *mut FfiBuildResult {
    build(client, "nckit_build_get_dashboard_widget", |c| {
        let options = unsafe { endpoint_options(endpoint) };
        Ok(c.build_get_dashboard_widget(&options))
    })
}

/// Build the request for the items of widget `items`. `endpoint` may be null.
#[unsafe(no_mangle)]
pub extern "C" fn nckit_build_get_dashboard_widgets_application(
    client: *const FfiClient,
    items: *const c_char,
    endpoint: *const c_char,
) -> *mut FfiBuildResult {
    build(client, "nckit_build_get_dashboard_widgets_application", |c| {
        let items = unsafe { required(items, "items")? };
        let options = unsafe { endpoint_options(endpoint) };
        Ok(c.build_get_dashboard_widgets_application(items, &options))
    })
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Returns a result with `data_tag = Comments` on success.
#[unsafe(no_mangle)]
pub extern "C" fn nckit_parse_get_comments(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse(
        client,
        response,
        "nckit_parse_get_comments",
        |c, outcome| c.parse_get_comments(outcome),
        FfiResult::ok_comments,
    )
}

#[unsafe(no_mangle)]
pub extern "C" fn nckit_parse_put_comments(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse(
        client,
        response,
        "nckit_parse_put_comments",
        |c, outcome| c.parse_put_comments(outcome),
        |account, ()| FfiResult::ok_empty(account),
    )
}

#[unsafe(no_mangle)]
pub extern "C" fn nckit_parse_update_comments(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse(
        client,
        response,
        "nckit_parse_update_comments",
        |c, outcome| c.parse_update_comments(outcome),
        |account, ()| FfiResult::ok_empty(account),
    )
}

#[unsafe(no_mangle)]
pub extern "C" fn nckit_parse_delete_comments(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse(
        client,
        response,
        "nckit_parse_delete_comments",
        |c, outcome| c.parse_delete_comments(outcome),
        |account, ()| FfiResult::ok_empty(account),
    )
}

#[unsafe(no_mangle)]
pub extern "C" fn nckit_parse_mark_as_read_comments(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse(
        client,
        response,
        "nckit_parse_mark_as_read_comments",
        |c, outcome| c.parse_mark_as_read_comments(outcome),
        |account, ()| FfiResult::ok_empty(account),
    )
}

/// Returns a result with `data_tag = Widgets` on success.
#[unsafe(no_mangle)]
pub extern "C" fn nckit_parse_get_dashboard_widget(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse(
        client,
        response,
        "nckit_parse_get_dashboard_widget",
        |c, outcome| c.parse_get_dashboard_widget(outcome),
        FfiResult::ok_widgets,
    )
}

/// Returns a result with `data_tag = Applications` on success.
#[unsafe(no_mangle)]
pub extern "C" fn nckit_parse_get_dashboard_widgets_application(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse(
        client,
        response,
        "nckit_parse_get_dashboard_widgets_application",
        |c, outcome| c.parse_get_dashboard_widgets_application(outcome),
        FfiResult::ok_applications,
    )
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Normalize a bare status code. A null `fallback` reads as empty.
#[unsafe(no_mangle)]
pub extern "C" fn nckit_error_from_status(code: i64, fallback: *const c_char) -> *mut FfiError {
    catch_unwind(|| {
        let fallback = unsafe { read_str(fallback) }.unwrap_or_default();
        FfiError::from_core(NkError::from_status(code, fallback))
    })
    .unwrap_or_else(|_| FfiError::new(PANIC, "panic in nckit_error_from_status"))
}

/// Normalize a response body of unknown format (JSON, then XML).
/// `fallback_status` of 0 means "no fallback".
#[unsafe(no_mangle)]
pub extern "C" fn nckit_error_from_body(
    body: *const u8,
    len: usize,
    fallback_status: i64,
) -> *mut FfiError {
    catch_unwind(|| {
        let body = if body.is_null() {
            &[][..]
        } else {
            unsafe { std::slice::from_raw_parts(body, len) }
        };
        let fallback = (fallback_status != 0).then_some(fallback_status);
        FfiError::from_core(NkError::from_body(body, fallback))
    })
    .unwrap_or_else(|_| FfiError::new(PANIC, "panic in nckit_error_from_body"))
}

/// Normalize a whole transport outcome: the failure, the response, both or
/// neither. Kind `None` with status 0 and a null body is "no response", so
/// an outcome with neither yields code 0 and an empty description.
#[unsafe(no_mangle)]
pub extern "C" fn nckit_error_from_outcome(response: *const FfiHttpResponse) -> *mut FfiError {
    catch_unwind(|| {
        let Some(response) = (unsafe { response.as_ref() }) else {
            return FfiError::new(NULL_ARGUMENT, "response is null");
        };
        let (failure, response) = unsafe { response.to_parts() };
        FfiError::from_core(NkError::from_transport_failure(failure.as_ref(), response.as_ref()))
    })
    .unwrap_or_else(|_| FfiError::new(PANIC, "panic in nckit_error_from_outcome"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` detached from an `FfiBuildResult`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn nckit_free_request(req: *mut FfiHttpRequest) {
    let _ = catch_unwind(|| unsafe { FfiHttpRequest::release(req) });
}

/// Free an `FfiBuildResult` and the request it still owns. Safe to call
/// with null.
#[unsafe(no_mangle)]
pub extern "C" fn nckit_free_build_result(result: *mut FfiBuildResult) {
    let _ = catch_unwind(|| unsafe { FfiBuildResult::release(result) });
}

/// Free an `FfiResult` returned by any `nckit_parse_*` function. Safe to
/// call with null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn nckit_free_result(result: *mut FfiResult) {
    let _ = catch_unwind(|| unsafe { FfiResult::release(result) });
}

#[unsafe(no_mangle)]
pub extern "C" fn nckit_free_error(err: *mut FfiError) {
    let _ = catch_unwind(|| unsafe { FfiError::release(err) });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn nckit_free_string(s: *mut c_char) {
    let _ = catch_unwind(|| unsafe { free_c_string(s) });
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::{CStr, CString};

    const MULTISTATUS: &str = r#"<?xml version="1.0"?>
<d:multistatus xmlns:d="DAV:" xmlns:oc="http://owncloud.org/ns">
  <d:response>
    <d:href>/remote.php/dav/comments/files/42/7</d:href>
    <d:propstat><d:prop>
      <oc:id>7</oc:id>
      <oc:actorDisplayName>Alice</oc:actorDisplayName>
      <oc:creationDateTime>Tue, 18 Oct 2022 10:00:00 GMT</oc:creationDateTime>
      <oc:isUnread>true</oc:isUnread>
      <oc:message>hello</oc:message>
    </d:prop></d:propstat>
  </d:response>
</d:multistatus>"#;

    fn new_client(url: &str) -> *mut FfiClient {
        let account = CString::new("alice").unwrap();
        let url = CString::new(url).unwrap();
        let user = CString::new("alice").unwrap();
        let password = CString::new("secret").unwrap();
        nckit_client_new(account.as_ptr(), url.as_ptr(), user.as_ptr(), password.as_ptr())
    }

    fn response(status: u16, body: &[u8]) -> FfiHttpResponse {
        FfiHttpResponse {
            status,
            body: body.as_ptr(),
            body_len: body.len(),
            transport: FfiTransportKind::None,
            transport_code: 0,
            transport_message: std::ptr::null(),
        }
    }

    fn str_of(ptr: *const c_char) -> &'static str {
        unsafe { CStr::from_ptr(ptr) }.to_str().unwrap()
    }

    #[test]
    fn client_new_and_free() {
        let client = new_client("https://cloud.example.com");
        assert!(!client.is_null());
        nckit_client_free(client);
    }

    #[test]
    fn client_new_null_returns_null() {
        let url = CString::new("https://cloud.example.com").unwrap();
        let client = nckit_client_new(std::ptr::null(), url.as_ptr(), url.as_ptr(), url.as_ptr());
        assert!(client.is_null());
    }

    #[test]
    fn free_null_is_safe() {
        nckit_client_free(std::ptr::null_mut());
        nckit_free_request(std::ptr::null_mut());
        nckit_free_build_result(std::ptr::null_mut());
        nckit_free_result(std::ptr::null_mut());
        nckit_free_error(std::ptr::null_mut());
        nckit_free_string(std::ptr::null_mut());
    }

    #[test]
    fn build_get_comments_returns_propfind() {
        let client = new_client("https://cloud.example.com");
        let file_id = CString::new("42").unwrap();
        let result = nckit_build_get_comments(client, file_id.as_ptr());
        let result_ref = unsafe { &*result };
        assert_eq!(result_ref.error_code, 0);
        assert!(result_ref.error_message.is_null());

        let req = unsafe { &*result_ref.request };
        assert_eq!(req.method, FfiHttpMethod::Propfind);
        assert_eq!(str_of(req.method_name), "PROPFIND");
        assert_eq!(
            str_of(req.path),
            "https://cloud.example.com/remote.php/dav/comments/files/42"
        );
        assert!(!req.body.is_null());
        let headers = unsafe { std::slice::from_raw_parts(req.headers, req.headers_len as usize) };
        assert!(headers
            .iter()
            .any(|h| str_of(h.key) == "Depth" && str_of(h.value) == "1"));

        nckit_free_build_result(result);
        nckit_client_free(client);
    }

    #[test]
    fn build_with_bad_url_reports_url_error() {
        let client = new_client("not a url");
        let result = nckit_build_get_dashboard_widget(client, std::ptr::null());
        let result_ref = unsafe { &*result };
        assert_eq!(result_ref.error_code, nckit_core::codes::BAD_URL);
        assert_eq!(str_of(result_ref.error_message), "Invalid server url");
        assert!(result_ref.request.is_null());
        nckit_free_build_result(result);
        nckit_client_free(client);
    }

    #[test]
    fn build_null_argument() {
        let client = new_client("https://cloud.example.com");
        let result = nckit_build_put_comments(client, std::ptr::null(), std::ptr::null());
        let result_ref = unsafe { &*result };
        assert_eq!(result_ref.error_code, NULL_ARGUMENT);
        assert_eq!(str_of(result_ref.error_message), "null argument: file_id");
        nckit_free_build_result(result);

        let result = nckit_build_get_comments(std::ptr::null(), std::ptr::null());
        assert_eq!(unsafe { &*result }.error_code, NULL_ARGUMENT);
        nckit_free_build_result(result);
        nckit_client_free(client);
    }

    #[test]
    fn detached_request_outlives_build_result() {
        let client = new_client("https://cloud.example.com");
        let result = nckit_build_get_dashboard_widget(client, std::ptr::null());
        let req = std::mem::replace(unsafe { &mut (*result).request }, std::ptr::null_mut());
        nckit_free_build_result(result);
        assert!(str_of(unsafe { &*req }.path).ends_with("/dashboard/api/v1/widgets"));
        nckit_free_request(req);
        nckit_client_free(client);
    }

    #[test]
    fn parse_get_comments_success() {
        let client = new_client("https://cloud.example.com");
        let resp = response(207, MULTISTATUS.as_bytes());
        let result = nckit_parse_get_comments(client, &resp);
        let result_ref = unsafe { &*result };
        assert_eq!(result_ref.error_code, 0);
        assert_eq!(str_of(result_ref.account), "alice");
        assert_eq!(result_ref.data_tag, FfiDataTag::Comments);

        let list = unsafe { &*(result_ref.data as *const FfiCommentList) };
        assert_eq!(list.len, 1);
        let comment = unsafe { &*list.items };
        assert_eq!(str_of(comment.message_id), "7");
        assert_eq!(str_of(comment.message), "hello");
        assert_eq!(comment.creation_date_time, 1_666_087_200);
        assert!(comment.is_unread);

        nckit_free_result(result);
        nckit_client_free(client);
    }

    #[test]
    fn parse_dav_error_body() {
        let client = new_client("https://cloud.example.com");
        let body = br#"<d:error xmlns:d="DAV:" xmlns:s="http://sabredav.org/ns"><s:message>Comment not found</s:message></d:error>"#;
        let resp = response(404, body);
        let result = nckit_parse_delete_comments(client, &resp);
        let result_ref = unsafe { &*result };
        assert_eq!(result_ref.error_code, 404);
        assert_eq!(str_of(result_ref.error_message), "Comment not found");
        assert!(result_ref.data.is_null());
        nckit_free_result(result);
        nckit_client_free(client);
    }

    #[test]
    fn parse_transport_failure() {
        let client = new_client("https://cloud.example.com");
        let message = CString::new("The request timed out.").unwrap();
        let resp = FfiHttpResponse {
            status: 0,
            body: std::ptr::null(),
            body_len: 0,
            transport: FfiTransportKind::TaskFailed,
            transport_code: nckit_core::codes::TIMED_OUT,
            transport_message: message.as_ptr(),
        };
        let result = nckit_parse_put_comments(client, &resp);
        let result_ref = unsafe { &*result };
        assert_eq!(result_ref.error_code, -1001);
        assert_eq!(str_of(result_ref.error_message), "The request timed out.");
        nckit_free_result(result);

        let resp = FfiHttpResponse {
            transport: FfiTransportKind::SessionInvalidated,
            transport_message: std::ptr::null(),
            ..resp
        };
        let result = nckit_parse_put_comments(client, &resp);
        assert_eq!(unsafe { &*result }.error_code, nckit_core::codes::INTERNAL_ERROR);
        nckit_free_result(result);
        nckit_client_free(client);
    }

    #[test]
    fn parse_empty_success() {
        let client = new_client("https://cloud.example.com");
        let resp = FfiHttpResponse {
            body: std::ptr::null(),
            ..response(201, b"")
        };
        let result = nckit_parse_put_comments(client, &resp);
        let result_ref = unsafe { &*result };
        assert_eq!(result_ref.error_code, 0);
        assert_eq!(result_ref.data_tag, FfiDataTag::None);
        assert!(result_ref.data.is_null());
        nckit_free_result(result);
        nckit_client_free(client);
    }

    #[test]
    fn parse_null_response_is_null_argument() {
        let client = new_client("https://cloud.example.com");
        let result = nckit_parse_get_comments(client, std::ptr::null());
        let result_ref = unsafe { &*result };
        assert_eq!(result_ref.error_code, NULL_ARGUMENT);
        assert!(result_ref.account.is_null());
        nckit_free_result(result);
        nckit_client_free(client);
    }

    #[test]
    fn parse_dashboard_widgets() {
        let client = new_client("https://cloud.example.com");
        let body = br#"{"ocs":{"meta":{"statuscode":200},"data":{
            "b":{"id":"b","title":"B","order":2,"buttons":[{"type":"new","text":"New","link":"/n"}]},
            "a":{"id":"a","title":"A","order":1,"widget_url":null}
        }}}"#;
        let resp = response(200, body);
        let result = nckit_parse_get_dashboard_widget(client, &resp);
        let result_ref = unsafe { &*result };
        assert_eq!(result_ref.error_code, 0);
        assert_eq!(result_ref.data_tag, FfiDataTag::Widgets);

        let list = unsafe { &*(result_ref.data as *const FfiWidgetList) };
        assert_eq!(list.len, 2);
        let widgets = unsafe { std::slice::from_raw_parts(list.items, list.len as usize) };
        assert_eq!(str_of(widgets[0].id), "a");
        assert!(widgets[0].widget_url.is_null());
        assert_eq!(widgets[1].buttons_len, 1);
        assert_eq!(str_of(unsafe { &*widgets[1].buttons }.kind), "new");
        assert!(str_of(list.raw).contains("\"statuscode\":200"));

        nckit_free_result(result);
        nckit_client_free(client);
    }

    #[test]
    fn parse_dashboard_applications() {
        let client = new_client("https://cloud.example.com");
        let body = br#"{"ocs":{"meta":{"statuscode":200},"data":{"activity":[{"title":"report.pdf","sinceId":5}]}}}"#;
        let resp = response(200, body);
        let result = nckit_parse_get_dashboard_widgets_application(client, &resp);
        let result_ref = unsafe { &*result };
        assert_eq!(result_ref.data_tag, FfiDataTag::Applications);

        let list = unsafe { &*(result_ref.data as *const FfiApplicationList) };
        assert_eq!(list.len, 1);
        let app = unsafe { &*list.items };
        assert_eq!(str_of(app.application), "activity");
        assert_eq!(app.items_len, 1);
        assert_eq!(str_of(unsafe { &*app.items }.since_id), "5");

        nckit_free_result(result);
        nckit_client_free(client);
    }

    #[test]
    fn error_from_status_uses_table() {
        let fallback = CString::new("ignored").unwrap();
        let err = nckit_error_from_status(404, fallback.as_ptr());
        let err_ref = unsafe { &*err };
        assert_eq!(err_ref.code, 404);
        assert_eq!(
            str_of(err_ref.description),
            "404: The requested resource could not be found"
        );
        nckit_free_error(err);

        let err = nckit_error_from_status(418, std::ptr::null());
        assert_eq!(str_of(unsafe { &*err }.description), "418: ");
        nckit_free_error(err);
    }

    #[test]
    fn error_from_body_reads_ocs() {
        let body = br#"{"ocs":{"meta":{"statuscode":997,"message":"Current user is not logged in"}}}"#;
        let err = nckit_error_from_body(body.as_ptr(), body.len(), 401);
        let err_ref = unsafe { &*err };
        assert_eq!(err_ref.code, 997);
        assert_eq!(str_of(err_ref.description), "Current user is not logged in");
        nckit_free_error(err);

        let err = nckit_error_from_body(std::ptr::null(), 0, 0);
        assert_eq!(unsafe { &*err }.code, nckit_core::codes::CANNOT_DECODE_CONTENT_DATA);
        nckit_free_error(err);
    }

    #[test]
    fn error_from_outcome_without_response_or_failure_is_success() {
        let none = FfiHttpResponse {
            status: 0,
            body: std::ptr::null(),
            body_len: 0,
            transport: FfiTransportKind::None,
            transport_code: 0,
            transport_message: std::ptr::null(),
        };
        let err = nckit_error_from_outcome(&none);
        let err_ref = unsafe { &*err };
        assert_eq!(err_ref.code, 0);
        assert_eq!(str_of(err_ref.description), "");
        nckit_free_error(err);
    }

    #[test]
    fn error_from_outcome_reads_response_and_failure() {
        let err = nckit_error_from_outcome(&response(404, b""));
        assert_eq!(unsafe { &*err }.code, 404);
        nckit_free_error(err);

        let message = CString::new("offline").unwrap();
        let failed = FfiHttpResponse {
            status: 0,
            body: std::ptr::null(),
            body_len: 0,
            transport: FfiTransportKind::UrlRequestFailed,
            transport_code: nckit_core::codes::NOT_CONNECTED_TO_INTERNET,
            transport_message: message.as_ptr(),
        };
        let err = nckit_error_from_outcome(&failed);
        let err_ref = unsafe { &*err };
        assert_eq!(err_ref.code, -1009);
        assert_eq!(str_of(err_ref.description), "offline");
        nckit_free_error(err);

        let err = nckit_error_from_outcome(std::ptr::null());
        assert_eq!(unsafe { &*err }.code, NULL_ARGUMENT);
        nckit_free_error(err);
    }
}
