//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, pointer + length instead of `Vec`, and
//! tagged enums with explicit discriminants. Conversion and release code
//! lives here to keep `lib.rs` focused on the `extern "C"` surface.
//!
//! Arrays are handed out as boxed slices so that length and capacity always
//! agree when they come back to be freed.

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;

use nckit_core::{
    DashboardApplication, DashboardButton, DashboardItem, DashboardReply, DashboardWidget,
    HttpMethod, HttpRequest, HttpResponse, NkComment, NkError, Outcome, PlatformError,
    TransportError,
};

/// A required pointer argument was null.
pub const NULL_ARGUMENT: i64 = -9001;
/// A panic was caught before it could cross the boundary.
pub const PANIC: i64 = -9002;

/// Opaque handle to a `NextcloudClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiClient {
    pub(crate) inner: nckit_core::NextcloudClient,
}

// ---------------------------------------------------------------------------
// Strings and arrays
// ---------------------------------------------------------------------------

/// Copy `s` into a C string owned by the caller. Interior NULs are dropped.
pub(crate) fn c_string(s: impl Into<String>) -> *mut c_char {
    let mut s = s.into();
    s.retain(|c| c != '\0');
    CString::new(s).unwrap_or_default().into_raw()
}

pub(crate) fn c_string_opt(s: Option<String>) -> *mut c_char {
    s.map_or(std::ptr::null_mut(), c_string)
}

/// Borrow a caller-provided C string. Null and invalid UTF-8 read as `None`.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
pub(crate) unsafe fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Release a string produced by `c_string`. Null is ignored.
///
/// # Safety
/// `ptr` must be null or come from `c_string` and not be freed twice.
pub(crate) unsafe fn free_c_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}

fn into_raw_array<T>(items: Vec<T>) -> (*mut T, u32) {
    if items.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let len = items.len() as u32;
    (Box::into_raw(items.into_boxed_slice()) as *mut T, len)
}

/// # Safety
/// `ptr`/`len` must come from `into_raw_array`.
unsafe fn from_raw_array<T>(ptr: *mut T, len: u32) -> Vec<T> {
    if ptr.is_null() || len == 0 {
        return Vec::new();
    }
    let slice = std::ptr::slice_from_raw_parts_mut(ptr, len as usize);
    unsafe { Box::from_raw(slice) }.into_vec()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
    Propfind = 4,
    Proppatch = 5,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
            HttpMethod::Propfind => FfiHttpMethod::Propfind,
            HttpMethod::Proppatch => FfiHttpMethod::Proppatch,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `nckit_build_*` functions. The C caller executes the request
/// and passes the outcome back through `nckit_parse_*`. `method_name` is the
/// wire verb, convenient for HTTP stacks that take the method as a string.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub method_name: *mut c_char,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let headers: Vec<FfiHeader> = req
            .headers
            .into_iter()
            .map(|(k, v)| FfiHeader {
                key: c_string(k),
                value: c_string(v),
            })
            .collect();
        let (headers, headers_len) = into_raw_array(headers);

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            method_name: c_string(req.method.as_str()),
            path: c_string(req.path),
            headers,
            headers_len,
            body: c_string_opt(req.body),
        }))
    }

    /// # Safety
    /// `req` must come from `from_core` and not be freed twice.
    pub(crate) unsafe fn release(req: *mut Self) {
        if req.is_null() {
            return;
        }
        let req = unsafe { Box::from_raw(req) };
        unsafe {
            free_c_string(req.method_name);
            free_c_string(req.path);
            free_c_string(req.body);
            for header in from_raw_array(req.headers, req.headers_len) {
                free_c_string(header.key);
                free_c_string(header.value);
            }
        }
    }
}

/// Outcome of a `nckit_build_*` call: a request, or the reason none could be
/// built. Exactly one of `request` and `error_message` is non-null.
#[repr(C)]
pub struct FfiBuildResult {
    pub error_code: i64,
    pub error_message: *mut c_char,
    pub request: *mut FfiHttpRequest,
}

impl FfiBuildResult {
    pub(crate) fn from_core(result: Result<HttpRequest, NkError>) -> *mut Self {
        match result {
            Ok(req) => Box::into_raw(Box::new(FfiBuildResult {
                error_code: 0,
                error_message: std::ptr::null_mut(),
                request: FfiHttpRequest::from_core(req),
            })),
            Err(err) => Self::error(err.code(), err.description()),
        }
    }

    pub(crate) fn error(code: i64, message: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiBuildResult {
            error_code: code,
            error_message: c_string(message),
            request: std::ptr::null_mut(),
        }))
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(NULL_ARGUMENT, &format!("null argument: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(PANIC, msg)
    }

    /// Frees the envelope and whatever `request` still points to. A caller
    /// that wants to keep the request nulls the field first.
    ///
    /// # Safety
    /// `result` must come from one of the constructors above and not be
    /// freed twice.
    pub(crate) unsafe fn release(result: *mut Self) {
        if result.is_null() {
            return;
        }
        let result = unsafe { Box::from_raw(result) };
        unsafe {
            free_c_string(result.error_message);
            FfiHttpRequest::release(result.request);
        }
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// Why the host got no HTTP response. `None` means a response is present.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiTransportKind {
    None = 0,
    UploadableFailed = 1,
    UrlRequestFailed = 2,
    AdaptationFailed = 3,
    SessionInvalidated = 4,
    TaskFailed = 5,
    Other = 6,
}

/// The outcome of executing an `FfiHttpRequest`, as the C caller saw it.
///
/// The caller builds this on the stack and passes a pointer to a
/// `nckit_parse_*` function; the FFI layer reads but never frees it. A null
/// `body` means the transport delivered no payload, which is distinct from an
/// empty one (`body_len == 0`). For `SessionInvalidated` a null
/// `transport_message` means the session was torn down without a cause.
/// `nckit_error_from_outcome` reads kind `None` with status 0 and a null
/// `body` as "no response".
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const u8,
    pub body_len: usize,
    pub transport: FfiTransportKind,
    pub transport_code: i64,
    pub transport_message: *const c_char,
}

impl FfiHttpResponse {
    /// # Safety
    /// `body` must be null or valid for `body_len` bytes;
    /// `transport_message` must be null or a NUL-terminated string.
    pub(crate) unsafe fn to_outcome(&self) -> Outcome {
        match unsafe { self.transport_failure() } {
            Some(failure) => Err(failure),
            None => Ok(unsafe { self.to_response() }),
        }
    }

    /// Split into the optional failure and the optional response. With kind
    /// `None`, status 0 and a null body mean the host got no response at all.
    ///
    /// # Safety
    /// Same contract as [`FfiHttpResponse::to_outcome`].
    pub(crate) unsafe fn to_parts(&self) -> (Option<TransportError>, Option<HttpResponse>) {
        match unsafe { self.transport_failure() } {
            Some(failure) => (Some(failure), None),
            None if self.status == 0 && self.body.is_null() => (None, None),
            None => (None, Some(unsafe { self.to_response() })),
        }
    }

    unsafe fn to_response(&self) -> HttpResponse {
        let body = if self.body.is_null() {
            None
        } else {
            Some(unsafe { std::slice::from_raw_parts(self.body, self.body_len) }.to_vec())
        };
        HttpResponse {
            status: self.status,
            headers: Vec::new(),
            body,
        }
    }

    unsafe fn transport_failure(&self) -> Option<TransportError> {
        let message = unsafe { read_str(self.transport_message) };
        let platform = || PlatformError::new(self.transport_code, message.unwrap_or_default());

        let failure = match self.transport {
            FfiTransportKind::None => return None,
            FfiTransportKind::UploadableFailed => TransportError::UploadableFailed(platform()),
            FfiTransportKind::UrlRequestFailed => TransportError::UrlRequestFailed(platform()),
            FfiTransportKind::AdaptationFailed => TransportError::AdaptationFailed(platform()),
            FfiTransportKind::SessionInvalidated => {
                TransportError::SessionInvalidated(message.map(|_| platform()))
            }
            FfiTransportKind::TaskFailed => TransportError::TaskFailed(platform()),
            FfiTransportKind::Other => TransportError::Other(platform()),
        };
        Some(failure)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A normalized error exposed to C.
#[repr(C)]
pub struct FfiError {
    pub code: i64,
    pub description: *mut c_char,
}

impl FfiError {
    pub(crate) fn from_core(err: NkError) -> *mut Self {
        Self::new(err.code(), err.description())
    }

    pub(crate) fn new(code: i64, description: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiError {
            code,
            description: c_string(description),
        }))
    }

    /// # Safety
    /// `err` must come from `new` and not be freed twice.
    pub(crate) unsafe fn release(err: *mut Self) {
        if err.is_null() {
            return;
        }
        let err = unsafe { Box::from_raw(err) };
        unsafe { free_c_string(err.description) };
    }
}

// ---------------------------------------------------------------------------
// Result payloads
// ---------------------------------------------------------------------------

/// Tag that tells `nckit_free_result` what `FfiResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    Comments = 1,
    Widgets = 2,
    Applications = 3,
}

/// A comment exposed to C. `creation_date_time` is Unix seconds.
#[repr(C)]
pub struct FfiComment {
    pub path: *mut c_char,
    pub message_id: *mut c_char,
    pub verb: *mut c_char,
    pub actor_type: *mut c_char,
    pub actor_id: *mut c_char,
    pub actor_display_name: *mut c_char,
    pub creation_date_time: i64,
    pub object_type: *mut c_char,
    pub object_id: *mut c_char,
    pub is_unread: bool,
    pub message: *mut c_char,
}

impl From<NkComment> for FfiComment {
    fn from(c: NkComment) -> Self {
        FfiComment {
            path: c_string(c.path),
            message_id: c_string(c.message_id),
            verb: c_string(c.verb),
            actor_type: c_string(c.actor_type),
            actor_id: c_string(c.actor_id),
            actor_display_name: c_string(c.actor_display_name),
            creation_date_time: c.creation_date_time.timestamp(),
            object_type: c_string(c.object_type),
            object_id: c_string(c.object_id),
            is_unread: c.is_unread,
            message: c_string(c.message),
        }
    }
}

impl FfiComment {
    unsafe fn release_fields(&self) {
        unsafe {
            for s in [
                self.path,
                self.message_id,
                self.verb,
                self.actor_type,
                self.actor_id,
                self.actor_display_name,
                self.object_type,
                self.object_id,
                self.message,
            ] {
                free_c_string(s);
            }
        }
    }
}

#[repr(C)]
pub struct FfiCommentList {
    pub items: *mut FfiComment,
    pub len: u32,
}

#[repr(C)]
pub struct FfiButton {
    pub kind: *mut c_char,
    pub text: *mut c_char,
    pub link: *mut c_char,
}

impl From<DashboardButton> for FfiButton {
    fn from(b: DashboardButton) -> Self {
        FfiButton {
            kind: c_string(b.kind),
            text: c_string(b.text),
            link: c_string(b.link),
        }
    }
}

/// A dashboard widget exposed to C. `widget_url` may be null.
#[repr(C)]
pub struct FfiWidget {
    pub id: *mut c_char,
    pub title: *mut c_char,
    pub order: i64,
    pub icon_class: *mut c_char,
    pub icon_url: *mut c_char,
    pub widget_url: *mut c_char,
    pub item_icons_round: bool,
    pub buttons: *mut FfiButton,
    pub buttons_len: u32,
}

impl From<DashboardWidget> for FfiWidget {
    fn from(w: DashboardWidget) -> Self {
        let buttons = w.buttons.into_iter().map(FfiButton::from).collect();
        let (buttons, buttons_len) = into_raw_array(buttons);
        FfiWidget {
            id: c_string(w.id),
            title: c_string(w.title),
            order: w.order,
            icon_class: c_string(w.icon_class),
            icon_url: c_string(w.icon_url),
            widget_url: c_string_opt(w.widget_url),
            item_icons_round: w.item_icons_round,
            buttons,
            buttons_len,
        }
    }
}

impl FfiWidget {
    unsafe fn release_fields(&self) {
        unsafe {
            for s in [self.id, self.title, self.icon_class, self.icon_url, self.widget_url] {
                free_c_string(s);
            }
            for b in from_raw_array(self.buttons, self.buttons_len) {
                free_c_string(b.kind);
                free_c_string(b.text);
                free_c_string(b.link);
            }
        }
    }
}

/// Widgets plus the raw OCS body they were parsed from.
#[repr(C)]
pub struct FfiWidgetList {
    pub items: *mut FfiWidget,
    pub len: u32,
    pub raw: *mut c_char,
}

#[repr(C)]
pub struct FfiItem {
    pub title: *mut c_char,
    pub subtitle: *mut c_char,
    pub link: *mut c_char,
    pub icon_url: *mut c_char,
    pub overlay_icon_url: *mut c_char,
    pub since_id: *mut c_char,
}

impl From<DashboardItem> for FfiItem {
    fn from(i: DashboardItem) -> Self {
        FfiItem {
            title: c_string(i.title),
            subtitle: c_string(i.subtitle),
            link: c_string(i.link),
            icon_url: c_string(i.icon_url),
            overlay_icon_url: c_string(i.overlay_icon_url),
            since_id: c_string(i.since_id),
        }
    }
}

#[repr(C)]
pub struct FfiApplication {
    pub application: *mut c_char,
    pub items: *mut FfiItem,
    pub items_len: u32,
}

impl From<DashboardApplication> for FfiApplication {
    fn from(a: DashboardApplication) -> Self {
        let items = a.items.into_iter().map(FfiItem::from).collect();
        let (items, items_len) = into_raw_array(items);
        FfiApplication {
            application: c_string(a.application),
            items,
            items_len,
        }
    }
}

impl FfiApplication {
    unsafe fn release_fields(&self) {
        unsafe {
            free_c_string(self.application);
            for i in from_raw_array(self.items, self.items_len) {
                for s in [i.title, i.subtitle, i.link, i.icon_url, i.overlay_icon_url, i.since_id] {
                    free_c_string(s);
                }
            }
        }
    }
}

/// Applications plus the raw OCS body they were parsed from.
#[repr(C)]
pub struct FfiApplicationList {
    pub items: *mut FfiApplication,
    pub len: u32,
    pub raw: *mut c_char,
}

// ---------------------------------------------------------------------------
// Result envelope
// ---------------------------------------------------------------------------

/// Result envelope for all parse operations.
///
/// On success `error_code` is 0, `error_message` is null, and `data` points
/// to the parsed payload tagged by `data_tag` (null for operations with no
/// payload). On failure `error_code` and `error_message` carry the normalized
/// error and `data` is null. `account` is always set when a client was
/// available.
#[repr(C)]
pub struct FfiResult {
    pub account: *mut c_char,
    pub error_code: i64,
    pub error_message: *mut c_char,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiResult {
    fn ok(account: &str, tag: FfiDataTag, data: *mut c_void) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            account: c_string(account),
            error_code: 0,
            error_message: std::ptr::null_mut(),
            data_tag: tag,
            data,
        }))
    }

    pub(crate) fn ok_empty(account: &str) -> *mut Self {
        Self::ok(account, FfiDataTag::None, std::ptr::null_mut())
    }

    pub(crate) fn ok_comments(account: &str, comments: Vec<NkComment>) -> *mut Self {
        let (items, len) = into_raw_array(comments.into_iter().map(FfiComment::from).collect());
        let list = Box::into_raw(Box::new(FfiCommentList { items, len }));
        Self::ok(account, FfiDataTag::Comments, list as *mut c_void)
    }

    pub(crate) fn ok_widgets(account: &str, reply: DashboardReply<Vec<DashboardWidget>>) -> *mut Self {
        let (items, len) = into_raw_array(reply.items.into_iter().map(FfiWidget::from).collect());
        let list = Box::into_raw(Box::new(FfiWidgetList {
            items,
            len,
            raw: c_string(reply.raw),
        }));
        Self::ok(account, FfiDataTag::Widgets, list as *mut c_void)
    }

    pub(crate) fn ok_applications(
        account: &str,
        reply: DashboardReply<Vec<DashboardApplication>>,
    ) -> *mut Self {
        let (items, len) =
            into_raw_array(reply.items.into_iter().map(FfiApplication::from).collect());
        let list = Box::into_raw(Box::new(FfiApplicationList {
            items,
            len,
            raw: c_string(reply.raw),
        }));
        Self::ok(account, FfiDataTag::Applications, list as *mut c_void)
    }

    pub(crate) fn error(account: Option<&str>, code: i64, message: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            account: c_string_opt(account.map(str::to_string)),
            error_code: code,
            error_message: c_string(message),
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    pub(crate) fn from_error(account: &str, err: NkError) -> *mut Self {
        Self::error(Some(account), err.code(), err.description())
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(None, NULL_ARGUMENT, &format!("null argument: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(None, PANIC, msg)
    }

    /// # Safety
    /// `result` must come from one of the constructors above and not be
    /// freed twice.
    pub(crate) unsafe fn release(result: *mut Self) {
        if result.is_null() {
            return;
        }
        let result = unsafe { Box::from_raw(result) };
        unsafe {
            free_c_string(result.account);
            free_c_string(result.error_message);
            if result.data.is_null() {
                return;
            }
            match result.data_tag {
                FfiDataTag::Comments => {
                    let list = Box::from_raw(result.data as *mut FfiCommentList);
                    for c in from_raw_array(list.items, list.len) {
                        c.release_fields();
                    }
                }
                FfiDataTag::Widgets => {
                    let list = Box::from_raw(result.data as *mut FfiWidgetList);
                    free_c_string(list.raw);
                    for w in from_raw_array(list.items, list.len) {
                        w.release_fields();
                    }
                }
                FfiDataTag::Applications => {
                    let list = Box::from_raw(result.data as *mut FfiApplicationList);
                    free_c_string(list.raw);
                    for a in from_raw_array(list.items, list.len) {
                        a.release_fields();
                    }
                }
                FfiDataTag::None => {}
            }
        }
    }
}
