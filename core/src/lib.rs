//! Synchronous client core for a Nextcloud server's comments and dashboard
//! endpoints.
//!
//! # Overview
//! Builds `HttpRequest` values and parses transport outcomes without
//! touching the network (host-does-IO pattern). The caller executes the
//! actual HTTP round-trip, making the core fully deterministic and testable.
//!
//! # Design
//! - Every failure, whatever its shape (transport error, bare HTTP status,
//!   OCS JSON envelope, DAV/OCS XML body), is normalized into one `NkError`
//!   value: a numeric code plus a description.
//! - `NextcloudClient` is stateless; it holds only an explicit `Session`.
//! - Each endpoint operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes outcome), so the I/O boundary is explicit.
//! - Types use owned `String` / `Vec` fields to simplify FFI mapping.

pub mod client;
pub mod dav;
pub mod document;
pub mod error;
pub mod http;
pub mod normalize;
pub mod session;
pub mod types;

pub use client::{NextcloudClient, Outcome};
pub use document::{JsonDocument, OcsDocument, XmlDocument};
pub use error::{codes, DocumentError, NkError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, PlatformError, TransportError};
pub use session::{RequestOptions, Session};
pub use types::{
    Completion, DashboardApplication, DashboardButton, DashboardItem, DashboardReply,
    DashboardWidget, NkComment,
};
