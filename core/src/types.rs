//! Domain models returned by the endpoint client.
//!
//! # Design
//! Dashboard models deserialize straight from the OCS `data` section with
//! serde; every field defaults so a server that omits one still yields a
//! usable value. Comments come from DAV multistatus XML and are built by
//! `dav::parse_comments`.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::NkError;

/// What a call site hands back to its caller: the account the call ran
/// against, plus either the domain result or the normalized error.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion<T> {
    pub account: String,
    pub result: Result<T, NkError>,
}

impl<T> Completion<T> {
    pub fn new(account: &str, result: Result<T, NkError>) -> Self {
        Self {
            account: account.to_string(),
            result,
        }
    }

    /// The error for this call, `NkError::success()` when it succeeded.
    pub fn error(&self) -> NkError {
        match &self.result {
            Ok(_) => NkError::success(),
            Err(e) => e.clone(),
        }
    }

    pub fn into_result(self) -> Result<T, NkError> {
        self.result
    }
}

/// A comment attached to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NkComment {
    /// DAV href of the comment resource.
    pub path: String,
    pub message_id: String,
    pub verb: String,
    pub actor_type: String,
    pub actor_id: String,
    pub actor_display_name: String,
    pub creation_date_time: DateTime<FixedOffset>,
    pub object_type: String,
    pub object_id: String,
    pub is_unread: bool,
    pub message: String,
}

/// Dashboard payload plus the raw body it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardReply<T> {
    pub items: T,
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardButton {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    pub link: String,
}

/// One widget registered on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardWidget {
    pub id: String,
    pub title: String,
    pub order: i64,
    pub icon_class: String,
    pub icon_url: String,
    pub widget_url: Option<String>,
    pub item_icons_round: bool,
    pub buttons: Vec<DashboardButton>,
}

/// One entry shown inside a dashboard widget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardItem {
    pub title: String,
    pub subtitle: String,
    pub link: String,
    pub icon_url: String,
    pub overlay_icon_url: String,
    #[serde(deserialize_with = "string_or_number")]
    pub since_id: String,
}

/// The items one application contributes to the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardApplication {
    pub application: String,
    pub items: Vec<DashboardItem>,
}

/// `sinceId` is a string on some servers and a number on others.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}
