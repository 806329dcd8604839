//! Account context and per-request options.
//!
//! A `Session` is passed explicitly into `NextcloudClient::new`; there is no
//! process-wide default account.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub const DEFAULT_DAV_ROOT: &str = "remote.php/dav";
pub const DEFAULT_USER_AGENT: &str = concat!("nckit/", env!("CARGO_PKG_VERSION"));

/// Everything a call site needs to address and authenticate one account.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub account: String,
    pub url_base: String,
    pub user: String,
    pub password: String,
    pub user_agent: String,
    pub dav: String,
}

impl Session {
    pub fn new(account: &str, url_base: &str, user: &str, password: &str) -> Self {
        Self {
            account: account.to_string(),
            url_base: url_base.trim_end_matches('/').to_string(),
            user: user.to_string(),
            password: password.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            dav: DEFAULT_DAV_ROOT.to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn with_dav(mut self, dav: &str) -> Self {
        self.dav = dav.trim_matches('/').to_string();
        self
    }

    /// `Basic base64(user:password)`.
    pub fn authorization(&self) -> String {
        let credentials = format!("{}:{}", self.user, self.password);
        format!("Basic {}", STANDARD.encode(credentials))
    }
}

// Keep the password out of logs.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("account", &self.account)
            .field("url_base", &self.url_base)
            .field("user", &self.user)
            .field("password", &"****")
            .field("user_agent", &self.user_agent)
            .field("dav", &self.dav)
            .finish()
    }
}

/// Per-call knobs. `Default` gives the standard behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Absolute URL replacing the computed one (dashboard endpoints only).
    pub endpoint: Option<String>,
    /// Extra headers appended after the standard ones.
    pub custom_headers: Vec<(String, String)>,
    pub custom_user_agent: Option<String>,
}

impl RequestOptions {
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.custom_headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.custom_user_agent = Some(user_agent.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped() {
        let session = Session::new("acct", "https://cloud.example.com/", "alice", "pw");
        assert_eq!(session.url_base, "https://cloud.example.com");
        assert_eq!(session.dav, "remote.php/dav");
    }

    #[test]
    fn basic_authorization() {
        let session = Session::new("acct", "https://cloud.example.com", "alice", "secret");
        assert_eq!(session.authorization(), "Basic YWxpY2U6c2VjcmV0");
    }

    #[test]
    fn debug_masks_password() {
        let session = Session::new("acct", "https://cloud.example.com", "alice", "secret");
        let printed = format!("{session:?}");
        assert!(!printed.contains("secret"));
        assert!(printed.contains("alice"));
    }

    #[test]
    fn builders() {
        let session = Session::new("a", "http://h", "u", "p")
            .with_user_agent("agent/1")
            .with_dav("/remote.php/webdav/");
        assert_eq!(session.user_agent, "agent/1");
        assert_eq!(session.dav, "remote.php/webdav");

        let options = RequestOptions::default()
            .with_endpoint("http://other/widgets")
            .with_header("X-Trace", "1")
            .with_user_agent("custom");
        assert_eq!(options.endpoint.as_deref(), Some("http://other/widgets"));
        assert_eq!(options.custom_headers, vec![("X-Trace".to_string(), "1".to_string())]);
        assert_eq!(options.custom_user_agent.as_deref(), Some("custom"));
    }
}
