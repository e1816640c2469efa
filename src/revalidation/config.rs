//! Engine configuration.
//!
//! Built from the `[site]`, `[endpoint]` and `[dispatch]` sections of
//! `revalidate.toml`.

use std::fmt;
use std::time::Duration;

const DEFAULT_COOLDOWN_SECS: u64 = 5;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DISPATCHABLE_KIND: &str = "post";
const MASK_CHARS: [char; 2] = ['•', '*'];

/// Tunables for dedup, dispatch and path resolution.
#[derive(Debug, Clone)]
pub struct RevalidationConfig {
    /// Public base URL of the CMS site, stripped from permalinks.
    pub site_base_url: String,
    /// Suppress repeat dispatches of a path inside `cooldown_window`.
    pub cooldown_enabled: bool,
    pub cooldown_window: Duration,
    /// Upper bound for one outbound request, connect through body.
    pub request_timeout: Duration,
    /// Content kinds whose saves and status changes trigger dispatch.
    pub dispatchable_kinds: Vec<String>,
}

impl Default for RevalidationConfig {
    fn default() -> Self {
        Self {
            site_base_url: String::new(),
            cooldown_enabled: true,
            cooldown_window: Duration::from_secs(DEFAULT_COOLDOWN_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            dispatchable_kinds: vec![DEFAULT_DISPATCHABLE_KIND.to_string()],
        }
    }
}

impl From<&crate::config::Settings> for RevalidationConfig {
    fn from(settings: &crate::config::Settings) -> Self {
        Self {
            site_base_url: settings.site.base_url.clone(),
            cooldown_enabled: settings.dispatch.cooldown_enabled,
            cooldown_window: settings.dispatch.cooldown,
            dispatchable_kinds: settings.dispatch.dispatchable_kinds.clone(),
            ..Self::default()
        }
    }
}

impl RevalidationConfig {
    pub fn is_dispatchable(&self, content_kind: &str) -> bool {
        self.dispatchable_kinds
            .iter()
            .any(|kind| kind.eq_ignore_ascii_case(content_kind))
    }
}

/// Where and how to reach the revalidation endpoint.
///
/// Either value empty means dispatch is disabled; that is a valid state.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct EndpointConfig {
    pub endpoint_url: String,
    pub auth_token: String,
}

impl EndpointConfig {
    pub fn new(endpoint_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            auth_token: auth_token.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.endpoint_url.trim().is_empty() && !self.auth_token.trim().is_empty()
    }

    /// Apply an update from the settings store.
    ///
    /// A token made only of mask characters is the display placeholder for
    /// the stored secret and never replaces it.
    pub fn merge_update(&mut self, incoming: EndpointConfig) {
        self.endpoint_url = incoming.endpoint_url.trim().to_string();
        if !is_masked_placeholder(&incoming.auth_token) {
            self.auth_token = incoming.auth_token.trim().to_string();
        }
    }
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("auth_token", &if self.auth_token.is_empty() { "" } else { "[redacted]" })
            .finish()
    }
}

fn is_masked_placeholder(token: &str) -> bool {
    let token = token.trim();
    !token.is_empty() && token.chars().all(|c| MASK_CHARS.contains(&c))
}
