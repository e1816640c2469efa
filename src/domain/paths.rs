//! Relative URL paths handed to the revalidation endpoint.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// A normalized relative path: always starts and ends with `/`, never carries
/// a scheme or host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevalidationPath(String);

impl RevalidationPath {
    /// The site root, `/`.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Normalize a permalink, archive URL or bare path.
    ///
    /// `base_url` is the site's public base URL; when `raw` starts with it the
    /// prefix is stripped. Absolute URLs on any other host keep only their
    /// URL path. The remainder is trimmed of surrounding slashes and wrapped
    /// so it begins and ends with `/`.
    pub fn normalize(raw: &str, base_url: &str) -> Self {
        let raw = raw.trim();
        let base = base_url.trim().trim_end_matches('/');

        let stripped = (!base.is_empty())
            .then(|| raw.strip_prefix(base))
            .flatten()
            .filter(|rest| rest.is_empty() || rest.starts_with('/'));

        let remainder = if let Some(rest) = stripped {
            rest.to_string()
        } else if let Ok(url) = Url::parse(raw)
            && url.has_host()
        {
            url.path().to_string()
        } else {
            raw.to_string()
        };

        Self::wrap(&remainder)
    }

    fn wrap(remainder: &str) -> Self {
        let trimmed = remainder.trim_matches('/');
        if trimmed.is_empty() {
            return Self::root();
        }
        Self(format!("/{trimmed}/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RevalidationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RevalidationPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
