//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

mod cli;

pub use cli::*;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "revalidate";
const ENV_PREFIX: &str = "REVALIDATE";
const DEFAULT_COOLDOWN_SECS: u64 = 5;
const DEFAULT_DISPATCHABLE_KIND: &str = "post";
const DEFAULT_AUDIT_PATH: &str = "revalidate-audit.json";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub site: SiteSettings,
    pub endpoint: EndpointSettings,
    pub dispatch: DispatchSettings,
    pub audit: AuditSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    /// Empty when unset; permalinks then keep only their URL path.
    pub base_url: String,
}

/// Empty values are valid and leave dispatch disabled.
#[derive(Clone)]
pub struct EndpointSettings {
    pub url: String,
    pub token: String,
}

impl std::fmt::Debug for EndpointSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointSettings")
            .field("url", &self.url)
            .field("token_set", &!self.token.is_empty())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub cooldown: Duration,
    pub cooldown_enabled: bool,
    pub dispatchable_kinds: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AuditSettings {
    pub path: PathBuf,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("dispatch.dispatchable_kinds")
            .try_parsing(true),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    site: RawSiteSettings,
    endpoint: RawEndpointSettings,
    dispatch: RawDispatchSettings,
    audit: RawAuditSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.site_base_url.as_ref() {
            self.site.base_url = Some(url.clone());
        }
        if let Some(url) = overrides.endpoint_url.as_ref() {
            self.endpoint.url = Some(url.clone());
        }
        if let Some(token) = overrides.endpoint_token.as_ref() {
            self.endpoint.token = Some(token.clone());
        }
        if let Some(path) = overrides.audit_path.as_ref() {
            self.audit.path = Some(path.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            site,
            endpoint,
            dispatch,
            audit,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            site: build_site_settings(site)?,
            endpoint: build_endpoint_settings(endpoint)?,
            dispatch: build_dispatch_settings(dispatch)?,
            audit: build_audit_settings(audit)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let base_url = trimmed_or_empty(site.base_url);
    if !base_url.is_empty() {
        parse_http_url(&base_url).map_err(|reason| LoadError::invalid("site.base_url", reason))?;
    }
    Ok(SiteSettings { base_url })
}

fn build_endpoint_settings(endpoint: RawEndpointSettings) -> Result<EndpointSettings, LoadError> {
    let url = trimmed_or_empty(endpoint.url);
    if !url.is_empty() {
        parse_http_url(&url).map_err(|reason| LoadError::invalid("endpoint.url", reason))?;
    }
    Ok(EndpointSettings {
        url,
        token: trimmed_or_empty(endpoint.token),
    })
}

fn build_dispatch_settings(dispatch: RawDispatchSettings) -> Result<DispatchSettings, LoadError> {
    let kinds: Vec<String> = match dispatch.dispatchable_kinds {
        Some(kinds) => kinds
            .into_iter()
            .map(|kind| kind.trim().to_string())
            .filter(|kind| !kind.is_empty())
            .collect(),
        None => vec![DEFAULT_DISPATCHABLE_KIND.to_string()],
    };
    if kinds.is_empty() {
        return Err(LoadError::invalid(
            "dispatch.dispatchable_kinds",
            "at least one content kind is required",
        ));
    }

    Ok(DispatchSettings {
        cooldown: Duration::from_secs(dispatch.cooldown_seconds.unwrap_or(DEFAULT_COOLDOWN_SECS)),
        cooldown_enabled: dispatch.cooldown_enabled.unwrap_or(true),
        dispatchable_kinds: kinds,
    })
}

fn build_audit_settings(audit: RawAuditSettings) -> Result<AuditSettings, LoadError> {
    let path = audit
        .path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_AUDIT_PATH));
    if path.as_os_str().is_empty() {
        return Err(LoadError::invalid("audit.path", "must not be empty"));
    }
    Ok(AuditSettings { path })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawEndpointSettings {
    url: Option<String>,
    token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDispatchSettings {
    cooldown_seconds: Option<u64>,
    cooldown_enabled: Option<bool>,
    dispatchable_kinds: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAuditSettings {
    path: Option<PathBuf>,
}

fn trimmed_or_empty(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn parse_http_url(value: &str) -> Result<Url, String> {
    let url = Url::parse(value).map_err(|err| format!("invalid url `{value}`: {err}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(format!("unsupported scheme `{scheme}`")),
    }
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
