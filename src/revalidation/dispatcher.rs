//! Outbound revalidation requests.
//!
//! One `GET {endpoint}?token=..&path=..` per path. Every attempt, whatever
//! its outcome, is turned into a [`DispatchAttempt`] for the audit log; the
//! dispatcher itself never fails.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use reqwest::header::HeaderMap;
use reqwest::{Client, Response};
use revalidate_api_types::{
    AttemptStatus, DispatchAttempt, HttpResponseRecord, RequestRecord, ResponseRecord,
    TransportFailure,
};
use time::OffsetDateTime;
use tracing::{info, warn};
use url::Url;

use crate::application::error::error_chain;
use crate::domain::paths::RevalidationPath;
use crate::infra::error::InfraError;

use super::config::EndpointConfig;
use super::{METRIC_DISPATCH_MS, METRIC_DISPATCH_TOTAL};

pub const USER_AGENT: &str = concat!("revalidate/", env!("CARGO_PKG_VERSION"));

const TOKEN_PARAM: &str = "token";
const PATH_PARAM: &str = "path";
const REDACTED: &str = "[redacted]";
/// Response bodies are cut to this many characters before being recorded.
const MAX_RECORDED_BODY_CHARS: usize = 4096;

/// How an attempt ended, for metrics and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Success,
    HttpError,
    TransportError,
}

impl DispatchOutcome {
    pub fn of(attempt: &DispatchAttempt) -> Self {
        match (&attempt.response, attempt.status) {
            (ResponseRecord::Transport(_), _) => Self::TransportError,
            (ResponseRecord::Http(_), AttemptStatus::Success) => Self::Success,
            (ResponseRecord::Http(_), AttemptStatus::Error) => Self::HttpError,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::HttpError => "http_error",
            Self::TransportError => "transport_error",
        }
    }
}

pub struct Dispatcher {
    client: Client,
    timeout: Duration,
}

impl Dispatcher {
    /// Build a dispatcher with TLS verification on and redirects followed.
    pub fn new(timeout: Duration) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|err| InfraError::http_client(error_chain(&err)))?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn dispatch(
        &self,
        path: &RevalidationPath,
        endpoint: &EndpointConfig,
    ) -> DispatchAttempt {
        let started_at = Instant::now();
        let timestamp = OffsetDateTime::now_utc();
        let request = self.request_record(path, endpoint);

        let response = match build_endpoint_url(&endpoint.endpoint_url, &endpoint.auth_token, path)
        {
            Ok(url) => match self.client.get(url).send().await {
                Ok(response) => match read_response(response).await {
                    Ok(record) => ResponseRecord::Http(record),
                    Err(err) => ResponseRecord::Transport(transport_failure(err)),
                },
                Err(err) => ResponseRecord::Transport(transport_failure(err)),
            },
            Err(message) => ResponseRecord::Transport(TransportFailure::new("invalid_url", message)),
        };

        let (status, status_code) = match &response {
            ResponseRecord::Http(record) if (200..300).contains(&record.code) => {
                (AttemptStatus::Success, Some(record.code))
            }
            ResponseRecord::Http(record) => (AttemptStatus::Error, Some(record.code)),
            ResponseRecord::Transport(_) => (AttemptStatus::Error, None),
        };

        let attempt = DispatchAttempt {
            timestamp,
            path: path.to_string(),
            status,
            status_code,
            request,
            response,
        };

        let outcome = DispatchOutcome::of(&attempt);
        let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;
        counter!(METRIC_DISPATCH_TOTAL, "outcome" => outcome.as_str()).increment(1);
        histogram!(METRIC_DISPATCH_MS, "outcome" => outcome.as_str()).record(elapsed_ms);

        match attempt.transport_failure() {
            None if attempt.is_success() => info!(
                path = %path,
                status_code,
                elapsed_ms,
                "Revalidation dispatched"
            ),
            None => warn!(
                path = %path,
                status_code,
                elapsed_ms,
                "Revalidation endpoint returned an error status"
            ),
            Some(failure) => warn!(
                path = %path,
                code = failure.code.as_str(),
                message = failure.message.as_str(),
                elapsed_ms,
                "Revalidation request failed"
            ),
        }

        attempt
    }

    fn request_record(&self, path: &RevalidationPath, endpoint: &EndpointConfig) -> RequestRecord {
        let url = build_endpoint_url(&endpoint.endpoint_url, REDACTED, path)
            .map(String::from)
            .unwrap_or_else(|_| endpoint.endpoint_url.trim().to_string());
        RequestRecord {
            url,
            method: "GET".to_string(),
            headers: BTreeMap::from([("User-Agent".to_string(), USER_AGENT.to_string())]),
            timeout: self.timeout.as_secs(),
        }
    }
}

/// Append `token` and `path` to the endpoint, keeping its other query
/// parameters.
pub fn build_endpoint_url(
    endpoint_url: &str,
    token: &str,
    path: &RevalidationPath,
) -> Result<Url, String> {
    let mut url = Url::parse(endpoint_url.trim())
        .map_err(|err| format!("invalid endpoint url: {err}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported endpoint scheme `{}`", url.scheme()));
    }

    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != TOKEN_PARAM && key != PATH_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.set_query(None);
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &retained {
            pairs.append_pair(key, value);
        }
        pairs
            .append_pair(TOKEN_PARAM, token)
            .append_pair(PATH_PARAM, path.as_str());
    }
    Ok(url)
}

async fn read_response(response: Response) -> Result<HttpResponseRecord, reqwest::Error> {
    let status = response.status();
    let headers = header_record(response.headers());
    let body = response.text().await?;
    Ok(HttpResponseRecord {
        code: status.as_u16(),
        message: status.canonical_reason().unwrap_or_default().to_string(),
        body: truncate_chars(body, MAX_RECORDED_BODY_CHARS),
        headers,
    })
}

fn header_record(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut record: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        record
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    record
}

fn transport_failure(err: reqwest::Error) -> TransportFailure {
    // The request URL carries the token; keep it out of the recorded message.
    let err = err.without_url();
    TransportFailure::new(transport_code(&err), error_chain(&err))
}

fn transport_code(err: &reqwest::Error) -> &'static str {
    if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connect"
    } else if err.is_redirect() {
        "redirect"
    } else if err.is_body() {
        "body"
    } else if err.is_decode() {
        "decode"
    } else if err.is_builder() {
        "builder"
    } else if err.is_request() {
        "request"
    } else {
        "unknown"
    }
}

fn truncate_chars(text: String, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text,
    }
}
