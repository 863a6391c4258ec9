//! Shared HTTP plumbing for the feed and repository adapters.
//!
//! - `FetchClient`: blocking client plus status classification
//! - `resolve_credential`: flag > env > error
//!
//! No retry loop: a failed call surfaces immediately and the operator
//! re-runs. Timeouts are the transport's.

use std::time::Duration;

use grantsync_recon::SyncError;

// ── Constants ───────────────────────────────────────────────────────

pub(crate) const USER_AGENT: &str = concat!("grantsync/", env!("CARGO_PKG_VERSION"));
pub(crate) const TIMEOUT_SECS: u64 = 60;

/// Longest body excerpt quoted in an error message.
const BODY_EXCERPT: usize = 200;

// ── FetchClient ─────────────────────────────────────────────────────

/// Raw HTTP answer: status plus body text.
#[derive(Debug)]
pub(crate) struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One blocking HTTP client per upstream service.
///
/// Adapters own their base URL and auth; they hand a configured
/// `RequestBuilder` to [`FetchClient::send`].
pub(crate) struct FetchClient {
    pub(crate) http: reqwest::blocking::Client,
    service: String,
    error_extractor: fn(&str, u16) -> String,
}

impl FetchClient {
    pub fn new(service: &str, error_extractor: fn(&str, u16) -> String) -> Result<Self, SyncError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SyncError::Upstream {
                service: service.to_string(),
                message: format!("cannot build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            service: service.to_string(),
            error_extractor,
        })
    }

    /// Send once. Any HTTP status is returned; only transport failures
    /// (connect, timeout, unreadable body) are errors.
    pub fn send(&self, req: reqwest::blocking::RequestBuilder) -> Result<RawResponse, SyncError> {
        let resp = req.send().map_err(|e| self.upstream(format!("request failed: {e}")))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|e| self.upstream(format!("failed to read response body: {e}")))?;
        Ok(RawResponse {
            status,
            body: body.trim_start_matches('\u{feff}').to_string(),
        })
    }

    /// Human-readable reason for a non-success response.
    pub fn describe_failure(&self, resp: &RawResponse) -> String {
        let detail = (self.error_extractor)(&resp.body, resp.status);
        match resp.status {
            401 | 403 => format!("auth failed ({}): {detail}", resp.status),
            400 => format!("request rejected ({}): {detail}", resp.status),
            _ => format!("HTTP {}: {detail}", resp.status),
        }
    }

    /// Send and require a 2xx answer parsed as JSON.
    pub fn send_json(&self, req: reqwest::blocking::RequestBuilder) -> Result<serde_json::Value, SyncError> {
        let resp = self.send(req)?;
        if !resp.is_success() {
            return Err(self.upstream(self.describe_failure(&resp)));
        }
        serde_json::from_str(&resp.body).map_err(|e| {
            self.upstream(format!(
                "failed to parse JSON response: {e} (body: {})",
                excerpt(&resp.body),
            ))
        })
    }

    pub fn upstream(&self, message: String) -> SyncError {
        SyncError::Upstream {
            service: self.service.clone(),
            message,
        }
    }
}

pub(crate) fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(BODY_EXCERPT) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

// ── Credentials ─────────────────────────────────────────────────────

/// Resolve a credential: flag value > environment variable > error.
/// The error is a configuration error, raised before any item is touched.
pub(crate) fn resolve_credential(
    flag: Option<String>,
    what: &str,
    flag_name: &str,
    env_var: &str,
) -> Result<String, SyncError> {
    let missing = || {
        SyncError::ConfigValidation(format!("missing {what} (use {flag_name} or set {env_var})"))
    };

    if let Some(value) = flag {
        let trimmed = value.trim().to_string();
        if trimmed.is_empty() {
            return Err(missing());
        }
        return Ok(trimmed);
    }

    match std::env::var(env_var) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(missing()),
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn plain_extractor(body: &str, status: u16) -> String {
        if body.is_empty() {
            format!("HTTP {status}")
        } else {
            excerpt(body).to_string()
        }
    }

    #[test]
    fn test_resolve_credential_flag_priority() {
        let v = resolve_credential(Some("  s3cret  ".into()), "feed password", "--feed-password", "X").unwrap();
        assert_eq!(v, "s3cret");
    }

    #[test]
    fn test_resolve_credential_empty_flag() {
        let err = resolve_credential(Some("  ".into()), "feed password", "--feed-password", "X").unwrap_err();
        assert!(matches!(err, SyncError::ConfigValidation(_)));
        assert!(err.to_string().contains("missing feed password"), "{err}");
    }

    #[test]
    fn test_resolve_credential_missing() {
        std::env::remove_var("__GRANTSYNC_TEST_MISSING");
        let err = resolve_credential(None, "repository key", "--repo-key", "__GRANTSYNC_TEST_MISSING").unwrap_err();
        assert!(err.to_string().contains("__GRANTSYNC_TEST_MISSING"), "{err}");
    }

    #[test]
    fn test_resolve_credential_env() {
        std::env::set_var("__GRANTSYNC_TEST_PRESENT", " from-env ");
        let v = resolve_credential(None, "feed user", "--feed-user", "__GRANTSYNC_TEST_PRESENT").unwrap();
        assert_eq!(v, "from-env");
        std::env::remove_var("__GRANTSYNC_TEST_PRESENT");
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        let long = "é".repeat(300);
        assert_eq!(excerpt(&long).chars().count(), BODY_EXCERPT);
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn test_send_returns_any_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404).body("nope");
        });

        let client = FetchClient::new("Test", plain_extractor).unwrap();
        let resp = client.send(client.http.get(server.url("/missing"))).unwrap();
        assert_eq!(resp.status, 404);
        assert_eq!(resp.body, "nope");
        assert!(!resp.is_success());
    }

    #[test]
    fn test_send_json_auth_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/graphql");
            then.status(401).body("bad key");
        });

        let client = FetchClient::new("Test", plain_extractor).unwrap();
        let err = client.send_json(client.http.post(server.url("/graphql"))).unwrap_err();
        assert!(err.to_string().contains("auth failed (401): bad key"), "{err}");
    }

    #[test]
    fn test_send_json_bad_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/json");
            then.status(200).body("<html>oops</html>");
        });

        let client = FetchClient::new("Test", plain_extractor).unwrap();
        let err = client.send_json(client.http.get(server.url("/json"))).unwrap_err();
        assert!(err.to_string().contains("failed to parse JSON"), "{err}");
    }

    #[test]
    fn test_transport_failure_is_upstream() {
        // Grab a free port, then release it so nothing is listening.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = FetchClient::new("Test", plain_extractor).unwrap();
        let err = client
            .send(client.http.get(format!("http://127.0.0.1:{port}/")))
            .unwrap_err();
        assert!(matches!(err, SyncError::Upstream { .. }), "{err:?}");
    }
}
