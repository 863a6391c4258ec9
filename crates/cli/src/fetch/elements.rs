//! Feed adapter: per-publication grant lookup against the Elements API.

use grantsync_recon::{FeedLookup, FeedResponse, SyncError};
use log::debug;

use super::common::{excerpt, FetchClient};

pub struct ElementsClient {
    client: FetchClient,
    base_url: String,
    user: String,
    password: String,
}

impl ElementsClient {
    pub fn new(base_url: &str, user: String, password: String) -> Result<Self, SyncError> {
        Ok(Self {
            client: FetchClient::new("Elements", extract_elements_error)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            user,
            password,
        })
    }

    fn grants_url(&self, pub_id: &str) -> String {
        format!("{}/publications/{}/grants", self.base_url, pub_id)
    }
}

impl FeedLookup for ElementsClient {
    /// Any HTTP status is passed through as a [`FeedResponse`] except
    /// 401/403: bad credentials would otherwise look like "no data" for
    /// every item.
    fn lookup(&self, pub_id: &str) -> Result<FeedResponse, SyncError> {
        let url = self.grants_url(pub_id);
        let resp = self.client.send(
            self.client
                .http
                .get(&url)
                .basic_auth(&self.user, Some(&self.password))
                .header("Accept", "application/xml"),
        )?;

        if resp.status == 401 || resp.status == 403 {
            return Err(self.client.upstream(self.client.describe_failure(&resp)));
        }
        if resp.status != 200 {
            debug!("GET {url} -> {}", resp.status);
        }

        Ok(FeedResponse {
            status: resp.status,
            body: resp.body,
        })
    }
}

/// Elements error documents carry the reason in `<api:error>`.
fn extract_elements_error(body: &str, status: u16) -> String {
    body.split_once("<api:error")
        .and_then(|(_, rest)| rest.split_once('>'))
        .and_then(|(_, rest)| rest.split_once("</api:error>"))
        .map(|(msg, _)| msg.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            let text = excerpt(body.trim());
            if text.is_empty() {
                format!("HTTP {status}")
            } else {
                text.to_string()
            }
        })
}

// ── Tests ───────────────────────────────────────────────────────────
