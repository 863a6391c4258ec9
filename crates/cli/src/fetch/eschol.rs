//! Repository adapter: eScholarship GraphQL API.
//!
//! One client serves both the item listing (read) and the funding update
//! mutation (write). Both need the privileged API key.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use grantsync_recon::model::{ItemPage, LocalId, PageCursor};
use grantsync_recon::{FundingUpdate, ItemSource, RepositoryItem, SyncError, UpdateApplier};

use super::common::FetchClient;

// ── Queries ─────────────────────────────────────────────────────────

const ITEMS_QUERY: &str = "\
query UnitItems($unitID: String!, $first: Int!, $more: String, $tags: [String!]) {
  unit(id: $unitID) {
    items(first: $first, more: $more, include: [PUBLISHED, EMBARGOED], tags: $tags, order: ADDED_ASC) {
      total
      more
      nodes { id title added grants localIDs { id scheme } }
    }
  }
}";

const UPDATE_FUNDING_MUTATION: &str = "\
mutation UpdateFunding($input: UpdateFundingInput!) {
  updateFunding(input: $input) { message }
}";

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

fn joined_errors(errors: &[GraphqlError]) -> String {
    errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>().join("; ")
}

#[derive(Debug, Deserialize)]
struct UnitData {
    unit: Option<UnitNode>,
}

#[derive(Debug, Deserialize)]
struct UnitNode {
    items: ItemList,
}

#[derive(Debug, Deserialize)]
struct ItemList {
    total: usize,
    more: Option<String>,
    #[serde(default)]
    nodes: Vec<ItemNode>,
}

#[derive(Debug, Deserialize)]
struct ItemNode {
    id: String,
    title: Option<String>,
    added: String,
    grants: Option<Vec<String>>,
    #[serde(rename = "localIDs")]
    local_ids: Option<Vec<LocalIdNode>>,
}

#[derive(Debug, Deserialize)]
struct LocalIdNode {
    id: String,
    scheme: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateFundingInput<'a> {
    id: &'a str,
    funding_info: Vec<FundingInfo<'a>>,
    comment: &'a str,
    submitter_email: &'a str,
}

#[derive(Debug, Serialize)]
struct FundingInfo<'a> {
    name: &'a str,
    reference: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateFundingData {
    update_funding: Option<serde_json::Value>,
}

// ── Client ──────────────────────────────────────────────────────────

pub struct EscholClient {
    client: FetchClient,
    api_url: String,
    api_key: String,
    page_size: u32,
    source_tag: String,
}

impl EscholClient {
    pub fn new(
        api_url: &str,
        api_key: String,
        page_size: u32,
        source_tag: String,
    ) -> Result<Self, SyncError> {
        Ok(Self {
            client: FetchClient::new("eScholarship", extract_graphql_error)?,
            api_url: api_url.to_string(),
            api_key,
            page_size,
            source_tag,
        })
    }

    fn post(&self, body: &serde_json::Value) -> reqwest::blocking::RequestBuilder {
        self.client
            .http
            .post(&self.api_url)
            .header("Privileged", &self.api_key)
            .json(body)
    }
}

/// GraphQL request body for one listing page.
fn items_request(unit: &str, first: u32, cursor: Option<&PageCursor>, tag: &str) -> serde_json::Value {
    json!({
        "query": ITEMS_QUERY,
        "variables": {
            "unitID": unit,
            "first": first,
            "more": cursor.map(PageCursor::as_str),
            "tags": [tag],
        }
    })
}

/// GraphQL request body for a funding update.
fn update_request(update: &FundingUpdate) -> serde_json::Value {
    let input = UpdateFundingInput {
        id: &update.item_id,
        funding_info: update
            .grants
            .iter()
            .map(|g| FundingInfo { name: &g.name, reference: g.reference.as_deref() })
            .collect(),
        comment: &update.comment,
        submitter_email: &update.contact,
    };
    json!({
        "query": UPDATE_FUNDING_MUTATION,
        "variables": { "input": input },
    })
}

fn parse_added(item_id: &str, raw: &str) -> Result<NaiveDate, SyncError> {
    // Accept a bare date or a full timestamp.
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| SyncError::MissingField {
        field: "added".into(),
        context: format!("item '{item_id}' (unparseable value '{raw}')"),
    })
}

fn to_repository_item(node: ItemNode) -> Result<RepositoryItem, SyncError> {
    let added = parse_added(&node.id, &node.added)?;
    Ok(RepositoryItem {
        added,
        title: node.title.unwrap_or_default(),
        grants: node.grants.unwrap_or_default(),
        local_ids: node
            .local_ids
            .unwrap_or_default()
            .into_iter()
            .map(|l| LocalId { scheme: l.scheme, id: l.id })
            .collect(),
        id: node.id,
    })
}

impl ItemSource for EscholClient {
    fn list_items(&self, unit: &str, cursor: Option<&PageCursor>) -> Result<ItemPage, SyncError> {
        let body = items_request(unit, self.page_size, cursor, &self.source_tag);
        let value = self.client.send_json(self.post(&body))?;

        let resp: GraphqlResponse<UnitData> = serde_json::from_value(value)
            .map_err(|e| self.client.upstream(format!("unexpected listing response: {e}")))?;
        if !resp.errors.is_empty() {
            return Err(self.client.upstream(format!(
                "listing unit '{unit}': {}",
                joined_errors(&resp.errors)
            )));
        }

        let list = resp
            .data
            .and_then(|d| d.unit)
            .ok_or_else(|| self.client.upstream(format!("unit '{unit}' not found")))?
            .items;

        let items = list
            .nodes
            .into_iter()
            .map(to_repository_item)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ItemPage {
            total: list.total,
            next: list.more.filter(|m| !m.is_empty()).map(PageCursor),
            items,
        })
    }
}

impl UpdateApplier for EscholClient {
    fn apply(&self, update: &FundingUpdate) -> Result<(), SyncError> {
        let failed = |message: String| SyncError::UpdateFailed {
            item_id: update.item_id.clone(),
            message,
        };

        let resp = self
            .client
            .send(self.post(&update_request(update)))
            .map_err(|e| failed(e.to_string()))?;
        if !resp.is_success() {
            return Err(failed(self.client.describe_failure(&resp)));
        }

        let parsed: GraphqlResponse<UpdateFundingData> = serde_json::from_str(&resp.body)
            .map_err(|e| failed(format!("unexpected mutation response: {e}")))?;
        if !parsed.errors.is_empty() {
            return Err(failed(joined_errors(&parsed.errors)));
        }
        match parsed.data.and_then(|d| d.update_funding) {
            Some(_) => Ok(()),
            None => Err(failed("mutation returned no result".into())),
        }
    }
}

fn extract_graphql_error(body: &str, status: u16) -> String {
    serde_json::from_str::<GraphqlResponse<serde_json::Value>>(body)
        .ok()
        .filter(|r| !r.errors.is_empty())
        .map(|r| joined_errors(&r.errors))
        .unwrap_or_else(|| format!("HTTP {status}"))
}

// ── Tests ───────────────────────────────────────────────────────────
