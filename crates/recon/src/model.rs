use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Local identifier scheme that carries the feed's publication id.
pub const FEED_PUB_ID_SCHEME: &str = "OA_PUB_ID";

// ---------------------------------------------------------------------------
// Repository side
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalId {
    pub scheme: String,
    pub id: String,
}

/// One repository item, as returned by the listing query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryItem {
    pub id: String,
    pub title: String,
    pub added: NaiveDate,
    /// Funder names as currently stored. The stored form has no reference codes.
    #[serde(default)]
    pub grants: Vec<String>,
    #[serde(default)]
    pub local_ids: Vec<LocalId>,
}

impl RepositoryItem {
    /// The feed's publication id, if the item carries one.
    pub fn feed_pub_id(&self) -> Option<&str> {
        self.local_ids
            .iter()
            .find(|l| l.scheme == FEED_PUB_ID_SCHEME)
            .map(|l| l.id.as_str())
    }
}

/// Opaque continuation token from the listing service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageCursor(pub String);

impl PageCursor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of qualifying items. `next == None` ends the unit.
#[derive(Debug, Clone)]
pub struct ItemPage {
    pub total: usize,
    pub next: Option<PageCursor>,
    pub items: Vec<RepositoryItem>,
}

// ---------------------------------------------------------------------------
// Feed side
// ---------------------------------------------------------------------------

/// A funder name plus optional award code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub name: String,
    pub reference: Option<String>,
}

impl Grant {
    pub fn new(name: impl Into<String>, reference: Option<&str>) -> Self {
        Self {
            name: name.into(),
            reference: reference.map(str::to_string),
        }
    }
}

/// Parsed feed document for one publication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedRecord {
    pub title: Option<String>,
    /// Grants in document order.
    pub grants: Vec<Grant>,
}

/// Raw answer from the feed lookup. Any status other than 200 means
/// the feed has nothing for this publication.
#[derive(Debug, Clone)]
pub struct FeedResponse {
    pub status: u16,
    pub body: String,
}

impl FeedResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self { status: 200, body: body.into() }
    }

    pub fn has_data(&self) -> bool {
        self.status == 200
    }
}

// ---------------------------------------------------------------------------
// Update + report
// ---------------------------------------------------------------------------

/// Payload handed to the update applier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FundingUpdate {
    pub item_id: String,
    pub grants: Vec<Grant>,
    pub comment: String,
    pub contact: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Added,
    Removed,
    Changed,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Removed => write!(f, "removed"),
            Self::Changed => write!(f, "changed"),
        }
    }
}

/// One line of the result log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub unit: String,
    pub item: String,
    #[serde(rename = "dateAdded")]
    pub date_added: String,
    #[serde(rename = "pub")]
    pub pub_id: String,
    pub action: String,
    pub funding: String,
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnitSummary {
    pub unit: String,
    pub total: usize,
    pub scanned: usize,
    pub no_data: usize,
    pub drifted: usize,
    pub unchanged: usize,
    pub added: usize,
    pub removed: usize,
    pub changed: usize,
    pub applied: usize,
}

impl UnitSummary {
    pub fn new(unit: &str) -> Self {
        Self { unit: unit.to_string(), ..Self::default() }
    }

    pub fn reported(&self) -> usize {
        self.added + self.removed + self.changed
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub mode: String,
    pub started_at: String,
    pub units: Vec<UnitSummary>,
}

impl RunSummary {
    pub fn scanned(&self) -> usize {
        self.units.iter().map(|u| u.scanned).sum()
    }

    pub fn reported(&self) -> usize {
        self.units.iter().map(|u| u.reported()).sum()
    }

    pub fn applied(&self) -> usize {
        self.units.iter().map(|u| u.applied).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_with(local_ids: Vec<LocalId>) -> RepositoryItem {
        RepositoryItem {
            id: "qt1".into(),
            title: "T".into(),
            added: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            grants: vec![],
            local_ids,
        }
    }

    #[test]
    fn feed_pub_id_picks_scheme() {
        let item = item_with(vec![
            LocalId { scheme: "DOI".into(), id: "10.1/x".into() },
            LocalId { scheme: "OA_PUB_ID".into(), id: "4242".into() },
        ]);
        assert_eq!(item.feed_pub_id(), Some("4242"));
    }

    #[test]
    fn feed_pub_id_missing() {
        let item = item_with(vec![LocalId { scheme: "DOI".into(), id: "10.1/x".into() }]);
        assert_eq!(item.feed_pub_id(), None);
    }

    #[test]
    fn feed_response_status() {
        assert!(FeedResponse::ok("<feed/>").has_data());
        assert!(!FeedResponse { status: 404, body: String::new() }.has_data());
    }

    #[test]
    fn run_summary_json_shape() {
        let mut unit = UnitSummary::new("lbnl_rw");
        unit.scanned = 3;
        unit.added = 1;
        unit.applied = 1;
        let summary = RunSummary {
            mode: "apply".into(),
            started_at: "2026-01-01T00:00:00+00:00".into(),
            units: vec![unit],
        };

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["mode"], "apply");
        assert_eq!(value["units"][0]["unit"], "lbnl_rw");
        assert_eq!(value["units"][0]["no_data"], 0);
        assert_eq!((summary.scanned(), summary.reported(), summary.applied()), (3, 1, 1));
    }
}
