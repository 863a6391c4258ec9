//! Seams to the external systems the engine drives.
//!
//! All three calls block; the engine issues them strictly one at a time.

use crate::error::SyncError;
use crate::model::{FeedResponse, FundingUpdate, ItemPage, PageCursor};

/// Repository listing query: qualifying items of one unit, oldest first.
pub trait ItemSource {
    fn list_items(&self, unit: &str, cursor: Option<&PageCursor>) -> Result<ItemPage, SyncError>;
}

/// Feed grant lookup by the feed's publication id.
///
/// A non-200 answer is returned as a [`FeedResponse`], not an error;
/// `Err` is reserved for transport failures.
pub trait FeedLookup {
    fn lookup(&self, pub_id: &str) -> Result<FeedResponse, SyncError>;
}

/// Repository ingest: persist a new funding record for one item.
pub trait UpdateApplier {
    fn apply(&self, update: &FundingUpdate) -> Result<(), SyncError>;
}

/// The collaborators for one run.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub items: &'a dyn ItemSource,
    pub feed: &'a dyn FeedLookup,
    pub updater: &'a dyn UpdateApplier,
}
