//! `grantsync-recon`: funding-grant reconciliation engine.
//!
//! Pulls the grant list for each feed-originated repository item from the
//! feed, compares it with the repository's, and reports (and optionally
//! applies) the feed's version. No HTTP or CLI dependencies: the listing,
//! lookup and update services come in through [`ports`].

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod feed;
pub mod grants;
pub mod guard;
pub mod model;
pub mod normalize;
pub mod ports;
pub mod report;
pub mod scanner;

pub use classify::{classify, ScanOutcome};
pub use config::{RunMode, SyncConfig, SyncContext};
pub use engine::run;
pub use error::SyncError;
pub use grants::{canonicalize, GrantSet, GrantSource};
pub use model::{FeedRecord, FeedResponse, FundingUpdate, Grant, ItemPage, PageCursor, RepositoryItem, RunSummary};
pub use ports::{Collaborators, FeedLookup, ItemSource, UpdateApplier};
pub use report::ResultLog;
