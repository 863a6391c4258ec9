//! Per-item workflow: fetch, guard, classify, report, apply.

use std::io::Write;

use log::{debug, info, warn};

use crate::classify::classify;
use crate::config::{RunMode, SyncContext};
use crate::error::SyncError;
use crate::feed::parse_feed_record;
use crate::grants::GrantSource;
use crate::guard::{check_title_drift, TitleDrift};
use crate::model::{ActionKind, FundingUpdate, RepositoryItem, ReportRow, FEED_PUB_ID_SCHEME};
use crate::ports::Collaborators;
use crate::report::ResultLog;

/// How one item left the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemDisposition {
    /// Feed answered non-200; nothing to reconcile.
    NoFeedData,
    /// Title drift guard tripped; item skipped.
    Drifted,
    Unchanged,
    /// Difference reported, not applied (dry run).
    Reported(ActionKind),
    /// Difference reported and applied.
    Applied(ActionKind),
}

/// Scan one item. Errors are returned bare; the caller annotates them with
/// the item's identifiers.
pub fn scan_item<W: Write>(
    ctx: &SyncContext,
    collab: &Collaborators<'_>,
    log: &mut ResultLog<W>,
    unit: &str,
    item: &RepositoryItem,
) -> Result<ItemDisposition, SyncError> {
    let pub_id = item.feed_pub_id().ok_or_else(|| SyncError::MissingLocalId {
        scheme: FEED_PUB_ID_SCHEME.into(),
    })?;

    // Fetch
    let response = collab.feed.lookup(pub_id)?;
    if !response.has_data() {
        debug!("{}: feed has no data for pub {pub_id} (HTTP {})", item.id, response.status);
        return Ok(ItemDisposition::NoFeedData);
    }
    let record = parse_feed_record(&response.body)?;

    // Guard
    if ctx.drift_guard {
        match record.title.as_deref() {
            Some(feed_title) => {
                if let TitleDrift::Drifted { overlap, threshold } =
                    check_title_drift(feed_title, &item.title)
                {
                    warn!(
                        "{}: skipping, feed title for pub {pub_id} drifted (overlap {overlap} <= {threshold}): {:?} vs {:?}",
                        item.id, feed_title, item.title,
                    );
                    return Ok(ItemDisposition::Drifted);
                }
            }
            None => debug!("{}: feed record for pub {pub_id} has no title, guard not applied", item.id),
        }
    }

    // Classify
    let outcome = classify(&record.grant_set(), &item.grant_set());
    let Some(action) = outcome.action() else {
        return Ok(ItemDisposition::Unchanged);
    };

    // Report, always before any update so dry and live runs log the same rows.
    log.write_row(&ReportRow {
        unit: unit.to_string(),
        item: item.id.clone(),
        date_added: item.added.to_string(),
        pub_id: pub_id.to_string(),
        action: action.to_string(),
        funding: outcome.summary(),
    })?;

    match ctx.mode {
        RunMode::DryRun => Ok(ItemDisposition::Reported(action)),
        RunMode::Apply => {
            collab.updater.apply(&FundingUpdate {
                item_id: item.id.clone(),
                grants: record.grants,
                comment: ctx.change_comment.clone(),
                contact: ctx.contact_email.clone(),
            })?;
            info!("{}: funding {action} and applied", item.id);
            Ok(ItemDisposition::Applied(action))
        }
    }
}
