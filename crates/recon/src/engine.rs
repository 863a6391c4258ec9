use std::collections::HashSet;
use std::io::Write;

use chrono::NaiveDate;
use log::{info, warn};

use crate::config::SyncContext;
use crate::error::SyncError;
use crate::model::{ActionKind, PageCursor, RunSummary, UnitSummary};
use crate::ports::Collaborators;
use crate::report::ResultLog;
use crate::scanner::{scan_item, ItemDisposition};

/// Run the sync over every configured unit, in order. Stops at the first
/// error; rows already in `log` stay there.
pub fn run<W: Write>(
    ctx: &SyncContext,
    collab: &Collaborators<'_>,
    log: &mut ResultLog<W>,
) -> Result<RunSummary, SyncError> {
    let started_at = chrono::Utc::now().to_rfc3339();
    info!("starting {} run over {} unit(s)", ctx.mode, ctx.units.len());

    let mut units = Vec::with_capacity(ctx.units.len());
    for unit in &ctx.units {
        units.push(drain_unit(ctx, collab, log, unit)?);
    }

    Ok(RunSummary {
        mode: ctx.mode.to_string(),
        started_at,
        units,
    })
}

/// Page through one unit until the listing returns no continuation cursor.
fn drain_unit<W: Write>(
    ctx: &SyncContext,
    collab: &Collaborators<'_>,
    log: &mut ResultLog<W>,
    unit: &str,
) -> Result<UnitSummary, SyncError> {
    let mut summary = UnitSummary::new(unit);
    let mut cursor: Option<PageCursor> = None;
    let mut seen_cursors: HashSet<PageCursor> = HashSet::new();
    let mut last_added: Option<NaiveDate> = None;
    let mut page_no = 0u32;

    loop {
        page_no += 1;
        let page = collab
            .items
            .list_items(unit, cursor.as_ref())
            .map_err(|e| e.for_page(unit, page_no))?;
        if page_no == 1 {
            info!("{unit}: {} qualifying item(s)", page.total);
        }
        summary.total = page.total;

        // Guard: a continuation cursor with no items would loop forever
        if page.next.is_some() && page.items.is_empty() {
            return Err(SyncError::Pagination(format!(
                "unit '{unit}': page {page_no} is empty but has a continuation cursor"
            )));
        }

        for item in &page.items {
            if last_added.is_some_and(|prev| item.added < prev) {
                warn!(
                    "{unit}: item {} added {} is out of order (previous {})",
                    item.id,
                    item.added,
                    last_added.map(|d| d.to_string()).unwrap_or_default(),
                );
            }
            last_added = Some(item.added);

            let disposition = scan_item(ctx, collab, log, unit, item)
                .map_err(|e| e.for_item(unit, &item.id, item.feed_pub_id()))?;
            tally(&mut summary, disposition);

            if summary.scanned % ctx.progress_every == 0 {
                info!("{unit}: {}/{}", summary.scanned, summary.total);
            }
        }

        match page.next {
            None => break,
            Some(next) => {
                // Any cursor coming back means the listing is cycling.
                if !seen_cursors.insert(next.clone()) {
                    return Err(SyncError::Pagination(format!(
                        "unit '{unit}': cursor {} repeated after page {page_no}",
                        next.as_str()
                    )));
                }
                cursor = Some(next);
            }
        }
    }

    info!(
        "{unit}: done {}/{} ({} reported, {} applied)",
        summary.scanned,
        summary.total,
        summary.reported(),
        summary.applied,
    );
    Ok(summary)
}

fn tally(summary: &mut UnitSummary, disposition: ItemDisposition) {
    summary.scanned += 1;
    let action = match disposition {
        ItemDisposition::NoFeedData => {
            summary.no_data += 1;
            return;
        }
        ItemDisposition::Drifted => {
            summary.drifted += 1;
            return;
        }
        ItemDisposition::Unchanged => {
            summary.unchanged += 1;
            return;
        }
        ItemDisposition::Reported(action) => action,
        ItemDisposition::Applied(action) => {
            summary.applied += 1;
            action
        }
    };
    match action {
        ActionKind::Added => summary.added += 1,
        ActionKind::Removed => summary.removed += 1,
        ActionKind::Changed => summary.changed += 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_counts_dispositions() {
        let mut s = UnitSummary::new("u");
        tally(&mut s, ItemDisposition::NoFeedData);
        tally(&mut s, ItemDisposition::Drifted);
        tally(&mut s, ItemDisposition::Unchanged);
        tally(&mut s, ItemDisposition::Reported(ActionKind::Added));
        tally(&mut s, ItemDisposition::Applied(ActionKind::Changed));
        tally(&mut s, ItemDisposition::Applied(ActionKind::Removed));

        assert_eq!(s.scanned, 6);
        assert_eq!((s.no_data, s.drifted, s.unchanged), (1, 1, 1));
        assert_eq!((s.added, s.removed, s.changed), (1, 1, 1));
        assert_eq!(s.applied, 2);
        assert_eq!(s.reported(), 3);
    }
}
