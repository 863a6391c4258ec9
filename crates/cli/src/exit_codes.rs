//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; cron wrappers rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                                   |
//! |---------|-----------|-----------------------------------------------|
//! | 0       | Universal | Success                                       |
//! | 1       | Universal | General error (unspecified)                   |
//! | 2       | Universal | Usage / configuration error                   |
//! | 3       | Universal | I/O error (config file, result log)           |
//! | 60-69   | sync      | Reconciliation run aborted                    |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into [`sync_exit_code`]

use grantsync_recon::SyncError;

// =============================================================================
// Universal (0-3)
// =============================================================================

/// Success - run completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, invalid config, no run mode, missing credentials.
pub const EXIT_USAGE: u8 = 2;

/// I/O error - cannot read config or write the result log.
pub const EXIT_IO: u8 = 3;

// =============================================================================
// Sync (60-69)
// =============================================================================

/// Item data error: missing OA_PUB_ID, grant without funder name, bad feed XML.
pub const EXIT_SYNC_DATA: u8 = 60;

/// Listing or feed service unreachable, rejected auth, or answered garbage.
pub const EXIT_SYNC_UPSTREAM: u8 = 61;

/// Repository refused or failed to persist a funding update.
pub const EXIT_SYNC_UPDATE: u8 = 62;

/// Listing pagination went wrong (stuck cursor, empty non-terminal page).
pub const EXIT_SYNC_PAGINATION: u8 = 63;

/// Map an engine error to its exit code.
pub fn sync_exit_code(err: &SyncError) -> u8 {
    match err.root() {
        SyncError::ConfigParse(_) | SyncError::ConfigValidation(_) | SyncError::NoRunMode => {
            EXIT_USAGE
        }
        SyncError::MissingLocalId { .. }
        | SyncError::MissingField { .. }
        | SyncError::FeedParse(_) => EXIT_SYNC_DATA,
        SyncError::Upstream { .. } => EXIT_SYNC_UPSTREAM,
        SyncError::UpdateFailed { .. } => EXIT_SYNC_UPDATE,
        SyncError::Pagination(_) => EXIT_SYNC_PAGINATION,
        SyncError::Io(_) => EXIT_IO,
        SyncError::Item { .. } | SyncError::Listing { .. } => EXIT_ERROR,
    }
}
