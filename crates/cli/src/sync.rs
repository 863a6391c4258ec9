//! `grantsync run` / `grantsync validate`.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{ArgGroup, Args};
use log::info;

use grantsync_recon::model::RunSummary;
use grantsync_recon::{Collaborators, ResultLog, RunMode, SyncConfig, SyncContext, SyncError};

use crate::exit_codes::{sync_exit_code, EXIT_IO};
use crate::fetch::{resolve_credential, ElementsClient, EscholClient};
use crate::CliError;

#[derive(Args)]
#[command(group(ArgGroup::new("mode").args(["dry_run", "apply"])))]
pub struct RunArgs {
    /// Path to the TOML config file
    pub config: PathBuf,

    /// Report differences without touching the repository
    #[arg(long)]
    pub dry_run: bool,

    /// Report differences and push the feed's grants to the repository
    #[arg(long)]
    pub apply: bool,

    /// Unit to scan (repeatable; replaces the config's list)
    #[arg(long = "unit", value_name = "UNIT")]
    pub units: Vec<String>,

    /// Skip items whose feed title no longer resembles the repository title
    #[arg(long)]
    pub drift_guard: bool,

    /// Elements API user (default: ELEMENTS_API_USER env)
    #[arg(long)]
    pub feed_user: Option<String>,

    /// Elements API password (default: ELEMENTS_API_PASSWORD env)
    #[arg(long)]
    pub feed_password: Option<String>,

    /// eScholarship privileged API key (default: ESCHOL_PRIV_API_KEY env)
    #[arg(long)]
    pub repo_key: Option<String>,

    /// Append result rows to this file (default: stdout)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Print the run summary as JSON on stderr
    #[arg(long)]
    pub json: bool,

    /// Only log warnings and errors
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

fn sync_err(err: SyncError) -> CliError {
    let hint = match err.root() {
        SyncError::NoRunMode => Some("pass --dry-run or --apply, or set mode in the config"),
        SyncError::Upstream { message, .. } if message.starts_with("auth failed") => {
            Some("check the API credentials")
        }
        SyncError::Pagination(_) => Some("rows written so far are valid; re-run once the listing is stable"),
        _ => None,
    };
    CliError {
        code: sync_exit_code(&err),
        message: err.to_string(),
        hint: hint.map(String::from),
    }
}

fn load_config(path: &Path) -> Result<SyncConfig, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| CliError {
        code: EXIT_IO,
        message: format!("cannot read config {}: {e}", path.display()),
        hint: None,
    })?;
    SyncConfig::from_toml(&text).map_err(sync_err)
}

/// Fold command-line overrides into the file config and re-check it.
fn apply_overrides(config: &mut SyncConfig, args: &RunArgs) -> Result<(), SyncError> {
    if args.dry_run {
        config.mode = Some(RunMode::DryRun);
    } else if args.apply {
        config.mode = Some(RunMode::Apply);
    }
    if !args.units.is_empty() {
        config.units = args.units.clone();
    }
    config.drift_guard |= args.drift_guard;
    config.validate()
}

/// Open the result log. A file is appended to, with the header written
/// only when it is empty, so a re-run extends the same audit trail.
fn open_result_log(out: Option<&Path>) -> Result<ResultLog<Box<dyn Write>>, CliError> {
    let io_err = |what: String| CliError { code: EXIT_IO, message: what, hint: None };

    let Some(path) = out else {
        return ResultLog::new(Box::new(io::stdout()) as Box<dyn Write>).map_err(sync_err);
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| io_err(format!("cannot open {}: {e}", path.display())))?;
    let empty = file
        .metadata()
        .map_err(|e| io_err(format!("cannot stat {}: {e}", path.display())))?
        .len()
        == 0;

    let writer: Box<dyn Write> = Box::new(file);
    if empty {
        ResultLog::new(writer).map_err(sync_err)
    } else {
        Ok(ResultLog::continuing(writer))
    }
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    crate::logging::init(args.quiet);

    let mut config = load_config(&args.config)?;
    apply_overrides(&mut config, &args).map_err(sync_err)?;
    let ctx = SyncContext::from_config(&config).map_err(sync_err)?;

    let feed_user = resolve_credential(
        args.feed_user.clone(),
        "Elements API user",
        "--feed-user",
        "ELEMENTS_API_USER",
    )
    .map_err(sync_err)?;
    let feed_password = resolve_credential(
        args.feed_password.clone(),
        "Elements API password",
        "--feed-password",
        "ELEMENTS_API_PASSWORD",
    )
    .map_err(sync_err)?;
    let repo_key = resolve_credential(
        args.repo_key.clone(),
        "eScholarship API key",
        "--repo-key",
        "ESCHOL_PRIV_API_KEY",
    )
    .map_err(sync_err)?;

    let feed = ElementsClient::new(&config.feed.url, feed_user, feed_password).map_err(sync_err)?;
    let repo = EscholClient::new(
        &config.repository.url,
        repo_key,
        config.page_size,
        config.source_tag.clone(),
    )
    .map_err(sync_err)?;
    let collab = Collaborators { items: &repo, feed: &feed, updater: &repo };

    let mut log = open_result_log(args.out.as_deref())?;
    let summary = grantsync_recon::run(&ctx, &collab, &mut log).map_err(sync_err)?;
    let rows = log.rows_written();
    log.into_inner().map_err(sync_err)?;

    if let Some(path) = &args.out {
        info!("wrote {rows} row(s) to {}", path.display());
    }
    print_summary(&summary, args.json)
}

fn print_summary(summary: &RunSummary, json: bool) -> Result<(), CliError> {
    if json {
        let text = serde_json::to_string_pretty(summary).map_err(|e| CliError {
            code: EXIT_IO,
            message: format!("JSON serialization error: {e}"),
            hint: None,
        })?;
        eprintln!("{text}");
        return Ok(());
    }

    for u in &summary.units {
        eprintln!(
            "{}: {} scanned, {} no data, {} drifted, {} unchanged, {} added, {} removed, {} changed, {} applied",
            u.unit, u.scanned, u.no_data, u.drifted, u.unchanged, u.added, u.removed, u.changed, u.applied,
        );
    }
    eprintln!(
        "{} run: {} scanned, {} reported, {} applied",
        summary.mode,
        summary.scanned(),
        summary.reported(),
        summary.applied(),
    );
    Ok(())
}

pub fn cmd_validate(path: &Path) -> Result<(), CliError> {
    let config = load_config(path)?;
    let mode = config
        .mode
        .map(|m| m.to_string())
        .unwrap_or_else(|| "unset (pass --dry-run or --apply)".into());
    eprintln!(
        "valid: {} unit(s) [{}], mode {mode}, drift guard {}",
        config.units.len(),
        config.units.join(", "),
        if config.drift_guard { "on" } else { "off" },
    );
    Ok(())
}
