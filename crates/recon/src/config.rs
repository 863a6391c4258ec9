use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

pub const MAX_PAGE_SIZE: u32 = 500;

// ---------------------------------------------------------------------------
// Run mode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// Report only.
    DryRun,
    /// Report, then push each change to the repository.
    Apply,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DryRun => write!(f, "dry-run"),
            Self::Apply => write!(f, "apply"),
        }
    }
}

// ---------------------------------------------------------------------------
// File config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Repository units (collections), processed in this order.
    pub units: Vec<String>,
    #[serde(default)]
    pub mode: Option<RunMode>,
    /// Skip items whose feed title has drifted from the repository title.
    #[serde(default)]
    pub drift_guard: bool,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,
    /// Repository tag that marks feed-originated items.
    #[serde(default = "default_source_tag")]
    pub source_tag: String,
    #[serde(default = "default_change_comment")]
    pub change_comment: String,
    #[serde(default = "default_contact_email")]
    pub contact_email: String,
    pub feed: EndpointConfig,
    pub repository: EndpointConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub url: String,
}

fn default_page_size() -> u32 {
    100
}

fn default_progress_every() -> usize {
    100
}

fn default_source_tag() -> String {
    "source:oa_harvester".into()
}

fn default_change_comment() -> String {
    "Funding updated from Elements".into()
}

fn default_contact_email() -> String {
    "help@escholarship.org".into()
}

impl SyncConfig {
    pub fn from_toml(input: &str) -> Result<Self, SyncError> {
        let config: SyncConfig =
            toml::from_str(input).map_err(|e| SyncError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        if self.units.is_empty() {
            return Err(SyncError::ConfigValidation("at least one unit is required".into()));
        }

        let mut seen = HashSet::new();
        for unit in &self.units {
            if unit.trim().is_empty() {
                return Err(SyncError::ConfigValidation("unit ids must not be blank".into()));
            }
            if !seen.insert(unit.as_str()) {
                return Err(SyncError::ConfigValidation(format!("unit '{unit}' listed twice")));
            }
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(SyncError::ConfigValidation(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }

        if self.progress_every == 0 {
            return Err(SyncError::ConfigValidation("progress_every must be at least 1".into()));
        }

        for (name, endpoint) in [("feed", &self.feed), ("repository", &self.repository)] {
            if !(endpoint.url.starts_with("http://") || endpoint.url.starts_with("https://")) {
                return Err(SyncError::ConfigValidation(format!(
                    "{name}.url must be an http(s) URL, got '{}'",
                    endpoint.url
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Run context
// ---------------------------------------------------------------------------

/// Everything the engine needs for one run. Built from a validated config
/// once the run mode is known.
#[derive(Debug, Clone)]
pub struct SyncContext {
    pub mode: RunMode,
    pub units: Vec<String>,
    pub drift_guard: bool,
    pub progress_every: usize,
    pub change_comment: String,
    pub contact_email: String,
}

impl SyncContext {
    /// Fails with [`SyncError::NoRunMode`] when the config carries no mode.
    pub fn from_config(config: &SyncConfig) -> Result<Self, SyncError> {
        let mode = config.mode.ok_or(SyncError::NoRunMode)?;
        Ok(Self {
            mode,
            units: config.units.clone(),
            drift_guard: config.drift_guard,
            progress_every: config.progress_every,
            change_comment: config.change_comment.clone(),
            contact_email: config.contact_email.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
