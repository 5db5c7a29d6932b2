//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the content root and is sparse: stock defaults are the base layer and the
//! user file only overrides what it names.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! permalink_pattern = "/blog/:year/:month/:day/:slug"
//! # build_time = "2024-05-10T00:00:00Z"  # defaults to the current time
//! summary_length = 70                    # words in auto-generated summaries
//!
//! [publish]
//! drafts = false            # include `draft: true` posts
//! future = false            # include posts whose publishdate is after build_time
//! expired = false           # include posts whose expirydate has passed
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//!
//! [series]
//! azure-landing-zones = "auto"                            # members from front matter
//! bicep-basics = ["posts/bicep-1.md", "posts/bicep-2.md"] # explicit order
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! The loaded [`SiteConfig`] is an ordinary immutable value handed to
//! [`pipeline::build`](crate::pipeline::build). Nothing reads configuration
//! from global state.

use crate::normalize::{NormalizeSettings, parse_timestamp};
use crate::permalink::{PermalinkError, PermalinkPattern};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Invalid permalink_pattern: {0}")]
    Permalink(#[from] PermalinkError),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Pattern for each post's canonical path.
    pub permalink_pattern: String,
    /// Fixed build time; `None` means "now".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_time: Option<String>,
    /// Maximum words in an auto-generated summary.
    pub summary_length: usize,
    /// Which unpublished posts to include anyway.
    pub publish: PublishConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Series key → membership rule.
    pub series: BTreeMap<String, SeriesDefinition>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            permalink_pattern: "/blog/:year/:month/:day/:slug".to_string(),
            build_time: None,
            summary_length: 70,
            publish: PublishConfig::default(),
            processing: ProcessingConfig::default(),
            series: BTreeMap::new(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        PermalinkPattern::parse(&self.permalink_pattern)?;

        if let Some(raw) = &self.build_time
            && parse_timestamp(raw).is_none()
        {
            return Err(ConfigError::Validation(format!(
                "build_time `{raw}` is not a valid timestamp"
            )));
        }
        if self.summary_length == 0 {
            return Err(ConfigError::Validation(
                "summary_length must be greater than 0".into(),
            ));
        }

        let mut listed: HashMap<&str, &str> = HashMap::new();
        for (key, definition) in &self.series {
            if key.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "series keys must not be empty".into(),
                ));
            }
            let SeriesDefinition::Ordered(ids) = definition else {
                continue;
            };
            for id in ids {
                if let Some(previous) = listed.insert(id.as_str(), key.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "`{id}` is listed in series `{previous}` and `{key}`; a post can hold one series position"
                    )));
                }
            }
        }
        Ok(())
    }

    /// The parsed permalink pattern.
    pub fn permalink(&self) -> Result<PermalinkPattern, PermalinkError> {
        PermalinkPattern::parse(&self.permalink_pattern)
    }

    /// The configured build time, or `now` when none is set.
    pub fn resolve_build_time(&self, now: DateTime<Utc>) -> Result<DateTime<FixedOffset>, ConfigError> {
        match &self.build_time {
            None => Ok(now.fixed_offset()),
            Some(raw) => parse_timestamp(raw).ok_or_else(|| {
                ConfigError::Validation(format!("build_time `{raw}` is not a valid timestamp"))
            }),
        }
    }

    pub fn normalize_settings(&self) -> NormalizeSettings {
        NormalizeSettings {
            summary_length: self.summary_length,
        }
    }
}

/// Opt-ins for content that is normally held back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishConfig {
    /// Include posts marked `draft: true`.
    pub drafts: bool,
    /// Include posts whose publish date is after the build time.
    pub future: bool,
    /// Include posts whose expiry date has passed.
    pub expired: bool,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel parse workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// How a series picks and orders its members.
///
/// In TOML this is either the string `"auto"` or an array of document ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeriesDefinition {
    /// Members declare `series: <key>` in front matter; ordered by
    /// `series_order`, then publish date, then id.
    Auto(AutoKeyword),
    /// Exactly these documents, in this order.
    Ordered(Vec<String>),
}

impl SeriesDefinition {
    pub fn auto() -> Self {
        SeriesDefinition::Auto(AutoKeyword::Auto)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoKeyword {
    Auto,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// [`SiteConfig::default`] as a TOML table, the layer a site's sparse
/// `config.toml` is laid over.
///
/// Unset options such as `build_time` are absent from the table, so the
/// site file can add them without clashing with anything.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Lay a site's `overlay` over `base`.
///
/// A table in the site file only touches the keys it names: `[publish]`
/// with just `future = true` keeps the stock `drafts` and `expired`, and
/// `[series]` entries are added next to any already there. Anything that
/// is not a table, a series id list included, replaces the base value
/// outright.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut merged), toml::Value::Table(site)) => {
            for (key, value) in site {
                let value = match merged.remove(&key) {
                    Some(stock) => merge_toml(stock, value),
                    None => value,
                };
                merged.insert(key, value);
            }
            toml::Value::Table(merged)
        }
        (_, replacement) => replacement,
    }
}

/// The site's `config.toml` under `root`, parsed but not yet checked
/// against [`SiteConfig`]. A site without one gets `Ok(None)`.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let content = match fs::read_to_string(root.join("config.toml")) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(toml::from_str(&content)?))
}

/// Turn the merged layers into a checked [`SiteConfig`].
///
/// Keys the site file invents fail here through `deny_unknown_fields`,
/// before [`SiteConfig::validate`] looks at the values.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let config: SiteConfig = overlay.into_iter().fold(base, merge_toml).try_into()?;
    config.validate()?;
    Ok(config)
}

/// The configuration for the content tree at `root`: stock defaults with
/// whatever the site's `config.toml` sets laid on top.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(root)?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Blog Manifest Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file in the content root. Unknown keys will cause an error.

# Canonical path for each post. Tokens:
#   :year :month :day   publish date (in the offset it was written with)
#   :slug               front matter `slug`, or the slugified title
#   :filename           slugified file name without extension
#   :section            first directory under the content root
# Two posts resolving to the same path fail the build.
permalink_pattern = "/blog/:year/:month/:day/:slug"

# Reference time for deciding what is published. Defaults to now.
# Quote it: build_time = "2024-05-10T00:00:00Z"
# build_time = "2024-05-10T00:00:00Z"

# Maximum words in a summary derived from the first paragraph.
summary_length = 70

# ---------------------------------------------------------------------------
# Publication
# ---------------------------------------------------------------------------
[publish]
# Include posts marked `draft: true`.
drafts = false

# Include posts whose publishdate is after build_time.
future = false

# Include posts whose expirydate is at or before build_time.
expired = false

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel parse workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Series
# ---------------------------------------------------------------------------
# Each key defines one series. The value is either:
#   "auto"            posts with `series: <key>` in front matter, ordered by
#                     `series_order`, then publish date, then file path
#   ["a.md", "b.md"]  exactly these posts (paths relative to the content
#                     root), in this order
[series]
# azure-landing-zones = "auto"
# bicep-basics = ["posts/bicep-1.md", "posts/bicep-2.md"]
"##
}
