// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{CategoryConfig, ConfigFile, RawCategory, RawConfigFile};
use crate::errors::{Result, RosterError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = RosterError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_categories(&raw)?;
        validate_scheduler(&raw)?;
        validate_unique_names(&raw)?;

        let categories = raw
            .categories
            .iter()
            .map(validate_category)
            .collect::<Result<Vec<_>>>()?;

        Ok(ConfigFile::new_unchecked(raw, categories))
    }
}

fn ensure_has_categories(cfg: &RawConfigFile) -> Result<()> {
    if cfg.categories.is_empty() {
        return Err(RosterError::ConfigError(
            "config must contain at least one [[category]] section".to_string(),
        ));
    }
    Ok(())
}

/// Upper bound for every scheduler timing, in seconds.
const MAX_TIMING_SECS: u64 = 24 * 60 * 60;

fn validate_scheduler(cfg: &RawConfigFile) -> Result<()> {
    let s = &cfg.scheduler;
    check_timing("attempt_timeout_secs", s.attempt_timeout_secs, 1, MAX_TIMING_SECS)?;
    check_timing("pending_duration_secs", s.pending_duration_secs, 0, MAX_TIMING_SECS)?;
    check_timing("retry_interval_secs", s.retry_interval_secs, 1, MAX_TIMING_SECS)?;
    check_timing("poll_interval_ms", s.poll_interval_ms, 1, MAX_TIMING_SECS * 1000)?;
    Ok(())
}

fn check_timing(field: &str, value: u64, min: u64, max: u64) -> Result<()> {
    if value < min {
        return Err(RosterError::ConfigError(format!(
            "[scheduler].{field} must be >= {min} (got {value})"
        )));
    }
    if value > max {
        return Err(RosterError::ConfigError(format!(
            "[scheduler].{field} must be <= {max} (got {value})"
        )));
    }
    Ok(())
}

fn validate_unique_names(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for category in cfg.categories.iter() {
        if category.name.trim().is_empty() {
            return Err(RosterError::ConfigError(
                "category name must not be empty".to_string(),
            ));
        }
        if !seen.insert(category.name.as_str()) {
            return Err(RosterError::ConfigError(format!(
                "duplicate category name '{}'",
                category.name
            )));
        }
    }
    Ok(())
}

fn validate_category(raw: &RawCategory) -> Result<CategoryConfig> {
    if raw.groups.is_empty() {
        return Err(RosterError::ConfigError(format!(
            "category '{}' must list at least one group",
            raw.name
        )));
    }

    let color = parse_color(&raw.color).ok_or_else(|| {
        RosterError::ConfigError(format!(
            "category '{}' has invalid color '{}' (expected #RRGGBB)",
            raw.name, raw.color
        ))
    })?;

    Ok(CategoryConfig {
        name: raw.name.clone(),
        channel_id: raw.channel_id,
        message_id: raw.message_id,
        title: raw.title.clone(),
        color,
        show_group_id: raw.show_group_id,
        groups: raw.groups.clone(),
    })
}

/// Parse `#RRGGBB` (leading `#` optional) into `0xRRGGBB`.
pub fn parse_color(s: &str) -> Option<u32> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}
