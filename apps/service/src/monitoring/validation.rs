//! Startup validation of the monitoring configuration.
//!
//! Everything here runs once before the first cycle, so a bad pattern or
//! duplicate target is reported immediately instead of on every cycle.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use anyhow::{Result, anyhow};
use regex::Regex;
use url::Url;

use crate::config::{Config, TargetEntry};

/// Validate the whole configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_check_interval("monitor.interval_seconds", config.monitor.interval_seconds)?;
    validate_timeout("monitor.timeout_seconds", config.monitor.timeout_seconds)?;
    validate_timeout("telegram.timeout_seconds", config.telegram.timeout_seconds)?;
    validate_max_workers(config.monitor.max_workers)?;
    validate_pattern("stock_pattern", &config.monitor.stock_pattern)?;
    validate_pattern("price_pattern", &config.monitor.price_pattern)?;
    validate_targets(&config.targets)?;
    Ok(())
}

/// Validate the target list
///
/// URLs identify targets, so they must be unique.
pub fn validate_targets(targets: &[TargetEntry]) -> Result<()> {
    if targets.is_empty() {
        return Err(anyhow!("No targets configured"));
    }

    let mut seen = HashSet::new();
    for target in targets {
        if target.name.trim().is_empty() {
            return Err(anyhow!("Target {} has an empty name", target.url));
        }
        validate_http_target(&target.url)?;
        if !seen.insert(target.url.as_str()) {
            return Err(anyhow!("Duplicate target URL: {}", target.url));
        }
    }

    Ok(())
}

/// Validate HTTP/HTTPS target
fn validate_http_target(target: &str) -> Result<()> {
    let url = Url::parse(target).map_err(|e| anyhow!("Invalid URL {}: {}", target, e))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(anyhow!("Invalid scheme for target {}: {}", target, other)),
    }

    if url.host_str().is_none() {
        return Err(anyhow!("Target {} has no host", target));
    }

    if url.port() == Some(0) {
        return Err(anyhow!("Port 0 is not valid"));
    }

    Ok(())
}

/// A pattern must compile and expose the value in a capture group
fn validate_pattern(name: &str, pattern: &str) -> Result<()> {
    let regex = Regex::new(pattern).map_err(|e| anyhow!("Invalid {}: {}", name, e))?;

    if regex.captures_len() < 2 {
        return Err(anyhow!("{} must contain a capture group: {}", name, pattern));
    }

    Ok(())
}

fn validate_max_workers(max_workers: usize) -> Result<()> {
    if max_workers == 0 {
        return Err(anyhow!("max_workers must be at least 1"));
    }
    Ok(())
}

/// Seconds between cycles
const INTERVAL_RANGE: RangeInclusive<u64> = 10..=86_400;
const TIMEOUT_RANGE: RangeInclusive<u64> = 1..=300;

/// `field` is the config key, echoed in the error
fn validate_check_interval(field: &str, interval_seconds: u64) -> Result<()> {
    validate_seconds(field, interval_seconds, INTERVAL_RANGE)
}

fn validate_timeout(field: &str, timeout_seconds: u64) -> Result<()> {
    validate_seconds(field, timeout_seconds, TIMEOUT_RANGE)
}

fn validate_seconds(field: &str, seconds: u64, allowed: RangeInclusive<u64>) -> Result<()> {
    if !allowed.contains(&seconds) {
        return Err(anyhow!(
            "{} = {} is out of range, expected {} to {} seconds",
            field,
            seconds,
            allowed.start(),
            allowed.end()
        ));
    }
    Ok(())
}
