//! Regime timeline resolution

use crate::error::ComputeError;
use crate::simulation::regime::RegimeParams;
use serde::{Deserialize, Serialize};

/// Label of the fallback regime
pub const DEFAULT_LABEL: &str = "default";

/// A regime bound to the half-open minute interval `[start_minute, end_minute)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub start_minute: u32,
    pub end_minute: u32,
    pub label: String,
    pub params: RegimeParams,
}

impl TimelineEntry {
    pub fn new(
        start_minute: u32,
        end_minute: u32,
        label: impl Into<String>,
        params: RegimeParams,
    ) -> Self {
        Self {
            start_minute,
            end_minute,
            label: label.into(),
            params,
        }
    }

    pub fn contains(&self, minute: u32) -> bool {
        self.start_minute <= minute && minute < self.end_minute
    }
}

/// Resolve the regime active at `minute`.
///
/// Entries are scanned in the given order and the first one whose interval
/// contains the minute wins, so overlapping entries are resolved by position,
/// not by interval. Minutes outside every entry get the default regime.
pub fn lookup<'a>(
    minute: u32,
    entries: &'a [TimelineEntry],
    default_params: &'a RegimeParams,
    default_label: &'a str,
) -> (&'a str, &'a RegimeParams) {
    entries
        .iter()
        .find(|entry| entry.contains(minute))
        .map(|entry| (entry.label.as_str(), &entry.params))
        .unwrap_or((default_label, default_params))
}

/// Ordered regime entries plus the fallback regime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeTimeline {
    pub entries: Vec<TimelineEntry>,
    #[serde(default = "default_label")]
    pub default_label: String,
    #[serde(default = "RegimeParams::fallback")]
    pub default_params: RegimeParams,
}

fn default_label() -> String {
    DEFAULT_LABEL.to_string()
}

impl Default for RegimeTimeline {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl RegimeTimeline {
    /// Timeline with the standard fallback regime
    pub fn new(entries: Vec<TimelineEntry>) -> Self {
        Self {
            entries,
            default_label: default_label(),
            default_params: RegimeParams::fallback(),
        }
    }

    /// Replace the fallback regime
    pub fn with_default(mut self, label: impl Into<String>, params: RegimeParams) -> Self {
        self.default_label = label.into();
        self.default_params = params;
        self
    }

    /// Resolve the regime active at `minute`
    pub fn lookup(&self, minute: u32) -> (&str, &RegimeParams) {
        lookup(
            minute,
            &self.entries,
            &self.default_params,
            &self.default_label,
        )
    }

    /// First minute after the last entry ends
    pub fn span(&self) -> u32 {
        self.entries
            .iter()
            .map(|entry| entry.end_minute)
            .max()
            .unwrap_or(0)
    }

    /// Check every entry's interval and parameters
    pub fn validate(&self) -> Result<(), ComputeError> {
        for (index, entry) in self.entries.iter().enumerate() {
            if entry.start_minute >= entry.end_minute {
                return Err(ComputeError::InvalidTimeline {
                    index,
                    label: entry.label.clone(),
                    reason: format!(
                        "start minute {} is not before end minute {}",
                        entry.start_minute, entry.end_minute
                    ),
                });
            }
            entry.params.validate(&entry.label)?;
        }
        self.default_params.validate(&self.default_label)
    }
}
