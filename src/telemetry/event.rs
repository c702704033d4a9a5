//! Telemetry log rows
//!
//! One event per line, comma separated:
//!
//! ```text
//! timestamp,monitor,MOVE,x,y
//! timestamp,monitor,CLICK_DOWN,x,y,button
//! timestamp,monitor,CLICK_UP,x,y,button
//! timestamp,monitor,SCROLL,x,y,dx,dy
//! ```
//!
//! `timestamp` is fractional seconds since the Unix epoch. `monitor` is the
//! 1-based index of the display containing the pointer, or `None` when the
//! pointer was on no known display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum number of fields in any row
pub const MIN_FIELDS: usize = 5;

/// Literal written in the monitor column when no display contains the pointer
pub const NO_MONITOR: &str = "None";

/// Type-specific part of a telemetry event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Move,
    ClickDown { button: Option<String> },
    ClickUp { button: Option<String> },
    Scroll { dx: f64, dy: f64 },
}

impl EventKind {
    /// Tag used in the event-type column
    pub fn tag(&self) -> &'static str {
        match self {
            EventKind::Move => "MOVE",
            EventKind::ClickDown { .. } => "CLICK_DOWN",
            EventKind::ClickUp { .. } => "CLICK_UP",
            EventKind::Scroll { .. } => "SCROLL",
        }
    }

    pub fn is_click(&self) -> bool {
        matches!(self, EventKind::ClickDown { .. } | EventKind::ClickUp { .. })
    }
}

/// One pointer event from the telemetry log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// Seconds since the Unix epoch
    pub timestamp: f64,
    /// 1-based display index, `None` when off every known display
    pub monitor: Option<u32>,
    pub kind: EventKind,
    pub x: f64,
    pub y: f64,
}

impl TelemetryEvent {
    pub fn moved(timestamp: f64, monitor: Option<u32>, x: f64, y: f64) -> Self {
        Self {
            timestamp,
            monitor,
            kind: EventKind::Move,
            x,
            y,
        }
    }

    /// Parse one log line, returning `None` for rows that must be skipped.
    ///
    /// Rows are skipped when they have fewer than five fields, carry an
    /// unknown event type, a scroll without both deltas, or any numeric field
    /// that fails to parse or is not finite. Fields beyond the ones a type uses
    /// are ignored.
    pub fn parse_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.trim_end_matches(&['\r', '\n'][..]).split(',').collect();
        if fields.len() < MIN_FIELDS {
            return None;
        }

        let timestamp = parse_finite(fields[0])?;
        let monitor = parse_monitor(fields[1])?;
        let x = parse_finite(fields[3])?;
        let y = parse_finite(fields[4])?;

        let button = || {
            fields
                .get(5)
                .map(|b| b.trim())
                .filter(|b| !b.is_empty())
                .map(str::to_string)
        };

        let kind = match fields[2].trim() {
            "MOVE" => EventKind::Move,
            "CLICK_DOWN" => EventKind::ClickDown { button: button() },
            "CLICK_UP" => EventKind::ClickUp { button: button() },
            "SCROLL" => {
                let dx = parse_finite(fields.get(5)?)?;
                let dy = parse_finite(fields.get(6)?)?;
                EventKind::Scroll { dx, dy }
            }
            _ => return None,
        };

        Some(Self {
            timestamp,
            monitor,
            kind,
            x,
            y,
        })
    }

    /// Format as a log line, without the trailing newline
    pub fn to_line(&self) -> String {
        self.to_string()
    }

    /// Event time as a UTC timestamp, `None` if out of chrono's range
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        let secs = self.timestamp.floor();
        let nanos = ((self.timestamp - secs) * 1e9).round().min(999_999_999.0) as u32;
        DateTime::from_timestamp(secs as i64, nanos)
    }
}

impl fmt::Display for TelemetryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},", self.timestamp)?;
        match self.monitor {
            Some(index) => write!(f, "{index}")?,
            None => f.write_str(NO_MONITOR)?,
        }
        write!(f, ",{},{},{}", self.kind.tag(), self.x, self.y)?;
        match &self.kind {
            EventKind::Move => Ok(()),
            EventKind::ClickDown { button } | EventKind::ClickUp { button } => {
                write!(f, ",{}", button.as_deref().unwrap_or_default())
            }
            EventKind::Scroll { dx, dy } => write!(f, ",{dx},{dy}"),
        }
    }
}

/// `NaN` and infinities parse as `f64` but are not coordinates
fn parse_finite(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_monitor(field: &str) -> Option<Option<u32>> {
    let field = field.trim();
    if field == NO_MONITOR {
        return Some(None);
    }
    field.parse::<u32>().ok().map(Some)
}

/// Screen rectangle of one display, `left`/`top` inclusive, `right`/`bottom`
/// exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorRect {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl MonitorRect {
    pub fn new(left: i64, top: i64, right: i64, bottom: i64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left as f64 && x < self.right as f64 && y >= self.top as f64 && y < self.bottom as f64
    }
}

/// 1-based index of the first display containing `(x, y)`
pub fn monitor_index(x: f64, y: f64, monitors: &[MonitorRect]) -> Option<u32> {
    monitors
        .iter()
        .position(|rect| rect.contains(x, y))
        .map(|idx| idx as u32 + 1)
}
