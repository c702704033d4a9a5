//! Telemetry log files
//!
//! Reading recorded logs, appending to them, and producing synthetic logs from
//! simulated trajectories.

use crate::error::ComputeError;
use crate::simulation::SeriesDriver;
use crate::telemetry::event::{EventKind, TelemetryEvent};
use crate::types::{Canvas, Heatmap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Monitor index written for synthetic events
pub const SYNTHETIC_MONITOR: u32 = 1;

const SECONDS_PER_MINUTE: f64 = 60.0;

/// Event counts for one monitor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorActivity {
    pub moves: usize,
    /// Press and release rows both count
    pub clicks: usize,
    pub scrolls: usize,
}

/// Parsed telemetry log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryLog {
    pub events: Vec<TelemetryEvent>,
    /// Non-empty rows that could not be parsed
    pub skipped: usize,
}

impl TelemetryLog {
    /// Parse log text, skipping malformed rows
    pub fn parse(text: &str) -> Self {
        Self::parse_bytes(text.as_bytes())
    }

    /// Parse raw log bytes; rows that are not valid UTF-8 are skipped like
    /// any other malformed row
    pub fn parse_bytes(bytes: &[u8]) -> Self {
        let mut log = TelemetryLog::default();
        for (idx, raw) in bytes.split(|b| *b == b'\n').enumerate() {
            let line = match std::str::from_utf8(raw) {
                Ok(line) => line,
                Err(_) => {
                    debug!(line = idx + 1, "skipping telemetry row with invalid UTF-8");
                    log.skipped += 1;
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match TelemetryEvent::parse_line(line) {
                Some(event) => log.events.push(event),
                None => {
                    debug!(line = idx + 1, "skipping malformed telemetry row");
                    log.skipped += 1;
                }
            }
        }
        log.warn_skipped();
        log
    }

    fn warn_skipped(&self) {
        if self.skipped > 0 {
            warn!(
                skipped = self.skipped,
                parsed = self.events.len(),
                "telemetry log contained malformed rows"
            );
        }
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self, ComputeError> {
        let bytes = std::fs::read(path)?;
        Ok(Self::parse_bytes(&bytes))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// First and last event timestamps
    pub fn time_range(&self) -> Option<(f64, f64)> {
        let first = self.events.first()?.timestamp;
        Some(
            self.events
                .iter()
                .fold((first, first), |(lo, hi), e| (lo.min(e.timestamp), hi.max(e.timestamp))),
        )
    }

    /// Event counts keyed by monitor; `None` collects off-display events
    pub fn by_monitor(&self) -> BTreeMap<Option<u32>, MonitorActivity> {
        let mut activity: BTreeMap<Option<u32>, MonitorActivity> = BTreeMap::new();
        for event in &self.events {
            let entry = activity.entry(event.monitor).or_default();
            match event.kind {
                EventKind::Move => entry.moves += 1,
                EventKind::ClickDown { .. } | EventKind::ClickUp { .. } => entry.clicks += 1,
                EventKind::Scroll { .. } => entry.scrolls += 1,
            }
        }
        activity
    }

    /// Bin the MOVE events of one monitor into a normalized heatmap.
    ///
    /// Coordinates are floored to their `scale`-pixel cell; events outside the
    /// canvas are dropped.
    pub fn move_heatmap(&self, monitor: Option<u32>, canvas: Canvas, scale: u32) -> Heatmap {
        let (cols, rows) = canvas.grid_dims(scale);
        let mut heatmap = Heatmap::zeros(cols, rows);
        if scale == 0 {
            return heatmap;
        }

        let scale = f64::from(scale);
        let moves = self
            .events
            .iter()
            .filter(|e| e.monitor == monitor && e.kind == EventKind::Move);
        for event in moves {
            let col = (event.x / scale).floor() as i64;
            let row = (event.y / scale).floor() as i64;
            heatmap.increment(col, row);
        }
        heatmap.normalize();
        heatmap
    }
}

/// Appends events to a telemetry log, one row per line
pub struct TelemetryLogWriter<W: Write> {
    inner: W,
    written: u64,
}

impl TelemetryLogWriter<BufWriter<File>> {
    /// Open `path` for appending, creating it if needed
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ComputeError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> TelemetryLogWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    pub fn write_event(&mut self, event: &TelemetryEvent) -> Result<(), ComputeError> {
        writeln!(self.inner, "{event}")?;
        self.written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), ComputeError> {
        self.inner.flush()?;
        Ok(())
    }

    /// Rows written through this writer
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// MOVE rows for one simulated minute.
///
/// Points keep path order and are spaced evenly across the minute beginning at
/// `start + minute * 60`.
pub fn synthesize_minute(
    driver: &SeriesDriver,
    seed: u64,
    minute: u32,
    start: f64,
) -> Vec<TelemetryEvent> {
    let points: Vec<_> = driver
        .minute_trajectories(seed, minute)
        .into_iter()
        .flatten()
        .collect();
    let minute_start = start + f64::from(minute) * SECONDS_PER_MINUTE;
    let spacing = SECONDS_PER_MINUTE / points.len().max(1) as f64;

    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            TelemetryEvent::moved(
                minute_start + i as f64 * spacing,
                Some(SYNTHETIC_MONITOR),
                p.x as f64,
                p.y as f64,
            )
        })
        .collect()
}

/// Write the whole simulated series as MOVE rows; returns the row count
pub fn synthesize_log<W: Write>(
    driver: &SeriesDriver,
    seed: u64,
    start: f64,
    writer: &mut TelemetryLogWriter<W>,
) -> Result<u64, ComputeError> {
    let mut rows = 0_u64;
    for minute in 0..driver.total_minutes() {
        for event in synthesize_minute(driver, seed, minute, start) {
            writer.write_event(&event)?;
            rows += 1;
        }
    }
    writer.flush()?;
    info!(rows, minutes = driver.total_minutes(), seed, "synthetic telemetry written");
    Ok(rows)
}
