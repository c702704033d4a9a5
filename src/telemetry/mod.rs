//! Recorded pointer telemetry
//!
//! The row format shared by the capture tool and by synthetic logs built from
//! simulated trajectories.

pub mod event;
pub mod log;

pub use event::{monitor_index, EventKind, MonitorRect, TelemetryEvent};
pub use log::{
    synthesize_log, synthesize_minute, MonitorActivity, TelemetryLog, TelemetryLogWriter,
};
