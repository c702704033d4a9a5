//! Pointerflow - synthetic pointer telemetry and per-minute density heatmaps
//!
//! Pointerflow simulates mouse trajectories as regime-driven random walks and
//! bins them into one normalized heatmap per minute:
//! regime timeline → trajectory simulation → minute aggregation → encoding.
//!
//! ## Modules
//!
//! - **Simulation**: regimes, trajectories, minute grids and series generation
//! - **Telemetry**: recorded and synthetic pointer event logs

pub mod config;
pub mod encoder;
pub mod error;
pub mod simulation;
pub mod telemetry;
pub mod types;

pub use config::SimulationConfig;
pub use encoder::SeriesEncoder;
pub use error::ComputeError;
pub use simulation::{generate, MinuteFrame, RegimeParams, SeriesDriver, TimelineEntry};
pub use types::{Canvas, Heatmap, Point};

/// Pointerflow version embedded in encoded payloads
pub const POINTERFLOW_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for encoded payloads
pub const PRODUCER_NAME: &str = "pointerflow";
