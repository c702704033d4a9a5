//! Simulation configuration documents
//!
//! A configuration is a JSON document describing the canvas, the grid scale,
//! the series length, the seed and the ordered regime timeline:
//!
//! ```json
//! {
//!   "canvas": { "width": 2560, "height": 1440 },
//!   "scale": 40,
//!   "total_minutes": 210,
//!   "seed": 7,
//!   "default_regime": { "label": "default", "params": { "num_paths": 10, "path_length": 500 } },
//!   "timeline": [
//!     { "start_minute": 0, "end_minute": 30, "label": "State A",
//!       "params": { "num_paths": 20, "path_length": 800 } }
//!   ]
//! }
//! ```

use crate::error::ComputeError;
use crate::simulation::{
    ConfinedRegion, RegimeParams, RegimeTimeline, SeriesDriver, TimelineEntry, DEFAULT_LABEL,
};
use crate::types::Canvas;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Seed used when a document does not provide one
pub const DEFAULT_SEED: u64 = 0;

/// Fallback regime for minutes outside every timeline entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultRegime {
    #[serde(default = "default_label")]
    pub label: String,
    pub params: RegimeParams,
}

fn default_label() -> String {
    DEFAULT_LABEL.to_string()
}

impl Default for DefaultRegime {
    fn default() -> Self {
        Self {
            label: default_label(),
            params: RegimeParams::fallback(),
        }
    }
}

/// Full description of a simulated telemetry run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub canvas: Canvas,
    /// Pixels per heatmap cell along each axis
    pub scale: u32,
    pub total_minutes: u32,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub default_regime: DefaultRegime,
    pub timeline: Vec<TimelineEntry>,
}

impl SimulationConfig {
    /// Parse and validate a configuration document
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: SimulationConfig = serde_json::from_str(json)
            .map_err(|e| ComputeError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ComputeError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, ComputeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check canvas, intervals and every regime's bounds
    pub fn validate(&self) -> Result<(), ComputeError> {
        self.canvas.validate(self.scale)?;
        self.regime_timeline().validate()
    }

    pub fn regime_timeline(&self) -> RegimeTimeline {
        RegimeTimeline::new(self.timeline.clone())
            .with_default(self.default_regime.label.clone(), self.default_regime.params.clone())
    }

    /// Build a series driver for this configuration
    pub fn driver(&self) -> Result<SeriesDriver, ComputeError> {
        SeriesDriver::new(
            self.regime_timeline(),
            self.canvas,
            self.scale,
            self.total_minutes,
        )
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_total_minutes(mut self, total_minutes: u32) -> Self {
        self.total_minutes = total_minutes;
        self
    }

    /// Six-regime desk session on a 2560×1440 display, 210 minutes at scale 40
    ///
    /// Centered exploration, a confined reading phase, then four drift phases
    /// pulling toward different parts of the screen.
    pub fn desk_session() -> Self {
        let (width, height) = (2560_u32, 1440_u32);
        let (w, h) = (f64::from(width), f64::from(height));
        let (wi, hi) = (i64::from(width), i64::from(height));
        let center = (w / 2.0, h / 2.0);

        let state_a = RegimeParams::new(20, 800)
            .with_angle_variance(0.2)
            .with_steps(2.0, 8.0)
            .with_drift_probability(0.1)
            .with_drift_target(center.0, center.1)
            .with_initial_bias(center.0, center.1, 100.0);

        let state_b = RegimeParams::new(15, 1000)
            .with_angle_variance(0.1)
            .with_steps(1.0, 5.0)
            .with_drift_probability(0.05)
            .with_confined_region(ConfinedRegion::new(wi / 4, hi / 4, wi / 2, hi / 2))
            .with_initial_bias((wi / 3) as f64, (hi / 3) as f64, 50.0);

        let state_c = RegimeParams::new(25, 600)
            .with_angle_variance(0.5)
            .with_steps(3.0, 12.0)
            .with_drift_probability(0.2)
            .with_drift_target((w * 0.75).trunc(), (h * 0.75).trunc())
            .with_initial_bias(center.0, center.1, 150.0);

        let state_d = RegimeParams::new(10, 400)
            .with_angle_variance(0.3)
            .with_steps(2.0, 6.0)
            .with_drift_probability(0.1)
            .with_drift_target((wi / 4) as f64, (hi / 4) as f64)
            .with_initial_bias((wi / 4) as f64, (hi / 4) as f64, 80.0);

        let state_e = RegimeParams::new(50, 500)
            .with_angle_variance(0.8)
            .with_steps(3.0, 4.0)
            .with_drift_probability(0.3)
            .with_drift_target((w * 0.35).trunc(), (h * 0.25).trunc())
            .with_initial_bias(center.0, center.1, 50.0);

        let state_f = RegimeParams::new(30, 700)
            .with_angle_variance(0.4)
            .with_steps(1.0, 2.0)
            .with_drift_probability(0.15)
            .with_drift_target((w * 0.8).trunc(), (h * 0.8).trunc())
            .with_initial_bias(center.0, center.1, 100.0);

        Self {
            canvas: Canvas::new(width, height),
            scale: 40,
            total_minutes: 210,
            seed: DEFAULT_SEED,
            default_regime: DefaultRegime::default(),
            timeline: vec![
                TimelineEntry::new(0, 30, "State A", state_a),
                TimelineEntry::new(30, 90, "State B", state_b),
                TimelineEntry::new(90, 120, "State C", state_c),
                TimelineEntry::new(120, 150, "State D", state_d),
                TimelineEntry::new(150, 180, "State E", state_e),
                TimelineEntry::new(180, 210, "State F", state_f),
            ],
        }
    }
}
