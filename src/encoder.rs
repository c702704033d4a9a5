//! Heatmap series encoder
//!
//! Encodes generated minute frames into JSON payloads for rendering
//! collaborators. Grids are nested row arrays with row 0 at the top of the
//! screen, so renderers should draw them with an inverted vertical axis.

use crate::error::ComputeError;
use crate::simulation::MinuteFrame;
use crate::types::Canvas;
use crate::{POINTERFLOW_VERSION, PRODUCER_NAME};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current series payload schema version
pub const SERIES_SCHEMA_VERSION: &str = "pointerflow.heatmap_series.v1";

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// One labeled minute grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramePayload {
    pub minute: u32,
    pub label: String,
    /// Normalized cell values in [0, 1], `grid[row][col]`
    pub grid: Vec<Vec<f64>>,
}

impl From<&MinuteFrame> for FramePayload {
    fn from(frame: &MinuteFrame) -> Self {
        Self {
            minute: frame.minute,
            label: frame.label.clone(),
            grid: frame.heatmap.to_grid(),
        }
    }
}

/// Complete series document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapSeriesPayload {
    pub schema_version: String,
    pub producer: SeriesProducer,
    /// When this payload was computed (RFC3339)
    pub computed_at_utc: String,
    pub canvas: Canvas,
    pub scale: u32,
    pub seed: u64,
    pub frames: Vec<FramePayload>,
}

/// Series encoder
pub struct SeriesEncoder {
    instance_id: String,
}

impl Default for SeriesEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SeriesEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn producer(&self) -> SeriesProducer {
        SeriesProducer {
            name: PRODUCER_NAME.to_string(),
            version: POINTERFLOW_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        }
    }

    /// Build the series document
    pub fn encode(
        &self,
        frames: &[MinuteFrame],
        canvas: Canvas,
        scale: u32,
        seed: u64,
    ) -> HeatmapSeriesPayload {
        HeatmapSeriesPayload {
            schema_version: SERIES_SCHEMA_VERSION.to_string(),
            producer: self.producer(),
            computed_at_utc: Utc::now().to_rfc3339(),
            canvas,
            scale,
            seed,
            frames: frames.iter().map(FramePayload::from).collect(),
        }
    }

    /// Encode the series document as compact JSON
    pub fn encode_to_json(
        &self,
        frames: &[MinuteFrame],
        canvas: Canvas,
        scale: u32,
        seed: u64,
    ) -> Result<String, ComputeError> {
        let payload = self.encode(frames, canvas, scale, seed);
        serde_json::to_string(&payload).map_err(|e| ComputeError::EncodingError(e.to_string()))
    }

    /// Encode the series document as indented JSON
    pub fn encode_to_json_pretty(
        &self,
        frames: &[MinuteFrame],
        canvas: Canvas,
        scale: u32,
        seed: u64,
    ) -> Result<String, ComputeError> {
        let payload = self.encode(frames, canvas, scale, seed);
        serde_json::to_string_pretty(&payload)
            .map_err(|e| ComputeError::EncodingError(e.to_string()))
    }

    /// Encode one frame per line
    pub fn encode_to_ndjson(&self, frames: &[MinuteFrame]) -> Result<String, ComputeError> {
        let mut out = String::new();
        for frame in frames {
            let line = serde_json::to_string(&FramePayload::from(frame))
                .map_err(|e| ComputeError::EncodingError(e.to_string()))?;
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Heatmap;
    use pretty_assertions::assert_eq;

    fn sample_frames() -> Vec<MinuteFrame> {
        let mut hot = Heatmap::zeros(3, 2);
        hot.increment(1, 0);
        hot.increment(1, 0);
        hot.increment(2, 1);
        hot.normalize();

        vec![
            MinuteFrame {
                minute: 0,
                label: "State A".to_string(),
                heatmap: hot,
            },
            MinuteFrame {
                minute: 1,
                label: "default".to_string(),
                heatmap: Heatmap::zeros(3, 2),
            },
        ]
    }

    #[test]
    fn test_encode_payload() {
        let encoder = SeriesEncoder::with_instance_id("test-instance".to_string());
        let json = encoder
            .encode_to_json(&sample_frames(), Canvas::new(30, 20), 10, 7)
            .unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(payload["schema_version"], SERIES_SCHEMA_VERSION);
        assert_eq!(payload["producer"]["name"], "pointerflow");
        assert_eq!(payload["producer"]["instance_id"], "test-instance");
        assert_eq!(payload["canvas"]["width"], 30);
        assert_eq!(payload["seed"], 7);
        assert_eq!(payload["frames"][0]["label"], "State A");
        assert_eq!(payload["frames"][0]["grid"][0][1], 1.0);
        assert_eq!(payload["frames"][0]["grid"][1][2], 0.5);
        assert_eq!(payload["frames"][1]["grid"][1][2], 0.0);
    }

    #[test]
    fn test_ndjson_one_frame_per_line() {
        let encoder = SeriesEncoder::new();
        let ndjson = encoder.encode_to_ndjson(&sample_frames()).unwrap();
        let lines: Vec<&str> = ndjson.lines().collect();
        assert_eq!(lines.len(), 2);

        let frame: FramePayload = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(frame.minute, 1);
        assert_eq!(frame.grid, vec![vec![0.0; 3]; 2]);
    }

    #[test]
    fn test_instance_ids_are_unique() {
        assert_ne!(
            SeriesEncoder::new().producer().instance_id,
            SeriesEncoder::new().producer().instance_id
        );
    }
}
