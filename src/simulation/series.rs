//! Minute-by-minute series generation

use crate::error::ComputeError;
use crate::simulation::aggregate::MinuteAggregator;
use crate::simulation::regime::RegimeParams;
use crate::simulation::seed::SeedTree;
use crate::simulation::timeline::{RegimeTimeline, TimelineEntry, DEFAULT_LABEL};
use crate::types::{Canvas, Heatmap, Point};
use rand::Rng;
use rayon::prelude::*;
use tracing::{debug, info};

/// One minute of a generated series
#[derive(Debug, Clone, PartialEq)]
pub struct MinuteFrame {
    pub minute: u32,
    pub label: String,
    pub heatmap: Heatmap,
}

/// Drives the timeline across a number of minutes
#[derive(Debug, Clone)]
pub struct SeriesDriver {
    timeline: RegimeTimeline,
    canvas: Canvas,
    scale: u32,
    total_minutes: u32,
}

impl SeriesDriver {
    /// Create a driver after validating the canvas and every regime
    pub fn new(
        timeline: RegimeTimeline,
        canvas: Canvas,
        scale: u32,
        total_minutes: u32,
    ) -> Result<Self, ComputeError> {
        canvas.validate(scale)?;
        timeline.validate()?;
        Ok(Self {
            timeline,
            canvas,
            scale,
            total_minutes,
        })
    }

    pub fn timeline(&self) -> &RegimeTimeline {
        &self.timeline
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn total_minutes(&self) -> u32 {
        self.total_minutes
    }

    /// Generate the series with per-minute and per-path generators derived
    /// from `seed`.
    ///
    /// Minutes are computed in parallel; each minute's grid depends only on
    /// `seed` and the minute index.
    pub fn generate(&self, seed: u64) -> Vec<MinuteFrame> {
        info!(
            total_minutes = self.total_minutes,
            regimes = self.timeline.entries.len(),
            seed,
            "generating heatmap series"
        );
        let tree = SeedTree::new(seed);

        let frames: Vec<MinuteFrame> = (0..self.total_minutes)
            .into_par_iter()
            .map(|minute| {
                let (label, params) = self.timeline.lookup(minute);
                debug!(minute, label, num_paths = params.num_paths, "simulating minute");
                let heatmap = MinuteAggregator::aggregate_seeded(
                    params,
                    self.canvas,
                    self.scale,
                    tree.minute_seed(minute),
                );
                MinuteFrame {
                    minute,
                    label: label.to_string(),
                    heatmap,
                }
            })
            .collect();

        info!(frames = frames.len(), "heatmap series complete");
        frames
    }

    /// Trajectories simulated for one minute of [`generate`](Self::generate),
    /// in path-index order
    pub fn minute_trajectories(&self, seed: u64, minute: u32) -> Vec<Vec<Point>> {
        let (_, params) = self.timeline.lookup(minute);
        MinuteAggregator::trajectories_seeded(
            params,
            self.canvas,
            SeedTree::new(seed).minute_seed(minute),
        )
    }

    /// Generate the series sequentially, threading one generator through
    /// every minute and path.
    ///
    /// A minute's grid depends on every draw made before it, so minutes cannot
    /// be reproduced in isolation.
    pub fn generate_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<MinuteFrame> {
        info!(
            total_minutes = self.total_minutes,
            regimes = self.timeline.entries.len(),
            "generating heatmap series on a shared stream"
        );
        let mut frames = Vec::with_capacity(self.total_minutes as usize);
        for minute in 0..self.total_minutes {
            let (label, params) = self.timeline.lookup(minute);
            debug!(minute, label, num_paths = params.num_paths, "simulating minute");
            let heatmap = MinuteAggregator::aggregate(params, self.canvas, self.scale, rng);
            frames.push(MinuteFrame {
                minute,
                label: label.to_string(),
                heatmap,
            });
        }
        info!(frames = frames.len(), "heatmap series complete");
        frames
    }
}

/// Generate a labeled heatmap series on a single shared generator.
///
/// Validates the canvas and regimes before any simulation starts.
#[allow(clippy::too_many_arguments)]
pub fn generate<R: Rng + ?Sized>(
    total_minutes: u32,
    timeline_entries: &[TimelineEntry],
    width: u32,
    height: u32,
    scale: u32,
    default_params: &RegimeParams,
    rng: &mut R,
) -> Result<Vec<MinuteFrame>, ComputeError> {
    let timeline = RegimeTimeline::new(timeline_entries.to_vec())
        .with_default(DEFAULT_LABEL, default_params.clone());
    let driver = SeriesDriver::new(timeline, Canvas::new(width, height), scale, total_minutes)?;
    Ok(driver.generate_with_rng(rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::regime::ConfinedRegion;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn small_timeline() -> RegimeTimeline {
        RegimeTimeline::new(vec![
            TimelineEntry::new(
                0,
                2,
                "focused",
                RegimeParams::new(4, 80)
                    .with_steps(1.0, 4.0)
                    .with_drift_target(100.0, 60.0)
                    .with_drift_probability(0.2)
                    .with_initial_bias(100.0, 60.0, 20.0),
            ),
            TimelineEntry::new(
                2,
                4,
                "boxed",
                RegimeParams::new(3, 60)
                    .with_confined_region(ConfinedRegion::new(20, 20, 60, 60))
                    .with_initial_bias(40.0, 40.0, 5.0),
            ),
        ])
        .with_default("idle", RegimeParams::new(2, 30))
    }

    fn driver() -> SeriesDriver {
        SeriesDriver::new(small_timeline(), Canvas::new(200, 120), 10, 5).unwrap()
    }

    #[test]
    fn test_series_labels_and_order() {
        let frames = driver().generate(1);
        let summary: Vec<(u32, &str)> = frames
            .iter()
            .map(|f| (f.minute, f.label.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (0, "focused"),
                (1, "focused"),
                (2, "boxed"),
                (3, "boxed"),
                (4, "idle"),
            ]
        );
    }

    #[test]
    fn test_every_frame_normalized() {
        for frame in driver().generate(3) {
            assert_eq!((frame.heatmap.cols(), frame.heatmap.rows()), (20, 12));
            assert_eq!(frame.heatmap.max(), 1.0);
            assert!(frame
                .heatmap
                .as_slice()
                .iter()
                .all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn test_seeded_generation_is_bit_identical() {
        let driver = driver();
        assert_eq!(driver.generate(2024), driver.generate(2024));
        assert_ne!(driver.generate(2024), driver.generate(2025));
    }

    #[test]
    fn test_minute_independent_of_series_length() {
        let long = SeriesDriver::new(small_timeline(), Canvas::new(200, 120), 10, 5).unwrap();
        let short = SeriesDriver::new(small_timeline(), Canvas::new(200, 120), 10, 3).unwrap();
        let long_frames = long.generate(8);
        let short_frames = short.generate(8);
        assert_eq!(&long_frames[..3], &short_frames[..]);
    }

    #[test]
    fn test_minute_trajectories_match_frame() {
        let driver = driver();
        let frames = driver.generate(4);
        let paths = driver.minute_trajectories(4, 2);
        assert_eq!(paths.len(), 3);
        assert!(paths.iter().all(|p| p.len() == 60));
        let rebinned = MinuteAggregator::bin(paths.iter().flatten(), driver.canvas(), 10);
        assert_eq!(rebinned, frames[2].heatmap);
    }

    #[test]
    fn test_shared_stream_is_deterministic() {
        let driver = driver();
        let a = driver.generate_with_rng(&mut ChaCha8Rng::seed_from_u64(10));
        let b = driver.generate_with_rng(&mut ChaCha8Rng::seed_from_u64(10));
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
    }

    #[test]
    fn test_boxed_minutes_stay_in_region_cells() {
        // Region 20..=60 covers cells 2..=6 at scale 10; only the start may escape
        let frames = driver().generate(5);
        for frame in frames.iter().filter(|f| f.label == "boxed") {
            let hot_outside = (0..frame.heatmap.rows())
                .flat_map(|row| (0..frame.heatmap.cols()).map(move |col| (row, col)))
                .filter(|(row, col)| !(2..=6).contains(row) || !(2..=6).contains(col))
                .filter(|(row, col)| frame.heatmap.get(*row, *col).unwrap_or(0.0) > 0.0)
                .count();
            assert!(hot_outside <= 3, "{} cells outside region", hot_outside);
        }
    }

    #[test]
    fn test_generate_function_single_point() {
        let entries = vec![TimelineEntry::new(
            0,
            1,
            "still",
            RegimeParams::new(1, 1)
                .with_angle_variance(0.0)
                .with_steps(0.0, 0.0)
                .with_initial_bias(50.0, 50.0, 0.0),
        )];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let frames = generate(2, &entries, 100, 100, 10, &RegimeParams::fallback(), &mut rng).unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].label, "still");
        assert_eq!(frames[0].heatmap.get(5, 5), Some(1.0));
        assert_eq!(frames[0].heatmap.occupied_cells(), 1);
        assert_eq!(frames[1].label, "default");
    }

    #[test]
    fn test_invalid_configuration_fails_before_simulation() {
        let entries = vec![TimelineEntry::new(5, 2, "backwards", RegimeParams::new(1, 1))];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(generate(10, &entries, 100, 100, 10, &RegimeParams::fallback(), &mut rng).is_err());
        assert!(SeriesDriver::new(RegimeTimeline::default(), Canvas::new(100, 100), 0, 1).is_err());
    }
}
