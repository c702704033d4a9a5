//! Per-minute aggregation of trajectories into density grids

use crate::simulation::path::PathSimulator;
use crate::simulation::regime::RegimeParams;
use crate::simulation::seed::MinuteSeed;
use crate::types::{Canvas, Heatmap, Point};
use rand::Rng;
use rayon::prelude::*;

/// Builds one normalized heatmap from a minute's worth of trajectories
pub struct MinuteAggregator;

impl MinuteAggregator {
    /// Simulate `params.num_paths` trajectories one after another on a single
    /// generator and bin every emitted point.
    ///
    /// Panics on a canvas with a zero dimension, like [`PathSimulator::simulate`].
    pub fn aggregate<R: Rng + ?Sized>(
        params: &RegimeParams,
        canvas: Canvas,
        scale: u32,
        rng: &mut R,
    ) -> Heatmap {
        let mut points = Vec::with_capacity(params.points_per_minute() as usize);
        for _ in 0..params.num_paths {
            points.extend(PathSimulator::simulate(params, canvas, rng));
        }
        Self::bin(&points, canvas, scale)
    }

    /// Simulate each trajectory on its own generator derived from `seed`.
    ///
    /// Paths run in parallel; the grid is identical to a sequential run over
    /// the same path generators.
    pub fn aggregate_seeded(
        params: &RegimeParams,
        canvas: Canvas,
        scale: u32,
        seed: MinuteSeed,
    ) -> Heatmap {
        let paths = Self::trajectories_seeded(params, canvas, seed);
        Self::bin(paths.iter().flatten(), canvas, scale)
    }

    /// Raw trajectories behind [`aggregate_seeded`](Self::aggregate_seeded),
    /// in path-index order
    pub fn trajectories_seeded(
        params: &RegimeParams,
        canvas: Canvas,
        seed: MinuteSeed,
    ) -> Vec<Vec<Point>> {
        (0..params.num_paths)
            .into_par_iter()
            .map(|index| {
                let mut rng = seed.path_rng(index);
                PathSimulator::simulate(params, canvas, &mut rng)
            })
            .collect()
    }

    /// Count points per `scale`×`scale` cell and normalize by the busiest cell.
    ///
    /// Points whose bin falls outside the grid are dropped.
    pub fn bin<'a, I>(points: I, canvas: Canvas, scale: u32) -> Heatmap
    where
        I: IntoIterator<Item = &'a Point>,
    {
        let (cols, rows) = canvas.grid_dims(scale);
        let mut heatmap = Heatmap::zeros(cols, rows);
        if scale == 0 {
            return heatmap;
        }

        let scale = i64::from(scale);
        for point in points {
            heatmap.increment(point.x.div_euclid(scale), point.y.div_euclid(scale));
        }
        heatmap.normalize();
        heatmap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::regime::ConfinedRegion;
    use crate::simulation::seed::SeedTree;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn assert_normalized(heatmap: &Heatmap) {
        assert!(heatmap.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(heatmap.max(), 1.0);
    }

    #[test]
    fn test_single_point_lands_in_center_cell() {
        let params = RegimeParams::new(1, 1)
            .with_angle_variance(0.0)
            .with_steps(0.0, 0.0)
            .with_initial_bias(50.0, 50.0, 0.0);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let heatmap = MinuteAggregator::aggregate(&params, Canvas::new(100, 100), 10, &mut rng);

        assert_eq!((heatmap.cols(), heatmap.rows()), (10, 10));
        let mut expected = vec![vec![0.0; 10]; 10];
        expected[5][5] = 1.0;
        assert_eq!(heatmap.to_grid(), expected);
    }

    #[test]
    fn test_cells_are_normalized() {
        let params = RegimeParams::new(20, 300)
            .with_angle_variance(0.2)
            .with_steps(2.0, 8.0)
            .with_drift_probability(0.1)
            .with_drift_target(320.0, 240.0)
            .with_initial_bias(320.0, 240.0, 100.0);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let heatmap = MinuteAggregator::aggregate(&params, Canvas::new(640, 480), 40, &mut rng);

        assert_eq!((heatmap.cols(), heatmap.rows()), (16, 12));
        assert_normalized(&heatmap);
    }

    #[test]
    fn test_out_of_grid_points_are_dropped() {
        // Region reaches past the canvas; everything beyond it is silently lost
        let points = vec![Point::new(5, 5), Point::new(150, 5), Point::new(5, -20)];
        let heatmap = MinuteAggregator::bin(&points, Canvas::new(100, 100), 10);
        assert_eq!(heatmap.occupied_cells(), 1);
        assert_eq!(heatmap.get(0, 0), Some(1.0));
    }

    #[test]
    fn test_region_beyond_canvas_does_not_panic() {
        let params = RegimeParams::new(3, 200)
            .with_steps(5.0, 10.0)
            .with_initial_bias(95.0, 95.0, 0.0)
            .with_confined_region(ConfinedRegion::new(80, 80, 160, 160));
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let heatmap = MinuteAggregator::aggregate(&params, Canvas::new(100, 100), 10, &mut rng);

        assert!(heatmap.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_grid_smaller_than_scale_is_empty() {
        let params = RegimeParams::new(2, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let heatmap = MinuteAggregator::aggregate(&params, Canvas::new(30, 30), 40, &mut rng);
        assert_eq!((heatmap.cols(), heatmap.rows()), (0, 0));
        assert_eq!(heatmap.max(), 0.0);
    }

    #[test]
    fn test_seeded_aggregation_is_deterministic() {
        let params = RegimeParams::new(12, 250).with_steps(1.0, 6.0);
        let canvas = Canvas::new(320, 240);
        let seed = SeedTree::new(99).minute_seed(17);

        let a = MinuteAggregator::aggregate_seeded(&params, canvas, 20, seed);
        let b = MinuteAggregator::aggregate_seeded(&params, canvas, 20, seed);
        assert_eq!(a, b);
        assert_normalized(&a);
    }

    #[test]
    fn test_seeded_matches_sequential_over_path_generators() {
        let params = RegimeParams::new(5, 120);
        let canvas = Canvas::new(200, 200);
        let seed = SeedTree::new(5).minute_seed(0);

        let mut points = Vec::new();
        for index in 0..params.num_paths {
            let mut rng = seed.path_rng(index);
            points.extend(PathSimulator::simulate(&params, canvas, &mut rng));
        }
        let sequential = MinuteAggregator::bin(&points, canvas, 10);

        assert_eq!(
            MinuteAggregator::aggregate_seeded(&params, canvas, 10, seed),
            sequential
        );
    }
}
