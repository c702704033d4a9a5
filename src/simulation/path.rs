//! Random-walk trajectory generation
//!
//! Draw order is fixed so that a given generator state always yields the same
//! trajectory: initial x, initial y, initial heading, then per step the heading
//! perturbation, the drift decision and the step length.

use crate::simulation::regime::RegimeParams;
use crate::types::{Canvas, Point};
use rand::Rng;
use rand_distr::StandardNormal;
use std::f64::consts::TAU;

/// Generator of single pointer trajectories
pub struct PathSimulator;

impl PathSimulator {
    /// Simulate one trajectory of exactly `params.path_length` points.
    ///
    /// The first point is the initial position. Each point is emitted before
    /// the step that moves away from it, so the position reached by the final
    /// step is discarded.
    ///
    /// # Panics
    ///
    /// Panics if the canvas has a zero dimension. `SeriesDriver::new` and
    /// `Canvas::validate` reject such canvases before simulation.
    pub fn simulate<R: Rng + ?Sized>(
        params: &RegimeParams,
        canvas: Canvas,
        rng: &mut R,
    ) -> Vec<Point> {
        let mut points = Vec::with_capacity(params.path_length as usize);
        let mut walker = Walker::start(params, canvas, rng);
        for _ in 0..params.path_length {
            points.push(walker.position());
            walker.step(params, canvas, rng);
        }
        points
    }
}

/// Position and heading of a trajectory in progress
#[derive(Debug, Clone, Copy)]
struct Walker {
    x: i64,
    y: i64,
    angle: f64,
}

impl Walker {
    fn start<R: Rng + ?Sized>(params: &RegimeParams, canvas: Canvas, rng: &mut R) -> Self {
        let (x, y) = initial_position(params, canvas, rng);
        let angle = rng.gen::<f64>() * TAU;
        Self { x, y, angle }
    }

    fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    fn step<R: Rng + ?Sized>(&mut self, params: &RegimeParams, canvas: Canvas, rng: &mut R) {
        self.angle += sample_normal(rng, 0.0, params.angle_variance);

        // The decision is drawn even without a target to keep the stream aligned
        let drift_fires = rng.gen::<f64>() < params.drift_probability;
        if drift_fires {
            if let Some((tx, ty)) = params.drift_target {
                let desired = (ty - self.y as f64).atan2(tx - self.x as f64);
                self.angle = (self.angle + desired) / 2.0;
            }
        }

        let step = sample_uniform(rng, params.step_min, params.step_max);
        self.x += (step * self.angle.cos()) as i64;
        self.y += (step * self.angle.sin()) as i64;

        (self.x, self.y) = match &params.confined_region {
            Some(region) => region.clamp(self.x, self.y),
            None => (
                self.x.max(0).min(canvas.max_x()),
                self.y.max(0).min(canvas.max_y()),
            ),
        };
    }
}

/// Starting point, always sampled within the canvas regardless of confinement
fn initial_position<R: Rng + ?Sized>(
    params: &RegimeParams,
    canvas: Canvas,
    rng: &mut R,
) -> (i64, i64) {
    match params.initial_bias {
        Some((bx, by)) => {
            let x = sample_normal(rng, bx, params.bias_std).clamp(0.0, canvas.max_x() as f64);
            let y = sample_normal(rng, by, params.bias_std).clamp(0.0, canvas.max_y() as f64);
            (x as i64, y as i64)
        }
        None => (
            rng.gen_range(0..i64::from(canvas.width)),
            rng.gen_range(0..i64::from(canvas.height)),
        ),
    }
}

fn sample_normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    mean + std_dev * z
}

/// Uniform draw on `[low, high)`; a degenerate range still consumes one draw
fn sample_uniform<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
    low + (high - low) * rng.gen::<f64>()
}
