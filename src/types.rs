//! Core value types shared by the simulator and the telemetry codec
//!
//! Coordinates are integer pixels with the origin at the top-left corner of the
//! canvas, `y` increasing downwards. Heatmaps use the same orientation: row 0 is
//! the top of the screen.

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};

/// A pointer position in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to an arbitrary real-valued location
    pub fn distance_to(&self, (tx, ty): (f64, f64)) -> f64 {
        let dx = tx - self.x as f64;
        let dy = ty - self.y as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Rectangular drawing surface the trajectories live on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Grid dimensions `(cols, rows)` after downscaling by `scale`
    pub fn grid_dims(&self, scale: u32) -> (usize, usize) {
        if scale == 0 {
            return (0, 0);
        }
        ((self.width / scale) as usize, (self.height / scale) as usize)
    }

    /// Largest valid x coordinate
    pub fn max_x(&self) -> i64 {
        i64::from(self.width) - 1
    }

    /// Largest valid y coordinate
    pub fn max_y(&self) -> i64 {
        i64::from(self.height) - 1
    }

    /// Check that the canvas is non-empty and can be binned at `scale`
    pub fn validate(&self, scale: u32) -> Result<(), ComputeError> {
        if self.width == 0 || self.height == 0 {
            return Err(ComputeError::InvalidCanvas(format!(
                "canvas must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if scale == 0 {
            return Err(ComputeError::InvalidCanvas(
                "scale must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Dense 2D density grid, stored row-major
///
/// Cell `(row, col)` counts the points whose `y` falls in row `row` and whose
/// `x` falls in column `col`.
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    cols: usize,
    rows: usize,
    cells: Vec<f64>,
}

impl Heatmap {
    /// All-zero grid
    pub fn zeros(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![0.0; cols * rows],
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Value at `(row, col)`, or `None` when out of range
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.cells[row * self.cols + col])
        } else {
            None
        }
    }

    /// Add one to the cell at signed bin indices.
    ///
    /// Returns `false` and leaves the grid untouched when the bin lies outside
    /// the grid.
    pub fn increment(&mut self, col: i64, row: i64) -> bool {
        if col < 0 || row < 0 {
            return false;
        }
        let (col, row) = (col as usize, row as usize);
        if col >= self.cols || row >= self.rows {
            return false;
        }
        self.cells[row * self.cols + col] += 1.0;
        true
    }

    /// Largest cell value (0.0 for an empty grid)
    pub fn max(&self) -> f64 {
        self.cells.iter().copied().fold(0.0, f64::max)
    }

    /// Sum over all cells
    pub fn total(&self) -> f64 {
        self.cells.iter().sum()
    }

    /// Number of cells with a positive value
    pub fn occupied_cells(&self) -> usize {
        self.cells.iter().filter(|v| **v > 0.0).count()
    }

    /// Divide every cell by the maximum so the hottest cell becomes 1.0.
    ///
    /// An all-zero grid is left unchanged.
    pub fn normalize(&mut self) {
        let max = self.max();
        if max > 0.0 {
            for cell in &mut self.cells {
                *cell /= max;
            }
        }
    }

    /// Iterate over rows, top of the screen first
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact panics on a zero chunk size
        self.cells.chunks_exact(self.cols.max(1)).take(self.rows)
    }

    /// Nested row vectors, as consumed by renderers
    pub fn to_grid(&self) -> Vec<Vec<f64>> {
        if self.cols == 0 {
            return vec![Vec::new(); self.rows];
        }
        self.iter_rows().map(|row| row.to_vec()).collect()
    }

    /// Flat row-major cell values
    pub fn as_slice(&self) -> &[f64] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_grid_dims_floor() {
        let canvas = Canvas::new(2560, 1440);
        assert_eq!(canvas.grid_dims(40), (64, 36));

        let odd = Canvas::new(105, 99);
        assert_eq!(odd.grid_dims(10), (10, 9));
    }

    #[test]
    fn test_canvas_validation() {
        assert!(Canvas::new(100, 100).validate(10).is_ok());
        assert!(Canvas::new(0, 100).validate(10).is_err());
        assert!(Canvas::new(100, 100).validate(0).is_err());
    }

    #[test]
    fn test_increment_drops_out_of_range() {
        let mut heatmap = Heatmap::zeros(3, 2);
        assert!(heatmap.increment(2, 1));
        assert!(!heatmap.increment(3, 0));
        assert!(!heatmap.increment(0, 2));
        assert!(!heatmap.increment(-1, 0));
        assert_eq!(heatmap.total(), 1.0);
        assert_eq!(heatmap.get(1, 2), Some(1.0));
    }

    #[test]
    fn test_normalize_scales_max_to_one() {
        let mut heatmap = Heatmap::zeros(2, 2);
        heatmap.increment(0, 0);
        heatmap.increment(0, 0);
        heatmap.increment(1, 1);
        heatmap.normalize();

        assert_eq!(heatmap.to_grid(), vec![vec![1.0, 0.0], vec![0.0, 0.5]]);
        assert_eq!(heatmap.max(), 1.0);
    }

    #[test]
    fn test_normalize_empty_grid_stays_zero() {
        let mut heatmap = Heatmap::zeros(4, 3);
        heatmap.normalize();
        assert_eq!(heatmap.max(), 0.0);
        assert!(heatmap.as_slice().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_point_distance() {
        let p = Point::new(0, 0);
        assert!((p.distance_to((3.0, 4.0)) - 5.0).abs() < 1e-12);
    }
}
