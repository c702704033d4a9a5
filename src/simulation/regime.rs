//! Regime parameters
//!
//! A regime is a named bundle of random-walk parameters that is active over a
//! span of minutes. Required fields must be present in the input; every other
//! field receives its default when the value is built, so the walk itself never
//! has to ask whether a setting was provided.

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};

/// Default heading perturbation standard deviation (radians)
pub const DEFAULT_ANGLE_VARIANCE: f64 = 0.1;
/// Default lower bound of the per-step distance
pub const DEFAULT_STEP_MIN: f64 = 1.0;
/// Default upper bound of the per-step distance
pub const DEFAULT_STEP_MAX: f64 = 10.0;
/// Default per-step probability of steering toward the drift target
pub const DEFAULT_DRIFT_PROBABILITY: f64 = 0.05;
/// Default spread of the initial-position distribution (pixels)
pub const DEFAULT_BIAS_STD: f64 = 50.0;

/// Rectangle that hard-clamps trajectory positions, bounds inclusive
///
/// Serialized as `[x_min, y_min, x_max, y_max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i64; 4]", into = "[i64; 4]")]
pub struct ConfinedRegion {
    pub x_min: i64,
    pub y_min: i64,
    pub x_max: i64,
    pub y_max: i64,
}

impl ConfinedRegion {
    pub fn new(x_min: i64, y_min: i64, x_max: i64, y_max: i64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Whether `(x, y)` lies inside the region, edges included
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }

    /// Clamp a coordinate pair into the region
    pub fn clamp(&self, x: i64, y: i64) -> (i64, i64) {
        (
            x.max(self.x_min).min(self.x_max),
            y.max(self.y_min).min(self.y_max),
        )
    }
}

impl From<[i64; 4]> for ConfinedRegion {
    fn from([x_min, y_min, x_max, y_max]: [i64; 4]) -> Self {
        Self::new(x_min, y_min, x_max, y_max)
    }
}

impl From<ConfinedRegion> for [i64; 4] {
    fn from(region: ConfinedRegion) -> Self {
        [region.x_min, region.y_min, region.x_max, region.y_max]
    }
}

/// Wire form of a regime, every field optional
///
/// Converted into [`RegimeParams`] through `TryFrom`, which enforces the
/// required fields and fills in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegimeSpec {
    pub num_paths: Option<u32>,
    pub path_length: Option<u32>,
    pub angle_variance: Option<f64>,
    pub step_min: Option<f64>,
    pub step_max: Option<f64>,
    pub drift_probability: Option<f64>,
    pub drift_target: Option<(f64, f64)>,
    pub initial_bias: Option<(f64, f64)>,
    pub bias_std: Option<f64>,
    pub confined_region: Option<ConfinedRegion>,
}

/// Parameters of the random walk for one behavioral regime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RegimeSpec")]
pub struct RegimeParams {
    /// Trajectories simulated per minute
    pub num_paths: u32,
    /// Points emitted per trajectory
    pub path_length: u32,
    /// Standard deviation of the per-step heading perturbation
    pub angle_variance: f64,
    /// Lower bound of the uniform step distance
    pub step_min: f64,
    /// Upper bound of the uniform step distance
    pub step_max: f64,
    /// Per-step chance of steering toward `drift_target`
    pub drift_probability: f64,
    /// Attractor point; drift draws are inert without it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift_target: Option<(f64, f64)>,
    /// Mean of the initial-position normal distribution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_bias: Option<(f64, f64)>,
    /// Spread of the initial-position normal distribution
    pub bias_std: f64,
    /// Clamp region overriding the canvas bounds while walking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confined_region: Option<ConfinedRegion>,
}

impl RegimeParams {
    /// Regime with the given counts and default walk settings
    pub fn new(num_paths: u32, path_length: u32) -> Self {
        Self {
            num_paths,
            path_length,
            angle_variance: DEFAULT_ANGLE_VARIANCE,
            step_min: DEFAULT_STEP_MIN,
            step_max: DEFAULT_STEP_MAX,
            drift_probability: DEFAULT_DRIFT_PROBABILITY,
            drift_target: None,
            initial_bias: None,
            bias_std: DEFAULT_BIAS_STD,
            confined_region: None,
        }
    }

    /// Fallback regime used for minutes not covered by any timeline entry
    pub fn fallback() -> Self {
        Self::new(10, 500).with_steps(1.0, 8.0)
    }

    pub fn with_angle_variance(mut self, angle_variance: f64) -> Self {
        self.angle_variance = angle_variance;
        self
    }

    pub fn with_steps(mut self, step_min: f64, step_max: f64) -> Self {
        self.step_min = step_min;
        self.step_max = step_max;
        self
    }

    pub fn with_drift_probability(mut self, probability: f64) -> Self {
        self.drift_probability = probability;
        self
    }

    pub fn with_drift_target(mut self, x: f64, y: f64) -> Self {
        self.drift_target = Some((x, y));
        self
    }

    pub fn with_initial_bias(mut self, x: f64, y: f64, std: f64) -> Self {
        self.initial_bias = Some((x, y));
        self.bias_std = std;
        self
    }

    pub fn with_confined_region(mut self, region: ConfinedRegion) -> Self {
        self.confined_region = Some(region);
        self
    }

    /// Total number of points one minute of this regime produces
    pub fn points_per_minute(&self) -> u64 {
        u64::from(self.num_paths) * u64::from(self.path_length)
    }

    /// Check the stated bounds of every field
    pub fn validate(&self, label: &str) -> Result<(), ComputeError> {
        let invalid = |reason: String| ComputeError::InvalidRegime {
            label: label.to_string(),
            reason,
        };

        if self.num_paths == 0 {
            return Err(invalid("num_paths must be positive".to_string()));
        }
        if self.path_length == 0 {
            return Err(invalid("path_length must be positive".to_string()));
        }
        if !(self.angle_variance.is_finite() && self.angle_variance >= 0.0) {
            return Err(invalid(format!(
                "angle_variance must be a non-negative number, got {}",
                self.angle_variance
            )));
        }
        if !(self.step_min.is_finite() && self.step_max.is_finite()) {
            return Err(invalid("step bounds must be finite".to_string()));
        }
        if self.step_min > self.step_max {
            return Err(invalid(format!(
                "step_min ({}) exceeds step_max ({})",
                self.step_min, self.step_max
            )));
        }
        if !(0.0..=1.0).contains(&self.drift_probability) {
            return Err(invalid(format!(
                "drift_probability must be within [0, 1], got {}",
                self.drift_probability
            )));
        }
        if !(self.bias_std.is_finite() && self.bias_std >= 0.0) {
            return Err(invalid(format!(
                "bias_std must be a non-negative number, got {}",
                self.bias_std
            )));
        }
        if let Some((x, y)) = self.drift_target {
            if !(x.is_finite() && y.is_finite()) {
                return Err(invalid(format!("drift_target must be finite, got ({x}, {y})")));
            }
        }
        if let Some((x, y)) = self.initial_bias {
            if !(x.is_finite() && y.is_finite()) {
                return Err(invalid(format!("initial_bias must be finite, got ({x}, {y})")));
            }
        }
        if let Some(region) = &self.confined_region {
            if region.x_min > region.x_max || region.y_min > region.y_max {
                return Err(invalid(format!(
                    "confined_region is inverted: {:?}",
                    <[i64; 4]>::from(*region)
                )));
            }
        }
        Ok(())
    }
}

impl TryFrom<RegimeSpec> for RegimeParams {
    type Error = ComputeError;

    fn try_from(spec: RegimeSpec) -> Result<Self, Self::Error> {
        let num_paths = spec
            .num_paths
            .ok_or_else(|| ComputeError::MissingField("num_paths".to_string()))?;
        let path_length = spec
            .path_length
            .ok_or_else(|| ComputeError::MissingField("path_length".to_string()))?;

        Ok(Self {
            num_paths,
            path_length,
            angle_variance: spec.angle_variance.unwrap_or(DEFAULT_ANGLE_VARIANCE),
            step_min: spec.step_min.unwrap_or(DEFAULT_STEP_MIN),
            step_max: spec.step_max.unwrap_or(DEFAULT_STEP_MAX),
            drift_probability: spec.drift_probability.unwrap_or(DEFAULT_DRIFT_PROBABILITY),
            drift_target: spec.drift_target,
            initial_bias: spec.initial_bias,
            bias_std: spec.bias_std.unwrap_or(DEFAULT_BIAS_STD),
            confined_region: spec.confined_region,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_applied_on_deserialize() {
        let json = r#"{ "num_paths": 20, "path_length": 800 }"#;
        let params: RegimeParams = serde_json::from_str(json).unwrap();

        assert_eq!(params, RegimeParams::new(20, 800));
        assert_eq!(params.bias_std, 50.0);
        assert_eq!(params.drift_probability, 0.05);
        assert!(params.drift_target.is_none());
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let json = r#"{ "path_length": 800, "step_min": 2 }"#;
        let err = serde_json::from_str::<RegimeParams>(json).unwrap_err();
        assert!(err.to_string().contains("num_paths"));

        let json = r#"{ "num_paths": 3 }"#;
        let err = serde_json::from_str::<RegimeParams>(json).unwrap_err();
        assert!(err.to_string().contains("path_length"));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let json = r#"{ "num_paths": 1, "path_length": 1, "drift_targt": [1, 2] }"#;
        assert!(serde_json::from_str::<RegimeParams>(json).is_err());
    }

    #[test]
    fn test_full_regime_deserialization() {
        let json = r#"{
            "num_paths": 15,
            "path_length": 1000,
            "angle_variance": 0.1,
            "step_min": 1,
            "step_max": 5,
            "drift_probability": 0.05,
            "confined_region": [640, 360, 1280, 720],
            "initial_bias": [853, 480],
            "bias_std": 50
        }"#;
        let params: RegimeParams = serde_json::from_str(json).unwrap();

        assert_eq!(
            params.confined_region,
            Some(ConfinedRegion::new(640, 360, 1280, 720))
        );
        assert_eq!(params.initial_bias, Some((853.0, 480.0)));
        assert_eq!(params.step_max, 5.0);
        assert!(params.validate("State B").is_ok());
    }

    #[test]
    fn test_serialization_roundtrip_keeps_optionals() {
        let params = RegimeParams::new(2, 3)
            .with_drift_target(10.0, 20.0)
            .with_confined_region(ConfinedRegion::new(0, 0, 5, 5));
        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains("\"confined_region\":[0,0,5,5]"));
        assert!(!json.contains("initial_bias"));

        let parsed: RegimeParams = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, params);
    }

    #[test]
    fn test_validation_bounds() {
        assert!(RegimeParams::new(0, 10).validate("a").is_err());
        assert!(RegimeParams::new(1, 0).validate("a").is_err());
        assert!(RegimeParams::new(1, 1)
            .with_steps(5.0, 2.0)
            .validate("a")
            .is_err());
        assert!(RegimeParams::new(1, 1)
            .with_drift_probability(1.5)
            .validate("a")
            .is_err());
        assert!(RegimeParams::new(1, 1)
            .with_angle_variance(-0.1)
            .validate("a")
            .is_err());
        assert!(RegimeParams::new(1, 1)
            .with_confined_region(ConfinedRegion::new(10, 0, 5, 5))
            .validate("a")
            .is_err());
        assert!(RegimeParams::new(1, 1).with_steps(0.0, 0.0).validate("a").is_ok());
    }

    #[test]
    fn test_non_finite_points_rejected() {
        assert!(matches!(
            RegimeParams::new(1, 1)
                .with_initial_bias(f64::NAN, 10.0, 5.0)
                .validate("a"),
            Err(ComputeError::InvalidRegime { .. })
        ));
        assert!(RegimeParams::new(1, 1)
            .with_drift_target(10.0, f64::INFINITY)
            .validate("a")
            .is_err());
        assert!(RegimeParams::new(1, 1)
            .with_initial_bias(10.0, 10.0, 5.0)
            .with_drift_target(-20.0, 3000.0)
            .validate("a")
            .is_ok());
    }

    #[test]
    fn test_region_clamp_and_contains() {
        let region = ConfinedRegion::new(10, 20, 30, 40);
        assert_eq!(region.clamp(0, 100), (10, 40));
        assert_eq!(region.clamp(15, 25), (15, 25));
        assert!(region.contains(10, 40));
        assert!(!region.contains(9, 25));
    }
}
