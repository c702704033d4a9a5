//! Regime-driven pointer trajectory simulation
//!
//! Pipeline: RegimeTimeline → MinuteAggregator (N × PathSimulator) → Heatmap,
//! repeated for every minute by the SeriesDriver.

pub mod aggregate;
pub mod path;
pub mod regime;
pub mod seed;
pub mod series;
pub mod timeline;

pub use aggregate::MinuteAggregator;
pub use path::PathSimulator;
pub use regime::{ConfinedRegion, RegimeParams, RegimeSpec};
pub use seed::{MinuteSeed, SeedTree};
pub use series::{generate, MinuteFrame, SeriesDriver};
pub use timeline::{lookup, RegimeTimeline, TimelineEntry, DEFAULT_LABEL};
