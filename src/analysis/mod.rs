//! Analysis module for signal display
//!
//! This module provides the numeric core behind the plot and status panel:
//! - Viewport-sized min/max decimation
//! - The shared union timebase for cursor snapping and navigation
//! - Overall, cursor, selected-range and visible-range statistics

pub mod decimate;
pub mod stats;
pub mod timebase;

pub use decimate::{Decimator, PlotView};
pub use stats::{RangeStats, StatValue, StatisticsEngine, StatisticsRecord};
pub use timebase::{StepDirection, TimebaseRegistry};
