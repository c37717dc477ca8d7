//! # SigView-RS: Signal Decimation and Live Statistics
//!
//! The numeric core behind an interactive plot of measurement signals. It
//! keeps many signals with unrelated timebases on one time axis, reduces each
//! of them to a viewport-sized set of points that preserves every visible
//! extremum, and computes the values a status panel shows for a cursor, a
//! selected region and the visible range.
//!
//! ## Architecture
//!
//! - **Signal**: Timestamps with raw and physical sample views ([`signal`])
//! - **Conversion**: Raw-to-physical mappings, including Rhai scripts
//!   ([`conversion`], [`scripting`])
//! - **Analysis**: Min/max decimation, the union timebase and range
//!   statistics ([`analysis`])
//! - **View**: One owner for the signals, cursor, region and visible range
//!   of a plot ([`view`])
//!
//! ## Configuration
//!
//! Engine tunables are stored as TOML in the platform-appropriate data
//! directory under `dev.hxyulin.sigview-rs`; saved views are JSON files
//! holding one channel descriptor per signal. See [`config`].
//!
//! ## Example
//!
//! ```ignore
//! use sigview_rs::{
//!     config::EngineSettings,
//!     signal::SignalBuilder,
//!     view::SignalView,
//! };
//!
//! let settings = EngineSettings::load_or_default();
//! let _guard = sigview_rs::logging::init(&settings.log)?;
//!
//! let mut view = SignalView::new(settings);
//! let speed = view.add_signal(
//!     SignalBuilder::new("speed", vec![0.0, 12.5, 30.1], vec![0.0, 0.1, 0.2])
//!         .with_unit("km/h")
//!         .build()?,
//! );
//!
//! view.set_width(800);
//! view.place_cursor(0.12);
//! let points = view.plot_points(speed)?;
//! let record = view.stats(speed)?;
//! println!("{} points, cursor value {}", points.len(), record.cursor_value);
//! ```

pub mod analysis;
pub mod config;
pub mod conversion;
pub mod error;
pub mod format;
pub mod logging;
pub mod scripting;
pub mod signal;
pub mod types;
pub mod view;

// Re-export commonly used types
pub use analysis::{PlotView, StatValue, StatisticsEngine, StatisticsRecord, StepDirection, TimebaseRegistry};
pub use config::{ChannelDescriptor, EngineSettings, ViewConfig};
pub use conversion::{Conversion, LinearConversion, ScriptConversion, TextTableConversion};
pub use error::{Result, ResultExt, SigViewError};
pub use signal::{Samples, Signal, SignalBuilder};
pub use types::{DisplayFormat, SampleKind, SampleMode, SampleValue, SignalId, TimebaseId};
pub use view::{SignalView, YRange, ZoomDirection};
