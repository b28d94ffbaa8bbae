//! Trace slice model and viewport query engine.
//!
//! Loading runs `parsers` → `model::builder` → `model::depth` →
//! `model::timestamps` (see [`pipeline::load`]). The resulting [`Dataset`] is
//! read-only; [`query`], [`selection`] and [`visibility`] work against it by
//! id, and [`model::Session`] ties them together for interactive use.
//!
//! [`Dataset`]: tracepick_protocol::Dataset

pub mod config;
pub mod export;
pub mod layout;
pub mod model;
pub mod parsers;
pub mod pipeline;
pub mod query;
pub mod scheduler;
pub mod selection;
pub mod synthetic;
pub mod views;
pub mod visibility;

pub use config::{ConfigError, ViewConfig};
pub use export::{ExportError, ExportPayload, Exporter, JsonExporter};
pub use layout::{TrackExtent, TrackLayout};
pub use model::Session;
pub use parsers::{InputShape, ParseError};
pub use pipeline::load;
pub use query::{SelectionRect, ViewportQuery, find_overlapping, hit_test};
pub use scheduler::{FrameRequest, RedrawReason, RenderScheduler, ScheduleOutcome};
pub use selection::{Selection, SelectionStats};
pub use visibility::TrackVisibility;
