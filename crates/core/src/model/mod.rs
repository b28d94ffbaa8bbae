pub mod builder;
pub mod color;
pub mod depth;
pub mod event;
pub mod session;
pub mod timestamps;

pub use builder::{BuildReport, build_dataset, build_dataset_with_report};
pub use color::color_class;
pub use depth::{assign_depths, assign_track_depths};
pub use event::{RawEvent, RawTrace, ThreadKey};
pub use session::Session;
pub use timestamps::normalize_timestamps;
