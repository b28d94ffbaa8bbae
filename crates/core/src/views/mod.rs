pub mod time_order;

pub use time_order::render_track;
