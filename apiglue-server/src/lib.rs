pub mod app;
pub mod handlers;

pub use app::{alert_sink, build_app};
