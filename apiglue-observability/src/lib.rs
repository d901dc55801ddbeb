pub mod handler;
pub mod payload;
pub mod sink;

#[cfg(feature = "slack")]
pub mod slack;

pub use handler::{DontReport, ExceptionHandler};
pub use payload::{LogPayload, PayloadOptions};
pub use sink::{AlertSink, MemorySink, SinkError, TracingSink};

#[cfg(feature = "slack")]
pub use slack::SlackWebhookSink;
