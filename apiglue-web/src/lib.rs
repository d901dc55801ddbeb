pub mod error;
pub mod extract;
pub mod middleware;
pub mod panic;

pub use error::{AppError, ErrorKind};
pub use middleware::{ReportState, report_exceptions, with_exception_reporting};
pub use panic::install_panic_hook;
