pub mod config;
pub mod context;
pub mod error;
pub mod helpers;
pub mod incident;

pub use config::AppConfig;
pub use context::{Principal, RequestContext};
pub use error::CoreError;
pub use helpers::response::{ApiResponse, ExceptionData, SubCallResult};
pub use incident::Incident;
