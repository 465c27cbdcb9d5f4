//! Application startup utilities module.

mod http;
mod logging;
mod shutdown;

pub use http::{configure_routes, main_server};
pub use logging::{LogRotation, LoggingConfig, LoggingGuard, ROOT_LOG_FILE, init_logging};
pub use shutdown::{ShutdownSignal, run_with_shutdown, wait_for_shutdown_signal};
