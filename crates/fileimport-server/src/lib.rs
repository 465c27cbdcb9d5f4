// HTTP server for the OSS file import service
// Wires configuration, logging, the import pipeline, and the REST API together

pub mod api; // REST handlers and OpenAPI document
pub mod error; // HTTP error mapping
pub mod model; // Configuration, application state, response envelopes
pub mod startup; // Logging, shutdown, and HTTP server setup

pub use model::app_state::AppState;
pub use model::config::{Cli, Configuration};
