//! Bootstrap layer — modules that run before the service starts.
//!
//! - **logger** — tracing-subscriber initialisation.

pub mod logger;
