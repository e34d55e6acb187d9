//! Infrastructure: HTTP surfaces, telemetry, and their error types.

pub mod error;
pub mod http;
pub mod telemetry;
