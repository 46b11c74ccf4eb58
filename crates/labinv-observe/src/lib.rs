//! Observability for the lab inventory service: subscriber setup and
//! optional OpenTelemetry span export.

pub mod tracing_setup;
