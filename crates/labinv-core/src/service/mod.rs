//! Business logic services (use cases).
//!
//! Services orchestrate repository calls and business rules. They depend
//! on traits (ports) -- never on concrete infrastructure implementations.

pub mod auth;
pub mod chemical;
pub mod password;
pub mod qr;
pub mod study;
pub mod token;
pub mod user;

/// Trim an optional text field, mapping blank to `None`.
pub(crate) fn tidy(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
