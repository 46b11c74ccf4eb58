//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (labinv-infra) implements. The core crate never depends on any
//! specific storage technology.

pub mod chemical;
pub mod study;
pub mod user;

/// A QR code ready to be stored alongside a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrAssignment {
    /// UUID identifier encoded in the URL.
    pub code: String,
    /// PNG bytes.
    pub image: Vec<u8>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}
