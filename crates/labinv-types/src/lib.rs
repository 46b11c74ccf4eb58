//! Shared domain types for the lab inventory service.
//!
//! Chemicals, studies, user accounts, paging and import reports, plus the
//! error and configuration types used across the workspace.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod chemical;
pub mod config;
pub mod error;
pub mod import;
pub mod page;
pub mod study;
pub mod user;
