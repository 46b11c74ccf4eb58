//! Business logic and repository trait definitions for the lab inventory.
//!
//! This crate defines the "ports" (repository, hashing, token and QR traits)
//! that the infrastructure layer implements, the services built on them,
//! and the CSV import/export engine. It depends only on `labinv-types` --
//! never on `labinv-infra` or any database/IO crate.

pub mod repository;
pub mod service;
pub mod tabular;
