//! Infrastructure layer for the lab inventory service.
//!
//! Contains implementations of the ports defined in `labinv-core`: SQLite
//! repositories, Argon2 password hashing, HS256 tokens, PNG QR rendering,
//! and the `config.toml` loader.

pub mod config;
pub mod crypto;
pub mod qr;
pub mod sqlite;
