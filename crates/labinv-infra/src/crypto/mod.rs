//! Cryptographic operations for the lab inventory service.
//!
//! - `password`: Argon2id password hashing
//! - `token`: HS256 bearer tokens
//! - `key`: persisted token signing secret

pub mod key;
pub mod password;
pub mod token;
