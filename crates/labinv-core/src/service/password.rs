//! PasswordHasher trait for storing and checking user passwords.
//!
//! Defined in labinv-core so services can hash passwords without coupling
//! to a specific algorithm. The `Argon2PasswordHasher` adapter lives in
//! labinv-infra.

/// Abstraction over one-way password hashing.
pub trait PasswordHasher: Send + Sync {
    /// Hash `password` into a self-describing string (salt included).
    fn hash(&self, password: &str) -> Result<String, String>;

    /// Check `password` against a hash produced by [`PasswordHasher::hash`].
    fn verify(&self, password: &str, hash: &str) -> bool;
}
