//! User account repository trait definition.

use labinv_types::error::RepositoryError;
use labinv_types::user::{NewUser, UserId, UserProfile};

/// Repository trait for user accounts. Usernames are case-sensitive.
pub trait UserRepository: Send + Sync {
    /// Insert a user. Returns `Conflict` when the username is taken.
    fn create(
        &self,
        user: &NewUser,
    ) -> impl std::future::Future<Output = Result<UserProfile, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: UserId,
    ) -> impl std::future::Future<Output = Result<Option<UserProfile>, RepositoryError>> + Send;

    fn get_by_username(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Option<UserProfile>, RepositoryError>> + Send;

    /// All users ordered by username.
    fn list(&self)
    -> impl std::future::Future<Output = Result<Vec<UserProfile>, RepositoryError>> + Send;

    /// Persist every field of `user` including the password hash.
    fn update(
        &self,
        user: &UserProfile,
    ) -> impl std::future::Future<Output = Result<UserProfile, RepositoryError>> + Send;

    fn delete(
        &self,
        id: UserId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    fn count(&self) -> impl std::future::Future<Output = Result<i64, RepositoryError>> + Send;
}
