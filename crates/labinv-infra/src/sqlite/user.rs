//! SQLite user repository implementation.

use chrono::Utc;
use labinv_core::repository::user::UserRepository;
use labinv_types::error::RepositoryError;
use labinv_types::user::{NewUser, UserId, UserProfile, UserRole};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_err, write_err};

/// SQLite-backed implementation of `UserRepository`.
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by_id(
        db: &SqlitePool,
        id: UserId,
    ) -> Result<Option<UserProfile>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id.0)
            .fetch_optional(db)
            .await
            .map_err(query_err)?;
        row.map(|r| UserRow::from_row(&r).map_err(query_err)?.into_profile())
            .transpose()
    }
}

/// Internal row type for mapping SQLite rows to domain UserProfile.
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    phone_number: Option<String>,
    position: Option<String>,
    duration: i32,
    role: String,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            phone_number: row.try_get("phone_number")?,
            position: row.try_get("position")?,
            duration: row.try_get("duration")?,
            role: row.try_get("role")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_profile(self) -> Result<UserProfile, RepositoryError> {
        let role: UserRole = self.role.parse().map_err(RepositoryError::Query)?;
        Ok(UserProfile {
            id: UserId(self.id),
            username: self.username,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone_number: self.phone_number,
            position: self.position,
            duration: self.duration,
            role,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: &NewUser) -> Result<UserProfile, RepositoryError> {
        let now = format_datetime(&Utc::now());
        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, first_name, last_name, email, \
             phone_number, position, duration, role, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(&user.position)
        .bind(user.duration)
        .bind(user.role.to_string())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| write_err(e, || user.username.clone()))?;

        Self::fetch_one_by_id(&self.pool.writer, UserId(result.last_insert_rowid()))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<UserProfile>, RepositoryError> {
        Self::fetch_one_by_id(&self.pool.reader, id).await
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<UserProfile>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;
        row.map(|r| UserRow::from_row(&r).map_err(query_err)?.into_profile())
            .transpose()
    }

    async fn list(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY username")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;
        rows.iter()
            .map(|r| UserRow::from_row(r).map_err(query_err)?.into_profile())
            .collect()
    }

    async fn update(&self, user: &UserProfile) -> Result<UserProfile, RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET username = ?, password_hash = ?, first_name = ?, last_name = ?, \
             email = ?, phone_number = ?, position = ?, duration = ?, role = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(&user.position)
        .bind(user.duration)
        .bind(user.role.to_string())
        .bind(format_datetime(&Utc::now()))
        .bind(user.id.0)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| write_err(e, || user.username.clone()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Self::fetch_one_by_id(&self.pool.writer, user.id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::test_pool;

    fn new_user(username: &str, role: UserRole) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "$argon2id$fake".to_string(),
            first_name: Some("Jo".to_string()),
            last_name: None,
            email: Some(format!("{username}@lab.org")),
            phone_number: None,
            position: Some("Technician".to_string()),
            duration: 2,
            role,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let repo = SqliteUserRepository::new(test_pool().await);
        let created = repo.create(&new_user("jo", UserRole::User)).await.unwrap();
        assert_eq!(created.role, UserRole::User);
        assert_eq!(created.duration, 2);
        assert_eq!(created.password_hash, "$argon2id$fake");

        let by_name = repo.get_by_username("jo").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
        assert!(repo.get_by_username("JO").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let repo = SqliteUserRepository::new(test_pool().await);
        repo.create(&new_user("jo", UserRole::User)).await.unwrap();
        let err = repo.create(&new_user("jo", UserRole::Admin)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(name) if name == "jo"));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = SqliteUserRepository::new(test_pool().await);
        let mut user = repo.create(&new_user("jo", UserRole::User)).await.unwrap();
        user.role = UserRole::Admin;
        user.position = Some("Lead".to_string());
        let updated = repo.update(&user).await.unwrap();
        assert_eq!(updated.role, UserRole::Admin);
        assert_eq!(updated.position.as_deref(), Some("Lead"));

        repo.create(&new_user("amy", UserRole::User)).await.unwrap();
        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|u| u.username).collect();
        assert_eq!(names, vec!["amy", "jo"]);

        assert!(repo.delete(user.id).await.unwrap());
        assert!(!repo.delete(user.id).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
