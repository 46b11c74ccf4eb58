//! User account service: registration, admin management, password checks.

use labinv_types::error::{AuthError, RepositoryError, UserError};
use labinv_types::user::{
    ADMIN_USERNAME, MIN_PASSWORD_LEN, NewUser, RegisterRequest, UpdateUserRequest, UserId,
    UserProfile, UserRole,
};
use uuid::Uuid;

use crate::repository::user::UserRepository;
use crate::service::password::PasswordHasher;
use crate::service::tidy;

/// Position given to self-registered users that do not state one.
const DEFAULT_POSITION: &str = "User";

/// Service for user accounts.
pub struct UserService<R: UserRepository, H: PasswordHasher> {
    repo: R,
    hasher: H,
}

fn storage_err(e: RepositoryError) -> UserError {
    match e {
        RepositoryError::NotFound => UserError::NotFound,
        RepositoryError::Conflict(name) => UserError::UsernameTaken(name),
        other => UserError::StorageError(other.to_string()),
    }
}

pub fn validate_password(password: &str) -> Result<(), UserError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(UserError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_email(email: &Option<String>) -> Result<(), UserError> {
    match email {
        Some(e) if !e.contains('@') => Err(UserError::Validation(
            "email must contain '@'".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Check the shape of a registration: username present, password long
/// enough, email (when given) containing `@`.
pub fn validate_registration(request: &RegisterRequest) -> Result<(), UserError> {
    if request.username.trim().is_empty() {
        return Err(UserError::Validation("username is required".to_string()));
    }
    validate_password(&request.password)?;
    validate_email(&tidy(request.email.clone()))
}

impl<R: UserRepository, H: PasswordHasher> UserService<R, H> {
    pub fn new(repo: R, hasher: H) -> Self {
        Self { repo, hasher }
    }

    fn hash(&self, password: &str) -> Result<String, UserError> {
        self.hasher.hash(password).map_err(UserError::Hashing)
    }

    async fn insert(&self, request: RegisterRequest, role: UserRole) -> Result<UserProfile, UserError> {
        validate_registration(&request)?;
        let username = request.username.trim().to_string();
        if self
            .repo
            .get_by_username(&username)
            .await
            .map_err(storage_err)?
            .is_some()
        {
            return Err(UserError::UsernameTaken(username));
        }

        let user = NewUser {
            password_hash: self.hash(&request.password)?,
            username,
            first_name: tidy(request.first_name),
            last_name: tidy(request.last_name),
            email: tidy(request.email),
            phone_number: tidy(request.phone_number),
            position: tidy(request.position),
            duration: request.duration.unwrap_or(0),
            role,
        };
        let created = self.repo.create(&user).await.map_err(storage_err)?;
        tracing::info!(username = %created.username, role = %created.role, "user created");
        Ok(created)
    }

    /// Self-registration. The account always gets the USER role.
    pub async fn register(&self, mut request: RegisterRequest) -> Result<UserProfile, UserError> {
        if tidy(request.position.clone()).is_none() {
            request.position = Some(DEFAULT_POSITION.to_string());
        }
        self.insert(request, UserRole::User).await
    }

    /// Admin-side creation; the role is taken from the request.
    pub async fn create_user(&self, request: RegisterRequest) -> Result<UserProfile, UserError> {
        let role = request
            .role
            .as_deref()
            .map(UserRole::parse_lenient)
            .unwrap_or_default();
        self.insert(request, role).await
    }

    pub async fn list(&self) -> Result<Vec<UserProfile>, UserError> {
        self.repo.list().await.map_err(storage_err)
    }

    pub async fn get(&self, id: UserId) -> Result<UserProfile, UserError> {
        self.repo
            .get_by_id(id)
            .await
            .map_err(storage_err)?
            .ok_or(UserError::NotFound)
    }

    pub async fn get_by_username(&self, username: &str) -> Result<UserProfile, UserError> {
        self.repo
            .get_by_username(username)
            .await
            .map_err(storage_err)?
            .ok_or(UserError::NotFound)
    }

    /// Apply an admin update. Absent fields are kept; the password changes
    /// only when a non-blank one is supplied.
    pub async fn update(
        &self,
        id: UserId,
        request: UpdateUserRequest,
    ) -> Result<UserProfile, UserError> {
        let mut user = self.get(id).await?;

        if let Some(username) = tidy(request.username) {
            if username != user.username {
                if self
                    .repo
                    .get_by_username(&username)
                    .await
                    .map_err(storage_err)?
                    .is_some()
                {
                    return Err(UserError::UsernameTaken(username));
                }
                user.username = username;
            }
        }
        if let Some(password) = request.password.filter(|p| !p.trim().is_empty()) {
            validate_password(&password)?;
            user.password_hash = self.hash(&password)?;
        }
        if let Some(email) = tidy(request.email) {
            validate_email(&Some(email.clone()))?;
            user.email = Some(email);
        }
        if let Some(v) = tidy(request.first_name) {
            user.first_name = Some(v);
        }
        if let Some(v) = tidy(request.last_name) {
            user.last_name = Some(v);
        }
        if let Some(v) = tidy(request.phone_number) {
            user.phone_number = Some(v);
        }
        if let Some(v) = tidy(request.position) {
            user.position = Some(v);
        }
        if let Some(duration) = request.duration {
            user.duration = duration;
        }
        if let Some(role) = request.role.as_deref() {
            user.role = UserRole::parse_lenient(role);
        }

        let updated = self.repo.update(&user).await.map_err(storage_err)?;
        tracing::info!(id = %id, username = %updated.username, "user updated");
        Ok(updated)
    }

    /// Delete a user. The built-in `admin` account is protected.
    pub async fn delete(&self, id: UserId) -> Result<(), UserError> {
        let user = self.get(id).await?;
        if user.username == ADMIN_USERNAME {
            return Err(UserError::Protected(user.username));
        }
        if !self.repo.delete(id).await.map_err(storage_err)? {
            return Err(UserError::NotFound);
        }
        tracing::info!(id = %id, username = %user.username, "user deleted");
        Ok(())
    }

    pub async fn reset_password(&self, id: UserId, new_password: &str) -> Result<(), UserError> {
        validate_password(new_password)?;
        let mut user = self.get(id).await?;
        user.password_hash = self.hash(new_password)?;
        self.repo.update(&user).await.map_err(storage_err)?;
        tracing::info!(id = %id, "password reset");
        Ok(())
    }

    /// Check credentials. Unknown users and wrong passwords are
    /// indistinguishable to the caller.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<UserProfile, AuthError> {
        let user = self
            .repo
            .get_by_username(username.trim())
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;
        match user {
            Some(user) if self.hasher.verify(password, &user.password_hash) => Ok(user),
            _ => {
                tracing::debug!(username, "rejected login");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Create the `admin` account if it does not exist yet.
    ///
    /// Returns the generated password when none was configured, so the
    /// caller can show it once.
    pub async fn ensure_admin(&self, password: Option<&str>) -> Result<Option<String>, UserError> {
        if self
            .repo
            .get_by_username(ADMIN_USERNAME)
            .await
            .map_err(storage_err)?
            .is_some()
        {
            return Ok(None);
        }

        let (password, generated) = match password.filter(|p| !p.trim().is_empty()) {
            Some(p) => (p.to_string(), false),
            None => (Uuid::new_v4().simple().to_string()[..16].to_string(), true),
        };
        self.insert(
            RegisterRequest {
                username: ADMIN_USERNAME.to_string(),
                password: password.clone(),
                position: Some("Administrator".to_string()),
                ..Default::default()
            },
            UserRole::Admin,
        )
        .await?;
        tracing::info!("bootstrap admin account created");
        Ok(generated.then_some(password))
    }

    pub async fn count(&self) -> Result<i64, UserError> {
        self.repo.count().await.map_err(storage_err)
    }
}
