//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! Services are generic over repository/renderer/hasher traits, but AppState
//! pins them to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use labinv_core::service::auth::AuthService;
use labinv_core::service::chemical::ChemicalService;
use labinv_core::service::qr::QrIssuer;
use labinv_core::service::study::StudyService;
use labinv_core::service::user::UserService;
use labinv_infra::config::{load_config, resolve_data_dir, resolve_jwt_secret};
use labinv_infra::crypto::password::Argon2PasswordHasher;
use labinv_infra::crypto::token::HmacTokenIssuer;
use labinv_infra::qr::PngQrRenderer;
use labinv_infra::sqlite::chemical::SqliteChemicalRepository;
use labinv_infra::sqlite::pool::{DatabasePool, database_url};
use labinv_infra::sqlite::study::SqliteStudyRepository;
use labinv_infra::sqlite::user::SqliteUserRepository;
use labinv_types::config::AppConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteChemicalService = ChemicalService<SqliteChemicalRepository, PngQrRenderer>;

pub type ConcreteStudyService = StudyService<SqliteStudyRepository, PngQrRenderer>;

pub type ConcreteUserService = UserService<SqliteUserRepository, Argon2PasswordHasher>;

pub type ConcreteAuthService =
    AuthService<SqliteUserRepository, Argon2PasswordHasher, HmacTokenIssuer>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub chemical_service: Arc<ConcreteChemicalService>,
    pub study_service: Arc<ConcreteStudyService>,
    pub user_service: Arc<ConcreteUserService>,
    pub auth_service: Arc<ConcreteAuthService>,
    pub config: Arc<AppConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state from the data directory: load
    /// `config.toml`, connect to the DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;
        let config = load_config(&data_dir).await;
        Self::with_config(data_dir, config).await
    }

    /// Wire services against `data_dir` using an already loaded config.
    pub async fn with_config(data_dir: PathBuf, config: AppConfig) -> anyhow::Result<Self> {
        let db_pool = DatabasePool::new(&database_url(&data_dir)).await?;
        let secret = resolve_jwt_secret(&config, &data_dir).await?;
        let base_url = config.server.normalized_base_url();

        let chemical_service = ChemicalService::new(
            SqliteChemicalRepository::new(db_pool.clone()),
            QrIssuer::new(PngQrRenderer, &base_url),
        );
        let study_service = StudyService::new(
            SqliteStudyRepository::new(db_pool.clone()),
            QrIssuer::new(PngQrRenderer, &base_url),
        );

        // The auth service shares the user service so logins and admin
        // edits go through the same repository and hasher.
        let user_service = Arc::new(UserService::new(
            SqliteUserRepository::new(db_pool.clone()),
            Argon2PasswordHasher::new(),
        ));
        let auth_service = AuthService::new(
            Arc::clone(&user_service),
            HmacTokenIssuer::new(&secret),
            config.auth.token_ttl_hours,
        );

        tracing::debug!(data_dir = %data_dir.display(), base_url, "application state ready");

        Ok(Self {
            chemical_service: Arc::new(chemical_service),
            study_service: Arc::new(study_service),
            user_service,
            auth_service: Arc::new(auth_service),
            config: Arc::new(config),
            data_dir,
        })
    }
}
