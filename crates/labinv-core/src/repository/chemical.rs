//! Chemical repository trait definition.

use labinv_types::chemical::{Chemical, ChemicalFilter, ChemicalId, ChemicalInput};
use labinv_types::error::RepositoryError;
use labinv_types::page::PageRequest;

use super::QrAssignment;

/// Repository trait for chemical persistence.
///
/// Name lookups are case-insensitive. Uses native async fn in traits
/// (Rust 2024 edition, no async_trait macro).
pub trait ChemicalRepository: Send + Sync {
    /// Insert a chemical. Returns `Conflict` when the name is taken.
    fn create(
        &self,
        input: &ChemicalInput,
    ) -> impl std::future::Future<Output = Result<Chemical, RepositoryError>> + Send;

    /// Insert many chemicals in one transaction. Returns the number inserted.
    fn create_many(
        &self,
        inputs: &[ChemicalInput],
    ) -> impl std::future::Future<Output = Result<usize, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: ChemicalId,
    ) -> impl std::future::Future<Output = Result<Option<Chemical>, RepositoryError>> + Send;

    fn get_by_name(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<Chemical>, RepositoryError>> + Send;

    fn get_by_qr_code(
        &self,
        code: &str,
    ) -> impl std::future::Future<Output = Result<Option<Chemical>, RepositoryError>> + Send;

    /// All chemicals ordered by name.
    fn list_all(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Chemical>, RepositoryError>> + Send;

    /// Chemicals whose CAS number matches exactly (trimmed, case-insensitive).
    fn find_by_cas_no(
        &self,
        cas_no: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Chemical>, RepositoryError>> + Send;

    /// One page of chemicals matching the filter, plus the total match count.
    fn list_page(
        &self,
        filter: &ChemicalFilter,
        page: PageRequest,
    ) -> impl std::future::Future<Output = Result<(Vec<Chemical>, i64), RepositoryError>> + Send;

    /// Overwrite all mutable fields. `NotFound` if the id does not exist,
    /// `Conflict` if the new name collides with another chemical.
    fn update(
        &self,
        id: ChemicalId,
        input: &ChemicalInput,
    ) -> impl std::future::Future<Output = Result<Chemical, RepositoryError>> + Send;

    /// Returns whether a row was deleted.
    fn delete(
        &self,
        id: ChemicalId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    fn set_qr_code(
        &self,
        id: ChemicalId,
        qr: &QrAssignment,
    ) -> impl std::future::Future<Output = Result<Chemical, RepositoryError>> + Send;

    fn count(&self) -> impl std::future::Future<Output = Result<i64, RepositoryError>> + Send;
}
