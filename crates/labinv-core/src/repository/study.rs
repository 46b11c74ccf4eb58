//! Study repository trait definition.

use labinv_types::error::RepositoryError;
use labinv_types::page::PageRequest;
use labinv_types::study::{Study, StudyFilter, StudyId, StudyInput, StudyStats};

use super::QrAssignment;

/// Repository trait for study persistence. Study codes compare
/// case-insensitively.
pub trait StudyRepository: Send + Sync {
    /// Insert a study. Returns `Conflict` when the code is taken.
    fn create(
        &self,
        input: &StudyInput,
        created_by: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Study, RepositoryError>> + Send;

    /// Insert many studies in one transaction. Returns the number inserted.
    fn create_many(
        &self,
        inputs: &[StudyInput],
        created_by: Option<&str>,
    ) -> impl std::future::Future<Output = Result<usize, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: StudyId,
    ) -> impl std::future::Future<Output = Result<Option<Study>, RepositoryError>> + Send;

    fn get_by_code(
        &self,
        code: &str,
    ) -> impl std::future::Future<Output = Result<Option<Study>, RepositoryError>> + Send;

    fn get_by_qr_code(
        &self,
        code: &str,
    ) -> impl std::future::Future<Output = Result<Option<Study>, RepositoryError>> + Send;

    /// Studies matching the filter, ordered by study code.
    fn list(
        &self,
        filter: &StudyFilter,
    ) -> impl std::future::Future<Output = Result<Vec<Study>, RepositoryError>> + Send;

    fn list_page(
        &self,
        filter: &StudyFilter,
        page: PageRequest,
    ) -> impl std::future::Future<Output = Result<(Vec<Study>, i64), RepositoryError>> + Send;

    fn update(
        &self,
        id: StudyId,
        input: &StudyInput,
        updated_by: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Study, RepositoryError>> + Send;

    fn delete(
        &self,
        id: StudyId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Delete every study. Returns the number removed.
    fn delete_all(&self) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    fn set_qr_code(
        &self,
        id: StudyId,
        qr: &QrAssignment,
    ) -> impl std::future::Future<Output = Result<Study, RepositoryError>> + Send;

    fn clear_qr_code(
        &self,
        id: StudyId,
    ) -> impl std::future::Future<Output = Result<Study, RepositoryError>> + Send;

    fn stats(&self) -> impl std::future::Future<Output = Result<StudyStats, RepositoryError>> + Send;

    fn count(&self) -> impl std::future::Future<Output = Result<i64, RepositoryError>> + Send;
}
