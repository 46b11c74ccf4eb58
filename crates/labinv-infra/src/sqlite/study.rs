//! SQLite study repository implementation.

use chrono::Utc;
use labinv_core::repository::QrAssignment;
use labinv_core::repository::study::StudyRepository;
use labinv_types::error::RepositoryError;
use labinv_types::page::PageRequest;
use labinv_types::study::{Study, StudyFilter, StudyId, StudyInput, StudyStats, study_code_key};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_err, write_err};

const LIST_COLUMNS: &str = "id, study_code, document_codes, material_type, study_level, \
     risk_level, info, number_of_samples, object_of_study, responsible_person, status, qr_code, \
     NULL AS qr_code_image, qr_code_generated_at, created_at, created_by, updated_at, updated_by";

const INSERT_SQL: &str = "INSERT INTO studies (study_code, study_code_key, document_codes, \
     material_type, study_level, risk_level, info, number_of_samples, object_of_study, \
     responsible_person, status, created_at, created_by, updated_at, updated_by) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// SQLite-backed implementation of `StudyRepository`.
pub struct SqliteStudyRepository {
    pool: DatabasePool,
}

impl SqliteStudyRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by_id(db: &SqlitePool, id: StudyId) -> Result<Option<Study>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM studies WHERE id = ?")
            .bind(id.0)
            .fetch_optional(db)
            .await
            .map_err(query_err)?;
        row.map(|r| StudyRow::from_row(&r).map_err(query_err)?.into_study())
            .transpose()
    }

    async fn reload(&self, id: StudyId) -> Result<Study, RepositoryError> {
        Self::fetch_one_by_id(&self.pool.writer, id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}

/// Internal row type for mapping SQLite rows to domain Study.
struct StudyRow {
    id: i64,
    study_code: String,
    document_codes: Option<String>,
    material_type: Option<String>,
    study_level: Option<String>,
    risk_level: Option<String>,
    info: Option<String>,
    number_of_samples: Option<String>,
    object_of_study: Option<String>,
    responsible_person: Option<String>,
    status: Option<String>,
    qr_code: Option<String>,
    qr_code_image: Option<Vec<u8>>,
    qr_code_generated_at: Option<String>,
    created_at: String,
    created_by: Option<String>,
    updated_at: String,
    updated_by: Option<String>,
}

impl StudyRow {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            study_code: row.try_get("study_code")?,
            document_codes: row.try_get("document_codes")?,
            material_type: row.try_get("material_type")?,
            study_level: row.try_get("study_level")?,
            risk_level: row.try_get("risk_level")?,
            info: row.try_get("info")?,
            number_of_samples: row.try_get("number_of_samples")?,
            object_of_study: row.try_get("object_of_study")?,
            responsible_person: row.try_get("responsible_person")?,
            status: row.try_get("status")?,
            qr_code: row.try_get("qr_code")?,
            qr_code_image: row.try_get("qr_code_image")?,
            qr_code_generated_at: row.try_get("qr_code_generated_at")?,
            created_at: row.try_get("created_at")?,
            created_by: row.try_get("created_by")?,
            updated_at: row.try_get("updated_at")?,
            updated_by: row.try_get("updated_by")?,
        })
    }

    fn into_study(self) -> Result<Study, RepositoryError> {
        Ok(Study {
            id: StudyId(self.id),
            study_code: self.study_code,
            document_codes: self.document_codes,
            material_type: self.material_type,
            study_level: self.study_level,
            risk_level: self.risk_level,
            info: self.info,
            number_of_samples: self.number_of_samples,
            object_of_study: self.object_of_study,
            responsible_person: self.responsible_person,
            status: self.status,
            qr_code: self.qr_code,
            qr_code_image: self.qr_code_image,
            qr_code_generated_at: self
                .qr_code_generated_at
                .as_deref()
                .map(parse_datetime)
                .transpose()?,
            created_at: parse_datetime(&self.created_at)?,
            created_by: self.created_by,
            updated_at: parse_datetime(&self.updated_at)?,
            updated_by: self.updated_by,
        })
    }
}

fn bind_input<'q>(query: SqliteQuery<'q>, input: &'q StudyInput) -> SqliteQuery<'q> {
    query
        .bind(&input.study_code)
        .bind(input.key())
        .bind(&input.document_codes)
        .bind(&input.material_type)
        .bind(&input.study_level)
        .bind(&input.risk_level)
        .bind(&input.info)
        .bind(&input.number_of_samples)
        .bind(&input.object_of_study)
        .bind(&input.responsible_person)
        .bind(&input.status)
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &StudyFilter) {
    qb.push(" WHERE 1 = 1");
    let substring = [
        ("status", &filter.status),
        ("responsible_person", &filter.responsible_person),
        ("study_code", &filter.study_code),
    ];
    for (column, value) in substring {
        if let Some(value) = value {
            qb.push(format!(" AND instr(lower({column}), lower("))
                .push_bind(value.clone())
                .push(")) > 0");
        }
    }
    if let Some(risk) = &filter.risk_level {
        qb.push(" AND lower(trim(risk_level)) = lower(")
            .push_bind(risk.trim().to_string())
            .push(")");
    }
}

fn map_rows(rows: &[SqliteRow]) -> Result<Vec<Study>, RepositoryError> {
    rows.iter()
        .map(|r| StudyRow::from_row(r).map_err(query_err)?.into_study())
        .collect()
}

impl StudyRepository for SqliteStudyRepository {
    async fn create(
        &self,
        input: &StudyInput,
        created_by: Option<&str>,
    ) -> Result<Study, RepositoryError> {
        let now = format_datetime(&Utc::now());
        let result = bind_input(sqlx::query(INSERT_SQL), input)
            .bind(&now)
            .bind(created_by)
            .bind(&now)
            .bind(created_by)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| write_err(e, || input.study_code.clone()))?;

        self.reload(StudyId(result.last_insert_rowid())).await
    }

    async fn create_many(
        &self,
        inputs: &[StudyInput],
        created_by: Option<&str>,
    ) -> Result<usize, RepositoryError> {
        let now = format_datetime(&Utc::now());
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;
        for input in inputs {
            bind_input(sqlx::query(INSERT_SQL), input)
                .bind(&now)
                .bind(created_by)
                .bind(&now)
                .bind(created_by)
                .execute(&mut *tx)
                .await
                .map_err(|e| write_err(e, || input.study_code.clone()))?;
        }
        tx.commit().await.map_err(query_err)?;
        Ok(inputs.len())
    }

    async fn get_by_id(&self, id: StudyId) -> Result<Option<Study>, RepositoryError> {
        Self::fetch_one_by_id(&self.pool.reader, id).await
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Study>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM studies WHERE study_code_key = ?")
            .bind(study_code_key(code))
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;
        row.map(|r| StudyRow::from_row(&r).map_err(query_err)?.into_study())
            .transpose()
    }

    async fn get_by_qr_code(&self, code: &str) -> Result<Option<Study>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM studies WHERE qr_code = ?")
            .bind(code)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;
        row.map(|r| StudyRow::from_row(&r).map_err(query_err)?.into_study())
            .transpose()
    }

    async fn list(&self, filter: &StudyFilter) -> Result<Vec<Study>, RepositoryError> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {LIST_COLUMNS} FROM studies"));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY study_code COLLATE NOCASE");
        let rows = qb
            .build()
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;
        map_rows(&rows)
    }

    async fn list_page(
        &self,
        filter: &StudyFilter,
        page: PageRequest,
    ) -> Result<(Vec<Study>, i64), RepositoryError> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM studies");
        push_filter(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {LIST_COLUMNS} FROM studies"));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY study_code COLLATE NOCASE LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = qb
            .build()
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;
        Ok((map_rows(&rows)?, total))
    }

    async fn update(
        &self,
        id: StudyId,
        input: &StudyInput,
        updated_by: Option<&str>,
    ) -> Result<Study, RepositoryError> {
        let now = format_datetime(&Utc::now());
        let result = bind_input(
            sqlx::query(
                "UPDATE studies SET study_code = ?, study_code_key = ?, document_codes = ?, material_type = ?, \
                 study_level = ?, risk_level = ?, info = ?, number_of_samples = ?, \
                 object_of_study = ?, responsible_person = ?, status = ?, updated_at = ?, \
                 updated_by = ? WHERE id = ?",
            ),
            input,
        )
        .bind(&now)
        .bind(updated_by)
        .bind(id.0)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| write_err(e, || input.study_code.clone()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.reload(id).await
    }

    async fn delete(&self, id: StudyId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM studies WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM studies")
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;
        Ok(result.rows_affected())
    }

    async fn set_qr_code(&self, id: StudyId, qr: &QrAssignment) -> Result<Study, RepositoryError> {
        let result = sqlx::query(
            "UPDATE studies SET qr_code = ?, qr_code_image = ?, qr_code_generated_at = ? WHERE id = ?",
        )
        .bind(&qr.code)
        .bind(&qr.image)
        .bind(format_datetime(&qr.generated_at))
        .bind(id.0)
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.reload(id).await
    }

    async fn clear_qr_code(&self, id: StudyId) -> Result<Study, RepositoryError> {
        let result = sqlx::query(
            "UPDATE studies SET qr_code = NULL, qr_code_image = NULL, qr_code_generated_at = NULL WHERE id = ?",
        )
        .bind(id.0)
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.reload(id).await
    }

    async fn stats(&self) -> Result<StudyStats, RepositoryError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total, \
             COALESCE(SUM(lower(trim(status)) = 'completed'), 0) AS completed, \
             COALESCE(SUM(lower(trim(status)) = 'in progress'), 0) AS in_progress, \
             COALESCE(SUM(lower(trim(status)) = 'pending'), 0) AS pending, \
             COALESCE(SUM(lower(trim(risk_level)) = 'high'), 0) AS high_risk, \
             COALESCE(SUM(lower(trim(risk_level)) = 'medium'), 0) AS medium_risk, \
             COALESCE(SUM(lower(trim(risk_level)) = 'low'), 0) AS low_risk \
             FROM studies",
        )
        .fetch_one(&self.pool.reader)
        .await
        .map_err(query_err)?;

        Ok(StudyStats {
            total: row.try_get("total").map_err(query_err)?,
            completed: row.try_get("completed").map_err(query_err)?,
            in_progress: row.try_get("in_progress").map_err(query_err)?,
            pending: row.try_get("pending").map_err(query_err)?,
            high_risk: row.try_get("high_risk").map_err(query_err)?,
            medium_risk: row.try_get("medium_risk").map_err(query_err)?,
            low_risk: row.try_get("low_risk").map_err(query_err)?,
        })
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM studies")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::test_pool;

    fn input(code: &str, status: &str, risk: &str) -> StudyInput {
        StudyInput {
            study_code: code.to_string(),
            status: Some(status.to_string()),
            risk_level: Some(risk.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_records_audit_fields() {
        let repo = SqliteStudyRepository::new(test_pool().await);
        let study = repo
            .create(&input("RA-001", "Pending", "High"), Some("alice"))
            .await
            .unwrap();
        assert_eq!(study.created_by.as_deref(), Some("alice"));
        assert_eq!(study.updated_by.as_deref(), Some("alice"));

        let updated = repo
            .update(study.id, &input("RA-001", "Completed", "High"), Some("bob"))
            .await
            .unwrap();
        assert_eq!(updated.created_by.as_deref(), Some("alice"));
        assert_eq!(updated.updated_by.as_deref(), Some("bob"));
        assert_eq!(updated.status.as_deref(), Some("Completed"));
    }

    #[tokio::test]
    async fn test_code_unique_case_insensitive() {
        let repo = SqliteStudyRepository::new(test_pool().await);
        repo.create(&input("RA-001", "Pending", "Low"), None).await.unwrap();
        let err = repo
            .create(&input("ra-001", "Pending", "Low"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert!(repo.get_by_code("ra-001").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_code_uniqueness_folds_non_ascii_case() {
        let repo = SqliteStudyRepository::new(test_pool().await);
        let created = repo
            .create(&input("ÉTUDE-1", "Pending", "Low"), None)
            .await
            .unwrap();

        let found = repo.get_by_code("étude-1").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);

        let err = repo
            .create(&input("étude-1", "Pending", "Low"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(code) if code == "étude-1"));
    }

    #[tokio::test]
    async fn test_filters_and_stats() {
        let repo = SqliteStudyRepository::new(test_pool().await);
        let batch = vec![
            input("RA-001", "Completed", "High"),
            input("RA-002", " in progress ", "medium"),
            input("RA-003", "Pending", "Low"),
            input("RA-004", "Pending", "HIGH"),
        ];
        assert_eq!(repo.create_many(&batch, Some("import")).await.unwrap(), 4);

        let high = StudyFilter {
            risk_level: Some("high".to_string()),
            ..Default::default()
        };
        let codes: Vec<String> = repo
            .list(&high)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.study_code)
            .collect();
        assert_eq!(codes, vec!["RA-001", "RA-004"]);

        let pending = StudyFilter {
            status: Some("pend".to_string()),
            ..Default::default()
        };
        let (rows, total) = repo
            .list_page(&pending, PageRequest::new(Some(1), Some(1), 10))
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(rows.len(), 1);

        let stats = repo.stats().await.unwrap();
        assert_eq!(
            stats,
            StudyStats {
                total: 4,
                completed: 1,
                in_progress: 1,
                pending: 2,
                high_risk: 2,
                medium_risk: 1,
                low_risk: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_stats_on_empty_table() {
        let repo = SqliteStudyRepository::new(test_pool().await);
        assert_eq!(repo.stats().await.unwrap(), StudyStats::default());
    }

    #[tokio::test]
    async fn test_qr_set_and_clear() {
        let repo = SqliteStudyRepository::new(test_pool().await);
        let study = repo.create(&input("RA-9", "Pending", "Low"), None).await.unwrap();
        let qr = QrAssignment {
            code: "qr-9".to_string(),
            image: vec![1, 2, 3],
            generated_at: Utc::now(),
        };
        let with_qr = repo.set_qr_code(study.id, &qr).await.unwrap();
        assert_eq!(with_qr.qr_code.as_deref(), Some("qr-9"));
        assert!(repo.get_by_qr_code("qr-9").await.unwrap().is_some());

        let cleared = repo.clear_qr_code(study.id).await.unwrap();
        assert!(cleared.qr_code.is_none());
        assert!(cleared.qr_code_image.is_none());
        assert!(repo.get_by_qr_code("qr-9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_all() {
        let repo = SqliteStudyRepository::new(test_pool().await);
        let batch = vec![input("A", "Pending", "Low"), input("B", "Pending", "Low")];
        repo.create_many(&batch, None).await.unwrap();
        assert_eq!(repo.delete_all().await.unwrap(), 2);
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
