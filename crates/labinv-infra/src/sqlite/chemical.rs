//! SQLite chemical repository implementation.
//!
//! Implements `ChemicalRepository` from `labinv-core` using sqlx with split
//! read/write pools. Name uniqueness and name lookups go through the
//! `name_key` column, which holds the Unicode-lowercased trimmed name.

use chrono::Utc;
use labinv_core::repository::QrAssignment;
use labinv_core::repository::chemical::ChemicalRepository;
use labinv_types::chemical::{Chemical, ChemicalFilter, ChemicalId, ChemicalInput, name_key};
use labinv_types::error::RepositoryError;
use labinv_types::page::PageRequest;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use super::pool::DatabasePool;
use super::{format_date, format_datetime, parse_date, parse_datetime, query_err, write_err};

/// Columns for listings. The QR image is left out; it is only loaded by
/// single-row lookups.
const LIST_COLUMNS: &str = "id, name, cas_no, lot_no, producer, storage, quantity, toxic_state, \
     responsible, order_date, weight, qr_code, NULL AS qr_code_image, qr_code_generated_at, \
     created_at, updated_at";

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// SQLite-backed implementation of `ChemicalRepository`.
pub struct SqliteChemicalRepository {
    pool: DatabasePool,
}

impl SqliteChemicalRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by_id(
        db: &SqlitePool,
        id: ChemicalId,
    ) -> Result<Option<Chemical>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chemicals WHERE id = ?")
            .bind(id.0)
            .fetch_optional(db)
            .await
            .map_err(query_err)?;
        row.map(|r| ChemicalRow::from_row(&r).map_err(query_err)?.into_chemical())
            .transpose()
    }

    async fn fetch_optional(
        &self,
        sql: &str,
        value: &str,
    ) -> Result<Option<Chemical>, RepositoryError> {
        let row = sqlx::query(sql)
            .bind(value)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;
        row.map(|r| ChemicalRow::from_row(&r).map_err(query_err)?.into_chemical())
            .transpose()
    }
}

/// Internal row type for mapping SQLite rows to domain Chemical.
struct ChemicalRow {
    id: i64,
    name: String,
    cas_no: Option<String>,
    lot_no: Option<String>,
    producer: Option<String>,
    storage: String,
    quantity: Option<i32>,
    toxic_state: Option<bool>,
    responsible: Option<String>,
    order_date: Option<String>,
    weight: Option<String>,
    qr_code: Option<String>,
    qr_code_image: Option<Vec<u8>>,
    qr_code_generated_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ChemicalRow {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            cas_no: row.try_get("cas_no")?,
            lot_no: row.try_get("lot_no")?,
            producer: row.try_get("producer")?,
            storage: row.try_get("storage")?,
            quantity: row.try_get("quantity")?,
            toxic_state: row.try_get("toxic_state")?,
            responsible: row.try_get("responsible")?,
            order_date: row.try_get("order_date")?,
            weight: row.try_get("weight")?,
            qr_code: row.try_get("qr_code")?,
            qr_code_image: row.try_get("qr_code_image")?,
            qr_code_generated_at: row.try_get("qr_code_generated_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_chemical(self) -> Result<Chemical, RepositoryError> {
        Ok(Chemical {
            id: ChemicalId(self.id),
            name: self.name,
            cas_no: self.cas_no,
            lot_no: self.lot_no,
            producer: self.producer,
            storage: self.storage,
            quantity: self.quantity,
            toxic_state: self.toxic_state,
            responsible: self.responsible,
            order_date: self.order_date.as_deref().map(parse_date).transpose()?,
            weight: self.weight,
            qr_code: self.qr_code,
            qr_code_image: self.qr_code_image,
            qr_code_generated_at: self
                .qr_code_generated_at
                .as_deref()
                .map(parse_datetime)
                .transpose()?,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

/// Bind the name, its key and the nine other mutable columns in table order.
fn bind_input<'q>(query: SqliteQuery<'q>, input: &'q ChemicalInput) -> SqliteQuery<'q> {
    query
        .bind(&input.name)
        .bind(input.key())
        .bind(&input.cas_no)
        .bind(&input.lot_no)
        .bind(&input.producer)
        .bind(&input.storage)
        .bind(input.quantity)
        .bind(input.toxic_state)
        .bind(&input.responsible)
        .bind(input.order_date.as_ref().map(format_date))
        .bind(&input.weight)
}

const INSERT_SQL: &str = "INSERT INTO chemicals (name, name_key, cas_no, lot_no, producer, storage, \
     quantity, toxic_state, responsible, order_date, weight, created_at, updated_at) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ChemicalFilter) {
    qb.push(" WHERE 1 = 1");
    let substring = [
        ("name", &filter.name),
        ("storage", &filter.storage),
        ("responsible", &filter.responsible),
    ];
    for (column, value) in substring {
        if let Some(value) = value {
            qb.push(format!(" AND instr(lower({column}), lower("))
                .push_bind(value.clone())
                .push(")) > 0");
        }
    }
    if filter.toxic_only {
        qb.push(" AND toxic_state = 1");
    }
}

impl ChemicalRepository for SqliteChemicalRepository {
    async fn create(&self, input: &ChemicalInput) -> Result<Chemical, RepositoryError> {
        let now = format_datetime(&Utc::now());
        let result = bind_input(sqlx::query(INSERT_SQL), input)
            .bind(&now)
            .bind(&now)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| write_err(e, || input.name.clone()))?;

        let id = ChemicalId(result.last_insert_rowid());
        Self::fetch_one_by_id(&self.pool.writer, id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn create_many(&self, inputs: &[ChemicalInput]) -> Result<usize, RepositoryError> {
        let now = format_datetime(&Utc::now());
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;
        for input in inputs {
            bind_input(sqlx::query(INSERT_SQL), input)
                .bind(&now)
                .bind(&now)
                .execute(&mut *tx)
                .await
                .map_err(|e| write_err(e, || input.name.clone()))?;
        }
        tx.commit().await.map_err(query_err)?;
        Ok(inputs.len())
    }

    async fn get_by_id(&self, id: ChemicalId) -> Result<Option<Chemical>, RepositoryError> {
        Self::fetch_one_by_id(&self.pool.reader, id).await
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Chemical>, RepositoryError> {
        self.fetch_optional("SELECT * FROM chemicals WHERE name_key = ?", &name_key(name))
            .await
    }

    async fn get_by_qr_code(&self, code: &str) -> Result<Option<Chemical>, RepositoryError> {
        self.fetch_optional("SELECT * FROM chemicals WHERE qr_code = ?", code)
            .await
    }

    async fn list_all(&self) -> Result<Vec<Chemical>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {LIST_COLUMNS} FROM chemicals ORDER BY name COLLATE NOCASE"
        ))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;
        rows.iter()
            .map(|r| ChemicalRow::from_row(r).map_err(query_err)?.into_chemical())
            .collect()
    }

    async fn find_by_cas_no(&self, cas_no: &str) -> Result<Vec<Chemical>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {LIST_COLUMNS} FROM chemicals WHERE lower(trim(cas_no)) = lower(?) ORDER BY name COLLATE NOCASE"
        ))
        .bind(cas_no.trim())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;
        rows.iter()
            .map(|r| ChemicalRow::from_row(r).map_err(query_err)?.into_chemical())
            .collect()
    }

    async fn list_page(
        &self,
        filter: &ChemicalFilter,
        page: PageRequest,
    ) -> Result<(Vec<Chemical>, i64), RepositoryError> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM chemicals");
        push_filter(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {LIST_COLUMNS} FROM chemicals"));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY name COLLATE NOCASE LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = qb
            .build()
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;
        let chemicals = rows
            .iter()
            .map(|r| ChemicalRow::from_row(r).map_err(query_err)?.into_chemical())
            .collect::<Result<Vec<_>, _>>()?;
        Ok((chemicals, total))
    }

    async fn update(
        &self,
        id: ChemicalId,
        input: &ChemicalInput,
    ) -> Result<Chemical, RepositoryError> {
        let now = format_datetime(&Utc::now());
        let result = bind_input(
            sqlx::query(
                "UPDATE chemicals SET name = ?, name_key = ?, cas_no = ?, lot_no = ?, producer = ?, storage = ?, \
                 quantity = ?, toxic_state = ?, responsible = ?, order_date = ?, weight = ?, \
                 updated_at = ? WHERE id = ?",
            ),
            input,
        )
        .bind(&now)
        .bind(id.0)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| write_err(e, || input.name.clone()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Self::fetch_one_by_id(&self.pool.writer, id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: ChemicalId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM chemicals WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_qr_code(
        &self,
        id: ChemicalId,
        qr: &QrAssignment,
    ) -> Result<Chemical, RepositoryError> {
        let result = sqlx::query(
            "UPDATE chemicals SET qr_code = ?, qr_code_image = ?, qr_code_generated_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&qr.code)
        .bind(&qr.image)
        .bind(format_datetime(&qr.generated_at))
        .bind(format_datetime(&Utc::now()))
        .bind(id.0)
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Self::fetch_one_by_id(&self.pool.writer, id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM chemicals")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_err)
    }
}
