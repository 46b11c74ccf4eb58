//! Chemical inventory service.
//!
//! CRUD, lookups, QR codes and CSV import/export for chemicals. Creating a
//! chemical also issues its QR code; a rendering failure there is logged
//! and does not fail the create.

use chrono::Utc;
use labinv_types::chemical::{Chemical, ChemicalFilter, ChemicalId, ChemicalInput};
use labinv_types::error::{ChemicalError, CsvImportError, RepositoryError};
use labinv_types::import::ImportReport;
use labinv_types::page::{Page, PageRequest};

use crate::repository::chemical::ChemicalRepository;
use crate::service::qr::{QrIssuer, QrRenderer, QrTarget};
use crate::service::tidy;
use crate::tabular::export::{CsvDownload, CsvExport, export_file_name, write_csv};
use crate::tabular::reader::{ParsedCsv, parse_records};
use crate::tabular::Upload;

/// Service for the chemical inventory.
pub struct ChemicalService<R: ChemicalRepository, Q: QrRenderer> {
    repo: R,
    qr: QrIssuer<Q>,
}

fn storage_err(e: RepositoryError) -> ChemicalError {
    match e {
        RepositoryError::NotFound => ChemicalError::NotFound,
        RepositoryError::Conflict(name) => ChemicalError::DuplicateName(name),
        other => ChemicalError::StorageError(other.to_string()),
    }
}

/// Trim every field and require `name` and `storage`.
pub fn normalize_input(input: ChemicalInput) -> Result<ChemicalInput, ChemicalError> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(ChemicalError::Validation("name is required".to_string()));
    }
    let storage = input.storage.trim().to_string();
    if storage.is_empty() {
        return Err(ChemicalError::Validation("storage is required".to_string()));
    }
    Ok(ChemicalInput {
        name,
        cas_no: tidy(input.cas_no),
        lot_no: tidy(input.lot_no),
        producer: tidy(input.producer),
        storage,
        quantity: input.quantity,
        toxic_state: input.toxic_state,
        responsible: tidy(input.responsible),
        order_date: input.order_date,
        weight: tidy(input.weight),
    })
}

impl<R: ChemicalRepository, Q: QrRenderer> ChemicalService<R, Q> {
    pub fn new(repo: R, qr: QrIssuer<Q>) -> Self {
        Self { repo, qr }
    }

    /// All chemicals ordered by name.
    pub async fn list_all(&self) -> Result<Vec<Chemical>, ChemicalError> {
        self.repo.list_all().await.map_err(storage_err)
    }

    pub async fn get(&self, id: ChemicalId) -> Result<Chemical, ChemicalError> {
        self.repo
            .get_by_id(id)
            .await
            .map_err(storage_err)?
            .ok_or(ChemicalError::NotFound)
    }

    /// Exact, case-insensitive name lookup.
    pub async fn find_by_name(&self, name: &str) -> Result<Chemical, ChemicalError> {
        self.repo
            .get_by_name(name.trim())
            .await
            .map_err(storage_err)?
            .ok_or(ChemicalError::NotFound)
    }

    pub async fn find_by_cas_no(&self, cas_no: &str) -> Result<Vec<Chemical>, ChemicalError> {
        let cas_no = cas_no.trim();
        if cas_no.is_empty() {
            return Err(ChemicalError::Validation("casNo is required".to_string()));
        }
        self.repo.find_by_cas_no(cas_no).await.map_err(storage_err)
    }

    /// Paged listing. Only the first non-blank of name, storage,
    /// responsible is applied.
    pub async fn filter(
        &self,
        filter: ChemicalFilter,
        page: PageRequest,
    ) -> Result<Page<Chemical>, ChemicalError> {
        let filter = ChemicalFilter {
            name: tidy(filter.name),
            storage: tidy(filter.storage),
            responsible: tidy(filter.responsible),
            toxic_only: filter.toxic_only,
        };
        let filter = if filter.name.is_some() {
            ChemicalFilter {
                storage: None,
                responsible: None,
                ..filter
            }
        } else if filter.storage.is_some() {
            ChemicalFilter {
                responsible: None,
                ..filter
            }
        } else {
            filter
        };
        let (content, total) = self
            .repo
            .list_page(&filter, page)
            .await
            .map_err(storage_err)?;
        Ok(Page::new(content, page, total))
    }

    /// Paged listing of chemicals flagged toxic.
    pub async fn toxic(&self, page: PageRequest) -> Result<Page<Chemical>, ChemicalError> {
        self.filter(
            ChemicalFilter {
                toxic_only: true,
                ..Default::default()
            },
            page,
        )
        .await
    }

    /// Create a chemical and issue its QR code.
    pub async fn create(&self, input: ChemicalInput) -> Result<Chemical, ChemicalError> {
        let input = normalize_input(input)?;
        if self.repo.get_by_name(&input.name).await.map_err(storage_err)?.is_some() {
            return Err(ChemicalError::DuplicateName(input.name));
        }
        let chemical = self.repo.create(&input).await.map_err(storage_err)?;
        tracing::info!(id = %chemical.id, name = %chemical.name, "chemical created");

        match self.generate_qr(chemical.id).await {
            Ok(with_qr) => Ok(with_qr),
            Err(e) => {
                tracing::warn!(id = %chemical.id, error = %e, "qr code generation failed");
                Ok(chemical)
            }
        }
    }

    /// Overwrite every mutable field of chemical `id`.
    pub async fn update(
        &self,
        id: ChemicalId,
        input: ChemicalInput,
    ) -> Result<Chemical, ChemicalError> {
        let input = normalize_input(input)?;
        if let Some(other) = self.repo.get_by_name(&input.name).await.map_err(storage_err)? {
            if other.id != id {
                return Err(ChemicalError::DuplicateName(input.name));
            }
        }
        let updated = self.repo.update(id, &input).await.map_err(storage_err)?;
        tracing::info!(id = %id, "chemical updated");
        Ok(updated)
    }

    /// Update the chemical whose name matches `input.name` (case-insensitive).
    pub async fn update_by_name(&self, input: ChemicalInput) -> Result<Chemical, ChemicalError> {
        let existing = self.find_by_name(&input.name).await?;
        self.update(existing.id, input).await
    }

    pub async fn delete(&self, id: ChemicalId) -> Result<(), ChemicalError> {
        if !self.repo.delete(id).await.map_err(storage_err)? {
            return Err(ChemicalError::NotFound);
        }
        tracing::info!(id = %id, "chemical deleted");
        Ok(())
    }

    pub async fn delete_by_name(&self, name: &str) -> Result<Chemical, ChemicalError> {
        let chemical = self.find_by_name(name).await?;
        self.delete(chemical.id).await?;
        Ok(chemical)
    }

    /// Issue a fresh QR code for chemical `id`, replacing any previous one.
    pub async fn generate_qr(&self, id: ChemicalId) -> Result<Chemical, ChemicalError> {
        let qr = self.qr.issue(QrTarget::Chemical)?;
        self.repo.set_qr_code(id, &qr).await.map_err(storage_err)
    }

    /// PNG of the chemical's QR code, generated first if missing.
    pub async fn qr_image(&self, id: ChemicalId) -> Result<Vec<u8>, ChemicalError> {
        let chemical = self.get(id).await?;
        if let Some(image) = chemical.qr_code_image {
            return Ok(image);
        }
        let chemical = self.generate_qr(id).await?;
        chemical
            .qr_code_image
            .ok_or_else(|| ChemicalError::StorageError("qr image was not stored".to_string()))
    }

    /// Detail page URL encoded in the chemical's QR code.
    pub fn qr_url(&self, code: &str) -> String {
        self.qr.url_for(QrTarget::Chemical, code)
    }

    pub async fn get_by_qr_code(&self, code: &str) -> Result<Chemical, ChemicalError> {
        self.repo
            .get_by_qr_code(code.trim())
            .await
            .map_err(storage_err)?
            .ok_or(ChemicalError::NotFound)
    }

    pub async fn count(&self) -> Result<i64, ChemicalError> {
        self.repo.count().await.map_err(storage_err)
    }

    /// Import chemicals from an uploaded CSV file.
    ///
    /// Rows naming a chemical that already exists are skipped; the rest are
    /// inserted in a single transaction.
    pub async fn import_csv(
        &self,
        upload: &Upload,
        max_bytes: usize,
    ) -> Result<ImportReport, CsvImportError> {
        upload.validate(max_bytes)?;
        let ParsedCsv { rows, mut report } = parse_records::<ChemicalInput>(&upload.bytes)?;

        let mut fresh = Vec::with_capacity(rows.len());
        for row in rows {
            let existing = self
                .repo
                .get_by_name(&row.record.name)
                .await
                .map_err(|e| CsvImportError::StorageError(e.to_string()))?;
            if existing.is_some() {
                report.skipped_existing += 1;
                report.record_issue(row.line, format!("chemical '{}' already exists", row.record.name));
                continue;
            }
            match normalize_input(row.record) {
                Ok(input) => fresh.push(input),
                Err(e) => {
                    report.invalid_rows += 1;
                    report.record_issue(row.line, e.to_string());
                }
            }
        }

        report.imported = self
            .repo
            .create_many(&fresh)
            .await
            .map_err(|e| CsvImportError::StorageError(e.to_string()))?;
        report.summarize("chemicals");
        tracing::info!(
            file = %upload.file_name,
            imported = report.imported,
            skipped_existing = report.skipped_existing,
            invalid = report.invalid_rows,
            "chemical csv imported"
        );
        Ok(report)
    }

    /// Render all chemicals as a comma-separated download.
    pub async fn export_csv(&self) -> Result<CsvDownload, CsvImportError> {
        let chemicals = self
            .repo
            .list_all()
            .await
            .map_err(|e| CsvImportError::StorageError(e.to_string()))?;
        let bytes = write_csv(&chemicals)?;
        tracing::info!(count = chemicals.len(), "chemicals exported");
        Ok(CsvDownload {
            file_name: export_file_name(Chemical::STEM, Utc::now()),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_input_trims_and_requires_fields() {
        let input = ChemicalInput {
            name: "  Ethanol ".to_string(),
            storage: " Cabinet A".to_string(),
            cas_no: Some("  ".to_string()),
            producer: Some(" ACME ".to_string()),
            ..Default::default()
        };
        let normalized = normalize_input(input).unwrap();
        assert_eq!(normalized.name, "Ethanol");
        assert_eq!(normalized.storage, "Cabinet A");
        assert_eq!(normalized.cas_no, None);
        assert_eq!(normalized.producer.as_deref(), Some("ACME"));
    }

    #[test]
    fn test_normalize_input_rejects_blank_storage() {
        let input = ChemicalInput {
            name: "Ethanol".to_string(),
            storage: "   ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            normalize_input(input),
            Err(ChemicalError::Validation(msg)) if msg.contains("storage")
        ));
    }
}
