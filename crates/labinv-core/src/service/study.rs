//! Study (risk assessment) service.

use chrono::Utc;
use labinv_types::error::{CsvImportError, RepositoryError, StudyError};
use labinv_types::import::ImportReport;
use labinv_types::page::{Page, PageRequest};
use labinv_types::study::{Study, StudyFilter, StudyId, StudyInput, StudyStats};

use crate::repository::study::StudyRepository;
use crate::service::qr::{QrIssuer, QrRenderer, QrTarget};
use crate::service::tidy;
use crate::tabular::export::{CsvDownload, CsvExport, export_file_name, write_csv};
use crate::tabular::reader::{ParsedCsv, parse_records};
use crate::tabular::Upload;

/// Service for studies. Writes record the acting username in the audit
/// columns.
pub struct StudyService<R: StudyRepository, Q: QrRenderer> {
    repo: R,
    qr: QrIssuer<Q>,
}

fn storage_err(e: RepositoryError) -> StudyError {
    match e {
        RepositoryError::NotFound => StudyError::NotFound,
        RepositoryError::Conflict(code) => StudyError::DuplicateCode(code),
        other => StudyError::StorageError(other.to_string()),
    }
}

/// Trim every field, require a study code, and enforce column limits.
pub fn normalize_input(input: StudyInput) -> Result<StudyInput, StudyError> {
    let study_code = input.study_code.trim().to_string();
    if study_code.is_empty() {
        return Err(StudyError::Validation("studyCode is required".to_string()));
    }
    let input = StudyInput {
        study_code,
        document_codes: tidy(input.document_codes),
        material_type: tidy(input.material_type),
        study_level: tidy(input.study_level),
        risk_level: tidy(input.risk_level),
        info: tidy(input.info),
        number_of_samples: tidy(input.number_of_samples),
        object_of_study: tidy(input.object_of_study),
        responsible_person: tidy(input.responsible_person),
        status: tidy(input.status),
    };
    if let Some(field) = input.oversized_field() {
        return Err(StudyError::Validation(format!("{field} is too long")));
    }
    Ok(input)
}

/// Keep only the highest-priority non-blank criterion: status, then risk
/// level, then responsible person, then study code.
pub fn single_criterion(filter: StudyFilter) -> StudyFilter {
    let status = tidy(filter.status);
    let risk_level = tidy(filter.risk_level);
    let responsible_person = tidy(filter.responsible_person);
    let study_code = tidy(filter.study_code);
    if status.is_some() {
        StudyFilter {
            status,
            ..Default::default()
        }
    } else if risk_level.is_some() {
        StudyFilter {
            risk_level,
            ..Default::default()
        }
    } else if responsible_person.is_some() {
        StudyFilter {
            responsible_person,
            ..Default::default()
        }
    } else {
        StudyFilter {
            study_code,
            ..Default::default()
        }
    }
}

impl<R: StudyRepository, Q: QrRenderer> StudyService<R, Q> {
    pub fn new(repo: R, qr: QrIssuer<Q>) -> Self {
        Self { repo, qr }
    }

    /// Studies matching at most one criterion, in the order status,
    /// risk level, responsible person.
    pub async fn list(&self, filter: StudyFilter) -> Result<Vec<Study>, StudyError> {
        let filter = single_criterion(filter);
        self.repo.list(&filter).await.map_err(storage_err)
    }

    /// Paged search by study code substring; a blank term lists everything.
    pub async fn search(
        &self,
        study_code: Option<String>,
        page: PageRequest,
    ) -> Result<Page<Study>, StudyError> {
        let filter = StudyFilter {
            study_code: tidy(study_code),
            ..Default::default()
        };
        let (content, total) = self
            .repo
            .list_page(&filter, page)
            .await
            .map_err(storage_err)?;
        Ok(Page::new(content, page, total))
    }

    pub async fn get(&self, id: StudyId) -> Result<Study, StudyError> {
        self.repo
            .get_by_id(id)
            .await
            .map_err(storage_err)?
            .ok_or(StudyError::NotFound)
    }

    pub async fn get_by_code(&self, code: &str) -> Result<Study, StudyError> {
        self.repo
            .get_by_code(code.trim())
            .await
            .map_err(storage_err)?
            .ok_or(StudyError::NotFound)
    }

    pub async fn stats(&self) -> Result<StudyStats, StudyError> {
        self.repo.stats().await.map_err(storage_err)
    }

    /// Create a study and issue its QR code.
    pub async fn create(&self, input: StudyInput, actor: &str) -> Result<Study, StudyError> {
        let input = normalize_input(input)?;
        if self
            .repo
            .get_by_code(&input.study_code)
            .await
            .map_err(storage_err)?
            .is_some()
        {
            return Err(StudyError::DuplicateCode(input.study_code));
        }
        let study = self
            .repo
            .create(&input, Some(actor))
            .await
            .map_err(storage_err)?;
        tracing::info!(id = %study.id, code = %study.study_code, actor, "study created");

        match self.generate_qr(study.id).await {
            Ok(with_qr) => Ok(with_qr),
            Err(e) => {
                tracing::warn!(id = %study.id, error = %e, "qr code generation failed");
                Ok(study)
            }
        }
    }

    /// Update study `id`. When no study has that id, the study whose code
    /// matches `input.study_code` is updated instead.
    pub async fn update(
        &self,
        id: StudyId,
        input: StudyInput,
        actor: &str,
    ) -> Result<Study, StudyError> {
        let input = normalize_input(input)?;
        let target = match self.repo.get_by_id(id).await.map_err(storage_err)? {
            Some(study) => study,
            None => {
                tracing::debug!(id = %id, code = %input.study_code, "id not found, falling back to code");
                self.get_by_code(&input.study_code).await?
            }
        };
        if let Some(other) = self
            .repo
            .get_by_code(&input.study_code)
            .await
            .map_err(storage_err)?
        {
            if other.id != target.id {
                return Err(StudyError::DuplicateCode(input.study_code));
            }
        }
        let updated = self
            .repo
            .update(target.id, &input, Some(actor))
            .await
            .map_err(storage_err)?;
        tracing::info!(id = %updated.id, actor, "study updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: StudyId) -> Result<(), StudyError> {
        if !self.repo.delete(id).await.map_err(storage_err)? {
            return Err(StudyError::NotFound);
        }
        tracing::info!(id = %id, "study deleted");
        Ok(())
    }

    pub async fn delete_by_code(&self, code: &str) -> Result<Study, StudyError> {
        let study = self.get_by_code(code).await?;
        self.delete(study.id).await?;
        Ok(study)
    }

    /// Remove every study. Returns how many were deleted.
    pub async fn clear_all(&self) -> Result<u64, StudyError> {
        let removed = self.repo.delete_all().await.map_err(storage_err)?;
        tracing::warn!(removed, "all studies deleted");
        Ok(removed)
    }

    /// Issue a fresh QR code for study `id`, replacing any previous one.
    pub async fn generate_qr(&self, id: StudyId) -> Result<Study, StudyError> {
        let qr = self.qr.issue(QrTarget::Study)?;
        self.repo.set_qr_code(id, &qr).await.map_err(storage_err)
    }

    /// PNG of the study's QR code, generated first if missing.
    pub async fn qr_image(&self, id: StudyId) -> Result<Vec<u8>, StudyError> {
        let study = self.get(id).await?;
        if let Some(image) = study.qr_code_image {
            return Ok(image);
        }
        let study = self.generate_qr(id).await?;
        study
            .qr_code_image
            .ok_or_else(|| StudyError::StorageError("qr image was not stored".to_string()))
    }

    pub async fn delete_qr(&self, id: StudyId) -> Result<Study, StudyError> {
        self.repo.clear_qr_code(id).await.map_err(storage_err)
    }

    /// Detail page URL encoded in the study's QR code.
    pub fn qr_url(&self, code: &str) -> String {
        self.qr.url_for(QrTarget::Study, code)
    }

    pub async fn get_by_qr_code(&self, code: &str) -> Result<Study, StudyError> {
        self.repo
            .get_by_qr_code(code.trim())
            .await
            .map_err(storage_err)?
            .ok_or(StudyError::NotFound)
    }

    pub async fn count(&self) -> Result<i64, StudyError> {
        self.repo.count().await.map_err(storage_err)
    }

    /// Import studies from an uploaded CSV file, skipping codes that
    /// already exist.
    pub async fn import_csv(
        &self,
        upload: &Upload,
        max_bytes: usize,
        actor: &str,
    ) -> Result<ImportReport, CsvImportError> {
        upload.validate(max_bytes)?;
        let ParsedCsv { rows, mut report } = parse_records::<StudyInput>(&upload.bytes)?;

        let mut fresh = Vec::with_capacity(rows.len());
        for row in rows {
            let existing = self
                .repo
                .get_by_code(&row.record.study_code)
                .await
                .map_err(|e| CsvImportError::StorageError(e.to_string()))?;
            if existing.is_some() {
                report.skipped_existing += 1;
                report.record_issue(
                    row.line,
                    format!("study '{}' already exists", row.record.study_code),
                );
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
            .create_many(&fresh, Some(actor))
            .await
            .map_err(|e| CsvImportError::StorageError(e.to_string()))?;
        report.summarize("studies");
        tracing::info!(
            file = %upload.file_name,
            imported = report.imported,
            skipped_existing = report.skipped_existing,
            invalid = report.invalid_rows,
            actor,
            "study csv imported"
        );
        Ok(report)
    }

    /// Render all studies as a semicolon-separated download.
    pub async fn export_csv(&self) -> Result<CsvDownload, CsvImportError> {
        let studies = self
            .repo
            .list(&StudyFilter::default())
            .await
            .map_err(|e| CsvImportError::StorageError(e.to_string()))?;
        let bytes = write_csv(&studies)?;
        tracing::info!(count = studies.len(), "studies exported");
        Ok(CsvDownload {
            file_name: export_file_name(Study::STEM, Utc::now()),
            bytes,
        })
    }
}
