use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use certdesk_core::domain::certificate::{Certificate, CertificateId, CertificateStatus};
use certdesk_core::domain::certificate_type::{CertificateType, CertificateTypeId};
use certdesk_core::drafts::{DraftSlot, DraftSnapshot};
use certdesk_core::report::FormData;

pub mod certificate;
pub mod certificate_type;
pub mod draft_snapshot;
pub mod memory;
pub mod report;

pub use certificate::SqlCertificateRepository;
pub use certificate_type::SqlCertificateTypeRepository;
pub use draft_snapshot::SqlDraftSnapshotRepository;
pub use memory::{
    InMemoryCertificateRepository, InMemoryCertificateTypeRepository,
    InMemoryDraftSnapshotRepository, InMemoryReportRepository,
};
pub use report::SqlReportRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("invalid record: {0}")]
    Invalid(String),
    #[error("not found: {0}")]
    NotFound(String),
}

/// A draft snapshot kept server side, keyed by the id it was assigned on first save.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedDraft {
    pub slot: DraftSlot,
    pub snapshot: DraftSnapshot,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredReport {
    pub certificate_id: CertificateId,
    pub form_data: FormData,
    pub submitted_at: DateTime<Utc>,
}

#[async_trait]
pub trait CertificateTypeRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<CertificateType>, RepositoryError>;
    async fn find_by_id(
        &self,
        id: CertificateTypeId,
    ) -> Result<Option<CertificateType>, RepositoryError>;
    async fn save(&self, certificate_type: CertificateType) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait DraftSnapshotRepository: Send + Sync {
    /// Upserts the snapshot; a snapshot without an id gets a fresh one.
    async fn save(
        &self,
        slot: DraftSlot,
        snapshot: DraftSnapshot,
    ) -> Result<SavedDraft, RepositoryError>;
    async fn find_by_id(&self, id: &CertificateId) -> Result<Option<SavedDraft>, RepositoryError>;
}

#[async_trait]
pub trait CertificateRepository: Send + Sync {
    async fn create_from_draft(
        &self,
        snapshot: &DraftSnapshot,
    ) -> Result<Certificate, RepositoryError>;
    async fn find_by_id(&self, id: &CertificateId) -> Result<Option<Certificate>, RepositoryError>;
    async fn update_status(
        &self,
        id: &CertificateId,
        status: CertificateStatus,
    ) -> Result<Certificate, RepositoryError>;
}

#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn save(
        &self,
        certificate_id: &CertificateId,
        form_data: FormData,
    ) -> Result<StoredReport, RepositoryError>;
    async fn find_by_certificate(
        &self,
        certificate_id: &CertificateId,
    ) -> Result<Option<StoredReport>, RepositoryError>;
}

pub(crate) fn new_draft_id() -> CertificateId {
    CertificateId(format!("CERT-{}", uuid::Uuid::new_v4().simple()))
}

/// Builds the certificate a submitted draft turns into. A confirmed payment moves it straight to
/// inspection.
pub(crate) fn certificate_from_draft(
    snapshot: &DraftSnapshot,
    created_at: DateTime<Utc>,
) -> Result<Certificate, RepositoryError> {
    let missing = |field: &str| RepositoryError::Invalid(format!("draft has no {field}"));

    let id = snapshot.id.clone().ok_or_else(|| missing("id"))?;
    let certificate_type_id = snapshot.certificate_type_id.ok_or_else(|| missing("certificate_type_id"))?;
    let customer = snapshot.customer_data.clone().ok_or_else(|| missing("customer_data"))?;
    let object = snapshot.object_data.clone().ok_or_else(|| missing("object_data"))?;
    let paid = snapshot.payment_reference.as_deref().map(|r| !r.trim().is_empty()).unwrap_or(false);

    Ok(Certificate {
        id,
        certificate_type_id,
        status: if paid {
            CertificateStatus::AwaitingInspection
        } else {
            CertificateStatus::AwaitingPayment
        },
        customer,
        object,
        partner_id: snapshot.partner_id.clone(),
        created_at,
    })
}

pub(crate) fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("{field}: {e}")))
}
