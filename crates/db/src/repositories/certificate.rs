use chrono::Utc;
use sqlx::Row;

use certdesk_core::domain::certificate::{Certificate, CertificateId, CertificateStatus};
use certdesk_core::domain::certificate_type::CertificateTypeId;
use certdesk_core::domain::customer::{CustomerData, PartnerId};
use certdesk_core::domain::object::ObjectData;
use certdesk_core::drafts::DraftSnapshot;

use super::{certificate_from_draft, parse_timestamp, CertificateRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCertificateRepository {
    pool: DbPool,
}

impl SqlCertificateRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_certificate(row: &sqlx::sqlite::SqliteRow) -> Result<Certificate, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let certificate_type_id: i64 =
        row.try_get("certificate_type_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status_str: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let customer_json: String =
        row.try_get("customer_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let object_json: String =
        row.try_get("object_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let partner_id: Option<String> =
        row.try_get("partner_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let status = CertificateStatus::parse(&status_str)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown certificate status `{status_str}`")))?;
    let customer: CustomerData = serde_json::from_str(&customer_json)
        .map_err(|e| RepositoryError::Decode(format!("customer_json: {e}")))?;
    let object: ObjectData = serde_json::from_str(&object_json)
        .map_err(|e| RepositoryError::Decode(format!("object_json: {e}")))?;

    Ok(Certificate {
        id: CertificateId(id),
        certificate_type_id: CertificateTypeId(certificate_type_id),
        status,
        customer,
        object,
        partner_id: partner_id.map(PartnerId),
        created_at: parse_timestamp("created_at", &created_at_str)?,
    })
}

#[async_trait::async_trait]
impl CertificateRepository for SqlCertificateRepository {
    async fn create_from_draft(
        &self,
        snapshot: &DraftSnapshot,
    ) -> Result<Certificate, RepositoryError> {
        let certificate = certificate_from_draft(snapshot, Utc::now())?;
        let customer_json = serde_json::to_string(&certificate.customer)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let object_json = serde_json::to_string(&certificate.object)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let created_at = certificate.created_at.to_rfc3339();

        sqlx::query(
            "INSERT INTO certificate (id, certificate_type_id, status, customer_json, object_json,
                                      partner_id, payment_reference, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&certificate.id.0)
        .bind(certificate.certificate_type_id.0)
        .bind(certificate.status.as_str())
        .bind(customer_json)
        .bind(object_json)
        .bind(certificate.partner_id.as_ref().map(|id| id.0.as_str()))
        .bind(snapshot.payment_reference.as_deref())
        .bind(&created_at)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        Ok(certificate)
    }

    async fn find_by_id(&self, id: &CertificateId) -> Result<Option<Certificate>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, certificate_type_id, status, customer_json, object_json, partner_id,
                    created_at
             FROM certificate WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_certificate(r)?)),
            None => Ok(None),
        }
    }

    async fn update_status(
        &self,
        id: &CertificateId,
        status: CertificateStatus,
    ) -> Result<Certificate, RepositoryError> {
        let mut certificate = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("certificate {id}")))?;
        certificate.transition_to(status).map_err(|e| RepositoryError::Invalid(e.to_string()))?;

        sqlx::query("UPDATE certificate SET status = ?, updated_at = ? WHERE id = ?")
            .bind(certificate.status.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(&id.0)
            .execute(&self.pool)
            .await?;

        Ok(certificate)
    }
}
