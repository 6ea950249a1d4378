use sqlx::Row;

use certdesk_core::domain::certificate::CertificateId;
use certdesk_core::domain::certificate_type::CertificateTypeId;
use certdesk_core::report::CertificateCatalog;

use crate::repositories::{CertificateTypeRepository, RepositoryError, SqlCertificateTypeRepository};
use crate::DbPool;

/// Snapshot of every certificate type and certificate assignment, ready to hand to the report
/// validator.
pub async fn catalog_resolver(pool: &DbPool) -> Result<CertificateCatalog, RepositoryError> {
    let types = SqlCertificateTypeRepository::new(pool.clone()).list().await?;
    let mut catalog = CertificateCatalog::new(types);

    let rows: Vec<sqlx::sqlite::SqliteRow> =
        sqlx::query("SELECT id, certificate_type_id FROM certificate").fetch_all(pool).await?;
    for row in &rows {
        let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let type_id: i64 = row
            .try_get("certificate_type_id")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
        catalog.assign(CertificateId(id), CertificateTypeId(type_id));
    }

    Ok(catalog)
}
