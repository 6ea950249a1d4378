use chrono::Utc;
use sqlx::Row;

use certdesk_core::domain::certificate::CertificateId;
use certdesk_core::report::FormData;

use super::{parse_timestamp, ReportRepository, RepositoryError, StoredReport};
use crate::DbPool;

pub struct SqlReportRepository {
    pool: DbPool,
}

impl SqlReportRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_report(row: &sqlx::sqlite::SqliteRow) -> Result<StoredReport, RepositoryError> {
    let certificate_id: String =
        row.try_get("certificate_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let form_data_json: String =
        row.try_get("form_data_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let submitted_at_str: String =
        row.try_get("submitted_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let form_data: FormData = serde_json::from_str(&form_data_json)
        .map_err(|e| RepositoryError::Decode(format!("form_data_json: {e}")))?;

    Ok(StoredReport {
        certificate_id: CertificateId(certificate_id),
        form_data,
        submitted_at: parse_timestamp("submitted_at", &submitted_at_str)?,
    })
}

#[async_trait::async_trait]
impl ReportRepository for SqlReportRepository {
    async fn save(
        &self,
        certificate_id: &CertificateId,
        form_data: FormData,
    ) -> Result<StoredReport, RepositoryError> {
        let form_data_json =
            serde_json::to_string(&form_data).map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let submitted_at = Utc::now();

        sqlx::query(
            "INSERT INTO inspection_report (certificate_id, form_data_json, submitted_at)
             VALUES (?, ?, ?)
             ON CONFLICT(certificate_id) DO UPDATE SET
                 form_data_json = excluded.form_data_json,
                 submitted_at = excluded.submitted_at",
        )
        .bind(&certificate_id.0)
        .bind(form_data_json)
        .bind(submitted_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(StoredReport { certificate_id: certificate_id.clone(), form_data, submitted_at })
    }

    async fn find_by_certificate(
        &self,
        certificate_id: &CertificateId,
    ) -> Result<Option<StoredReport>, RepositoryError> {
        let row = sqlx::query(
            "SELECT certificate_id, form_data_json, submitted_at
             FROM inspection_report WHERE certificate_id = ?",
        )
        .bind(&certificate_id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_report(r)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use certdesk_core::domain::certificate::CertificateId;
    use certdesk_core::report::FormData;

    use super::SqlReportRepository;
    use crate::repositories::{RepositoryError, ReportRepository};
    use crate::{connect_with_settings, fixtures, migrations, DbPool};

    async fn setup() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn form(value: serde_json::Value) -> FormData {
        value.as_object().cloned().expect("object literal")
    }

    #[tokio::test]
    async fn report_is_replaced_on_resubmission() {
        let pool = setup().await;
        fixtures::seed_catalog(&pool).await.expect("seed");
        let certificate_id = CertificateId(fixtures::DEMO_CERTIFICATE_ID.to_string());
        let repo = SqlReportRepository::new(pool);

        repo.save(&certificate_id, form(json!({ "notes": "first pass" }))).await.expect("save");
        repo.save(&certificate_id, form(json!({ "notes": "second pass", "overall_score": 77 })))
            .await
            .expect("resave");

        let stored = repo.find_by_certificate(&certificate_id).await.expect("find").expect("present");
        assert_eq!(stored.form_data["notes"], "second pass");
        assert_eq!(stored.form_data["overall_score"], 77);
    }

    #[tokio::test]
    async fn report_requires_an_existing_certificate() {
        let repo = SqlReportRepository::new(setup().await);
        let error = repo
            .save(&CertificateId("CERT-404".to_string()), form(json!({ "notes": "orphan" })))
            .await
            .expect_err("foreign key");
        assert!(matches!(error, RepositoryError::Database(_)));
    }
}
