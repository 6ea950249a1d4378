use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::Row;

use certdesk_core::domain::certificate_type::{CertificateType, CertificateTypeId};

use super::{CertificateTypeRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCertificateTypeRepository {
    pool: DbPool,
}

impl SqlCertificateTypeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_certificate_type(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<CertificateType, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let price_str: String =
        row.try_get("price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let physical: bool =
        row.try_get("physical").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let features_json: String =
        row.try_get("features_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let excluded_json: String = row
        .try_get("excluded_report_form_fields_json")
        .map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let price = Decimal::from_str(&price_str)
        .map_err(|e| RepositoryError::Decode(format!("price `{price_str}`: {e}")))?;
    let features: Vec<String> = serde_json::from_str(&features_json)
        .map_err(|e| RepositoryError::Decode(format!("features_json: {e}")))?;
    let excluded_report_form_fields: Vec<String> = serde_json::from_str(&excluded_json)
        .map_err(|e| RepositoryError::Decode(format!("excluded_report_form_fields_json: {e}")))?;

    Ok(CertificateType {
        id: CertificateTypeId(id),
        name,
        price,
        physical,
        features,
        excluded_report_form_fields,
    })
}

#[async_trait::async_trait]
impl CertificateTypeRepository for SqlCertificateTypeRepository {
    async fn list(&self) -> Result<Vec<CertificateType>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, name, price, physical, features_json, excluded_report_form_fields_json
             FROM certificate_type ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_certificate_type).collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_id(
        &self,
        id: CertificateTypeId,
    ) -> Result<Option<CertificateType>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, price, physical, features_json, excluded_report_form_fields_json
             FROM certificate_type WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_certificate_type(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, certificate_type: CertificateType) -> Result<(), RepositoryError> {
        let features_json = serde_json::to_string(&certificate_type.features)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let excluded_json = serde_json::to_string(&certificate_type.excluded_report_form_fields)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO certificate_type (id, name, price, physical, features_json,
                                           excluded_report_form_fields_json, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 price = excluded.price,
                 physical = excluded.physical,
                 features_json = excluded.features_json,
                 excluded_report_form_fields_json = excluded.excluded_report_form_fields_json,
                 updated_at = excluded.updated_at",
        )
        .bind(certificate_type.id.0)
        .bind(certificate_type.name)
        .bind(certificate_type.price.to_string())
        .bind(certificate_type.physical)
        .bind(features_json)
        .bind(excluded_json)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
