use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::info;

use certdesk_core::domain::certificate_type::{CertificateType, CertificateTypeId};

use crate::connection::DbPool;
use crate::repositories::{CertificateTypeRepository, RepositoryError, SqlCertificateTypeRepository};

/// Certificate that `seed_catalog` leaves awaiting inspection, for trying out report validation.
pub const DEMO_CERTIFICATE_ID: &str = "CERT-DEMO-0001";

const DEMO_CERTIFICATE_TYPE: i64 = 3;

/// Demo catalog: a full physical inspection, an express service and a digital-only certificate.
pub fn demo_certificate_types() -> Vec<CertificateType> {
    vec![
        CertificateType {
            id: CertificateTypeId(1),
            name: "Physical inspection".to_string(),
            price: Decimal::new(14900, 2),
            physical: true,
            features: vec!["hologram".to_string(), "printed_certificate".to_string()],
            excluded_report_form_fields: Vec::new(),
        },
        CertificateType {
            id: CertificateTypeId(2),
            name: "Express certificate".to_string(),
            price: Decimal::new(8900, 2),
            physical: true,
            features: vec!["printed_certificate".to_string()],
            excluded_report_form_fields: vec!["bracelet".to_string(), "suspect".to_string()],
        },
        CertificateType {
            id: CertificateTypeId(DEMO_CERTIFICATE_TYPE),
            name: "Digital certificate".to_string(),
            price: Decimal::new(4900, 2),
            physical: false,
            features: vec!["pdf".to_string()],
            excluded_report_form_fields: vec![
                "general_comment".to_string(),
                "case".to_string(),
                "dial".to_string(),
                "serial_matches_papers".to_string(),
            ],
        },
    ]
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub certificate_types: Vec<CertificateTypeId>,
    pub certificates: Vec<String>,
}

/// Upserts the demo catalog and the demo certificate. Safe to run repeatedly.
pub async fn seed_catalog(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
    let repo = SqlCertificateTypeRepository::new(pool.clone());
    let mut certificate_types = Vec::new();
    for certificate_type in demo_certificate_types() {
        certificate_types.push(certificate_type.id);
        repo.save(certificate_type).await?;
    }

    let customer = json!({
        "first_name": "Demo",
        "last_name": "Customer",
        "email": "demo@example.com"
    });
    let object = json!({ "category": "watch", "brand": "Omega", "model": "Speedmaster" });
    let now = Utc::now().to_rfc3339();

    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO certificate (id, certificate_type_id, status, customer_json, object_json,
                                  partner_id, payment_reference, created_at, updated_at)
         VALUES (?, ?, 'awaiting_inspection', ?, ?, NULL, 'demo-payment', ?, ?)
         ON CONFLICT(id) DO NOTHING",
    )
    .bind(DEMO_CERTIFICATE_ID)
    .bind(DEMO_CERTIFICATE_TYPE)
    .bind(customer.to_string())
    .bind(object.to_string())
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    info!(
        event_name = "db.catalog_seeded",
        certificate_types = certificate_types.len(),
        demo_certificate = DEMO_CERTIFICATE_ID,
        "demo catalog seeded"
    );
    Ok(SeedResult { certificate_types, certificates: vec![DEMO_CERTIFICATE_ID.to_string()] })
}
