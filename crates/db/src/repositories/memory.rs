use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use tokio::sync::RwLock;

use certdesk_core::domain::certificate::{Certificate, CertificateId, CertificateStatus};
use certdesk_core::domain::certificate_type::{CertificateType, CertificateTypeId};
use certdesk_core::drafts::{DraftSlot, DraftSnapshot};
use certdesk_core::report::FormData;

use super::{
    certificate_from_draft, new_draft_id, CertificateRepository, CertificateTypeRepository,
    DraftSnapshotRepository, ReportRepository, RepositoryError, SavedDraft, StoredReport,
};

#[derive(Default)]
pub struct InMemoryCertificateTypeRepository {
    types: RwLock<BTreeMap<CertificateTypeId, CertificateType>>,
}

#[async_trait::async_trait]
impl CertificateTypeRepository for InMemoryCertificateTypeRepository {
    async fn list(&self) -> Result<Vec<CertificateType>, RepositoryError> {
        let types = self.types.read().await;
        Ok(types.values().cloned().collect())
    }

    async fn find_by_id(
        &self,
        id: CertificateTypeId,
    ) -> Result<Option<CertificateType>, RepositoryError> {
        let types = self.types.read().await;
        Ok(types.get(&id).cloned())
    }

    async fn save(&self, certificate_type: CertificateType) -> Result<(), RepositoryError> {
        let mut types = self.types.write().await;
        types.insert(certificate_type.id, certificate_type);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryDraftSnapshotRepository {
    drafts: RwLock<HashMap<String, SavedDraft>>,
}

#[async_trait::async_trait]
impl DraftSnapshotRepository for InMemoryDraftSnapshotRepository {
    async fn save(
        &self,
        slot: DraftSlot,
        mut snapshot: DraftSnapshot,
    ) -> Result<SavedDraft, RepositoryError> {
        let id = snapshot.id.get_or_insert_with(new_draft_id).clone();
        let saved = SavedDraft { slot, snapshot, updated_at: Utc::now() };
        let mut drafts = self.drafts.write().await;
        drafts.insert(id.0, saved.clone());
        Ok(saved)
    }

    async fn find_by_id(&self, id: &CertificateId) -> Result<Option<SavedDraft>, RepositoryError> {
        let drafts = self.drafts.read().await;
        Ok(drafts.get(&id.0).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryCertificateRepository {
    certificates: RwLock<HashMap<String, Certificate>>,
}

#[async_trait::async_trait]
impl CertificateRepository for InMemoryCertificateRepository {
    async fn create_from_draft(
        &self,
        snapshot: &DraftSnapshot,
    ) -> Result<Certificate, RepositoryError> {
        let certificate = certificate_from_draft(snapshot, Utc::now())?;
        let mut certificates = self.certificates.write().await;
        if certificates.contains_key(&certificate.id.0) {
            return Err(RepositoryError::Invalid(format!(
                "certificate {} already exists",
                certificate.id
            )));
        }
        certificates.insert(certificate.id.0.clone(), certificate.clone());
        Ok(certificate)
    }

    async fn find_by_id(&self, id: &CertificateId) -> Result<Option<Certificate>, RepositoryError> {
        let certificates = self.certificates.read().await;
        Ok(certificates.get(&id.0).cloned())
    }

    async fn update_status(
        &self,
        id: &CertificateId,
        status: CertificateStatus,
    ) -> Result<Certificate, RepositoryError> {
        let mut certificates = self.certificates.write().await;
        let certificate = certificates
            .get_mut(&id.0)
            .ok_or_else(|| RepositoryError::NotFound(format!("certificate {id}")))?;
        certificate.transition_to(status).map_err(|e| RepositoryError::Invalid(e.to_string()))?;
        Ok(certificate.clone())
    }
}

#[derive(Default)]
pub struct InMemoryReportRepository {
    reports: RwLock<HashMap<String, StoredReport>>,
}

#[async_trait::async_trait]
impl ReportRepository for InMemoryReportRepository {
    async fn save(
        &self,
        certificate_id: &CertificateId,
        form_data: FormData,
    ) -> Result<StoredReport, RepositoryError> {
        let stored = StoredReport {
            certificate_id: certificate_id.clone(),
            form_data,
            submitted_at: Utc::now(),
        };
        let mut reports = self.reports.write().await;
        reports.insert(certificate_id.0.clone(), stored.clone());
        Ok(stored)
    }

    async fn find_by_certificate(
        &self,
        certificate_id: &CertificateId,
    ) -> Result<Option<StoredReport>, RepositoryError> {
        let reports = self.reports.read().await;
        Ok(reports.get(&certificate_id.0).cloned())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use certdesk_core::domain::certificate::{CertificateId, CertificateStatus};
    use certdesk_core::domain::certificate_type::{CertificateType, CertificateTypeId};
    use certdesk_core::domain::customer::CustomerData;
    use certdesk_core::domain::object::ObjectData;
    use certdesk_core::drafts::{CertificateDraft, DraftPatch, DraftSlot};
    use certdesk_core::flows::WizardStep;

    use crate::repositories::{
        CertificateRepository, CertificateTypeRepository, DraftSnapshotRepository,
        InMemoryCertificateRepository, InMemoryCertificateTypeRepository,
        InMemoryDraftSnapshotRepository, InMemoryReportRepository, ReportRepository,
    };

    #[tokio::test]
    async fn in_memory_certificate_type_repo_round_trip() {
        let repo = InMemoryCertificateTypeRepository::default();
        let certificate_type = CertificateType {
            id: CertificateTypeId(1),
            name: "Physical inspection".to_string(),
            price: Decimal::new(14900, 2),
            physical: true,
            features: Vec::new(),
            excluded_report_form_fields: Vec::new(),
        };

        repo.save(certificate_type.clone()).await.expect("save type");

        assert_eq!(repo.find_by_id(CertificateTypeId(1)).await.expect("find"), Some(certificate_type.clone()));
        assert_eq!(repo.list().await.expect("list"), vec![certificate_type]);
    }

    #[tokio::test]
    async fn in_memory_draft_to_certificate_to_report() {
        let drafts = InMemoryDraftSnapshotRepository::default();
        let certificates = InMemoryCertificateRepository::default();
        let reports = InMemoryReportRepository::default();

        let draft = CertificateDraft::initial(WizardStep::Payment).merged(
            DraftPatch::default()
                .with_customer(Some(CustomerData {
                    first_name: "Grace".to_string(),
                    last_name: "Hopper".to_string(),
                    email: "grace@example.com".to_string(),
                    ..CustomerData::default()
                }))
                .with_object(Some(ObjectData {
                    category: "watch".to_string(),
                    brand: "Longines".to_string(),
                    model: "Conquest".to_string(),
                    ..ObjectData::default()
                }))
                .with_certificate_type(Some(CertificateTypeId(1)))
                .with_payment_reference(Some("pi_9".to_string())),
        );

        let saved = drafts.save(DraftSlot::Client, draft.snapshot()).await.expect("save draft");
        let id = saved.snapshot.id.clone().expect("assigned id");
        assert_eq!(drafts.find_by_id(&id).await.expect("find draft"), Some(saved.clone()));

        let certificate = certificates.create_from_draft(&saved.snapshot).await.expect("create");
        assert_eq!(certificate.id, id);
        assert!(certificates.create_from_draft(&saved.snapshot).await.is_err());

        let form = json!({ "notes": "ok" }).as_object().cloned().expect("object literal");
        reports.save(&certificate.id, form.clone()).await.expect("save report");
        certificates.update_status(&certificate.id, CertificateStatus::Inspected).await.expect("inspected");

        let stored = reports.find_by_certificate(&certificate.id).await.expect("find").expect("present");
        assert_eq!(stored.form_data, form);
        let missing = reports
            .find_by_certificate(&CertificateId("CERT-none".to_string()))
            .await
            .expect("find missing");
        assert!(missing.is_none());
    }
}
