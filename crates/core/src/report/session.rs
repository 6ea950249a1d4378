use thiserror::Error;

use crate::domain::certificate::CertificateId;
use crate::report::form::{FieldErrorState, FormData, ReportFieldError, ReportFormStore};
use crate::report::normalize::normalize_form_data;
use crate::report::validator::{CertificateTypeResolver, ReportValidation, ReportValidator};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReportSubmissionError {
    #[error("report has {} validation error(s)", .errors.len())]
    Invalid { errors: Vec<ReportFieldError> },
}

/// One inspector working through the report sub-forms of a single certificate.
pub struct ReportSession<R> {
    store: ReportFormStore,
    validator: ReportValidator<R>,
}

impl<R> ReportSession<R>
where
    R: CertificateTypeResolver,
{
    pub fn new(certificate_id: CertificateId, validator: ReportValidator<R>) -> Self {
        Self { store: ReportFormStore::new(certificate_id), validator }
    }

    pub fn store(&self) -> &ReportFormStore {
        &self.store
    }

    pub fn record(&mut self, values: FormData) {
        self.store.update_form_data(values);
    }

    pub fn field_error(&self, field: &str) -> FieldErrorState {
        self.store.field_error(field)
    }

    pub fn validate(&mut self) -> ReportValidation {
        self.validator.validate_report(&mut self.store)
    }

    /// Validates everything recorded so far and returns the normalized payload to send upstream.
    /// Recorded values stay in place on failure so the inspector can correct them.
    pub fn submit(&mut self) -> Result<FormData, ReportSubmissionError> {
        let validation = self.validate();
        if !validation.is_valid {
            return Err(ReportSubmissionError::Invalid { errors: validation.errors });
        }
        Ok(normalize_form_data(self.store.all_form_data()))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{ReportSession, ReportSubmissionError};
    use crate::domain::certificate::CertificateId;
    use crate::domain::certificate_type::{CertificateType, CertificateTypeId};
    use crate::report::form::FormData;
    use crate::report::schema::ReportSchema;
    use crate::report::validator::{CertificateCatalog, ReportValidator};

    fn values(value: serde_json::Value) -> FormData {
        value.as_object().cloned().expect("object literal")
    }

    fn session() -> ReportSession<CertificateCatalog> {
        let mut catalog = CertificateCatalog::new([CertificateType {
            id: CertificateTypeId(3),
            name: "Digital".to_string(),
            price: Decimal::new(4900, 2),
            physical: false,
            features: Vec::new(),
            excluded_report_form_fields: vec![
                "general_comment".to_string(),
                "case".to_string(),
                "dial".to_string(),
            ],
        }]);
        let certificate_id = CertificateId("CERT-3".to_string());
        catalog.assign(certificate_id.clone(), CertificateTypeId(3));
        ReportSession::new(certificate_id, ReportValidator::new(ReportSchema::inspection(), catalog))
    }

    #[test]
    fn sub_forms_accumulate_until_the_report_is_valid() {
        let mut session = session();
        session.record(values(json!({ "notes": "Box and papers present", "brand_name": "Rolex" })));

        let error = session.submit().expect_err("report incomplete");
        let ReportSubmissionError::Invalid { errors } = error;
        assert!(errors.iter().any(|error| error.field == "movement_condition"));
        assert!(errors.iter().all(|error| error.field != "case_condition"));
        assert!(session.field_error("model_name").has_error);
        assert!(!session.field_error("brand_name").has_error);

        session.record(values(json!({
            "brand_logo_condition": "good",
            "model_name": "Submariner",
            "movement_condition": "good",
            "suspect_points": ["[\"bezel insert\",\"crown\"]"],
            "overall_score": 81,
            "authenticity_verdict": "authentic"
        })));

        let payload = session.submit().expect("report complete");
        assert_eq!(payload["brand_name"], "Rolex");
        assert_eq!(payload["suspect_points"], json!(["bezel insert", "crown"]));
        assert!(session.store().validation_errors().is_empty());
    }
}
