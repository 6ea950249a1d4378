use std::collections::BTreeMap;

use jsonschema::error::ValidationErrorKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::certificate::CertificateId;
use crate::domain::certificate_type::{CertificateType, CertificateTypeId};
use crate::report::form::{FormData, ReportFieldError, ReportFormStore};
use crate::report::normalize::normalize_form_data;
use crate::report::schema::{effective_schema, ReportSchema};

pub const UNKNOWN_ERROR_FIELD: &str = "unknown";
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unexpected error while validating the report";

const GENERAL_SECTION: &str = "general";

/// Section of a report field: every underscore token except the last, or `general`.
///
/// `movement_condition` belongs to `movement`, `case_back_condition` to `case_back` and
/// `notes` to `general`.
pub fn derive_section(field: &str) -> String {
    match field.rsplit_once('_') {
        Some((section, _)) if !section.is_empty() => section.to_string(),
        _ => GENERAL_SECTION.to_string(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportValidation {
    pub is_valid: bool,
    pub errors: Vec<ReportFieldError>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("certificate `{certificate_id}` references unknown certificate type {type_id}")]
    UnknownType { certificate_id: CertificateId, type_id: CertificateTypeId },
    #[error("certificate type lookup failed: {0}")]
    Lookup(String),
}

/// Finds the certificate type configured for the certificate a report is written against.
pub trait CertificateTypeResolver {
    fn resolve(
        &self,
        certificate_id: &CertificateId,
    ) -> Result<Option<CertificateType>, ResolveError>;
}

impl<T> CertificateTypeResolver for &T
where
    T: CertificateTypeResolver + ?Sized,
{
    fn resolve(
        &self,
        certificate_id: &CertificateId,
    ) -> Result<Option<CertificateType>, ResolveError> {
        (**self).resolve(certificate_id)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CertificateCatalog {
    types: BTreeMap<CertificateTypeId, CertificateType>,
    assignments: BTreeMap<CertificateId, CertificateTypeId>,
}

impl CertificateCatalog {
    pub fn new(types: impl IntoIterator<Item = CertificateType>) -> Self {
        Self {
            types: types.into_iter().map(|certificate_type| (certificate_type.id, certificate_type)).collect(),
            assignments: BTreeMap::new(),
        }
    }

    pub fn assign(&mut self, certificate_id: CertificateId, type_id: CertificateTypeId) {
        self.assignments.insert(certificate_id, type_id);
    }

    pub fn types(&self) -> impl Iterator<Item = &CertificateType> {
        self.types.values()
    }
}

impl CertificateTypeResolver for CertificateCatalog {
    fn resolve(
        &self,
        certificate_id: &CertificateId,
    ) -> Result<Option<CertificateType>, ResolveError> {
        let Some(type_id) = self.assignments.get(certificate_id) else {
            return Ok(None);
        };
        self.types.get(type_id).cloned().map(Some).ok_or_else(|| ResolveError::UnknownType {
            certificate_id: certificate_id.clone(),
            type_id: *type_id,
        })
    }
}

#[derive(Debug, Error)]
enum ValidatorFailure {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("report schema could not be compiled: {0}")]
    Schema(String),
}

/// Aggregated report validation. Never fails: every outcome, including unexpected failures,
/// is folded into a [`ReportValidation`] and written back to the form store.
pub struct ReportValidator<R> {
    base: ReportSchema,
    resolver: R,
}

impl<R> ReportValidator<R>
where
    R: CertificateTypeResolver,
{
    pub fn new(base: ReportSchema, resolver: R) -> Self {
        Self { base, resolver }
    }

    pub fn validate_report(&self, store: &mut ReportFormStore) -> ReportValidation {
        let certificate_id = store.certificate_id().clone();
        let errors = match self.collect_errors(&certificate_id, store.all_form_data()) {
            Ok(errors) => errors,
            Err(failure) => {
                warn!(
                    event_name = "report.validation_failed",
                    certificate_id = %certificate_id,
                    error = %failure,
                    "report validation could not run"
                );
                vec![ReportFieldError {
                    field: UNKNOWN_ERROR_FIELD.to_string(),
                    message: UNKNOWN_ERROR_MESSAGE.to_string(),
                    section: GENERAL_SECTION.to_string(),
                }]
            }
        };

        store.set_validation_errors(errors.clone());
        info!(
            event_name = "report.validated",
            certificate_id = %certificate_id,
            is_valid = errors.is_empty(),
            error_count = errors.len(),
            "report validated"
        );
        ReportValidation { is_valid: errors.is_empty(), errors }
    }

    pub fn validate_report_with_audit<S>(
        &self,
        store: &mut ReportFormStore,
        sink: &S,
        audit: &AuditContext,
    ) -> ReportValidation
    where
        S: AuditSink + ?Sized,
    {
        let validation = self.validate_report(store);
        let outcome = if validation.is_valid {
            AuditOutcome::Success
        } else if validation.errors.iter().any(|error| error.field == UNKNOWN_ERROR_FIELD) {
            AuditOutcome::Failed
        } else {
            AuditOutcome::Rejected
        };
        let mut sections: Vec<&str> =
            validation.errors.iter().map(|error| error.section.as_str()).collect();
        sections.dedup();

        sink.emit(
            AuditEvent::new(audit, "report.validated", AuditCategory::Report, outcome)
                .with_metadata("certificate_id", store.certificate_id().0.clone())
                .with_metadata("error_count", validation.errors.len().to_string())
                .with_metadata("sections", sections.join(",")),
        );
        validation
    }

    fn collect_errors(
        &self,
        certificate_id: &CertificateId,
        data: &FormData,
    ) -> Result<Vec<ReportFieldError>, ValidatorFailure> {
        let normalized = normalize_form_data(data);
        let excluded = self
            .resolver
            .resolve(certificate_id)?
            .map(|certificate_type| certificate_type.excluded_report_form_fields)
            .unwrap_or_default();
        let schema = effective_schema(&self.base, &excluded);

        check_form_data(&schema, &normalized).map_err(ValidatorFailure::Schema)
    }
}

/// Validates already-normalized data against `schema`, one error per offending field, ordered
/// by the schema's field order. Null values count as missing.
pub fn check_form_data(
    schema: &ReportSchema,
    data: &FormData,
) -> Result<Vec<ReportFieldError>, String> {
    let compiled =
        jsonschema::validator_for(&schema.to_json_schema()).map_err(|error| error.to_string())?;
    let instance = Value::Object(
        data.iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect(),
    );

    let mut by_field: BTreeMap<(usize, String), ReportFieldError> = BTreeMap::new();
    for violation in compiled.iter_errors(&instance) {
        let (field, missing) = match violation.kind() {
            ValidationErrorKind::Required { property } => {
                (property.as_str().map(str::to_string).unwrap_or_else(|| property.to_string()), true)
            }
            _ => (top_level_field(&violation.instance_path().to_string()), false),
        };

        let rule = schema.field(&field);
        let message = match rule {
            Some(rule) if missing => rule.required_message(),
            Some(rule) => rule.invalid_message(),
            None => violation.to_string(),
        };
        let field = if field.is_empty() { UNKNOWN_ERROR_FIELD.to_string() } else { field };
        let position = schema.position(&field).unwrap_or(usize::MAX);

        by_field.entry((position, field.clone())).or_insert_with(|| ReportFieldError {
            section: derive_section(&field),
            field,
            message,
        });
    }

    Ok(by_field.into_values().collect())
}

fn top_level_field(pointer: &str) -> String {
    pointer
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default()
        .replace("~1", "/")
        .replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::{json, Value};

    use super::{
        check_form_data, derive_section, top_level_field, CertificateCatalog,
        CertificateTypeResolver, ReportValidator, ResolveError, UNKNOWN_ERROR_FIELD,
        UNKNOWN_ERROR_MESSAGE,
    };
    use crate::audit::{AuditContext, AuditOutcome, InMemoryAuditSink};
    use crate::domain::certificate::CertificateId;
    use crate::domain::certificate_type::{CertificateType, CertificateTypeId};
    use crate::report::form::{FormData, ReportFieldError, ReportFormStore};
    use crate::report::schema::ReportSchema;

    struct BrokenResolver;

    impl CertificateTypeResolver for BrokenResolver {
        fn resolve(
            &self,
            _certificate_id: &CertificateId,
        ) -> Result<Option<CertificateType>, ResolveError> {
            Err(ResolveError::Lookup("catalog offline".to_string()))
        }
    }

    fn certificate_type(id: i64, excluded: &[&str]) -> CertificateType {
        CertificateType {
            id: CertificateTypeId(id),
            name: format!("Type {id}"),
            price: Decimal::new(9900, 2),
            physical: true,
            features: Vec::new(),
            excluded_report_form_fields: excluded.iter().map(|field| field.to_string()).collect(),
        }
    }

    fn catalog(excluded: &[&str]) -> CertificateCatalog {
        let mut catalog = CertificateCatalog::new([certificate_type(1, excluded)]);
        catalog.assign(CertificateId("CERT-1".to_string()), CertificateTypeId(1));
        catalog
    }

    fn complete_report() -> FormData {
        let value = json!({
            "general_comment": "Consistent with factory specification",
            "notes": "Inspected under loupe",
            "brand_name": "Omega",
            "brand_logo_condition": "excellent",
            "model_name": "Speedmaster Professional",
            "case_material": "steel",
            "case_condition": "good",
            "dial_condition": "good",
            "movement_condition": "excellent",
            "overall_score": 92,
            "authenticity_verdict": "authentic"
        });
        value.as_object().cloned().expect("object literal")
    }

    fn store_with(data: FormData) -> ReportFormStore {
        let mut store = ReportFormStore::new(CertificateId("CERT-1".to_string()));
        store.update_form_data(data);
        store
    }

    fn fields(errors: &[ReportFieldError]) -> Vec<&str> {
        errors.iter().map(|error| error.field.as_str()).collect()
    }

    #[test]
    fn section_is_everything_before_the_last_token() {
        assert_eq!(derive_section("movement_condition"), "movement");
        assert_eq!(derive_section("case_back_condition"), "case_back");
        assert_eq!(derive_section("notes"), "general");
        assert_eq!(derive_section("_orphan"), "general");
    }

    #[test]
    fn pointer_is_reduced_to_its_top_level_field() {
        assert_eq!(top_level_field("/suspect_points/0"), "suspect_points");
        assert_eq!(top_level_field("/brand_name"), "brand_name");
        assert_eq!(top_level_field(""), "");
    }

    #[test]
    fn complete_report_passes_and_clears_previous_errors() {
        let validator = ReportValidator::new(ReportSchema::inspection(), catalog(&[]));
        let mut store = store_with(complete_report());
        store.set_validation_errors(vec![ReportFieldError {
            field: "notes".to_string(),
            message: "stale".to_string(),
            section: "general".to_string(),
        }]);

        let validation = validator.validate_report(&mut store);

        assert!(validation.is_valid);
        assert!(validation.errors.is_empty());
        assert!(store.validation_errors().is_empty());
    }

    #[test]
    fn excluded_fields_are_not_required() {
        let mut data = complete_report();
        data.remove("general_comment");

        let excluded = ReportValidator::new(ReportSchema::inspection(), catalog(&["general_comment"]));
        let validation = excluded.validate_report(&mut store_with(data.clone()));
        assert!(validation.is_valid, "unexpected errors: {:?}", validation.errors);

        data.remove("brand_name");
        let validation = excluded.validate_report(&mut store_with(data));
        assert_eq!(fields(&validation.errors), vec!["brand_name"]);
        assert_eq!(validation.errors[0].section, "brand");
        assert_eq!(validation.errors[0].message, "Brand is required");
    }

    #[test]
    fn every_missing_field_is_reported() {
        let mut data = complete_report();
        data.remove("movement_condition");
        data.remove("notes");
        data.remove("brand_name");

        let validator = ReportValidator::new(ReportSchema::inspection(), catalog(&[]));
        let mut store = store_with(data);
        let validation = validator.validate_report(&mut store);

        assert!(!validation.is_valid);
        assert_eq!(validation.errors.len(), 3);
        assert_eq!(fields(&validation.errors), vec!["notes", "brand_name", "movement_condition"]);
        let sections: Vec<&str> =
            validation.errors.iter().map(|error| error.section.as_str()).collect();
        assert_eq!(sections, vec!["general", "brand", "movement"]);
        assert_eq!(store.validation_errors(), validation.errors.as_slice());
        assert!(store.field_error("movement_condition").has_error);
    }

    #[test]
    fn invalid_values_get_one_error_per_field() {
        let mut data = complete_report();
        data.insert("overall_score".to_string(), json!("ninety"));
        data.insert("dial_condition".to_string(), json!("mint"));
        data.insert("notes".to_string(), json!("   "));
        data.insert("suspect_points".to_string(), json!(["crown", 7]));

        let validation = ReportValidator::new(ReportSchema::inspection(), catalog(&[]))
            .validate_report(&mut store_with(data));

        assert_eq!(
            fields(&validation.errors),
            vec!["notes", "dial_condition", "suspect_points", "overall_score"]
        );
        assert_eq!(
            validation.errors[1].message,
            "Dial condition must be one of: excellent, good, fair, poor"
        );
        assert_eq!(validation.errors[2].section, "suspect");
    }

    #[test]
    fn wrapped_values_are_normalized_before_validation() {
        let mut data = complete_report();
        data.insert("suspect_points".to_string(), json!(["[\"crown\",\"caseback\"]"]));
        data.insert("authenticity_verdict".to_string(), json!(["authentic"]));

        let mut store = store_with(data);
        let validation =
            ReportValidator::new(ReportSchema::inspection(), catalog(&[])).validate_report(&mut store);

        assert!(validation.is_valid, "unexpected errors: {:?}", validation.errors);
        assert_eq!(store.all_form_data()["authenticity_verdict"], json!(["authentic"]));
    }

    #[test]
    fn null_counts_as_missing() {
        let mut data = complete_report();
        data.insert("brand_name".to_string(), Value::Null);

        let validation = ReportValidator::new(ReportSchema::inspection(), catalog(&[]))
            .validate_report(&mut store_with(data));
        assert_eq!(validation.errors[0].message, "Brand is required");
    }

    #[test]
    fn certificates_without_a_type_use_the_full_schema() {
        let mut data = complete_report();
        data.remove("general_comment");

        let validator = ReportValidator::new(ReportSchema::inspection(), CertificateCatalog::default());
        let validation = validator.validate_report(&mut store_with(data));
        assert_eq!(fields(&validation.errors), vec!["general_comment"]);
    }

    #[test]
    fn resolver_failure_becomes_single_unknown_error() {
        let validator = ReportValidator::new(ReportSchema::inspection(), BrokenResolver);
        let mut store = store_with(complete_report());

        let validation = validator.validate_report(&mut store);

        assert!(!validation.is_valid);
        assert_eq!(
            validation.errors,
            vec![ReportFieldError {
                field: UNKNOWN_ERROR_FIELD.to_string(),
                message: UNKNOWN_ERROR_MESSAGE.to_string(),
                section: "general".to_string(),
            }]
        );
        assert_eq!(store.validation_errors(), validation.errors.as_slice());
    }

    #[test]
    fn dangling_type_reference_is_a_resolve_error() {
        let mut catalog = CertificateCatalog::default();
        catalog.assign(CertificateId("CERT-9".to_string()), CertificateTypeId(77));

        let error = catalog.resolve(&CertificateId("CERT-9".to_string())).expect_err("dangling");
        assert!(matches!(error, ResolveError::UnknownType { .. }));
    }

    #[test]
    fn check_form_data_on_empty_schema_accepts_anything() {
        let errors = check_form_data(&ReportSchema::new(Vec::new()), &complete_report())
            .expect("schema compiles");
        assert!(errors.is_empty());
    }

    #[test]
    fn validation_emits_audit_event() {
        let sink = InMemoryAuditSink::default();
        let mut data = complete_report();
        data.remove("notes");
        let validator = ReportValidator::new(ReportSchema::inspection(), catalog(&[]));

        let validation = validator.validate_report_with_audit(
            &mut store_with(data),
            &sink,
            &AuditContext::new(Some(CertificateId("CERT-1".to_string())), None, "req-5", "inspector"),
        );

        assert!(!validation.is_valid);
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].outcome, AuditOutcome::Rejected);
        assert_eq!(events[0].metadata.get("sections").map(String::as_str), Some("general"));
    }

    #[test]
    fn unexpected_failure_is_audited_as_failed() {
        let sink = InMemoryAuditSink::default();
        let validator = ReportValidator::new(ReportSchema::inspection(), BrokenResolver);

        let validation = validator.validate_report_with_audit(
            &mut store_with(complete_report()),
            &sink,
            &AuditContext::new(Some(CertificateId("CERT-1".to_string())), None, "req-6", "inspector"),
        );

        assert_eq!(validation.errors.len(), 1);
        assert_eq!(sink.events()[0].outcome, AuditOutcome::Failed);
    }
}
