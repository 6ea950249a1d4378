use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::certificate::CertificateId;

pub type FormData = Map<String, Value>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFieldError {
    pub field: String,
    pub message: String,
    pub section: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldErrorState {
    pub has_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Report values for one certificate under inspection. Values accumulate across sub-forms and
/// are never reset between them; validation errors are replaced wholesale.
#[derive(Clone, Debug)]
pub struct ReportFormStore {
    certificate_id: CertificateId,
    form_data: FormData,
    validation_errors: Vec<ReportFieldError>,
}

impl ReportFormStore {
    pub fn new(certificate_id: CertificateId) -> Self {
        Self { certificate_id, form_data: FormData::new(), validation_errors: Vec::new() }
    }

    pub fn certificate_id(&self) -> &CertificateId {
        &self.certificate_id
    }

    pub fn update_form_data(&mut self, values: FormData) {
        self.form_data.extend(values);
    }

    pub fn all_form_data(&self) -> &FormData {
        &self.form_data
    }

    pub fn set_validation_errors(&mut self, errors: Vec<ReportFieldError>) {
        self.validation_errors = errors;
    }

    pub fn validation_errors(&self) -> &[ReportFieldError] {
        &self.validation_errors
    }

    pub fn field_error(&self, field: &str) -> FieldErrorState {
        match self.validation_errors.iter().find(|error| error.field == field) {
            Some(error) => {
                FieldErrorState { has_error: true, error_message: Some(error.message.clone()) }
            }
            None => FieldErrorState::default(),
        }
    }

    pub fn errors_by_section(&self) -> BTreeMap<String, Vec<ReportFieldError>> {
        let mut sections: BTreeMap<String, Vec<ReportFieldError>> = BTreeMap::new();
        for error in &self.validation_errors {
            sections.entry(error.section.clone()).or_default().push(error.clone());
        }
        sections
    }

    pub fn reset(&mut self) {
        self.form_data.clear();
        self.validation_errors.clear();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{FieldErrorState, FormData, ReportFieldError, ReportFormStore};
    use crate::domain::certificate::CertificateId;

    fn values(value: serde_json::Value) -> FormData {
        value.as_object().cloned().expect("object literal")
    }

    fn error(field: &str, message: &str, section: &str) -> ReportFieldError {
        ReportFieldError {
            field: field.to_string(),
            message: message.to_string(),
            section: section.to_string(),
        }
    }

    #[test]
    fn sub_form_updates_accumulate() {
        let mut store = ReportFormStore::new(CertificateId("CERT-1".to_string()));
        store.update_form_data(values(json!({ "general_comment": "fine", "brand_name": "Rolex" })));
        store.update_form_data(values(json!({ "movement_condition": "good" })));
        store.update_form_data(values(json!({ "brand_name": "Tudor" })));

        assert_eq!(
            store.all_form_data(),
            &values(json!({
                "general_comment": "fine",
                "brand_name": "Tudor",
                "movement_condition": "good"
            }))
        );
    }

    #[test]
    fn validation_errors_are_replaced_not_appended() {
        let mut store = ReportFormStore::new(CertificateId("CERT-1".to_string()));
        store.set_validation_errors(vec![error("notes", "Notes is required", "general")]);
        store.set_validation_errors(vec![error("brand_name", "Brand is required", "brand")]);

        assert_eq!(store.validation_errors(), &[error("brand_name", "Brand is required", "brand")]);
    }

    #[test]
    fn field_error_lookup_matches_by_field_name() {
        let mut store = ReportFormStore::new(CertificateId("CERT-1".to_string()));
        store.set_validation_errors(vec![
            error("movement_condition", "Movement condition is required", "movement"),
            error("notes", "Notes is required", "general"),
        ]);

        assert_eq!(
            store.field_error("notes"),
            FieldErrorState { has_error: true, error_message: Some("Notes is required".to_string()) }
        );
        assert_eq!(store.field_error("brand_name"), FieldErrorState::default());
    }

    #[test]
    fn errors_group_by_section_and_reset_clears_everything() {
        let mut store = ReportFormStore::new(CertificateId("CERT-1".to_string()));
        store.update_form_data(values(json!({ "notes": "x" })));
        store.set_validation_errors(vec![
            error("movement_condition", "required", "movement"),
            error("movement_type", "invalid", "movement"),
            error("notes", "required", "general"),
        ]);

        let sections = store.errors_by_section();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections["movement"].len(), 2);

        store.reset();
        assert!(store.all_form_data().is_empty());
        assert!(store.validation_errors().is_empty());
    }
}
