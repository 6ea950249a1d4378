use crate::drafts::CertificateDraft;
use crate::flows::states::{StepFieldError, WizardStep};

/// Inline errors that keep `step` from being left forward. Empty means the step is complete.
pub fn step_requirements(step: WizardStep, draft: &CertificateDraft) -> Vec<StepFieldError> {
    match step {
        WizardStep::CustomerInfo => customer_info_errors(draft),
        WizardStep::ObjectInfo => object_info_errors(draft),
        WizardStep::Service => {
            if draft.certificate_type_id.is_none() {
                vec![StepFieldError::new("certificate_type_id", "Select a service")]
            } else {
                Vec::new()
            }
        }
        WizardStep::Partner => {
            let selected =
                draft.partner_id.as_ref().map(|id| !id.0.trim().is_empty()).unwrap_or(false);
            if selected {
                Vec::new()
            } else {
                vec![StepFieldError::new("partner_id", "Select a partner")]
            }
        }
        WizardStep::Payment => {
            if is_blank(draft.payment_reference.as_deref()) {
                vec![StepFieldError::new("payment_reference", "Payment has not been confirmed")]
            } else {
                Vec::new()
            }
        }
    }
}

fn customer_info_errors(draft: &CertificateDraft) -> Vec<StepFieldError> {
    let Some(customer) = draft.customer_data.as_ref() else {
        return vec![StepFieldError::new("customer_data", "Customer information is required")];
    };

    let mut errors = Vec::new();
    if customer.first_name.trim().is_empty() {
        errors.push(StepFieldError::new("customer_data.first_name", "First name is required"));
    }
    if customer.last_name.trim().is_empty() {
        errors.push(StepFieldError::new("customer_data.last_name", "Last name is required"));
    }
    if !looks_like_email(&customer.email) {
        errors.push(StepFieldError::new("customer_data.email", "Enter a valid e-mail address"));
    }
    errors
}

fn object_info_errors(draft: &CertificateDraft) -> Vec<StepFieldError> {
    let Some(object) = draft.object_data.as_ref() else {
        return vec![StepFieldError::new("object_data", "Object information is required")];
    };

    let mut errors = Vec::new();
    if object.category.trim().is_empty() {
        errors.push(StepFieldError::new("object_data.category", "Category is required"));
    }
    if object.brand.trim().is_empty() {
        errors.push(StepFieldError::new("object_data.brand", "Brand is required"));
    }
    if object.model.trim().is_empty() {
        errors.push(StepFieldError::new("object_data.model", "Model is required"));
    }
    if object.estimated_value.map(|value| value.is_sign_negative()).unwrap_or(false) {
        errors.push(StepFieldError::new(
            "object_data.estimated_value",
            "Estimated value cannot be negative",
        ));
    }
    errors
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(|value| value.trim().is_empty()).unwrap_or(true)
}

fn looks_like_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{looks_like_email, step_requirements};
    use crate::domain::certificate_type::CertificateTypeId;
    use crate::domain::customer::{CustomerData, PartnerId};
    use crate::domain::object::ObjectData;
    use crate::drafts::{CertificateDraft, DraftPatch};
    use crate::flows::states::WizardStep;

    fn fields(step: WizardStep, draft: &CertificateDraft) -> Vec<String> {
        step_requirements(step, draft).into_iter().map(|error| error.field).collect()
    }

    #[test]
    fn customer_step_reports_each_missing_field() {
        let draft = CertificateDraft::initial(WizardStep::CustomerInfo);
        assert_eq!(fields(WizardStep::CustomerInfo, &draft), vec!["customer_data"]);

        let draft = draft.merged(DraftPatch::default().with_customer(Some(CustomerData {
            first_name: " ".to_string(),
            last_name: "Turing".to_string(),
            email: "alan@".to_string(),
            phone: None,
            company: None,
        })));
        assert_eq!(
            fields(WizardStep::CustomerInfo, &draft),
            vec!["customer_data.first_name", "customer_data.email"]
        );
    }

    #[test]
    fn object_step_requires_identity_and_non_negative_value() {
        let draft = CertificateDraft::initial(WizardStep::ObjectInfo).merged(
            DraftPatch::default().with_object(Some(ObjectData {
                category: "watch".to_string(),
                brand: "".to_string(),
                model: "Speedmaster".to_string(),
                estimated_value: Some(Decimal::new(-1, 0)),
                ..ObjectData::default()
            })),
        );

        assert_eq!(
            fields(WizardStep::ObjectInfo, &draft),
            vec!["object_data.brand", "object_data.estimated_value"]
        );
    }

    #[test]
    fn service_step_requires_certificate_type() {
        let draft = CertificateDraft::initial(WizardStep::Service);
        assert_eq!(fields(WizardStep::Service, &draft), vec!["certificate_type_id"]);

        let draft =
            draft.merged(DraftPatch::default().with_certificate_type(Some(CertificateTypeId(4))));
        assert!(step_requirements(WizardStep::Service, &draft).is_empty());
    }

    #[test]
    fn partner_and_payment_steps_reject_blank_values() {
        let draft = CertificateDraft::initial(WizardStep::Partner).merged(
            DraftPatch::default()
                .with_partner(Some(PartnerId("  ".to_string())))
                .with_payment_reference(Some(String::new())),
        );

        assert_eq!(fields(WizardStep::Partner, &draft), vec!["partner_id"]);
        assert_eq!(fields(WizardStep::Payment, &draft), vec!["payment_reference"]);
    }

    #[test]
    fn email_shape_check() {
        assert!(looks_like_email("ops@certdesk.io"));
        assert!(!looks_like_email("ops@localhost"));
        assert!(!looks_like_email("ops certdesk@io.com"));
        assert!(!looks_like_email("@certdesk.io"));
    }
}
