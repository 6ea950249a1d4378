use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::certificate::CertificateId;
use crate::domain::certificate_type::CertificateTypeId;
use crate::domain::customer::{CustomerData, PartnerId};
use crate::domain::object::{ObjectData, PhotoUpload};
use crate::flows::WizardStep;

/// In-memory draft. Holds the transient photo upload, so it is deliberately not `Serialize`;
/// go through [`CertificateDraft::to_persisted`] to obtain a storable shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateDraft {
    pub id: Option<CertificateId>,
    pub current_step: WizardStep,
    pub certificate_type_id: Option<CertificateTypeId>,
    pub customer_data: Option<CustomerData>,
    pub object_data: Option<ObjectData>,
    pub partner_id: Option<PartnerId>,
    pub payment_reference: Option<String>,
    pub object_photo: Option<PhotoUpload>,
}

impl CertificateDraft {
    pub fn initial(current_step: WizardStep) -> Self {
        Self {
            id: None,
            current_step,
            certificate_type_id: None,
            customer_data: None,
            object_data: None,
            partner_id: None,
            payment_reference: None,
            object_photo: None,
        }
    }

    /// Shallow merge, last write wins per key. Keys absent from the patch are kept.
    pub fn apply(&mut self, patch: DraftPatch) {
        let DraftPatch {
            id,
            current_step,
            certificate_type_id,
            customer_data,
            object_data,
            partner_id,
            payment_reference,
            object_photo,
        } = patch;

        if let Some(id) = id {
            self.id = id;
        }
        if let Some(current_step) = current_step {
            self.current_step = current_step;
        }
        if let Some(certificate_type_id) = certificate_type_id {
            self.certificate_type_id = certificate_type_id;
        }
        if let Some(customer_data) = customer_data {
            self.customer_data = customer_data;
        }
        if let Some(object_data) = object_data {
            self.object_data = object_data;
        }
        if let Some(partner_id) = partner_id {
            self.partner_id = partner_id;
        }
        if let Some(payment_reference) = payment_reference {
            self.payment_reference = payment_reference;
        }
        if let Some(object_photo) = object_photo {
            self.object_photo = object_photo;
        }
    }

    pub fn merged(&self, patch: DraftPatch) -> Self {
        let mut next = self.clone();
        next.apply(patch);
        next
    }

    pub fn snapshot(&self) -> DraftSnapshot {
        DraftSnapshot {
            id: self.id.clone(),
            current_step: self.current_step,
            certificate_type_id: self.certificate_type_id,
            customer_data: self.customer_data.clone(),
            object_data: self.object_data.clone(),
            partner_id: self.partner_id.clone(),
            payment_reference: self.payment_reference.clone(),
        }
    }

    pub fn to_persisted(&self) -> PersistedDraft {
        PersistedDraft { draft: self.snapshot() }
    }

    pub fn from_snapshot(snapshot: DraftSnapshot) -> Self {
        Self {
            id: snapshot.id,
            current_step: snapshot.current_step,
            certificate_type_id: snapshot.certificate_type_id,
            customer_data: snapshot.customer_data,
            object_data: snapshot.object_data,
            partner_id: snapshot.partner_id,
            payment_reference: snapshot.payment_reference,
            object_photo: None,
        }
    }
}

/// Serializable view of a draft. Has no field for binary uploads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CertificateId>,
    pub current_step: WizardStep,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_type_id: Option<CertificateTypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_data: Option<CustomerData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_data: Option<ObjectData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<PartnerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
}

/// Storage envelope: `{"draft": {...}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedDraft {
    pub draft: DraftSnapshot,
}

/// Partial update. Outer `None` leaves a key untouched; `Some(None)` sets it to null.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DraftPatch {
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Option<CertificateId>>,
    #[serde(default)]
    pub current_step: Option<WizardStep>,
    #[serde(default, deserialize_with = "present")]
    pub certificate_type_id: Option<Option<CertificateTypeId>>,
    #[serde(default, deserialize_with = "present")]
    pub customer_data: Option<Option<CustomerData>>,
    #[serde(default, deserialize_with = "present")]
    pub object_data: Option<Option<ObjectData>>,
    #[serde(default, deserialize_with = "present")]
    pub partner_id: Option<Option<PartnerId>>,
    #[serde(default, deserialize_with = "present")]
    pub payment_reference: Option<Option<String>>,
    #[serde(skip)]
    pub object_photo: Option<Option<PhotoUpload>>,
}

impl DraftPatch {
    pub fn step(current_step: WizardStep) -> Self {
        Self { current_step: Some(current_step), ..Self::default() }
    }

    pub fn with_certificate_type(mut self, id: Option<CertificateTypeId>) -> Self {
        self.certificate_type_id = Some(id);
        self
    }

    pub fn with_customer(mut self, customer: Option<CustomerData>) -> Self {
        self.customer_data = Some(customer);
        self
    }

    pub fn with_object(mut self, object: Option<ObjectData>) -> Self {
        self.object_data = Some(object);
        self
    }

    pub fn with_partner(mut self, partner_id: Option<PartnerId>) -> Self {
        self.partner_id = Some(partner_id);
        self
    }

    pub fn with_payment_reference(mut self, reference: Option<String>) -> Self {
        self.payment_reference = Some(reference);
        self
    }

    pub fn with_photo(mut self, photo: Option<PhotoUpload>) -> Self {
        self.object_photo = Some(photo);
        self
    }
}

// A key that is present maps to `Some`, even when its value is null.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{CertificateDraft, DraftPatch};
    use crate::domain::certificate_type::CertificateTypeId;
    use crate::domain::customer::{CustomerData, PartnerId};
    use crate::domain::object::PhotoUpload;
    use crate::flows::WizardStep;

    fn customer() -> CustomerData {
        CustomerData {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            company: None,
        }
    }

    #[test]
    fn merge_overwrites_only_patched_keys() {
        let mut draft = CertificateDraft::initial(WizardStep::CustomerInfo);
        draft.apply(DraftPatch::default().with_customer(Some(customer())));
        draft.apply(
            DraftPatch::step(WizardStep::Service).with_certificate_type(Some(CertificateTypeId(2))),
        );

        assert_eq!(draft.current_step, WizardStep::Service);
        assert_eq!(draft.certificate_type_id, Some(CertificateTypeId(2)));
        assert_eq!(draft.customer_data, Some(customer()));
        assert_eq!(draft.partner_id, None);
    }

    #[test]
    fn explicit_null_clears_value_but_absent_key_keeps_it() {
        let mut draft = CertificateDraft::initial(WizardStep::Service);
        draft.apply(DraftPatch::default().with_certificate_type(Some(CertificateTypeId(4))));

        let keep: DraftPatch = serde_json::from_value(json!({ "current_step": "Payment" }))
            .expect("patch without type id");
        draft.apply(keep);
        assert_eq!(draft.certificate_type_id, Some(CertificateTypeId(4)));

        let clear: DraftPatch = serde_json::from_value(json!({ "certificate_type_id": null }))
            .expect("patch with null type id");
        assert_eq!(clear.certificate_type_id, Some(None));
        draft.apply(clear);
        assert_eq!(draft.certificate_type_id, None);
        assert_eq!(draft.current_step, WizardStep::Payment);
    }

    #[test]
    fn unknown_patch_keys_are_rejected() {
        let result = serde_json::from_value::<DraftPatch>(json!({ "certificate_type": 4 }));
        assert!(result.is_err());
    }

    #[test]
    fn persisted_shape_has_no_photo_and_omits_empty_keys() {
        let draft = CertificateDraft::initial(WizardStep::ObjectInfo).merged(
            DraftPatch::default()
                .with_partner(Some(PartnerId("P-7".to_string())))
                .with_photo(Some(PhotoUpload {
                    file_name: "front.jpg".to_string(),
                    content_type: "image/jpeg".to_string(),
                    bytes: vec![0xff, 0xd8, 0xff],
                })),
        );

        let persisted = serde_json::to_value(draft.to_persisted()).expect("serialize");
        assert_eq!(
            persisted,
            json!({ "draft": { "current_step": "ObjectInfo", "partner_id": "P-7" } })
        );
        assert!(draft.object_photo.is_some());
    }

    #[test]
    fn snapshot_restores_everything_but_the_photo() {
        let draft = CertificateDraft::initial(WizardStep::Payment).merged(
            DraftPatch::default()
                .with_customer(Some(customer()))
                .with_payment_reference(Some("pi_123".to_string()))
                .with_photo(Some(PhotoUpload {
                    file_name: "back.png".to_string(),
                    content_type: "image/png".to_string(),
                    bytes: vec![1, 2, 3],
                })),
        );

        let restored = CertificateDraft::from_snapshot(draft.snapshot());
        assert_eq!(restored.customer_data, draft.customer_data);
        assert_eq!(restored.payment_reference.as_deref(), Some("pi_123"));
        assert_eq!(restored.object_photo, None);
    }
}
