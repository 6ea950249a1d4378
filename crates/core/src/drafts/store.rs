use std::sync::Arc;

use tracing::{debug, warn};

use crate::drafts::draft::{CertificateDraft, DraftPatch, PersistedDraft};
use crate::drafts::storage::DraftStorage;
use crate::drafts::DraftSlot;
use crate::errors::{ApplicationError, DomainError};
use crate::flows::FlowVariant;

/// Owns the draft for one slot. Every mutation is written through to storage before it becomes
/// visible in memory, so a failed write leaves the previous draft in place.
pub struct DraftStore {
    slot: DraftSlot,
    initial: CertificateDraft,
    draft: CertificateDraft,
    storage: Arc<dyn DraftStorage>,
}

impl DraftStore {
    /// Hydrates from storage. Snapshots that cannot be decoded, or that sit on a step outside
    /// the slot's flow, are discarded in favour of the initial draft.
    pub fn open(slot: DraftSlot, storage: Arc<dyn DraftStorage>) -> Result<Self, ApplicationError> {
        let flow = slot.flow_variant();
        let initial = CertificateDraft::initial(flow.steps()[0]);
        let key = slot.storage_key();

        let draft = match storage.read(key)? {
            None => initial.clone(),
            Some(payload) => match serde_json::from_str::<PersistedDraft>(&payload) {
                Ok(persisted) if flow.contains(persisted.draft.current_step) => {
                    debug!(
                        event_name = "draft.hydrated",
                        draft_key = key,
                        current_step = %persisted.draft.current_step,
                        "restored persisted draft"
                    );
                    CertificateDraft::from_snapshot(persisted.draft)
                }
                Ok(persisted) => {
                    warn!(
                        event_name = "draft.hydrate_discarded",
                        draft_key = key,
                        current_step = %persisted.draft.current_step,
                        "persisted draft step is not part of this flow"
                    );
                    initial.clone()
                }
                Err(error) => {
                    warn!(
                        event_name = "draft.hydrate_discarded",
                        draft_key = key,
                        error = %error,
                        "persisted draft could not be decoded"
                    );
                    initial.clone()
                }
            },
        };

        Ok(Self { slot, initial, draft, storage })
    }

    pub fn slot(&self) -> DraftSlot {
        self.slot
    }

    pub fn flow(&self) -> FlowVariant {
        self.slot.flow_variant()
    }

    pub fn draft(&self) -> &CertificateDraft {
        &self.draft
    }

    pub fn initial_draft(&self) -> &CertificateDraft {
        &self.initial
    }

    pub fn set_draft(&mut self, patch: DraftPatch) -> Result<(), ApplicationError> {
        if let Some(step) = patch.current_step {
            if !self.flow().contains(step) {
                return Err(DomainError::StepNotInFlow { step, flow: self.flow() }.into());
            }
        }

        let next = self.draft.merged(patch);
        self.persist(&next)?;
        self.draft = next;
        Ok(())
    }

    /// Back to the flow's initial draft; used on cancellation and after submission.
    pub fn clear_draft(&mut self) -> Result<(), ApplicationError> {
        let next = self.initial.clone();
        self.persist(&next)?;
        self.draft = next;
        Ok(())
    }

    fn persist(&self, draft: &CertificateDraft) -> Result<(), ApplicationError> {
        let key = self.slot.storage_key();
        let payload = serde_json::to_string(&draft.to_persisted())
            .map_err(|error| ApplicationError::Persistence(error.to_string()))?;
        self.storage.write(key, &payload)?;

        debug!(
            event_name = "draft.persisted",
            draft_key = key,
            current_step = %draft.current_step,
            "draft written to storage"
        );
        Ok(())
    }
}

impl std::fmt::Debug for DraftStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftStore").field("slot", &self.slot).field("draft", &self.draft).finish()
    }
}
