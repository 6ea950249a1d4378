//! Wizard controller: binds a draft store to the step sequence of its flow.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::certificate::CertificateId;
use crate::drafts::{CertificateDraft, DraftPatch, DraftSnapshot, DraftStore};
use crate::errors::{ApplicationError, DomainError};
use crate::flows::{
    FlowDefinition, FlowEngine, FlowEvent, FlowTransitionError, StepFieldError, StepNavigation,
    TransitionOutcome, WizardStep,
};

/// Result of a next/back request. A blocked move is an ordinary outcome, not an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepMove {
    Moved { from: WizardStep, to: WizardStep },
    Blocked { step: WizardStep, errors: Vec<StepFieldError> },
}

pub struct DraftWizard<F> {
    store: DraftStore,
    engine: FlowEngine<F>,
    audit: Option<(Arc<dyn AuditSink>, AuditContext)>,
}

impl<F> DraftWizard<F>
where
    F: FlowDefinition,
{
    pub fn new(store: DraftStore, flow: F) -> Result<Self, ApplicationError> {
        if store.flow() != flow.variant() {
            return Err(DomainError::InvariantViolation(format!(
                "draft slot {:?} follows the {:?} flow, not {:?}",
                store.slot(),
                store.flow(),
                flow.variant()
            ))
            .into());
        }
        Ok(Self { store, engine: FlowEngine::new(flow), audit: None })
    }

    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>, context: AuditContext) -> Self {
        self.audit = Some((sink, context));
        self
    }

    pub fn draft(&self) -> &CertificateDraft {
        self.store.draft()
    }

    pub fn store(&self) -> &DraftStore {
        &self.store
    }

    pub fn navigation(&self) -> StepNavigation {
        self.engine.navigation(self.store.draft())
    }

    /// Merges field values into the draft. A patch may restate the current step but never move
    /// it; steps change only through [`DraftWizard::next`] and [`DraftWizard::back`].
    pub fn update(&mut self, patch: DraftPatch) -> Result<StepNavigation, ApplicationError> {
        let current = self.store.draft().current_step;
        if let Some(requested) = patch.current_step.filter(|step| *step != current) {
            self.audit_draft("draft.step_change_rejected", AuditOutcome::Rejected, |event| {
                event.with_metadata("from", current.as_str()).with_metadata("to", requested.as_str())
            });
            return Err(DomainError::StepChangeRejected { from: current, to: requested }.into());
        }
        self.store.set_draft(patch)?;
        Ok(self.navigation())
    }

    pub fn next(&mut self) -> Result<StepMove, ApplicationError> {
        self.step(FlowEvent::Advance)
    }

    pub fn back(&mut self) -> Result<StepMove, ApplicationError> {
        self.step(FlowEvent::Retreat)
    }

    /// Checks every step and hands back the snapshot to turn into a certificate. The draft
    /// stays in place until [`DraftWizard::complete_submission`] confirms the remote write.
    pub fn submission(&self) -> Result<DraftSnapshot, ApplicationError> {
        self.apply(FlowEvent::Submit).map_err(DomainError::from)?;
        Ok(self.store.draft().snapshot())
    }

    pub fn complete_submission(
        &mut self,
        certificate_id: &CertificateId,
    ) -> Result<(), ApplicationError> {
        self.store.clear_draft()?;
        self.audit_draft("draft.submitted", AuditOutcome::Success, |event| {
            event.with_metadata("certificate_id", certificate_id.0.clone())
        });
        info!(
            event_name = "draft.submitted",
            draft_key = self.store.slot().storage_key(),
            certificate_id = %certificate_id,
            "draft submitted and cleared"
        );
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), ApplicationError> {
        self.store.clear_draft()?;
        self.audit_draft("draft.cancelled", AuditOutcome::Success, |event| event);
        info!(
            event_name = "draft.cancelled",
            draft_key = self.store.slot().storage_key(),
            "draft cancelled"
        );
        Ok(())
    }

    fn step(&mut self, event: FlowEvent) -> Result<StepMove, ApplicationError> {
        match self.apply(event) {
            Ok(outcome) => {
                self.store.set_draft(DraftPatch::step(outcome.to))?;
                Ok(StepMove::Moved { from: outcome.from, to: outcome.to })
            }
            Err(FlowTransitionError::MissingRequiredFields { step, errors }) => {
                Ok(StepMove::Blocked { step, errors })
            }
            Err(error) => Err(DomainError::from(error).into()),
        }
    }

    fn audit_draft(
        &self,
        event_type: &str,
        outcome: AuditOutcome,
        decorate: impl FnOnce(AuditEvent) -> AuditEvent,
    ) {
        if let Some((sink, context)) = &self.audit {
            sink.emit(decorate(AuditEvent::new(context, event_type, AuditCategory::Draft, outcome)));
        }
    }

    fn apply(&self, event: FlowEvent) -> Result<TransitionOutcome, FlowTransitionError> {
        match &self.audit {
            Some((sink, context)) => {
                self.engine.apply_with_audit(self.store.draft(), event, sink.as_ref(), context)
            }
            None => self.engine.apply(self.store.draft(), event),
        }
    }
}
