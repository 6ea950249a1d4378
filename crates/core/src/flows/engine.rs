use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::drafts::CertificateDraft;
use crate::flows::gating::step_requirements;
use crate::flows::states::{
    FlowEvent, FlowVariant, StepFieldError, StepNavigation, TransitionOutcome, WizardStep,
};

pub trait FlowDefinition {
    fn variant(&self) -> FlowVariant;

    fn steps(&self) -> &'static [WizardStep] {
        self.variant().steps()
    }

    fn initial_step(&self) -> WizardStep {
        self.steps()[0]
    }

    fn transition(
        &self,
        draft: &CertificateDraft,
        event: FlowEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_linear(self.variant(), draft, event)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CustomerFlow;

impl FlowDefinition for CustomerFlow {
    fn variant(&self) -> FlowVariant {
        FlowVariant::Customer
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PartnerFlow;

impl FlowDefinition for PartnerFlow {
    fn variant(&self) -> FlowVariant {
        FlowVariant::Partner
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("step {step} is incomplete: {errors:?}")]
    MissingRequiredFields { step: WizardStep, errors: Vec<StepFieldError> },
    #[error("invalid transition from {step} using event {event:?}")]
    InvalidTransition { step: WizardStep, event: FlowEvent },
    #[error("step {step} is not part of the {flow:?} flow")]
    StepNotInFlow { step: WizardStep, flow: FlowVariant },
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn variant(&self) -> FlowVariant {
        self.flow.variant()
    }

    pub fn steps(&self) -> &'static [WizardStep] {
        self.flow.steps()
    }

    pub fn initial_step(&self) -> WizardStep {
        self.flow.initial_step()
    }

    /// Position and control state for the draft's current step.
    pub fn navigation(&self, draft: &CertificateDraft) -> StepNavigation {
        let steps = self.steps();
        let current_step_index = self.variant().position(draft.current_step).unwrap_or(0);
        let is_final = current_step_index + 1 == steps.len();
        let field_errors = step_requirements(steps[current_step_index], draft);

        let can_submit = is_final && steps.iter().all(|step| step_requirements(*step, draft).is_empty());

        StepNavigation {
            steps: steps.to_vec(),
            current_step_index,
            can_advance: !is_final && field_errors.is_empty(),
            can_retreat: current_step_index > 0,
            can_submit,
            field_errors,
        }
    }

    pub fn apply(
        &self,
        draft: &CertificateDraft,
        event: FlowEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(draft, event)
    }

    pub fn apply_with_audit<S>(
        &self,
        draft: &CertificateDraft,
        event: FlowEvent,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(draft, event);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    AuditEvent::new(
                        audit,
                        "flow.transition_applied",
                        AuditCategory::Flow,
                        AuditOutcome::Success,
                    )
                    .with_metadata("from", outcome.from.as_str())
                    .with_metadata("to", outcome.to.as_str())
                    .with_metadata("event", format!("{:?}", outcome.event)),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        audit,
                        "flow.transition_rejected",
                        AuditCategory::Flow,
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("event", format!("{event:?}"))
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

impl Default for FlowEngine<CustomerFlow> {
    fn default() -> Self {
        Self::new(CustomerFlow)
    }
}

fn transition_linear(
    flow: FlowVariant,
    draft: &CertificateDraft,
    event: FlowEvent,
) -> Result<TransitionOutcome, FlowTransitionError> {
    let steps = flow.steps();
    let current = draft.current_step;
    let index = flow
        .position(current)
        .ok_or(FlowTransitionError::StepNotInFlow { step: current, flow })?;
    let is_final = index + 1 == steps.len();

    let to = match event {
        FlowEvent::Advance if !is_final => {
            let errors = step_requirements(current, draft);
            if !errors.is_empty() {
                return Err(FlowTransitionError::MissingRequiredFields { step: current, errors });
            }
            steps[index + 1]
        }
        FlowEvent::Retreat if index > 0 => steps[index - 1],
        FlowEvent::Submit if is_final => {
            // Earlier steps are re-checked: a resumed draft may have been edited out of band.
            let errors: Vec<StepFieldError> =
                steps.iter().flat_map(|step| step_requirements(*step, draft)).collect();
            if !errors.is_empty() {
                return Err(FlowTransitionError::MissingRequiredFields { step: current, errors });
            }
            current
        }
        _ => return Err(FlowTransitionError::InvalidTransition { step: current, event }),
    };

    Ok(TransitionOutcome { from: current, to, event })
}
