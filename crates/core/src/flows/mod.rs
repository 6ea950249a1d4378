pub mod engine;
pub mod gating;
pub mod states;

pub use engine::{CustomerFlow, FlowDefinition, FlowEngine, FlowTransitionError, PartnerFlow};
pub use gating::step_requirements;
pub use states::{
    FlowEvent, FlowVariant, StepFieldError, StepNavigation, TransitionOutcome, WizardStep,
};
