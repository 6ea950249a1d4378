use thiserror::Error;

use crate::domain::certificate::CertificateStatus;
use crate::drafts::storage::StorageError;
use crate::flows::{FlowTransitionError, FlowVariant, WizardStep};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid certificate transition from {from:?} to {to:?}")]
    InvalidCertificateTransition { from: CertificateStatus, to: CertificateStatus },
    #[error("step {step} is not part of the {flow:?} flow")]
    StepNotInFlow { step: WizardStep, flow: FlowVariant },
    #[error("cannot move from {from} to {to} directly; use next/back")]
    StepChangeRejected { from: WizardStep, to: WizardStep },
    #[error(transparent)]
    FlowTransition(#[from] FlowTransitionError),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl From<StorageError> for ApplicationError {
    fn from(value: StorageError) -> Self {
        Self::Persistence(value.to_string())
    }
}
