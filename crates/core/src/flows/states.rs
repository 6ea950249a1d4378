use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowVariant {
    /// Customer-initiated certification, including partner selection.
    Customer,
    /// Partner-initiated certification.
    Partner,
}

const CUSTOMER_STEPS: &[WizardStep] = &[
    WizardStep::CustomerInfo,
    WizardStep::ObjectInfo,
    WizardStep::Service,
    WizardStep::Partner,
    WizardStep::Payment,
];

const PARTNER_STEPS: &[WizardStep] =
    &[WizardStep::CustomerInfo, WizardStep::ObjectInfo, WizardStep::Service, WizardStep::Payment];

impl FlowVariant {
    /// Ordered step sequence. The two variants are separate linear sequences.
    pub fn steps(&self) -> &'static [WizardStep] {
        match self {
            Self::Customer => CUSTOMER_STEPS,
            Self::Partner => PARTNER_STEPS,
        }
    }

    pub fn contains(&self, step: WizardStep) -> bool {
        self.steps().contains(&step)
    }

    pub fn position(&self, step: WizardStep) -> Option<usize> {
        self.steps().iter().position(|candidate| *candidate == step)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WizardStep {
    CustomerInfo,
    ObjectInfo,
    Service,
    Partner,
    Payment,
}

impl WizardStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomerInfo => "CustomerInfo",
            Self::ObjectInfo => "ObjectInfo",
            Self::Service => "Service",
            Self::Partner => "Partner",
            Self::Payment => "Payment",
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WizardStep {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "CustomerInfo" => Ok(Self::CustomerInfo),
            "ObjectInfo" => Ok(Self::ObjectInfo),
            "Service" => Ok(Self::Service),
            "Partner" => Ok(Self::Partner),
            "Payment" => Ok(Self::Payment),
            other => Err(format!("unknown wizard step `{other}`")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowEvent {
    Advance,
    Retreat,
    Submit,
}

/// Inline error for a single field of the current step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFieldError {
    pub field: String,
    pub message: String,
}

impl StepFieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

/// What a step indicator and its navigation controls need to render.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepNavigation {
    pub steps: Vec<WizardStep>,
    pub current_step_index: usize,
    pub can_advance: bool,
    pub can_retreat: bool,
    pub can_submit: bool,
    pub field_errors: Vec<StepFieldError>,
}

impl StepNavigation {
    pub fn is_final_step(&self) -> bool {
        self.current_step_index + 1 == self.steps.len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: WizardStep,
    pub to: WizardStep,
    pub event: FlowEvent,
}
