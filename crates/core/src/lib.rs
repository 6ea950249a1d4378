pub mod audit;
pub mod config;
pub mod domain;
pub mod drafts;
pub mod errors;
pub mod flows;
pub mod report;
pub mod wizard;

pub use audit::{AuditContext, AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::certificate::{Certificate, CertificateId, CertificateStatus};
pub use domain::certificate_type::{CertificateType, CertificateTypeId};
pub use domain::customer::{CustomerData, PartnerId};
pub use domain::object::{ObjectData, PhotoUpload};
pub use drafts::{
    CertificateDraft, DraftPatch, DraftSlot, DraftSnapshot, DraftStorage, DraftStore,
    FileDraftStorage, InMemoryDraftStorage,
};
pub use errors::{ApplicationError, DomainError};
pub use flows::{CustomerFlow, FlowEngine, FlowVariant, PartnerFlow, StepNavigation, WizardStep};
pub use report::{
    ReportFieldError, ReportFormStore, ReportSchema, ReportSession, ReportValidation,
    ReportValidator,
};
pub use wizard::{DraftWizard, StepMove};
