//! Inspection report authoring: accumulated form data, its normalization, the per-type
//! validation schema and the aggregated validator.

pub mod form;
pub mod normalize;
pub mod schema;
pub mod session;
pub mod validator;

pub use form::{FieldErrorState, FormData, ReportFieldError, ReportFormStore};
pub use normalize::{normalize_form_data, normalize_value};
pub use schema::{effective_schema, FieldKind, FieldRule, ReportSchema};
pub use session::{ReportSession, ReportSubmissionError};
pub use validator::{
    check_form_data, derive_section, CertificateCatalog, CertificateTypeResolver, ReportValidation, ReportValidator,
    ResolveError, UNKNOWN_ERROR_FIELD, UNKNOWN_ERROR_MESSAGE,
};
