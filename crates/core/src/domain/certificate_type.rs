use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateTypeId(pub i64);

impl std::fmt::Display for CertificateTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-sourced certificate configuration. Read-only from the wizard's point of view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateType {
    pub id: CertificateTypeId,
    pub name: String,
    pub price: Decimal,
    pub physical: bool,
    #[serde(default)]
    pub features: Vec<String>,
    /// Field-name prefixes suppressed from the inspection report for this type.
    #[serde(default)]
    pub excluded_report_form_fields: Vec<String>,
}

impl CertificateType {
    pub fn excludes(&self, field: &str) -> bool {
        is_excluded(field, &self.excluded_report_form_fields)
    }
}

/// Token-prefix match: `case` excludes `case` and `case_material`, but not `casement`.
pub fn is_excluded<S: AsRef<str>>(field: &str, excluded_prefixes: &[S]) -> bool {
    excluded_prefixes
        .iter()
        .map(AsRef::as_ref)
        .filter(|prefix| !prefix.is_empty())
        .any(|prefix| {
            field.strip_prefix(prefix).is_some_and(|rest| {
                rest.is_empty() || rest.starts_with('_') || prefix.ends_with('_')
            })
        })
}
