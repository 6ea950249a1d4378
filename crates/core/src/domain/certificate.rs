use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::certificate_type::CertificateTypeId;
use crate::domain::customer::{CustomerData, PartnerId};
use crate::domain::object::ObjectData;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateId(pub String);

impl std::fmt::Display for CertificateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    AwaitingPayment,
    AwaitingInspection,
    Inspected,
    Issued,
    Cancelled,
}

impl CertificateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingPayment => "awaiting_payment",
            Self::AwaitingInspection => "awaiting_inspection",
            Self::Inspected => "inspected",
            Self::Issued => "issued",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "awaiting_payment" => Some(Self::AwaitingPayment),
            "awaiting_inspection" => Some(Self::AwaitingInspection),
            "inspected" => Some(Self::Inspected),
            "issued" => Some(Self::Issued),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// A certification request once it has left the draft stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: CertificateId,
    pub certificate_type_id: CertificateTypeId,
    pub status: CertificateStatus,
    pub customer: CustomerData,
    pub object: ObjectData,
    pub partner_id: Option<PartnerId>,
    pub created_at: DateTime<Utc>,
}

impl Certificate {
    pub fn can_transition_to(&self, next: CertificateStatus) -> bool {
        use CertificateStatus::{AwaitingInspection, AwaitingPayment, Cancelled, Inspected, Issued};

        matches!(
            (self.status, next),
            (AwaitingPayment, AwaitingInspection)
                | (AwaitingInspection, Inspected)
                | (Inspected, Issued)
                | (AwaitingPayment | AwaitingInspection | Inspected, Cancelled)
        )
    }

    pub fn transition_to(&mut self, next: CertificateStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(DomainError::InvalidCertificateTransition { from: self.status, to: next })
    }
}
