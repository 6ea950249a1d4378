//! Draft stores: in-progress certification requests, one per [`DraftSlot`], persisted
//! write-through so a reload resumes the same step and answers.

pub mod draft;
pub mod storage;
pub mod store;

use serde::{Deserialize, Serialize};

use crate::flows::FlowVariant;

pub use draft::{CertificateDraft, DraftPatch, DraftSnapshot, PersistedDraft};
pub use storage::{DraftStorage, FileDraftStorage, InMemoryDraftStorage, StorageError};
pub use store::DraftStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftSlot {
    /// Legacy general-purpose slot; follows the partner step sequence.
    General,
    Client,
    Partner,
}

impl DraftSlot {
    pub const ALL: [DraftSlot; 3] = [DraftSlot::General, DraftSlot::Client, DraftSlot::Partner];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Client => "client",
            Self::Partner => "partner",
        }
    }

    pub fn storage_key(&self) -> &'static str {
        match self {
            Self::General => "certificate-draft",
            Self::Client => "client-certificate-draft",
            Self::Partner => "partner-certificate-draft",
        }
    }

    pub fn flow_variant(&self) -> FlowVariant {
        match self {
            Self::General | Self::Partner => FlowVariant::Partner,
            Self::Client => FlowVariant::Customer,
        }
    }
}

impl std::str::FromStr for DraftSlot {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(Self::General),
            "client" | "customer" => Ok(Self::Client),
            "partner" => Ok(Self::Partner),
            other => Err(format!("unknown draft slot `{other}` (expected general|client|partner)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DraftSlot;
    use crate::flows::FlowVariant;

    #[test]
    fn slots_map_to_distinct_storage_keys() {
        assert_eq!(DraftSlot::General.storage_key(), "certificate-draft");
        assert_eq!(DraftSlot::Client.storage_key(), "client-certificate-draft");
        assert_eq!(DraftSlot::Partner.storage_key(), "partner-certificate-draft");
        assert_eq!(DraftSlot::Client.flow_variant(), FlowVariant::Customer);
        assert_eq!(DraftSlot::General.flow_variant(), FlowVariant::Partner);
    }

    #[test]
    fn slot_names_parse_case_insensitively() {
        assert_eq!("Client".parse::<DraftSlot>(), Ok(DraftSlot::Client));
        assert_eq!("customer".parse::<DraftSlot>(), Ok(DraftSlot::Client));
        assert!("admin".parse::<DraftSlot>().is_err());
    }
}
