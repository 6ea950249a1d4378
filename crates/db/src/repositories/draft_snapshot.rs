use chrono::Utc;
use sqlx::Row;

use certdesk_core::domain::certificate::CertificateId;
use certdesk_core::drafts::{DraftSlot, DraftSnapshot};

use super::{new_draft_id, parse_timestamp, DraftSnapshotRepository, RepositoryError, SavedDraft};
use crate::DbPool;

pub struct SqlDraftSnapshotRepository {
    pool: DbPool,
}

impl SqlDraftSnapshotRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_saved_draft(row: &sqlx::sqlite::SqliteRow) -> Result<SavedDraft, RepositoryError> {
    let slot_str: String =
        row.try_get("slot").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let payload_json: String =
        row.try_get("payload_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let slot = slot_str.parse::<DraftSlot>().map_err(RepositoryError::Decode)?;
    let snapshot: DraftSnapshot = serde_json::from_str(&payload_json)
        .map_err(|e| RepositoryError::Decode(format!("payload_json: {e}")))?;

    Ok(SavedDraft { slot, snapshot, updated_at: parse_timestamp("updated_at", &updated_at_str)? })
}

#[async_trait::async_trait]
impl DraftSnapshotRepository for SqlDraftSnapshotRepository {
    async fn save(
        &self,
        slot: DraftSlot,
        mut snapshot: DraftSnapshot,
    ) -> Result<SavedDraft, RepositoryError> {
        let id = snapshot.id.get_or_insert_with(new_draft_id).clone();
        let payload_json =
            serde_json::to_string(&snapshot).map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        sqlx::query(
            "INSERT INTO draft_snapshot (id, slot, current_step, payload_json, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 slot = excluded.slot,
                 current_step = excluded.current_step,
                 payload_json = excluded.payload_json,
                 updated_at = excluded.updated_at",
        )
        .bind(&id.0)
        .bind(slot.as_str())
        .bind(snapshot.current_step.as_str())
        .bind(payload_json)
        .bind(&now_str)
        .bind(&now_str)
        .execute(&self.pool)
        .await?;

        Ok(SavedDraft { slot, snapshot, updated_at: now })
    }

    async fn find_by_id(&self, id: &CertificateId) -> Result<Option<SavedDraft>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, slot, current_step, payload_json, updated_at
             FROM draft_snapshot WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_saved_draft(r)?)),
            None => Ok(None),
        }
    }
}
