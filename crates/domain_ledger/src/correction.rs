//! Append-only correction audit log
//!
//! Every retroactive edit to an invoice or a settled batch is recorded
//! here, one entry per changed field. Entries are never updated or
//! deleted; the log is the trail surfaced to operators reviewing why a
//! historical record differs from its original values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::CorrectionId;

/// The kind of entity a correction applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEntity {
    FuelInvoice,
    FuelBatch,
    VendorInvoice,
    VendorBatch,
}

/// A single audited retroactive edit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Correction {
    /// Unique identifier
    pub id: CorrectionId,
    /// Entity kind
    pub entity: AuditEntity,
    /// Identifier of the edited entity
    pub entity_id: Uuid,
    /// Name of the changed field
    pub field: String,
    /// Value before the edit
    pub old_value: String,
    /// Value after the edit
    pub new_value: String,
    /// Operator-supplied reason for the edit
    pub reason: String,
    /// Who made the edit
    pub changed_by: String,
    /// When the correction was recorded
    pub created_at: DateTime<Utc>,
}

/// The append-only correction log
///
/// Exposes no update or delete operations. An entry is written exactly
/// once per changed field, and only when the caller supplied a reason and
/// the field's value actually differs from the prior value.
#[derive(Debug, Default)]
pub struct CorrectionLog {
    entries: Vec<Correction>,
}

impl CorrectionLog {
    /// Creates an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a correction entry
    pub fn record(
        &mut self,
        entity: AuditEntity,
        entity_id: Uuid,
        field: &str,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
        reason: &str,
        changed_by: &str,
    ) -> &Correction {
        let correction = Correction {
            id: CorrectionId::new(),
            entity,
            entity_id,
            field: field.to_string(),
            old_value: old_value.into(),
            new_value: new_value.into(),
            reason: reason.to_string(),
            changed_by: changed_by.to_string(),
            created_at: Utc::now(),
        };

        tracing::debug!(
            entity = ?correction.entity,
            entity_id = %correction.entity_id,
            field = %correction.field,
            changed_by = %correction.changed_by,
            "correction recorded"
        );

        self.entries.push(correction);
        self.entries.last().unwrap()
    }

    /// All entries, in the order they were recorded
    pub fn entries(&self) -> &[Correction] {
        &self.entries
    }

    /// Entries for a single entity, in recording order
    pub fn for_entity(&self, entity_id: Uuid) -> Vec<&Correction> {
        self.entries
            .iter()
            .filter(|c| c.entity_id == entity_id)
            .collect()
    }

    /// Number of entries in the log
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
