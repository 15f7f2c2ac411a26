use serde::{Deserialize, Serialize};

use super::enums::AuditStatus;

/// One row of the append-only audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub user_id: String,
    pub event_type: String,
    pub event_name: String,
    pub status: AuditStatus,
    pub resource_type: String,
    pub resource_id: String,
    pub details: String,
}
