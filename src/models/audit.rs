//! Audit trail entries written after successful mutations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of mutation an [`AuditRecord`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

/// One element of the on-disk audit array.
///
/// # JSON Example
///
/// ```json
/// { "action": "UPDATE", "id": 3, "name": "Widget", "timestamp": "2025-12-20T10:00:00Z" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub action: AuditAction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    pub fn created(id: i32, name: &str) -> Self {
        Self {
            action: AuditAction::Create,
            id: Some(id),
            name: Some(name.to_string()),
            timestamp: Utc::now(),
        }
    }

    pub fn updated(id: i32, name: &str) -> Self {
        Self {
            action: AuditAction::Update,
            id: Some(id),
            name: Some(name.to_string()),
            timestamp: Utc::now(),
        }
    }

    pub fn deleted(id: i32) -> Self {
        Self {
            action: AuditAction::Delete,
            id: Some(id),
            name: None,
            timestamp: Utc::now(),
        }
    }
}
