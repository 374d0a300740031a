use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, DatabaseConnection, Set};
use serde_json::Value;
use tracing::warn;

use crate::database::entities::audit_entries;

const ENTITY_TYPE: &str = "ChartDefinition";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuditAction {
    Create,
    Update,
    Approve,
    Rollback,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Approve => "approve",
            AuditAction::Rollback => "rollback",
        }
    }
}

/// Fire-and-forget audit sink.
///
/// Called after the version write has committed; a failed audit write is
/// logged and swallowed, never surfaced to the caller and never able to
/// roll back the version.
#[derive(Clone)]
pub struct AuditService {
    db: DatabaseConnection,
}

impl AuditService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn log_action(
        &self,
        actor: &str,
        entity_id: i32,
        action: AuditAction,
        changes: Option<Value>,
    ) {
        let entry = audit_entries::ActiveModel {
            id: NotSet,
            actor: Set(actor.to_string()),
            entity_type: Set(ENTITY_TYPE.to_string()),
            entity_id: Set(entity_id),
            action: Set(action.as_str().to_string()),
            changes: Set(changes),
            created_at: Set(Utc::now()),
        };

        if let Err(err) = entry.insert(&self.db).await {
            warn!(
                "Failed to record {} audit entry for chart definition {}: {}",
                action.as_str(),
                entity_id,
                err
            );
        }
    }
}
