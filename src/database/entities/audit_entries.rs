use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Audit trail entry.
///
/// Written fire-and-forget after a version write commits; the engine's
/// correctness never depends on these rows existing.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub actor: String,
    pub entity_type: String,
    pub entity_id: i32,
    pub action: String, // 'create', 'update', 'approve', 'rollback'
    pub changes: Option<Json>,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
