use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::SnapshotResult;
use crate::snapshot::{self, ChartContent};

/// Ledger entry: one immutable version of a chart definition.
///
/// Version numbers are strictly increasing per definition, start at 1, and
/// are never reused; a unique index on `(definition_id, version_number)`
/// backs the allocation. Once written, only the three approval fields ever
/// change, and they transition exactly once from unset to set.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chart_versions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub definition_id: i32,
    pub version_number: i32,
    #[sea_orm(column_type = "Text")]
    pub snapshot: String,
    pub diff_summary: Option<Json>,
    pub rollback_source_version: Option<i32>,
    pub approved: bool,
    pub approved_by: Option<String>,
    pub approved_at: Option<ChronoDateTimeUtc>,
    pub created_at: ChronoDateTimeUtc,
    pub created_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::chart_definitions::Entity",
        from = "Column::DefinitionId",
        to = "super::chart_definitions::Column::Id",
        on_delete = "Cascade"
    )]
    ChartDefinitions,
}

impl Related<super::chart_definitions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChartDefinitions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Get a formatted version string
    pub fn version_string(&self) -> String {
        format!("v{}", self.version_number)
    }

    /// Check if this version is awaiting approval
    pub fn is_pending(&self) -> bool {
        !self.approved
    }

    /// Check if this version was produced by a rollback
    pub fn is_rollback(&self) -> bool {
        self.rollback_source_version.is_some()
    }

    /// Decode the stored snapshot payload
    pub fn content(&self) -> SnapshotResult<ChartContent> {
        snapshot::decode(&self.snapshot)
    }
}
