use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Chart definition aggregate head.
///
/// The content columns mirror the most recently approved ledger entry;
/// `current_version` is null until a first version is approved and only
/// ever advances to the highest approved version number. Definitions are
/// archived, never deleted, so their version history survives.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chart_definitions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub dataset_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub tags: String, // JSON array of tag strings
    #[sea_orm(column_type = "Text")]
    pub filter_content: String,
    #[sea_orm(column_type = "Text")]
    pub visual_content: String,
    #[sea_orm(column_type = "Text")]
    pub calculation_content: String,
    pub current_version: Option<i32>,
    pub auto_approve: bool,
    pub is_archived: bool,
    pub created_at: ChronoDateTimeUtc,
    pub created_by: String,
    pub updated_at: ChronoDateTimeUtc,
    pub updated_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::datasets::Entity",
        from = "Column::DatasetId",
        to = "super::datasets::Column::Id"
    )]
    Datasets,
    #[sea_orm(has_many = "super::chart_versions::Entity")]
    ChartVersions,
}

impl Related<super::datasets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Datasets.def()
    }
}

impl Related<super::chart_versions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChartVersions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Parse the tags column back into a list
    pub fn tag_list(&self) -> Vec<String> {
        serde_json::from_str(&self.tags).unwrap_or_default()
    }

    /// Whether any version has been approved yet
    pub fn has_approved_content(&self) -> bool {
        self.current_version.is_some()
    }
}
