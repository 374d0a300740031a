use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Dataset catalog entry.
///
/// The versioning engine consumes this read-only: a chart definition may
/// only be created against a dataset that exists and is active. Ingestion
/// and cataloguing live elsewhere.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "datasets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub source: String,
    pub is_active: bool,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::chart_definitions::Entity")]
    ChartDefinitions,
}

impl Related<super::chart_definitions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChartDefinitions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
