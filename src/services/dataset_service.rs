use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};

use crate::database::entities::datasets;
use crate::errors::{DefinitionError, DefinitionResult};

/// Read-only lookup into the dataset catalog.
#[derive(Clone)]
pub struct DatasetService {
    db: DatabaseConnection,
}

impl DatasetService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_datasets(&self) -> DefinitionResult<Vec<datasets::Model>> {
        let datasets = datasets::Entity::find()
            .order_by_asc(datasets::Column::Name)
            .all(&self.db)
            .await?;

        Ok(datasets)
    }

    pub async fn get_dataset(&self, id: i32) -> DefinitionResult<datasets::Model> {
        datasets::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DefinitionError::DatasetNotFound(id))
    }

    /// Verify a dataset exists and is accepting new chart definitions.
    pub async fn ensure_active(&self, id: i32) -> DefinitionResult<datasets::Model> {
        let dataset = self.get_dataset(id).await?;

        if !dataset.is_active {
            return Err(DefinitionError::DatasetInactive(id));
        }

        Ok(dataset)
    }
}
