use anyhow::Result;
use chrono::Utc;
use sea_orm::*;
use tracing::info;

use crate::database::entities::datasets;

/// Seed the dataset catalog with example entries for local development.
/// Chart definitions can only be created against an active dataset, so a
/// fresh database needs at least one.
pub async fn seed_datasets(db: &DatabaseConnection) -> Result<()> {
    let existing = datasets::Entity::find()
        .filter(datasets::Column::Name.eq("Sales Orders"))
        .one(db)
        .await?;

    if existing.is_some() {
        info!("Example datasets already exist, skipping seed data creation");
        return Ok(());
    }

    info!("Creating example datasets");

    let now = Utc::now();
    let datasets_data = vec![
        (
            "Sales Orders",
            "Order lines from the commerce warehouse",
            "warehouse.sales_orders",
            true,
        ),
        (
            "Web Analytics",
            "Daily page view and session rollups",
            "warehouse.web_analytics",
            true,
        ),
        (
            "Legacy CRM",
            "Frozen export of the retired CRM",
            "archive.legacy_crm",
            false,
        ),
    ];

    let mut models = Vec::new();
    for (name, description, source, is_active) in datasets_data {
        models.push(datasets::ActiveModel {
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            source: Set(source.to_string()),
            is_active: Set(is_active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        });
    }

    datasets::Entity::insert_many(models).exec(db).await?;

    info!("Successfully created example datasets");
    Ok(())
}
