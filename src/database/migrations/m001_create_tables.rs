use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create datasets catalog table
        manager
            .create_table(
                Table::create()
                    .table(Datasets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Datasets::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Datasets::Name).text().not_null())
                    .col(ColumnDef::new(Datasets::Description).text())
                    .col(ColumnDef::new(Datasets::Source).text().not_null())
                    .col(ColumnDef::new(Datasets::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Datasets::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Datasets::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Create chart_definitions table (aggregate head)
        manager
            .create_table(
                Table::create()
                    .table(ChartDefinitions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ChartDefinitions::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(ChartDefinitions::DatasetId).integer().not_null())
                    .col(ColumnDef::new(ChartDefinitions::Name).text().not_null())
                    .col(ColumnDef::new(ChartDefinitions::Description).text())
                    .col(ColumnDef::new(ChartDefinitions::Tags).text().not_null().default("[]"))
                    .col(ColumnDef::new(ChartDefinitions::FilterContent).text().not_null())
                    .col(ColumnDef::new(ChartDefinitions::VisualContent).text().not_null())
                    .col(ColumnDef::new(ChartDefinitions::CalculationContent).text().not_null())
                    .col(ColumnDef::new(ChartDefinitions::CurrentVersion).integer())
                    .col(ColumnDef::new(ChartDefinitions::AutoApprove).boolean().not_null().default(false))
                    .col(ColumnDef::new(ChartDefinitions::IsArchived).boolean().not_null().default(false))
                    .col(ColumnDef::new(ChartDefinitions::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(ChartDefinitions::CreatedBy).text().not_null())
                    .col(ColumnDef::new(ChartDefinitions::UpdatedAt).timestamp().not_null())
                    .col(ColumnDef::new(ChartDefinitions::UpdatedBy).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chart_definitions_dataset_id")
                            .from(ChartDefinitions::Table, ChartDefinitions::DatasetId)
                            .to(Datasets::Table, Datasets::Id)
                    )
                    .to_owned(),
            )
            .await?;

        // Create chart_versions ledger table
        manager
            .create_table(
                Table::create()
                    .table(ChartVersions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ChartVersions::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(ChartVersions::DefinitionId).integer().not_null())
                    .col(ColumnDef::new(ChartVersions::VersionNumber).integer().not_null())
                    .col(ColumnDef::new(ChartVersions::Snapshot).text().not_null())
                    .col(ColumnDef::new(ChartVersions::DiffSummary).json())
                    .col(ColumnDef::new(ChartVersions::RollbackSourceVersion).integer())
                    .col(ColumnDef::new(ChartVersions::Approved).boolean().not_null().default(false))
                    .col(ColumnDef::new(ChartVersions::ApprovedBy).text())
                    .col(ColumnDef::new(ChartVersions::ApprovedAt).timestamp())
                    .col(ColumnDef::new(ChartVersions::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(ChartVersions::CreatedBy).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chart_versions_definition_id")
                            .from(ChartVersions::Table, ChartVersions::DefinitionId)
                            .to(ChartDefinitions::Table, ChartDefinitions::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                    )
                    .to_owned(),
            )
            .await?;

        // Create audit_entries table
        manager
            .create_table(
                Table::create()
                    .table(AuditEntries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AuditEntries::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(AuditEntries::Actor).text().not_null())
                    .col(ColumnDef::new(AuditEntries::EntityType).text().not_null())
                    .col(ColumnDef::new(AuditEntries::EntityId).integer().not_null())
                    .col(ColumnDef::new(AuditEntries::Action).text().not_null())
                    .col(ColumnDef::new(AuditEntries::Changes).json())
                    .col(ColumnDef::new(AuditEntries::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Version numbers are allocated as max+1 per definition; this unique
        // index is what turns a concurrent double-allocation into a
        // detectable conflict instead of a duplicate number.
        manager
            .create_index(
                Index::create()
                    .name("idx_chart_versions_definition_version")
                    .table(ChartVersions::Table)
                    .col(ChartVersions::DefinitionId)
                    .col(ChartVersions::VersionNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_chart_definitions_dataset_id")
                    .table(ChartDefinitions::Table)
                    .col(ChartDefinitions::DatasetId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_entries_entity")
                    .table(AuditEntries::Table)
                    .col(AuditEntries::EntityType)
                    .col(AuditEntries::EntityId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditEntries::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ChartVersions::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ChartDefinitions::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Datasets::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Datasets {
    Table,
    Id,
    Name,
    Description,
    Source,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ChartDefinitions {
    Table,
    Id,
    DatasetId,
    Name,
    Description,
    Tags,
    FilterContent,
    VisualContent,
    CalculationContent,
    CurrentVersion,
    AutoApprove,
    IsArchived,
    CreatedAt,
    CreatedBy,
    UpdatedAt,
    UpdatedBy,
}

#[derive(DeriveIden)]
enum ChartVersions {
    Table,
    Id,
    DefinitionId,
    VersionNumber,
    Snapshot,
    DiffSummary,
    RollbackSourceVersion,
    Approved,
    ApprovedBy,
    ApprovedAt,
    CreatedAt,
    CreatedBy,
}

#[derive(DeriveIden)]
enum AuditEntries {
    Table,
    Id,
    Actor,
    EntityType,
    EntityId,
    Action,
    Changes,
    CreatedAt,
}
