use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, DatabaseConnection, EntityTrait, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::auth::Actor;
use crate::database::entities::{chart_definitions, chart_versions};
use crate::diff::{self, ContentDiff};
use crate::errors::{DefinitionError, DefinitionResult};
use crate::services::audit_service::{AuditAction, AuditService};
use crate::services::dataset_service::DatasetService;
use crate::services::version_service::VersionService;
use crate::snapshot::{self, ChartContent};

/// Aggregate-level operations on chart definitions: create/update with
/// versioning, explicit approval, rollback, comparison, and archival.
#[derive(Clone)]
pub struct DefinitionService {
    db: DatabaseConnection,
    versions: VersionService,
    datasets: DatasetService,
    audit: AuditService,
}

#[derive(Clone, Debug)]
pub struct DefinitionUpsertRequest {
    /// None or 0 creates a new definition
    pub definition_id: Option<i32>,
    pub dataset_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub filter: Value,
    pub visual: Value,
    pub calculation: Value,
    pub auto_approve: bool,
}

/// Result of comparing two ledger entries of one definition
#[derive(Clone, Debug, Serialize)]
pub struct Comparison {
    pub definition_id: i32,
    pub from_version: i32,
    pub to_version: i32,
    pub diff: ContentDiff,
}

impl DefinitionService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            versions: VersionService::new(db.clone()),
            datasets: DatasetService::new(db.clone()),
            audit: AuditService::new(db.clone()),
            db,
        }
    }

    pub async fn list_definitions(&self) -> DefinitionResult<Vec<chart_definitions::Model>> {
        let definitions = chart_definitions::Entity::find()
            .order_by_desc(chart_definitions::Column::UpdatedAt)
            .all(&self.db)
            .await?;

        Ok(definitions)
    }

    pub async fn get_definition(&self, id: i32) -> DefinitionResult<chart_definitions::Model> {
        self.require(id).await
    }

    /// Create a definition (with its first version, atomically) or append a
    /// new version to an existing one, then run the approval gate.
    pub async fn create_or_update(
        &self,
        actor: &Actor,
        request: DefinitionUpsertRequest,
    ) -> DefinitionResult<(chart_definitions::Model, chart_versions::Model)> {
        if request.name.trim().is_empty() {
            return Err(DefinitionError::MissingField("name".to_string()));
        }
        if request.dataset_id <= 0 {
            return Err(DefinitionError::MissingField("datasetId".to_string()));
        }

        let content = ChartContent {
            name: request.name.clone(),
            description: request.description.clone(),
            tags: request.tags.clone(),
            filter: request.filter.clone(),
            visual: request.visual.clone(),
            calculation: request.calculation.clone(),
        }
        .normalized();

        // Schema problems in caller input are validation failures, rejected
        // before any write; only stored payloads that fail to decode count
        // as integrity errors.
        snapshot::validate(&content)
            .map_err(|err| DefinitionError::Validation(err.to_string()))?;

        self.datasets.ensure_active(request.dataset_id).await?;

        match request.definition_id.filter(|id| *id > 0) {
            None => self.create(actor, &request, &content).await,
            Some(id) => self.update(actor, id, &request, &content).await,
        }
    }

    async fn create(
        &self,
        actor: &Actor,
        request: &DefinitionUpsertRequest,
        content: &ChartContent,
    ) -> DefinitionResult<(chart_definitions::Model, chart_versions::Model)> {
        let txn = self.db.begin().await?;
        let now = Utc::now();

        let definition = chart_definitions::ActiveModel {
            id: NotSet,
            dataset_id: Set(request.dataset_id),
            name: Set(content.name.clone()),
            description: Set(content.description.clone()),
            tags: Set(serde_json::to_string(&content.tags).unwrap_or_else(|_| "[]".to_string())),
            filter_content: Set(snapshot::canonical_string(&content.filter)),
            visual_content: Set(snapshot::canonical_string(&content.visual)),
            calculation_content: Set(snapshot::canonical_string(&content.calculation)),
            current_version: Set(None),
            auto_approve: Set(request.auto_approve),
            is_archived: Set(false),
            created_at: Set(now),
            created_by: Set(actor.login.clone()),
            updated_at: Set(now),
            updated_by: Set(actor.login.clone()),
        }
        .insert(&txn)
        .await?;

        let version = VersionService::append_in(
            &txn,
            &definition,
            content,
            &actor.login,
            request.auto_approve,
            None,
        )
        .await?;

        txn.commit().await?;

        info!(
            "Created chart definition {} at version {}",
            definition.id, version.version_number
        );

        self.audit
            .log_action(
                &actor.login,
                definition.id,
                AuditAction::Create,
                snapshot_value(&version),
            )
            .await;

        let definition = self.require(definition.id).await?;
        Ok((definition, version))
    }

    async fn update(
        &self,
        actor: &Actor,
        id: i32,
        request: &DefinitionUpsertRequest,
        content: &ChartContent,
    ) -> DefinitionResult<(chart_definitions::Model, chart_versions::Model)> {
        let definition = self.require(id).await?;

        if definition.is_archived {
            return Err(DefinitionError::Validation(format!(
                "Chart definition {} is archived and cannot be edited",
                id
            )));
        }
        if definition.dataset_id != request.dataset_id {
            return Err(DefinitionError::Validation(format!(
                "Chart definition {} belongs to dataset {}, not {}",
                id, definition.dataset_id, request.dataset_id
            )));
        }

        let version = self
            .versions
            .append_version(id, content, &actor.login, request.auto_approve, None)
            .await?;

        if definition.auto_approve != request.auto_approve {
            let definition = self.require(id).await?;
            let mut active: chart_definitions::ActiveModel = definition.into();
            active.auto_approve = Set(request.auto_approve);
            active.update(&self.db).await?;
        }

        self.audit
            .log_action(
                &actor.login,
                id,
                AuditAction::Update,
                version.diff_summary.clone(),
            )
            .await;

        let definition = self.require(id).await?;
        Ok((definition, version))
    }

    /// Explicitly approve a pending version.
    pub async fn approve(
        &self,
        actor: &Actor,
        definition_id: i32,
        version_number: i32,
    ) -> DefinitionResult<chart_versions::Model> {
        let version = self
            .versions
            .approve_version(definition_id, version_number, &actor.login)
            .await?;

        self.audit
            .log_action(
                &actor.login,
                definition_id,
                AuditAction::Approve,
                version.diff_summary.clone(),
            )
            .await;

        Ok(version)
    }

    /// Restore a historical snapshot as a brand-new version. History is
    /// strictly forward-appending: the target version is untouched and
    /// intervening versions survive.
    pub async fn rollback(
        &self,
        actor: &Actor,
        definition_id: i32,
        target_version: i32,
        auto_approve: Option<bool>,
    ) -> DefinitionResult<chart_versions::Model> {
        let definition = self.require(definition_id).await?;

        if definition.is_archived {
            return Err(DefinitionError::Validation(format!(
                "Chart definition {} is archived and cannot be rolled back",
                definition_id
            )));
        }

        let target = self.versions.get_version(definition_id, target_version).await?;
        let content = target.content()?;
        let approve = auto_approve.unwrap_or(definition.auto_approve);

        let version = self
            .versions
            .append_version(
                definition_id,
                &content,
                &actor.login,
                approve,
                Some(target_version),
            )
            .await?;

        info!(
            "Rolled back chart definition {} to version {} as version {}",
            definition_id, target_version, version.version_number
        );

        self.audit
            .log_action(
                &actor.login,
                definition_id,
                AuditAction::Rollback,
                snapshot_value(&version),
            )
            .await;

        Ok(version)
    }

    /// Compare two ledger entries, recomputing the diff from their stored
    /// snapshots.
    pub async fn compare(
        &self,
        definition_id: i32,
        from_version: i32,
        to_version: i32,
    ) -> DefinitionResult<Comparison> {
        let from = self.versions.get_version(definition_id, from_version).await?;
        let to = self.versions.get_version(definition_id, to_version).await?;

        Self::compare_entries(&from, &to)
    }

    /// Compare two already-fetched entries. Guards against callers handing
    /// in versions of two different definitions.
    pub fn compare_entries(
        from: &chart_versions::Model,
        to: &chart_versions::Model,
    ) -> DefinitionResult<Comparison> {
        if from.definition_id != to.definition_id {
            return Err(DefinitionError::CrossDefinitionCompare(
                from.definition_id,
                to.definition_id,
            ));
        }

        let diff = diff::diff_contents(&from.content()?, &to.content()?);

        Ok(Comparison {
            definition_id: from.definition_id,
            from_version: from.version_number,
            to_version: to.version_number,
            diff,
        })
    }

    pub async fn list_versions(
        &self,
        definition_id: i32,
    ) -> DefinitionResult<Vec<chart_versions::Model>> {
        self.require(definition_id).await?;
        self.versions.list_versions(definition_id).await
    }

    pub async fn get_version(
        &self,
        definition_id: i32,
        version_number: i32,
    ) -> DefinitionResult<chart_versions::Model> {
        self.versions.get_version(definition_id, version_number).await
    }

    /// Archive a definition. Archival is idempotent, blocks further edits
    /// and rollbacks, and leaves the ledger fully readable.
    pub async fn archive(
        &self,
        actor: &Actor,
        id: i32,
    ) -> DefinitionResult<chart_definitions::Model> {
        let definition = self.require(id).await?;

        if definition.is_archived {
            return Ok(definition);
        }

        let mut active: chart_definitions::ActiveModel = definition.into();
        active.is_archived = Set(true);
        active.updated_at = Set(Utc::now());
        active.updated_by = Set(actor.login.clone());
        let definition = active.update(&self.db).await?;

        info!("Archived chart definition {}", id);

        self.audit
            .log_action(
                &actor.login,
                id,
                AuditAction::Update,
                Some(serde_json::json!({"isArchived": true})),
            )
            .await;

        Ok(definition)
    }

    async fn require(&self, id: i32) -> DefinitionResult<chart_definitions::Model> {
        chart_definitions::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DefinitionError::NotFound(id))
    }
}

fn snapshot_value(version: &chart_versions::Model) -> Option<Value> {
    serde_json::from_str(&version.snapshot).ok()
}
