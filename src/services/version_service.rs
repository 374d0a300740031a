use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DbErr, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info};

use crate::database::entities::{chart_definitions, chart_versions};
use crate::diff;
use crate::errors::{DefinitionError, DefinitionResult};
use crate::snapshot::{self, ChartContent};

/// Version ledger and approval gate.
///
/// Appends are transactional and write the ledger entry pending-first; the
/// approval decision runs inside the same transaction so a version is never
/// visible as approved without the head having advanced. Version numbers
/// are allocated as max+1 per definition under a unique index, with one
/// internal retry when concurrent appends collide.
#[derive(Clone)]
pub struct VersionService {
    db: DatabaseConnection,
}

impl VersionService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Append a new version for an existing definition and run it through
    /// the approval gate.
    pub async fn append_version(
        &self,
        definition_id: i32,
        content: &ChartContent,
        created_by: &str,
        auto_approve: bool,
        rollback_source: Option<i32>,
    ) -> DefinitionResult<chart_versions::Model> {
        match self
            .append_once(definition_id, content, created_by, auto_approve, rollback_source)
            .await
        {
            Err(DefinitionError::VersionConflict(id)) => {
                debug!(
                    "Version number collision for chart definition {}, retrying allocation",
                    id
                );
                self.append_once(definition_id, content, created_by, auto_approve, rollback_source)
                    .await
            }
            result => result,
        }
    }

    async fn append_once(
        &self,
        definition_id: i32,
        content: &ChartContent,
        created_by: &str,
        auto_approve: bool,
        rollback_source: Option<i32>,
    ) -> DefinitionResult<chart_versions::Model> {
        let txn = self.db.begin().await?;

        let definition = chart_definitions::Entity::find_by_id(definition_id)
            .one(&txn)
            .await?
            .ok_or(DefinitionError::NotFound(definition_id))?;

        let version = Self::append_in(
            &txn,
            &definition,
            content,
            created_by,
            auto_approve,
            rollback_source,
        )
        .await?;

        txn.commit().await?;

        Ok(version)
    }

    /// Append inside an existing transaction. The caller owns the commit;
    /// definition creation uses this to write the definition and version 1
    /// atomically.
    pub(crate) async fn append_in<C: ConnectionTrait>(
        conn: &C,
        definition: &chart_definitions::Model,
        content: &ChartContent,
        created_by: &str,
        auto_approve: bool,
        rollback_source: Option<i32>,
    ) -> DefinitionResult<chart_versions::Model> {
        let payload = snapshot::encode(content)?;
        let next_number = Self::next_version_number(conn, definition.id).await?;

        // Diff against the approved head as of this append; none when no
        // version has been approved yet.
        let diff_summary = match Self::head_content(conn, definition).await? {
            Some(head) => {
                let summary = diff::diff_contents(&head, content);
                Some(
                    serde_json::to_value(&summary)
                        .map_err(|err| DefinitionError::Internal(err.to_string()))?,
                )
            }
            None => None,
        };

        let now = Utc::now();
        let version = chart_versions::ActiveModel {
            id: NotSet,
            definition_id: Set(definition.id),
            version_number: Set(next_number),
            snapshot: Set(payload),
            diff_summary: Set(diff_summary),
            rollback_source_version: Set(rollback_source),
            approved: Set(false),
            approved_by: Set(None),
            approved_at: Set(None),
            created_at: Set(now),
            created_by: Set(created_by.to_string()),
        };

        let version = version.insert(conn).await.map_err(|err| {
            if is_unique_violation(&err) {
                DefinitionError::VersionConflict(definition.id)
            } else {
                DefinitionError::Database(err)
            }
        })?;

        info!(
            "Appended version {} for chart definition {}",
            version.version_number, definition.id
        );

        if auto_approve {
            return Self::approve_in(conn, definition.clone(), version, created_by).await;
        }

        Ok(version)
    }

    /// Explicitly approve a pending version.
    pub async fn approve_version(
        &self,
        definition_id: i32,
        version_number: i32,
        approver: &str,
    ) -> DefinitionResult<chart_versions::Model> {
        let txn = self.db.begin().await?;

        let definition = chart_definitions::Entity::find_by_id(definition_id)
            .one(&txn)
            .await?
            .ok_or(DefinitionError::NotFound(definition_id))?;

        let version = Self::find_version(&txn, definition_id, version_number).await?;
        let version = Self::approve_in(&txn, definition, version, approver).await?;

        txn.commit().await?;

        info!(
            "Approved version {} of chart definition {}",
            version_number, definition_id
        );

        Ok(version)
    }

    /// Approve inside an existing transaction and advance the head when
    /// this version outranks it. The head only ever advances to the
    /// highest approved version number; approving an older version never
    /// moves it backward.
    pub(crate) async fn approve_in<C: ConnectionTrait>(
        conn: &C,
        definition: chart_definitions::Model,
        version: chart_versions::Model,
        approver: &str,
    ) -> DefinitionResult<chart_versions::Model> {
        if version.approved {
            return Err(DefinitionError::AlreadyApproved {
                definition_id: definition.id,
                version: version.version_number,
            });
        }

        let now = Utc::now();
        let mut active: chart_versions::ActiveModel = version.into();
        active.approved = Set(true);
        active.approved_by = Set(Some(approver.to_string()));
        active.approved_at = Set(Some(now));
        let version = active.update(conn).await?;

        let advances = definition
            .current_version
            .map_or(true, |head| version.version_number > head);

        if advances {
            let content = version.content()?;
            let mut head: chart_definitions::ActiveModel = definition.into();
            head.name = Set(content.name.clone());
            head.description = Set(content.description.clone());
            head.tags =
                Set(serde_json::to_string(&content.tags).unwrap_or_else(|_| "[]".to_string()));
            head.filter_content = Set(snapshot::canonical_string(&content.filter));
            head.visual_content = Set(snapshot::canonical_string(&content.visual));
            head.calculation_content = Set(snapshot::canonical_string(&content.calculation));
            head.current_version = Set(Some(version.version_number));
            head.updated_at = Set(now);
            head.updated_by = Set(approver.to_string());
            head.update(conn).await?;
        }

        Ok(version)
    }

    pub async fn get_version(
        &self,
        definition_id: i32,
        version_number: i32,
    ) -> DefinitionResult<chart_versions::Model> {
        Self::find_version(&self.db, definition_id, version_number).await
    }

    /// All ledger entries for a definition, ascending by version number.
    pub async fn list_versions(
        &self,
        definition_id: i32,
    ) -> DefinitionResult<Vec<chart_versions::Model>> {
        let versions = chart_versions::Entity::find()
            .filter(chart_versions::Column::DefinitionId.eq(definition_id))
            .order_by_asc(chart_versions::Column::VersionNumber)
            .all(&self.db)
            .await?;

        Ok(versions)
    }

    async fn find_version<C: ConnectionTrait>(
        conn: &C,
        definition_id: i32,
        version_number: i32,
    ) -> DefinitionResult<chart_versions::Model> {
        chart_versions::Entity::find()
            .filter(chart_versions::Column::DefinitionId.eq(definition_id))
            .filter(chart_versions::Column::VersionNumber.eq(version_number))
            .one(conn)
            .await?
            .ok_or(DefinitionError::VersionNotFound {
                definition_id,
                version: version_number,
            })
    }

    async fn next_version_number<C: ConnectionTrait>(
        conn: &C,
        definition_id: i32,
    ) -> DefinitionResult<i32> {
        let last = chart_versions::Entity::find()
            .filter(chart_versions::Column::DefinitionId.eq(definition_id))
            .order_by_desc(chart_versions::Column::VersionNumber)
            .one(conn)
            .await?;

        Ok(last.map(|v| v.version_number + 1).unwrap_or(1))
    }

    async fn head_content<C: ConnectionTrait>(
        conn: &C,
        definition: &chart_definitions::Model,
    ) -> DefinitionResult<Option<ChartContent>> {
        match definition.current_version {
            Some(head) => {
                let version = Self::find_version(conn, definition.id, head).await?;
                Ok(Some(version.content()?))
            }
            None => Ok(None),
        }
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    let message = err.to_string().to_lowercase();
    message.contains("unique constraint") || message.contains("duplicate key")
}
