use chartledger::auth::Actor;
use chartledger::database::entities::{audit_entries, datasets};
use chartledger::database::migrations::Migrator;
use chartledger::errors::DefinitionError;
use chartledger::services::{DefinitionService, DefinitionUpsertRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};

/// Create an in-memory SQLite database for testing
async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");

    Migrator::up(&db, None).await.expect("Failed to run migrations");

    db
}

async fn insert_dataset(db: &DatabaseConnection, name: &str, is_active: bool) -> datasets::Model {
    let now = chrono::Utc::now();
    datasets::ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        source: Set(format!("warehouse.{}", name.to_lowercase())),
        is_active: Set(is_active),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert dataset")
}

fn upsert_request(dataset_id: i32, name: &str) -> DefinitionUpsertRequest {
    DefinitionUpsertRequest {
        definition_id: None,
        dataset_id,
        name: name.to_string(),
        description: Some("KPI chart".to_string()),
        tags: vec!["kpi".to_string()],
        filter: Value::Null,
        visual: json!({"type": "line"}),
        calculation: json!({"measure": "count()"}),
        auto_approve: true,
    }
}

#[tokio::test]
async fn test_blank_name_rejected_before_any_write() {
    let db = setup_test_db().await;
    let dataset = insert_dataset(&db, "Sales", true).await;
    let service = DefinitionService::new(db);
    let actor = Actor::user("alice");

    let mut request = upsert_request(dataset.id, "Orders");
    request.name = "   ".to_string();

    let err = service.create_or_update(&actor, request).await.unwrap_err();
    assert!(matches!(err, DefinitionError::MissingField(field) if field == "name"));

    assert!(service.list_definitions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_dataset_rejected() {
    let db = setup_test_db().await;
    let service = DefinitionService::new(db);
    let actor = Actor::user("alice");

    let err = service
        .create_or_update(&actor, upsert_request(99, "Orders"))
        .await
        .unwrap_err();
    assert!(matches!(err, DefinitionError::DatasetNotFound(99)));
}

#[tokio::test]
async fn test_inactive_dataset_rejected() {
    let db = setup_test_db().await;
    let dataset = insert_dataset(&db, "Frozen", false).await;
    let service = DefinitionService::new(db);
    let actor = Actor::user("alice");

    let err = service
        .create_or_update(&actor, upsert_request(dataset.id, "Orders"))
        .await
        .unwrap_err();
    assert!(matches!(err, DefinitionError::DatasetInactive(_)));
}

#[tokio::test]
async fn test_invalid_filter_tree_rejected_as_validation_error() {
    let db = setup_test_db().await;
    let dataset = insert_dataset(&db, "Sales", true).await;
    let service = DefinitionService::new(db);
    let actor = Actor::user("alice");

    let mut request = upsert_request(dataset.id, "Orders");
    request.filter = json!({"op": "and"});

    let err = service.create_or_update(&actor, request).await.unwrap_err();
    assert!(matches!(err, DefinitionError::Validation(_)));
}

#[tokio::test]
async fn test_archived_definition_rejects_edits_but_keeps_history() {
    let db = setup_test_db().await;
    let dataset = insert_dataset(&db, "Sales", true).await;
    let service = DefinitionService::new(db);
    let actor = Actor::user("alice");

    let (definition, _) = service
        .create_or_update(&actor, upsert_request(dataset.id, "Orders"))
        .await
        .unwrap();

    let archived = service.archive(&actor, definition.id).await.unwrap();
    assert!(archived.is_archived);

    let request = DefinitionUpsertRequest {
        definition_id: Some(definition.id),
        ..upsert_request(dataset.id, "Orders v2")
    };
    let err = service.create_or_update(&actor, request).await.unwrap_err();
    assert!(matches!(err, DefinitionError::Validation(_)));

    let err = service.rollback(&actor, definition.id, 1, None).await.unwrap_err();
    assert!(matches!(err, DefinitionError::Validation(_)));

    // History stays readable after archival.
    let versions = service.list_versions(definition.id).await.unwrap();
    assert_eq!(versions.len(), 1);
    assert!(service.compare(definition.id, 1, 1).await.unwrap().diff.is_empty());
}

#[tokio::test]
async fn test_audit_trail_records_lifecycle_actions() {
    let db = setup_test_db().await;
    let dataset = insert_dataset(&db, "Sales", true).await;
    let service = DefinitionService::new(db.clone());
    let actor = Actor::user("alice");

    let (definition, _) = service
        .create_or_update(&actor, upsert_request(dataset.id, "Orders"))
        .await
        .unwrap();

    let request = DefinitionUpsertRequest {
        definition_id: Some(definition.id),
        ..upsert_request(dataset.id, "Orders by week")
    };
    service.create_or_update(&actor, request).await.unwrap();
    service.rollback(&actor, definition.id, 1, None).await.unwrap();

    let entries = audit_entries::Entity::find()
        .filter(audit_entries::Column::EntityId.eq(definition.id))
        .all(&db)
        .await
        .unwrap();

    let actions: Vec<&str> = entries.iter().map(|e| e.action.as_str()).collect();
    assert!(actions.contains(&"create"));
    assert!(actions.contains(&"update"));
    assert!(actions.contains(&"rollback"));
    assert!(entries.iter().all(|e| e.actor == "alice"));
    assert!(entries.iter().all(|e| e.entity_type == "ChartDefinition"));
}

#[tokio::test]
async fn test_update_of_missing_definition_fails() {
    let db = setup_test_db().await;
    let dataset = insert_dataset(&db, "Sales", true).await;
    let service = DefinitionService::new(db);
    let actor = Actor::user("alice");

    let request = DefinitionUpsertRequest {
        definition_id: Some(12345),
        ..upsert_request(dataset.id, "Orders")
    };

    let err = service.create_or_update(&actor, request).await.unwrap_err();
    assert!(matches!(err, DefinitionError::NotFound(12345)));
}
