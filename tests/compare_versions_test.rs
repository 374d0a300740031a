use chartledger::auth::Actor;
use chartledger::database::entities::datasets;
use chartledger::database::migrations::Migrator;
use chartledger::diff::TextOp;
use chartledger::errors::DefinitionError;
use chartledger::services::{DefinitionService, DefinitionUpsertRequest};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
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

async fn create_test_dataset(db: &DatabaseConnection, name: &str) -> datasets::Model {
    let now = chrono::Utc::now();
    datasets::ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        source: Set(format!("warehouse.{}", name.to_lowercase())),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert dataset")
}

fn upsert_request(dataset_id: i32, name: &str, filter: Value) -> DefinitionUpsertRequest {
    DefinitionUpsertRequest {
        definition_id: None,
        dataset_id,
        name: name.to_string(),
        description: None,
        tags: vec![],
        filter,
        visual: json!({"type": "bar"}),
        calculation: json!({"measure": "count()"}),
        auto_approve: true,
    }
}

#[tokio::test]
async fn test_comparing_a_version_with_itself_is_empty() {
    let db = setup_test_db().await;
    let dataset = create_test_dataset(&db, "Sales").await;
    let service = DefinitionService::new(db);
    let actor = Actor::user("alice");

    let (definition, _) = service
        .create_or_update(&actor, upsert_request(dataset.id, "Orders", Value::Null))
        .await
        .unwrap();

    let comparison = service.compare(definition.id, 1, 1).await.unwrap();
    assert!(comparison.diff.is_empty());
    assert_eq!(comparison.diff.change_count(), 0);
}

#[tokio::test]
async fn test_structural_diff_applies_from_side_to_to_side() {
    let db = setup_test_db().await;
    let dataset = create_test_dataset(&db, "Sales").await;
    let service = DefinitionService::new(db);
    let actor = Actor::user("alice");

    let open = json!({"field": "status", "op": "eq", "value": "open"});
    let closed = json!({"op": "and", "children": [
        {"field": "status", "op": "eq", "value": "closed"},
        {"field": "year", "op": "gte", "value": 2024}
    ]});

    let (definition, _) = service
        .create_or_update(&actor, upsert_request(dataset.id, "Orders", open))
        .await
        .unwrap();

    let request = DefinitionUpsertRequest {
        definition_id: Some(definition.id),
        ..upsert_request(dataset.id, "Orders", closed)
    };
    service.create_or_update(&actor, request).await.unwrap();

    let comparison = service.compare(definition.id, 1, 2).await.unwrap();
    assert!(!comparison.diff.filter.is_empty());

    let from = service
        .get_version(definition.id, 1)
        .await
        .unwrap()
        .content()
        .unwrap();
    let to = service
        .get_version(definition.id, 2)
        .await
        .unwrap()
        .content()
        .unwrap();

    let patched = comparison.diff.filter.apply_to(&from.filter).unwrap();
    assert_eq!(patched, to.filter);
}

#[tokio::test]
async fn test_name_change_shows_as_text_diff() {
    let db = setup_test_db().await;
    let dataset = create_test_dataset(&db, "Sales").await;
    let service = DefinitionService::new(db);
    let actor = Actor::user("alice");

    let (definition, _) = service
        .create_or_update(&actor, upsert_request(dataset.id, "Orders", Value::Null))
        .await
        .unwrap();

    let request = DefinitionUpsertRequest {
        definition_id: Some(definition.id),
        ..upsert_request(dataset.id, "Orders by week", Value::Null)
    };
    service.create_or_update(&actor, request).await.unwrap();

    let comparison = service.compare(definition.id, 1, 2).await.unwrap();
    let changes = &comparison.diff.name.changes;

    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].op, TextOp::Removed);
    assert_eq!(changes[0].line, "Orders");
    assert_eq!(changes[1].op, TextOp::Added);
    assert_eq!(changes[1].line, "Orders by week");
}

#[tokio::test]
async fn test_compare_fails_when_either_version_is_missing() {
    let db = setup_test_db().await;
    let dataset = create_test_dataset(&db, "Sales").await;
    let service = DefinitionService::new(db);
    let actor = Actor::user("alice");

    let (definition, _) = service
        .create_or_update(&actor, upsert_request(dataset.id, "Orders", Value::Null))
        .await
        .unwrap();

    let err = service.compare(definition.id, 1, 9).await.unwrap_err();
    assert!(matches!(
        err,
        DefinitionError::VersionNotFound { version: 9, .. }
    ));
}

#[tokio::test]
async fn test_cross_definition_compare_rejected() {
    let db = setup_test_db().await;
    let dataset = create_test_dataset(&db, "Sales").await;
    let service = DefinitionService::new(db);
    let actor = Actor::user("alice");

    let (first, _) = service
        .create_or_update(&actor, upsert_request(dataset.id, "Orders", Value::Null))
        .await
        .unwrap();
    let (second, _) = service
        .create_or_update(&actor, upsert_request(dataset.id, "Returns", Value::Null))
        .await
        .unwrap();

    let a = service.get_version(first.id, 1).await.unwrap();
    let b = service.get_version(second.id, 1).await.unwrap();

    let err = DefinitionService::compare_entries(&a, &b).unwrap_err();
    assert!(matches!(err, DefinitionError::CrossDefinitionCompare(_, _)));
}

#[tokio::test]
async fn test_stored_and_recomputed_diffs_agree() {
    let db = setup_test_db().await;
    let dataset = create_test_dataset(&db, "Sales").await;
    let service = DefinitionService::new(db);
    let actor = Actor::user("alice");

    let (definition, _) = service
        .create_or_update(&actor, upsert_request(dataset.id, "Orders", Value::Null))
        .await
        .unwrap();

    let request = DefinitionUpsertRequest {
        definition_id: Some(definition.id),
        ..upsert_request(
            dataset.id,
            "Orders",
            json!({"field": "region", "op": "eq", "value": "EMEA"}),
        )
    };
    let (_, second) = service.create_or_update(&actor, request).await.unwrap();

    let recomputed = service.compare(definition.id, 1, 2).await.unwrap();
    assert_eq!(
        second.diff_summary.unwrap(),
        serde_json::to_value(&recomputed.diff).unwrap()
    );
}
