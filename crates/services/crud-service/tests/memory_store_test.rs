//! CRUD service against the in-memory store.

use std::error::Error;
use std::sync::Arc;

use serde_json::{json, Value};

use common::AppError;
use crud_service::{
    CrudManager, CrudService, HasMany, ListOptions, MemoryStore, RecordQuery, RecordStore,
    StorageError,
};
use domain::{Attributes, FieldSelection, FilterCondition, FilterOperator, Record, RecordId};

fn attributes(value: Value) -> Attributes {
    value.as_object().cloned().unwrap()
}

async fn seeded_store(count: usize) -> MemoryStore {
    let store = MemoryStore::new("widget");
    let service = CrudManager::default();

    for i in 0..count {
        service
            .create(
                &store,
                Record::new("widget"),
                attributes(json!({"name": format!("widget {i:02}"), "quantity": i})),
                &RecordId::from(format!("w{i:02}")),
            )
            .await
            .unwrap();
    }

    store
}

#[tokio::test]
async fn test_create_and_retrieve() {
    let store = MemoryStore::new("widget");
    let service = CrudManager::default();

    let created = service
        .create(
            &store,
            Record::new("widget"),
            attributes(json!({"name": "test", "description": "desc"})),
            &"ab43ca3434f324acde".into(),
        )
        .await
        .unwrap();
    assert!(created.exists());

    let found = service
        .retrieve(&store, &"ab43ca3434f324acde".into(), &FieldSelection::All, &[])
        .await
        .unwrap();

    assert_eq!(found.attributes(), created.attributes());
    assert_eq!(found.kind(), "widget");
}

#[tokio::test]
async fn test_create_duplicate_id_is_save_failed() {
    let store = seeded_store(1).await;

    let result = CrudManager::default()
        .create(&store, Record::new("widget"), Attributes::new(), &"w00".into())
        .await;

    let err = result.unwrap_err();
    assert!(matches!(err, AppError::SaveFailed { .. }));
    assert!(matches!(
        err.source().and_then(|e| e.downcast_ref::<StorageError>()),
        Some(StorageError::DuplicateKey(_))
    ));
}

#[tokio::test]
async fn test_retrieve_projects_fields() {
    let store = seeded_store(1).await;

    let record = CrudManager::default()
        .retrieve(&store, &"w00".into(), &FieldSelection::only(["name"]), &[])
        .await
        .unwrap();

    assert_eq!(record.attributes().len(), 1);
    assert_eq!(record.get("name"), Some(&json!("widget 00")));
}

#[tokio::test]
async fn test_update_then_delete() {
    let store = seeded_store(2).await;
    let service = CrudManager::default();

    let updated = service
        .update(&store, attributes(json!({"name": "renamed"})), &"w01".into())
        .await
        .unwrap();
    assert_eq!(updated.get("name"), Some(&json!("renamed")));
    assert_eq!(updated.get("quantity"), Some(&json!(1)));

    assert!(service.delete(&store, &"w01".into()).await.unwrap());
    assert_eq!(store.len().await, 1);

    let again = service.delete(&store, &"w01".into()).await;
    assert!(matches!(again, Err(AppError::NotFound { source: None, .. })));
}

#[tokio::test]
async fn test_save_of_vanished_row_reports_false() {
    let store = MemoryStore::new("widget");
    let mut ghost = Record::new("widget").persisted();
    ghost.set("id", "gone");

    assert!(!store.save(&ghost).await.unwrap());
    assert!(!store.delete(&ghost).await.unwrap());
}

#[tokio::test]
async fn test_retrieve_all_pages() {
    let store = seeded_store(45).await;
    let service = CrudManager::default();

    let page = service
        .retrieve_all(&store, ListOptions::new().page(3).per_page(20))
        .await
        .unwrap();

    assert_eq!(page.total, 45);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.models.len(), 5);
    assert_eq!(page.models[0].id(), Some(RecordId::from("w40")));

    let everything = service
        .retrieve_all(&store, ListOptions::new().per_page(-1))
        .await
        .unwrap();
    assert_eq!(everything.models.len(), 45);
    assert_eq!(everything.per_page, -1);
}

#[tokio::test]
async fn test_retrieve_all_filters() {
    let store = seeded_store(10).await;
    let service = CrudManager::default();

    let cases = [
        (FilterCondition::new("quantity", FilterOperator::GreaterThanOrEqual, 7), 3),
        (FilterCondition::new("name", FilterOperator::Like, "widget 0_"), 10),
        (FilterCondition::new("name", FilterOperator::Like, "%5"), 1),
        (FilterCondition::new("id", FilterOperator::In, json!(["w01", "w02", "zz"])), 2),
        (FilterCondition::eq("description", Value::Null), 10),
        (FilterCondition::default(), 10),
    ];

    for (filter, expected) in cases {
        let page = service
            .retrieve_all(&store, ListOptions::new().filter(filter.clone()))
            .await
            .unwrap();
        assert_eq!(page.total, expected, "{filter:?}");
        assert_eq!(page.models.len() as u64, expected);
    }
}

#[tokio::test]
async fn test_invalid_filter_is_operation_failed() {
    let store = seeded_store(1).await;

    let result = CrudManager::default()
        .retrieve_all(
            &store,
            ListOptions::new().filter(FilterCondition::new("quantity", FilterOperator::In, 3)),
        )
        .await;

    assert!(matches!(result, Err(AppError::OperationFailed { .. })));
}

#[tokio::test]
async fn test_has_many_relationship() {
    let comments = Arc::new(MemoryStore::new("comment"));
    let posts = MemoryStore::new("post")
        .with_relationship("comments", Arc::new(HasMany::new(comments.clone(), "post_id")));
    let service = CrudManager::default();

    let post = service
        .create(&posts, Record::new("post"), attributes(json!({"title": "hello"})), &"p1".into())
        .await
        .unwrap();

    for id in ["c1", "c2"] {
        let mut comment = Record::new("comment");
        comment.set("id", id);
        let linked = service
            .add_relationship(&posts, &post, comment, "comments")
            .await
            .unwrap();
        assert_eq!(linked.get("post_id"), Some(&json!("p1")));
    }

    let loaded = service
        .retrieve(&posts, &"p1".into(), &FieldSelection::All, &["comments".to_string()])
        .await
        .unwrap();

    assert_eq!(loaded.relation("comments").map(<[Record]>::len), Some(2));
    assert_eq!(
        serde_json::to_value(&loaded).unwrap()["comments"][0]["id"],
        json!("c1")
    );

    let orphans = comments
        .count(&RecordQuery::new().filter(FilterCondition::eq("post_id", Value::Null)))
        .await
        .unwrap();
    assert_eq!(orphans, 0);
}

#[tokio::test]
async fn test_has_many_with_projected_parent() {
    let comments = Arc::new(MemoryStore::new("comment"));
    let posts = MemoryStore::new("post")
        .with_relationship("comments", Arc::new(HasMany::new(comments.clone(), "post_id")));
    let service = CrudManager::default();

    let post = service
        .create(&posts, Record::new("post"), attributes(json!({"title": "hello"})), &"p1".into())
        .await
        .unwrap();
    let mut comment = Record::new("comment");
    comment.set("id", "c1");
    service
        .add_relationship(&posts, &post, comment, "comments")
        .await
        .unwrap();

    let loaded = service
        .retrieve(
            &posts,
            &"p1".into(),
            &FieldSelection::only(["title"]),
            &["comments".to_string()],
        )
        .await
        .unwrap();

    assert_eq!(loaded.get("title"), Some(&json!("hello")));
    assert!(loaded.get("id").is_none());
    assert_eq!(loaded.relation("comments").map(<[Record]>::len), Some(1));
}

#[tokio::test]
async fn test_numeric_id_filters_match_stored_ids() {
    let store = MemoryStore::new("widget");
    let service = CrudManager::default();

    for id in [7_i64, 42] {
        service
            .create(&store, Record::new("widget"), Attributes::new(), &RecordId::from(id))
            .await
            .unwrap();
    }

    let cases = [
        (FilterCondition::eq("id", 42), 1),
        (FilterCondition::eq("id", "42"), 1),
        (FilterCondition::new("id", FilterOperator::NotEqual, 42), 1),
        (FilterCondition::new("id", FilterOperator::In, json!([7, 42, 99])), 2),
    ];

    for (filter, expected) in cases {
        let page = service
            .retrieve_all(&store, ListOptions::new().filter(filter.clone()))
            .await
            .unwrap();
        assert_eq!(page.total, expected, "{filter:?}");
    }
}

#[tokio::test]
async fn test_add_relationship_duplicate_is_operation_failed() {
    let comments = Arc::new(MemoryStore::new("comment"));
    let posts = MemoryStore::new("post")
        .with_relationship("comments", Arc::new(HasMany::new(comments, "post_id")));
    let service = CrudManager::default();

    let post = service
        .create(&posts, Record::new("post"), Attributes::new(), &"p1".into())
        .await
        .unwrap();

    let mut comment = Record::new("comment");
    comment.set("id", "c1");
    service
        .add_relationship(&posts, &post, comment.clone(), "comments")
        .await
        .unwrap();

    let result = service
        .add_relationship(&posts, &post, comment, "comments")
        .await;
    assert!(matches!(result, Err(AppError::OperationFailed { .. })));
}
