use super::*;
use serde_json::json;

use indexsync_core::Database;
use indexsync_protocols::{HashEmbedding, WriteOrigin};

use crate::store::EmbeddingStore;

async fn initialized(config: VectorSearchConfig) -> (ExtensionContext, VectorSearchExtension) {
    let ctx = ExtensionContext::new(Database::open_in_memory().await.unwrap());
    let mut ext = VectorSearchExtension::new(Arc::new(HashEmbedding::default()), config);
    ext.initialize(ctx.clone()).await.unwrap();
    (ctx, ext)
}

#[tokio::test]
async fn test_initialize_bootstraps_and_registers() {
    let config = VectorSearchConfig::default().track(TrackedCollection::new("docs"));
    let (ctx, ext) = initialized(config).await;

    assert!(ctx.collections.find("docs").await.unwrap().is_some());
    assert!(ctx.database.table_exists("docs_embeddings").await.unwrap());
    assert!(ctx.hooks.has_record_hooks("docs"));
    assert!(ext.search().unwrap().is_tracked("docs"));
    assert!(ext.global().is_none());
    assert!(ctx.collections.find(GLOBAL_COLLECTION).await.unwrap().is_none());
}

#[tokio::test]
async fn test_writes_through_context_are_indexed() {
    let config = VectorSearchConfig::default().track(TrackedCollection::new("docs"));
    let (ctx, ext) = initialized(config).await;

    let Some(fields) = json!({"title": "A", "content": "hello world"}).as_object().cloned() else {
        unreachable!()
    };
    let record = ctx
        .records
        .create("docs", fields, WriteOrigin::User)
        .await
        .unwrap();
    let record = ctx.records.get("docs", &record.id).await.unwrap();
    let vector_id = record.get_i64("vector_id").unwrap();
    assert!(
        EmbeddingStore::new(ctx.database.clone(), "docs")
            .contains(vector_id)
            .await
            .unwrap()
    );

    let hits = ext
        .search()
        .unwrap()
        .search("docs", "", "hello", 1)
        .await
        .unwrap()
        .into_hits();
    assert_eq!(hits[0]["id"], json!(record.id));
}

#[tokio::test]
async fn test_global_store_enabled() {
    let config = VectorSearchConfig::default().with_global_store(7);
    let (ctx, ext) = initialized(config).await;

    assert_eq!(ext.global().unwrap().k(), 7);
    assert!(ctx.hooks.has_record_hooks(GLOBAL_COLLECTION));
    assert!(ctx.database.table_exists("vector_store_embeddings").await.unwrap());
}

#[tokio::test]
async fn test_initialize_twice_on_same_context_fails() {
    let config = VectorSearchConfig::default().track(TrackedCollection::new("docs"));
    let (ctx, _) = initialized(config.clone()).await;
    let mut again = VectorSearchExtension::new(Arc::new(HashEmbedding::default()), config);
    let err = again.initialize(ctx).await.unwrap_err();
    assert!(matches!(err, ExtensionError::AlreadyRegistered(_)));
}
