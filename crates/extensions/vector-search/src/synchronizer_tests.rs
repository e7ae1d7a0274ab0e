use super::*;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::json;

use indexsync_core::ExtensionContext;
use indexsync_protocols::{
    CollectionDescriptor, Embedding, FieldSchema, HashEmbedding, ProviderError, Record,
};

use crate::bootstrap::{CollectionBootstrapper, TrackedCollection};

/// Hash embedding that can be switched into a failing state.
#[derive(Default)]
struct FlakyProvider {
    inner: HashEmbedding,
    failing: AtomicBool,
}

#[async_trait]
impl EmbeddingProvider for FlakyProvider {
    fn id(&self) -> &str {
        "flaky"
    }

    async fn embed(&self, task: TaskType, title: &str, content: &str) -> Result<Embedding, ProviderError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProviderError::Network("connection reset".to_string()));
        }
        self.inner.embed(task, title, content).await
    }
}

struct Harness {
    ctx: ExtensionContext,
    provider: Arc<FlakyProvider>,
    store: EmbeddingStore,
}

impl Harness {
    async fn new() -> Self {
        let ctx = ExtensionContext::new(Database::open_in_memory().await.unwrap());
        let provider = Arc::new(FlakyProvider::default());

        CollectionBootstrapper::new(ctx.collections.clone(), provider.dimension())
            .ensure(&TrackedCollection::new("docs"))
            .await
            .unwrap();
        ctx.hooks
            .register_record_hook("docs", Arc::new(LifecycleSynchronizer::new(provider.clone())))
            .unwrap();
        ctx.hooks
            .register_collection_hook(Arc::new(EmbeddingCleanup::new(
                ["docs".to_string()],
                provider.dimension(),
            )))
            .unwrap();

        let store = EmbeddingStore::new(ctx.database.clone(), "docs");
        Self { ctx, provider, store }
    }

    async fn create(&self, title: &str, content: &str) -> Record {
        let fields = json!({"title": title, "content": content});
        self.ctx
            .records
            .create("docs", as_map(fields), WriteOrigin::User)
            .await
            .unwrap()
    }

    async fn update(&self, id: &str, content: &str) -> Result<Record, IndexError> {
        self.ctx
            .records
            .update("docs", id, as_map(json!({"content": content})), WriteOrigin::User)
            .await
    }

    async fn current(&self, id: &str) -> Record {
        self.ctx.records.get("docs", id).await.unwrap()
    }
}

fn as_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[tokio::test]
async fn test_create_stores_embedding_and_vector_id() {
    let h = Harness::new().await;
    let record = h.create("A", "hello world").await;

    let stored = h.current(&record.id).await;
    let vector_id = stored.get_i64("vector_id").unwrap();
    assert!(h.store.contains(vector_id).await.unwrap());
    assert_eq!(h.store.count().await.unwrap(), 1);
    assert_eq!(
        h.store.get(vector_id).await.unwrap(),
        Some(h.provider.inner.hash_text("hello world"))
    );
}

#[tokio::test]
async fn test_write_back_does_not_reenter() {
    let h = Harness::new().await;
    let long_content = "word ".repeat(5000);
    let record = h.create("A", &long_content).await;
    assert_eq!(h.provider.inner.calls(), 1);

    h.update(&record.id, "goodbye").await.unwrap();
    assert_eq!(h.provider.inner.calls(), 2);
}

#[tokio::test]
async fn test_successive_updates_leave_one_embedding() {
    let h = Harness::new().await;
    let record = h.create("A", "hello world").await;
    let first = h.current(&record.id).await.get_i64("vector_id").unwrap();

    h.update(&record.id, "goodbye").await.unwrap();
    let second = h.current(&record.id).await.get_i64("vector_id").unwrap();
    h.update(&record.id, "farewell moon").await.unwrap();
    let third = h.current(&record.id).await.get_i64("vector_id").unwrap();

    assert_ne!(first, second);
    assert_ne!(second, third);
    assert!(!h.store.contains(first).await.unwrap());
    assert!(!h.store.contains(second).await.unwrap());
    assert_eq!(h.store.count().await.unwrap(), 1);
    assert_eq!(
        h.store.get(third).await.unwrap(),
        Some(h.provider.inner.hash_text("farewell moon"))
    );
}

#[tokio::test]
async fn test_records_never_share_embedding_rows() {
    let h = Harness::new().await;
    let a = h.create("A", "same text").await;
    let b = h.create("B", "same text").await;
    let a_id = h.current(&a.id).await.get_i64("vector_id");
    let b_id = h.current(&b.id).await.get_i64("vector_id");
    assert!(a_id.is_some());
    assert_ne!(a_id, b_id);
    assert_eq!(h.store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_delete_removes_embedding() {
    let h = Harness::new().await;
    let keep = h.create("K", "keep me").await;
    let record = h.create("A", "hello world").await;
    let vector_id = h.current(&record.id).await.get_i64("vector_id").unwrap();

    h.ctx
        .records
        .delete("docs", &record.id, WriteOrigin::User)
        .await
        .unwrap();
    assert!(!h.store.contains(vector_id).await.unwrap());
    assert_eq!(h.store.count().await.unwrap(), 1);
    assert!(h.current(&keep.id).await.get_i64("vector_id").is_some());
}

#[tokio::test]
async fn test_delete_without_vector_id_is_noop() {
    let h = Harness::new().await;
    h.create("K", "keep me").await;
    let bare = h
        .ctx
        .records
        .create(
            "docs",
            as_map(json!({"content": "never embedded"})),
            WriteOrigin::Synchronizer,
        )
        .await
        .unwrap();
    assert!(bare.get_i64("vector_id").is_none());

    h.ctx
        .records
        .delete("docs", &bare.id, WriteOrigin::User)
        .await
        .unwrap();
    assert_eq!(h.store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_provider_failure_keeps_previous_embedding() {
    let h = Harness::new().await;
    let record = h.create("A", "hello world").await;
    let before = h.current(&record.id).await.get_i64("vector_id").unwrap();

    h.provider.failing.store(true, Ordering::SeqCst);
    let err = h.update(&record.id, "goodbye").await.unwrap_err();
    assert!(matches!(err, IndexError::Provider(ProviderError::Network(_))));

    let after = h.current(&record.id).await;
    assert_eq!(after.get_str("content"), "goodbye");
    assert_eq!(after.get_i64("vector_id"), Some(before));
    assert!(h.store.contains(before).await.unwrap());
    assert_eq!(h.store.count().await.unwrap(), 1);

    h.provider.failing.store(false, Ordering::SeqCst);
    h.update(&record.id, "goodbye again").await.unwrap();
    assert!(!h.store.contains(before).await.unwrap());
    assert_eq!(h.store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_untracked_collection_ignored() {
    let h = Harness::new().await;
    h.ctx
        .collections
        .create(CollectionDescriptor::new("notes").with_field(FieldSchema::text("content")))
        .await
        .unwrap();
    h.ctx
        .records
        .create("notes", as_map(json!({"content": "x"})), WriteOrigin::User)
        .await
        .unwrap();
    assert_eq!(h.provider.inner.calls(), 0);
    assert!(!h.ctx.database.table_exists("notes_embeddings").await.unwrap());
}

#[tokio::test]
async fn test_collection_delete_drops_embeddings_table() {
    let h = Harness::new().await;
    h.create("A", "hello world").await;
    h.ctx.collections.delete("docs").await.unwrap();
    assert!(!h.ctx.database.table_exists("docs_embeddings").await.unwrap());

    // Re-creating a tracked collection brings its table back.
    h.ctx
        .collections
        .create(CollectionDescriptor::new("docs").with_field(FieldSchema::text("content")))
        .await
        .unwrap();
    assert!(h.ctx.database.table_exists("docs_embeddings").await.unwrap());
}

#[tokio::test]
async fn test_user_update_cannot_take_another_records_embedding() {
    let h = Harness::new().await;
    let a = h.create("a", "first record").await;
    let b = h.create("b", "second record").await;
    let a_vec = h.current(&a.id).await.get_i64("vector_id").unwrap();
    let b_vec = h.current(&b.id).await.get_i64("vector_id").unwrap();

    let err = h
        .ctx
        .records
        .update("docs", &b.id, as_map(json!({"vector_id": a_vec})), WriteOrigin::User)
        .await
        .unwrap_err();
    assert!(matches!(err, IndexError::Validation(_)));

    assert_eq!(h.current(&a.id).await.get_i64("vector_id"), Some(a_vec));
    assert_eq!(h.current(&b.id).await.get_i64("vector_id"), Some(b_vec));
    assert!(h.store.contains(a_vec).await.unwrap());
    assert!(h.store.contains(b_vec).await.unwrap());
    assert_eq!(h.store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_user_create_cannot_set_vector_id() {
    let h = Harness::new().await;
    let a = h.create("a", "first record").await;
    let a_vec = h.current(&a.id).await.get_i64("vector_id").unwrap();

    let fields = json!({"title": "b", "content": "second", "vector_id": a_vec});
    let err = h
        .ctx
        .records
        .create("docs", as_map(fields), WriteOrigin::User)
        .await
        .unwrap_err();
    assert!(matches!(err, IndexError::Validation(_)));

    assert_eq!(h.ctx.records.list("docs").await.unwrap().len(), 1);
    assert!(h.store.contains(a_vec).await.unwrap());
    assert_eq!(h.store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_synchronizer_origin_may_write_vector_id() {
    let h = Harness::new().await;
    let record = h.create("a", "first record").await;
    let updated = h
        .ctx
        .records
        .update(
            "docs",
            &record.id,
            as_map(json!({"vector_id": null})),
            WriteOrigin::Synchronizer,
        )
        .await
        .unwrap();
    assert!(updated.get_i64("vector_id").is_none());
}
