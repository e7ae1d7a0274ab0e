use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::extension::ExtensionContext;
use crate::hooks::CollectionHook;

#[derive(Default)]
struct RecordingHook {
    events: Mutex<Vec<(CollectionEventKind, String, bool)>>,
}

#[async_trait]
impl CollectionHook for RecordingHook {
    fn name(&self) -> &str {
        "recording"
    }

    async fn on_collection(&self, event: &CollectionEvent, db: &Database) -> Result<(), IndexError> {
        let table_exists = db.table_exists(&event.collection.name).await?;
        self.events
            .lock()
            .push((event.kind, event.collection.name.clone(), table_exists));
        Ok(())
    }
}

struct VetoHook(AtomicUsize);

#[async_trait]
impl CollectionHook for VetoHook {
    fn name(&self) -> &str {
        "veto"
    }

    async fn on_collection(&self, event: &CollectionEvent, _db: &Database) -> Result<(), IndexError> {
        if event.kind == CollectionEventKind::Deleting {
            self.0.fetch_add(1, Ordering::SeqCst);
            return Err(IndexError::validation("collection is protected"));
        }
        Ok(())
    }
}

fn docs() -> CollectionDescriptor {
    CollectionDescriptor::new("docs")
        .with_field(FieldSchema::text("title"))
        .with_field(FieldSchema::text("content").required())
}

async fn context() -> ExtensionContext {
    ExtensionContext::new(Database::open_in_memory().await.unwrap())
}

#[tokio::test]
async fn test_create_and_find() {
    let ctx = context().await;
    let created = ctx.collections.create(docs()).await.unwrap();
    assert!(!created.id.is_empty());

    let by_name = ctx.collections.get("docs").await.unwrap();
    let by_id = ctx.collections.get(&created.id).await.unwrap();
    assert_eq!(by_name, created);
    assert_eq!(by_id, created);
    assert!(ctx.database.table_exists("docs").await.unwrap());
}

#[tokio::test]
async fn test_create_duplicate_rejected() {
    let ctx = context().await;
    ctx.collections.create(docs()).await.unwrap();
    let err = ctx.collections.create(docs()).await.unwrap_err();
    assert!(matches!(err, IndexError::Validation(_)));
}

#[tokio::test]
async fn test_create_rejects_bad_names() {
    let ctx = context().await;
    for descriptor in [
        CollectionDescriptor::new("bad name"),
        CollectionDescriptor::new("_hidden"),
        CollectionDescriptor::new("docs").with_field(FieldSchema::text("id")),
        CollectionDescriptor::new("docs")
            .with_field(FieldSchema::text("a"))
            .with_field(FieldSchema::text("a")),
        CollectionDescriptor::new("docs").with_index("DROP TABLE _collections"),
    ] {
        let err = ctx.collections.create(descriptor).await.unwrap_err();
        assert!(matches!(err, IndexError::Validation(_)), "{err}");
    }
}

#[tokio::test]
async fn test_relation_target_must_exist() {
    let ctx = context().await;
    let relation = |id: &str| {
        CollectionDescriptor::new("posts").with_field(FieldSchema::new(
            "author",
            FieldKind::Relation {
                collection_id: id.to_string(),
            },
        ))
    };
    assert!(ctx.collections.create(relation("missing")).await.is_err());

    let users = ctx
        .collections
        .create(CollectionDescriptor::new("users"))
        .await
        .unwrap();
    ctx.collections.create(relation(&users.id)).await.unwrap();
}

#[tokio::test]
async fn test_get_missing_is_not_found() {
    let ctx = context().await;
    let err = ctx.collections.get("nope").await.unwrap_err();
    assert!(matches!(err, IndexError::NotFound(_)));
}

#[tokio::test]
async fn test_update_adds_and_drops_columns() {
    let ctx = context().await;
    ctx.collections
        .create(docs().with_field(FieldSchema::text("obsolete")))
        .await
        .unwrap();

    let next = docs()
        .with_field(FieldSchema::number("score"))
        .with_index("CREATE INDEX idx_docs_score ON docs (score)");
    let updated = ctx.collections.update(next).await.unwrap();
    assert!(updated.field("score").is_some());
    assert!(updated.field("obsolete").is_none());

    let columns: Vec<String> = ctx
        .database
        .call(|conn| {
            let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('docs')")?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(names)
        })
        .await
        .unwrap();
    assert!(columns.contains(&"score".to_string()));
    assert!(!columns.contains(&"obsolete".to_string()));

    let index_exists: bool = ctx
        .database
        .call(|conn| {
            Ok(conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='index' AND name='idx_docs_score')",
                [],
                |row| row.get(0),
            )?)
        })
        .await
        .unwrap();
    assert!(index_exists);
}

#[tokio::test]
async fn test_rename_rejected() {
    let ctx = context().await;
    let created = ctx.collections.create(docs()).await.unwrap();
    let mut renamed = created.clone();
    renamed.name = "articles".to_string();
    assert!(ctx.collections.update(renamed).await.is_err());
}

#[tokio::test]
async fn test_hook_event_order() {
    let ctx = context().await;
    let hook = Arc::new(RecordingHook::default());
    ctx.hooks.register_collection_hook(hook.clone()).unwrap();

    ctx.collections.create(docs()).await.unwrap();
    ctx.collections
        .update(docs().with_field(FieldSchema::text("tags")))
        .await
        .unwrap();
    ctx.collections.delete("docs").await.unwrap();

    let events = hook.events.lock().clone();
    assert_eq!(
        events,
        vec![
            (CollectionEventKind::Created, "docs".to_string(), true),
            (CollectionEventKind::Updating, "docs".to_string(), true),
            (CollectionEventKind::Updated, "docs".to_string(), true),
            (CollectionEventKind::Deleting, "docs".to_string(), true),
        ]
    );
    assert!(!ctx.database.table_exists("docs").await.unwrap());
    assert!(ctx.collections.find("docs").await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_update_restores_hooks() {
    let ctx = context().await;
    let hook = Arc::new(RecordingHook::default());
    ctx.hooks.register_collection_hook(hook.clone()).unwrap();
    ctx.collections
        .create(docs().with_index("CREATE UNIQUE INDEX idx_docs ON docs (title, content)"))
        .await
        .unwrap();

    // The index statement references a column the new schema does not have.
    let broken = CollectionDescriptor::new("docs")
        .with_field(FieldSchema::text("content"))
        .with_index("CREATE UNIQUE INDEX idx_docs ON docs (title, content)");
    assert!(ctx.collections.update(broken).await.is_err());

    let kinds: Vec<_> = hook.events.lock().iter().map(|e| e.0).collect();
    assert_eq!(
        kinds,
        vec![
            CollectionEventKind::Created,
            CollectionEventKind::Updating,
            CollectionEventKind::Updated,
        ]
    );
    assert!(ctx.collections.get("docs").await.unwrap().field("title").is_some());
}

#[tokio::test]
async fn test_deleting_hook_can_veto() {
    let ctx = context().await;
    let hook = Arc::new(VetoHook(AtomicUsize::new(0)));
    ctx.hooks.register_collection_hook(hook.clone()).unwrap();
    ctx.collections.create(docs()).await.unwrap();

    assert!(ctx.collections.delete("docs").await.is_err());
    assert_eq!(hook.0.load(Ordering::SeqCst), 1);
    assert!(ctx.database.table_exists("docs").await.unwrap());
}

#[tokio::test]
async fn test_list() {
    let ctx = context().await;
    ctx.collections.create(docs()).await.unwrap();
    ctx.collections
        .create(CollectionDescriptor::new("notes"))
        .await
        .unwrap();
    let names: Vec<_> = ctx
        .collections
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"docs".to_string()));
}
