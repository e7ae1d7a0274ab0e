use super::*;

fn unit(dimension: usize, axis: usize) -> Embedding {
    let mut vector = vec![0.0; dimension];
    vector[axis] = 1.0;
    Embedding::new(vector)
}

async fn store() -> EmbeddingStore {
    let db = Database::open_in_memory().await.unwrap();
    let store = EmbeddingStore::new(db, "docs");
    store.ensure(4).await.unwrap();
    store
}

#[test]
fn test_table_name() {
    assert_eq!(embeddings_table("docs"), "docs_embeddings");
}

#[tokio::test]
async fn test_ensure_is_idempotent() {
    let store = store().await;
    store.ensure(4).await.unwrap();
    assert_eq!(store.table(), "docs_embeddings");
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_insert_assigns_increasing_ids() {
    let store = store().await;
    let a = store.insert(&unit(4, 0)).await.unwrap();
    let b = store.insert(&unit(4, 1)).await.unwrap();
    assert!(b > a);
    assert_eq!(store.count().await.unwrap(), 2);
    assert_eq!(store.get(a).await.unwrap(), Some(unit(4, 0)));
}

#[tokio::test]
async fn test_delete_missing_is_noop() {
    let store = store().await;
    let id = store.insert(&unit(4, 0)).await.unwrap();
    assert!(store.delete_by_id(id).await.unwrap());
    assert!(!store.delete_by_id(id).await.unwrap());
    assert!(!store.delete_by_id(9999).await.unwrap());
    assert!(!store.contains(id).await.unwrap());
}

#[tokio::test]
async fn test_knn_orders_by_distance() {
    let store = store().await;
    let x = store.insert(&unit(4, 0)).await.unwrap();
    let y = store.insert(&unit(4, 1)).await.unwrap();
    let near_x = store
        .insert(&Embedding::new(vec![0.9, 0.1, 0.0, 0.0]))
        .await
        .unwrap();

    let hits = store.knn(&unit(4, 0), 2).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].0, x);
    assert_eq!(hits[1].0, near_x);
    assert!(hits[0].1 <= hits[1].1);

    let all = store.knn(&unit(4, 1), 10).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].0, y);
}

#[tokio::test]
async fn test_knn_empty_table() {
    let store = store().await;
    assert!(store.knn(&unit(4, 0), 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_wrong_dimension_rejected() {
    let store = store().await;
    assert!(store.insert(&unit(3, 0)).await.is_err());
}

#[tokio::test]
async fn test_drop_table() {
    let store = store().await;
    store.insert(&unit(4, 0)).await.unwrap();
    store.drop_table().await.unwrap();
    store.drop_table().await.unwrap();
    assert!(store.count().await.is_err());
}
