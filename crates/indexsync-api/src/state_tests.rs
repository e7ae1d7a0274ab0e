use super::*;
use indexsync_protocols::HashEmbedding;

#[tokio::test]
async fn test_state_defaults_to_no_search() {
    let ctx = ExtensionContext::new(Database::open_in_memory().await.unwrap());
    let state = AppState::new(&ctx, Arc::new(HashEmbedding::default()));
    assert!(state.vector_search.is_none());
    assert!(state.full_text_search.is_none());
    assert!(state.global_store.is_none());
    assert_eq!(state.provider.id(), "hash");
}

#[tokio::test]
async fn test_builders_attach_services() {
    let ctx = ExtensionContext::new(Database::open_in_memory().await.unwrap());
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(HashEmbedding::default());
    let state = AppState::new(&ctx, provider.clone())
        .with_vector_search(Some(SimilaritySearch::new(
            ctx.collections.clone(),
            provider,
            ["docs".to_string()],
        )))
        .with_full_text_search(Some(LexicalSearch::new(
            ctx.collections.clone(),
            ["docs".to_string()],
        )));
    assert!(state.vector_search.unwrap().is_tracked("docs"));
    assert!(state.full_text_search.unwrap().is_tracked("docs"));
}
