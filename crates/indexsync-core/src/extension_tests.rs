use super::*;

struct CountingExtension {
    manifest: ExtensionManifest,
    initialized: bool,
}

#[async_trait]
impl Extension for CountingExtension {
    fn manifest(&self) -> &ExtensionManifest {
        &self.manifest
    }

    async fn initialize(&mut self, ctx: ExtensionContext) -> Result<(), ExtensionError> {
        ctx.database
            .table_exists("_collections")
            .await
            .map_err(|e| ExtensionError::InitializationFailed(e.to_string()))?;
        self.initialized = true;
        Ok(())
    }
}

#[test]
fn test_manifest_builder() {
    let manifest = ExtensionManifest::new("vector-search", "Vector Search", "0.1.0")
        .with_description("embeddings");
    assert_eq!(manifest.id, "vector-search");
    assert_eq!(manifest.description, "embeddings");
}

#[tokio::test]
async fn test_initialize_with_context() {
    let db = Database::open_in_memory().await.unwrap();
    let ctx = ExtensionContext::new(db);
    let mut ext = CountingExtension {
        manifest: ExtensionManifest::new("test", "Test", "0.1.0"),
        initialized: false,
    };
    ext.initialize(ctx.clone()).await.unwrap();
    assert!(ext.initialized);
    ext.shutdown().await.unwrap();
    assert!(!ctx.hooks.has_record_hooks("docs"));
}
