use super::*;

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8090);
    assert_eq!(config.database.path, "indexsync.db");
    assert_eq!(config.database.busy_timeout_ms, 5000);
    assert_eq!(config.provider.kind, ProviderKind::Gemini);
    assert_eq!(config.provider.model, "text-embedding-004");
    assert_eq!(config.provider.connect_timeout_secs, 10);
    assert_eq!(config.provider.request_timeout_secs, 300);
    assert!(!config.vector_search.global_store);
    assert_eq!(config.vector_search.global_k, 20);
    assert!(config.full_text_search.collections.is_empty());
    assert_eq!(config.logging.level, "info");
    assert!(config.logging.dir.is_none());
}

#[test]
fn test_vector_collection_extra_fields() {
    let content = r#"
        [[vector_search.collections]]
        name = "docs"

        [[vector_search.collections]]
        name = "posts"
        extra_fields = [
            { name = "author", type = "relation", relation = "users" },
            { name = "score", type = "number" },
            { name = "slug", required = true },
        ]
    "#;
    let config: Config = toml::from_str(content).unwrap();
    let posts = &config.vector_search.collections[1];
    assert_eq!(posts.extra_fields.len(), 3);
    assert_eq!(posts.extra_fields[0].kind, ExtraFieldType::Relation);
    assert_eq!(posts.extra_fields[0].relation.as_deref(), Some("users"));
    assert_eq!(posts.extra_fields[1].kind, ExtraFieldType::Number);
    assert_eq!(posts.extra_fields[2].kind, ExtraFieldType::Text);
    assert!(posts.extra_fields[2].required);
}

#[test]
fn test_is_tracked() {
    let config = VectorSearchConfig {
        collections: vec![VectorCollectionConfig::new("docs")],
        ..Default::default()
    };
    assert!(config.is_tracked("docs"));
    assert!(!config.is_tracked("notes"));
    assert_eq!(config.collection_names().collect::<Vec<_>>(), vec!["docs"]);
}

#[test]
fn test_provider_kind_hash() {
    let config: Config = toml::from_str("[provider]\nkind = \"hash\"").unwrap();
    assert_eq!(config.provider.kind, ProviderKind::Hash);
}

#[test]
fn test_unknown_provider_kind_rejected() {
    let result: Result<Config, _> = toml::from_str("[provider]\nkind = \"openai\"");
    assert!(result.is_err());
}
