//! Integration tests for index rebuild, persistence and recovery.

use std::sync::Arc;

use mercato::catalog::{CatalogItem, CatalogReader, MemoryCatalog};
use mercato::embedding::HashingEmbedder;
use mercato::error::Result;
use mercato::search::{EngineConfig, SearchEngine, SearchMode, SearchRequest};

fn catalog_with_products(count: u64) -> Arc<MemoryCatalog> {
    let catalog = MemoryCatalog::shared();
    for id in 1..=count {
        catalog.put_product(
            CatalogItem::new(id, &format!("Gadget {id}"))
                .with_description("general purpose gadget"),
        );
    }
    catalog
}

fn engine_for(catalog: &Arc<MemoryCatalog>, config: EngineConfig) -> Result<SearchEngine> {
    SearchEngine::new(
        Arc::clone(catalog) as Arc<dyn CatalogReader>,
        Arc::new(HashingEmbedder::default()),
        config,
    )
}

#[test]
fn test_rebuild_empty_catalog_succeeds() -> Result<()> {
    let catalog = MemoryCatalog::shared();
    let engine = engine_for(&catalog, EngineConfig::default())?;

    let report = engine.rebuild_index()?;
    assert!(report.success);
    assert_eq!(report.products_indexed, 0);

    let response = engine.search(
        &SearchRequest::new("anything").with_mode(SearchMode::Semantic),
    )?;
    assert!(response.items.is_empty());
    Ok(())
}

#[test]
fn test_rebuild_reports_count_and_stats() -> Result<()> {
    let catalog = catalog_with_products(12);
    let engine = engine_for(&catalog, EngineConfig::default())?;

    let report = engine.rebuild_index()?;
    assert_eq!(report.products_indexed, 12);

    let stats = engine.index_stats();
    assert_eq!(stats.total_products, 12);
    assert_eq!(stats.tombstones, 0);
    assert!(stats.model_name.starts_with("feature-hashing"));
    Ok(())
}

#[test]
fn test_rebuild_reflects_catalog_changes() -> Result<()> {
    let catalog = catalog_with_products(3);
    let engine = engine_for(&catalog, EngineConfig::default())?;
    engine.rebuild_index()?;
    assert_eq!(engine.index_stats().total_products, 3);

    catalog.delete_product(2);
    catalog.put_product(CatalogItem::new(9, "Gadget 9"));
    engine.rebuild_index()?;

    assert_eq!(engine.index_stats().total_products, 3);
    Ok(())
}

#[test]
fn test_deleted_product_never_reaches_responses() -> Result<()> {
    let catalog = catalog_with_products(3);
    let engine = engine_for(&catalog, EngineConfig::default())?;
    engine.rebuild_index()?;

    // Delete from the catalog without touching the index: the stale index
    // entry must be filtered after the catalog lookup.
    catalog.delete_product(1);

    let response = engine.search(
        &SearchRequest::new("gadget").with_mode(SearchMode::Semantic),
    )?;
    assert!(response.items.iter().all(|c| c.item.id != 1));
    Ok(())
}

#[test]
fn test_incremental_add_and_soft_delete() -> Result<()> {
    let catalog = catalog_with_products(2);
    let engine = engine_for(&catalog, EngineConfig::default())?;
    engine.rebuild_index()?;

    let late_arrival = CatalogItem::new(3, "Gadget 3").with_description("general purpose gadget");
    catalog.put_product(late_arrival.clone());
    engine.add_product(&late_arrival)?;
    assert_eq!(engine.index_stats().total_products, 3);

    assert!(engine.remove_product(3));
    assert!(!engine.remove_product(3));
    assert_eq!(engine.index_stats().total_products, 2);
    assert_eq!(engine.index_stats().tombstones, 1);

    engine.compact_index();
    assert_eq!(engine.index_stats().tombstones, 0);
    assert_eq!(engine.index_stats().total_products, 2);
    Ok(())
}

#[test]
fn test_snapshot_survives_restart() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let catalog = catalog_with_products(5);
    let config = EngineConfig {
        snapshot_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };

    {
        let engine = engine_for(&catalog, config.clone())?;
        engine.rebuild_index()?;
    }

    // A fresh engine over the same directory picks the snapshot up without
    // a rebuild.
    let reopened = engine_for(&catalog, config)?;
    assert_eq!(reopened.index_stats().total_products, 5);

    let response = reopened.search(
        &SearchRequest::new("gadget").with_mode(SearchMode::Semantic),
    )?;
    assert!(!response.items.is_empty());
    Ok(())
}

#[test]
fn test_corrupt_snapshot_degrades_to_keyword_only() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let catalog = catalog_with_products(5);
    let config = EngineConfig {
        snapshot_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };

    {
        let engine = engine_for(&catalog, config.clone())?;
        engine.rebuild_index()?;
    }

    std::fs::write(
        dir.path().join(mercato::index::snapshot::VECTORS_FILE),
        b"not a vector file",
    )
    .unwrap();

    let reopened = engine_for(&catalog, config)?;
    assert_eq!(reopened.index_stats().total_products, 0);

    // Hybrid search still serves lexical matches off the empty index.
    let response = reopened.search(&SearchRequest::new("gadget"))?;
    assert!(!response.items.is_empty());
    assert_eq!(response.search_metadata.semantic_matches, 0);
    Ok(())
}

#[test]
fn test_rebuild_is_deterministic_across_engines() -> Result<()> {
    let catalog = catalog_with_products(6);

    let first = engine_for(&catalog, EngineConfig::default())?;
    first.rebuild_index()?;
    let second = engine_for(&catalog, EngineConfig::default())?;
    second.rebuild_index()?;

    let request = SearchRequest::new("gadget").with_mode(SearchMode::Semantic);
    let first_ids: Vec<u64> = first.search(&request)?.items.iter().map(|c| c.item.id).collect();
    let second_ids: Vec<u64> = second.search(&request)?.items.iter().map(|c| c.item.id).collect();

    assert_eq!(first_ids, second_ids);
    assert!(!first_ids.is_empty());
    Ok(())
}
