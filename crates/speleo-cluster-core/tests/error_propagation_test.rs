//! Error paths surface to the caller and validation happens before any fetch.

use std::sync::Arc;

use speleo_cluster_core::clustering::{ClusterError, ClusteringEngine, ClusteringParams};
use speleo_cluster_core::stubs::InMemoryEffortStore;
use speleo_cluster_core::taxonomy::{LocationEffort, RankEffort};
use speleo_cluster_core::{Config, CoreError, StorageError};
use speleo_cluster_test_utils::{load, two_groups, SCOPE};

fn store() -> Arc<InMemoryEffortStore> {
    let store = Arc::new(InMemoryEffortStore::new());
    load(&store, two_groups());
    store
}

/// One kingdom name with two leaf markers.
fn malformed(id: u64) -> LocationEffort {
    let mut effort = LocationEffort::new(id);
    effort.total_species = 1;
    effort.ranks[0] = Some(RankEffort::new(vec!["k1".into()], "10"));
    effort
}

#[test]
fn test_invalid_params_fail_before_any_fetch() {
    let cases = [
        ClusteringParams::new("", 2),
        ClusteringParams::new(SCOPE, 0),
        ClusteringParams::new(SCOPE, 2).with_species_range(5, 2),
        ClusteringParams::new(SCOPE, 2).with_page_size(0),
        ClusteringParams::new(SCOPE, 2).with_max_passes(0),
        ClusteringParams::new(SCOPE, 2).with_greatest_lower_dissimilarity(f64::NAN),
    ];
    let store = store();

    for params in cases {
        let result = ClusteringEngine::new(Arc::clone(&store), params.clone());
        assert!(
            matches!(result, Err(ClusterError::InvalidParameter { .. })),
            "{:?} should be rejected",
            params
        );
    }
    assert_eq!(store.page_requests(), 0);
    assert_eq!(store.lookup_requests(), 0);
    println!("[PASS] test_invalid_params_fail_before_any_fetch");
}

#[test]
fn test_from_config_rejects_unknown_basis() {
    let mut config = Config::default_config();
    config.clustering.basis = "bray-curtis".into();

    let store = store();
    let err = ClusteringEngine::from_config(Arc::clone(&store), &config).unwrap_err();
    assert!(
        matches!(err, CoreError::Cluster(ClusterError::InvalidParameter { .. })),
        "got: {:?}",
        err
    );
    assert!(err.to_string().contains("bray-curtis"));
    assert_eq!(store.page_requests(), 0);
}

#[test]
fn test_from_config_enables_cache() {
    let mut config = Config::default_config();
    config.clustering.scope = SCOPE.into();

    let engine = ClusteringEngine::from_config(store(), &config).unwrap();
    assert!(engine.cache().is_some());

    config.cache.enabled = false;
    let engine = ClusteringEngine::from_config(store(), &config).unwrap();
    assert!(engine.cache().is_none());
}

#[tokio::test]
async fn test_unavailable_store_propagates() {
    let store = store();
    store.set_available(false);
    let mut engine = ClusteringEngine::new(Arc::clone(&store), ClusteringParams::new(SCOPE, 2)).unwrap();

    let err = engine.select_seeds().await.unwrap_err();
    assert!(matches!(
        err,
        ClusterError::StorageError(StorageError::Unavailable(_))
    ));

    let err = engine.cluster_with_seeds(&[1, 4]).await.unwrap_err();
    assert!(matches!(err, ClusterError::StorageError(_)));

    let err = engine.run().await.unwrap_err();
    assert!(matches!(err, ClusterError::StorageError(_)));
    println!("[PASS] test_unavailable_store_propagates - {}", err);
}

#[tokio::test]
async fn test_unknown_seed_is_reported() {
    let mut engine = ClusteringEngine::new(store(), ClusteringParams::new(SCOPE, 2)).unwrap();

    let err = engine.cluster_with_seeds(&[1, 404]).await.unwrap_err();
    assert!(
        matches!(err, ClusterError::SeedNotFound { location_id: 404 }),
        "got: {}",
        err
    );
}

#[tokio::test]
async fn test_malformed_seed_record_is_reported() {
    let store = store();
    store.insert(SCOPE, malformed(9));
    let mut engine = ClusteringEngine::new(store, ClusteringParams::new(SCOPE, 2)).unwrap();

    let err = engine.cluster_with_seeds(&[1, 9]).await.unwrap_err();
    match err {
        ClusterError::MalformedEffort { location_id, .. } => assert_eq!(location_id, 9),
        other => panic!("expected MalformedEffort, got {}", other),
    }
}

#[tokio::test]
async fn test_malformed_record_in_stream_is_reported() {
    let store = Arc::new(InMemoryEffortStore::new());
    store.insert(SCOPE, malformed(9));
    let engine = ClusteringEngine::new(store, ClusteringParams::new(SCOPE, 2)).unwrap();

    // The only eligible record becomes the first seed and fails to decode.
    let err = engine.select_seeds().await.unwrap_err();
    assert!(matches!(err, ClusterError::MalformedEffort { location_id: 9, .. }));
}
