//! Worked seed-selection scenario.
//!
//! Locations grow in three stages; each stage fixes the seeds farthest-first
//! selection must return under diff-taxa, uniform weights, kingdom cutoff.

use std::sync::Arc;

use speleo_cluster_core::clustering::{ClusteringEngine, ClusteringParams, SeedComparison};
use speleo_cluster_core::stubs::InMemoryEffortStore;
use speleo_cluster_core::taxonomy::LocationId;
use speleo_cluster_test_utils::{load, seed_scenario, SCOPE};

async fn seeds_for(
    stage: usize,
    k: usize,
    comparison: SeedComparison,
    page_size: usize,
) -> Vec<LocationId> {
    let store = Arc::new(InMemoryEffortStore::new());
    load(&store, seed_scenario(stage));

    let params = ClusteringParams::new(SCOPE, k)
        .with_seed_comparison(comparison)
        .with_page_size(page_size);
    let engine = ClusteringEngine::new(store, params).expect("valid params");
    engine.select_seeds().await.expect("seed selection")
}

#[tokio::test]
async fn test_stage_one_has_single_seed() {
    for k in [1, 2] {
        let seeds = seeds_for(1, k, SeedComparison::Cumulative, 100).await;
        assert_eq!(seeds, vec![2], "K={}", k);
    }
    println!("[PASS] test_stage_one_has_single_seed - seeds=[2]");
}

#[tokio::test]
async fn test_stage_two_adds_location_five() {
    let seeds = seeds_for(2, 2, SeedComparison::Cumulative, 100).await;
    assert_eq!(seeds, vec![2, 5]);
    println!("[PASS] test_stage_two_adds_location_five - seeds={:?}", seeds);
}

#[tokio::test]
async fn test_stage_three_starts_from_richest() {
    let seeds = seeds_for(3, 3, SeedComparison::Cumulative, 100).await;
    assert_eq!(seeds, vec![7, 2, 5]);
    println!("[PASS] test_stage_three_starts_from_richest - seeds={:?}", seeds);
}

#[tokio::test]
async fn test_per_seed_mode_matches_on_worked_scenario() {
    assert_eq!(seeds_for(1, 2, SeedComparison::PerSeed, 100).await, vec![2]);
    assert_eq!(seeds_for(2, 2, SeedComparison::PerSeed, 100).await, vec![2, 5]);
    assert_eq!(seeds_for(3, 3, SeedComparison::PerSeed, 100).await, vec![7, 2, 5]);
}

#[tokio::test]
async fn test_page_size_does_not_change_seeds() {
    for page_size in [1, 2, 3, 7] {
        let seeds = seeds_for(3, 3, SeedComparison::Cumulative, page_size).await;
        assert_eq!(seeds, vec![7, 2, 5], "page_size={}", page_size);
    }
}

#[tokio::test]
async fn test_species_filter_excludes_richest() {
    let store = Arc::new(InMemoryEffortStore::new());
    load(&store, seed_scenario(3));

    // Location 7 (7 species) falls outside the range.
    let params = ClusteringParams::new(SCOPE, 1).with_species_range(1, 5);
    let engine = ClusteringEngine::new(store, params).unwrap();
    let seeds = engine.select_seeds().await.unwrap();
    assert_eq!(seeds, vec![2], "richest eligible, lowest ID among ties");
}
