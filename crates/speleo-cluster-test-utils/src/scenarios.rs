//! Worked clustering scenarios.

use speleo_cluster_core::stubs::InMemoryEffortStore;
use speleo_cluster_core::taxonomy::{LocationEffort, Rank};

use crate::efforts::EffortBuilder;

/// Scope every scenario is loaded under.
pub const SCOPE: &str = "caves";

/// Insert records into `store` under [`SCOPE`].
pub fn load(store: &InMemoryEffortStore, efforts: impl IntoIterator<Item = LocationEffort>) {
    store.insert_all(SCOPE, efforts);
}

/// `(kingdom, phylum, family, genus)` paths; class and order are unrecorded.
fn genera(id: u64, paths: &[[&str; 4]]) -> LocationEffort {
    paths
        .iter()
        .fold(EffortBuilder::new(id), |builder, &[k, p, f, g]| {
            builder.ranked_path(&[
                (Rank::Kingdom, k),
                (Rank::Phylum, p),
                (Rank::Family, f),
                (Rank::Genus, g),
            ])
        })
        .build()
}

/// Seed-selection fixture, in three growth stages.
///
/// - stage 1: locations 1-3 with 1, 5 and 3 genera
/// - stage 2: adds 4-6 with 5, 5 and 4 genera over new phyla and families
/// - stage 3: adds 7 with 7 genera over the broadest phylum spread
///
/// Under diff-taxa, uniform weights, kingdom cutoff and cumulative comparison
/// the expected seeds are `[2]` (stage 1, K = 1 or 2), `[2, 5]` (stage 2,
/// K = 2) and `[7, 2, 5]` (stage 3, K = 3).
pub fn seed_scenario(stage: usize) -> Vec<LocationEffort> {
    const G1: [&str; 4] = ["k1", "p1", "f1", "g1"];
    const G2: [&str; 4] = ["k1", "p1", "f1", "g2"];
    const G3: [&str; 4] = ["k1", "p1", "f2", "g3"];
    const G4: [&str; 4] = ["k1", "p2", "f3", "g4"];
    const G5: [&str; 4] = ["k1", "p2", "f3", "g5"];
    const G6: [&str; 4] = ["k1", "p2", "f4", "g6"];
    const G7: [&str; 4] = ["k1", "p3", "f5", "g7"];
    const G8: [&str; 4] = ["k1", "p3", "f5", "g8"];
    const G9: [&str; 4] = ["k1", "p4", "f6", "g9"];
    const G10: [&str; 4] = ["k1", "p2", "f7", "g10"];
    const G11: [&str; 4] = ["k1", "p2", "f7", "g11"];
    const G12: [&str; 4] = ["k1", "p3", "f8", "g12"];
    const G13: [&str; 4] = ["k1", "p5", "f9", "g13"];
    const G14: [&str; 4] = ["k1", "p5", "f9", "g14"];
    const G15: [&str; 4] = ["k1", "p6", "f10", "g15"];
    const G16: [&str; 4] = ["k1", "p6", "f10", "g16"];

    let mut efforts = vec![
        genera(1, &[G1]),
        genera(2, &[G1, G2, G3, G4, G5]),
        genera(3, &[G1, G2, G3]),
    ];
    if stage >= 2 {
        efforts.extend([
            genera(4, &[G1, G2, G3, G4, G6]),
            genera(5, &[G7, G8, G9, G1, G2]),
            genera(6, &[G4, G5, G10, G11]),
        ]);
    }
    if stage >= 3 {
        efforts.push(genera(7, &[G7, G8, G12, G13, G14, G15, G16]));
    }
    efforts
}

/// Two taxonomically separate groups of three locations, leaves at phylum.
///
/// Group A (1-3) widens p1, p1+p2, p1+p2+p3; group B (4-6) widens p4,
/// p4+p5, p4+p5+p6. Any one seed per group converges to `{1,2,3}` and
/// `{4,5,6}`.
pub fn two_groups() -> Vec<LocationEffort> {
    let phyla = |id: u64, names: &[&str]| {
        names
            .iter()
            .fold(EffortBuilder::new(id), |builder, &phylum| {
                builder.path(&["k1", phylum])
            })
            .build()
    };
    vec![
        phyla(1, &["p1"]),
        phyla(2, &["p1", "p2"]),
        phyla(3, &["p1", "p2", "p3"]),
        phyla(4, &["p4"]),
        phyla(5, &["p4", "p5"]),
        phyla(6, &["p4", "p5", "p6"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_scenario_species_counts() {
        let counts: Vec<u32> = seed_scenario(3).iter().map(|e| e.total_species).collect();
        assert_eq!(counts, vec![1, 5, 3, 5, 5, 4, 7]);
        assert_eq!(seed_scenario(1).len(), 3);
        assert_eq!(seed_scenario(2).len(), 6);
    }

    #[test]
    fn test_two_groups_species_counts() {
        let counts: Vec<u32> = two_groups().iter().map(|e| e.total_species).collect();
        assert_eq!(counts, vec![1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn test_load_into_store() {
        let store = InMemoryEffortStore::new();
        load(&store, two_groups());
        assert_eq!(store.len(SCOPE), 6);
    }
}
