//! Property-based tests for the small-world index.
//!
//! These verify laws that should hold regardless of input:
//! - the published graph is structurally sound for any data
//! - serial builds are a pure function of (data, parameters, seed)
//! - search results are sorted, bounded by k, and exact on complete graphs
//! - recall is always in [0, 1]

use proptest::prelude::*;
use proxima::benchmark::recall_at_k;
use proxima::space::l2_distance_squared;
use proxima::{KnnCollector, L2Space, SmallWorldIndex, SmallWorldParams};

fn slices(points: &[Vec<f32>]) -> Vec<&[f32]> {
    points.iter().map(Vec::as_slice).collect()
}

fn arb_points(max_len: usize, dim: usize) -> impl Strategy<Value = Vec<Vec<f32>>> {
    prop::collection::vec(
        prop::collection::vec(-100.0f32..100.0, dim),
        0..max_len,
    )
}

mod graph_props {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(40))]

        #[test]
        fn build_publishes_every_point_and_stays_consistent(
            points in arb_points(60, 3),
            nn in 1usize..6,
            seed in any::<u64>(),
        ) {
            let data = slices(&points);
            let params = SmallWorldParams {
                nn,
                index_thread_qty: 1,
                seed: Some(seed),
                ..SmallWorldParams::default()
            };
            let index = SmallWorldIndex::build(&L2Space, &data, params).unwrap();
            prop_assert_eq!(index.len(), points.len());
            prop_assert!(index.is_consistent());
        }

        #[test]
        fn serial_build_is_a_function_of_data_params_seed(
            points in arb_points(40, 2),
            nn in 1usize..5,
            attempts in 1usize..4,
            seed in any::<u64>(),
        ) {
            let build = || {
                let data = slices(&points);
                let params = SmallWorldParams {
                    nn,
                    init_index_attempts: attempts,
                    index_thread_qty: 1,
                    seed: Some(seed),
                    ..SmallWorldParams::default()
                };
                SmallWorldIndex::build(&L2Space, &data, params).unwrap()
            };
            let first = build();
            let second = build();
            prop_assert_eq!(first.len(), second.len());
            for position in 0..first.len() {
                let mut a = first.friends_of(position).unwrap();
                let mut b = second.friends_of(position).unwrap();
                a.sort_unstable();
                b.sort_unstable();
                prop_assert_eq!(a, b);
            }
        }
    }
}

mod search_props {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(40))]

        #[test]
        fn results_are_sorted_and_bounded_by_k(
            points in arb_points(50, 3),
            query in prop::collection::vec(-100.0f32..100.0, 3),
            k in 1usize..8,
            seed in any::<u64>(),
        ) {
            let data = slices(&points);
            let params = SmallWorldParams {
                nn: 3,
                index_thread_qty: 1,
                seed: Some(seed),
                ..SmallWorldParams::default()
            };
            let index = SmallWorldIndex::build(&L2Space, &data, params).unwrap();

            let mut collector =
                KnnCollector::new(k, |p: &[f32]| l2_distance_squared(&query, p));
            index.knn_search(&mut collector).unwrap();
            let hits = collector.into_sorted_hits();

            prop_assert!(hits.len() <= k);
            prop_assert!(hits.len() <= points.len());
            if !points.is_empty() {
                prop_assert!(!hits.is_empty());
            }
            prop_assert!(hits.windows(2).all(|w| w[0].0 <= w[1].0));
        }

        #[test]
        fn complete_graph_search_matches_brute_force(
            points in arb_points(20, 2),
            query in prop::collection::vec(-100.0f32..100.0, 2),
            k in 1usize..5,
            seed in any::<u64>(),
        ) {
            // NN >= N - 1: the graph is complete and one attempt sees
            // everything, so distances must match brute force exactly.
            let data = slices(&points);
            let params = SmallWorldParams {
                nn: 20,
                index_thread_qty: 1,
                seed: Some(seed),
                ..SmallWorldParams::default()
            };
            let index = SmallWorldIndex::build(&L2Space, &data, params).unwrap();

            let mut collector =
                KnnCollector::new(k, |p: &[f32]| l2_distance_squared(&query, p));
            index.knn_search(&mut collector).unwrap();
            let approx: Vec<f32> = collector
                .into_sorted_hits()
                .iter()
                .map(|(d, _)| *d)
                .collect();

            let mut exact: Vec<f32> = points
                .iter()
                .map(|p| l2_distance_squared(&query, p))
                .collect();
            exact.sort_by(f32::total_cmp);
            exact.truncate(k);

            prop_assert_eq!(approx, exact);
        }
    }
}

mod recall_props {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn recall_in_unit_interval(
            gt in prop::collection::vec(0usize..1000, 1..50),
            ret in prop::collection::vec(0usize..1000, 1..50),
            k in 1usize..20,
        ) {
            let recall = recall_at_k(&gt, &ret, k);
            prop_assert!(
                (0.0..=1.0).contains(&recall),
                "recall must be in [0,1], got {}",
                recall
            );
        }
    }
}
