//! Property tests for threshold filtering and winner selection

use proptest::prelude::*;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use intent_router::{RouteRegistry, Router, RouterSettings, StaticEmbedder};

const DIM: usize = 4;

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime")
        .block_on(future)
}

fn arb_vector() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-1.0f32..1.0, DIM)
}

fn arb_examples() -> impl Strategy<Value = Vec<Vec<f32>>> {
    prop::collection::vec(arb_vector(), 1..4)
}

/// Two intents `a` and `b` with generated example vectors, plus a query
fn fixture(
    a_priority: u32,
    a: &[Vec<f32>],
    b_priority: u32,
    b: &[Vec<f32>],
    query: &[f32],
) -> (RouteRegistry, Arc<StaticEmbedder>) {
    let mut embedder = StaticEmbedder::new(DIM);
    let mut registry = RouteRegistry::new();

    for (name, priority, vectors) in [("a", a_priority, a), ("b", b_priority, b)] {
        let examples: Vec<String> = (0..vectors.len()).map(|i| format!("{}{}", name, i)).collect();
        for (example, vector) in examples.iter().zip(vectors) {
            embedder.insert(example.clone(), vector.clone());
        }
        registry.add_intent(name, priority, &examples).unwrap();
    }
    embedder.insert("query", query.to_vec());

    (registry, Arc::new(embedder))
}

fn matched(router: &Router, threshold: f32) -> HashSet<String> {
    block_on(router.rank("query", threshold))
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect()
}

proptest! {
    #[test]
    fn threshold_is_monotonic(
        a in arb_examples(),
        b in arb_examples(),
        query in arb_vector(),
        t1 in 0.0f32..2.0,
        delta in 0.0f32..1.0,
    ) {
        let (registry, embedder) = fixture(1, &a, 2, &b, &query);
        let router = block_on(Router::build_new(registry, embedder, RouterSettings::default())).unwrap();

        let low = matched(&router, t1);
        let high = matched(&router, t1 + delta);
        prop_assert!(low.is_subset(&high), "{:?} not subset of {:?}", low, high);
    }

    #[test]
    fn lower_priority_number_always_wins(
        a in arb_examples(),
        b in arb_examples(),
        query in arb_vector(),
    ) {
        let (registry, embedder) = fixture(1, &a, 2, &b, &query);
        let router = block_on(Router::build_new(registry, embedder, RouterSettings::default())).unwrap();

        // Every cosine distance is <= 2, so both intents pass
        let ranked = block_on(router.rank("query", 2.5)).unwrap();
        prop_assert_eq!(ranked.len(), 2);
        prop_assert_eq!(ranked[0].name.as_str(), "a");
    }

    #[test]
    fn equal_priority_prefers_smaller_distance(
        a in arb_examples(),
        b in arb_examples(),
        query in arb_vector(),
    ) {
        let (registry, embedder) = fixture(1, &a, 1, &b, &query);
        let router = block_on(Router::build_new(registry, embedder, RouterSettings::default())).unwrap();

        let scores = block_on(router.scores("query")).unwrap();
        let winner = block_on(router.route("query", 2.5)).unwrap().unwrap();
        let best = scores
            .iter()
            .map(|s| s.min_distance)
            .fold(f32::INFINITY, f32::min);
        prop_assert_eq!(winner.min_distance, best);
        if scores[0].min_distance == scores[1].min_distance {
            prop_assert_eq!(winner.name.as_str(), "a");
        }
    }

    #[test]
    fn distances_stay_in_range_and_rebuilds_agree(
        a in arb_examples(),
        b in arb_examples(),
        query in arb_vector(),
    ) {
        let (registry, embedder) = fixture(1, &a, 2, &b, &query);
        let mut router = Router::new(registry, embedder, RouterSettings::default());

        block_on(router.build()).unwrap();
        let first = block_on(router.scores("query")).unwrap();
        block_on(router.build()).unwrap();
        let second = block_on(router.scores("query")).unwrap();

        prop_assert_eq!(&first, &second);
        for score in &first {
            prop_assert!((0.0..=2.0).contains(&score.min_distance));
        }
    }
}
