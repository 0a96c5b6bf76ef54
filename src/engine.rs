//! Router engine
//!
//! Per query:
//!
//! 1. Embed the query (one provider call, never cached)
//! 2. Cosine distance to every cached example embedding
//! 3. Per intent, keep the minimum distance (best example wins)
//! 4. Drop intents whose minimum is not strictly below the threshold
//! 5. Order survivors by `(priority, min_distance, registration order)`
//!
//! Cost is O(total examples × D) per query, which suits a small fixed catalogue.
//! A large catalogue would want an approximate-nearest-neighbour index here.

use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

use intent_embedder::SharedEmbedder;

use crate::cache::EmbeddingCache;
use crate::distance::cosine_distance;
use crate::error::{Result, RouterError};
use crate::provider::{BoundedEmbedder, DEFAULT_EMBED_TIMEOUT};
use crate::registry::{Intent, RouteRegistry};

/// Default matching threshold on cosine distance
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Outcome for one intent against one query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub name: String,
    pub priority: u32,
    /// Smallest cosine distance between the query and any example of this intent
    pub min_distance: f32,
    /// The example that produced `min_distance`
    pub nearest_example: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouterSettings {
    pub threshold: f32,
    pub embed_timeout: Duration,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            embed_timeout: DEFAULT_EMBED_TIMEOUT,
        }
    }
}

/// Semantic intent router
///
/// `build` takes `&mut self` and `route` takes `&self`, so a router cannot be
/// rebuilt while queries are in flight. Once built it can be shared behind an
/// `Arc` and queried concurrently without locking.
#[derive(Debug)]
pub struct Router {
    registry: RouteRegistry,
    cache: Option<EmbeddingCache>,
    embedder: BoundedEmbedder,
    settings: RouterSettings,
}

impl Router {
    /// Create an unbuilt router; call [`Router::build`] before routing
    pub fn new(registry: RouteRegistry, embedder: SharedEmbedder, settings: RouterSettings) -> Self {
        Self {
            registry,
            cache: None,
            embedder: BoundedEmbedder::new(embedder, settings.embed_timeout),
            settings,
        }
    }

    /// Create and build in one step
    pub async fn build_new(
        registry: RouteRegistry,
        embedder: SharedEmbedder,
        settings: RouterSettings,
    ) -> Result<Self> {
        let mut router = Self::new(registry, embedder, settings);
        router.build().await?;
        Ok(router)
    }

    /// (Re)compute the embedding cache for the whole registry
    ///
    /// On failure the previous cache, if any, is left untouched.
    pub async fn build(&mut self) -> Result<()> {
        let cache = EmbeddingCache::build(&self.registry, &self.embedder).await?;
        self.cache = Some(cache);
        Ok(())
    }

    pub fn is_built(&self) -> bool {
        self.cache.is_some()
    }

    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    pub fn cache(&self) -> Option<&EmbeddingCache> {
        self.cache.as_ref()
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    /// Register an intent at runtime
    ///
    /// On a built router the new examples are embedded first; the intent only
    /// becomes eligible for matching once that succeeded.
    pub async fn add_intent(
        &mut self,
        name: &str,
        priority: u32,
        examples: &[impl AsRef<str>],
    ) -> Result<()> {
        let intent = Intent::new(name, priority, examples)?;
        if self.registry.contains(&intent.name) {
            return Err(RouterError::validation(format!(
                "intent '{}' is already registered",
                intent.name
            )));
        }

        if let Some(cache) = self.cache.as_mut() {
            cache.insert(&intent, &self.embedder).await?;
        }

        info!(intent = %intent.name, priority = intent.priority, "intent added");
        self.registry.push(intent)?;
        Ok(())
    }

    /// Route with the configured threshold
    pub async fn route_default(&self, query: &str) -> Result<Option<MatchResult>> {
        self.route(query, self.settings.threshold).await
    }

    /// Classify `query` into at most one intent
    ///
    /// `Ok(None)` means no intent came strictly below `threshold`.
    pub async fn route(&self, query: &str, threshold: f32) -> Result<Option<MatchResult>> {
        Ok(self.rank(query, threshold).await?.into_iter().next())
    }

    /// Every intent below `threshold`, best first
    #[instrument(skip(self))]
    pub async fn rank(&self, query: &str, threshold: f32) -> Result<Vec<MatchResult>> {
        Self::rank_scores(self.scores(query).await?, threshold)
    }

    /// Filter and order the output of [`Router::scores`]
    ///
    /// `scores` must be in registration order, which is the final tie-break.
    pub fn rank_scores(scores: Vec<MatchResult>, threshold: f32) -> Result<Vec<MatchResult>> {
        if threshold.is_nan() {
            return Err(RouterError::validation("threshold must be a number"));
        }

        let mut survivors: Vec<(usize, MatchResult)> = scores
            .into_iter()
            .enumerate()
            .filter(|(_, m)| m.min_distance < threshold)
            .collect();

        survivors.sort_by(|(ia, a), (ib, b)| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.min_distance.total_cmp(&b.min_distance))
                .then_with(|| ia.cmp(ib))
        });

        let ranked: Vec<MatchResult> = survivors.into_iter().map(|(_, m)| m).collect();
        match ranked.first() {
            Some(best) => debug!(
                intent = %best.name,
                priority = best.priority,
                min_distance = best.min_distance,
                candidates = ranked.len(),
                "query routed"
            ),
            None => debug!("no intent below threshold"),
        }
        Ok(ranked)
    }

    /// Minimum distance for every intent, unfiltered, in registration order
    pub async fn scores(&self, query: &str) -> Result<Vec<MatchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RouterError::validation("query must not be empty"));
        }
        let cache = self
            .cache
            .as_ref()
            .ok_or_else(|| RouterError::validation("router has not been built"))?;

        let query_embedding = self.embedder.embed(query).await?;

        self.registry
            .list_intents()
            .iter()
            .map(|intent| -> Result<MatchResult> {
                let entry = cache.entry(&intent.name).map_err(|e| {
                    error!(intent = %intent.name, "registry and embedding cache out of sync");
                    e
                })?;

                let (min_distance, nearest) = entry
                    .pairs()
                    .map(|(example, embedding)| {
                        (cosine_distance(&query_embedding, embedding), example)
                    })
                    .min_by(|a, b| a.0.total_cmp(&b.0))
                    .ok_or_else(|| {
                        RouterError::NotFound(format!("{} has no cached examples", intent.name))
                    })?;

                Ok(MatchResult {
                    name: intent.name.clone(),
                    priority: intent.priority,
                    min_distance,
                    nearest_example: nearest.to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intent_embedder::StaticEmbedder;
    use std::sync::Arc;

    fn registry() -> RouteRegistry {
        let mut registry = RouteRegistry::new();
        registry
            .add_intent("greeting", 1, &["Hello!", "Hi there!"])
            .unwrap();
        registry
            .add_intent("farewell", 2, &["Goodbye", "Bye!"])
            .unwrap();
        registry
    }

    fn fixture() -> StaticEmbedder {
        StaticEmbedder::new(3)
            .with("Hello!", vec![1.0, 0.0, 0.0])
            .with("Hi there!", vec![0.8, 0.6, 0.0])
            .with("Goodbye", vec![0.0, 0.0, 1.0])
            .with("Bye!", vec![0.0, 0.3, 0.95])
            .with("Hey there", vec![0.7, 0.7, 0.1])
            .with("What's the meaning of life?", vec![-0.6, 0.2, -0.7])
            .with("Hello and goodbye", vec![0.6, 0.0, 0.8])
    }

    async fn router(fixture: Arc<StaticEmbedder>) -> Router {
        Router::build_new(registry(), fixture, RouterSettings::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_routes_to_nearest_intent() {
        let router = router(Arc::new(fixture())).await;
        let result = router.route_default("Hey there").await.unwrap().unwrap();
        assert_eq!(result.name, "greeting");
        assert_eq!(result.priority, 1);
        assert_eq!(result.nearest_example, "Hi there!");
        assert!(result.min_distance < 0.5);
    }

    #[tokio::test]
    async fn test_no_match_is_none() {
        let router = router(Arc::new(fixture())).await;
        let result = router
            .route_default("What's the meaning of life?")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_priority_beats_distance() {
        // greeting at 0.4, farewell at 0.2; both below 0.5
        let router = router(Arc::new(fixture())).await;
        let ranked = router.rank("Hello and goodbye", 0.5).await.unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].name, "greeting");
        assert_eq!(ranked[1].name, "farewell");
        assert!(ranked[1].min_distance < ranked[0].min_distance);
    }

    #[tokio::test]
    async fn test_rank_scores_reuses_one_embedding() {
        let fixture = Arc::new(fixture());
        let router = router(fixture.clone()).await;
        fixture.reset_calls();

        let scores = router.scores("Hello and goodbye").await.unwrap();
        let ranked = Router::rank_scores(scores.clone(), 0.5).unwrap();
        assert_eq!(fixture.calls(), 1);
        assert_eq!(ranked, router.rank("Hello and goodbye", 0.5).await.unwrap());

        let strict = Router::rank_scores(scores.clone(), 0.3).unwrap();
        assert_eq!(strict.len(), 1);
        assert_eq!(strict[0].name, "farewell");
        assert!(matches!(
            Router::rank_scores(scores, f32::NAN),
            Err(RouterError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_threshold_is_strict() {
        let router = router(Arc::new(fixture())).await;
        let exact = router.route("Hello!", 0.5).await.unwrap().unwrap();
        assert!(exact.min_distance < 1e-6);

        // Self-distance is ~0, so a zero threshold admits nothing
        assert!(router.route("Hello!", 0.0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_query_makes_no_provider_call() {
        let fixture = Arc::new(fixture());
        let router = router(fixture.clone()).await;
        fixture.reset_calls();

        for query in ["", "   ", "\n\t"] {
            assert!(matches!(
                router.route_default(query).await,
                Err(RouterError::Validation(_))
            ));
        }
        assert_eq!(fixture.calls(), 0);
    }

    #[tokio::test]
    async fn test_unbuilt_router_rejects_queries() {
        let router = Router::new(registry(), Arc::new(fixture()), RouterSettings::default());
        assert!(!router.is_built());
        assert!(matches!(
            router.route_default("Hey there").await,
            Err(RouterError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_nan_threshold_rejected() {
        let router = router(Arc::new(fixture())).await;
        assert!(matches!(
            router.route("Hey there", f32::NAN).await,
            Err(RouterError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_one_provider_call_per_route() {
        let fixture = Arc::new(fixture());
        let router = router(fixture.clone()).await;
        assert_eq!(fixture.calls(), 4);

        router.route_default("Hey there").await.unwrap();
        router.route_default("Hey there").await.unwrap();
        assert_eq!(fixture.calls(), 6);
    }

    #[tokio::test]
    async fn test_add_intent_embeds_before_eligible() {
        let fixture = Arc::new(
            fixture()
                .with("Weather update", vec![0.0, -1.0, 0.0])
                .with("Will it rain?", vec![0.1, -0.9, 0.0])
                .fail_on("Broken example"),
        );
        let mut router = router(fixture).await;

        let err = router
            .add_intent("weather", 3, &["Weather update", "Broken example"])
            .await;
        assert!(matches!(err, Err(RouterError::EmbeddingProvider { .. })));
        assert!(!router.registry().contains("weather"));

        router
            .add_intent("weather", 3, &["Weather update"])
            .await
            .unwrap();
        let result = router.route_default("Will it rain?").await.unwrap().unwrap();
        assert_eq!(result.name, "weather");

        assert!(matches!(
            router.add_intent("weather", 1, &["Weather update"]).await,
            Err(RouterError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_scores_cover_every_intent() {
        let router = router(Arc::new(fixture())).await;
        let scores = router.scores("What's the meaning of life?").await.unwrap();
        let names: Vec<_> = scores.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["greeting", "farewell"]);
        assert!(scores.iter().all(|s| s.min_distance >= 0.5));
    }
}
