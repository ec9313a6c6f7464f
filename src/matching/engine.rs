use anyhow::Result;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::similarity::similarity;

/// One catalog row as the engine sees it: identifier plus the canonical
/// comparison name computed at ingest.
#[derive(Debug, Clone)]
pub struct CatalogProduct {
    pub id: i64,
    pub canonical_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub product_id: i64,
    pub score: f64,
}

/// A persisted equivalence edge between two product rows. Directional:
/// inserted as source -> target, read back through both columns.
#[derive(Debug, Clone)]
pub struct MatchEdge {
    pub id: i64,
    pub source_product_id: i64,
    pub target_product_id: i64,
    pub similarity_score: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMatchEdge {
    pub source_product_id: i64,
    pub target_product_id: i64,
    pub similarity_score: f64,
}

#[derive(Debug, Error)]
pub enum MatchStoreError {
    /// The (source, target) pair already exists. Callers treat this as a
    /// benign no-op; the uniqueness constraint makes retries idempotent.
    #[error("match edge already exists")]
    DuplicateMatch,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// The only record-store surface the engine depends on. Transaction
/// boundaries and the unique (source, target) constraint are the store's
/// responsibility.
#[allow(async_fn_in_trait)]
pub trait MatchStore {
    async fn list_all_products(&self) -> Result<Vec<CatalogProduct>>;
    async fn find_match(&self, source_id: i64, target_id: i64) -> Result<Option<MatchEdge>>;
    async fn insert_match(&self, edge: NewMatchEdge) -> Result<MatchEdge, MatchStoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Empty canonical name on one side of the pair; nothing to score.
    MalformedName,
}

/// A pair the run could not score. Recorded in the report so no pair is ever
/// silently lost; `target_product_id` is `None` when the source product
/// itself was unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPair {
    pub source_product_id: i64,
    pub target_product_id: Option<i64>,
    pub reason: SkipReason,
}

/// Outcome of one `match_all` run: every created edge, plus counts for the
/// pairs that were already present or had to be skipped.
#[derive(Debug, Default)]
pub struct MatchRunReport {
    pub created: Vec<MatchEdge>,
    pub duplicates: usize,
    pub skipped: Vec<SkippedPair>,
}

impl MatchRunReport {
    pub fn created_count(&self) -> usize {
        self.created.len()
    }
}

/// Pairwise reconciliation across the full catalog. One run is a
/// deterministic single pass; concurrency safety at the insert is delegated
/// to the store's uniqueness constraint.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    similarity_threshold: f64,
    max_matches: Option<usize>,
}

impl MatchEngine {
    /// `similarity_threshold` must already be validated to lie in (0, 1]
    /// (config load rejects anything else).
    pub fn new(similarity_threshold: f64, max_matches: Option<usize>) -> Self {
        Self {
            similarity_threshold,
            max_matches,
        }
    }

    /// Rank every other catalog entry against `product`. Deterministic for a
    /// fixed catalog: descending score, ties broken by ascending candidate
    /// id, truncated to `max_matches` when configured. A score exactly at the
    /// threshold is kept.
    pub fn find_candidates(
        &self,
        product: &CatalogProduct,
        catalog: &[CatalogProduct],
    ) -> (Vec<Candidate>, Vec<SkippedPair>) {
        let mut skipped = Vec::new();

        if product.canonical_name.trim().is_empty() {
            warn!(product_id = product.id, "product has no canonical name, skipping");
            skipped.push(SkippedPair {
                source_product_id: product.id,
                target_product_id: None,
                reason: SkipReason::MalformedName,
            });
            return (Vec::new(), skipped);
        }

        let mut candidates = Vec::new();
        for other in catalog {
            if other.id == product.id {
                continue;
            }
            if other.canonical_name.trim().is_empty() {
                warn!(
                    source_product_id = product.id,
                    target_product_id = other.id,
                    "candidate has no canonical name, skipping pair"
                );
                skipped.push(SkippedPair {
                    source_product_id: product.id,
                    target_product_id: Some(other.id),
                    reason: SkipReason::MalformedName,
                });
                continue;
            }

            let score = similarity(&product.canonical_name, &other.canonical_name);
            if score >= self.similarity_threshold {
                candidates.push(Candidate {
                    product_id: other.id,
                    score,
                });
            }
        }

        candidates.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.product_id.cmp(&b.product_id))
        });
        if let Some(cap) = self.max_matches {
            candidates.truncate(cap);
        }

        (candidates, skipped)
    }

    /// Full-catalog scan: for every product, rank candidates and persist the
    /// edges that do not exist yet. O(n²) by design; fine for catalogs in the
    /// low thousands. The catalog is read once up front — rows inserted
    /// mid-run are picked up by the next run.
    pub async fn match_all<S: MatchStore>(&self, store: &S) -> Result<MatchRunReport> {
        let catalog = store.list_all_products().await?;
        info!(products = catalog.len(), "starting match run");

        let mut report = MatchRunReport::default();
        for product in &catalog {
            let (candidates, skipped) = self.find_candidates(product, &catalog);
            report.skipped.extend(skipped);

            for candidate in candidates {
                if store
                    .find_match(product.id, candidate.product_id)
                    .await?
                    .is_some()
                {
                    report.duplicates += 1;
                    continue;
                }

                let edge = NewMatchEdge {
                    source_product_id: product.id,
                    target_product_id: candidate.product_id,
                    similarity_score: candidate.score,
                };
                match store.insert_match(edge).await {
                    Ok(created) => {
                        debug!(
                            source_product_id = created.source_product_id,
                            target_product_id = created.target_product_id,
                            score = created.similarity_score,
                            "created match edge"
                        );
                        report.created.push(created);
                    }
                    Err(MatchStoreError::DuplicateMatch) => {
                        // Lost a race with a concurrent run; the edge exists.
                        report.duplicates += 1;
                    }
                    Err(MatchStoreError::Store(err)) => return Err(err),
                }
            }
        }

        info!(
            created = report.created.len(),
            duplicates = report.duplicates,
            skipped = report.skipped.len(),
            "match run finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct MemoryStore {
        products: Vec<CatalogProduct>,
        edges: Mutex<Vec<MatchEdge>>,
        next_id: Mutex<i64>,
    }

    impl MemoryStore {
        fn new(products: Vec<CatalogProduct>) -> Self {
            Self {
                products,
                edges: Mutex::new(Vec::new()),
                next_id: Mutex::new(1),
            }
        }
    }

    impl MatchStore for MemoryStore {
        async fn list_all_products(&self) -> Result<Vec<CatalogProduct>> {
            Ok(self.products.clone())
        }

        async fn find_match(
            &self,
            source_id: i64,
            target_id: i64,
        ) -> Result<Option<MatchEdge>> {
            Ok(self
                .edges
                .lock()
                .unwrap()
                .iter()
                .find(|e| e.source_product_id == source_id && e.target_product_id == target_id)
                .cloned())
        }

        async fn insert_match(&self, edge: NewMatchEdge) -> Result<MatchEdge, MatchStoreError> {
            let mut edges = self.edges.lock().unwrap();
            if edges.iter().any(|e| {
                e.source_product_id == edge.source_product_id
                    && e.target_product_id == edge.target_product_id
            }) {
                return Err(MatchStoreError::DuplicateMatch);
            }
            let mut next_id = self.next_id.lock().unwrap();
            let created = MatchEdge {
                id: *next_id,
                source_product_id: edge.source_product_id,
                target_product_id: edge.target_product_id,
                similarity_score: edge.similarity_score,
                created_at: Utc::now(),
            };
            *next_id += 1;
            edges.push(created.clone());
            Ok(created)
        }
    }

    fn product(id: i64, canonical_name: &str) -> CatalogProduct {
        CatalogProduct {
            id,
            canonical_name: canonical_name.to_string(),
        }
    }

    #[test]
    fn candidates_are_deterministic() {
        let engine = MatchEngine::new(0.5, None);
        let catalog = vec![
            product(1, "milk 3"),
            product(2, "milk 1"),
            product(3, "milk 3 fresh"),
            product(4, "shampoo"),
        ];

        let (first, _) = engine.find_candidates(&catalog[0], &catalog);
        let (second, _) = engine.find_candidates(&catalog[0], &catalog);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn no_self_match() {
        let engine = MatchEngine::new(0.1, None);
        let catalog = vec![product(1, "milk"), product(2, "milk")];
        let (candidates, _) = engine.find_candidates(&catalog[0], &catalog);
        assert!(candidates.iter().all(|c| c.product_id != 1));
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        // "abcd" vs "abce": one substitution over length 4 -> exactly 0.75.
        let catalog = vec![product(1, "abcd"), product(2, "abce")];

        let at = MatchEngine::new(0.75, None);
        let (candidates, _) = at.find_candidates(&catalog[0], &catalog);
        assert_eq!(candidates.len(), 1);

        let above = MatchEngine::new(0.75 + 1e-9, None);
        let (candidates, _) = above.find_candidates(&catalog[0], &catalog);
        assert!(candidates.is_empty());
    }

    #[test]
    fn ties_break_by_ascending_id() {
        let engine = MatchEngine::new(0.5, None);
        let catalog = vec![
            product(1, "milk 3"),
            product(7, "milk 4"),
            product(2, "milk 5"),
        ];
        let (candidates, _) = engine.find_candidates(&catalog[0], &catalog);
        let ids: Vec<i64> = candidates.iter().map(|c| c.product_id).collect();
        assert_eq!(ids, vec![2, 7]);
    }

    #[test]
    fn max_matches_caps_the_ranking() {
        let engine = MatchEngine::new(0.5, Some(1));
        let catalog = vec![
            product(1, "milk 3"),
            product(2, "milk 3"),
            product(3, "milk 4"),
        ];
        let (candidates, _) = engine.find_candidates(&catalog[0], &catalog);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].product_id, 2);
    }

    #[test]
    fn malformed_name_skips_pair_but_not_run() {
        let engine = MatchEngine::new(0.5, None);
        let catalog = vec![product(1, "milk 3"), product(2, "   "), product(3, "milk 3")];
        let (candidates, skipped) = engine.find_candidates(&catalog[0], &catalog);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].product_id, 3);
        assert_eq!(
            skipped,
            vec![SkippedPair {
                source_product_id: 1,
                target_product_id: Some(2),
                reason: SkipReason::MalformedName,
            }]
        );
    }

    #[tokio::test]
    async fn match_all_creates_edges_in_both_directions() {
        let store = MemoryStore::new(vec![product(1, "milk 3"), product(2, "milk 3")]);
        let engine = MatchEngine::new(0.8, None);

        let report = engine.match_all(&store).await.unwrap();
        assert_eq!(report.created_count(), 2);
        let pairs: Vec<(i64, i64)> = report
            .created
            .iter()
            .map(|e| (e.source_product_id, e.target_product_id))
            .collect();
        assert_eq!(pairs, vec![(1, 2), (2, 1)]);
    }

    #[tokio::test]
    async fn match_all_is_idempotent_on_unchanged_catalog() {
        let store = MemoryStore::new(vec![
            product(1, "milk 3"),
            product(2, "milk 3"),
            product(3, "shampoo"),
        ]);
        let engine = MatchEngine::new(0.8, None);

        let first = engine.match_all(&store).await.unwrap();
        assert_eq!(first.created_count(), 2);

        let second = engine.match_all(&store).await.unwrap();
        assert_eq!(second.created_count(), 0);
        assert_eq!(second.duplicates, 2);
    }

    #[tokio::test]
    async fn match_all_records_scores_numerically() {
        let store = MemoryStore::new(vec![product(1, "milk 3"), product(2, "milk 3 fresh")]);
        let engine = MatchEngine::new(0.5, None);

        let report = engine.match_all(&store).await.unwrap();
        assert!(!report.created.is_empty());
        for edge in &report.created {
            assert!(edge.similarity_score > 0.0 && edge.similarity_score < 1.0);
        }
    }
}
