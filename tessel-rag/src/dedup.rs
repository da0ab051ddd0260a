//! Semantic deduplication gate.
//!
//! A candidate vector is a duplicate when any vector already stored for the
//! tenant scores at or above the threshold. The scan is global across all
//! of the tenant's contexts, not per-document, so overlapping uploads (two
//! PDFs sharing boilerplate) dedup against each other.
//!
//! O(corpus) per candidate; fine at per-tenant scale (hundreds to low
//! thousands of chunks), not meant for more without an ANN index.

use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::similarity::cosine_similarity;
use crate::storage::load_tenant_vectors;

/// Whether `candidate` is already represented in the tenant's store.
///
/// Fails open: a storage read error logs a warning and reports "not a
/// duplicate", so a lost read never blocks legitimate content from being
/// saved.
pub async fn is_duplicate(
    pool: &SqlitePool,
    tenant_id: &str,
    candidate: &[f32],
    threshold: f32,
) -> bool {
    let stored = match load_tenant_vectors(pool, tenant_id).await {
        Ok(vectors) => vectors,
        Err(err) => {
            warn!(tenant_id, error = %err, "dedup read failed, treating candidate as novel");
            return false;
        }
    };

    for (embedding_id, vector) in &stored {
        match cosine_similarity(candidate, vector) {
            Ok(score) if score >= threshold => {
                debug!(tenant_id, embedding_id, score, threshold, "duplicate chunk");
                return true;
            }
            Ok(_) => {}
            Err(err) => {
                warn!(tenant_id, embedding_id, error = %err, "skipping malformed stored vector");
            }
        }
    }

    false
}
