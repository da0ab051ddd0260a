//! Tenant-scoped similarity search.
//!
//! One KNN query against the vec0 index. The tenant filter lives inside the
//! MATCH scan itself (tenant_id is a partition key on the vector table), so
//! the candidate set is drawn from the tenant's own vectors and can never be
//! crowded out by a hotter neighborhood in another tenant's corpus. The scan
//! is over-fetched (`top_k * candidate_multiplier`, multiplier floored at 4)
//! for accurate top-K recall, then results are truncated after scoring.

use tracing::debug;

use crate::engine::ContextEngine;
use crate::errors::{RagError, RagResult};
use crate::guard::validate_id_format;
use crate::models::SearchHit;

type HitRow = (i64, String, String, String, String, i64, f32, String);

pub(crate) async fn search(
    engine: &ContextEngine,
    tenant_id: &str,
    query: &str,
    top_k: Option<usize>,
) -> RagResult<Vec<SearchHit>> {
    validate_id_format(tenant_id)?;

    if query.trim().is_empty() {
        return Err(RagError::Validation("query is empty".to_string()));
    }

    let settings = engine.settings();
    let top_k = top_k.unwrap_or(settings.search.top_k).max(1);
    let num_candidates = top_k * settings.search.candidate_multiplier.max(4);

    let query_vector = engine.provider().embed(query).await?;
    let payload = serde_json::to_string(&query_vector)
        .map_err(|e| RagError::EmbeddingProvider(format!("query vector serialize failed: {e}")))?;

    // The tenant constraint sits inside the KNN scan so over-fetch happens
    // within the tenant's partition; the outer e.tenant_id conjunct is an
    // independent second check. distance ASC is score DESC; ties break on
    // rowid, i.e. insertion order.
    let rows: Vec<HitRow> = sqlx::query_as(
        r#"SELECT e.id, e.context_id, e.tenant_id, e.content, e.source_tag, e.chunk_index,
                  v.distance, c.title
           FROM (SELECT rowid, distance FROM context_vec
                 WHERE embedding MATCH ? AND tenant_id = ? AND k = ?) v
           JOIN embeddings e ON e.id = v.rowid
           JOIN contexts c ON c.id = e.context_id
           WHERE e.tenant_id = ?
           ORDER BY v.distance ASC, e.id ASC
           LIMIT ?"#,
    )
    .bind(payload)
    .bind(tenant_id)
    .bind(num_candidates as i64)
    .bind(tenant_id)
    .bind(top_k as i64)
    .fetch_all(engine.pool())
    .await
    .map_err(|e| RagError::SearchUnavailable(e.to_string()))?;

    debug!(
        tenant_id,
        candidates = rows.len(),
        top_k,
        "vector search complete"
    );

    let hits: Vec<SearchHit> = rows
        .into_iter()
        .map(
            |(embedding_id, context_id, tenant_id, content, source_tag, chunk_index, distance, title)| {
                SearchHit {
                    embedding_id,
                    context_id,
                    tenant_id,
                    title,
                    content,
                    source_tag,
                    chunk_index,
                    // Cosine distance from vec0; similarity = 1 - distance.
                    score: 1.0 - distance,
                }
            },
        )
        .collect();

    Ok(hits)
}
