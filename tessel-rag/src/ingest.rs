//! Ingestion pipeline: validate, persist the context, chunk, embed,
//! deduplicate, persist surviving embeddings, backfill the context.
//!
//! The context row is created before chunking so every derived embedding
//! can be stamped with its final context id. The one rollback case is "all
//! chunks were duplicates": such a context must not survive with zero
//! embeddings. A crash between context creation and the final backfill can
//! leave an orphan; an external reconciliation sweep is expected to repair
//! those.

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use tessel_core::config::RagSettings;

use crate::chunker::{chunk, chunk_by_delimiter};
use crate::dedup::is_duplicate;
use crate::engine::ContextEngine;
use crate::errors::{RagError, RagResult};
use crate::models::{
    ContextMetadata, ContextRecord, ContextUpdate, IngestOutcome, IngestRequest, NewEmbedding,
};
use crate::storage::{
    delete_context_row, delete_embeddings_for_context, fetch_context, find_context_by_url,
    insert_context, insert_embedding, set_context_embedding_ids, update_context_content,
    update_context_title,
};

pub(crate) async fn ingest(
    engine: &ContextEngine,
    request: IngestRequest,
) -> RagResult<IngestOutcome> {
    let pool = engine.pool();
    let settings = engine.settings();

    if request.content.trim().is_empty() {
        return Err(RagError::EmptyContent);
    }

    if let ContextMetadata::Link { url } = &request.metadata {
        Url::parse(url)?;
        if find_context_by_url(pool, &request.tenant_id, url)
            .await?
            .is_some()
        {
            return Err(RagError::DuplicateSource {
                tenant_id: request.tenant_id.clone(),
                url: url.clone(),
            });
        }
    }

    validate_request(&request)?;

    // Created before chunking so embeddings can carry the final context id.
    let now = Utc::now().to_rfc3339();
    let context = ContextRecord {
        id: Uuid::new_v4().to_string(),
        tenant_id: request.tenant_id.clone(),
        content_type: request.metadata.content_type(),
        title: request.title.clone(),
        raw_content: request.content.clone(),
        metadata: request.metadata.clone(),
        embedding_ids: Vec::new(),
        content_hash: content_hash(&request.content),
        created_at: now.clone(),
        updated_at: now,
    };
    insert_context(pool, &context).await?;

    let chunks = split_content(
        &request.content,
        request.record_delimiter.as_deref(),
        settings,
    );
    if chunks.is_empty() {
        delete_context_row(pool, &context.id).await?;
        return Err(RagError::EmptyContent);
    }

    // One batched provider round-trip for the whole document.
    let vectors = engine.provider().embed_batch(&chunks).await?;
    if vectors.len() != chunks.len() {
        return Err(RagError::EmbeddingProvider(format!(
            "provider returned {} vectors for {} chunks",
            vectors.len(),
            chunks.len()
        )));
    }

    let (embedding_ids, skipped) = store_chunks(engine, &context, &chunks, &vectors, true).await?;

    if embedding_ids.is_empty() && skipped > 0 {
        // Every chunk was already represented for this tenant.
        delete_context_row(pool, &context.id).await?;
        return Err(RagError::AllContentDuplicate {
            tenant_id: context.tenant_id,
            skipped,
        });
    }

    set_context_embedding_ids(pool, &context.id, &embedding_ids).await?;

    info!(
        tenant_id = %context.tenant_id,
        context_id = %context.id,
        created = embedding_ids.len(),
        skipped,
        "context ingested"
    );

    Ok(IngestOutcome {
        context_id: context.id,
        embeddings_created: embedding_ids.len(),
        embeddings_skipped: skipped,
    })
}

pub(crate) async fn update_context(
    engine: &ContextEngine,
    tenant_id: &str,
    context_id: &str,
    update: ContextUpdate,
) -> RagResult<IngestOutcome> {
    let pool = engine.pool();
    let settings = engine.settings();

    let context = fetch_context(pool, tenant_id, context_id)
        .await?
        .ok_or_else(|| RagError::NotFound(format!("context {context_id}")))?;

    let title = update.title.unwrap_or_else(|| context.title.clone());

    let new_content = match update.content {
        Some(content) if content_hash(&content) != context.content_hash => content,
        _ => {
            // Content unchanged: a title edit needs no re-embedding.
            if title != context.title {
                update_context_title(pool, context_id, &title).await?;
            }
            return Ok(IngestOutcome {
                context_id: context.id,
                embeddings_created: 0,
                embeddings_skipped: 0,
            });
        }
    };

    if new_content.trim().is_empty() {
        return Err(RagError::EmptyContent);
    }

    let chunks = split_content(&new_content, None, settings);
    if chunks.is_empty() {
        return Err(RagError::EmptyContent);
    }

    // Embed before touching the stored rows so a provider failure leaves
    // the old embeddings intact.
    let vectors = engine.provider().embed_batch(&chunks).await?;
    if vectors.len() != chunks.len() {
        return Err(RagError::EmbeddingProvider(format!(
            "provider returned {} vectors for {} chunks",
            vectors.len(),
            chunks.len()
        )));
    }

    delete_embeddings_for_context(pool, context_id).await?;

    // Re-embedding on edit is unconditional; the document's old chunks were
    // just deleted, so the dedup gate is skipped entirely.
    let mut refreshed = context.clone();
    refreshed.title = title.clone();
    refreshed.raw_content = new_content.clone();
    let (embedding_ids, _) = store_chunks(engine, &refreshed, &chunks, &vectors, false).await?;

    update_context_content(pool, context_id, &title, &new_content, &content_hash(&new_content))
        .await?;
    set_context_embedding_ids(pool, context_id, &embedding_ids).await?;

    info!(
        tenant_id,
        context_id,
        created = embedding_ids.len(),
        "context re-embedded"
    );

    Ok(IngestOutcome {
        context_id: context.id,
        embeddings_created: embedding_ids.len(),
        embeddings_skipped: 0,
    })
}

pub(crate) async fn delete_context(
    engine: &ContextEngine,
    tenant_id: &str,
    context_id: &str,
) -> RagResult<()> {
    let pool = engine.pool();

    let context = fetch_context(pool, tenant_id, context_id)
        .await?
        .ok_or_else(|| RagError::NotFound(format!("context {context_id}")))?;

    delete_embeddings_for_context(pool, &context.id).await?;
    delete_context_row(pool, &context.id).await?;

    info!(tenant_id, context_id, "context deleted");
    Ok(())
}

/// Persist (chunk, vector) pairs in order. Sequential on purpose: each
/// dedup check must see the embeddings written by earlier chunks of this
/// same call, or two similar chunks could both pass the gate.
async fn store_chunks(
    engine: &ContextEngine,
    context: &ContextRecord,
    chunks: &[String],
    vectors: &[Vec<f32>],
    dedupe: bool,
) -> RagResult<(Vec<i64>, usize)> {
    let pool = engine.pool();
    let threshold = engine.settings().dedup_threshold;
    let total_chunks = chunks.len() as i64;
    let source_tag = context.metadata.source_tag();

    let mut embedding_ids = Vec::new();
    let mut skipped = 0usize;

    for (index, (content, vector)) in chunks.iter().zip(vectors.iter()).enumerate() {
        if dedupe && is_duplicate(pool, &context.tenant_id, vector, threshold).await {
            skipped += 1;
            debug!(
                tenant_id = %context.tenant_id,
                context_id = %context.id,
                chunk_index = index,
                "skipping duplicate chunk"
            );
            continue;
        }

        let record = NewEmbedding {
            tenant_id: context.tenant_id.clone(),
            context_id: context.id.clone(),
            content: content.clone(),
            chunk_index: index as i64,
            total_chunks,
            source_tag: source_tag.clone(),
        };
        embedding_ids.push(insert_embedding(pool, &record, vector).await?);
    }

    Ok((embedding_ids, skipped))
}

fn split_content(content: &str, delimiter: Option<&str>, settings: &RagSettings) -> Vec<String> {
    match delimiter {
        Some(delim) => chunk_by_delimiter(content, delim, settings.chunk_max_chars),
        None => chunk(content, settings.chunk_max_chars, settings.chunk_overlap),
    }
}

fn validate_request(request: &IngestRequest) -> RagResult<()> {
    if request.tenant_id.trim().is_empty() {
        return Err(RagError::Validation("tenant id is required".to_string()));
    }
    if request.title.trim().is_empty() {
        return Err(RagError::Validation("title is required".to_string()));
    }
    match &request.metadata {
        ContextMetadata::File { file_name, .. } if file_name.trim().is_empty() => Err(
            RagError::Validation("file metadata requires a file name".to_string()),
        ),
        ContextMetadata::Question { question, .. } if question.trim().is_empty() => Err(
            RagError::Validation("question metadata requires a question".to_string()),
        ),
        _ => Ok(()),
    }
}

fn content_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
