//! SQLite persistence for contexts, embeddings, and ownership records.
//!
//! Vectors live in a sqlite-vec `vec0` virtual table whose rowids mirror
//! the `embeddings` rowids, so embedding row and vector row are always
//! written and deleted in lockstep.

use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::Utc;
use libsqlite3_sys::{SQLITE_OK, sqlite3, sqlite3_api_routines, sqlite3_auto_extension};
use sqlite_vec::sqlite3_vec_init;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::errors::{RagError, RagResult};
use crate::models::{ChatbotRecord, ContentType, ContextMetadata, ContextRecord, EmbeddingRecord, NewEmbedding};

static SQLITE_VEC_INIT_RC: OnceLock<i32> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
}

impl DocumentStore {
    /// Open (or create) the store and verify the vector index matches
    /// `embedding_dim`. A dimensionality mismatch is fatal here, at startup,
    /// so it can never silently poison search or dedup comparisons.
    pub async fn open(db_path: &Path, embedding_dim: usize) -> RagResult<Self> {
        init_sqlite_vec_once()?;
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA journal_mode = WAL")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA synchronous = NORMAL")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        ensure_vec_table(&pool, embedding_dim).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn init_sqlite_vec_once() -> RagResult<()> {
    let rc = *SQLITE_VEC_INIT_RC.get_or_init(|| unsafe {
        type SqliteVecInitFn =
            unsafe extern "C" fn(*mut sqlite3, *mut *const i8, *const sqlite3_api_routines) -> i32;

        sqlite3_auto_extension(Some(std::mem::transmute::<*const (), SqliteVecInitFn>(
            sqlite3_vec_init as *const (),
        )))
    });

    if rc == SQLITE_OK {
        Ok(())
    } else {
        Err(RagError::SqliteVec(format!(
            "sqlite-vec init failed with code {rc}"
        )))
    }
}

async fn ensure_vec_table(pool: &SqlitePool, embedding_dim: usize) -> RagResult<()> {
    let existing: Option<(String,)> =
        sqlx::query_as("SELECT value FROM meta WHERE key = 'embedding_dim' LIMIT 1")
            .fetch_optional(pool)
            .await?;

    if let Some((value,)) = existing
        && let Ok(stored) = value.parse::<usize>()
        && stored != embedding_dim
    {
        return Err(RagError::DimensionMismatch {
            expected: stored,
            actual: embedding_dim,
        });
    }

    let table_exists: Option<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'context_vec'",
    )
    .fetch_optional(pool)
    .await?;

    if table_exists.is_none() {
        // tenant_id is a partition key: the KNN scan for one tenant never
        // visits another tenant's vectors.
        let create_sql = format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS context_vec USING vec0(tenant_id text partition key, embedding float[{}] distance_metric=cosine)",
            embedding_dim
        );
        sqlx::query(&create_sql).execute(pool).await?;
    }

    sqlx::query("INSERT OR REPLACE INTO meta (key, value) VALUES ('embedding_dim', ?)")
        .bind(embedding_dim.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

// --- chatbots -------------------------------------------------------------

pub async fn upsert_chatbot(pool: &SqlitePool, record: &ChatbotRecord) -> RagResult<()> {
    sqlx::query(
        r#"INSERT INTO chatbots (id, owner_id, name, created_at) VALUES (?, ?, ?, ?)
           ON CONFLICT(id) DO UPDATE SET owner_id=excluded.owner_id, name=excluded.name"#,
    )
    .bind(&record.id)
    .bind(&record.owner_id)
    .bind(&record.name)
    .bind(&record.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn fetch_chatbot(pool: &SqlitePool, id: &str) -> RagResult<Option<ChatbotRecord>> {
    let row: Option<(String, String, String, String)> =
        sqlx::query_as("SELECT id, owner_id, name, created_at FROM chatbots WHERE id = ? LIMIT 1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|(id, owner_id, name, created_at)| ChatbotRecord {
        id,
        owner_id,
        name,
        created_at,
    }))
}

// --- contexts -------------------------------------------------------------

pub async fn insert_context(pool: &SqlitePool, record: &ContextRecord) -> RagResult<()> {
    let metadata_json = serde_json::to_string(&record.metadata)
        .map_err(|e| RagError::Validation(format!("metadata serialize failed: {e}")))?;
    let embedding_ids_json = serde_json::to_string(&record.embedding_ids)
        .map_err(|e| RagError::Validation(format!("embedding ids serialize failed: {e}")))?;

    sqlx::query(
        r#"INSERT INTO contexts (
            id, tenant_id, content_type, title, raw_content, metadata_json,
            embedding_ids_json, source_url, content_hash, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&record.id)
    .bind(&record.tenant_id)
    .bind(record.content_type.as_str())
    .bind(&record.title)
    .bind(&record.raw_content)
    .bind(metadata_json)
    .bind(embedding_ids_json)
    .bind(record.metadata.source_url())
    .bind(&record.content_hash)
    .bind(&record.created_at)
    .bind(&record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

type ContextRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
);

fn context_from_row(row: ContextRow) -> RagResult<ContextRecord> {
    let (
        id,
        tenant_id,
        content_type,
        title,
        raw_content,
        metadata_json,
        embedding_ids_json,
        content_hash,
        created_at,
        updated_at,
    ) = row;

    let metadata: ContextMetadata = serde_json::from_str(&metadata_json)
        .map_err(|e| RagError::Validation(format!("corrupt metadata for context {id}: {e}")))?;
    let embedding_ids: Vec<i64> = serde_json::from_str(&embedding_ids_json)
        .map_err(|e| RagError::Validation(format!("corrupt embedding ids for context {id}: {e}")))?;
    let content_type = ContentType::from_str(&content_type)
        .map_err(|_| RagError::Validation(format!("unknown content type for context {id}")))?;

    Ok(ContextRecord {
        id,
        tenant_id,
        content_type,
        title,
        raw_content,
        metadata,
        embedding_ids,
        content_hash,
        created_at,
        updated_at,
    })
}

const CONTEXT_COLUMNS: &str = "id, tenant_id, content_type, title, raw_content, metadata_json, \
     embedding_ids_json, content_hash, created_at, updated_at";

/// Tenant-scoped fetch; a context belonging to another tenant is invisible.
pub async fn fetch_context(
    pool: &SqlitePool,
    tenant_id: &str,
    context_id: &str,
) -> RagResult<Option<ContextRecord>> {
    let sql = format!("SELECT {CONTEXT_COLUMNS} FROM contexts WHERE id = ? AND tenant_id = ? LIMIT 1");
    let row: Option<ContextRow> = sqlx::query_as(&sql)
        .bind(context_id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?;

    row.map(context_from_row).transpose()
}

pub async fn context_tenant(pool: &SqlitePool, context_id: &str) -> RagResult<Option<String>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT tenant_id FROM contexts WHERE id = ? LIMIT 1")
            .bind(context_id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(tenant_id,)| tenant_id))
}

pub async fn find_context_by_url(
    pool: &SqlitePool,
    tenant_id: &str,
    url: &str,
) -> RagResult<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT id FROM contexts WHERE tenant_id = ? AND source_url = ? LIMIT 1",
    )
    .bind(tenant_id)
    .bind(url)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(id,)| id))
}

pub async fn set_context_embedding_ids(
    pool: &SqlitePool,
    context_id: &str,
    embedding_ids: &[i64],
) -> RagResult<()> {
    let json = serde_json::to_string(embedding_ids)
        .map_err(|e| RagError::Validation(format!("embedding ids serialize failed: {e}")))?;
    sqlx::query("UPDATE contexts SET embedding_ids_json = ?, updated_at = ? WHERE id = ?")
        .bind(json)
        .bind(Utc::now().to_rfc3339())
        .bind(context_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_context_title(
    pool: &SqlitePool,
    context_id: &str,
    title: &str,
) -> RagResult<()> {
    sqlx::query("UPDATE contexts SET title = ?, updated_at = ? WHERE id = ?")
        .bind(title)
        .bind(Utc::now().to_rfc3339())
        .bind(context_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_context_content(
    pool: &SqlitePool,
    context_id: &str,
    title: &str,
    raw_content: &str,
    content_hash: &str,
) -> RagResult<()> {
    sqlx::query(
        "UPDATE contexts SET title = ?, raw_content = ?, content_hash = ?, updated_at = ? WHERE id = ?",
    )
    .bind(title)
    .bind(raw_content)
    .bind(content_hash)
    .bind(Utc::now().to_rfc3339())
    .bind(context_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_context_row(pool: &SqlitePool, context_id: &str) -> RagResult<()> {
    sqlx::query("DELETE FROM contexts WHERE id = ?")
        .bind(context_id)
        .execute(pool)
        .await?;
    Ok(())
}

// --- embeddings -----------------------------------------------------------

/// Insert the embedding row and its vector in lockstep; the vec0 row reuses
/// the embedding rowid.
pub async fn insert_embedding(
    pool: &SqlitePool,
    record: &NewEmbedding,
    vector: &[f32],
) -> RagResult<i64> {
    let result = sqlx::query(
        r#"INSERT INTO embeddings (tenant_id, context_id, content, chunk_index, total_chunks, source_tag, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&record.tenant_id)
    .bind(&record.context_id)
    .bind(&record.content)
    .bind(record.chunk_index)
    .bind(record.total_chunks)
    .bind(&record.source_tag)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    let embedding_id = result.last_insert_rowid();

    let payload = serde_json::to_string(vector)
        .map_err(|e| RagError::EmbeddingProvider(format!("vector serialize failed: {e}")))?;
    sqlx::query("INSERT OR REPLACE INTO context_vec(rowid, tenant_id, embedding) VALUES (?, ?, ?)")
        .bind(embedding_id)
        .bind(&record.tenant_id)
        .bind(payload)
        .execute(pool)
        .await?;

    Ok(embedding_id)
}

/// Every stored vector for a tenant, across all of its contexts. This is the
/// dedup gate's read path.
pub async fn load_tenant_vectors(
    pool: &SqlitePool,
    tenant_id: &str,
) -> RagResult<Vec<(i64, Vec<f32>)>> {
    let rows: Vec<(i64, Vec<u8>)> = sqlx::query_as(
        r#"SELECT e.id, v.embedding
           FROM embeddings e
           JOIN context_vec v ON v.rowid = e.id
           WHERE e.tenant_id = ?"#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, blob)| (id, decode_vector(&blob)))
        .collect())
}

pub async fn list_embeddings_for_context(
    pool: &SqlitePool,
    context_id: &str,
) -> RagResult<Vec<EmbeddingRecord>> {
    let rows: Vec<(i64, String, String, String, i64, i64, String, String)> = sqlx::query_as(
        r#"SELECT id, tenant_id, context_id, content, chunk_index, total_chunks, source_tag, created_at
           FROM embeddings WHERE context_id = ? ORDER BY chunk_index ASC"#,
    )
    .bind(context_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(id, tenant_id, context_id, content, chunk_index, total_chunks, source_tag, created_at)| {
                EmbeddingRecord {
                    id,
                    tenant_id,
                    context_id,
                    content,
                    chunk_index,
                    total_chunks,
                    source_tag,
                    created_at,
                }
            },
        )
        .collect())
}

pub async fn count_embeddings_for_tenant(pool: &SqlitePool, tenant_id: &str) -> RagResult<i64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM embeddings WHERE tenant_id = ?")
            .bind(tenant_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Delete all embeddings of a context: vector rows first, then the rows.
pub async fn delete_embeddings_for_context(
    pool: &SqlitePool,
    context_id: &str,
) -> RagResult<()> {
    let existing_ids: Vec<(i64,)> =
        sqlx::query_as("SELECT id FROM embeddings WHERE context_id = ?")
            .bind(context_id)
            .fetch_all(pool)
            .await?;

    if !existing_ids.is_empty() {
        let placeholders = existing_ids
            .iter()
            .map(|_| "?")
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("DELETE FROM context_vec WHERE rowid IN ({})", placeholders);
        let mut query = sqlx::query(&sql);
        for (embedding_id,) in &existing_ids {
            query = query.bind(embedding_id);
        }
        query.execute(pool).await?;
    }

    sqlx::query("DELETE FROM embeddings WHERE context_id = ?")
        .bind(context_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Vectors come back from vec0 as little-endian f32 blobs.
fn decode_vector(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .collect()
}
