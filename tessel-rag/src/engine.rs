//! Public facade of the context engine.
//!
//! Stateless between calls and safe to share across tasks: concurrent
//! ingestions and queries for different tenants never contend. Two
//! concurrent ingestions for the *same* tenant can each miss the other's
//! in-flight writes in their dedup checks; callers needing exactly-once
//! semantics must serialize at a higher layer.

use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use tessel_core::config::RagSettings;

use crate::crawl;
use crate::embeddings::EmbeddingProvider;
use crate::errors::{RagError, RagResult};
use crate::extract::TextExtractor;
use crate::guard;
use crate::ingest;
use crate::models::{
    ChatbotRecord, ContextMetadata, ContextUpdate, IngestOutcome, IngestRequest, SearchHit,
};
use crate::search;
use crate::storage::{DocumentStore, upsert_chatbot};

#[derive(Clone)]
pub struct ContextEngine {
    settings: RagSettings,
    provider: Arc<dyn EmbeddingProvider>,
    store: DocumentStore,
}

impl ContextEngine {
    /// Open the engine over a persistent store. The store's vector index
    /// dimensionality is checked against the provider's here, once — a
    /// mismatch would otherwise make every comparison silently meaningless.
    pub async fn open(
        settings: RagSettings,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> RagResult<Self> {
        let path = settings.db_path().ok_or(RagError::MissingDataDir)?;
        let store = DocumentStore::open(&path, provider.dimension()).await?;
        Ok(Self {
            settings,
            provider,
            store,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        self.store.pool()
    }

    pub fn settings(&self) -> &RagSettings {
        &self.settings
    }

    pub(crate) fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    /// Register (or update) the ownership record for a tenant's chatbot.
    /// Called by the host application when a chatbot is created.
    pub async fn register_chatbot(&self, tenant_id: &str, owner_id: &str, name: &str) -> RagResult<()> {
        guard::validate_id_format(tenant_id)?;
        let record = ChatbotRecord {
            id: tenant_id.to_string(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        upsert_chatbot(self.pool(), &record).await
    }

    /// Ingest a knowledge item for a tenant.
    pub async fn ingest(
        &self,
        principal_id: &str,
        request: IngestRequest,
    ) -> RagResult<IngestOutcome> {
        guard::validate_id_format(&request.tenant_id)?;
        guard::validate_ownership(self.pool(), &request.tenant_id, principal_id).await?;
        ingest::ingest(self, request).await
    }

    /// Ingest an uploaded file by extracting its text first.
    #[allow(clippy::too_many_arguments)]
    pub async fn ingest_file(
        &self,
        principal_id: &str,
        tenant_id: &str,
        title: &str,
        bytes: &[u8],
        file_name: &str,
        mime_type: &str,
        extractor: &dyn TextExtractor,
    ) -> RagResult<IngestOutcome> {
        guard::validate_id_format(tenant_id)?;
        guard::validate_ownership(self.pool(), tenant_id, principal_id).await?;

        let content = extractor.extract(bytes, file_name, mime_type)?;
        let request = IngestRequest {
            tenant_id: tenant_id.to_string(),
            title: title.to_string(),
            content,
            metadata: ContextMetadata::File {
                file_name: file_name.to_string(),
                mime_type: mime_type.to_string(),
                size_bytes: bytes.len() as u64,
            },
            record_delimiter: None,
        };
        ingest::ingest(self, request).await
    }

    /// Fetch a web page and ingest its text as a LINK context.
    pub async fn ingest_link(
        &self,
        principal_id: &str,
        tenant_id: &str,
        url: &str,
    ) -> RagResult<IngestOutcome> {
        guard::validate_id_format(tenant_id)?;
        guard::validate_ownership(self.pool(), tenant_id, principal_id).await?;

        let page = crawl::fetch_page(url).await?;
        let request = IngestRequest {
            tenant_id: tenant_id.to_string(),
            title: page.title,
            content: page.text,
            metadata: ContextMetadata::Link {
                url: url.to_string(),
            },
            record_delimiter: None,
        };
        ingest::ingest(self, request).await
    }

    /// Edit a context. Title-only edits skip re-embedding; content edits
    /// delete the old embeddings and re-embed the new content.
    pub async fn update_context(
        &self,
        principal_id: &str,
        tenant_id: &str,
        context_id: &str,
        update: ContextUpdate,
    ) -> RagResult<IngestOutcome> {
        guard::validate_id_format(tenant_id)?;
        guard::validate_id_format(context_id)?;
        guard::validate_ownership(self.pool(), tenant_id, principal_id).await?;
        guard::validate_context_tenant(self.pool(), tenant_id, context_id).await?;
        ingest::update_context(self, tenant_id, context_id, update).await
    }

    /// Delete a context and all of its embeddings.
    pub async fn delete_context(
        &self,
        principal_id: &str,
        tenant_id: &str,
        context_id: &str,
    ) -> RagResult<()> {
        guard::validate_id_format(tenant_id)?;
        guard::validate_id_format(context_id)?;
        guard::validate_ownership(self.pool(), tenant_id, principal_id).await?;
        guard::validate_context_tenant(self.pool(), tenant_id, context_id).await?;
        ingest::delete_context(self, tenant_id, context_id).await
    }

    /// Top-K similarity search over one tenant's embeddings. Read-only; no
    /// principal required, only the id-format check.
    pub async fn search(
        &self,
        tenant_id: &str,
        query: &str,
        top_k: Option<usize>,
    ) -> RagResult<Vec<SearchHit>> {
        search::search(self, tenant_id, query, top_k).await
    }
}
