#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use tessel_rag::{
    ContextEngine, ContextMetadata, EmbeddingProvider, IngestRequest, RagResult, RagSettings,
};
use uuid::Uuid;

pub const DIM: usize = 16;

/// Deterministic embedder: each distinct input string gets its own one-hot
/// basis vector, so identical texts score 1.0 against each other and
/// distinct texts score 0.0. Supports up to DIM distinct strings per test.
pub struct MockEmbedder {
    slots: Mutex<HashMap<String, usize>>,
    pub batch_calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            batch_calls: AtomicUsize::new(0),
        }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut slots = self.slots.lock().expect("mock embedder lock");
        let next = slots.len();
        let slot = *slots.entry(text.to_string()).or_insert(next);
        assert!(slot < DIM, "test used more than {DIM} distinct strings");
        let mut vector = vec![0.0f32; DIM];
        vector[slot] = 1.0;
        vector
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockEmbedder {
    fn dimension(&self) -> usize {
        DIM
    }

    async fn embed(&self, text: &str) -> RagResult<Vec<f32>> {
        Ok(self.vector_for(text))
    }

    async fn embed_batch(&self, inputs: &[String]) -> RagResult<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(inputs.iter().map(|text| self.vector_for(text)).collect())
    }
}

pub async fn open_engine(temp: &TempDir) -> (ContextEngine, Arc<MockEmbedder>) {
    let settings = RagSettings {
        db_path_override: Some(temp.path().join("tessel.sqlite3")),
        ..RagSettings::default()
    };
    let provider = Arc::new(MockEmbedder::new());
    let engine = ContextEngine::open(settings, provider.clone())
        .await
        .expect("open engine");
    (engine, provider)
}

pub async fn seed_chatbot(engine: &ContextEngine, tenant_id: &str, owner_id: &str) {
    engine
        .register_chatbot(tenant_id, owner_id, "Test bot")
        .await
        .expect("register chatbot");
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn text_request(tenant_id: &str, title: &str, content: &str) -> IngestRequest {
    IngestRequest {
        tenant_id: tenant_id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        metadata: ContextMetadata::Text,
        record_delimiter: None,
    }
}

pub fn link_request(tenant_id: &str, title: &str, content: &str, url: &str) -> IngestRequest {
    IngestRequest {
        tenant_id: tenant_id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        metadata: ContextMetadata::Link {
            url: url.to_string(),
        },
        record_delimiter: None,
    }
}

pub async fn count_contexts(engine: &ContextEngine, tenant_id: &str) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contexts WHERE tenant_id = ?")
        .bind(tenant_id)
        .fetch_one(engine.pool())
        .await
        .expect("count contexts");
    count
}

pub async fn count_embeddings(engine: &ContextEngine, tenant_id: &str) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM embeddings WHERE tenant_id = ?")
        .bind(tenant_id)
        .fetch_one(engine.pool())
        .await
        .expect("count embeddings");
    count
}
