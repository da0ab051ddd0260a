mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use common::*;
use tessel_rag::{ContextUpdate, RagError, RagResult, TextExtractor};

#[tokio::test]
async fn ingest_requires_a_registered_chatbot() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (engine, _) = open_engine(&temp).await;
    let tenant = new_id();

    let err = engine
        .ingest("owner-1", text_request(&tenant, "FAQ", "Some content."))
        .await
        .expect_err("unregistered tenant must fail");

    assert!(matches!(err, RagError::AccessDenied(_)));
    assert_eq!(count_contexts(&engine, &tenant).await, 0);
}

#[tokio::test]
async fn foreign_principals_are_denied() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (engine, provider) = open_engine(&temp).await;
    let tenant = new_id();
    seed_chatbot(&engine, &tenant, "owner-a").await;

    let err = engine
        .ingest("owner-b", text_request(&tenant, "FAQ", "Some content."))
        .await
        .expect_err("foreign principal must fail");

    assert!(matches!(err, RagError::AccessDenied(_)));
    // Denied before any chunking or embedding work.
    assert_eq!(
        provider
            .batch_calls
            .load(std::sync::atomic::Ordering::SeqCst),
        0
    );
    assert_eq!(count_contexts(&engine, &tenant).await, 0);
}

#[derive(Default)]
struct RecordingExtractor {
    calls: AtomicUsize,
}

impl TextExtractor for RecordingExtractor {
    fn extract(&self, bytes: &[u8], _file_name: &str, _mime_type: &str) -> RagResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

#[tokio::test]
async fn file_ingest_is_denied_before_extraction_runs() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (engine, _) = open_engine(&temp).await;
    let tenant = new_id();
    // No chatbot registered for this tenant.

    let extractor = RecordingExtractor::default();
    let err = engine
        .ingest_file(
            "owner-1",
            &tenant,
            "Upload",
            b"some file body",
            "notes.txt",
            "text/plain",
            &extractor,
        )
        .await
        .expect_err("unregistered tenant must fail");

    assert!(matches!(err, RagError::AccessDenied(_)));
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    assert_eq!(count_contexts(&engine, &tenant).await, 0);
}

#[tokio::test]
async fn malformed_tenant_ids_fail_fast() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (engine, _) = open_engine(&temp).await;

    let err = engine
        .ingest(
            "owner-1",
            text_request("tenant'; DROP TABLE contexts;--", "FAQ", "Some content."),
        )
        .await
        .expect_err("malformed tenant id must fail");

    assert!(matches!(err, RagError::InvalidId(_)));
}

#[tokio::test]
async fn cross_tenant_context_ids_read_as_missing() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (engine, _) = open_engine(&temp).await;
    let tenant_a = new_id();
    let tenant_b = new_id();
    seed_chatbot(&engine, &tenant_a, "owner-a").await;
    seed_chatbot(&engine, &tenant_b, "owner-b").await;

    let outcome = engine
        .ingest("owner-a", text_request(&tenant_a, "Secret", "Tenant A's knowledge."))
        .await
        .expect("ingest");

    // owner-b legitimately owns tenant B but guesses tenant A's context id.
    let update_err = engine
        .update_context(
            "owner-b",
            &tenant_b,
            &outcome.context_id,
            ContextUpdate {
                title: Some("hijacked".to_string()),
                content: None,
            },
        )
        .await
        .expect_err("cross-tenant update must fail");
    assert!(matches!(update_err, RagError::NotFound(_)));

    let delete_err = engine
        .delete_context("owner-b", &tenant_b, &outcome.context_id)
        .await
        .expect_err("cross-tenant delete must fail");
    assert!(matches!(delete_err, RagError::NotFound(_)));

    // Tenant A's data is untouched.
    assert_eq!(count_embeddings(&engine, &tenant_a).await, 1);
    let context = tessel_rag::storage::fetch_context(engine.pool(), &tenant_a, &outcome.context_id)
        .await
        .expect("fetch")
        .expect("context exists");
    assert_eq!(context.title, "Secret");
}

#[tokio::test]
async fn malformed_context_ids_are_rejected_before_lookup() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (engine, _) = open_engine(&temp).await;
    let tenant = new_id();
    seed_chatbot(&engine, &tenant, "owner-1").await;

    let err = engine
        .delete_context("owner-1", &tenant, "../../etc/passwd")
        .await
        .expect_err("malformed context id must fail");
    assert!(matches!(err, RagError::InvalidId(_)));
}
