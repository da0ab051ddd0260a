mod common;

use std::sync::atomic::Ordering;

use common::*;
use tessel_rag::{ContextUpdate, RagError};

#[tokio::test]
async fn deleting_a_context_removes_only_its_embeddings() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (engine, _) = open_engine(&temp).await;
    let tenant = new_id();
    seed_chatbot(&engine, &tenant, "owner-1").await;

    let kept = engine
        .ingest("owner-1", text_request(&tenant, "Kept", "Alpha content stays."))
        .await
        .expect("ingest kept");
    let doomed = engine
        .ingest("owner-1", text_request(&tenant, "Doomed", "Beta content goes."))
        .await
        .expect("ingest doomed");

    engine
        .delete_context("owner-1", &tenant, &doomed.context_id)
        .await
        .expect("delete");

    assert_eq!(count_contexts(&engine, &tenant).await, 1);
    assert_eq!(count_embeddings(&engine, &tenant).await, 1);

    let remaining =
        tessel_rag::storage::list_embeddings_for_context(engine.pool(), &kept.context_id)
            .await
            .expect("list embeddings");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].content, "Alpha content stays.");

    // The deleted vector is gone from the index too: searching for the
    // deleted text no longer finds an exact match.
    let hits = engine
        .search(&tenant, "Beta content goes.", Some(5))
        .await
        .expect("search");
    assert!(hits.iter().all(|hit| hit.score < 0.5));

    let err = engine
        .delete_context("owner-1", &tenant, &doomed.context_id)
        .await
        .expect_err("second delete must fail");
    assert!(matches!(err, RagError::NotFound(_)));
}

#[tokio::test]
async fn content_edit_replaces_all_embeddings() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (engine, _) = open_engine(&temp).await;
    let tenant = new_id();
    seed_chatbot(&engine, &tenant, "owner-1").await;

    let outcome = engine
        .ingest("owner-1", text_request(&tenant, "Pricing", "The plan costs $10."))
        .await
        .expect("ingest");
    let old_rows =
        tessel_rag::storage::list_embeddings_for_context(engine.pool(), &outcome.context_id)
            .await
            .expect("list old");

    let updated = engine
        .update_context(
            "owner-1",
            &tenant,
            &outcome.context_id,
            ContextUpdate {
                title: None,
                content: Some("The plan now costs $15.".to_string()),
            },
        )
        .await
        .expect("update");

    assert_eq!(updated.embeddings_created, 1);
    assert_eq!(updated.embeddings_skipped, 0);

    let new_rows =
        tessel_rag::storage::list_embeddings_for_context(engine.pool(), &outcome.context_id)
            .await
            .expect("list new");
    assert_eq!(new_rows.len(), 1);
    assert_eq!(new_rows[0].content, "The plan now costs $15.");
    assert_ne!(new_rows[0].id, old_rows[0].id);
    assert_eq!(count_embeddings(&engine, &tenant).await, 1);

    let context = tessel_rag::storage::fetch_context(engine.pool(), &tenant, &outcome.context_id)
        .await
        .expect("fetch")
        .expect("context exists");
    assert_eq!(context.raw_content, "The plan now costs $15.");
    assert_eq!(context.embedding_ids, vec![new_rows[0].id]);
}

#[tokio::test]
async fn title_only_edit_skips_reembedding() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (engine, provider) = open_engine(&temp).await;
    let tenant = new_id();
    seed_chatbot(&engine, &tenant, "owner-1").await;

    let outcome = engine
        .ingest("owner-1", text_request(&tenant, "Old title", "Stable content."))
        .await
        .expect("ingest");
    let calls_after_ingest = provider.batch_calls.load(Ordering::SeqCst);

    let updated = engine
        .update_context(
            "owner-1",
            &tenant,
            &outcome.context_id,
            ContextUpdate {
                title: Some("New title".to_string()),
                content: None,
            },
        )
        .await
        .expect("update");

    assert_eq!(updated.embeddings_created, 0);
    assert_eq!(provider.batch_calls.load(Ordering::SeqCst), calls_after_ingest);

    let context = tessel_rag::storage::fetch_context(engine.pool(), &tenant, &outcome.context_id)
        .await
        .expect("fetch")
        .expect("context exists");
    assert_eq!(context.title, "New title");
    assert_eq!(count_embeddings(&engine, &tenant).await, 1);
}

#[tokio::test]
async fn unchanged_content_edit_skips_reembedding_too() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (engine, provider) = open_engine(&temp).await;
    let tenant = new_id();
    seed_chatbot(&engine, &tenant, "owner-1").await;

    let outcome = engine
        .ingest("owner-1", text_request(&tenant, "Title", "Stable content."))
        .await
        .expect("ingest");
    let calls_after_ingest = provider.batch_calls.load(Ordering::SeqCst);

    let updated = engine
        .update_context(
            "owner-1",
            &tenant,
            &outcome.context_id,
            ContextUpdate {
                title: None,
                content: Some("Stable content.".to_string()),
            },
        )
        .await
        .expect("update");

    assert_eq!(updated.embeddings_created, 0);
    assert_eq!(provider.batch_calls.load(Ordering::SeqCst), calls_after_ingest);
}

#[tokio::test]
async fn updating_a_missing_context_is_not_found() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (engine, _) = open_engine(&temp).await;
    let tenant = new_id();
    seed_chatbot(&engine, &tenant, "owner-1").await;

    let err = engine
        .update_context(
            "owner-1",
            &tenant,
            &new_id(),
            ContextUpdate {
                title: Some("whatever".to_string()),
                content: None,
            },
        )
        .await
        .expect_err("unknown context must fail");
    assert!(matches!(err, RagError::NotFound(_)));
}
