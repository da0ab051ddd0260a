use tessel_rag::{DocumentStore, RagError};

#[tokio::test]
async fn reopening_with_a_different_dimension_fails_at_startup() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("tessel.sqlite3");

    let store = DocumentStore::open(&path, 16).await.expect("first open");
    drop(store);

    let err = DocumentStore::open(&path, 8)
        .await
        .expect_err("mismatched dimension must fail");
    assert!(matches!(
        err,
        RagError::DimensionMismatch {
            expected: 16,
            actual: 8
        }
    ));
}

#[tokio::test]
async fn reopening_with_the_recorded_dimension_succeeds() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("tessel.sqlite3");

    let store = DocumentStore::open(&path, 16).await.expect("first open");
    drop(store);

    DocumentStore::open(&path, 16).await.expect("reopen");
}
