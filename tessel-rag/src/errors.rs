#[derive(Debug, thiserror::Error)]
pub enum RagError {
    #[error("content is empty")]
    EmptyContent,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("source url already ingested for tenant {tenant_id}: {url}")]
    DuplicateSource { tenant_id: String, url: String },
    #[error("all {skipped} chunks were duplicates for tenant {tenant_id}")]
    AllContentDuplicate { tenant_id: String, skipped: usize },
    #[error("invalid id: {0}")]
    InvalidId(String),
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("embedding provider error: {0}")]
    EmbeddingProvider(String),
    #[error("search backend unavailable: {0}")]
    SearchUnavailable(String),
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("text extraction failed: {0}")]
    ExtractionFailed(String),
    #[error("missing data directory")]
    MissingDataDir,
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("sqlite-vec initialization error: {0}")]
    SqliteVec(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type RagResult<T> = Result<T, RagError>;
