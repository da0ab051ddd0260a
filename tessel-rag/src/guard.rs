//! Ownership guard for the engine's entry points.
//!
//! Every mutating call passes the id-format check and the ownership check
//! before any other logic runs; edit/delete paths additionally confirm the
//! target context really belongs to the claimed tenant. Search, being
//! read-only and invoked on behalf of an already-authenticated session,
//! only gets the format check.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::errors::{RagError, RagResult};
use crate::storage::{context_tenant, fetch_chatbot};

/// Reject ids that do not have the store's opaque-id shape (UUID). Runs
/// before any query touches the id, as an injection defense.
pub fn validate_id_format(id: &str) -> RagResult<()> {
    Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| RagError::InvalidId(id.to_string()))
}

/// Confirm the principal owns the tenant's chatbot.
pub async fn validate_ownership(
    pool: &SqlitePool,
    tenant_id: &str,
    principal_id: &str,
) -> RagResult<()> {
    let chatbot = fetch_chatbot(pool, tenant_id).await?.ok_or_else(|| {
        RagError::AccessDenied(format!("no chatbot registered for tenant {tenant_id}"))
    })?;

    if chatbot.owner_id != principal_id {
        return Err(RagError::AccessDenied(format!(
            "principal does not own tenant {tenant_id}"
        )));
    }

    Ok(())
}

/// Confirm the context belongs to the claimed tenant. Storage queries are
/// already tenant-scoped; this is an independent second check against
/// cross-tenant id guessing.
pub async fn validate_context_tenant(
    pool: &SqlitePool,
    tenant_id: &str,
    context_id: &str,
) -> RagResult<()> {
    match context_tenant(pool, context_id).await? {
        Some(owner) if owner == tenant_id => Ok(()),
        // Cross-tenant targets read as missing; existence is not leaked.
        _ => Err(RagError::NotFound(format!("context {context_id}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_uuid_passes() {
        let id = Uuid::new_v4().to_string();
        assert!(validate_id_format(&id).is_ok());
    }

    #[test]
    fn malformed_ids_are_rejected() {
        for id in ["", "abc", "123; DROP TABLE contexts", "not-a-uuid-at-all"] {
            assert!(matches!(
                validate_id_format(id),
                Err(RagError::InvalidId(_))
            ));
        }
    }
}
