//! Shared test utilities for database operations
//!
//! Provides an in-memory store with the full schema so store tests run
//! against the same tables as production.

use super::Database;
use crate::store::SqliteStore;

/// Create an in-memory store with full schema
pub async fn test_store() -> SqliteStore {
    let db = Database::new(None)
        .await
        .expect("Failed to create test database");
    SqliteStore::new(db.pool().clone())
}
