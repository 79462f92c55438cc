//! Test database setup
#![allow(dead_code)]

use actix_web::web::Data;
use foodgram::storage::{local::LocalStorage, StorageBackend};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::sync::Arc;

/// Fresh in-memory SQLite database with the full schema.
///
/// Every in-memory connection is its own database, so the pool is pinned to a
/// single connection that stays open for the whole test.
pub async fn setup_test_database() -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    foodgram::schema::create_schema(&db).await?;
    Ok(db)
}

/// Local image storage rooted in a temporary directory.
///
/// Keep the returned directory alive for as long as the storage is used.
pub fn setup_test_storage() -> (tempfile::TempDir, Data<dyn StorageBackend>) {
    let dir = tempfile::tempdir().expect("Failed to create media dir");
    let storage: Arc<dyn StorageBackend> = Arc::new(
        LocalStorage::new(dir.path().to_path_buf()).expect("Failed to create storage"),
    );
    (dir, Data::from(storage))
}
