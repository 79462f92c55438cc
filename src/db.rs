//! Database connection pool.

use crate::app_config::DatabaseConfig;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use std::time::Duration;

/// Opens a connection pool and makes sure the schema exists.
pub async fn init_db(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(config.url.to_owned());
    opt.max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .sqlx_logging(config.sqlx_logging);

    let db = Database::connect(opt).await?;
    log::info!(
        "Connected to {:?} database (max {} connections)",
        db.get_database_backend(),
        config.max_connections
    );

    crate::schema::create_schema(&db).await?;
    Ok(db)
}

/// Returns true if the error was raised by a unique index or constraint.
///
/// SeaORM flattens driver errors into strings, so the backend messages are
/// matched directly.
pub fn is_unique_violation(err: &DbErr) -> bool {
    let message = match err {
        DbErr::Exec(msg) | DbErr::Query(msg) | DbErr::Conn(msg) => msg,
        _ => return false,
    };

    message.contains("UNIQUE constraint failed")
        || message.contains("duplicate key value violates unique constraint")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_unique_violation_detected() {
        let err = DbErr::Exec(
            "error returned from database: UNIQUE constraint failed: favourites.user_id, favourites.recipe_id"
                .to_owned(),
        );
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn test_postgres_unique_violation_detected() {
        let err = DbErr::Query(
            "error returned from database: duplicate key value violates unique constraint \"unique_follow\""
                .to_owned(),
        );
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn test_other_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&DbErr::RecordNotFound(
            "recipe".to_owned()
        )));
        assert!(!is_unique_violation(&DbErr::Exec(
            "FOREIGN KEY constraint failed".to_owned()
        )));
    }
}
