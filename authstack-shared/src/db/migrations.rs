/// Database migration runner
///
/// Migrations live in this crate's `migrations/` directory and are embedded
/// at compile time with `sqlx::migrate!`. Each one has an up file
/// (`{timestamp}_{name}.up.sql`) and a down file (`{timestamp}_{name}.down.sql`).

use sqlx::{migrate::MigrateDatabase, postgres::PgPool, Postgres};
use tracing::{debug, info, warn};

/// Runs all pending migrations
///
/// Each migration runs in its own transaction; a failing one is rolled back
/// and the error returned.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    match sqlx::migrate!("./migrations").run(pool).await {
        Ok(()) => {
            info!("Database migrations up to date");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}

/// Creates the database if it doesn't exist (development and tests)
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if !Postgres::database_exists(database_url).await? {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
    } else {
        debug!("Database already exists");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_migrations_are_embedded() {
        let migrator = sqlx::migrate!("./migrations");
        let descriptions: Vec<_> = migrator
            .iter()
            .map(|m| m.description.to_string())
            .collect();

        assert!(descriptions.iter().any(|d| d.contains("create users")));
    }
}
