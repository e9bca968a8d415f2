//! Embedded schema migrations.
//!
//! SQL files live in `migrations/` at the crate root and are compiled into
//! the binary. Applied versions are tracked in `_sqlx_migrations`.

use std::borrow::Cow;

use sqlx_core::migrate::{Migration, MigrationType, Migrator};
use tracing::{info, instrument};

use crate::{PgPool, StorageError, StorageResult};

/// Migrations in chronological order: (version, description, sql).
macro_rules! embedded_migrations {
    () => {
        &[(
            20250601000001i64,
            "kenni_auth",
            include_str!("../migrations/20250601000001_kenni_auth.sql"),
        )]
    };
}

fn build_migrations() -> Vec<Migration> {
    embedded_migrations!()
        .iter()
        .map(|(version, description, sql)| Migration {
            version: *version,
            description: Cow::Borrowed(description),
            migration_type: MigrationType::Simple,
            sql: Cow::Borrowed(sql),
            checksum: Cow::Borrowed(&[]),
            no_tx: false,
        })
        .collect()
}

/// Runs all pending migrations.
///
/// # Errors
///
/// Returns [`StorageError::Migration`] if a migration fails to apply.
#[instrument(skip(pool))]
pub async fn run(pool: &PgPool) -> StorageResult<()> {
    let migrations = build_migrations();
    info!(count = migrations.len(), "Running embedded migrations");

    let migrator = Migrator {
        migrations: Cow::Owned(migrations),
        ignore_missing: false,
        locking: true,
        no_tx: false,
    };

    migrator
        .run(pool)
        .await
        .map_err(|e| StorageError::Migration(e.to_string()))?;

    info!("Database migrations completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_ordered() {
        let migrations = build_migrations();
        assert!(!migrations.is_empty());
        assert!(
            migrations
                .windows(2)
                .all(|pair| pair[0].version < pair[1].version)
        );
    }

    #[test]
    fn test_schema_declares_unique_personal_code() {
        let migrations = build_migrations();
        let sql = &migrations[0].sql;
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS users"));
        assert!(sql.contains("UNIQUE (personal_code)"));
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS kenni_logins"));
    }
}
