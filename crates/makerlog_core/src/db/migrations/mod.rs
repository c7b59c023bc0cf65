//! Migration registry and executor.
//!
//! # Invariants
//! - `version` values are strictly increasing.
//! - All pending migrations run in one transaction; a failure leaves the
//!   previous schema untouched.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("0001_projects_milestones.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("0002_tags.sql"),
    },
    Migration {
        version: 3,
        sql: include_str!("0003_progress_posts.sql"),
    },
];

/// Latest schema version this build can produce.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on `conn`.
///
/// # Errors
/// - `DbError::UnsupportedSchemaVersion` when the file is ahead of this build.
/// - `DbError::MigrationFailed` naming the first script that did not apply.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    let latest = latest_version();

    if current > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }
    if current == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tx.execute_batch(migration.sql)
            .and_then(|()| {
                tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
            })
            .map_err(|source| {
                error!(
                    "event=db_migrate module=db status=error version={}",
                    migration.version
                );
                DbError::MigrationFailed {
                    version: migration.version,
                    source,
                }
            })?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={current} to_version={latest}");
    Ok(())
}
