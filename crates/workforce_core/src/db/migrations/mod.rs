//! Embedded schema migrations.
//!
//! # Responsibility
//! - Carry the record store DDL (`0001_init.sql`) and the API user tables
//!   (`0002_auth.sql`) inside the binary.
//! - Bring a connection up to [`SCHEMA_VERSION`] in one transaction.
//!
//! # Invariants
//! - Versions start at 1 and increase by exactly one per entry.
//! - `PRAGMA user_version` is bumped inside the same transaction as the
//!   script it records, so a failed batch leaves the version untouched.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use serde::Serialize;

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: [Migration; 2] = [
    Migration {
        version: 1,
        name: "init",
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        name: "auth",
        sql: include_str!("0002_auth.sql"),
    },
];

/// Schema version a fully migrated record store reports.
pub const SCHEMA_VERSION: u32 = MIGRATIONS.len() as u32;

/// Schema version of an open store compared with this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemaStatus {
    pub version: u32,
    pub supported: u32,
}

impl SchemaStatus {
    pub fn read(conn: &Connection) -> DbResult<Self> {
        Ok(Self {
            version: user_version(conn)?,
            supported: SCHEMA_VERSION,
        })
    }

    pub fn is_current(self) -> bool {
        self.version == self.supported
    }

    /// Names of the scripts this store still needs, oldest first.
    pub fn pending(self) -> Vec<&'static str> {
        MIGRATIONS
            .iter()
            .filter(|migration| migration.version > self.version)
            .map(|migration| migration.name)
            .collect()
    }
}

/// Runs every migration newer than the store's `user_version`.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<SchemaStatus> {
    let before = SchemaStatus::read(conn)?;
    if before.version > SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found: before.version,
            supported: SCHEMA_VERSION,
        });
    }
    if before.is_current() {
        return Ok(before);
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > before.version) {
        let applied = tx.execute_batch(migration.sql).and_then(|()| {
            tx.pragma_update(None, "user_version", migration.version)
        });
        if let Err(source) = applied {
            error!(
                "event=db_migrate module=db status=error version={} name={} error={}",
                migration.version, migration.name, source
            );
            return Err(DbError::Migration {
                version: migration.version,
                name: migration.name,
                source,
            });
        }
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        before.version, SCHEMA_VERSION
    );
    SchemaStatus::read(conn)
}

fn user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}
