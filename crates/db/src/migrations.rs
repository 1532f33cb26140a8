use chrono::{SecondsFormat, Utc};
use rusqlite::{OptionalExtension, params};

use crate::Db;
use crate::error::Result;

const MIGRATION_0001: &str = include_str!("../migrations/0001_init.sql");

const MIGRATIONS: &[(&str, &str)] = &[("0001_init", MIGRATION_0001)];

impl Db {
    pub fn migrate(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_migration (name TEXT PRIMARY KEY, applied_at TEXT NOT NULL)",
        )?;
        for (name, sql) in MIGRATIONS {
            let applied = tx
                .query_row(
                    "SELECT name FROM schema_migration WHERE name = ?1",
                    [name],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            if applied.is_some() {
                continue;
            }
            tx.execute_batch(sql)?;
            tx.execute(
                "INSERT INTO schema_migration (name, applied_at) VALUES (?1, ?2)",
                params![name, Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn applied_migrations(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM schema_migration ORDER BY name ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut names = Vec::new();
        for row in rows {
            names.push(row?);
        }
        Ok(names)
    }
}
