//! Numbered SQL migrations (`NNN_name.sql`) tracked in `schema_migrations`.

use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use crate::error::{Result, SocialGraphError};

struct Migration {
    version: u32,
    name: String,
    sql: String,
}

impl Migration {
    /// `001_people_relationships.sql` -> version 1, name `001_people_relationships`.
    fn from_file(path: &Path) -> Result<Self> {
        let invalid = || SocialGraphError::Config(format!("Invalid migration file: {}", path.display()));

        let name = path.file_stem().and_then(|n| n.to_str()).ok_or_else(invalid)?;
        let version = name
            .split_once('_')
            .map_or(name, |(prefix, _)| prefix)
            .parse::<u32>()
            .map_err(|_| invalid())?;

        Ok(Self {
            version,
            name: name.to_string(),
            sql: fs::read_to_string(path)?,
        })
    }
}

fn applied_names(conn: &Connection) -> Result<HashSet<String>> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        );",
    )?;
    let mut stmt = conn.prepare("SELECT name FROM schema_migrations")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<HashSet<_>, rusqlite::Error>>()?;
    Ok(names)
}

fn load_migrations(migrations_dir: &Path) -> Result<Vec<Migration>> {
    let mut migrations = Vec::new();
    for entry in fs::read_dir(migrations_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("sql") {
            migrations.push(Migration::from_file(&path)?);
        }
    }
    migrations.sort_by_key(|m| m.version);
    Ok(migrations)
}

/// Apply every migration in `migrations_dir` not yet recorded, each in its
/// own transaction.
pub fn run_migrations(conn: &mut Connection, migrations_dir: &Path) -> Result<()> {
    let applied = applied_names(conn)?;
    let pending: Vec<Migration> = load_migrations(migrations_dir)?
        .into_iter()
        .filter(|m| !applied.contains(&m.name))
        .collect();

    if pending.is_empty() {
        log::debug!("Schema up to date ({} migrations applied)", applied.len());
        return Ok(());
    }

    for migration in pending {
        log::info!("Applying migration {}", migration.name);
        let tx = conn.transaction()?;
        tx.execute_batch(&migration.sql).map_err(|e| {
            SocialGraphError::Config(format!("Migration {} failed: {}", migration.name, e))
        })?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
            params![migration.version, migration.name],
        )?;
        tx.commit()?;
    }

    log::info!("Schema migrations complete");
    Ok(())
}
