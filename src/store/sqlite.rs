use async_trait::async_trait;
use rusqlite::params;
use rusqlite::types::ValueRef;

use super::{DatasetCounts, GraphStore};
use crate::db::Db;
use crate::error::{Result, SocialGraphError};
use crate::generator::InsertOp;
use crate::graph::{RawIdentity, RawRelationship};

/// [`GraphStore`] over the `people` / `relationships` tables.
#[derive(Debug, Clone)]
pub struct SqliteGraphStore {
    db: Db,
}

impl SqliteGraphStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Db {
        &self.db
    }
}

fn unavailable(e: SocialGraphError) -> SocialGraphError {
    match e {
        SocialGraphError::SinkUnavailable(_) => e,
        other => SocialGraphError::SinkUnavailable(other.to_string()),
    }
}

fn raw_identity(value: ValueRef<'_>) -> RawIdentity {
    match value {
        ValueRef::Null => RawIdentity::Missing,
        ValueRef::Integer(v) => RawIdentity::Integer(v),
        ValueRef::Real(v) => RawIdentity::Text(v.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            RawIdentity::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

#[async_trait]
impl GraphStore for SqliteGraphStore {
    async fn read_relationships(&self, limit: usize) -> Result<Vec<RawRelationship>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.db
            .with_connection(move |conn| {
                // LEFT JOIN so a dangling endpoint shows up as a missing name
                // instead of silently dropping the row.
                let mut stmt = conn.prepare(
                    "SELECT r.source_id, r.target_id, s.name, t.name, r.kind \
                     FROM relationships r \
                     LEFT JOIN people s ON s.person_id = r.source_id \
                     LEFT JOIN people t ON t.person_id = r.target_id \
                     ORDER BY r.relationship_id \
                     LIMIT ?1",
                )?;
                let rows = stmt.query_map([limit], |row| {
                    Ok(RawRelationship {
                        source_id: raw_identity(row.get_ref(0)?),
                        target_id: raw_identity(row.get_ref(1)?),
                        source_name: row.get(2)?,
                        target_name: row.get(3)?,
                        relation_type: row.get(4)?,
                    })
                })?;
                let mut out = Vec::new();
                for row in rows {
                    out.push(row?);
                }
                Ok(out)
            })
            .await
            .map_err(unavailable)
    }

    async fn clear(&self) -> Result<()> {
        self.db
            .with_connection(|conn| {
                let tx = conn.transaction()?;
                let relationships = tx.execute("DELETE FROM relationships", [])?;
                let people = tx.execute("DELETE FROM people", [])?;
                tx.commit()?;
                log::debug!("Deleted {} relationships and {} people", relationships, people);
                Ok(())
            })
            .await
            .map_err(unavailable)
    }

    async fn write_batch(&self, ops: Vec<InsertOp>) -> Result<usize> {
        if ops.is_empty() {
            return Ok(0);
        }
        self.db
            .with_connection(move |conn| {
                let tx = conn.transaction()?;
                let mut written = 0;
                {
                    let mut upsert_person = tx.prepare(
                        "INSERT INTO people (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
                    )?;
                    let mut find_person =
                        tx.prepare("SELECT person_id FROM people WHERE name = ?1")?;
                    let mut upsert_edge = tx.prepare(
                        "INSERT OR IGNORE INTO relationships (source_id, target_id, kind) \
                         VALUES (?1, ?2, ?3)",
                    )?;

                    let mut person_id = |name: &str| -> Result<i64> {
                        upsert_person.execute([name])?;
                        Ok(find_person.query_row([name], |row| row.get(0))?)
                    };

                    for op in &ops {
                        let source = person_id(op.source_name.as_str())?;
                        let target = person_id(op.target_name.as_str())?;
                        written += upsert_edge.execute(params![source, target, op.relation_kind])?;
                    }
                }
                tx.commit()?;
                Ok(written)
            })
            .await
            .map_err(unavailable)
    }

    async fn counts(&self) -> Result<DatasetCounts> {
        self.db
            .with_connection(|conn| {
                let (people, relationships): (i64, i64) = conn.query_row(
                    "SELECT (SELECT COUNT(*) FROM people), (SELECT COUNT(*) FROM relationships)",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                Ok(DatasetCounts {
                    people: people.max(0) as u64,
                    relationships: relationships.max(0) as u64,
                })
            })
            .await
            .map_err(unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrate;
    use crate::graph::project_rows;
    use std::path::Path;
    use tempfile::TempDir;

    async fn setup_store() -> (SqliteGraphStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Db::new(temp_dir.path().join("test.db"));
        let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations");
        db.with_connection(move |conn| migrate::run_migrations(conn, &migrations_dir))
            .await
            .unwrap();
        (SqliteGraphStore::new(db), temp_dir)
    }

    fn op(source: &str, target: &str, kind: &str) -> InsertOp {
        InsertOp {
            source_name: source.to_string(),
            target_name: target.to_string(),
            relation_kind: kind.to_string(),
        }
    }

    #[tokio::test]
    async fn test_write_batch_upserts_people_by_name() {
        let (store, _temp) = setup_store().await;

        let written = store
            .write_batch(vec![
                op("Alice Smith", "Bob Jones", "KNOWS"),
                op("Bob Jones", "Alice Smith", "LIKES"),
                op("Alice Smith", "Bob Jones", "KNOWS"),
                op("Carol White", "Carol White", "LIKES"),
            ])
            .await
            .unwrap();

        assert_eq!(written, 3);
        assert_eq!(
            store.counts().await.unwrap(),
            DatasetCounts { people: 3, relationships: 3 }
        );
    }

    #[tokio::test]
    async fn test_read_relationships_in_insert_order_with_limit() {
        let (store, _temp) = setup_store().await;
        store
            .write_batch(vec![
                op("Alice Smith", "Bob Jones", "MANAGES"),
                op("Bob Jones", "Alice Smith", "REPORTS_TO"),
                op("Carol White", "Alice Smith", "KNOWS"),
            ])
            .await
            .unwrap();

        let rows = store.read_relationships(2).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].source_name.as_deref(), Some("Alice Smith"));
        assert_eq!(rows[1].relation_type.as_deref(), Some("REPORTS_TO"));
        assert_eq!(rows[0].source_id, rows[1].target_id);

        let graph = project_rows(rows, "Person").unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.links[1].source, 1);
        assert_eq!(graph.links[1].target, 0);
    }

    #[tokio::test]
    async fn test_clear_empties_dataset() {
        let (store, _temp) = setup_store().await;
        store.write_batch(vec![op("A B", "C D", "KNOWS")]).await.unwrap();

        store.clear().await.unwrap();

        assert_eq!(store.counts().await.unwrap(), DatasetCounts::default());
        assert!(store.read_relationships(50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_numeric_identity_surfaces_as_raw_text() {
        let (store, _temp) = setup_store().await;
        store.write_batch(vec![op("A B", "C D", "KNOWS")]).await.unwrap();
        store
            .db()
            .with_connection(|conn| {
                conn.execute_batch(
                    "PRAGMA foreign_keys = OFF; UPDATE relationships SET source_id = 'abc';",
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let rows = store.read_relationships(10).await.unwrap();
        assert_eq!(rows[0].source_id, RawIdentity::Text("abc".to_string()));
        assert_eq!(rows[0].source_name, None);
        assert!(matches!(
            project_rows(rows, "Person"),
            Err(SocialGraphError::MalformedTuple { row: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_schema_is_sink_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteGraphStore::new(Db::new(temp_dir.path().join("empty.db")));

        let err = store.read_relationships(10).await.unwrap_err();
        assert!(matches!(err, SocialGraphError::SinkUnavailable(_)));
        assert!(matches!(store.clear().await, Err(SocialGraphError::SinkUnavailable(_))));
    }
}
