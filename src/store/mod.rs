//! Read/write seam between the core and whatever holds the dataset.

mod sqlite;

pub use sqlite::SqliteGraphStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::generator::InsertOp;
use crate::graph::RawRelationship;
use crate::Result;

/// Totals reported by `/stats` and the `stats` binary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetCounts {
    pub people: u64,
    pub relationships: u64,
}

/// Backing store for the people/relationship dataset.
///
/// Implementations own their isolation; callers add no locking, so two
/// concurrent resets may interleave their phases.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// At most `limit` relationship rows, oldest first.
    async fn read_relationships(&self, limit: usize) -> Result<Vec<RawRelationship>>;

    /// Delete every relationship and person.
    async fn clear(&self) -> Result<()>;

    /// Apply a batch of upserts as one write. Returns the number of
    /// relationships that did not already exist.
    async fn write_batch(&self, ops: Vec<InsertOp>) -> Result<usize>;

    async fn counts(&self) -> Result<DatasetCounts>;
}
