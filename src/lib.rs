pub mod config;
pub mod error;
pub mod db;
pub mod graph;
pub mod generator;
pub mod store;
pub mod reset;
pub mod server;

pub use config::Config;
pub use error::{SocialGraphError, Result};
pub use graph::{project, project_rows, Graph, Link, Node, RelationshipTuple};
pub use reset::{ResetOrchestrator, ResetStatus};
pub use store::{GraphStore, SqliteGraphStore};
