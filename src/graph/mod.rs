//! Graph projection: relationship rows in, deduplicated node/link graph out.
//!
//! Rows coming back from the store carry sparse external identities. The
//! projector folds them into a graph whose nodes are densely indexed in
//! first-seen order, which is what force-directed front ends expect.

mod projection;
mod remap;

pub use projection::{project, project_rows, GraphProjector};
pub use remap::IdentityMap;

use serde::{Deserialize, Serialize};

use crate::{Result, SocialGraphError};

/// One validated relationship record from the read path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipTuple {
    pub source_id: u64,
    pub target_id: u64,
    pub source_name: String,
    pub target_name: String,
    pub relation_type: String,
}

impl RelationshipTuple {
    pub fn new(
        source_id: u64,
        target_id: u64,
        source_name: impl Into<String>,
        target_name: impl Into<String>,
        relation_type: impl Into<String>,
    ) -> Self {
        Self {
            source_id,
            target_id,
            source_name: source_name.into(),
            target_name: target_name.into(),
            relation_type: relation_type.into(),
        }
    }
}

/// An identity column as the store handed it over, before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawIdentity {
    Missing,
    Integer(i64),
    Text(String),
}

/// An unvalidated relationship row.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRelationship {
    pub source_id: RawIdentity,
    pub target_id: RawIdentity,
    pub source_name: Option<String>,
    pub target_name: Option<String>,
    pub relation_type: Option<String>,
}

impl RawRelationship {
    /// Check required fields and convert into a [`RelationshipTuple`].
    ///
    /// `row` is the zero-based position in the read result, used only for
    /// the error message.
    pub fn validate(self, row: usize) -> Result<RelationshipTuple> {
        let malformed = |reason: String| SocialGraphError::MalformedTuple { row, reason };

        let source_id = identity(&self.source_id, "source").map_err(malformed)?;
        let target_id = identity(&self.target_id, "target").map_err(malformed)?;
        let source_name = self
            .source_name
            .ok_or_else(|| malformed("missing source name".to_string()))?;
        let target_name = self
            .target_name
            .ok_or_else(|| malformed("missing target name".to_string()))?;
        let relation_type = self
            .relation_type
            .ok_or_else(|| malformed("missing relationship type".to_string()))?;

        Ok(RelationshipTuple {
            source_id,
            target_id,
            source_name,
            target_name,
            relation_type,
        })
    }
}

fn identity(raw: &RawIdentity, end: &str) -> std::result::Result<u64, String> {
    match raw {
        RawIdentity::Missing => Err(format!("missing {} identity", end)),
        RawIdentity::Integer(v) => {
            u64::try_from(*v).map_err(|_| format!("negative {} identity {}", end, v))
        }
        RawIdentity::Text(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| format!("non-numeric {} identity {:?}", end, s)),
    }
}

/// A projected node. `label` is the entity kind, identical for every node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub title: String,
    pub label: String,
}

/// A projected edge; `source` and `target` index into [`Graph::nodes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub source: usize,
    pub target: usize,
    pub relationship: String,
}

/// Node/link graph in the shape force-directed layouts consume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl Graph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(source_id: RawIdentity, target_id: RawIdentity) -> RawRelationship {
        RawRelationship {
            source_id,
            target_id,
            source_name: Some("Alice".to_string()),
            target_name: Some("Bob".to_string()),
            relation_type: Some("KNOWS".to_string()),
        }
    }

    #[test]
    fn test_validate_accepts_complete_row() {
        let tuple = raw(RawIdentity::Integer(7), RawIdentity::Text("9".to_string()))
            .validate(0)
            .unwrap();
        assert_eq!(tuple, RelationshipTuple::new(7, 9, "Alice", "Bob", "KNOWS"));
    }

    #[test]
    fn test_validate_rejects_negative_identity() {
        let err = raw(RawIdentity::Integer(-1), RawIdentity::Integer(2))
            .validate(4)
            .unwrap_err();
        match err {
            SocialGraphError::MalformedTuple { row, reason } => {
                assert_eq!(row, 4);
                assert!(reason.contains("negative source"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_non_numeric_identity() {
        let err = raw(RawIdentity::Integer(1), RawIdentity::Text("bob".to_string()))
            .validate(0)
            .unwrap_err();
        assert!(err.to_string().contains("non-numeric target"));
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let err = raw(RawIdentity::Missing, RawIdentity::Integer(2)).validate(0).unwrap_err();
        assert!(err.to_string().contains("missing source identity"));

        let mut row = raw(RawIdentity::Integer(1), RawIdentity::Integer(2));
        row.target_name = None;
        assert!(row.validate(0).unwrap_err().to_string().contains("missing target name"));

        let mut row = raw(RawIdentity::Integer(1), RawIdentity::Integer(2));
        row.relation_type = None;
        assert!(row.validate(0).unwrap_err().to_string().contains("relationship type"));
    }

    #[test]
    fn test_graph_serializes_to_wire_shape() {
        let graph = Graph {
            nodes: vec![Node { title: "Alice".to_string(), label: "Person".to_string() }],
            links: vec![Link { source: 0, target: 0, relationship: "LIKES".to_string() }],
        };
        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "nodes": [{"title": "Alice", "label": "Person"}],
                "links": [{"source": 0, "target": 0, "relationship": "LIKES"}]
            })
        );
    }

    #[test]
    fn test_empty_graph_serializes_with_both_arrays() {
        let json = serde_json::to_string(&Graph::default()).unwrap();
        assert_eq!(json, r#"{"nodes":[],"links":[]}"#);
    }
}
