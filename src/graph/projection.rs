//! Fold relationship tuples into a [`Graph`].

use super::{Graph, IdentityMap, Link, RawRelationship, RelationshipTuple};
use crate::Result;

/// Incremental projector. One instance per read request.
pub struct GraphProjector<'a> {
    label: &'a str,
    ids: IdentityMap,
    graph: Graph,
}

impl<'a> GraphProjector<'a> {
    pub fn new(label: &'a str) -> Self {
        Self {
            label,
            ids: IdentityMap::new(),
            graph: Graph::default(),
        }
    }

    /// Resolve both endpoints and append one link. Self-loops and repeated
    /// tuples are kept as-is.
    pub fn push(&mut self, tuple: RelationshipTuple) {
        let source = self.ids.resolve(
            tuple.source_id,
            &tuple.source_name,
            self.label,
            &mut self.graph.nodes,
        );
        let target = self.ids.resolve(
            tuple.target_id,
            &tuple.target_name,
            self.label,
            &mut self.graph.nodes,
        );
        self.graph.links.push(Link {
            source,
            target,
            relationship: tuple.relation_type,
        });
    }

    pub fn finish(self) -> Graph {
        log::debug!(
            "Projected {} nodes and {} links",
            self.graph.nodes.len(),
            self.graph.links.len()
        );
        self.graph
    }
}

/// Project validated tuples, in input order.
pub fn project<I>(tuples: I, label: &str) -> Graph
where
    I: IntoIterator<Item = RelationshipTuple>,
{
    let mut projector = GraphProjector::new(label);
    for tuple in tuples {
        projector.push(tuple);
    }
    projector.finish()
}

/// Validate and project raw store rows.
///
/// The first malformed row fails the whole projection; no partial graph is
/// returned.
pub fn project_rows<I>(rows: I, label: &str) -> Result<Graph>
where
    I: IntoIterator<Item = RawRelationship>,
{
    let mut projector = GraphProjector::new(label);
    for (row, raw) in rows.into_iter().enumerate() {
        projector.push(raw.validate(row)?);
    }
    Ok(projector.finish())
}
