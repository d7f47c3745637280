//! External identity -> output index remapping.

use std::collections::HashMap;

use super::Node;

/// Identities below this go in the dense table; anything larger is kept in
/// the sparse map so one huge id cannot force a huge allocation.
const DENSE_WINDOW: u64 = 1 << 20;

/// Request-scoped map from external identity to output index.
///
/// Slots are `None` until an identity is first resolved. Once assigned, an
/// index never changes for the lifetime of the map.
#[derive(Debug, Default)]
pub struct IdentityMap {
    dense: Vec<Option<usize>>,
    sparse: HashMap<u64, usize>,
    assigned: usize,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `id` addressable. Growth is geometric within the dense window.
    pub fn ensure_capacity(&mut self, id: u64) {
        if id >= DENSE_WINDOW {
            return;
        }
        let needed = id as usize + 1;
        if needed > self.dense.len() {
            let grown = (self.dense.len() * 2).max(needed).min(DENSE_WINDOW as usize);
            self.dense.resize(grown, None);
        }
    }

    /// Previously assigned index for `id`, if any.
    pub fn get(&self, id: u64) -> Option<usize> {
        if id < DENSE_WINDOW {
            self.dense.get(id as usize).copied().flatten()
        } else {
            self.sparse.get(&id).copied()
        }
    }

    /// Return the output index for `id`, appending a node on first sight.
    ///
    /// Later calls for the same identity return the same index and leave
    /// `nodes` untouched, whatever name or label they carry.
    pub fn resolve(&mut self, id: u64, title: &str, label: &str, nodes: &mut Vec<Node>) -> usize {
        if let Some(index) = self.get(id) {
            return index;
        }

        let index = nodes.len();
        nodes.push(Node {
            title: title.to_string(),
            label: label.to_string(),
        });

        if id < DENSE_WINDOW {
            self.ensure_capacity(id);
            self.dense[id as usize] = Some(index);
        } else {
            self.sparse.insert(id, index);
        }
        self.assigned += 1;
        index
    }

    /// Number of distinct identities resolved so far.
    pub fn len(&self) -> usize {
        self.assigned
    }

    pub fn is_empty(&self) -> bool {
        self.assigned == 0
    }

    /// Addressable dense slots (assigned or not).
    pub fn capacity(&self) -> usize {
        self.dense.len()
    }
}
