//! Pending nodes of the full trie walk.

/// A trie node that has been discovered but not yet visited.
///
/// Created when its parent's children are expanded and consumed exactly once
/// when popped from the decoder's work list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNode {
    /// Offset of the node's encoding within the trie
    pub offset: usize,
    /// Name bytes accumulated along the edges from the root to this node
    pub prefix: Vec<u8>,
}

impl PendingNode {
    /// The root node: offset 0 with an empty prefix.
    pub fn root() -> Self {
        Self {
            offset: 0,
            prefix: Vec::new(),
        }
    }

    /// Creates the node reached by following `edge` from this node.
    pub fn child(&self, edge: &[u8], offset: usize) -> Self {
        let mut prefix = Vec::with_capacity(self.prefix.len() + edge.len());
        prefix.extend_from_slice(&self.prefix);
        prefix.extend_from_slice(edge);
        Self { offset, prefix }
    }
}
