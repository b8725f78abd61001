use crate::dom::{Document, MutationRecord, NodeId};

/// Decides whether a batch of DOM mutations needs another highlight pass.
#[derive(Debug, Clone, Default)]
pub struct MutationObserver {
    ignored: Vec<NodeId>,
}

impl MutationObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Additions under `node` (the tooltip, for one) never trigger a pass.
    pub fn ignore(&mut self, node: NodeId) {
        if !self.ignored.contains(&node) {
            self.ignored.push(node);
        }
    }

    /// True when some added node is attached inside the body and is not
    /// inside an ignored subtree.
    pub fn wants_rescan(&self, doc: &Document, records: &[MutationRecord]) -> bool {
        records
            .iter()
            .flat_map(|record| record.added.iter().copied())
            .any(|node| {
                doc.is_attached(node)
                    && doc.contains(doc.body(), node)
                    && !self.ignored.iter().any(|&ignored| doc.contains(ignored, node))
            })
    }
}
