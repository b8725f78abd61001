use crate::dom::NodeId;

#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("node {0} is not attached to a parent")]
    Detached(NodeId),

    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("node {0} is not a text node")]
    NotText(NodeId),

    #[error("inserting {child} under {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("node {reference} is not a child of {parent}")]
    NotAChild { parent: NodeId, reference: NodeId },
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Access(String),

    #[error("invalid stored value: {0}")]
    Format(#[from] serde_json::Error),
}
