pub mod dom;
pub mod error;
pub mod highlighter;
pub mod layout;
pub mod locator;
pub mod observer;
pub mod preprocess;
pub mod relay;
pub mod session;
pub mod storage;
pub mod tooltip;
pub mod vocabulary;

pub use dom::{Document, NodeId, NodeSpec};
pub use error::{DomError, StoreError};
pub use session::{ContentSession, PageEvent, PageSnapshot};
pub use storage::{KeyValueStore, MemoryStore};
pub use vocabulary::{VocabularyIndex, VocabularyStore};

#[cfg(test)]
mod tests;
