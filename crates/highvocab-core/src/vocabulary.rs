use std::collections::HashMap;

use highvocab_types::VocabEntry;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::preprocess::normalize_key;
use crate::storage::KeyValueStore;

/// Storage key holding the ordered list of saved words.
pub const MARKED_WORDS_KEY: &str = "markedWords";

/// Lookup from normalized word to cached translation, rebuilt per pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabularyIndex {
    entries: HashMap<String, String>,
}

impl VocabularyIndex {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a VocabEntry>) -> Self {
        let mut index = Self::default();
        for entry in entries {
            index.insert(&entry.word, &entry.translation);
        }
        index
    }

    pub fn insert(&mut self, word: &str, translation: &str) {
        let key = normalize_key(word);
        if !key.is_empty() {
            self.entries.insert(key, translation.to_string());
        }
    }

    pub fn get(&self, word: &str) -> Option<&str> {
        self.entries.get(&normalize_key(word)).map(String::as_str)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(&normalize_key(word))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add every entry of `other`, its translations winning.
    pub fn extend(&mut self, other: VocabularyIndex) {
        self.entries.extend(other.entries);
    }

    /// `(key, translation)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Either shape a saved word may have been written in.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredWord {
    Legacy(String),
    Entry(VocabEntry),
}

/// Insert or overwrite by normalized word. Returns true when an existing
/// entry was replaced; its position in the list is kept.
pub fn upsert(entries: &mut Vec<VocabEntry>, entry: VocabEntry) -> bool {
    let key = normalize_key(&entry.word);
    let entry = VocabEntry::new(key.clone(), entry.translation);
    match entries.iter_mut().find(|e| normalize_key(&e.word) == key) {
        Some(existing) => {
            *existing = entry;
            true
        }
        None => {
            entries.push(entry);
            false
        }
    }
}

/// Decode the stored list, migrating bare strings. The flag reports whether
/// the decoded list differs from what is stored.
fn decode_entries(value: Value) -> (Vec<VocabEntry>, bool) {
    let items = match value {
        Value::Array(items) => items,
        other => {
            tracing::warn!("Ignoring saved words: expected a list, found {other}");
            return (Vec::new(), false);
        }
    };

    let mut entries = Vec::with_capacity(items.len());
    let mut changed = false;
    for item in items {
        match serde_json::from_value::<StoredWord>(item.clone()) {
            Ok(StoredWord::Legacy(word)) => {
                changed = true;
                if !normalize_key(&word).is_empty() {
                    upsert(&mut entries, VocabEntry::new(word, ""));
                }
            }
            Ok(StoredWord::Entry(entry)) => {
                let key = normalize_key(&entry.word);
                if key.is_empty() {
                    changed = true;
                    continue;
                }
                changed |= key != entry.word;
                changed |= upsert(&mut entries, entry);
            }
            Err(e) => {
                tracing::warn!("Skipping malformed saved word {item}: {e}");
            }
        }
    }

    (entries, changed)
}

/// Adapter over the shared store for the `markedWords` list.
///
/// Read-modify-write sequences on the list are serialized through `lock`.
pub struct VocabularyStore<S> {
    store: S,
    lock: Mutex<()>,
}

impl<S: KeyValueStore> VocabularyStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read every saved entry, re-persisting migrated legacy items.
    pub async fn load(&self) -> Result<Vec<VocabEntry>, StoreError> {
        let _guard = self.lock.lock().await;
        self.load_locked().await
    }

    async fn load_locked(&self) -> Result<Vec<VocabEntry>, StoreError> {
        let Some(value) = self.store.get(MARKED_WORDS_KEY).await? else {
            return Ok(Vec::new());
        };

        let (entries, changed) = decode_entries(value);
        if changed {
            tracing::info!("Migrating {} saved words to the current format", entries.len());
            self.write(&entries).await?;
        }
        Ok(entries)
    }

    pub async fn index(&self) -> Result<VocabularyIndex, StoreError> {
        Ok(VocabularyIndex::from_entries(&self.load().await?))
    }

    /// Upsert one word; the stored key is the normalized form.
    pub async fn save(&self, word: &str, translation: &str) -> Result<VocabEntry, StoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load_locked().await?;
        let replaced = upsert(&mut entries, VocabEntry::new(word, translation));
        self.write(&entries).await?;

        let key = normalize_key(word);
        tracing::info!(replaced, "Saved word '{key}'");
        Ok(VocabEntry::new(key, translation))
    }

    async fn write(&self, entries: &[VocabEntry]) -> Result<(), StoreError> {
        let value = serde_json::to_value(entries)?;
        self.store.set(MARKED_WORDS_KEY, value).await
    }
}
