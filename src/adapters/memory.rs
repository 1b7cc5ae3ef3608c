use crate::domain::model::{Collection, Document, DocumentRef, Record};
use crate::domain::ports::DocumentStore;
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Process-local document store. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<Mutex<HashMap<Collection, BTreeMap<String, Document>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, reference: &DocumentRef) -> Option<Document> {
        let collections = self.collections.lock().await;
        collections
            .get(&reference.collection)
            .and_then(|documents| documents.get(&reference.id))
            .cloned()
    }

    pub async fn count(&self, collection: Collection) -> usize {
        let collections = self.collections.lock().await;
        collections.get(&collection).map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn upsert(&self, collection: Collection, id: &str, record: &Record) -> Result<()> {
        let mut collections = self.collections.lock().await;
        let reference = DocumentRef::new(collection, id);
        collections.entry(collection).or_default().insert(
            id.to_string(),
            Document {
                reference,
                record: record.clone(),
                update_time: Some(Utc::now()),
            },
        );
        Ok(())
    }

    async fn list_all(&self, collection: Collection) -> Result<Vec<Document>> {
        let collections = self.collections.lock().await;
        Ok(collections
            .get(&collection)
            .map(|documents| documents.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete(&self, reference: &DocumentRef) -> Result<()> {
        let mut collections = self.collections.lock().await;
        let removed = collections
            .get_mut(&reference.collection)
            .and_then(|documents| documents.remove(&reference.id));

        // Firestore treats deleting a missing document as success.
        if removed.is_none() {
            tracing::debug!("{} was already absent", reference);
        }
        Ok(())
    }
}

impl InMemoryStore {
    /// Seeds a document directly, bypassing [`DocumentStore::upsert`].
    pub async fn insert(&self, collection: Collection, record: Record) -> Result<()> {
        let id = record
            .id()
            .ok_or_else(|| SyncError::MissingIdentifier {
                collection: collection.to_string(),
                label: record.name().unwrap_or("<unnamed>").to_string(),
            })?
            .to_string();
        self.upsert(collection, &id, &record).await
    }
}
