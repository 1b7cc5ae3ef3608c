use crate::domain::model::{Collection, Document, DocumentRef, Record, ServiceAccount};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn project_id(&self) -> &str;
    fn database(&self) -> &str;
    /// Base URL of the Firestore REST API, without the `/v1` suffix.
    fn endpoint(&self) -> &str;
    /// A fixed bearer token. Takes precedence over `service_account`.
    fn access_token(&self) -> Option<&str>;
    /// Account to mint bearer tokens for when no fixed token is set.
    fn service_account(&self) -> Option<&ServiceAccount>;
    fn timeout_seconds(&self) -> Option<u64>;
}

/// Collection-based document persistence.
///
/// `upsert` creates the document when absent and replaces all of its fields
/// when present; there is no separate insert or update path.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn upsert(&self, collection: Collection, id: &str, record: &Record) -> Result<()>;
    async fn list_all(&self, collection: Collection) -> Result<Vec<Document>>;
    async fn delete(&self, reference: &DocumentRef) -> Result<()>;
}

