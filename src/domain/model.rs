use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A dataset entry, kept as the raw JSON object so every field reaches the
/// store unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: HashMap<String, serde_json::Value>,
}

impl Record {
    /// Document key. Only string ids are accepted.
    pub fn id(&self) -> Option<&str> {
        self.str_field("id")
    }

    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    pub fn craft_type(&self) -> Option<&str> {
        self.str_field("craftType")
    }

    pub fn rating(&self) -> Option<f64> {
        self.data.get("rating").and_then(|v| v.as_f64())
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Record {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            data: map.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Artisans,
    Reviews,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Artisans => "artisans",
            Collection::Reviews => "reviews",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    pub collection: Collection,
    pub id: String,
}

impl DocumentRef {
    pub fn new(collection: Collection, id: impl Into<String>) -> Self {
        Self {
            collection,
            id: id.into(),
        }
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A document as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub reference: DocumentRef,
    pub record: Record,
    pub update_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtisanDataset {
    pub artisans: Vec<Record>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewDataset {
    pub reviews: Vec<Record>,
}

/// Both input files, loaded once before any command runs.
#[derive(Debug, Clone, Default)]
pub struct Datasets {
    pub artisans: Vec<Record>,
    pub reviews: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemFailure {
    pub label: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddReport {
    pub collection: Collection,
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<ItemFailure>,
}

impl AddReport {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            attempted: 0,
            succeeded: 0,
            failures: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeletePhase {
    pub collection: Collection,
    /// Set when the collection could not be enumerated; nothing was deleted.
    pub list_error: Option<String>,
    pub deleted: usize,
    pub failures: Vec<ItemFailure>,
}

impl DeletePhase {
    pub fn is_clean(&self) -> bool {
        self.list_error.is_none() && self.failures.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteReport {
    pub phases: Vec<DeletePhase>,
}

impl DeleteReport {
    pub fn is_clean(&self) -> bool {
        self.phases.iter().all(DeletePhase::is_clean)
    }
}

/// Service account that signs token requests for the remote store.
#[derive(Clone, PartialEq)]
pub struct ServiceAccount {
    pub client_email: String,
    /// PEM-encoded RSA private key.
    pub private_key: String,
    pub private_key_id: Option<String>,
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// Mean of the numeric `rating` fields, `None` when there is nothing to average.
pub fn average_rating<'a, I>(records: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a Record>,
{
    let (total, count) = records
        .into_iter()
        .filter_map(Record::rating)
        .fold((0.0, 0usize), |(total, count), rating| (total + rating, count + 1));

    if count == 0 {
        None
    } else {
        Some(total / count as f64)
    }
}

/// Rounds to two decimals with ties going away from zero, so 4.125 becomes
/// 4.13 rather than the banker's 4.12 that `{:.2}` alone would print.
pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
