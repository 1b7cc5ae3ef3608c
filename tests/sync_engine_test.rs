use artisan_sync::core::{Collection, Datasets, Document, DocumentRef, DocumentStore, Record};
use artisan_sync::{Command, InMemoryStore, Result, SyncEngine, SyncError};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

fn record(value: serde_json::Value) -> Record {
    serde_json::from_value(value).unwrap()
}

fn sample_datasets() -> Datasets {
    Datasets {
        artisans: vec![
            record(json!({"id": "a1", "name": "Salma", "craftType": "pottery", "rating": 4.5, "city": "Fustat"})),
            record(json!({"id": "a2", "name": "Omar", "craftType": "woodwork", "rating": 4, "tags": ["inlay", "mashrabiya"]})),
            record(json!({"id": "a3", "name": "Huda", "craftType": "weaving", "rating": 5})),
        ],
        reviews: vec![
            record(json!({"id": "r1", "artisanId": "a1", "rating": 4, "comment": "Lovely glaze"})),
            record(json!({"id": "r2", "artisanId": "a2", "rating": 5})),
            record(json!({"id": "r3", "artisanId": "a3", "rating": 3})),
        ],
    }
}

/// Wraps the in-memory store, records every call and fails chosen ids.
#[derive(Clone, Default)]
struct RecordingStore {
    inner: InMemoryStore,
    calls: Arc<Mutex<Vec<String>>>,
    failing_upserts: HashSet<String>,
    failing_deletes: HashSet<String>,
    failing_lists: HashSet<Collection>,
}

impl RecordingStore {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn upsert(&self, collection: Collection, id: &str, record: &Record) -> Result<()> {
        self.log(format!("upsert {}/{}", collection, id));
        if self.failing_upserts.contains(id) {
            return Err(SyncError::Store {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        self.inner.upsert(collection, id, record).await
    }

    async fn list_all(&self, collection: Collection) -> Result<Vec<Document>> {
        self.log(format!("list {}", collection));
        if self.failing_lists.contains(&collection) {
            return Err(SyncError::Store {
                status: 500,
                message: "listing failed".to_string(),
            });
        }
        self.inner.list_all(collection).await
    }

    async fn delete(&self, reference: &DocumentRef) -> Result<()> {
        self.log(format!("delete {}", reference));
        if self.failing_deletes.contains(&reference.id) {
            return Err(SyncError::Store {
                status: 409,
                message: "aborted".to_string(),
            });
        }
        self.inner.delete(reference).await
    }
}

async fn run_to_string<S: DocumentStore>(engine: &SyncEngine<S>, command: Command) -> String {
    let mut out = Vec::new();
    engine.run(command, &mut out).await;
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn test_add_artisans_stores_fields_verbatim_and_is_idempotent() {
    let store = InMemoryStore::new();
    let datasets = sample_datasets();
    let engine = SyncEngine::new(store.clone(), datasets.clone());

    engine.run(Command::AddArtisans, &mut std::io::sink()).await;
    let first: Vec<Document> = store.list_all(Collection::Artisans).await.unwrap();

    engine.run(Command::AddArtisans, &mut std::io::sink()).await;
    let second = store.list_all(Collection::Artisans).await.unwrap();

    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 3);
    for artisan in &datasets.artisans {
        let id = artisan.id().unwrap();
        let stored = store
            .get(&DocumentRef::new(Collection::Artisans, id))
            .await
            .unwrap();
        assert_eq!(&stored.record, artisan);
    }
    let first_records: Vec<&Record> = first.iter().map(|d| &d.record).collect();
    let second_records: Vec<&Record> = second.iter().map(|d| &d.record).collect();
    assert_eq!(first_records, second_records);
}

#[tokio::test]
async fn test_artisans_command_leaves_reviews_untouched() {
    let store = RecordingStore::default();
    store
        .inner
        .insert(Collection::Reviews, record(json!({"id": "old", "rating": 1})))
        .await
        .unwrap();
    let engine = SyncEngine::new(store.clone(), sample_datasets());

    engine.run(Command::AddArtisans, &mut std::io::sink()).await;

    assert!(store.calls().iter().all(|call| call.starts_with("upsert artisans/")));
    assert_eq!(store.inner.count(Collection::Artisans).await, 3);
    assert_eq!(store.inner.count(Collection::Reviews).await, 1);
}

#[tokio::test]
async fn test_add_runs_artisans_before_reviews_in_input_order() {
    let store = RecordingStore::default();
    let engine = SyncEngine::new(store.clone(), sample_datasets());

    engine.run(Command::AddAll, &mut std::io::sink()).await;

    assert_eq!(
        store.calls(),
        vec![
            "upsert artisans/a1",
            "upsert artisans/a2",
            "upsert artisans/a3",
            "upsert reviews/r1",
            "upsert reviews/r2",
            "upsert reviews/r3",
        ]
    );
}

#[tokio::test]
async fn test_failed_record_does_not_stop_the_rest() {
    let datasets = Datasets {
        artisans: (1..=5)
            .map(|i| record(json!({"id": format!("a{}", i), "name": format!("Artisan {}", i)})))
            .collect(),
        reviews: vec![],
    };
    let store = RecordingStore {
        failing_upserts: HashSet::from(["a3".to_string()]),
        ..Default::default()
    };
    let engine = SyncEngine::new(store.clone(), datasets);

    let report = engine.add_artisans().await;

    assert_eq!(report.attempted, 5);
    assert_eq!(report.succeeded, 4);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].label, "Artisan 3");
    assert!(store.calls().contains(&"upsert artisans/a4".to_string()));
    assert!(store.calls().contains(&"upsert artisans/a5".to_string()));
    assert!(store
        .inner
        .get(&DocumentRef::new(Collection::Artisans, "a5"))
        .await
        .is_some());
}

#[tokio::test]
async fn test_delete_all_empties_both_collections() {
    let store = RecordingStore::default();
    let engine = SyncEngine::new(store.clone(), sample_datasets());
    engine.run(Command::AddAll, &mut std::io::sink()).await;

    let report = engine.delete_all().await;

    assert!(report.is_clean());
    assert_eq!(report.phases[0].collection, Collection::Reviews);
    assert_eq!(report.phases[0].deleted, 3);
    assert_eq!(report.phases[1].collection, Collection::Artisans);
    assert_eq!(report.phases[1].deleted, 3);
    assert_eq!(store.inner.count(Collection::Reviews).await, 0);
    assert_eq!(store.inner.count(Collection::Artisans).await, 0);

    let calls = store.calls();
    let list_reviews = calls.iter().position(|c| c == "list reviews").unwrap();
    let list_artisans = calls.iter().position(|c| c == "list artisans").unwrap();
    let last_review_delete = calls
        .iter()
        .rposition(|c| c.starts_with("delete reviews/"))
        .unwrap();
    assert!(list_reviews < last_review_delete);
    assert!(last_review_delete < list_artisans);
}

#[tokio::test]
async fn test_failed_review_phase_still_clears_artisans() {
    let store = RecordingStore {
        failing_deletes: HashSet::from(["r2".to_string()]),
        ..Default::default()
    };
    let engine = SyncEngine::new(store.clone(), sample_datasets());
    engine.run(Command::AddAll, &mut std::io::sink()).await;

    let report = engine.delete_all().await;

    assert!(!report.is_clean());
    let reviews = &report.phases[0];
    assert_eq!(reviews.failures.len(), 1);
    assert_eq!(reviews.failures[0].label, "r2");
    // The other dispatched deletes still settled.
    assert_eq!(reviews.deleted, 2);
    assert_eq!(store.inner.count(Collection::Reviews).await, 1);
    assert_eq!(store.inner.count(Collection::Artisans).await, 0);
}

#[tokio::test]
async fn test_failed_review_listing_still_clears_artisans() {
    let store = RecordingStore {
        failing_lists: HashSet::from([Collection::Reviews]),
        ..Default::default()
    };
    let engine = SyncEngine::new(store.clone(), sample_datasets());
    engine.add_artisans().await;

    let report = engine.delete_all().await;

    assert!(report.phases[0].list_error.is_some());
    assert!(report.phases[1].is_clean());
    assert_eq!(store.inner.count(Collection::Artisans).await, 0);
}

#[tokio::test]
async fn test_show_prints_artisans_and_average() {
    let store = InMemoryStore::new();
    let engine = SyncEngine::new(store, sample_datasets());
    engine.run(Command::AddAll, &mut std::io::sink()).await;

    let output = run_to_string(&engine, Command::Show).await;

    assert!(output.contains("Artisans: 3"));
    assert!(output.contains("- Salma (pottery) - rating: 4.5/5"));
    assert!(output.contains("- Omar (woodwork) - rating: 4/5"));
    assert!(output.contains("Reviews: 3"));
    assert!(output.contains("Average rating: 4.00/5"));
}

#[tokio::test]
async fn test_show_rounds_half_average_up() {
    let reviews = [5, 5, 5, 5, 4, 4, 4, 1]
        .iter()
        .enumerate()
        .map(|(i, rating)| record(json!({"id": format!("r{}", i), "rating": rating})))
        .collect();
    let datasets = Datasets {
        artisans: vec![],
        reviews,
    };
    let engine = SyncEngine::new(InMemoryStore::new(), datasets);
    engine.run(Command::AddReviews, &mut std::io::sink()).await;

    let output = run_to_string(&engine, Command::Show).await;

    assert!(output.contains("Reviews: 8"));
    assert!(output.contains("Average rating: 4.13/5"), "got: {}", output);
}

#[tokio::test]
async fn test_broken_stdout_does_not_abort_the_command() {
    struct BrokenPipe;

    impl std::io::Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let store = RecordingStore::default();
    let engine = SyncEngine::new(store.clone(), sample_datasets());
    engine.run(Command::AddAll, &mut std::io::sink()).await;

    engine.run(Command::Show, &mut BrokenPipe).await;

    assert!(store.calls().contains(&"list artisans".to_string()));
    assert_eq!(store.inner.count(Collection::Reviews).await, 3);
}

#[tokio::test]
async fn test_show_with_no_reviews_has_no_average() {
    let datasets = Datasets {
        reviews: vec![],
        ..sample_datasets()
    };
    let engine = SyncEngine::new(InMemoryStore::new(), datasets);
    engine.run(Command::AddAll, &mut std::io::sink()).await;

    let output = run_to_string(&engine, Command::Show).await;

    assert!(output.contains("Reviews: 0"));
    assert!(!output.contains("Average"));
}

#[tokio::test]
async fn test_show_stops_at_read_failure() {
    let store = RecordingStore {
        failing_lists: HashSet::from([Collection::Reviews]),
        ..Default::default()
    };
    let engine = SyncEngine::new(store, sample_datasets());
    engine.add_artisans().await;

    let output = run_to_string(&engine, Command::Show).await;

    assert!(output.contains("Artisans: 3"));
    assert!(!output.contains("Reviews"));
}

#[tokio::test]
async fn test_unknown_command_prints_usage_without_store_calls() {
    let store = RecordingStore::default();
    let engine = SyncEngine::new(store.clone(), sample_datasets());

    let output = run_to_string(&engine, Command::from_token(Some("bogus"))).await;

    assert!(output.starts_with("Usage: artisan-sync"));
    assert!(store.calls().is_empty());
}
