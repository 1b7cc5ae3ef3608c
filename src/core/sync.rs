use crate::core::command::{Command, USAGE};
use crate::domain::model::{
    average_rating, round_to_hundredths, AddReport, Collection, DeletePhase, DeleteReport,
    Datasets, Document, ItemFailure, Record,
};
use crate::domain::ports::DocumentStore;
use crate::utils::error::{Result, SyncError};
use futures_util::future::join_all;
use std::io::Write;

/// Runs the data-sync commands against an explicitly supplied store.
pub struct SyncEngine<S: DocumentStore> {
    store: S,
    datasets: Datasets,
}

impl<S: DocumentStore> SyncEngine<S> {
    pub fn new(store: S, datasets: Datasets) -> Self {
        Self { store, datasets }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Executes one command. Store failures and failures to write to `out`
    /// (a closed pipe, say) are logged and absorbed.
    pub async fn run<W: Write>(&self, command: Command, out: &mut W) {
        tracing::debug!("Dispatching command '{}'", command);

        match command {
            Command::AddAll => {
                self.add_artisans().await;
                self.add_reviews().await;
            }
            Command::AddArtisans => {
                self.add_artisans().await;
            }
            Command::AddReviews => {
                self.add_reviews().await;
            }
            Command::DeleteAll => {
                self.delete_all().await;
            }
            Command::Show => {
                if let Err(e) = self.show(out).await {
                    tracing::error!("❌ Could not write the listing: {}", e);
                }
            }
            Command::Usage => {
                if let Err(e) = out.write_all(USAGE.as_bytes()) {
                    tracing::error!("❌ Could not write usage: {}", e);
                }
            }
        }
    }

    pub async fn add_artisans(&self) -> AddReport {
        tracing::info!("🚀 Adding artisans...");
        let report = self
            .add(Collection::Artisans, &self.datasets.artisans, |record| {
                record.name().or_else(|| record.id()).unwrap_or("<unnamed>")
            })
            .await;
        log_add_summary(&report);
        report
    }

    pub async fn add_reviews(&self) -> AddReport {
        tracing::info!("🚀 Adding reviews...");
        let report = self
            .add(Collection::Reviews, &self.datasets.reviews, |record| {
                record.id().unwrap_or("<no id>")
            })
            .await;
        log_add_summary(&report);
        report
    }

    /// Upserts records one at a time, in input order. A failed record is
    /// logged and skipped.
    async fn add<'r, F>(&self, collection: Collection, records: &'r [Record], label_of: F) -> AddReport
    where
        F: Fn(&'r Record) -> &'r str,
    {
        let mut report = AddReport::new(collection);

        for record in records {
            report.attempted += 1;
            let label = label_of(record);

            let result = match record.id() {
                Some(id) => self.store.upsert(collection, id, record).await,
                None => Err(SyncError::MissingIdentifier {
                    collection: collection.to_string(),
                    label: label.to_string(),
                }),
            };

            match result {
                Ok(()) => {
                    report.succeeded += 1;
                    tracing::info!("✅ Added {} '{}'", collection, label);
                }
                Err(e) => {
                    tracing::error!("❌ Failed to add {} '{}': {}", collection, label, e);
                    report.failures.push(ItemFailure {
                        label: label.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }

    /// Clears `reviews`, then `artisans`. A failing phase does not stop the
    /// next one.
    pub async fn delete_all(&self) -> DeleteReport {
        tracing::info!("🗑️ Deleting all data...");

        let mut phases = Vec::with_capacity(2);
        for collection in [Collection::Reviews, Collection::Artisans] {
            phases.push(self.delete_collection(collection).await);
        }

        let report = DeleteReport { phases };
        if report.is_clean() {
            tracing::info!("🎉 All data deleted");
        } else {
            tracing::warn!("⚠️ Delete finished with errors");
        }
        report
    }

    async fn delete_collection(&self, collection: Collection) -> DeletePhase {
        let mut phase = DeletePhase {
            collection,
            list_error: None,
            deleted: 0,
            failures: Vec::new(),
        };

        let documents = match self.store.list_all(collection).await {
            Ok(documents) => documents,
            Err(e) => {
                tracing::error!("❌ Could not list {}: {}", collection, e);
                phase.list_error = Some(e.to_string());
                return phase;
            }
        };

        // Every delete is dispatched at once and allowed to settle.
        let results = join_all(
            documents
                .iter()
                .map(|document| self.store.delete(&document.reference)),
        )
        .await;

        for (document, result) in documents.iter().zip(results) {
            match result {
                Ok(()) => phase.deleted += 1,
                Err(e) => phase.failures.push(ItemFailure {
                    label: document.reference.id.clone(),
                    error: e.to_string(),
                }),
            }
        }

        if phase.failures.is_empty() {
            tracing::info!("✅ Deleted {} {}", phase.deleted, collection);
        } else {
            tracing::error!(
                "❌ Deleting {} failed for {} of {} documents (first error: {})",
                collection,
                phase.failures.len(),
                documents.len(),
                phase.failures[0].error
            );
        }
        phase
    }

    /// Prints the artisans and the review count and average. A read error is
    /// logged and nothing further is printed.
    pub async fn show<W: Write>(&self, out: &mut W) -> Result<()> {
        tracing::info!("📊 Reading stored data...");

        let artisans = match self.store.list_all(Collection::Artisans).await {
            Ok(documents) => documents,
            Err(e) => {
                tracing::error!("❌ Could not read artisans: {}", e);
                return Ok(());
            }
        };
        writeln!(out)?;
        writeln!(out, "👥 Artisans: {}", artisans.len())?;
        for document in &artisans {
            writeln!(out, "{}", artisan_line(document))?;
        }

        let reviews = match self.store.list_all(Collection::Reviews).await {
            Ok(documents) => documents,
            Err(e) => {
                tracing::error!("❌ Could not read reviews: {}", e);
                return Ok(());
            }
        };
        writeln!(out)?;
        writeln!(out, "⭐ Reviews: {}", reviews.len())?;

        if let Some(average) = average_rating(reviews.iter().map(|document| &document.record)) {
            writeln!(out, "📈 Average rating: {:.2}/5", round_to_hundredths(average))?;
        }

        Ok(())
    }
}

fn artisan_line(document: &Document) -> String {
    let record = &document.record;
    let rating = record
        .data
        .get("rating")
        .map(|value| match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| "-".to_string());

    format!(
        "- {} ({}) - rating: {}/5",
        record.name().unwrap_or(&document.reference.id),
        record.craft_type().unwrap_or("?"),
        rating
    )
}

fn log_add_summary(report: &AddReport) {
    if report.failures.is_empty() {
        tracing::info!(
            "🎉 Added all {} {}",
            report.succeeded,
            report.collection
        );
    } else {
        tracing::warn!(
            "⚠️ Added {} of {} {}; {} failed",
            report.succeeded,
            report.attempted,
            report.collection,
            report.failures.len()
        );
    }
}
