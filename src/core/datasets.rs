use crate::config::settings::DataPaths;
use crate::domain::model::{ArtisanDataset, Datasets, ReviewDataset};
use crate::domain::ports::Storage;
use crate::utils::error::{Result, SyncError};
use serde::de::DeserializeOwned;

/// Reads both dataset files. Any failure here is fatal for the run.
pub async fn load_datasets<S: Storage>(storage: &S, paths: &DataPaths) -> Result<Datasets> {
    let artisans: ArtisanDataset = read_json(storage, &paths.artisans).await?;
    let reviews: ReviewDataset = read_json(storage, &paths.reviews).await?;

    tracing::info!(
        "📂 Loaded {} artisans from {} and {} reviews from {}",
        artisans.artisans.len(),
        paths.artisans,
        reviews.reviews.len(),
        paths.reviews
    );

    Ok(Datasets {
        artisans: artisans.artisans,
        reviews: reviews.reviews,
    })
}

async fn read_json<S: Storage, T: DeserializeOwned>(storage: &S, path: &str) -> Result<T> {
    let bytes = storage
        .read_file(path)
        .await
        .map_err(|e| SyncError::DatasetError {
            path: path.to_string(),
            message: e.to_string(),
        })?;

    serde_json::from_slice(&bytes).map_err(|e| SyncError::DatasetError {
        path: path.to_string(),
        message: e.to_string(),
    })
}
