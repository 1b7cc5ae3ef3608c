pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{FirestoreStore, InMemoryStore};
pub use config::cli::LocalStorage;
pub use crate::core::{command::Command, datasets::load_datasets, sync::SyncEngine};
pub use utils::error::{Result, SyncError};
