pub mod command;
pub mod datasets;
pub mod sync;

pub use crate::domain::model::{Collection, Datasets, Document, DocumentRef, Record, ServiceAccount};
pub use crate::domain::ports::{ConfigProvider, DocumentStore, Storage};
pub use crate::utils::error::Result;
