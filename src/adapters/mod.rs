// Adapters layer: concrete document stores behind the DocumentStore port.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::InMemoryStore;
