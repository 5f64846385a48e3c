// Resume document store: draft editing, the saved collection, persistence
// and JSON Resume export. Handlers expose the store over HTTP.

pub mod document_store;
pub mod export;
pub mod handlers;
pub mod storage;

pub use document_store::{ResumeStore, StoreError, StoreOptions};
pub use storage::{FileStorage, MemoryStorage, ResumeStorage, StorageError};
