pub mod convert;
pub mod dynamo;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::user::{User, UserKey};
use crate::patch::assembler::Patch;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no record found for user '{0}'")]
    NotFound(String),

    #[error("failed to marshal record: {0}")]
    Marshal(String),

    #[error("storage request failed: {0}")]
    Request(String),
}

/// The storage collaborator. Constructor-injected into handlers so tests
/// can swap in [`memory::MemoryStore`]; the diff/patch engine never reaches
/// through this seam. Retries, if wanted, belong to implementations.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn fetch_by_key(&self, key: &UserKey) -> Result<User, StorageError>;
    async fn create(&self, user: &User) -> Result<(), StorageError>;
    async fn apply_patch(&self, key: &UserKey, patch: &Patch) -> Result<(), StorageError>;
    async fn delete(&self, key: &UserKey) -> Result<(), StorageError>;
}
