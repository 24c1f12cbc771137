//! Persistence boundary for completed scans.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::scan::ScanResponse;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[async_trait]
pub trait ScanRepository: Send + Sync {
    async fn save(&self, scan: &ScanResponse) -> Result<(), RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScanResponse>, RepoError>;
}

/// Process-local repository, last write per uuid wins.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScanRepository {
    scans: Arc<DashMap<Uuid, ScanResponse>>,
}

impl InMemoryScanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.scans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }
}

#[async_trait]
impl ScanRepository for InMemoryScanRepository {
    async fn save(&self, scan: &ScanResponse) -> Result<(), RepoError> {
        let id = scan.uuid.ok_or_else(|| RepoError::InvalidInput {
            message: "scan has no uuid".to_string(),
        })?;
        self.scans.insert(id, scan.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScanResponse>, RepoError> {
        Ok(self.scans.get(&id).map(|entry| entry.value().clone()))
    }
}
