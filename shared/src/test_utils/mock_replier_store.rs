use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{Result, ServiceError};
use crate::models::PartyReplier;
use crate::store::dynamo::check_indexable;
use crate::store::ReplierStore;

/// In-memory implementation of ReplierStore for testing
#[derive(Default)]
pub struct MockReplierStore {
    repliers: RwLock<HashMap<String, PartyReplier>>,
    error_mode: bool,
}

impl MockReplierStore {
    /// Create a new empty MockReplierStore
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a MockReplierStore with initial data
    pub fn with_data(repliers: Vec<PartyReplier>) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.repliers.write() {
            for replier in repliers {
                map.insert(replier.base.id.clone(), replier);
            }
        }
        store
    }

    /// Create a new MockReplierStore where every operation fails
    pub fn new_error() -> Self {
        Self {
            repliers: RwLock::new(HashMap::new()),
            error_mode: true,
        }
    }

    fn check_error_mode(&self) -> Result<()> {
        if self.error_mode {
            return Err(ServiceError::InternalError("Mock store in error mode".into()));
        }
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, PartyReplier>>> {
        self.check_error_mode()?;
        self.repliers
            .read()
            .map_err(|_| ServiceError::InternalError("Failed to acquire read lock".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, PartyReplier>>> {
        self.check_error_mode()?;
        self.repliers
            .write()
            .map_err(|_| ServiceError::InternalError("Failed to acquire write lock".into()))
    }
}

#[async_trait]
impl ReplierStore for MockReplierStore {
    async fn create_replier(&self, replier: PartyReplier) -> Result<PartyReplier> {
        check_indexable(&replier)?;
        let mut repliers = self.write()?;
        if repliers.contains_key(replier.id()) {
            return Err(ServiceError::Conflict(format!(
                "Replier with ID {} already exists",
                replier.id()
            )));
        }
        repliers.insert(replier.base.id.clone(), replier.clone());
        Ok(replier)
    }

    async fn get_replier(&self, id: &str) -> Result<PartyReplier> {
        self.read()?
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("Replier not found: {}", id)))
    }

    async fn get_repliers_by_owner(&self, owner_id: &str) -> Result<Vec<PartyReplier>> {
        Ok(self
            .read()?
            .values()
            .filter(|replier| replier.is_owned_by(owner_id))
            .cloned()
            .collect())
    }

    async fn get_repliers_by_participant(&self, user_id: &str) -> Result<Vec<PartyReplier>> {
        Ok(self
            .read()?
            .values()
            .filter(|replier| replier.has_participant(user_id))
            .cloned()
            .collect())
    }

    async fn update_replier(&self, mut replier: PartyReplier, read_at: &str) -> Result<PartyReplier> {
        check_indexable(&replier)?;
        let mut repliers = self.write()?;
        let stored = repliers.get(replier.id()).ok_or_else(|| {
            ServiceError::NotFound(format!("Replier not found: {}", replier.id()))
        })?;
        if stored.base.updated_at != read_at {
            return Err(ServiceError::Conflict(format!(
                "Replier {} was modified concurrently",
                replier.id()
            )));
        }
        replier.base.touch();
        repliers.insert(replier.base.id.clone(), replier.clone());
        Ok(replier)
    }

    async fn delete_replier(&self, id: &str) -> Result<()> {
        self.write()?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ServiceError::NotFound(format!("Replier not found: {}", id)))
    }
}
