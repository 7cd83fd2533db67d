use async_trait::async_trait;

use crate::error::Result;
use crate::models::PartyReplier;

// Expose the DynamoDB store module
pub mod dynamo;

/// ReplierStore trait defining the interface for reply storage implementations
#[async_trait]
pub trait ReplierStore: Send + Sync + 'static {
    /// Creates a new replier record, failing with `Conflict` if the id is taken
    async fn create_replier(&self, replier: PartyReplier) -> Result<PartyReplier>;

    /// Gets a replier record by ID
    async fn get_replier(&self, id: &str) -> Result<PartyReplier>;

    /// Gets all replier records owned by a user
    async fn get_repliers_by_owner(&self, owner_id: &str) -> Result<Vec<PartyReplier>>;

    /// Gets all replier records where the user appears in any reply list
    async fn get_repliers_by_participant(&self, user_id: &str) -> Result<Vec<PartyReplier>>;

    /// Replaces a stored replier record and stamps its update time.
    ///
    /// `read_at` is the `updated_at` value the caller read; the write fails
    /// with `Conflict` if the stored record has changed since.
    async fn update_replier(&self, replier: PartyReplier, read_at: &str) -> Result<PartyReplier>;

    /// Deletes a replier record
    async fn delete_replier(&self, id: &str) -> Result<()>;
}
