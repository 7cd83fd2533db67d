use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::now_str;

/// Bookkeeping fields shared by every stored document.
///
/// Records embed this by value and flatten it onto the wire, so a stored
/// document carries `id`, `createdAt` and `updatedAt` next to its own fields.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CollectionObject {
    pub id: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

impl CollectionObject {
    pub fn new() -> Self {
        let now = now_str();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = now_str();
    }
}

impl Default for CollectionObject {
    fn default() -> Self {
        Self::new()
    }
}
