use chrono::Utc;
use serde::{Deserialize, Serialize};

mod collection;
mod replier;

pub use collection::CollectionObject;
pub use replier::{PartyReplier, ReplyChange, ReplyState, ReplyTally};

// Request DTOs
#[derive(Deserialize, Debug, Default)]
pub struct CreateReplierRequest {
    #[serde(rename = "usersAgreed", default)]
    pub users_agreed: Vec<String>,
    #[serde(rename = "usersInThought", default)]
    pub users_in_thought: Vec<String>,
    #[serde(rename = "usersRefused", default)]
    pub users_refused: Vec<String>,
}

#[derive(Deserialize, Debug)]
pub struct ReplyRequest {
    pub state: ReplyState,
}

// Response DTOs for general use across services
#[derive(Serialize, Debug)]
pub struct ReplyResponse {
    pub message: String,
    pub state: Option<ReplyState>,
    pub replier: PartyReplier,
}

#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

// Helper function to get current timestamp as string
pub fn now_str() -> String {
    Utc::now().to_rfc3339()
}
