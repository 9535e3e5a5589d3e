use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::id::Id;

/// A single user's choice in a single survey. Votes are never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: Id,
    pub survey_id: Id,
    pub user_id: Id,
    pub option_id: Id,
    pub created_at: DateTime<Utc>,
}

/// Request body for casting a vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub option_id: Id,
}
