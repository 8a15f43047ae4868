use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::BroadcastContent;

/// Chunk-lane job: a bounded slice of a campaign's recipient set, carrying
/// the content snapshot taken when the campaign was dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkJob {
    pub job_id: Uuid,
    pub campaign_id: Uuid,
    pub recipient_ids: Vec<Uuid>,
    pub content: BroadcastContent,
    pub attempt: u32,
}

/// Send-lane job: one recipient, one delivery attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendJob {
    pub job_id: Uuid,
    pub campaign_id: Uuid,
    pub recipient_id: Uuid,
    pub chat_id: i64,
    pub content: BroadcastContent,
    pub attempt: u32,
    pub max_attempts: u32,
}

impl SendJob {
    pub fn next_attempt(&self) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            attempt: self.attempt + 1,
            ..self.clone()
        }
    }

    pub fn attempts_left(&self) -> bool {
        self.attempt < self.max_attempts
    }
}
