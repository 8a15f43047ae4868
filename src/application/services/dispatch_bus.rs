use async_trait::async_trait;

use crate::domain::events::{ChunkJob, SendJob};

/// Durable, at-least-once work queue with two independent lanes. The chunk
/// lane carries recipient-set slices awaiting expansion; the send lane
/// carries single-recipient deliveries, isolated so the rate-limited
/// external API cannot starve other background work.
#[async_trait]
pub trait DispatchBus: Send + Sync {
    async fn publish_chunk(&self, job: ChunkJob) -> anyhow::Result<()>;
    async fn publish_send(&self, job: SendJob) -> anyhow::Result<()>;
}
