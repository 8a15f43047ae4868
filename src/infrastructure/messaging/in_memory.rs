use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    application::services::dispatch_bus::DispatchBus,
    domain::events::{ChunkJob, SendJob},
};

/// Both lanes backed by in-process queues. Stands in for JetStream in tests
/// and broker-less local runs; callers drain the lanes explicitly.
#[derive(Default)]
pub struct InProcessDispatchBus {
    chunks: Mutex<VecDeque<ChunkJob>>,
    sends: Mutex<VecDeque<SendJob>>,
}

impl InProcessDispatchBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn pop_chunk(&self) -> Option<ChunkJob> {
        self.chunks.lock().await.pop_front()
    }

    pub async fn pop_send(&self) -> Option<SendJob> {
        self.sends.lock().await.pop_front()
    }

    pub async fn chunk_backlog(&self) -> usize {
        self.chunks.lock().await.len()
    }

    pub async fn send_backlog(&self) -> usize {
        self.sends.lock().await.len()
    }
}

#[async_trait]
impl DispatchBus for InProcessDispatchBus {
    async fn publish_chunk(&self, job: ChunkJob) -> anyhow::Result<()> {
        self.chunks.lock().await.push_back(job);
        Ok(())
    }

    async fn publish_send(&self, job: SendJob) -> anyhow::Result<()> {
        self.sends.lock().await.push_back(job);
        Ok(())
    }
}
