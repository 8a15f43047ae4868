use std::sync::Arc;
use std::time::Duration;

use async_nats::jetstream::{
    self,
    consumer::{AckPolicy, PullConsumer, pull},
};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{error, warn};

use crate::{
    application::{
        handlers::{chunk_expander::ChunkExpandHandler, delivery::DeliveryHandler},
        services::{backoff::BackoffPolicy, dispatch_bus::DispatchBus},
    },
    domain::{
        errors::DeliveryError,
        events::{ChunkJob, SendJob},
    },
};

/// One queue lane: its own stream, durable pull consumer, and worker
/// concurrency. The send lane's `concurrency` bound is the only throttle in
/// front of the external API.
#[derive(Clone)]
pub struct LaneConfig {
    pub stream: String,
    pub subject: String,
    pub durable: String,
    pub pull_batch: usize,
    pub ack_wait_seconds: u64,
    pub max_deliver: i64,
    pub concurrency: usize,
}

#[derive(Clone)]
pub struct JetstreamConfig {
    pub url: String,
    pub chunk_lane: LaneConfig,
    pub send_lane: LaneConfig,
}

pub struct JetstreamBus {
    context: jetstream::Context,
    chunk_subject: String,
    send_subject: String,
}

impl JetstreamBus {
    pub async fn connect(
        config: &JetstreamConfig,
        backoff: BackoffPolicy,
    ) -> anyhow::Result<(Arc<Self>, ChunkLaneWorker, SendLaneWorker)> {
        let client = async_nats::connect(&config.url).await?;
        let context = jetstream::new(client);

        let chunk_consumer = Self::lane_consumer(&context, &config.chunk_lane).await?;
        let send_consumer = Self::lane_consumer(&context, &config.send_lane).await?;

        let bus = Arc::new(Self {
            context: context.clone(),
            chunk_subject: config.chunk_lane.subject.clone(),
            send_subject: config.send_lane.subject.clone(),
        });

        let chunk_worker = ChunkLaneWorker {
            consumer: chunk_consumer,
            lane: config.chunk_lane.clone(),
        };
        let send_worker = SendLaneWorker {
            consumer: send_consumer,
            lane: config.send_lane.clone(),
            backoff,
        };

        Ok((bus, chunk_worker, send_worker))
    }

    async fn lane_consumer(
        context: &jetstream::Context,
        lane: &LaneConfig,
    ) -> anyhow::Result<PullConsumer> {
        let stream = context
            .get_or_create_stream(jetstream::stream::Config {
                name: lane.stream.clone(),
                subjects: vec![lane.subject.clone()],
                ..Default::default()
            })
            .await?;

        let consumer = stream
            .get_or_create_consumer(
                &lane.durable,
                pull::Config {
                    durable_name: Some(lane.durable.clone()),
                    ack_policy: AckPolicy::Explicit,
                    ack_wait: Duration::from_secs(lane.ack_wait_seconds),
                    max_deliver: lane.max_deliver,
                    ..Default::default()
                },
            )
            .await?;

        Ok(consumer)
    }
}

#[async_trait::async_trait]
impl DispatchBus for JetstreamBus {
    async fn publish_chunk(&self, job: ChunkJob) -> anyhow::Result<()> {
        let payload = serde_json::to_vec(&job)?;
        self.context
            .publish(self.chunk_subject.clone(), payload.into())
            .await?;
        Ok(())
    }

    async fn publish_send(&self, job: SendJob) -> anyhow::Result<()> {
        let payload = serde_json::to_vec(&job)?;
        self.context
            .publish(self.send_subject.clone(), payload.into())
            .await?;
        Ok(())
    }
}

async fn ack(message: &jetstream::Message) -> anyhow::Result<()> {
    message
        .ack()
        .await
        .map_err(|e| anyhow::anyhow!("failed to ack message: {}", e))
}

/// Chunk-lane consumer loop: expansion is replayable, so failed jobs are
/// republished with an incremented attempt up to the lane's delivery cap.
pub struct ChunkLaneWorker {
    consumer: PullConsumer,
    lane: LaneConfig,
}

impl ChunkLaneWorker {
    pub fn spawn(
        self,
        handler: Arc<ChunkExpandHandler>,
        bus: Arc<JetstreamBus>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(err) = self.run(handler, bus).await {
                error!("chunk lane worker stopped: {err:?}");
            }
        })
    }

    async fn run(
        self,
        handler: Arc<ChunkExpandHandler>,
        bus: Arc<JetstreamBus>,
    ) -> anyhow::Result<()> {
        let semaphore = Arc::new(Semaphore::new(self.lane.concurrency.max(1)));
        loop {
            let mut batch = self
                .consumer
                .batch()
                .max_messages(self.lane.pull_batch)
                .messages()
                .await?;
            while let Some(message) = batch.next().await {
                match message {
                    Ok(msg) => {
                        let permit = semaphore.clone().acquire_owned().await?;
                        let handler = handler.clone();
                        let bus = bus.clone();
                        let max_attempts = self.lane.max_deliver;
                        tokio::spawn(async move {
                            let _permit = permit;
                            if let Err(err) =
                                process_chunk_message(msg, handler, bus, max_attempts).await
                            {
                                error!("failed to process chunk job: {err:?}");
                            }
                        });
                    }
                    Err(err) => {
                        error!("chunk lane batch error: {err:?}");
                    }
                }
            }
        }
    }
}

async fn process_chunk_message(
    message: jetstream::Message,
    handler: Arc<ChunkExpandHandler>,
    bus: Arc<JetstreamBus>,
    max_attempts: i64,
) -> anyhow::Result<()> {
    let job: ChunkJob = serde_json::from_slice(&message.payload)?;
    match handler.handle(job.clone()).await {
        Ok(()) => ack(&message).await,
        Err(DeliveryError::Validation(reason)) => {
            warn!(campaign_id = %job.campaign_id, %reason, "dropping invalid chunk job");
            ack(&message).await
        }
        Err(err) => {
            if i64::from(job.attempt) >= max_attempts {
                error!(
                    campaign_id = %job.campaign_id,
                    attempt = job.attempt,
                    "chunk expansion failed terminally: {err:?}"
                );
            } else {
                let mut next = job;
                next.attempt += 1;
                bus.publish_chunk(next).await?;
            }
            ack(&message).await
        }
    }
}

/// Send-lane consumer loop. The handler settles outcomes; this loop only
/// decides between ack and a delayed requeue for transient failures.
pub struct SendLaneWorker {
    consumer: PullConsumer,
    lane: LaneConfig,
    backoff: BackoffPolicy,
}

impl SendLaneWorker {
    pub fn spawn(self, handler: Arc<DeliveryHandler>, bus: Arc<JetstreamBus>) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(err) = self.run(handler, bus).await {
                error!("send lane worker stopped: {err:?}");
            }
        })
    }

    async fn run(
        self,
        handler: Arc<DeliveryHandler>,
        bus: Arc<JetstreamBus>,
    ) -> anyhow::Result<()> {
        let semaphore = Arc::new(Semaphore::new(self.lane.concurrency.max(1)));
        loop {
            let mut batch = self
                .consumer
                .batch()
                .max_messages(self.lane.pull_batch)
                .messages()
                .await?;
            while let Some(message) = batch.next().await {
                match message {
                    Ok(msg) => {
                        let permit = semaphore.clone().acquire_owned().await?;
                        let handler = handler.clone();
                        let bus = bus.clone();
                        let backoff = self.backoff;
                        tokio::spawn(async move {
                            let _permit = permit;
                            if let Err(err) =
                                process_send_message(msg, handler, bus, backoff).await
                            {
                                error!("failed to process send job: {err:?}");
                            }
                        });
                    }
                    Err(err) => {
                        error!("send lane batch error: {err:?}");
                    }
                }
            }
        }
    }
}

async fn process_send_message(
    message: jetstream::Message,
    handler: Arc<DeliveryHandler>,
    bus: Arc<JetstreamBus>,
    backoff: BackoffPolicy,
) -> anyhow::Result<()> {
    let job: SendJob = serde_json::from_slice(&message.payload)?;
    match handler.handle(job.clone()).await {
        Ok(()) => ack(&message).await,
        Err(DeliveryError::Transient(reason)) if job.attempts_left() => {
            let delay = backoff.delay_for(job.attempt);
            warn!(
                campaign_id = %job.campaign_id,
                recipient_id = %job.recipient_id,
                attempt = job.attempt,
                delay_secs = delay.as_secs(),
                %reason,
                "requeueing send job after backoff"
            );
            let next = job.next_attempt();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Err(err) = bus.publish_send(next).await {
                    error!("failed to requeue send job: {err:?}");
                }
            });
            ack(&message).await
        }
        Err(err) => {
            // Permanent, validation, or exhausted transient: the handler has
            // already settled the outcome.
            warn!(
                campaign_id = %job.campaign_id,
                recipient_id = %job.recipient_id,
                attempt = job.attempt,
                "send job dropped: {err}"
            );
            ack(&message).await
        }
    }
}
