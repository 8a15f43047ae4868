use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use broadcast::{
    application::{
        handlers::{chunk_expander::ChunkExpandHandler, delivery::DeliveryHandler},
        services::{dispatch_bus::DispatchBus, sender::MessageSender},
        usecases::{
            dispatch_draft::{DispatchConfig, DispatchDraftUseCase},
            dispatch_scheduled::DispatchScheduledUseCase,
        },
    },
    domain::{
        errors::DeliveryError,
        models::{BroadcastContent, Campaign, CampaignStatus, DeliveryOutcome, Recipient},
        repositories::{CampaignStore, RecipientDirectory},
    },
    infrastructure::{
        messaging::in_memory::InProcessDispatchBus,
        repositories::in_memory::{InMemoryCampaignStore, InMemoryRecipientDirectory},
    },
};

#[derive(Clone, Copy)]
enum Step {
    Deliver,
    Transient,
    Permanent,
}

/// Sender stub with a per-chat script of outcomes; unscripted chats always
/// deliver. Records every accepted message body.
#[derive(Default)]
struct ScriptedSender {
    scripts: Mutex<HashMap<i64, VecDeque<Step>>>,
    calls: Mutex<HashMap<i64, u32>>,
    delivered: Mutex<Vec<(i64, String)>>,
}

impl ScriptedSender {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn script(&self, chat_id: i64, steps: &[Step]) {
        self.scripts
            .lock()
            .await
            .insert(chat_id, steps.iter().copied().collect());
    }

    async fn calls_for(&self, chat_id: i64) -> u32 {
        self.calls.lock().await.get(&chat_id).copied().unwrap_or(0)
    }

    async fn total_calls(&self) -> u32 {
        self.calls.lock().await.values().sum()
    }

    async fn delivered_bodies(&self) -> Vec<(i64, String)> {
        self.delivered.lock().await.clone()
    }
}

#[async_trait]
impl MessageSender for ScriptedSender {
    async fn send(&self, chat_id: i64, content: &BroadcastContent) -> Result<(), DeliveryError> {
        *self.calls.lock().await.entry(chat_id).or_insert(0) += 1;
        let step = self
            .scripts
            .lock()
            .await
            .get_mut(&chat_id)
            .and_then(|s| s.pop_front())
            .unwrap_or(Step::Deliver);
        match step {
            Step::Deliver => {
                self.delivered
                    .lock()
                    .await
                    .push((chat_id, content.body.clone()));
                Ok(())
            }
            Step::Transient => Err(DeliveryError::Transient("flood control".to_string())),
            Step::Permanent => Err(DeliveryError::Permanent("bot blocked by user".to_string())),
        }
    }
}

struct Harness {
    campaigns: Arc<InMemoryCampaignStore>,
    directory: Arc<InMemoryRecipientDirectory>,
    bus: Arc<InProcessDispatchBus>,
    sender: Arc<ScriptedSender>,
    chunk_handler: ChunkExpandHandler,
    delivery_handler: DeliveryHandler,
    dispatch_draft: DispatchDraftUseCase,
    dispatch_scheduled: DispatchScheduledUseCase,
}

impl Harness {
    fn new(chunk_size: usize, max_attempts: u32) -> Self {
        let campaigns = Arc::new(InMemoryCampaignStore::new());
        let directory = Arc::new(InMemoryRecipientDirectory::new());
        let bus = Arc::new(InProcessDispatchBus::new());
        let sender = ScriptedSender::new();
        let config = DispatchConfig { chunk_size };

        let chunk_handler = ChunkExpandHandler::new(
            campaigns.clone(),
            directory.clone(),
            bus.clone(),
            max_attempts,
        );
        let delivery_handler = DeliveryHandler::new(
            campaigns.clone(),
            directory.clone(),
            sender.clone(),
        );
        let dispatch_draft = DispatchDraftUseCase::new(
            campaigns.clone(),
            directory.clone(),
            bus.clone(),
            config,
        );
        let dispatch_scheduled = DispatchScheduledUseCase::new(
            campaigns.clone(),
            directory.clone(),
            bus.clone(),
            config,
        );

        Self {
            campaigns,
            directory,
            bus,
            sender,
            chunk_handler,
            delivery_handler,
            dispatch_draft,
            dispatch_scheduled,
        }
    }

    async fn register(&self, count: usize) -> Vec<Recipient> {
        let mut recipients = Vec::with_capacity(count);
        for i in 0..count {
            let recipient = self
                .directory
                .upsert(&Recipient::new(1000 + i as i64, None, None))
                .await
                .unwrap();
            recipients.push(recipient);
        }
        recipients
    }

    /// Runs both lanes to completion, applying the same retry policy as the
    /// queue workers but without the backoff delays.
    async fn drain(&self) {
        loop {
            while let Some(chunk) = self.bus.pop_chunk().await {
                match self.chunk_handler.handle(chunk).await {
                    Ok(()) | Err(DeliveryError::Validation(_)) => {}
                    Err(err) => panic!("chunk expansion failed: {err}"),
                }
            }
            match self.bus.pop_send().await {
                Some(job) => match self.delivery_handler.handle(job.clone()).await {
                    Ok(()) => {}
                    Err(DeliveryError::Transient(_)) if job.attempts_left() => {
                        self.bus.publish_send(job.next_attempt()).await.unwrap();
                    }
                    Err(_) => {}
                },
                None => {
                    if self.bus.chunk_backlog().await == 0 {
                        break;
                    }
                }
            }
        }
    }

    async fn status(&self, id: Uuid) -> CampaignStatus {
        self.campaigns.get(id).await.unwrap().unwrap().status
    }
}

fn content(body: &str) -> BroadcastContent {
    BroadcastContent {
        body: body.to_string(),
        parse_mode: None,
    }
}

#[tokio::test]
async fn draft_dispatch_reaches_whole_directory_in_chunks() {
    let harness = Harness::new(100, 3);
    harness.register(250).await;

    let campaign = Campaign::new_draft("promo".into(), content("big sale"));
    harness.campaigns.insert(&campaign).await.unwrap();

    let summary = harness.dispatch_draft.execute(campaign.id).await.unwrap();
    assert!(summary.dispatched);
    assert_eq!(summary.recipients, 250);
    assert_eq!(summary.chunks, 3);
    assert_eq!(harness.bus.chunk_backlog().await, 3);
    assert_eq!(harness.status(campaign.id).await, CampaignStatus::Sending);

    harness.drain().await;

    assert_eq!(harness.sender.total_calls().await, 250);
    assert_eq!(harness.status(campaign.id).await, CampaignStatus::Sent);

    let tally = harness.directory.outcome_tally(campaign.id).await.unwrap();
    assert_eq!(tally.delivered, 250);
    assert_eq!(tally.failed, 0);
}

#[tokio::test]
async fn second_draft_dispatch_is_a_noop() {
    let harness = Harness::new(100, 3);
    harness.register(10).await;

    let campaign = Campaign::new_draft("promo".into(), content("hi"));
    harness.campaigns.insert(&campaign).await.unwrap();

    let first = harness.dispatch_draft.execute(campaign.id).await.unwrap();
    assert!(first.dispatched);
    let backlog = harness.bus.chunk_backlog().await;

    let second = harness.dispatch_draft.execute(campaign.id).await.unwrap();
    assert!(!second.dispatched);
    assert_eq!(harness.bus.chunk_backlog().await, backlog);

    harness.drain().await;
    assert_eq!(harness.sender.total_calls().await, 10);
    assert_eq!(harness.status(campaign.id).await, CampaignStatus::Sent);
}

#[tokio::test]
async fn scheduled_dispatch_honors_explicit_selection() {
    let harness = Harness::new(100, 3);
    let recipients = harness.register(5).await;

    let campaign = Campaign::new_scheduled(
        "weekly".into(),
        content("digest"),
        Utc::now() - Duration::minutes(5),
    );
    harness.campaigns.insert(&campaign).await.unwrap();

    let selection = [recipients[0].id, recipients[1].id];
    let summary = harness.dispatch_scheduled.execute(&selection).await.unwrap();
    assert_eq!(summary.processed.len(), 1);
    assert_eq!(summary.processed[0].recipients, 2);
    assert_eq!(harness.status(campaign.id).await, CampaignStatus::Sending);

    harness.drain().await;

    assert_eq!(harness.sender.total_calls().await, 2);
    assert_eq!(harness.sender.calls_for(recipients[0].chat_id).await, 1);
    assert_eq!(harness.sender.calls_for(recipients[4].chat_id).await, 0);
    assert_eq!(harness.status(campaign.id).await, CampaignStatus::Sent);
}

#[tokio::test]
async fn scheduled_dispatch_skips_campaigns_not_yet_due() {
    let harness = Harness::new(100, 3);
    let recipients = harness.register(3).await;

    let campaign = Campaign::new_scheduled(
        "later".into(),
        content("not yet"),
        Utc::now() + Duration::hours(1),
    );
    harness.campaigns.insert(&campaign).await.unwrap();

    let summary = harness
        .dispatch_scheduled
        .execute(&[recipients[0].id])
        .await
        .unwrap();
    assert!(summary.processed.is_empty());
    assert_eq!(harness.status(campaign.id).await, CampaignStatus::Scheduled);
    assert_eq!(harness.sender.total_calls().await, 0);
}

#[tokio::test]
async fn transient_failures_retry_until_success() {
    let harness = Harness::new(100, 3);
    let recipients = harness.register(1).await;
    harness
        .sender
        .script(recipients[0].chat_id, &[Step::Transient, Step::Transient])
        .await;

    let campaign = Campaign::new_draft("promo".into(), content("hi"));
    harness.campaigns.insert(&campaign).await.unwrap();
    harness.dispatch_draft.execute(campaign.id).await.unwrap();
    harness.drain().await;

    assert_eq!(harness.sender.calls_for(recipients[0].chat_id).await, 3);
    let outcomes = harness.directory.list_outcomes(campaign.id).await.unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(
        outcomes[0].outcome,
        DeliveryOutcome::Delivered { attempts: 3 }
    );
    assert_eq!(harness.status(campaign.id).await, CampaignStatus::Sent);
}

#[tokio::test]
async fn exhausted_transient_failures_settle_as_failed() {
    let harness = Harness::new(100, 3);
    let recipients = harness.register(2).await;
    harness
        .sender
        .script(
            recipients[0].chat_id,
            &[Step::Transient, Step::Transient, Step::Transient],
        )
        .await;

    let campaign = Campaign::new_draft("promo".into(), content("hi"));
    harness.campaigns.insert(&campaign).await.unwrap();
    harness.dispatch_draft.execute(campaign.id).await.unwrap();
    harness.drain().await;

    assert_eq!(harness.sender.calls_for(recipients[0].chat_id).await, 3);

    let outcomes = harness.directory.list_outcomes(campaign.id).await.unwrap();
    let failed = outcomes
        .iter()
        .find(|r| r.recipient_id == recipients[0].id)
        .unwrap();
    match &failed.outcome {
        DeliveryOutcome::Failed { reason, attempts } => {
            assert!(reason.contains("retries exhausted"));
            assert_eq!(*attempts, 3);
        }
        other => panic!("expected failure, got {other:?}"),
    }

    let tally = harness.directory.outcome_tally(campaign.id).await.unwrap();
    assert_eq!(tally.delivered, 1);
    assert_eq!(tally.failed, 1);
    assert_eq!(harness.status(campaign.id).await, CampaignStatus::Failed);
}

#[tokio::test]
async fn permanent_failure_is_not_retried() {
    let harness = Harness::new(100, 3);
    let recipients = harness.register(3).await;
    harness
        .sender
        .script(recipients[1].chat_id, &[Step::Permanent])
        .await;

    let campaign = Campaign::new_draft("promo".into(), content("hi"));
    harness.campaigns.insert(&campaign).await.unwrap();
    harness.dispatch_draft.execute(campaign.id).await.unwrap();
    harness.drain().await;

    assert_eq!(harness.sender.calls_for(recipients[1].chat_id).await, 1);

    let tally = harness.directory.outcome_tally(campaign.id).await.unwrap();
    assert_eq!(tally.delivered, 2);
    assert_eq!(tally.failed, 1);
    assert_eq!(harness.status(campaign.id).await, CampaignStatus::Failed);
}

#[tokio::test]
async fn dispatch_to_empty_directory_finishes_immediately() {
    let harness = Harness::new(100, 3);

    let campaign = Campaign::new_draft("promo".into(), content("hi"));
    harness.campaigns.insert(&campaign).await.unwrap();

    let summary = harness.dispatch_draft.execute(campaign.id).await.unwrap();
    assert!(summary.dispatched);
    assert_eq!(summary.chunks, 0);
    assert_eq!(harness.bus.chunk_backlog().await, 0);
    assert_eq!(harness.status(campaign.id).await, CampaignStatus::Sent);
}

#[tokio::test]
async fn in_flight_jobs_keep_the_dispatch_time_snapshot() {
    let harness = Harness::new(100, 3);
    harness.register(2).await;

    let campaign = Campaign::new_draft("promo".into(), content("original text"));
    harness.campaigns.insert(&campaign).await.unwrap();
    harness.dispatch_draft.execute(campaign.id).await.unwrap();

    // Edit after dispatch, while chunks are still queued.
    let mut edited = harness.campaigns.get(campaign.id).await.unwrap().unwrap();
    edited.content.body = "edited text".to_string();
    harness.campaigns.insert(&edited).await.unwrap();

    harness.drain().await;

    let bodies = harness.sender.delivered_bodies().await;
    assert_eq!(bodies.len(), 2);
    assert!(bodies.iter().all(|(_, body)| body == "original text"));
}

#[tokio::test]
async fn unsubscribed_recipients_are_excluded_from_draft_dispatch() {
    let harness = Harness::new(100, 3);
    let recipients = harness.register(3).await;

    let mut unsubscribed = recipients[2].clone();
    unsubscribed.subscribed = false;
    harness.directory.upsert(&unsubscribed).await.unwrap();

    let campaign = Campaign::new_draft("promo".into(), content("hi"));
    harness.campaigns.insert(&campaign).await.unwrap();
    let summary = harness.dispatch_draft.execute(campaign.id).await.unwrap();
    assert_eq!(summary.recipients, 2);

    harness.drain().await;
    assert_eq!(harness.sender.calls_for(recipients[2].chat_id).await, 0);
    assert_eq!(harness.status(campaign.id).await, CampaignStatus::Sent);
}
