use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres, Row};
use uuid::Uuid;

use crate::domain::{
    errors::DispatchError,
    models::{
        BroadcastContent, Campaign, CampaignStatus, DeliveryOutcome, DeliveryRecord,
        DeliveryTally, ParseMode, Recipient,
    },
    repositories::{CampaignStore, RecipientDirectory},
};

pub type PgPool = Pool<Postgres>;

#[derive(Clone)]
pub struct PostgresRecipientDirectory {
    pool: PgPool,
}

impl PostgresRecipientDirectory {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl RecipientDirectory for PostgresRecipientDirectory {
    async fn upsert(&self, recipient: &Recipient) -> anyhow::Result<Recipient> {
        let record = sqlx::query_as::<_, RecipientRecord>(
            r#"
            INSERT INTO recipients (id, chat_id, username, first_name, subscribed, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (chat_id) DO UPDATE
            SET username = EXCLUDED.username,
                first_name = EXCLUDED.first_name,
                subscribed = EXCLUDED.subscribed
            RETURNING id, chat_id, username, first_name, subscribed, created_at
            "#,
        )
        .bind(recipient.id)
        .bind(recipient.chat_id)
        .bind(&recipient.username)
        .bind(&recipient.first_name)
        .bind(recipient.subscribed)
        .bind(recipient.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(record.into())
    }

    async fn list_eligible(&self) -> anyhow::Result<Vec<Recipient>> {
        let rows = sqlx::query_as::<_, RecipientRecord>(
            r#"
            SELECT id, chat_id, username, first_name, subscribed, created_at
            FROM recipients
            WHERE subscribed
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Recipient::from).collect())
    }

    async fn get_many(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Recipient>> {
        let rows = sqlx::query_as::<_, RecipientRecord>(
            r#"
            SELECT id, chat_id, username, first_name, subscribed, created_at
            FROM recipients
            WHERE id = ANY($1)
            ORDER BY created_at, id
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Recipient::from).collect())
    }

    async fn record_outcome(
        &self,
        campaign_id: Uuid,
        recipient_id: Uuid,
        outcome: DeliveryOutcome,
    ) -> anyhow::Result<()> {
        let (outcome_str, reason, attempts) = outcome_to_fields(&outcome);
        sqlx::query(
            r#"
            INSERT INTO delivery_outcomes (
                campaign_id, recipient_id, outcome, reason, attempts, recorded_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (campaign_id, recipient_id) DO UPDATE
            SET outcome = EXCLUDED.outcome,
                reason = EXCLUDED.reason,
                attempts = EXCLUDED.attempts,
                recorded_at = EXCLUDED.recorded_at
            "#,
        )
        .bind(campaign_id)
        .bind(recipient_id)
        .bind(outcome_str)
        .bind(reason)
        .bind(attempts as i32)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn outcome_tally(&self, campaign_id: Uuid) -> anyhow::Result<DeliveryTally> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE outcome = 'delivered') AS delivered,
                COUNT(*) FILTER (WHERE outcome = 'failed') AS failed
            FROM delivery_outcomes
            WHERE campaign_id = $1
            "#,
        )
        .bind(campaign_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(DeliveryTally {
            delivered: row.try_get::<i64, _>("delivered")? as u32,
            failed: row.try_get::<i64, _>("failed")? as u32,
        })
    }

    async fn list_outcomes(&self, campaign_id: Uuid) -> anyhow::Result<Vec<DeliveryRecord>> {
        let rows = sqlx::query_as::<_, OutcomeRecord>(
            r#"
            SELECT campaign_id, recipient_id, outcome, reason, attempts, recorded_at
            FROM delivery_outcomes
            WHERE campaign_id = $1
            ORDER BY recorded_at
            "#,
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(DeliveryRecord::try_from).collect()
    }
}

#[derive(Clone)]
pub struct PostgresCampaignStore {
    pool: PgPool,
}

impl PostgresCampaignStore {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl CampaignStore for PostgresCampaignStore {
    async fn insert(&self, campaign: &Campaign) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO campaigns (
                id, title, body, parse_mode, status, scheduled_at,
                total_recipients, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(campaign.id)
        .bind(&campaign.title)
        .bind(&campaign.content.body)
        .bind(campaign.content.parse_mode.map(parse_mode_to_str))
        .bind(campaign.status.as_str())
        .bind(campaign.scheduled_at)
        .bind(campaign.total_recipients as i32)
        .bind(campaign.created_at)
        .bind(campaign.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Campaign>> {
        let record = sqlx::query_as::<_, CampaignRecord>(
            r#"
            SELECT id, title, body, parse_mode, status, scheduled_at,
                   total_recipients, created_at, updated_at
            FROM campaigns
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        record.map(Campaign::try_from).transpose()
    }

    async fn list_scheduled_due(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<Campaign>> {
        let rows = sqlx::query_as::<_, CampaignRecord>(
            r#"
            SELECT id, title, body, parse_mode, status, scheduled_at,
                   total_recipients, created_at, updated_at
            FROM campaigns
            WHERE status = 'scheduled'
              AND scheduled_at <= $1
            ORDER BY scheduled_at
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Campaign::try_from).collect()
    }

    async fn transition(
        &self,
        id: Uuid,
        expected: CampaignStatus,
        next: CampaignStatus,
    ) -> Result<(), DispatchError> {
        let result = sqlx::query(
            r#"
            UPDATE campaigns
            SET status = $3, updated_at = $4
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(expected.as_str())
        .bind(next.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| DispatchError::Other(err.into()))?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        let exists = sqlx::query(r#"SELECT 1 FROM campaigns WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| DispatchError::Other(err.into()))?;

        if exists.is_some() {
            Err(DispatchError::Conflict(id))
        } else {
            Err(DispatchError::NotFound(id))
        }
    }

    async fn set_dispatch_total(&self, id: Uuid, total: u32) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE campaigns
            SET total_recipients = $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(total as i32)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[derive(FromRow)]
struct RecipientRecord {
    id: Uuid,
    chat_id: i64,
    username: Option<String>,
    first_name: Option<String>,
    subscribed: bool,
    created_at: DateTime<Utc>,
}

impl From<RecipientRecord> for Recipient {
    fn from(record: RecipientRecord) -> Self {
        Recipient {
            id: record.id,
            chat_id: record.chat_id,
            username: record.username,
            first_name: record.first_name,
            subscribed: record.subscribed,
            created_at: record.created_at,
        }
    }
}

#[derive(FromRow)]
struct CampaignRecord {
    id: Uuid,
    title: String,
    body: String,
    parse_mode: Option<String>,
    status: String,
    scheduled_at: Option<DateTime<Utc>>,
    total_recipients: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CampaignRecord> for Campaign {
    type Error = anyhow::Error;

    fn try_from(record: CampaignRecord) -> Result<Self, Self::Error> {
        let status = CampaignStatus::from_str(&record.status)
            .ok_or_else(|| anyhow::anyhow!("unknown campaign status: {}", record.status))?;
        let parse_mode = record
            .parse_mode
            .as_deref()
            .map(|value| {
                parse_mode_from_str(value)
                    .ok_or_else(|| anyhow::anyhow!("unknown parse mode: {value}"))
            })
            .transpose()?;

        Ok(Campaign {
            id: record.id,
            title: record.title,
            content: BroadcastContent {
                body: record.body,
                parse_mode,
            },
            status,
            scheduled_at: record.scheduled_at,
            total_recipients: record.total_recipients as u32,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

#[derive(FromRow)]
struct OutcomeRecord {
    campaign_id: Uuid,
    recipient_id: Uuid,
    outcome: String,
    reason: Option<String>,
    attempts: i32,
    recorded_at: DateTime<Utc>,
}

impl TryFrom<OutcomeRecord> for DeliveryRecord {
    type Error = anyhow::Error;

    fn try_from(record: OutcomeRecord) -> Result<Self, Self::Error> {
        let attempts = record.attempts as u32;
        let outcome = match record.outcome.as_str() {
            "delivered" => DeliveryOutcome::Delivered { attempts },
            "failed" => DeliveryOutcome::Failed {
                reason: record.reason.unwrap_or_default(),
                attempts,
            },
            other => anyhow::bail!("unknown delivery outcome: {other}"),
        };
        Ok(DeliveryRecord {
            campaign_id: record.campaign_id,
            recipient_id: record.recipient_id,
            outcome,
            recorded_at: record.recorded_at,
        })
    }
}

fn outcome_to_fields(outcome: &DeliveryOutcome) -> (&'static str, Option<String>, u32) {
    match outcome {
        DeliveryOutcome::Delivered { attempts } => ("delivered", None, *attempts),
        DeliveryOutcome::Failed { reason, attempts } => {
            ("failed", Some(reason.clone()), *attempts)
        }
    }
}

fn parse_mode_to_str(mode: ParseMode) -> &'static str {
    match mode {
        ParseMode::Html => "html",
        ParseMode::Markdown => "markdown",
    }
}

fn parse_mode_from_str(value: &str) -> Option<ParseMode> {
    match value {
        "html" => Some(ParseMode::Html),
        "markdown" => Some(ParseMode::Markdown),
        _ => None,
    }
}
