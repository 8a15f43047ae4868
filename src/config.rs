use std::env::var;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;

use crate::{
    application::services::backoff::BackoffPolicy,
    infrastructure::messaging::jetstream::{JetstreamConfig, LaneConfig},
};

pub struct Config {
    pub port: u16,
    pub scheme: String,
    pub host: String,
    pub database_url: Option<String>,
    pub telegram_token: String,
    pub chunk_size: usize,
    pub send_max_attempts: u32,
    pub backoff: BackoffPolicy,
    pub jetstream: JetstreamConfig,
}

impl Config {
    pub fn try_parse() -> Result<Config, &'static str> {
        let _ = dotenv();

        let backoff = BackoffPolicy::new(
            Duration::from_secs(parsed_or(
                "SEND_BACKOFF_BASE_SECS",
                60,
                "An error occured while parsing SEND_BACKOFF_BASE_SECS env param",
            )?),
            Duration::from_secs(parsed_or(
                "SEND_BACKOFF_MAX_SECS",
                900,
                "An error occured while parsing SEND_BACKOFF_MAX_SECS env param",
            )?),
        );

        let jetstream = JetstreamConfig {
            url: var("NATS_URL").map_err(|_| "An error occured while getting NATS_URL env param")?,
            chunk_lane: LaneConfig {
                stream: var_or("CHUNK_LANE_STREAM", "BROADCAST_CHUNKS"),
                subject: var_or("CHUNK_LANE_SUBJECT", "broadcast.chunks"),
                durable: var_or("CHUNK_LANE_DURABLE", "chunk-workers"),
                pull_batch: parsed_or(
                    "CHUNK_LANE_PULL_BATCH",
                    16,
                    "An error occured while parsing CHUNK_LANE_PULL_BATCH env param",
                )?,
                ack_wait_seconds: parsed_or(
                    "CHUNK_LANE_ACK_WAIT_SECS",
                    120,
                    "An error occured while parsing CHUNK_LANE_ACK_WAIT_SECS env param",
                )?,
                max_deliver: parsed_or(
                    "CHUNK_LANE_MAX_DELIVER",
                    3,
                    "An error occured while parsing CHUNK_LANE_MAX_DELIVER env param",
                )?,
                concurrency: parsed_or(
                    "CHUNK_LANE_CONCURRENCY",
                    4,
                    "An error occured while parsing CHUNK_LANE_CONCURRENCY env param",
                )?,
            },
            send_lane: LaneConfig {
                stream: var_or("SEND_LANE_STREAM", "BROADCAST_SENDS"),
                subject: var_or("SEND_LANE_SUBJECT", "broadcast.sends"),
                durable: var_or("SEND_LANE_DURABLE", "send-workers"),
                pull_batch: parsed_or(
                    "SEND_LANE_PULL_BATCH",
                    64,
                    "An error occured while parsing SEND_LANE_PULL_BATCH env param",
                )?,
                ack_wait_seconds: parsed_or(
                    "SEND_LANE_ACK_WAIT_SECS",
                    60,
                    "An error occured while parsing SEND_LANE_ACK_WAIT_SECS env param",
                )?,
                max_deliver: parsed_or(
                    "SEND_LANE_MAX_DELIVER",
                    5,
                    "An error occured while parsing SEND_LANE_MAX_DELIVER env param",
                )?,
                // Consumer concurrency is the only throttle in front of the
                // messaging API's rate limit.
                concurrency: parsed_or(
                    "SEND_LANE_CONCURRENCY",
                    8,
                    "An error occured while parsing SEND_LANE_CONCURRENCY env param",
                )?,
            },
        };

        Ok(Config {
            port: var("PORT")
                .map_err(|_| "An error occured while getting PORT env param")?
                .parse::<u16>()
                .map_err(|_| "An error occured while parsing PORT env param")?,
            scheme: var("SCHEME").map_err(|_| "An error occured while getting SCHEME env param")?,
            host: var("HOST").map_err(|_| "An error occured while getting HOST env param")?,
            database_url: var("DATABASE_URL").ok(),
            telegram_token: var("TELEGRAM_BOT_TOKEN")
                .map_err(|_| "An error occured while getting TELEGRAM_BOT_TOKEN env param")?,
            chunk_size: parsed_or(
                "BROADCAST_CHUNK_SIZE",
                100,
                "An error occured while parsing BROADCAST_CHUNK_SIZE env param",
            )?,
            send_max_attempts: parsed_or(
                "SEND_MAX_ATTEMPTS",
                3,
                "An error occured while parsing SEND_MAX_ATTEMPTS env param",
            )?,
            backoff,
            jetstream,
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed_or<T: FromStr>(name: &str, default: T, err: &'static str) -> Result<T, &'static str> {
    match var(name) {
        Ok(value) => value.parse::<T>().map_err(|_| err),
        Err(_) => Ok(default),
    }
}
