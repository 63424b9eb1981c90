//! Broker layer: NATS JetStream connection, topology, publish, consume
//!
//! The work distribution and notification fanout of the pipeline map
//! onto two JetStream streams (see [`topology`]). Connection setup
//! retries with increasing backoff and re-declares the full topology,
//! which is idempotent and safe to repeat after any reconnect.

pub mod consumer;
pub mod publisher;
pub mod topology;

pub use consumer::{HandlerOutcome, run_consumer};
pub use publisher::Publisher;

use async_nats::jetstream;
use std::time::Duration;

use crate::config::Config;

/// Initial dial retries
const CONNECT_ATTEMPTS: u32 = 5;

/// Connect to NATS and declare the full topology, retrying with
/// increasing backoff.
pub async fn connect(config: &Config) -> Result<jetstream::Context, async_nats::Error> {
    let mut last_err: Option<async_nats::Error> = None;
    for attempt in 1..=CONNECT_ATTEMPTS {
        match try_connect(config).await {
            Ok(context) => return Ok(context),
            Err(e) => {
                let wait = Duration::from_secs(2 * attempt as u64);
                if attempt < CONNECT_ATTEMPTS {
                    tracing::error!(
                        error = %e,
                        attempt,
                        "failed to connect to NATS, retrying in {wait:?}"
                    );
                    tokio::time::sleep(wait).await;
                }
                last_err = Some(e);
            }
        }
    }

    Err(last_err.unwrap_or_else(|| "NATS connection failed".into()))
}

async fn try_connect(config: &Config) -> Result<jetstream::Context, async_nats::Error> {
    let client = async_nats::connect(&config.nats_url).await?;
    let context = jetstream::new(client);
    topology::declare(&context, config.message_ttl).await?;
    Ok(context)
}
