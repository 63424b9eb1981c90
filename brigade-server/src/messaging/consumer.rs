//! Consumption loop: one logical loop per queue, sequential handlers
//!
//! Handlers report an explicit [`HandlerOutcome`]; this adapter is the
//! only place that translates outcomes into broker acknowledgements,
//! keeping business code broker-agnostic.

use async_nats::jetstream::AckKind;
use async_nats::jetstream::consumer::PullConsumer;
use bytes::Bytes;
use futures::StreamExt;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Result of processing one delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Acknowledge: the message is done (including no-op redeliveries)
    Completed,
    /// Negative-acknowledge with requeue: transient failure, redeliver
    RetryableFailure,
    /// Terminate: the message can never be processed (e.g. unparseable)
    PermanentFailure,
}

fn ack_kind(outcome: HandlerOutcome) -> AckKind {
    match outcome {
        HandlerOutcome::Completed => AckKind::Ack,
        HandlerOutcome::RetryableFailure => AckKind::Nak(None),
        HandlerOutcome::PermanentFailure => AckKind::Term,
    }
}

/// Drive a pull consumer until the stream ends or shutdown is
/// requested.
///
/// `prefetch` bounds how many deliveries may be in flight to this
/// process at once; handlers still run sequentially, so it is the sole
/// backpressure knob. Each handler call is wrapped in `deadline`; on
/// expiry the delivery is negative-acknowledged for redelivery.
///
/// Cancellation stops pulling new deliveries but always drives the
/// in-flight handler to completion first.
pub async fn run_consumer<H, Fut>(
    consumer: PullConsumer,
    prefetch: usize,
    deadline: Duration,
    shutdown: CancellationToken,
    handler: H,
) -> Result<(), async_nats::Error>
where
    H: Fn(Bytes) -> Fut,
    Fut: Future<Output = HandlerOutcome>,
{
    let mut messages = consumer
        .stream()
        .max_messages_per_batch(prefetch)
        .messages()
        .await?;

    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("consumer stopped by shutdown signal");
                return Ok(());
            }
            next = messages.next() => next,
        };

        let message = match next {
            Some(Ok(message)) => message,
            Some(Err(e)) => return Err(e.into()),
            None => return Err("message stream ended unexpectedly".into()),
        };

        let started = std::time::Instant::now();
        let outcome = match tokio::time::timeout(deadline, handler(message.payload.clone())).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(
                    subject = %message.subject,
                    "message processing exceeded {deadline:?}, requeueing"
                );
                HandlerOutcome::RetryableFailure
            }
        };

        tracing::debug!(
            subject = %message.subject,
            ?outcome,
            duration_ms = started.elapsed().as_millis() as u64,
            "message processed"
        );

        if let Err(e) = message.ack_with(ack_kind(outcome)).await {
            tracing::error!(error = %e, subject = %message.subject, "failed to acknowledge message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_to_ack_translation() {
        assert!(matches!(ack_kind(HandlerOutcome::Completed), AckKind::Ack));
        assert!(matches!(
            ack_kind(HandlerOutcome::RetryableFailure),
            AckKind::Nak(None)
        ));
        assert!(matches!(ack_kind(HandlerOutcome::PermanentFailure), AckKind::Term));
    }
}
