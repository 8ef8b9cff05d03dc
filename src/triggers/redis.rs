use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::{broadcast, Semaphore};
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::config::{ListenerConfig, RedisConfig};
use crate::infrastructure::backoff::{BackoffConfig, ExponentialBackoff};
use crate::metrics::CommandMetrics;
use crate::notification::{CommandEnvelope, NotificationService};

/// Channel used when none is configured
pub const DEFAULT_COMMAND_CHANNEL: &str = "mailer:commands";

/// What happened to a single command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Accepted by the delivery client after `attempts` tries
    Sent { attempts: u32 },
    /// Given up on; `reason` is the metric label
    Dropped { reason: &'static str },
}

/// Redis Pub/Sub listener feeding commands into the notification service
pub struct RedisCommandListener {
    redis: RedisConfig,
    listener: ListenerConfig,
    service: Arc<NotificationService>,
    shutdown: broadcast::Sender<()>,
    in_flight: Arc<Semaphore>,
}

impl RedisCommandListener {
    pub fn new(
        redis: RedisConfig,
        listener: ListenerConfig,
        service: Arc<NotificationService>,
    ) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        let in_flight = Arc::new(Semaphore::new(listener.max_in_flight.max(1)));
        Self {
            redis,
            listener,
            service,
            shutdown,
            in_flight,
        }
    }

    /// Get a shutdown signal sender
    pub fn shutdown_signal(&self) -> broadcast::Sender<()> {
        self.shutdown.clone()
    }

    /// Run until a shutdown signal arrives, reconnecting on failure.
    ///
    /// Commands still being handled at shutdown are awaited before returning.
    pub async fn start(&self) -> anyhow::Result<()> {
        let channels = self.channels();
        tracing::info!(channels = ?channels, "Starting Redis command listener");

        let mut shutdown_rx = self.shutdown.subscribe();
        let mut reconnect = ExponentialBackoff::default();
        let mut tasks = JoinSet::new();

        loop {
            let result = tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Received shutdown signal");
                    break;
                }
                result = self.run_subscription_loop(&channels, &mut reconnect, &mut tasks) => {
                    result
                }
            };

            CommandMetrics::set_subscribed(false);
            let delay = reconnect.next_delay();
            match result {
                Ok(()) => tracing::warn!(
                    delay_ms = delay.as_millis() as u64,
                    "Redis message stream ended, reconnecting"
                ),
                Err(e) => tracing::error!(
                    error = %e,
                    attempt = reconnect.attempt(),
                    delay_ms = delay.as_millis() as u64,
                    "Redis subscription error, reconnecting"
                ),
            }

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Received shutdown signal");
                    break;
                }
                _ = tokio::time::sleep(delay) => CommandMetrics::record_reconnect(),
            }
        }

        CommandMetrics::set_subscribed(false);
        if !tasks.is_empty() {
            tracing::info!(in_flight = tasks.len(), "Waiting for in-flight commands");
        }
        while let Some(joined) = tasks.join_next().await {
            log_join_error(joined);
        }

        tracing::info!("Redis command listener stopped gracefully");
        Ok(())
    }

    fn channels(&self) -> Vec<String> {
        if self.redis.channels.is_empty() {
            vec![DEFAULT_COMMAND_CHANNEL.to_string()]
        } else {
            self.redis.channels.clone()
        }
    }

    /// Returns when the subscription is lost; `Ok` means the stream closed.
    async fn run_subscription_loop(
        &self,
        channels: &[String],
        reconnect: &mut ExponentialBackoff,
        tasks: &mut JoinSet<()>,
    ) -> anyhow::Result<()> {
        let client = redis::Client::open(self.redis.url.as_str())?;
        let mut pubsub = client.get_async_pubsub().await?;

        for channel in channels {
            if is_pattern(channel) {
                pubsub.psubscribe(channel).await?;
                tracing::debug!(pattern = %channel, "Subscribed to pattern");
            } else {
                pubsub.subscribe(channel).await?;
                tracing::debug!(channel = %channel, "Subscribed to channel");
            }
        }

        tracing::info!("Redis subscription established");
        CommandMetrics::set_subscribed(true);
        reconnect.reset();

        let mut message_stream = pubsub.on_message();
        while let Some(msg) = message_stream.next().await {
            let channel = msg.get_channel_name().to_string();
            let payload: String = match msg.get_payload() {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        channel = %channel,
                        "Failed to get message payload"
                    );
                    CommandMetrics::record_dropped("decode_error");
                    continue;
                }
            };

            tracing::debug!(channel = %channel, "Received Redis command");
            self.spawn_command(tasks, payload).await?;
        }

        Ok(())
    }

    /// Hand one payload to a task once an in-flight slot is free
    async fn spawn_command(
        &self,
        tasks: &mut JoinSet<()>,
        payload: String,
    ) -> anyhow::Result<()> {
        while let Some(joined) = tasks.try_join_next() {
            log_join_error(joined);
        }

        let permit = self.in_flight.clone().acquire_owned().await?;
        let service = self.service.clone();
        let policy = self.listener.clone();
        tasks.spawn(async move {
            handle_command(&service, &policy, &payload).await;
            drop(permit);
        });
        Ok(())
    }
}

fn log_join_error(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "Command task failed");
    }
}

fn is_pattern(channel: &str) -> bool {
    channel.contains('*') || channel.contains('?') || channel.contains('[')
}

/// Decode one payload and dispatch it, redelivering transient failures.
pub async fn handle_command(
    service: &NotificationService,
    policy: &ListenerConfig,
    payload: &str,
) -> CommandOutcome {
    CommandMetrics::record_received();

    let envelope: CommandEnvelope = match serde_json::from_str(payload) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(error = %e, payload = %payload, "Failed to parse command");
            CommandMetrics::record_dropped("decode_error");
            return CommandOutcome::Dropped {
                reason: "decode_error",
            };
        }
    };

    let kind = envelope.command.kind();
    let span = tracing::info_span!(
        "mailer.command",
        kind = %kind,
        correlation_id = envelope.correlation_id.as_deref().unwrap_or("")
    );

    async move {
        let max_attempts = policy.max_attempts.max(1);
        let mut backoff = ExponentialBackoff::with_config(BackoffConfig::from(policy));
        let mut attempts = 0;

        loop {
            attempts += 1;
            match service.dispatch(envelope.command.clone()).await {
                Ok(()) => return CommandOutcome::Sent { attempts },
                Err(e) if e.is_retryable() && attempts < max_attempts => {
                    let delay = backoff.next_delay();
                    tracing::warn!(
                        error = %e,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Transient failure, redelivering command"
                    );
                    CommandMetrics::record_retry(kind);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, attempts, "Dropping command");
                    CommandMetrics::record_dropped(e.reason());
                    return CommandOutcome::Dropped { reason: e.reason() };
                }
            }
        }
    }
    .instrument(span)
    .await
}
