// =====================================================================================
// PRESENCE SUPERVISOR
// =====================================================================================

use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use shared_config::AppConfig;

use crate::models::{
    ChannelHandle, PresenceConfig, PresenceError, PresenceEvent, PresenceState, PresenceVerdict,
};
use crate::services::registry::ChannelRegistry;

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Samples the channel registry and escalates to a full teardown after
/// `escalation_threshold` consecutive degraded samples have been exceeded.
pub struct PresenceSupervisor {
    registry: Arc<dyn ChannelRegistry>,
    config: PresenceConfig,
    consecutive_bad_samples: u32,
    events: broadcast::Sender<PresenceEvent>,
    verdicts: watch::Sender<PresenceVerdict>,
}

impl fmt::Debug for PresenceSupervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresenceSupervisor")
            .field("config", &self.config)
            .field("consecutive_bad_samples", &self.consecutive_bad_samples)
            .finish_non_exhaustive()
    }
}

impl PresenceSupervisor {
    pub fn new(
        registry: Arc<dyn ChannelRegistry>,
        config: PresenceConfig,
    ) -> Result<Self, PresenceError> {
        config.validate()?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (verdicts, _) = watch::channel(PresenceVerdict::initial());

        Ok(Self {
            registry,
            config,
            consecutive_bad_samples: 0,
            events,
            verdicts,
        })
    }

    pub fn from_app_config(
        registry: Arc<dyn ChannelRegistry>,
        config: &AppConfig,
    ) -> Result<Self, PresenceError> {
        Self::new(registry, PresenceConfig::from_app_config(config))
    }

    pub fn config(&self) -> &PresenceConfig {
        &self.config
    }

    pub fn consecutive_bad_samples(&self) -> u32 {
        self.consecutive_bad_samples
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PresenceEvent> {
        self.events.subscribe()
    }

    pub fn verdicts(&self) -> watch::Receiver<PresenceVerdict> {
        self.verdicts.subscribe()
    }

    pub fn current_verdict(&self) -> PresenceVerdict {
        self.verdicts.borrow().clone()
    }

    /// Takes one sample. Registry failures are returned as-is and leave the
    /// bad-sample counter untouched.
    pub fn tick(&mut self) -> Result<PresenceVerdict, PresenceError> {
        let channels = self.registry.list_channels()?;
        let channel_count = channels.len();
        let degraded_channels = channels
            .iter()
            .filter(|channel| !channel.state.is_healthy())
            .count();

        let verdict = if channel_count == 0 {
            self.consecutive_bad_samples = 0;
            PresenceVerdict {
                state: PresenceState::NoChannels,
                connected: true,
                consecutive_bad_samples: 0,
                channel_count,
                degraded_channels,
            }
        } else if degraded_channels == 0 {
            self.consecutive_bad_samples = 0;
            PresenceVerdict {
                state: PresenceState::Healthy,
                connected: true,
                consecutive_bad_samples: 0,
                channel_count,
                degraded_channels,
            }
        } else {
            self.consecutive_bad_samples = self.consecutive_bad_samples.saturating_add(1);

            let state = if self.consecutive_bad_samples > self.config.escalation_threshold {
                self.escalate(channels)?;
                PresenceState::Escalating
            } else {
                PresenceState::Degraded
            };

            PresenceVerdict {
                state,
                connected: false,
                consecutive_bad_samples: self.consecutive_bad_samples,
                channel_count,
                degraded_channels,
            }
        };

        debug!(
            "Presence sample: {:?} ({} of {} channels degraded, {} bad samples)",
            verdict.state, degraded_channels, channel_count, verdict.consecutive_bad_samples
        );

        self.publish(&verdict);
        Ok(verdict)
    }

    /// Starts sampling on a tokio task. The first sample is taken one period
    /// after the call.
    pub fn spawn(self) -> SupervisorHandle {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let verdicts = self.verdicts.subscribe();
        let events = self.events.clone();

        let task = tokio::spawn(self.run(shutdown_rx));

        SupervisorHandle {
            shutdown,
            task: Some(task),
            verdicts,
            events,
        }
    }

    #[instrument(skip_all, name = "presence_supervisor")]
    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let period = self.config.poll_interval;
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Presence supervisor started, sampling every {:?}", period);

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = interval.tick() => {
                    // A failed sample changes nothing; the next tick re-observes.
                    if let Err(e) = self.tick() {
                        error!("Presence sample failed: {}", e);
                    }
                }
            }
        }

        info!("Presence supervisor stopped");
    }

    /// Removes every channel, then resets the counter. If a removal fails the
    /// counter is left above the threshold so the next tick escalates again.
    fn escalate(&mut self, channels: Vec<ChannelHandle>) -> Result<(), PresenceError> {
        let bad_samples = self.consecutive_bad_samples;
        warn!(
            "Realtime link degraded for {} consecutive samples, tearing down {} channels",
            bad_samples,
            channels.len()
        );

        for channel in &channels {
            self.registry.remove(channel)?;
        }

        self.consecutive_bad_samples = 0;

        if self
            .events
            .send(PresenceEvent::Escalated {
                removed: channels,
                bad_samples,
            })
            .is_err()
        {
            warn!("Escalation fired with no subscribers to resubscribe channels");
        }

        Ok(())
    }

    fn publish(&self, verdict: &PresenceVerdict) {
        let previous = self.verdicts.send_replace(verdict.clone());

        if previous.connected != verdict.connected {
            if verdict.connected {
                info!("Realtime link healthy again");
            } else {
                info!("Realtime link degraded, reconnecting");
            }
            // No subscribers is fine here; the watch channel still holds the verdict.
            let _ = self.events.send(PresenceEvent::ConnectivityChanged {
                connected: verdict.connected,
            });
        }
    }
}

/// Owns the running supervisor task. Dropping the handle stops the task.
pub struct SupervisorHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
    verdicts: watch::Receiver<PresenceVerdict>,
    events: broadcast::Sender<PresenceEvent>,
}

impl SupervisorHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<PresenceEvent> {
        self.events.subscribe()
    }

    pub fn verdicts(&self) -> watch::Receiver<PresenceVerdict> {
        self.verdicts.clone()
    }

    pub fn current_verdict(&self) -> PresenceVerdict {
        self.verdicts.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stops sampling. Calling it again is a no-op.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = self.shutdown.send(true);
            task.abort();
            debug!("Presence supervisor stop requested");
        }
    }

    /// Stops sampling and waits for the task to wind down.
    pub async fn shutdown(mut self) {
        if let Some(task) = self.task.take() {
            let _ = self.shutdown.send(true);
            if let Err(e) = task.await {
                if e.is_panic() {
                    error!("Presence supervisor task panicked: {}", e);
                }
            }
        }
    }
}

impl Drop for SupervisorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
