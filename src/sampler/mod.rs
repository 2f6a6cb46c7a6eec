//! Memory sampler
//!
//! The sampler is a single tokio task that owns every source and all mutable state. Timer ticks, power-source
//! notifications, manual refreshes and shutdown all reach it through one inbound channel plus its own interval
//! timer, so sampling cycles never overlap. Each finished cycle replaces the published [`MemorySnapshot`] as a whole
//! through a `watch` channel; readers never see a mix of two cycles.
//!
//! Cadence follows the power state: every 5 seconds on AC power and every 15 seconds on battery by default. A
//! power-source transition reschedules the timer to one full new period from the transition and takes an extra
//! sample immediately.
//!
//! # Examples
//!
//! ```no_run
//! use darwin_memwatch::config::SamplerConfig;
//! use darwin_memwatch::format::format_bytes;
//! use darwin_memwatch::sampler::MemorySampler;
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> darwin_memwatch::Result<()> {
//!     let sampler = MemorySampler::system(SamplerConfig::default()).await?;
//!
//!     let mut snapshots = Box::pin(sampler.snapshots());
//!     while let Some(snapshot) = snapshots.next().await {
//!         println!("{} used, pressure {}", format_bytes(snapshot.used_bytes), snapshot.pressure_level);
//!     }
//!     Ok(())
//! }
//! ```

/// Sampler cadence and channel constants
pub mod constants;

mod cycle;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

pub use cycle::SamplerCore;
use crate::config::SamplerConfig;
use crate::error::{Error, Result};
use crate::memory::{MemorySnapshot, VmStatsSource};
use crate::power::{PowerSource, PowerStateObserver, PowerSubscription};
use crate::process::ProcessSource;
use constants::{EVENT_CHANNEL_CAPACITY, SHUTDOWN_TIMEOUT_MS};

/// Whether a sampling cycle is currently running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    Idle,
    Sampling,
}

#[derive(Debug)]
enum SamplerEvent {
    PowerSourcesChanged,
    Refresh,
    Shutdown,
}

#[derive(Debug, Clone, Copy)]
enum Trigger {
    Tick,
    Refresh,
    PowerChange,
}

struct SharedState {
    sampling: AtomicBool,
    refresh_pending: AtomicBool,
    interval: Mutex<Duration>,
}

/// Handle to a running sampler
///
/// Dropping the handle releases the power-source subscription and stops the sampling task.
pub struct MemorySampler {
    events: mpsc::Sender<SamplerEvent>,
    snapshots: watch::Receiver<MemorySnapshot>,
    shared: Arc<SharedState>,
    task: Option<JoinHandle<()>>,
    subscription: Option<PowerSubscription>,
}

impl MemorySampler {
    /// Starts a sampler over the given sources
    ///
    /// Physical memory is read once here; failure to read it is the only source error that aborts start-up. The
    /// first snapshot is taken before this returns, so [`current_snapshot`](Self::current_snapshot) is populated
    /// immediately.
    pub async fn start(
        config: SamplerConfig,
        vm: Arc<dyn VmStatsSource>,
        processes: Arc<dyn ProcessSource>,
        power: Arc<dyn PowerSource>,
    ) -> Result<Self> {
        config.validate()?;

        let mut observer = PowerStateObserver::default();
        observer.refresh_or_keep(power.as_ref());

        let mut core = SamplerCore::new(vm, processes, &config)?;
        let initial = core.sample(observer.on_ac_power()).await;
        let period = config.interval_for(observer.on_ac_power());

        let (publisher, snapshots) = watch::channel(initial);
        let (events, inbox) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let shared = Arc::new(SharedState {
            sampling: AtomicBool::new(false),
            refresh_pending: AtomicBool::new(false),
            interval: Mutex::new(period),
        });

        let notifier = events.clone();
        let subscription = power
            .subscribe(Box::new(move || {
                if notifier.try_send(SamplerEvent::PowerSourcesChanged).is_err() {
                    debug!("sampler inbox full or closed, dropping power notification");
                }
            }))
            .unwrap_or_else(|e| {
                warn!(error = %e, "power notifications unavailable, cadence will not adapt");
                PowerSubscription::inert()
            });

        let actor = SamplerActor {
            core,
            power,
            observer,
            config,
            inbox,
            publisher,
            shared: Arc::clone(&shared),
        };
        let task = tokio::spawn(actor.run(period));

        info!(?period, "memory sampler started");
        Ok(Self { events, snapshots, shared, task: Some(task), subscription: Some(subscription) })
    }

    /// Starts a sampler over the macOS kernel, `top`/`ps` and IOKit power sources
    #[cfg(target_os = "macos")]
    pub async fn system(config: SamplerConfig) -> Result<Self> {
        use crate::memory::DarwinVmStats;
        use crate::power::DarwinPowerSources;
        use crate::process::TopProcessLister;

        let processes = TopProcessLister::new(config.command_timeout());
        Self::start(
            config,
            Arc::new(DarwinVmStats::new()),
            Arc::new(processes),
            Arc::new(DarwinPowerSources::new()),
        )
        .await
    }

    /// The system sources only exist on macOS
    #[cfg(not(target_os = "macos"))]
    pub async fn system(_config: SamplerConfig) -> Result<Self> {
        Err(Error::source_unavailable("system memory sources require macOS"))
    }

    /// The latest published snapshot
    pub fn current_snapshot(&self) -> MemorySnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that reports every snapshot published after this call
    pub fn subscribe(&self) -> watch::Receiver<MemorySnapshot> {
        let mut receiver = self.snapshots.clone();
        receiver.borrow_and_update();
        receiver
    }

    /// Stream of snapshots published after this call; ends when the sampler stops
    pub fn snapshots(&self) -> impl Stream<Item = MemorySnapshot> + Send + 'static {
        futures::stream::unfold(self.subscribe(), |mut receiver| async move {
            receiver.changed().await.ok()?;
            let snapshot = receiver.borrow_and_update().clone();
            Some((snapshot, receiver))
        })
    }

    /// Requests an out-of-cadence sample
    ///
    /// Requests coalesce: while a refresh is queued or a cycle is running, further calls do nothing.
    pub fn refresh(&self) {
        if self.shared.sampling.load(Ordering::Acquire) {
            return;
        }
        if self.shared.refresh_pending.swap(true, Ordering::AcqRel) {
            return;
        }
        if self.events.try_send(SamplerEvent::Refresh).is_err() {
            self.shared.refresh_pending.store(false, Ordering::Release);
        }
    }

    /// Period of the recurring timer
    pub fn current_interval(&self) -> Duration {
        *self.shared.interval.lock()
    }

    pub fn state(&self) -> SamplerState {
        if self.shared.sampling.load(Ordering::Acquire) {
            SamplerState::Sampling
        } else {
            SamplerState::Idle
        }
    }

    /// Stops the sampler and waits for the sampling task to finish
    pub async fn shutdown(mut self) -> Result<()> {
        drop(self.subscription.take());

        let Some(task) = self.task.take() else {
            return Ok(());
        };

        self.events.send(SamplerEvent::Shutdown).await.map_err(|_| Error::SamplerStopped)?;

        match tokio::time::timeout(Duration::from_millis(SHUTDOWN_TIMEOUT_MS), task).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                warn!(error = %e, "sampling task ended abnormally");
                Err(Error::SamplerStopped)
            },
            Err(_) => {
                warn!("timed out waiting for sampling task to stop");
                Err(Error::SamplerStopped)
            },
        }
    }
}

impl Drop for MemorySampler {
    fn drop(&mut self) {
        // Release the subscription first so no notification races the stopping task
        drop(self.subscription.take());

        if let Some(task) = self.task.take() {
            let _ = self.events.try_send(SamplerEvent::Shutdown);
            task.abort();
        }
    }
}

impl fmt::Debug for MemorySampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySampler")
            .field("state", &self.state())
            .field("interval", &self.current_interval())
            .field("sequence", &self.snapshots.borrow().sequence)
            .field("running", &self.task.is_some())
            .finish()
    }
}

struct SamplerActor {
    core: SamplerCore,
    power: Arc<dyn PowerSource>,
    observer: PowerStateObserver,
    config: SamplerConfig,
    inbox: mpsc::Receiver<SamplerEvent>,
    publisher: watch::Sender<MemorySnapshot>,
    shared: Arc<SharedState>,
}

fn cadence(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

impl SamplerActor {
    async fn run(mut self, period: Duration) {
        let mut ticker = cadence(period);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.cycle(Trigger::Tick).await,
                event = self.inbox.recv() => match event {
                    Some(SamplerEvent::Refresh) => {
                        if self.shared.refresh_pending.load(Ordering::Acquire) {
                            self.cycle(Trigger::Refresh).await;
                        }
                    },
                    Some(SamplerEvent::PowerSourcesChanged) => {
                        if let Some(period) = self.power_transition() {
                            ticker = cadence(period);
                            self.cycle(Trigger::PowerChange).await;
                        }
                    },
                    Some(SamplerEvent::Shutdown) | None => break,
                },
            }
        }

        info!("memory sampler stopped");
    }

    /// Re-reads the power state; on a transition returns the new timer period
    fn power_transition(&mut self) -> Option<Duration> {
        if !self.observer.refresh_or_keep(self.power.as_ref()) {
            return None;
        }

        let on_ac_power = self.observer.on_ac_power();
        let period = self.config.interval_for(on_ac_power);
        *self.shared.interval.lock() = period;
        info!(on_ac_power, ?period, "power source changed, rescheduling sampler");
        Some(period)
    }

    async fn cycle(&mut self, trigger: Trigger) {
        self.shared.sampling.store(true, Ordering::Release);

        let snapshot = self.core.sample(self.observer.on_ac_power()).await;
        debug!(
            ?trigger,
            sequence = snapshot.sequence,
            used = snapshot.used_bytes,
            pressure = %snapshot.pressure_level,
            "memory snapshot published"
        );
        self.publisher.send_replace(snapshot);

        self.shared.refresh_pending.store(false, Ordering::Release);
        self.shared.sampling.store(false, Ordering::Release);
    }
}
