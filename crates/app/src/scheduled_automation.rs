//! Scheduled automation — keeps a binary setting in line with its schedule.
//!
//! The desired state is recomputed whenever one of the setting's keys
//! changes and whenever the next schedule boundary elapses. The setting is
//! written only when the desired state differs from the stored one, and never
//! while the mode is [`AutoMode::Disabled`].

use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};

use modekeeper_domain::error::{ModeKeeperError, ValidationError};
use modekeeper_domain::schedule::{AutoMode, AutomationSetting, TimeWindow, Twilight};
use modekeeper_domain::signal::{Signal, SignalFilter};
use modekeeper_domain::time::WallClock;

use crate::ports::{
    BinarySetting, Clock, EventSource, SignalCallback, SubscriptionHandle, TwilightSource,
};

/// Outcome of one [`ScheduledAutomation::reevaluate`] pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub mode: AutoMode,
    /// Desired value, `None` when the mode is disabled.
    pub desired: Option<bool>,
    /// Whether the setting was written.
    pub changed: bool,
    /// When the next evaluation is due without any external change.
    pub next_wake: Option<WallClock>,
}

/// Drives one [`BinarySetting`] from its automation mode.
///
/// Dropping it releases the setting-key subscriptions.
pub struct ScheduledAutomation<B, E: EventSource, C> {
    setting: B,
    events: E,
    clock: C,
    twilight: Option<Box<dyn TwilightSource>>,
    evaluation: Mutex<()>,
    next_wake: StdMutex<Option<WallClock>>,
    subscriptions: StdMutex<Vec<SubscriptionHandle>>,
    changes: mpsc::UnboundedSender<String>,
    pending: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl<B, E, C> ScheduledAutomation<B, E, C>
where
    B: BinarySetting,
    E: EventSource,
    C: Clock,
{
    pub fn new(setting: B, events: E, clock: C) -> Self {
        let (changes, pending) = mpsc::unbounded_channel();
        Self {
            setting,
            events,
            clock,
            twilight: None,
            evaluation: Mutex::new(()),
            next_wake: StdMutex::new(None),
            subscriptions: StdMutex::new(Vec::new()),
            changes,
            pending: Mutex::new(pending),
        }
    }

    /// Provide sunset and sunrise times for the night modes.
    ///
    /// Without a source those modes resolve to inactive.
    #[must_use]
    pub fn with_twilight(mut self, source: impl TwilightSource + 'static) -> Self {
        self.twilight = Some(Box::new(source));
        self
    }

    pub fn setting(&self) -> &B {
        &self.setting
    }

    /// Recompute the desired state and write it when it differs.
    ///
    /// # Errors
    ///
    /// Propagates store failures of the setting accessor.
    #[tracing::instrument(skip(self))]
    pub async fn reevaluate(&self) -> Result<Evaluation, ModeKeeperError> {
        let _guard = self.evaluation.lock().await;
        let setting = self.setting.load().await?;
        let now = self.clock.now();
        let twilight = self.twilight_for(&setting, now);
        let desired = setting.desired_active(now, twilight);

        let changed = match desired {
            Some(desired) if desired != setting.active => {
                self.setting.set_active(desired).await?;
                tracing::info!(mode = %setting.mode, active = desired, "schedule switched setting");
                true
            }
            _ => false,
        };

        let next_wake = match desired {
            Some(_) => next_wake(&setting, now, twilight),
            None => None,
        };
        *self.next_wake.lock().unwrap_or_else(PoisonError::into_inner) = next_wake;
        tracing::debug!(mode = %setting.mode, ?desired, ?next_wake, "schedule evaluated");

        Ok(Evaluation {
            mode: setting.mode,
            desired,
            changed,
            next_wake,
        })
    }

    /// What the setting should be right now, without writing anything.
    ///
    /// With automation disabled this is the stored manual value.
    ///
    /// # Errors
    ///
    /// Propagates store failures of the setting accessor.
    pub async fn get_computed_active(&self) -> Result<bool, ModeKeeperError> {
        let setting = self.setting.load().await?;
        let now = self.clock.now();
        let twilight = self.twilight_for(&setting, now);
        Ok(setting
            .desired_active(now, twilight)
            .unwrap_or(setting.active))
    }

    /// Persist a new mode and re-evaluate.
    ///
    /// # Errors
    ///
    /// Propagates store failures of the setting accessor.
    #[tracing::instrument(skip(self))]
    pub async fn set_mode(&self, mode: AutoMode) -> Result<Evaluation, ModeKeeperError> {
        self.setting.set_mode(mode).await?;
        self.reevaluate().await
    }

    /// Persist a new window and re-evaluate.
    ///
    /// # Errors
    ///
    /// Propagates store failures of the setting accessor.
    #[tracing::instrument(skip(self, window), fields(window = %window))]
    pub async fn set_window(&self, window: TimeWindow) -> Result<Evaluation, ModeKeeperError> {
        self.setting.set_window(&window.to_string()).await?;
        self.reevaluate().await
    }

    /// Parse `raw` as `"HH:MM,HH:MM"`, then behave like [`set_window`](Self::set_window).
    ///
    /// # Errors
    ///
    /// Returns [`ModeKeeperError::Validation`] for a malformed window; nothing
    /// is written in that case.
    pub async fn set_window_str(&self, raw: &str) -> Result<Evaluation, ModeKeeperError> {
        let window = raw.parse::<TimeWindow>().map_err(ValidationError::from)?;
        self.set_window(window).await
    }

    /// Manually switch the setting.
    ///
    /// Under an active schedule the next evaluation wins again.
    ///
    /// # Errors
    ///
    /// Propagates store failures of the setting accessor.
    pub async fn set_active(&self, active: bool) -> Result<(), ModeKeeperError> {
        self.setting.set_active(active).await
    }

    /// Listen for changes of every key the setting observes.
    ///
    /// Calling it again while subscribed does nothing.
    pub fn subscribe(&self) {
        let mut subscriptions = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !subscriptions.is_empty() {
            return;
        }
        for key in self.setting.observed_keys() {
            let changes = self.changes.clone();
            let callback: SignalCallback = Arc::new(move |signal: &Signal| {
                if let Signal::SettingChanged { key } = signal {
                    let _ = changes.send(key.clone());
                }
            });
            tracing::debug!(%key, "watching setting key");
            subscriptions.push(
                self.events
                    .subscribe(SignalFilter::SettingChanged(key), callback),
            );
        }
    }

    /// Stop listening. Idempotent.
    pub fn unsubscribe(&self) {
        let handles: Vec<SubscriptionHandle> = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for handle in handles {
            self.events.unsubscribe(handle);
        }
    }

    /// Boundary computed by the latest evaluation.
    pub fn next_wake(&self) -> Option<WallClock> {
        *self.next_wake.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Evaluate once if change notifications are queued.
    ///
    /// Any number of queued notifications collapses into one evaluation.
    ///
    /// # Errors
    ///
    /// Propagates store failures of the setting accessor.
    pub async fn process_pending(&self) -> Result<Option<Evaluation>, ModeKeeperError> {
        let queued = match self.pending.try_lock() {
            Ok(mut pending) => drain(&mut pending),
            Err(_) => 0,
        };
        if queued == 0 {
            return Ok(None);
        }
        self.reevaluate().await.map(Some)
    }

    /// Evaluate now, then on every change notification and every boundary.
    ///
    /// Never returns while the automation is alive. Evaluation failures are
    /// logged and retried on the next wake-up.
    pub async fn run(&self) {
        let mut pending = self.pending.lock().await;
        loop {
            if let Err(err) = self.reevaluate().await {
                tracing::warn!(%err, "failed to evaluate schedule");
            }
            let delay = self
                .next_wake()
                .map(|wake| (wake - self.clock.now()).to_std().unwrap_or(Duration::ZERO));

            tokio::select! {
                received = pending.recv() => match received {
                    Some(key) => {
                        let coalesced = drain(&mut pending);
                        tracing::debug!(%key, coalesced, "setting changed");
                    }
                    None => break,
                },
                () = sleep_for(delay) => {
                    tracing::debug!("schedule boundary reached");
                }
            }
        }
    }

    fn twilight_for(&self, setting: &AutomationSetting, now: WallClock) -> Option<Twilight> {
        if !setting.mode.uses_twilight() {
            return None;
        }
        self.twilight
            .as_ref()
            .and_then(|source| source.twilight(now.date()))
    }
}

/// Next boundary, capped at midnight for the modes that depend on twilight,
/// since sunset and sunrise move from one day to the next.
impl<B, E: EventSource, C> Drop for ScheduledAutomation<B, E, C> {
    fn drop(&mut self) {
        let handles = self
            .subscriptions
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        for handle in handles.drain(..) {
            self.events.unsubscribe(handle);
        }
    }
}

fn next_wake(
    setting: &AutomationSetting,
    now: WallClock,
    twilight: Option<Twilight>,
) -> Option<WallClock> {
    let boundary = setting.next_boundary(now, twilight);
    if !setting.mode.uses_twilight() {
        return boundary;
    }
    let midnight = now
        .date()
        .succ_opt()
        .and_then(|tomorrow| tomorrow.and_hms_opt(0, 0, 0));
    match (boundary, midnight) {
        (Some(boundary), Some(midnight)) => Some(boundary.min(midnight)),
        (boundary, midnight) => boundary.or(midnight),
    }
}

fn drain(pending: &mut mpsc::UnboundedReceiver<String>) -> usize {
    let mut count = 0;
    while pending.try_recv().is_ok() {
        count += 1;
    }
    count
}

async fn sleep_for(delay: Option<Duration>) {
    match delay {
        Some(delay) => tokio::time::sleep(delay).await,
        None => std::future::pending().await,
    }
}
