//! Override engine — transient modes with guaranteed restore.
//!
//! Activating a mode captures the current value of every enabled toggle,
//! persists that snapshot, applies the override values, arms the revert
//! triggers and publishes the persistent indicator. Deactivating writes the
//! captured values back for exactly the toggles present in the snapshot.
//!
//! Revert triggers and the indicator's stop action never call the engine
//! directly: they enqueue a [`RevertRequest`] that [`OverrideEngine::run`]
//! (or [`OverrideEngine::drain_pending`]) processes under the engine lock.
//! A request is honoured only while its session is still the active one, so
//! any number of concurrent firings ends the session exactly once.
//!
//! The persisted active marker is checked before any lifecycle call acts on
//! an inactive engine. A session left active by a previous process is
//! adopted rather than overwritten, so its snapshot survives until it has
//! been restored.

mod report;

pub use report::{ActivationReport, RestoreReport, ToggleFailure};

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, mpsc};

use modekeeper_domain::error::{ModeKeeperError, NotFoundError, ValidationError};
use modekeeper_domain::id::{SessionId, ToggleId};
use modekeeper_domain::session::{RevertReason, SessionState};
use modekeeper_domain::signal::Signal;
use modekeeper_domain::snapshot::{
    SESSION_ACTIVE_KEY, SESSION_APPLIED_KEY, SESSION_ID_KEY, SNAPSHOT_KEY_PREFIX, Snapshot,
};
use modekeeper_domain::toggle::FeatureToggle;
use modekeeper_domain::trigger::RevertTrigger;
use modekeeper_domain::value::SettingValue;

use crate::ports::{
    EventSource, Indicator, KeyValueStore, NotificationSink, SignalCallback, StopAction,
    StoredValue, SubscriptionHandle, ToggleCapability,
};

/// Deactivation request emitted by a fired trigger or the stop action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertRequest {
    /// Session the request was armed for.
    pub session: SessionId,
    pub reason: RevertReason,
}

struct RegisteredToggle {
    toggle: FeatureToggle,
    capability: Box<dyn ToggleCapability>,
}

/// State guarded by the engine lock.
struct Inner {
    state: SessionState,
    session: Option<SessionId>,
    armed: Vec<SubscriptionHandle>,
    toggles: Vec<RegisteredToggle>,
}

/// Step-by-step builder for [`OverrideEngine`].
pub struct OverrideEngineBuilder<S, E, N> {
    name: String,
    store: S,
    events: E,
    sink: N,
    toggles: Vec<RegisteredToggle>,
    triggers: Vec<RevertTrigger>,
}

impl<S, E, N> OverrideEngineBuilder<S, E, N>
where
    S: KeyValueStore,
    E: EventSource,
    N: NotificationSink,
{
    /// Register a toggle and the capability it controls.
    ///
    /// Registration order is the order overrides are applied and restored in.
    #[must_use]
    pub fn toggle(
        mut self,
        toggle: FeatureToggle,
        capability: impl ToggleCapability + 'static,
    ) -> Self {
        self.toggles.push(RegisteredToggle {
            toggle,
            capability: Box::new(capability),
        });
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger: RevertTrigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    #[must_use]
    pub fn triggers(mut self, triggers: impl IntoIterator<Item = RevertTrigger>) -> Self {
        self.triggers.extend(triggers);
        self
    }

    /// Validate the registry and build the engine in the `Inactive` state.
    ///
    /// # Errors
    ///
    /// Returns [`ModeKeeperError::Validation`] when the mode name is empty,
    /// a toggle is invalid, or a toggle id is registered twice.
    pub fn build(self) -> Result<OverrideEngine<S, E, N>, ModeKeeperError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyLabel.into());
        }
        let mut seen = HashSet::new();
        for entry in &self.toggles {
            entry.toggle.validate()?;
            if !seen.insert(&entry.toggle.id) {
                return Err(ValidationError::DuplicateToggle(entry.toggle.id.to_string()).into());
            }
        }

        let (requests, pending) = mpsc::unbounded_channel();
        Ok(OverrideEngine {
            name: self.name,
            store: self.store,
            events: self.events,
            sink: self.sink,
            triggers: self.triggers,
            inner: Mutex::new(Inner {
                state: SessionState::Inactive,
                session: None,
                armed: Vec::new(),
                toggles: self.toggles,
            }),
            active: AtomicBool::new(false),
            requests,
            pending: Mutex::new(pending),
        })
    }
}

/// Applies a named mode on top of the current device state and restores it.
///
/// Dropping the engine releases its armed trigger subscriptions. A session
/// that is still active stays persisted for the next process to resume.
pub struct OverrideEngine<S, E: EventSource, N> {
    name: String,
    store: S,
    events: E,
    sink: N,
    triggers: Vec<RevertTrigger>,
    inner: Mutex<Inner>,
    active: AtomicBool,
    requests: mpsc::UnboundedSender<RevertRequest>,
    pending: Mutex<mpsc::UnboundedReceiver<RevertRequest>>,
}

impl<S, E, N> OverrideEngine<S, E, N>
where
    S: KeyValueStore,
    E: EventSource,
    N: NotificationSink,
{
    /// Start building an engine for the mode called `name`.
    ///
    /// `store` must be dedicated to this engine: the snapshot overwrite
    /// replaces its whole content.
    pub fn builder(
        name: impl Into<String>,
        store: S,
        events: E,
        sink: N,
    ) -> OverrideEngineBuilder<S, E, N> {
        OverrideEngineBuilder {
            name: name.into(),
            store,
            events,
            sink,
            toggles: Vec::new(),
            triggers: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a session is active. Never blocks.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> SessionState {
        if self.is_active() {
            SessionState::Active
        } else {
            SessionState::Inactive
        }
    }

    /// Current toggle registry, in registration order.
    pub async fn toggles(&self) -> Vec<FeatureToggle> {
        let inner = self.inner.lock().await;
        inner.toggles.iter().map(|entry| entry.toggle.clone()).collect()
    }

    /// Activate the mode. No-op when already active.
    ///
    /// Also a no-op when the store still holds an active session from a
    /// previous process: that session is adopted instead, keeping its
    /// snapshot as the restore target.
    ///
    /// # Errors
    ///
    /// Returns [`ModeKeeperError::StoreUnavailable`] when the snapshot cannot
    /// be persisted. Nothing has been applied in that case.
    #[tracing::instrument(skip(self), fields(mode = %self.name))]
    pub async fn activate(&self) -> Result<ActivationReport, ModeKeeperError> {
        let mut inner = self.inner.lock().await;
        self.activate_locked(&mut inner).await
    }

    /// Deactivate the mode and restore the snapshot. No-op when inactive.
    ///
    /// A session persisted by a previous process counts as active here, so
    /// calling this before [`resume`](Self::resume) still restores it.
    ///
    /// # Errors
    ///
    /// Returns [`ModeKeeperError::StoreUnavailable`] when the snapshot cannot
    /// be loaded or the inactive marker cannot be written. The engine stays
    /// active in that case and the call may be retried.
    #[tracing::instrument(skip(self), fields(mode = %self.name))]
    pub async fn deactivate(&self) -> Result<RestoreReport, ModeKeeperError> {
        let mut inner = self.inner.lock().await;
        self.deactivate_locked(&mut inner, None).await
    }

    /// Activate when inactive, deactivate when active.
    ///
    /// # Errors
    ///
    /// Same as [`activate`](Self::activate) and [`deactivate`](Self::deactivate).
    #[tracing::instrument(skip(self), fields(mode = %self.name))]
    pub async fn toggle(&self) -> Result<SessionState, ModeKeeperError> {
        let mut inner = self.inner.lock().await;
        let active = inner.state.is_active() || self.adopt_persisted(&mut inner).await?;
        if active {
            self.deactivate_locked(&mut inner, None).await?;
        } else {
            self.activate_locked(&mut inner).await?;
        }
        Ok(inner.state)
    }

    /// Pick up a session that was still active when the process stopped.
    ///
    /// Re-arms the triggers and re-publishes the indicator. Capabilities and
    /// the persisted snapshot are left untouched, so a later deactivation
    /// restores the values captured before the restart. The indicator lists
    /// the toggles whose override was applied, like the original activation.
    ///
    /// # Errors
    ///
    /// Returns [`ModeKeeperError::StoreUnavailable`] when the store cannot be read.
    #[tracing::instrument(skip(self), fields(mode = %self.name))]
    pub async fn resume(&self) -> Result<SessionState, ModeKeeperError> {
        let mut inner = self.inner.lock().await;
        if inner.state.is_active() {
            return Ok(inner.state);
        }
        if !self.adopt_persisted(&mut inner).await? {
            tracing::debug!("no persisted session to resume");
            return Ok(SessionState::Inactive);
        }
        Ok(SessionState::Active)
    }

    /// Include or exclude a toggle from future activations.
    ///
    /// An active session is not affected: restores follow the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ModeKeeperError::NotFound`] for an unregistered id.
    #[tracing::instrument(skip(self), fields(mode = %self.name))]
    pub async fn set_toggle_enabled(
        &self,
        id: &ToggleId,
        enabled: bool,
    ) -> Result<(), ModeKeeperError> {
        let mut inner = self.inner.lock().await;
        let entry = find_toggle(&mut inner.toggles, id)?;
        entry.toggle.enabled_by_user = enabled;
        Ok(())
    }

    /// Change the value a toggle is overridden with on the next activation.
    ///
    /// # Errors
    ///
    /// Returns [`ModeKeeperError::NotFound`] for an unregistered id and
    /// [`ModeKeeperError::Validation`] for an out-of-range value.
    #[tracing::instrument(skip(self, value), fields(mode = %self.name))]
    pub async fn set_override_value(
        &self,
        id: &ToggleId,
        value: SettingValue,
    ) -> Result<(), ModeKeeperError> {
        value.validate()?;
        let mut inner = self.inner.lock().await;
        let entry = find_toggle(&mut inner.toggles, id)?;
        entry.toggle.override_value = value;
        Ok(())
    }

    /// Process revert requests until the engine is dropped.
    ///
    /// While this runs, [`drain_pending`](Self::drain_pending) finds nothing.
    pub async fn run(&self) {
        let mut pending = self.pending.lock().await;
        while let Some(request) = pending.recv().await {
            if let Err(err) = self.handle_request(request).await {
                tracing::error!(%err, mode = %self.name, "failed to revert mode");
            }
        }
    }

    /// Process the revert requests queued so far without waiting for more.
    ///
    /// Returns the number of requests that ended a session.
    pub async fn drain_pending(&self) -> usize {
        let Ok(mut pending) = self.pending.try_lock() else {
            return 0;
        };
        let mut ended = 0;
        while let Ok(request) = pending.try_recv() {
            match self.handle_request(request).await {
                Ok(Some(_)) => ended += 1,
                Ok(None) => {}
                Err(err) => tracing::error!(%err, mode = %self.name, "failed to revert mode"),
            }
        }
        ended
    }

    async fn handle_request(
        &self,
        request: RevertRequest,
    ) -> Result<Option<RestoreReport>, ModeKeeperError> {
        let mut inner = self.inner.lock().await;
        if !inner.state.is_active() || inner.session != Some(request.session) {
            tracing::debug!(session = %request.session, reason = %request.reason, "ignoring stale revert request");
            return Ok(None);
        }
        tracing::info!(reason = %request.reason, "reverting mode");
        self.deactivate_locked(&mut inner, Some(request.reason))
            .await
            .map(Some)
    }

    async fn activate_locked(&self, inner: &mut Inner) -> Result<ActivationReport, ModeKeeperError> {
        if inner.state.is_active() {
            tracing::debug!("mode already active");
            return Ok(ActivationReport::default());
        }
        if self.adopt_persisted(inner).await? {
            tracing::warn!("persisted session still active, keeping its snapshot");
            return Ok(ActivationReport::default());
        }

        let session = SessionId::new();
        let mut report = ActivationReport::started(session);
        let mut snapshot = Snapshot::new(session);
        for entry in inner.toggles.iter().filter(|entry| entry.toggle.enabled_by_user) {
            match entry.capability.read() {
                Ok(prior) => snapshot.insert(entry.toggle.id.clone(), prior),
                Err(err) => {
                    tracing::warn!(%err, toggle = %entry.toggle.id, "cannot read toggle, leaving it untouched");
                    report.skipped.push(ToggleFailure {
                        toggle: entry.toggle.id.clone(),
                        error: err,
                    });
                }
            }
        }

        self.persist_snapshot(&snapshot).await?;

        let mut labels = Vec::new();
        for entry in inner
            .toggles
            .iter()
            .filter(|entry| snapshot.contains(&entry.toggle.id))
        {
            match entry.capability.write(&entry.toggle.override_value) {
                Ok(()) => {
                    report.applied.push(entry.toggle.id.clone());
                    labels.push(entry.toggle.label.clone());
                }
                Err(err) => {
                    tracing::warn!(%err, toggle = %entry.toggle.id, "failed to apply override");
                    report.failed.push(ToggleFailure {
                        toggle: entry.toggle.id.clone(),
                        error: err,
                    });
                }
            }
        }

        let applied: Vec<String> = report.applied.iter().map(ToString::to_string).collect();
        if let Err(err) = self
            .store
            .put_string(SESSION_APPLIED_KEY, &applied.join(","))
            .await
        {
            tracing::warn!(%err, "failed to persist applied toggles");
        }

        let participating: Vec<ToggleId> = snapshot.iter().map(|(id, _)| id.clone()).collect();
        inner.armed = self.arm_triggers(session, &participating);
        self.sink.show(self.indicator(session, &labels));
        inner.state = SessionState::Active;
        inner.session = Some(session);
        self.active.store(true, Ordering::SeqCst);
        tracing::info!(
            %session,
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "mode activated"
        );
        Ok(report)
    }

    async fn deactivate_locked(
        &self,
        inner: &mut Inner,
        reason: Option<RevertReason>,
    ) -> Result<RestoreReport, ModeKeeperError> {
        if !inner.state.is_active() && !self.adopt_persisted(inner).await? {
            tracing::debug!("mode already inactive");
            return Ok(RestoreReport::default());
        }

        let snapshot = self.load_snapshot().await?;
        let mut report = RestoreReport {
            session: inner.session,
            reason,
            ..RestoreReport::default()
        };
        for entry in &inner.toggles {
            let Some(prior) = snapshot.get(&entry.toggle.id) else {
                continue;
            };
            match entry.capability.write(prior) {
                Ok(()) => report.restored.push(entry.toggle.id.clone()),
                Err(err) => {
                    tracing::warn!(%err, toggle = %entry.toggle.id, "failed to restore toggle");
                    report.failed.push(ToggleFailure {
                        toggle: entry.toggle.id.clone(),
                        error: err,
                    });
                }
            }
        }
        for (id, _) in snapshot.iter() {
            if !inner.toggles.iter().any(|entry| entry.toggle.id == *id) {
                tracing::warn!(toggle = %id, "snapshot entry has no registered toggle");
                report.orphaned.push(id.clone());
            }
        }

        self.store
            .put_int(SESSION_ACTIVE_KEY, SessionState::Inactive.marker())
            .await?;

        for handle in inner.armed.drain(..) {
            self.events.unsubscribe(handle);
        }
        self.sink.dismiss();
        inner.state = SessionState::Inactive;
        inner.session = None;
        self.active.store(false, Ordering::SeqCst);
        tracing::info!(
            restored = report.restored.len(),
            failed = report.failed.len(),
            "mode deactivated"
        );
        Ok(report)
    }

    /// Take over a session the store still marks active.
    ///
    /// Returns `false` when there is none. Nothing is written: triggers are
    /// armed for the persisted session and its indicator is shown again.
    async fn adopt_persisted(&self, inner: &mut Inner) -> Result<bool, ModeKeeperError> {
        let marker = self
            .store
            .get_int(SESSION_ACTIVE_KEY, SessionState::Inactive.marker())
            .await?;
        if !SessionState::from_marker(marker).is_active() {
            return Ok(false);
        }

        let snapshot = self.load_snapshot().await?;
        let applied = self.load_applied().await?;
        let session = snapshot.session_id().unwrap_or_default();
        let participating: Vec<ToggleId> = snapshot.iter().map(|(id, _)| id.clone()).collect();
        let labels: Vec<String> = inner
            .toggles
            .iter()
            .filter(|entry| match &applied {
                Some(applied) => applied.contains(&entry.toggle.id),
                None => snapshot.contains(&entry.toggle.id),
            })
            .map(|entry| entry.toggle.label.clone())
            .collect();

        inner.armed = self.arm_triggers(session, &participating);
        self.sink.show(self.indicator(session, &labels));
        inner.state = SessionState::Active;
        inner.session = Some(session);
        self.active.store(true, Ordering::SeqCst);
        tracing::info!(%session, toggles = participating.len(), "resumed persisted session");
        Ok(true)
    }

    /// Ids recorded as applied, `None` when the store predates the record.
    async fn load_applied(&self) -> Result<Option<HashSet<ToggleId>>, ModeKeeperError> {
        let Some(raw) = self.store.get_string(SESSION_APPLIED_KEY).await? else {
            return Ok(None);
        };
        let applied = raw
            .split(',')
            .filter(|part| !part.is_empty())
            .filter_map(|part| match ToggleId::new(part) {
                Ok(id) => Some(id),
                Err(err) => {
                    tracing::warn!(%err, value = %part, "ignoring malformed applied toggle id");
                    None
                }
            })
            .collect();
        Ok(Some(applied))
    }

    /// Overwrite the store with `snapshot` and the active session markers.
    async fn persist_snapshot(&self, snapshot: &Snapshot) -> Result<(), ModeKeeperError> {
        let mut entries: Vec<(String, StoredValue)> = snapshot
            .to_entries()
            .map_err(|err| ModeKeeperError::StoreUnavailable(Box::new(err)))?
            .into_iter()
            .map(|(key, json)| (key, StoredValue::Text(json)))
            .collect();
        if let Some(session) = snapshot.session_id() {
            entries.push((
                SESSION_ID_KEY.to_string(),
                StoredValue::Text(session.to_string()),
            ));
        }
        entries.push((
            SESSION_ACTIVE_KEY.to_string(),
            StoredValue::Int(SessionState::Active.marker()),
        ));
        self.store.replace_all(entries).await
    }

    async fn load_snapshot(&self) -> Result<Snapshot, ModeKeeperError> {
        let mut snapshot = Snapshot::default();
        if let Some(raw) = self.store.get_string(SESSION_ID_KEY).await? {
            match raw.parse::<SessionId>() {
                Ok(session) => snapshot.set_session_id(session),
                Err(err) => tracing::warn!(%err, value = %raw, "ignoring malformed session id"),
            }
        }
        let keys = self.store.keys().await?;
        for key in keys.iter().filter(|key| key.starts_with(SNAPSHOT_KEY_PREFIX)) {
            let Some(payload) = self.store.get_string(key).await? else {
                continue;
            };
            if let Err(err) = snapshot.insert_entry(key, &payload) {
                tracing::warn!(%err, "ignoring undecodable snapshot entry");
            }
        }
        Ok(snapshot)
    }

    fn arm_triggers(&self, session: SessionId, participating: &[ToggleId]) -> Vec<SubscriptionHandle> {
        self.triggers
            .iter()
            .filter(|trigger| {
                let arm = trigger.should_arm(participating.iter());
                if !arm {
                    tracing::debug!(%trigger, "revert trigger suppressed");
                }
                arm
            })
            .map(|trigger| {
                let fired = AtomicBool::new(false);
                let requests = self.requests.clone();
                let filter = trigger.on.clone();
                let callback: SignalCallback = Arc::new(move |signal: &Signal| {
                    if fired.swap(true, Ordering::SeqCst) {
                        return;
                    }
                    tracing::debug!(%signal, "revert trigger fired");
                    let _ = requests.send(RevertRequest {
                        session,
                        reason: RevertReason::Trigger(filter.clone()),
                    });
                });
                tracing::debug!(%trigger, "arming revert trigger");
                self.events.subscribe(trigger.on.clone(), callback)
            })
            .collect()
    }

    fn indicator(&self, session: SessionId, labels: &[String]) -> Indicator {
        let requests = self.requests.clone();
        Indicator {
            title: self.name.clone(),
            summary: labels.join(", "),
            stop: StopAction::new(move || {
                let _ = requests.send(RevertRequest {
                    session,
                    reason: RevertReason::UserStop,
                });
            }),
        }
    }
}

impl<S, E: EventSource, N> Drop for OverrideEngine<S, E, N> {
    fn drop(&mut self) {
        for handle in self.inner.get_mut().armed.drain(..) {
            self.events.unsubscribe(handle);
        }
    }
}

fn find_toggle<'a>(
    toggles: &'a mut [RegisteredToggle],
    id: &ToggleId,
) -> Result<&'a mut RegisteredToggle, NotFoundError> {
    toggles
        .iter_mut()
        .find(|entry| entry.toggle.id == *id)
        .ok_or_else(|| NotFoundError {
            entity: "FeatureToggle",
            id: id.to_string(),
        })
}
