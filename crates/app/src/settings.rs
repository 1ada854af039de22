//! Store-backed [`BinarySetting`] accessor.

use std::sync::Arc;

use modekeeper_domain::error::ModeKeeperError;
use modekeeper_domain::schedule::AutoMode;
use modekeeper_domain::signal::Signal;

use crate::ports::{BinarySetting, KeyValueStore};
use crate::signal_bus::SignalBus;

/// Store keys holding the three fields of an automated setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingKeys {
    /// Int [`AutoMode`] code.
    pub mode: String,
    /// `"HH:MM,HH:MM"` string.
    pub window: String,
    /// Int `1`/`0`.
    pub active: String,
}

impl SettingKeys {
    /// `<prefix>.mode`, `<prefix>.window` and `<prefix>.active`.
    #[must_use]
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            mode: format!("{prefix}.mode"),
            window: format!("{prefix}.window"),
            active: format!("{prefix}.active"),
        }
    }
}

/// [`BinarySetting`] persisted in a [`KeyValueStore`].
///
/// When attached to a [`SignalBus`] with [`notify`](Self::notify), every
/// write is announced as a [`Signal::SettingChanged`] for the written key.
pub struct StoredBinarySetting<S> {
    store: S,
    keys: SettingKeys,
    bus: Option<Arc<SignalBus>>,
}

impl<S: KeyValueStore> StoredBinarySetting<S> {
    pub fn new(store: S, keys: SettingKeys) -> Self {
        Self {
            store,
            keys,
            bus: None,
        }
    }

    #[must_use]
    pub fn notify(mut self, bus: Arc<SignalBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn keys(&self) -> &SettingKeys {
        &self.keys
    }

    fn announce(&self, key: &str) {
        if let Some(bus) = &self.bus {
            bus.emit(&Signal::setting_changed(key));
        }
    }
}

impl<S: KeyValueStore> BinarySetting for StoredBinarySetting<S> {
    async fn mode(&self) -> Result<AutoMode, ModeKeeperError> {
        let code = self
            .store
            .get_int(&self.keys.mode, AutoMode::Disabled.code())
            .await?;
        Ok(AutoMode::from_code(code))
    }

    async fn window(&self) -> Result<Option<String>, ModeKeeperError> {
        self.store.get_string(&self.keys.window).await
    }

    async fn is_active(&self) -> Result<bool, ModeKeeperError> {
        Ok(self.store.get_int(&self.keys.active, 0).await? == 1)
    }

    async fn set_active(&self, active: bool) -> Result<(), ModeKeeperError> {
        self.store
            .put_int(&self.keys.active, i64::from(active))
            .await?;
        self.announce(&self.keys.active);
        Ok(())
    }

    async fn set_mode(&self, mode: AutoMode) -> Result<(), ModeKeeperError> {
        self.store.put_int(&self.keys.mode, mode.code()).await?;
        self.announce(&self.keys.mode);
        Ok(())
    }

    async fn set_window(&self, window: &str) -> Result<(), ModeKeeperError> {
        self.store.put_string(&self.keys.window, window).await?;
        self.announce(&self.keys.window);
        Ok(())
    }

    fn observed_keys(&self) -> Vec<String> {
        vec![
            self.keys.mode.clone(),
            self.keys.window.clone(),
            self.keys.active.clone(),
        ]
    }
}
