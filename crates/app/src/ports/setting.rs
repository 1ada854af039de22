//! Binary setting port — accessor for an automated on/off setting.

use std::future::Future;

use modekeeper_domain::error::ModeKeeperError;
use modekeeper_domain::schedule::{AutoMode, AutomationSetting};

/// Persisted state of one automated binary setting.
///
/// Writes to any of the observed keys must be announced as
/// [`SettingChanged`](modekeeper_domain::signal::Signal::SettingChanged)
/// signals so that subscribed automations re-evaluate.
pub trait BinarySetting: Send + Sync {
    fn mode(&self) -> impl Future<Output = Result<AutoMode, ModeKeeperError>> + Send;

    /// Raw window string, `None` when never set.
    fn window(&self) -> impl Future<Output = Result<Option<String>, ModeKeeperError>> + Send;

    fn is_active(&self) -> impl Future<Output = Result<bool, ModeKeeperError>> + Send;

    fn set_active(&self, active: bool)
    -> impl Future<Output = Result<(), ModeKeeperError>> + Send;

    fn set_mode(&self, mode: AutoMode) -> impl Future<Output = Result<(), ModeKeeperError>> + Send;

    fn set_window(&self, window: &str) -> impl Future<Output = Result<(), ModeKeeperError>> + Send;

    /// Keys whose changes must trigger a re-evaluation.
    fn observed_keys(&self) -> Vec<String>;

    /// Read mode, window and active flag together.
    fn load(&self) -> impl Future<Output = Result<AutomationSetting, ModeKeeperError>> + Send {
        async {
            Ok(AutomationSetting {
                mode: self.mode().await?,
                window: self.window().await?,
                active: self.is_active().await?,
            })
        }
    }
}

impl<T: BinarySetting> BinarySetting for std::sync::Arc<T> {
    fn mode(&self) -> impl Future<Output = Result<AutoMode, ModeKeeperError>> + Send {
        (**self).mode()
    }

    fn window(&self) -> impl Future<Output = Result<Option<String>, ModeKeeperError>> + Send {
        (**self).window()
    }

    fn is_active(&self) -> impl Future<Output = Result<bool, ModeKeeperError>> + Send {
        (**self).is_active()
    }

    fn set_active(
        &self,
        active: bool,
    ) -> impl Future<Output = Result<(), ModeKeeperError>> + Send {
        (**self).set_active(active)
    }

    fn set_mode(&self, mode: AutoMode) -> impl Future<Output = Result<(), ModeKeeperError>> + Send {
        (**self).set_mode(mode)
    }

    fn set_window(&self, window: &str) -> impl Future<Output = Result<(), ModeKeeperError>> + Send {
        (**self).set_window(window)
    }

    fn observed_keys(&self) -> Vec<String> {
        (**self).observed_keys()
    }
}
