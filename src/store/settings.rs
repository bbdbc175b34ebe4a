//! Operator settings, written by the command surface and polled by the
//! control loop every cycle.

use std::sync::{PoisonError, RwLock};

use crate::config::{ControlSettings, SettingsPatch};

#[derive(Default)]
pub struct SettingsStore {
    settings: RwLock<ControlSettings>,
}

impl SettingsStore {
    pub fn new(settings: ControlSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }

    pub fn get_settings(&self) -> ControlSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply `mutator` under exclusive access.
    pub fn update_settings<R>(&self, mutator: impl FnOnce(&mut ControlSettings) -> R) -> R {
        let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        mutator(&mut settings)
    }

    /// Merge a partial update and return the resulting settings.
    pub fn apply_settings_patch(&self, patch: &SettingsPatch) -> ControlSettings {
        self.update_settings(|s| {
            s.apply(patch);
            s.clone()
        })
    }

    pub fn reset_settings(&self) -> ControlSettings {
        self.update_settings(|s| {
            *s = ControlSettings::default();
            s.clone()
        })
    }
}
