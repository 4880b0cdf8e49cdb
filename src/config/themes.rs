use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Theme choice from the settings panel.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
    System,
}

/// Concrete appearance after `System` has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Appearance {
    Light,
    Dark,
}

impl ThemeMode {
    pub fn resolve(self, system_prefers_dark: bool) -> Appearance {
        match self {
            ThemeMode::Light => Appearance::Light,
            ThemeMode::Dark => Appearance::Dark,
            ThemeMode::System if system_prefers_dark => Appearance::Dark,
            ThemeMode::System => Appearance::Light,
        }
    }
}
