use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Deserializer, Serialize};

pub mod themes;

pub use themes::{Appearance, ThemeMode};

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "Rafiq";
const APP_NAME: &str = "rafiq";
const CONFIG_ENV: &str = "RAFIQ_CONFIG";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            paths: ConfigPaths::for_file(path.into()),
        }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Reads the settings file if there is one. Nothing is ever written back.
    pub fn load(&self) -> Result<AppConfig> {
        if !self.paths.config_file.exists() {
            tracing::debug!(
                path = %self.paths.config_file.display(),
                "no settings file, using defaults"
            );
            return Ok(AppConfig::default());
        }
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        AppConfig::from_toml(&raw)
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        if let Some(path) = env::var_os(CONFIG_ENV).map(PathBuf::from) {
            return Ok(Self::for_file(path));
        }
        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;
        let config_dir = project_dirs.config_dir().to_path_buf();
        Ok(Self {
            config_file: config_dir.join("config.toml"),
            config_dir,
        })
    }

    fn for_file(path: PathBuf) -> Self {
        if path.is_dir() {
            return Self {
                config_file: path.join("config.toml"),
                config_dir: path,
            };
        }
        let config_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            config_dir,
            config_file: path,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub appearance: AppearanceSettings,
    pub notifications: NotificationSettings,
    pub privacy: PrivacySettings,
    pub preferences: Preferences,
    pub profile: ParentProfile,
    pub messages: MessageOptions,
}

impl AppConfig {
    pub fn from_toml(raw: &str) -> Result<Self> {
        let mut cfg: AppConfig = toml::from_str(raw).context("parsing config toml")?;
        cfg.post_load();
        Ok(cfg)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serializing config")
    }

    fn post_load(&mut self) {
        if self.messages.preview_chars == 0 {
            tracing::warn!("messages.preview_chars is 0, falling back to default");
            self.messages.preview_chars = MessageOptions::default().preview_chars;
        }
    }
}

const MAX_VOLUME: u8 = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceSettings {
    pub theme: ThemeMode,
    pub compact_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub email: bool,
    pub push: bool,
    pub sms: bool,
    pub progress_updates: bool,
    pub weekly_reports: bool,
    pub achievements: bool,
    pub alerts: bool,
    pub reminders: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email: true,
            push: true,
            sms: false,
            progress_updates: true,
            weekly_reports: true,
            achievements: true,
            alerts: true,
            reminders: true,
        }
    }
}

impl NotificationSettings {
    /// Number of switched-on channels and topics, shown as the settings badge.
    pub fn enabled_count(&self) -> usize {
        [
            self.email,
            self.push,
            self.sms,
            self.progress_updates,
            self.weekly_reports,
            self.achievements,
            self.alerts,
            self.reminders,
        ]
        .into_iter()
        .filter(|enabled| *enabled)
        .count()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileVisibility {
    Public,
    #[default]
    Private,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacySettings {
    pub profile_visibility: ProfileVisibility,
    pub data_sharing: bool,
    pub analytics: bool,
    pub child_data_protection: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            profile_visibility: ProfileVisibility::Private,
            data_sharing: false,
            analytics: true,
            child_data_protection: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub language: String,
    pub timezone: String,
    pub date_format: String,
    pub sound_enabled: bool,
    /// 0..=100; anything outside is clamped on load.
    #[serde(deserialize_with = "clamped_volume")]
    pub volume: u8,
}

fn clamped_volume<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    let volume = raw.clamp(0, i64::from(MAX_VOLUME));
    if volume != raw {
        tracing::warn!(volume = raw, "volume outside 0..={MAX_VOLUME}, clamping");
    }
    Ok(u8::try_from(volume).unwrap_or(MAX_VOLUME))
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            language: "English".into(),
            timezone: "America/New_York".into(),
            date_format: "MM/DD/YYYY".into(),
            sound_enabled: true,
            volume: 75,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParentProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
}

impl Default for ParentProfile {
    fn default() -> Self {
        Self {
            name: "Sarah Johnson".into(),
            email: "sarah.johnson@email.com".into(),
            phone: "+1 (555) 123-4567".into(),
            role: "Premium Parent".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageOptions {
    /// Graphemes of the last message shown in the conversation list.
    pub preview_chars: usize,
}

impl Default for MessageOptions {
    fn default() -> Self {
        Self { preview_chars: 30 }
    }
}
