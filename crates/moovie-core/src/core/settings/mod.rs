//! Settings Persistence System
//!
//! Provides persistent player settings with:
//! - Atomic file writes (temp file + rename)
//! - Tolerant loading (missing fields take defaults, bad values are corrected)
//! - A schema version for future migrations
//!
//! Storage location: {config_dir}/moovie/settings.json

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::{CoreError, CoreResult};

/// Settings schema version for migration support
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Application directory name under the platform config dir
pub const APP_DIR_NAME: &str = "moovie";

/// Player settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSettings {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub general: GeneralSettings,

    #[serde(default)]
    pub captions: CaptionSettings,

    #[serde(default)]
    pub playback: PlaybackSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            general: GeneralSettings::default(),
            captions: CaptionSettings::default(),
            playback: PlaybackSettings::default(),
        }
    }
}

impl PlayerSettings {
    /// Corrects out-of-range values instead of failing, so an old or
    /// hand-edited file still loads.
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        let language = self.captions.preferred_language.trim().to_ascii_lowercase();
        if is_language_tag(&language) {
            self.captions.preferred_language = language;
        } else {
            warn!(
                "Invalid preferred caption language '{}', using '{}'",
                self.captions.preferred_language,
                default_language()
            );
            self.captions.preferred_language = default_language();
        }
    }
}

/// Accepts BCP 47-shaped tags such as `en`, `pt-br` or `zh-hant`
fn is_language_tag(value: &str) -> bool {
    let mut parts = value.split('-');
    let primary_ok = parts
        .next()
        .map(|p| (2..=3).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_lowercase()))
        .unwrap_or(false);

    primary_ok
        && parts.all(|p| (1..=8).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_alphanumeric()))
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSettings {
    /// Verbose engine logging
    #[serde(default)]
    pub debug: bool,
}

/// Caption behavior
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaptionSettings {
    /// Pause the player when a cue marked pause-on-exit ends
    #[serde(default = "default_true")]
    pub honor_pause_on_exit: bool,

    /// Language code used to pick the default track (e.g., "en", "ko", "ja")
    #[serde(default = "default_language")]
    pub preferred_language: String,

    /// Show the default track as soon as it loads
    #[serde(default = "default_true")]
    pub auto_show_default: bool,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            honor_pause_on_exit: true,
            preferred_language: default_language(),
            auto_show_default: true,
        }
    }
}

/// Playback behavior
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSettings {
    /// Pause the host when playback ends, whatever its own flag says.
    ///
    /// Turning this off only stops the session from calling the host. The
    /// machine still enters `Ended` and reports the forced pause.
    #[serde(default = "default_true")]
    pub force_pause_on_end: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            force_pause_on_end: true,
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_true() -> bool {
    true
}

/// Platform config directory for the player, if the platform has one
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME))
}

// =============================================================================
// Settings Manager
// =============================================================================

/// Settings manager for loading, saving, and resetting settings
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Create a new settings manager rooted at the given config directory
    pub fn new(config_dir: PathBuf) -> Self {
        Self {
            settings_path: config_dir.join(SETTINGS_FILE),
        }
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Load settings from disk, returning defaults if the file is missing or unreadable
    pub fn load(&self) -> PlayerSettings {
        match self.try_load() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                PlayerSettings::default()
            }
        }
    }

    fn try_load(&self) -> CoreResult<PlayerSettings> {
        if !self.settings_path.exists() {
            info!("Settings file not found, using defaults");
            return Ok(PlayerSettings::default());
        }

        let content = fs::read_to_string(&self.settings_path)?;
        let mut settings = serde_json::from_str::<PlayerSettings>(&content)?;

        if settings.version < SETTINGS_VERSION {
            info!(
                "Migrating settings from version {} to {}",
                settings.version, SETTINGS_VERSION
            );
        }

        settings.normalize();
        Ok(settings)
    }

    /// Save settings to disk using atomic write (temp file + rename)
    pub fn save(&self, settings: &PlayerSettings) -> CoreResult<PlayerSettings> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CoreError::Settings(format!("Failed to create settings directory: {}", e))
            })?;
        }

        let mut normalized = settings.clone();
        normalized.normalize();

        let content = serde_json::to_string_pretty(&normalized)?;

        let temp_path = self.settings_path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }

        // std::fs::rename does not overwrite on Windows
        if cfg!(windows) && self.settings_path.exists() {
            fs::remove_file(&self.settings_path)?;
        }
        fs::rename(&temp_path, &self.settings_path).map_err(|e| {
            CoreError::Settings(format!("Failed to finalize settings file: {}", e))
        })?;

        info!("Settings saved to {:?}", self.settings_path);
        Ok(normalized)
    }

    /// Reset settings to defaults and delete the settings file
    pub fn reset(&self) -> CoreResult<PlayerSettings> {
        if self.settings_path.exists() {
            fs::remove_file(&self.settings_path)?;
            info!("Settings file deleted");
        }
        Ok(PlayerSettings::default())
    }
}
