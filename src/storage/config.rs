//! JSON Configuration Management
//!
//! Reads and writes the auto-approval settings file and exposes settings
//! snapshots to the dispatcher through `SettingsProvider`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::models::settings::{AutoApprovalSettings, SettingsUpdate};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{ensure_dir, settings_path};

/// Source of the settings snapshot taken for each approval decision.
///
/// `None` means no settings are available yet; every decision then asks.
pub trait SettingsProvider: Send + Sync {
    fn settings(&self) -> Option<AutoApprovalSettings>;
}

/// Fixed settings, for tests and hosts that push settings in-memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSettings(pub Option<AutoApprovalSettings>);

impl StaticSettings {
    pub fn new(settings: AutoApprovalSettings) -> Self {
        Self(Some(settings))
    }

    /// A provider that never has settings.
    pub fn none() -> Self {
        Self(None)
    }
}

impl SettingsProvider for StaticSettings {
    fn settings(&self) -> Option<AutoApprovalSettings> {
        self.0.clone()
    }
}

impl<P: SettingsProvider> SettingsProvider for RwLock<P> {
    fn settings(&self) -> Option<AutoApprovalSettings> {
        self.read().ok().and_then(|inner| inner.settings())
    }
}

/// Configuration service for the auto-approval settings file
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    settings: AutoApprovalSettings,
}

impl ConfigService {
    /// Open ~/.agent-gate/auto-approval.json, creating it with defaults
    pub fn new() -> AppResult<Self> {
        Self::open(settings_path()?)
    }

    /// Open a settings file at an explicit path, creating it with defaults
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let config_path = path.into();
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_dir(parent)?;
            }
        }

        let settings = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            let defaults = AutoApprovalSettings::default();
            Self::save_to_file(&config_path, &defaults)?;
            tracing::info!("[config] wrote default settings to {}", config_path.display());
            defaults
        };

        Ok(Self {
            config_path,
            settings,
        })
    }

    /// Load settings from a file
    fn load_from_file(path: &Path) -> AppResult<AutoApprovalSettings> {
        let content = fs::read_to_string(path)?;
        let settings: AutoApprovalSettings = serde_json::from_str(&content)?;
        settings.validate().map_err(AppError::validation)?;
        Ok(settings)
    }

    /// Save settings to a file with pretty formatting
    fn save_to_file(path: &Path, settings: &AutoApprovalSettings) -> AppResult<()> {
        settings.validate().map_err(AppError::validation)?;
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get the current settings
    pub fn get_settings(&self) -> &AutoApprovalSettings {
        &self.settings
    }

    /// Apply a partial update and persist it.
    ///
    /// An update that fails validation leaves both memory and disk untouched.
    pub fn update_settings(&mut self, update: SettingsUpdate) -> AppResult<AutoApprovalSettings> {
        let mut next = self.settings.clone();
        next.apply_update(update);
        Self::save_to_file(&self.config_path, &next)?;
        self.settings = next;
        Ok(self.settings.clone())
    }

    /// Save the current settings to disk
    pub fn save(&self) -> AppResult<()> {
        Self::save_to_file(&self.config_path, &self.settings)
    }

    /// Reload settings from disk
    pub fn reload(&mut self) -> AppResult<()> {
        self.settings = Self::load_from_file(&self.config_path)?;
        Ok(())
    }

    /// Reset settings to defaults
    pub fn reset(&mut self) -> AppResult<()> {
        self.settings = AutoApprovalSettings::default();
        self.save()
    }
}

impl SettingsProvider for ConfigService {
    fn settings(&self) -> Option<AutoApprovalSettings> {
        Some(self.settings.clone())
    }
}
