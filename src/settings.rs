use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

pub const DEFAULT_FOCUS_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_EMOTION_URL: &str = "http://127.0.0.1:5001";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StudySyncSettings {
    /// Session lifecycle + focus analysis backend.
    pub focus_base_url: String,
    /// Emotion classifier backend.
    pub emotion_base_url: String,
    pub sample_period_ms: u64,
    pub request_timeout_ms: u64,
    pub capture_timeout_ms: u64,
    pub frame_path: Option<PathBuf>,
    pub jpeg_quality: u8,
    pub principal: Option<String>,
    /// Stop the session automatically after this long.
    pub max_session_secs: Option<u64>,
}

impl Default for StudySyncSettings {
    fn default() -> Self {
        Self {
            focus_base_url: DEFAULT_FOCUS_URL.into(),
            emotion_base_url: DEFAULT_EMOTION_URL.into(),
            sample_period_ms: 3000,
            request_timeout_ms: 10_000,
            capture_timeout_ms: 5000,
            frame_path: None,
            jpeg_quality: 85,
            principal: None,
            max_session_secs: None,
        }
    }
}

impl StudySyncSettings {
    pub fn sample_period(&self) -> Duration {
        Duration::from_millis(self.sample_period_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms.max(1))
    }

    /// Applies `STUDYSYNC_*` overrides. `lookup` is the environment in
    /// production and a map in tests.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let number = |key: &str| {
            text(key).and_then(|v| match v.parse::<u64>() {
                Ok(parsed) => Some(parsed),
                Err(_) => {
                    log::warn!("Ignoring {key}={v}: not a number");
                    None
                }
            })
        };

        if let Some(url) = text("STUDYSYNC_FOCUS_URL") {
            self.focus_base_url = url;
        }
        if let Some(url) = text("STUDYSYNC_EMOTION_URL") {
            self.emotion_base_url = url;
        }
        if let Some(ms) = number("STUDYSYNC_SAMPLE_PERIOD_MS").filter(|ms| *ms > 0) {
            self.sample_period_ms = ms;
        }
        if let Some(ms) = number("STUDYSYNC_REQUEST_TIMEOUT_MS").filter(|ms| *ms > 0) {
            self.request_timeout_ms = ms;
        }
        if let Some(path) = text("STUDYSYNC_FRAME_PATH") {
            self.frame_path = Some(PathBuf::from(path));
        }
        if let Some(principal) = text("STUDYSYNC_PRINCIPAL") {
            self.principal = Some(principal);
        }
        if let Some(secs) = number("STUDYSYNC_MAX_SESSION_SECS") {
            self.max_session_secs = (secs > 0).then_some(secs);
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<StudySyncSettings>,
}

impl SettingsStore {
    /// Loads `path` if present (unparseable files fall back to defaults) and
    /// layers the environment on top. Overrides are not written back.
    pub fn new(path: PathBuf) -> Result<Self> {
        let mut data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("Settings at {} unreadable ({err}); using defaults", path.display());
                StudySyncSettings::default()
            })
        } else {
            StudySyncSettings::default()
        };
        data.apply_overrides(|key| std::env::var(key).ok());

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn current(&self) -> StudySyncSettings {
        self.read().clone()
    }

    pub fn update(&self, settings: StudySyncSettings) -> Result<()> {
        let mut guard = self.write();
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    fn persist(&self, data: &StudySyncSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, StudySyncSettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, StudySyncSettings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
