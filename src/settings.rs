use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::storage::{Storage, KEY_SETTINGS};

pub const DEFAULT_ASSISTANT_NAME: &str = "AI Assistant";
pub const DEFAULT_PRIMARY_COLOR: &str = "#0ea5e9";
pub const DEFAULT_WELCOME_MESSAGE: &str =
    "Hello! I'm your AI assistant. How can I help you today?";

/// Named response style; selects which canned-response set the generator
/// draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Friendly,
    Professional,
    Technical,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Friendly => "friendly",
            Tone::Professional => "professional",
            Tone::Technical => "technical",
        }
    }

    pub fn from_str(s: &str) -> Option<Tone> {
        match s.to_lowercase().as_str() {
            "friendly" => Some(Tone::Friendly),
            "professional" => Some(Tone::Professional),
            "technical" => Some(Tone::Technical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub assistant_name: String,
    pub assistant_avatar: Option<String>,
    pub primary_color: String,
    pub dark_mode: bool,
    pub tone: Tone,
    pub welcome_message: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            assistant_name: DEFAULT_ASSISTANT_NAME.to_string(),
            assistant_avatar: None,
            primary_color: DEFAULT_PRIMARY_COLOR.to_string(),
            dark_mode: false,
            tone: Tone::Friendly,
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
        }
    }
}

/// Partial settings update; unset fields keep their current value. The
/// avatar is doubly optional so it can be explicitly cleared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub assistant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_avatar: Option<Option<String>>,
    pub primary_color: Option<String>,
    pub dark_mode: Option<bool>,
    pub tone: Option<Tone>,
    pub welcome_message: Option<String>,
}

pub struct SettingsStore {
    storage: Arc<Storage>,
    settings: Settings,
}

impl SettingsStore {
    pub fn load(storage: Arc<Storage>) -> Self {
        let settings = storage.load(KEY_SETTINGS, Settings::default());
        Self { storage, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Shallow-merge `patch` over the current settings.
    pub fn update(&mut self, patch: SettingsPatch) {
        if let Some(name) = patch.assistant_name {
            self.settings.assistant_name = name;
        }
        if let Some(avatar) = patch.assistant_avatar {
            self.settings.assistant_avatar = avatar;
        }
        if let Some(color) = patch.primary_color {
            self.settings.primary_color = color;
        }
        if let Some(dark_mode) = patch.dark_mode {
            self.settings.dark_mode = dark_mode;
        }
        if let Some(tone) = patch.tone {
            self.settings.tone = tone;
        }
        if let Some(welcome) = patch.welcome_message {
            self.settings.welcome_message = welcome;
        }
        self.persist();
    }

    /// Replace the whole record, e.g. from an imported document.
    pub fn replace(&mut self, settings: Settings) {
        self.settings = settings;
        self.persist();
    }

    pub fn reset(&mut self) {
        self.settings = Settings::default();
        self.persist();
    }

    fn persist(&self) {
        self.storage.save_best_effort(KEY_SETTINGS, &self.settings);
    }
}
