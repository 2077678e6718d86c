// Theme preference store

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::client::storage::Storage;

/// Storage key of the chosen mode
pub const THEME_MODE_KEY: &str = "theme-mode";

/// Attribute set on the presentation root alongside the class list
pub const THEME_ATTRIBUTE: &str = "data-theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
            ThemeMode::System => "system",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ThemeMode::Light => "Light Mode",
            ThemeMode::Dark => "Dark Mode",
            ThemeMode::System => "System Default",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown theme mode: {0}")]
pub struct UnknownThemeMode(String);

impl FromStr for ThemeMode {
    type Err = UnknownThemeMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            "system" => Ok(ThemeMode::System),
            other => Err(UnknownThemeMode(other.to_string())),
        }
    }
}

/// Theme actually applied after resolving `System`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of the platform's light/dark preference
pub trait SystemPreference: Send + Sync {
    fn prefers_dark(&self) -> bool;
}

/// Preference held in memory; flip it and call
/// [`ThemeStore::system_preference_changed`] to simulate an OS change
#[derive(Debug, Default)]
pub struct FixedPreference(AtomicBool);

impl FixedPreference {
    pub fn new(prefers_dark: bool) -> Self {
        Self(AtomicBool::new(prefers_dark))
    }

    pub fn set(&self, prefers_dark: bool) {
        self.0.store(prefers_dark, Ordering::Relaxed);
    }
}

impl SystemPreference for FixedPreference {
    fn prefers_dark(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Where the resolved theme is rendered
pub trait PresentationTarget: Send + Sync {
    fn apply(&self, theme: Theme);
}

/// In-memory stand-in for a document root: a class list plus attributes
#[derive(Debug, Default)]
pub struct DocumentRoot {
    classes: Mutex<BTreeSet<String>>,
    attributes: Mutex<HashMap<String, String>>,
}

impl DocumentRoot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(class)
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}

impl PresentationTarget for DocumentRoot {
    fn apply(&self, theme: Theme) {
        {
            let mut classes = self.classes.lock().unwrap_or_else(PoisonError::into_inner);
            classes.remove(Theme::Light.as_str());
            classes.remove(Theme::Dark.as_str());
            classes.insert(theme.as_str().to_string());
        }
        self.attributes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(THEME_ATTRIBUTE.to_string(), theme.as_str().to_string());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeState {
    pub mode: ThemeMode,
    pub theme: Theme,
}

impl ThemeState {
    pub fn is_dark(&self) -> bool {
        self.theme == Theme::Dark
    }

    pub fn display_name(&self) -> &'static str {
        self.mode.display_name()
    }
}

/// Light/dark/system preference, persisted and applied on every change
pub struct ThemeStore {
    storage: Arc<dyn Storage>,
    preference: Arc<dyn SystemPreference>,
    target: Arc<dyn PresentationTarget>,
    state: watch::Sender<ThemeState>,
}

impl ThemeStore {
    /// Load the saved mode (falling back to `System`) and apply it
    pub fn new(
        storage: Arc<dyn Storage>,
        preference: Arc<dyn SystemPreference>,
        target: Arc<dyn PresentationTarget>,
    ) -> Self {
        let mode = match storage.get_item(THEME_MODE_KEY).map(|saved| saved.parse()) {
            Some(Ok(mode)) => mode,
            Some(Err(e)) => {
                warn!("{}; using system mode", e);
                ThemeMode::System
            }
            None => ThemeMode::System,
        };

        let theme = resolve(mode, preference.as_ref());
        target.apply(theme);
        let (state, _) = watch::channel(ThemeState { mode, theme });

        Self {
            storage,
            preference,
            target,
            state,
        }
    }

    pub fn state(&self) -> ThemeState {
        *self.state.borrow()
    }

    pub fn mode(&self) -> ThemeMode {
        self.state.borrow().mode
    }

    pub fn theme(&self) -> Theme {
        self.state.borrow().theme
    }

    pub fn is_dark(&self) -> bool {
        self.state.borrow().is_dark()
    }

    pub fn display_name(&self) -> &'static str {
        self.mode().display_name()
    }

    pub fn subscribe(&self) -> watch::Receiver<ThemeState> {
        self.state.subscribe()
    }

    /// Persist and apply a mode; a storage failure keeps the in-memory change
    pub fn set_mode(&self, mode: ThemeMode) {
        if let Err(e) = self.storage.set_item(THEME_MODE_KEY, mode.as_str()) {
            warn!("Failed to persist theme mode: {}", e);
        }
        self.update(mode);
    }

    /// Switch between light and dark; from `System`, pick the opposite of
    /// what the platform currently prefers
    pub fn toggle(&self) {
        let next = match self.mode() {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::System if self.preference.prefers_dark() => ThemeMode::Light,
            ThemeMode::System => ThemeMode::Dark,
        };
        self.set_mode(next);
    }

    /// Re-resolve after the platform preference changed
    pub fn system_preference_changed(&self) {
        let mode = self.mode();
        if mode == ThemeMode::System {
            self.update(mode);
        }
    }

    fn update(&self, mode: ThemeMode) {
        let theme = resolve(mode, self.preference.as_ref());
        self.target.apply(theme);
        debug!("Theme mode {} resolved to {}", mode.as_str(), theme);
        self.state.send_if_modified(|state| {
            let next = ThemeState { mode, theme };
            let changed = *state != next;
            *state = next;
            changed
        });
    }
}

fn resolve(mode: ThemeMode, preference: &dyn SystemPreference) -> Theme {
    match mode {
        ThemeMode::Light => Theme::Light,
        ThemeMode::Dark => Theme::Dark,
        ThemeMode::System if preference.prefers_dark() => Theme::Dark,
        ThemeMode::System => Theme::Light,
    }
}
