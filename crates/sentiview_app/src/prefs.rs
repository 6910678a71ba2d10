use std::path::{Path, PathBuf};
use std::sync::Arc;

use sentiview_client::{AtomicFile, TokenHook};
use sentiview_logging::{sv_error, sv_info, sv_warn};
use serde::{Deserialize, Serialize};
use tokio::runtime::{Handle, RuntimeFlavor};

pub const PREFS_FILENAME: &str = "preferences.ron";

/// Theme ids the dashboard ships with; the first one is the default.
pub const THEMES: &[(&str, &str)] = &[
    ("gruvbox-dark", "Gruvbox Dark"),
    ("gruvbox-light", "Gruvbox Light"),
    ("dracula", "Dracula"),
    ("monokai", "Monokai"),
    ("solarized-dark", "Solarized Dark"),
    ("solarized-light", "Solarized Light"),
    ("nord", "Nord"),
    ("one-dark", "One Dark"),
    ("tokyo-night", "Tokyo Night"),
    ("material-dark", "Material Dark"),
    ("material-light", "Material Light"),
];

pub fn default_theme() -> &'static str {
    THEMES[0].0
}

pub fn is_known_theme(id: &str) -> bool {
    THEMES.iter().any(|(known, _)| *known == id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_theme_id")]
    pub theme_id: String,
}

fn default_theme_id() -> String {
    default_theme().to_string()
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            token: None,
            theme_id: default_theme_id(),
        }
    }
}

impl Preferences {
    /// The stored theme, or the default when the stored id is unknown.
    pub fn theme(&self) -> &str {
        if is_known_theme(&self.theme_id) {
            &self.theme_id
        } else {
            default_theme()
        }
    }
}

/// Preferences file under the state directory.
#[derive(Debug, Clone)]
pub struct PrefsStore {
    file: AtomicFile,
}

impl PrefsStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            file: AtomicFile::new(state_dir.join(PREFS_FILENAME)),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    /// Missing or unreadable files yield defaults.
    pub fn load(&self) -> Preferences {
        let content = match self.file.read() {
            Ok(Some(text)) => text,
            Ok(None) => return Preferences::default(),
            Err(err) => {
                sv_warn!("Failed to read preferences from {:?}: {}", self.file.path(), err);
                return Preferences::default();
            }
        };

        match ron::from_str(&content) {
            Ok(prefs) => prefs,
            Err(err) => {
                sv_warn!("Failed to parse preferences from {:?}: {}", self.file.path(), err);
                Preferences::default()
            }
        }
    }

    pub fn save(&self, prefs: &Preferences) {
        let pretty = ron::ser::PrettyConfig::new();
        let content = match ron::ser::to_string_pretty(prefs, pretty) {
            Ok(text) => text,
            Err(err) => {
                sv_error!("Failed to serialize preferences: {}", err);
                return;
            }
        };

        if let Err(err) = self.file.write(&content) {
            sv_error!("Failed to write preferences to {:?}: {}", self.file.path(), err);
        }
    }

    pub fn update(&self, f: impl FnOnce(&mut Preferences)) -> Preferences {
        let mut prefs = self.load();
        f(&mut prefs);
        self.save(&prefs);
        prefs
    }

    /// Hook for the token store: every login or forced logout is written
    /// through to disk. The hook fires from inside request handling, so the
    /// write is moved off the async worker when there is one.
    pub fn token_hook(&self) -> TokenHook {
        let store = self.clone();
        Arc::new(move |token: Option<&str>| {
            run_blocking(|| store.update(|prefs| prefs.token = token.map(str::to_string)));
            match token {
                Some(_) => sv_info!("Saved auth token to {:?}", store.file.path()),
                None => sv_info!("Removed auth token from {:?}", store.file.path()),
            }
        })
    }
}

fn run_blocking<R>(f: impl FnOnce() -> R) -> R {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}
