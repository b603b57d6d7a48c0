//! Display preferences that persist between runs.

use std::{fmt::Display, str::FromStr, sync::Arc};

use crate::{error::CacheError, storage::KeyValueStorage};

/// The storage key for the colour theme.
pub const THEME_KEY: &str = "theme";
/// The storage key for the interface language.
pub const LANGUAGE_KEY: &str = "lang";

/// The colour theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    /// Dark text on a light background.
    Light,
    /// Light text on a dark background.
    Dark,
    /// Follow the operating system setting.
    #[default]
    System,
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(format!(
                "unknown theme \"{other}\", expected light, dark or system"
            )),
        }
    }
}

impl Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        };

        write!(f, "{name}")
    }
}

/// The interface language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    /// English.
    #[default]
    En,
    /// French.
    Fr,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "fr" => Ok(Language::Fr),
            other => Err(format!("unknown language \"{other}\", expected en or fr")),
        }
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::En => write!(f, "en"),
            Language::Fr => write!(f, "fr"),
        }
    }
}

/// Reads and writes the display preferences.
#[derive(Clone)]
pub struct Preferences {
    storage: Arc<dyn KeyValueStorage>,
}

impl Preferences {
    /// Create a preferences service backed by `storage`.
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// The saved theme, or the default if none is saved or it is unreadable.
    pub fn theme(&self) -> Theme {
        self.read(THEME_KEY)
    }

    /// Save `theme`.
    ///
    /// # Errors
    ///
    /// Returns a [CacheError] if the storage backend fails.
    pub fn set_theme(&self, theme: Theme) -> Result<(), CacheError> {
        self.write(THEME_KEY, theme)
    }

    /// The saved language, or the default if none is saved or it is unreadable.
    pub fn language(&self) -> Language {
        self.read(LANGUAGE_KEY)
    }

    /// Save `language`.
    ///
    /// # Errors
    ///
    /// Returns a [CacheError] if the storage backend fails.
    pub fn set_language(&self, language: Language) -> Result<(), CacheError> {
        self.write(LANGUAGE_KEY, language)
    }

    fn read<T: FromStr<Err = String> + Default>(&self, key: &str) -> T {
        match self.storage.get(key) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|error| {
                tracing::warn!("Ignoring saved \"{key}\" preference: {error}");
                T::default()
            }),
            Ok(None) => T::default(),
            Err(error) => {
                tracing::warn!("Could not read \"{key}\" preference: {error}");
                T::default()
            }
        }
    }

    fn write(&self, key: &str, value: impl Display) -> Result<(), CacheError> {
        let value = value.to_string();
        self.storage.set(key, &value)?;
        tracing::debug!("Set \"{key}\" preference to {value}");

        Ok(())
    }
}

impl std::fmt::Debug for Preferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preferences")
            .field("theme", &self.theme())
            .field("language", &self.language())
            .finish()
    }
}
