//! # Theme Registry
//!
//! Id → [`Theme`] lookup. Built once at startup and handed to whoever
//! needs to resolve theme ids; there is no global instance.
//!
//! Lookups never fail: an unknown id resolves to the designated default
//! theme and logs a warning.

use std::collections::HashMap;

use rand::Rng;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::MapResult;
use crate::theme::{self, Theme};

/// Id of the built-in fallback theme.
pub const DEFAULT_THEME_ID: &str = "cave";

/// TOML document holding theme definitions.
#[derive(Debug, Deserialize)]
struct ThemeFile {
    #[serde(default)]
    theme: Vec<Theme>,
}

/// Registry of available themes.
#[derive(Clone, Debug)]
pub struct ThemeRegistry {
    themes: HashMap<String, Theme>,
    /// Registration order, so random selection is reproducible.
    order: Vec<String>,
    default_id: String,
}

impl ThemeRegistry {
    /// Creates a registry whose only entry is `default`, which also serves
    /// as the fallback for unknown ids.
    #[must_use]
    pub fn new(default: Theme) -> Self {
        let default_id = default.id().to_string();
        let mut registry = Self {
            themes: HashMap::new(),
            order: Vec::new(),
            default_id,
        };
        registry.register(default);
        registry
    }

    /// Registry holding the built-in forest, cave and frost themes, with
    /// cave as the fallback.
    #[must_use]
    pub fn with_builtin_themes() -> Self {
        let mut registry = Self::new(theme::cave());
        registry.register(theme::forest());
        registry.register(theme::frost());
        registry
    }

    /// Registers a theme under its id. Returns the theme it replaced, if any.
    pub fn register(&mut self, theme: Theme) -> Option<Theme> {
        let id = theme.id().to_string();
        debug!(theme = %id, "registering theme");
        let previous = self.themes.insert(id.clone(), theme);
        if previous.is_none() {
            self.order.push(id);
        }
        previous
    }

    /// Parses a TOML document of `[[theme]]` tables and registers each one.
    /// Returns how many themes were registered.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the document does not parse or a theme fails
    /// validation. Nothing is registered in that case.
    pub fn load_toml_str(&mut self, source: &str) -> MapResult<usize> {
        let file: ThemeFile = toml::from_str(source)?;
        let count = file.theme.len();
        for theme in file.theme {
            self.register(theme);
        }
        Ok(count)
    }

    /// Returns true if `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.themes.contains_key(id)
    }

    /// Looks up a theme, falling back to the default theme for unknown ids.
    #[must_use]
    pub fn get(&self, id: &str) -> &Theme {
        if let Some(theme) = self.themes.get(id) {
            return theme;
        }
        warn!(requested = %id, fallback = %self.default_id, "unknown theme id, using default");
        self.default_theme()
    }

    /// The fallback theme.
    #[must_use]
    pub fn default_theme(&self) -> &Theme {
        // The default is registered in `new` and `register` never removes.
        &self.themes[&self.default_id]
    }

    /// Uniform draw over registered themes.
    pub fn random_theme<R: Rng + ?Sized>(&self, rng: &mut R) -> &Theme {
        let id = &self.order[rng.gen_range(0..self.order.len())];
        &self.themes[id]
    }

    /// Registered ids in registration order.
    #[must_use]
    pub fn all_ids(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Number of registered themes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Always false: the default theme is registered at construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        Self::with_builtin_themes()
    }
}
