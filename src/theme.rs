use crate::config::Config;
use anyhow::{Context, Result};
use std::path::PathBuf;
use syntect::highlighting::{Color, Highlighter as ThemeHighlighter, Theme, ThemeSet};
use syntect::parsing::Scope;
use tracing::warn;

pub const DEFAULT_MODE: &str = "default";

pub struct ThemeManager {
    theme_set: ThemeSet,
    theme_names: Vec<String>,
}

/// Colors for the `pre` element of a highlighted block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPalette {
    pub foreground: Option<String>,
    pub background: Option<String>,
}

impl BlockPalette {
    pub fn style(&self) -> String {
        let mut parts = Vec::new();
        if let Some(bg) = &self.background {
            parts.push(format!("background-color:{bg}"));
        }
        if let Some(fg) = &self.foreground {
            parts.push(format!("color:{fg}"));
        }
        parts.join(";")
    }
}

impl ThemeManager {
    pub fn load(config: &Config) -> Result<Self> {
        let mut theme_set = ThemeSet::load_defaults();

        if let Some(dir) = resolve_theme_dir(config) {
            if dir.exists() {
                let extra = ThemeSet::load_from_folder(&dir)
                    .with_context(|| format!("Failed to load themes from {}", dir.display()))?;
                theme_set.themes.extend(extra.themes);
            }
        }

        let mut theme_names: Vec<String> = theme_set.themes.keys().cloned().collect();
        theme_names.sort();

        Ok(Self {
            theme_set,
            theme_names,
        })
    }

    pub fn theme_names(&self) -> &[String] {
        &self.theme_names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.theme_set.themes.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Theme> {
        self.theme_set
            .themes
            .get(name)
            .or_else(|| self.fallback_theme())
    }

    /// One `(mode, theme)` per configured variant: every entry of
    /// `config.themes`, or `config.theme` as the single default mode.
    pub fn resolve_modes(&self, config: &Config) -> Result<Vec<(String, Theme)>> {
        let requested: Vec<(String, String)> = if config.themes.is_empty() {
            vec![(DEFAULT_MODE.to_string(), config.theme.clone())]
        } else {
            config
                .themes
                .iter()
                .map(|(mode, name)| (mode.clone(), name.clone()))
                .collect()
        };

        let mut modes = Vec::with_capacity(requested.len());
        for (mode, name) in requested {
            if !self.contains(&name) {
                warn!("unknown theme `{name}` for mode `{mode}`, using {}", self.fallback_name());
            }
            let theme = self
                .get(&name)
                .with_context(|| format!("No themes available for mode {mode}"))?;
            modes.push((mode, theme.clone()));
        }
        Ok(modes)
    }

    pub fn fallback_name(&self) -> &str {
        if self.contains("base16-ocean.dark") {
            return "base16-ocean.dark";
        }
        self.theme_names
            .first()
            .map(|s| s.as_str())
            .unwrap_or("base16-ocean.dark")
    }

    fn fallback_theme(&self) -> Option<&Theme> {
        let name = self.fallback_name();
        self.theme_set
            .themes
            .get(name)
            .or_else(|| self.theme_set.themes.values().next())
    }
}

fn resolve_theme_dir(config: &Config) -> Option<PathBuf> {
    if let Some(dir) = &config.theme_dir {
        return Some(dir.clone());
    }
    default_theme_dir()
}

fn default_theme_dir() -> Option<PathBuf> {
    let base = dirs::config_dir()?;
    Some(base.join("bat").join("themes"))
}

pub fn palette_from_theme(theme: &Theme) -> BlockPalette {
    let settings = &theme.settings;
    BlockPalette {
        foreground: settings.foreground.map(css_color),
        background: settings.background.map(css_color),
    }
}

/// Foreground the theme assigns to `scope`, if any rule matches it.
pub fn token_color(theme: &Theme, scope: &str) -> Option<String> {
    let scope = Scope::new(scope).ok()?;
    let highlighter = ThemeHighlighter::new(theme);
    highlighter
        .style_mod_for_stack(&[scope])
        .foreground
        .map(css_color)
}

pub fn css_color(color: Color) -> String {
    if color.a == 0xff {
        format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
    } else {
        format!(
            "#{:02x}{:02x}{:02x}{:02x}",
            color.r, color.g, color.b, color.a
        )
    }
}
