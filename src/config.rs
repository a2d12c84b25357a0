use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: String,
    /// Mode name to theme name, e.g. `light` and `dark`. Overrides `theme`
    /// when not empty.
    pub themes: BTreeMap<String, String>,
    pub keep_background: bool,
    pub default_lang: String,
    /// Short names usable in `{:.name}` inline code, mapped to theme scopes.
    pub tokens_map: BTreeMap<String, String>,
    pub theme_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            themes: BTreeMap::new(),
            keep_background: false,
            default_lang: "txt".to_string(),
            tokens_map: BTreeMap::new(),
            theme_dir: dirs::config_dir().map(|dir| dir.join("bat").join("themes")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PartialConfig {
    theme: Option<String>,
    themes: Option<BTreeMap<String, String>>,
    keep_background: Option<bool>,
    default_lang: Option<String>,
    tokens_map: Option<BTreeMap<String, String>>,
    theme_dir: Option<PathBuf>,
}

impl PartialConfig {
    fn apply_defaults(self) -> (Config, bool) {
        let defaults = Config::default();
        let mut changed = false;

        let theme = match self.theme {
            Some(v) => v,
            None => {
                changed = true;
                defaults.theme
            }
        };
        let themes = match self.themes {
            Some(v) => v,
            None => {
                changed = true;
                defaults.themes
            }
        };
        let keep_background = match self.keep_background {
            Some(v) => v,
            None => {
                changed = true;
                defaults.keep_background
            }
        };
        let default_lang = match self.default_lang {
            Some(v) => v,
            None => {
                changed = true;
                defaults.default_lang
            }
        };
        let tokens_map = match self.tokens_map {
            Some(v) => v,
            None => {
                changed = true;
                defaults.tokens_map
            }
        };
        let theme_dir = match self.theme_dir {
            Some(v) => Some(v),
            None => {
                changed = true;
                defaults.theme_dir
            }
        };

        (
            Config {
                theme,
                themes,
                keep_background,
                default_lang,
                tokens_map,
                theme_dir,
            },
            changed,
        )
    }
}

pub fn config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    Ok(base.join("pretty-code").join("config.toml"))
}

pub fn ensure_config_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}

pub fn load_config() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        let cfg = Config::default();
        write_config(&cfg)?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let (cfg, changed) = parse_config(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    if changed {
        write_config(&cfg)?;
    }
    Ok(cfg)
}

/// Parses a config file, filling missing keys. The flag is set when any key
/// was missing so the caller can persist the completed file.
pub fn parse_config(raw: &str) -> Result<(Config, bool)> {
    let partial: PartialConfig = toml::from_str(raw)?;
    Ok(partial.apply_defaults())
}

pub fn write_config(cfg: &Config) -> Result<()> {
    let path = config_path()?;
    ensure_config_dir(&path)?;
    let text = toml::to_string_pretty(cfg).context("Failed to serialize config")?;
    fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn open_config_in_editor() -> Result<()> {
    let path = config_path()?;
    if !path.exists() {
        let cfg = Config::default();
        write_config(&cfg)?;
    }

    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let mut parts = match shell_words::split(&editor) {
        Ok(p) if !p.is_empty() => p,
        _ => vec![editor],
    };
    let cmd = parts.remove(0);
    let status = Command::new(cmd)
        .args(parts)
        .arg(&path)
        .status()
        .with_context(|| format!("Failed to launch editor for {}", path.display()))?;
    if !status.success() {
        anyhow::bail!("Editor exited with status {}", status);
    }
    Ok(())
}
