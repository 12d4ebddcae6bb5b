use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::query::DEFAULT_PAGE_SIZE;
use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub key_bindings: KeyBindings,
    #[serde(default = "default_current_theme")]
    pub current_theme: String,
    #[serde(default)]
    pub themes: HashMap<String, Theme>,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_quit")]
    pub quit: String,
    #[serde(default = "default_new")]
    pub new: String,
    #[serde(default = "default_edit")]
    pub edit: String,
    #[serde(default = "default_save")]
    pub save: String,
    #[serde(default = "default_delete")]
    pub delete: String,
    #[serde(default = "default_toggle_task_status")]
    pub toggle_task_status: String,
    #[serde(default = "default_search")]
    pub search: String,
    #[serde(default = "default_cycle_completed")]
    pub cycle_completed: String,
    #[serde(default = "default_order_by")]
    pub order_by: String,
    #[serde(default = "default_order_direction")]
    pub order_direction: String,
    #[serde(default = "default_prev_page")]
    pub prev_page: String,
    #[serde(default = "default_next_page")]
    pub next_page: String,
    #[serde(default = "default_refresh")]
    pub refresh: String,
    #[serde(default = "default_list_up")]
    pub list_up: String,
    #[serde(default = "default_list_down")]
    pub list_down: String,
    #[serde(default = "default_help")]
    pub help: String,
    #[serde(default = "default_logout")]
    pub logout: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default = "default_fg")]
    pub fg: String,
    #[serde(default = "default_bg")]
    pub bg: String,
    #[serde(default = "default_highlight_bg")]
    pub highlight_bg: String,
    #[serde(default = "default_highlight_fg")]
    pub highlight_fg: String,
    #[serde(default = "default_accent")]
    pub accent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            page_size: default_page_size(),
            request_timeout_secs: default_request_timeout_secs(),
            log_level: default_log_level(),
            key_bindings: KeyBindings::default(),
            current_theme: default_current_theme(),
            themes: HashMap::new(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: default_quit(),
            new: default_new(),
            edit: default_edit(),
            save: default_save(),
            delete: default_delete(),
            toggle_task_status: default_toggle_task_status(),
            search: default_search(),
            cycle_completed: default_cycle_completed(),
            order_by: default_order_by(),
            order_direction: default_order_direction(),
            prev_page: default_prev_page(),
            next_page: default_next_page(),
            refresh: default_refresh(),
            list_up: default_list_up(),
            list_down: default_list_down(),
            help: default_help(),
            logout: default_logout(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: default_fg(),
            bg: default_bg(),
            highlight_bg: default_highlight_bg(),
            highlight_fg: default_highlight_fg(),
            accent: default_accent(),
        }
    }
}

impl Theme {
    /// Get preset themes that are always available
    pub fn get_preset_themes() -> HashMap<String, Theme> {
        let mut themes = HashMap::new();

        themes.insert("default".to_string(), Theme::default());

        themes.insert("light".to_string(), Theme {
            fg: "black".to_string(),
            bg: "white".to_string(),
            highlight_bg: "blue".to_string(),
            highlight_fg: "white".to_string(),
            accent: "magenta".to_string(),
        });

        themes.insert("monochrome".to_string(), Theme {
            fg: "white".to_string(),
            bg: "black".to_string(),
            highlight_bg: "white".to_string(),
            highlight_fg: "black".to_string(),
            accent: "gray".to_string(),
        });

        themes
    }
}

// Default value functions
fn default_api_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_quit() -> String {
    "q".to_string()
}

fn default_new() -> String {
    "n".to_string()
}

fn default_edit() -> String {
    "e".to_string()
}

fn default_save() -> String {
    "Ctrl+s".to_string()
}

fn default_delete() -> String {
    "d".to_string()
}

fn default_toggle_task_status() -> String {
    "Space".to_string()
}

fn default_search() -> String {
    "/".to_string()
}

fn default_cycle_completed() -> String {
    "c".to_string()
}

fn default_order_by() -> String {
    "o".to_string()
}

fn default_order_direction() -> String {
    "r".to_string()
}

fn default_prev_page() -> String {
    "[".to_string()
}

fn default_next_page() -> String {
    "]".to_string()
}

fn default_refresh() -> String {
    "F5".to_string()
}

fn default_list_up() -> String {
    "k".to_string()
}

fn default_list_down() -> String {
    "j".to_string()
}

fn default_help() -> String {
    "F1".to_string()
}

fn default_logout() -> String {
    "Ctrl+l".to_string()
}

fn default_current_theme() -> String {
    "default".to_string()
}

fn default_fg() -> String {
    "white".to_string()
}

fn default_bg() -> String {
    "black".to_string()
}

fn default_highlight_bg() -> String {
    "blue".to_string()
}

fn default_highlight_fg() -> String {
    "white".to_string()
}

fn default_accent() -> String {
    "cyan".to_string()
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
    #[error("Invalid key binding '{binding}' for {action}: {reason}")]
    KeyBindingError {
        action: &'static str,
        binding: String,
        reason: String,
    },
}

impl Config {
    /// Load configuration from the profile's config file, or create default if missing
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from an explicit path, creating it with defaults if missing
    pub fn load_from_path(config_path: &Path) -> Result<Self, ConfigError> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path)
                .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            let config: Config = toml::from_str(&contents)?;
            config.validate_key_bindings()?;
            Ok(config)
        } else {
            let mut config = Config::default();
            config.save_to_path(config_path)?;
            Ok(config)
        }
    }

    pub fn save_to_path(&mut self, config_path: &Path) -> Result<(), ConfigError> {
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_path, toml_string)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile)
            .ok_or_else(|| ConfigError::ConfigDirError("Could not determine config directory".to_string()))?;
        Ok(config_dir.join("config.toml"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Every configured binding must parse; a typo is reported at startup
    pub fn validate_key_bindings(&self) -> Result<(), ConfigError> {
        for (action, binding) in self.key_bindings.entries() {
            utils::parse_key_binding(binding).map_err(|reason| ConfigError::KeyBindingError {
                action,
                binding: binding.clone(),
                reason,
            })?;
        }
        Ok(())
    }

    /// Get the currently active theme
    /// If highlight_fg is not set (empty string), it will be calculated from highlight_bg
    pub fn get_active_theme(&self) -> Theme {
        use crate::tui::widgets::color::{format_color_for_display, get_contrast_text_color, parse_color};

        let mut theme = self
            .themes
            .get(&self.current_theme)
            .cloned()
            .or_else(|| Theme::get_preset_themes().get(&self.current_theme).cloned())
            .unwrap_or_default();

        if theme.highlight_fg.is_empty() {
            let highlight_bg_color = parse_color(&theme.highlight_bg);
            theme.highlight_fg = format_color_for_display(&get_contrast_text_color(highlight_bg_color));
        }

        theme
    }
}

impl KeyBindings {
    pub fn entries(&self) -> [(&'static str, &String); 17] {
        [
            ("quit", &self.quit),
            ("new", &self.new),
            ("edit", &self.edit),
            ("save", &self.save),
            ("delete", &self.delete),
            ("toggle_task_status", &self.toggle_task_status),
            ("search", &self.search),
            ("cycle_completed", &self.cycle_completed),
            ("order_by", &self.order_by),
            ("order_direction", &self.order_direction),
            ("prev_page", &self.prev_page),
            ("next_page", &self.next_page),
            ("refresh", &self.refresh),
            ("list_up", &self.list_up),
            ("list_down", &self.list_down),
            ("help", &self.help),
            ("logout", &self.logout),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from_path(&path).expect("load");
        assert!(path.exists());
        assert_eq!(config.api_url, "http://localhost:3000");
        assert_eq!(config.page_size, 10);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_url = \"https://todo.example\"\n[key_bindings]\nnew = \"a\"\n").expect("write");

        let config = Config::load_from_path(&path).expect("load");
        assert_eq!(config.api_url, "https://todo.example");
        assert_eq!(config.key_bindings.new, "a");
        assert_eq!(config.key_bindings.delete, "d");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn bad_key_binding_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[key_bindings]\nquit = \"Hyper+q\"\n").expect("write");

        let err = Config::load_from_path(&path).expect_err("should fail");
        assert!(matches!(err, ConfigError::KeyBindingError { action: "quit", .. }));
    }

    #[test]
    fn unknown_theme_falls_back_to_default() {
        let config = Config {
            current_theme: "nope".to_string(),
            ..Config::default()
        };
        assert_eq!(config.get_active_theme().highlight_bg, "blue");
    }
}
