use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::builder::{
    DEFAULT_ERROR_MESSAGE, DEFAULT_FEEDBACK_DELAY, DEFAULT_SUCCESS_MESSAGE, DEFAULT_TAB_WIDTH,
};
use crate::command::{QuotePolicy, DEFAULT_PREFIX};
use crate::form::FieldSpec;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub command: CommandConfig,
    #[serde(default)]
    pub form: FormConfig,
    #[serde(default = "FieldSpec::watdo_todo")]
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub keybindings: KeyBindings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Words written before the field tokens
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// minimal: quote only when needed, always: quote every text value
    #[serde(default)]
    pub quote_policy: QuotePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    /// How long the copied/error message stays up
    #[serde(default = "default_feedback_delay_ms")]
    pub feedback_delay_ms: u64,

    /// Spaces inserted by Tab in the description
    #[serde(default = "default_tab_width")]
    pub tab_width: usize,

    #[serde(default = "default_success_message")]
    pub success_message: String,

    #[serde(default = "default_error_message")]
    pub error_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Accent used for mandatory fields and the focused control
    pub primary: String,
    pub foreground: String,
    pub background: String,
    pub muted: String,
    pub success: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub trigger: String,
    pub next_field: String,
    pub prev_field: String,
    pub clear_field: String,
}

// Default value functions
fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_feedback_delay_ms() -> u64 {
    u64::try_from(DEFAULT_FEEDBACK_DELAY.as_millis()).unwrap_or(1000)
}

fn default_tab_width() -> usize {
    DEFAULT_TAB_WIDTH
}

fn default_success_message() -> String {
    DEFAULT_SUCCESS_MESSAGE.to_string()
}

fn default_error_message() -> String {
    DEFAULT_ERROR_MESSAGE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command: CommandConfig::default(),
            form: FormConfig::default(),
            fields: FieldSpec::watdo_todo(),
            theme: ThemeConfig::default(),
            keybindings: KeyBindings::default(),
        }
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            quote_policy: QuotePolicy::Minimal,
        }
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            feedback_delay_ms: default_feedback_delay_ms(),
            tab_width: default_tab_width(),
            success_message: default_success_message(),
            error_message: default_error_message(),
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            primary: "#DD6666".to_string(),
            foreground: "#C0B0B0".to_string(),
            background: "#000000".to_string(),
            muted: "#5A4A4A".to_string(),
            success: "#6A9A7A".to_string(),
            error: "#CC5555".to_string(),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            trigger: "Ctrl+Y".to_string(),
            next_field: "Ctrl+N".to_string(),
            prev_field: "Ctrl+P".to_string(),
            clear_field: "Ctrl+U".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from default location
    pub fn load_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            debug!("No config at {}, using defaults", config_path.display());
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;

        let config: Config =
            serde_yaml::from_str(&contents).context("Failed to parse config file")?;

        debug!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = serde_yaml::to_string(self).context("Failed to serialize config")?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        fs::write(path.as_ref(), contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get default configuration path
    pub fn default_config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;

        Ok(home.join(".watdo").join("form.yaml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FieldKind;

    #[test]
    fn test_default_form_config() {
        let config = FormConfig::default();
        assert_eq!(config.feedback_delay_ms, 1000);
        assert_eq!(config.tab_width, 4);
        assert_eq!(config.error_message, "Missing required parameters!");
    }

    #[test]
    fn test_default_fields_are_watdo_todo() {
        let config = Config::default();
        assert_eq!(config.fields.len(), 7);
        assert_eq!(config.command.prefix, "watdo todo");
    }

    #[test]
    fn test_config_deserialization() {
        let yaml = r#"
command:
  quote_policy: always
form:
  feedback_delay_ms: 300
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.command.quote_policy, QuotePolicy::Always);
        assert_eq!(config.command.prefix, "watdo todo");
        assert_eq!(config.form.feedback_delay_ms, 300);
        assert_eq!(config.form.tab_width, 4);
        assert_eq!(config.fields.len(), 7);
        assert_eq!(config.keybindings.trigger, "Ctrl+Y");
    }

    #[test]
    fn test_custom_fields() {
        let yaml = r#"
fields:
  - label: Title
    mandatory: true
  - label: Notes
    kind: multi_line
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.fields.len(), 2);
        assert_eq!(config.fields[1].kind, FieldKind::MultiLine);
    }
}
