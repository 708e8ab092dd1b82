use crossterm::event::{KeyCode, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::config::KeyBindings;

/// Keybinding table for the form
#[derive(Debug, Clone)]
pub struct KeybindingManager {
    bindings: HashMap<KeyBinding, Action>,
    // Combo shown in the help line for each action
    hints: HashMap<Action, String>,
}

/// Key binding definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyBinding {
    pub key: String,
    pub modifiers: Vec<String>,
}

/// Actions that can be triggered by keybindings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Validate and copy the command
    Trigger,
    NextField,
    PrevField,
    /// Empty the focused text field
    ClearField,
    Quit,
}

impl KeybindingManager {
    /// Create new keybinding manager with defaults
    #[must_use]
    pub fn new() -> Self {
        let mut manager = Self {
            bindings: HashMap::new(),
            hints: HashMap::new(),
        };

        manager.load_defaults();
        manager
    }

    /// Defaults plus the combos from config.
    ///
    /// Invalid combos are logged and skipped so a typo never locks the user out.
    #[must_use]
    pub fn from_config(config: &KeyBindings) -> Self {
        let mut manager = Self::new();
        let configured = [
            (&config.trigger, Action::Trigger),
            (&config.next_field, Action::NextField),
            (&config.prev_field, Action::PrevField),
            (&config.clear_field, Action::ClearField),
        ];
        for (combo, action) in configured {
            if let Err(e) = manager.add_binding_from_string(combo, action) {
                warn!("Ignoring keybinding '{}' for {:?}: {}", combo, action, e);
            }
        }
        manager
    }

    /// Load default keybindings
    fn load_defaults(&mut self) {
        self.add_binding("y", &["Ctrl"], Action::Trigger);

        // Navigation. Plain Tab is left to the form so the description can indent.
        self.add_binding("n", &["Ctrl"], Action::NextField);
        self.add_binding("p", &["Ctrl"], Action::PrevField);
        self.add_binding("Down", &[], Action::NextField);
        self.add_binding("Up", &[], Action::PrevField);
        self.add_binding("BackTab", &["Shift"], Action::PrevField);
        self.add_binding("BackTab", &[], Action::PrevField);

        // Editing
        self.add_binding("u", &["Ctrl"], Action::ClearField);

        self.add_binding("c", &["Ctrl"], Action::Quit);
        self.add_binding("Esc", &[], Action::Quit);

        for (action, hint) in [
            (Action::Trigger, "Ctrl+Y"),
            (Action::NextField, "Ctrl+N"),
            (Action::PrevField, "Ctrl+P"),
            (Action::ClearField, "Ctrl+U"),
            (Action::Quit, "Esc"),
        ] {
            self.hints.insert(action, hint.to_string());
        }
    }

    /// Combo to advertise for `action`, the configured one when set
    #[must_use]
    pub fn hint(&self, action: Action) -> &str {
        self.hints.get(&action).map_or("", String::as_str)
    }

    /// Add a keybinding
    pub fn add_binding(&mut self, key: &str, modifiers: &[&str], action: Action) {
        let binding = KeyBinding {
            key: key.to_string(),
            modifiers: modifiers
                .iter()
                .map(std::string::ToString::to_string)
                .collect(),
        };
        self.bindings.insert(binding, action);
    }

    /// Parse and add a keybinding from a config string like "Ctrl+Y" or "Alt+Enter"
    ///
    /// # Errors
    /// Returns an error if the combo string is empty or malformed
    pub fn add_binding_from_string(&mut self, combo: &str, action: Action) -> Result<(), String> {
        if combo.trim().is_empty() {
            return Err("Empty key combination".to_string());
        }

        let parts: Vec<&str> = combo.split('+').map(str::trim).collect();

        // Last part is the key, everything before is modifiers
        let key = match parts.last() {
            Some(k) if !k.is_empty() => *k,
            _ => return Err("Invalid key combination format".to_string()),
        };
        let modifiers = &parts[..parts.len().saturating_sub(1)];

        let mut normalized_mods = Vec::with_capacity(modifiers.len());
        for m in modifiers {
            match m.to_lowercase().as_str() {
                "ctrl" | "control" => normalized_mods.push("Ctrl"),
                "shift" => normalized_mods.push("Shift"),
                "alt" => normalized_mods.push("Alt"),
                other => return Err(format!("Unknown modifier: {other}")),
            }
        }
        // Same order as get_action builds them
        normalized_mods.sort_by_key(|m| match *m {
            "Ctrl" => 0,
            "Shift" => 1,
            _ => 2,
        });

        let key_lower = key.to_lowercase();
        let normalized_key = match key_lower.as_str() {
            "tab" => "Tab".to_string(),
            "backtab" => "BackTab".to_string(),
            "enter" | "return" => "Enter".to_string(),
            "esc" | "escape" => "Esc".to_string(),
            "up" => "Up".to_string(),
            "down" => "Down".to_string(),
            "left" => "Left".to_string(),
            "right" => "Right".to_string(),
            "space" => " ".to_string(),
            k if k.chars().count() == 1 => k.to_string(),
            _ => return Err(format!("Unknown key: {key}")),
        };

        // Terminals report Shift+Tab as BackTab, with or without the Shift flag
        if normalized_key == "Tab" && normalized_mods.contains(&"Shift") {
            self.add_binding("BackTab", &normalized_mods, action);
            normalized_mods.retain(|m| *m != "Shift");
            self.add_binding("BackTab", &normalized_mods, action);
        } else {
            self.add_binding(&normalized_key, &normalized_mods, action);
        }
        self.hints.insert(action, combo.trim().to_string());
        Ok(())
    }

    /// Get action for key event
    ///
    /// Character keys are matched lowercase with Shift kept as a modifier.
    #[must_use]
    pub fn get_action(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
        let key_str = match code {
            KeyCode::Char(c) => c.to_lowercase().to_string(),
            KeyCode::Tab => "Tab".to_string(),
            KeyCode::BackTab => "BackTab".to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Up => "Up".to_string(),
            KeyCode::Down => "Down".to_string(),
            KeyCode::Left => "Left".to_string(),
            KeyCode::Right => "Right".to_string(),
            _ => return None,
        };

        let mut mod_vec = Vec::new();
        if modifiers.contains(KeyModifiers::CONTROL) {
            mod_vec.push("Ctrl".to_string());
        }
        if modifiers.contains(KeyModifiers::SHIFT) {
            mod_vec.push("Shift".to_string());
        }
        if modifiers.contains(KeyModifiers::ALT) {
            mod_vec.push("Alt".to_string());
        }

        let binding = KeyBinding {
            key: key_str,
            modifiers: mod_vec,
        };

        self.bindings.get(&binding).copied()
    }
}

impl Default for KeybindingManager {
    fn default() -> Self {
        Self::new()
    }
}
