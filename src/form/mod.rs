//! Field registry for the command form
//!
//! Holds the ordered set of named form controls. Each control is bound once
//! from a [`FieldSpec`] and lives until the form is dropped; edits go through
//! the registry so callers learn whether a value actually changed.

pub mod editor;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{FormError, Result};

use self::editor::TextEditor;

/// Kind of form control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    MultiLine,
    Checkbox,
}

impl FieldKind {
    fn value_name(self) -> &'static str {
        match self {
            Self::Text | Self::MultiLine => "text",
            Self::Checkbox => "yes/no",
        }
    }

    fn empty_value(self) -> FieldValue {
        match self {
            Self::Text | Self::MultiLine => FieldValue::Text(String::new()),
            Self::Checkbox => FieldValue::Flag(false),
        }
    }

    fn accepts(self, value: &FieldValue) -> bool {
        matches!(
            (self, value),
            (Self::Text | Self::MultiLine, FieldValue::Text(_)) | (Self::Checkbox, FieldValue::Flag(_))
        )
    }
}

/// Current value of a control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

impl FieldValue {
    /// Only empty text counts as empty; a checkbox always has a value
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Flag(_) => false,
        }
    }
}

/// Startup configuration of a single control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub label: String,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldValue>,
}

impl FieldSpec {
    #[must_use]
    pub fn new(label: &str, kind: FieldKind, mandatory: bool) -> Self {
        Self {
            label: label.to_string(),
            kind,
            mandatory,
            default: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, value: FieldValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Positional arguments of `watdo todo`, in order.
    ///
    /// Title, category and importance have no default on the bot side, so
    /// they are mandatory here. Reminders are on unless unchecked.
    #[must_use]
    pub fn watdo_todo() -> Vec<Self> {
        vec![
            Self::new("Title", FieldKind::Text, true),
            Self::new("Category", FieldKind::Text, true),
            Self::new("Is Important", FieldKind::Checkbox, true),
            Self::new("Due", FieldKind::Text, false),
            Self::new("Description", FieldKind::MultiLine, false),
            Self::new("Remind", FieldKind::Checkbox, false).with_default(FieldValue::Flag(true)),
            Self::new("Auto Done on Remind", FieldKind::Checkbox, false),
        ]
    }

    /// YAML reads `default: yes` as text, so checkbox defaults given as
    /// words go through the same parser as `--set`.
    fn normalize_default(&mut self) -> Result<()> {
        if self.kind == FieldKind::Checkbox {
            if let Some(FieldValue::Text(raw)) = &self.default {
                let flag = parse_flag(&self.label, raw)?;
                self.default = Some(FieldValue::Flag(flag));
            }
        }
        Ok(())
    }

    fn initial_value(&self) -> FieldValue {
        match &self.default {
            Some(value) if self.kind.accepts(value) => value.clone(),
            _ => self.kind.empty_value(),
        }
    }
}

/// Read capability of a bound form control
pub trait FieldControl {
    fn label(&self) -> &str;
    fn kind(&self) -> FieldKind;
    fn is_mandatory(&self) -> bool;
    fn read_value(&self) -> FieldValue;
}

#[derive(Debug, Clone)]
enum FieldState {
    Text(TextEditor),
    Flag(bool),
}

/// A control bound to its spec
#[derive(Debug, Clone)]
pub struct Field {
    spec: FieldSpec,
    state: FieldState,
}

impl Field {
    #[must_use]
    pub fn new(spec: FieldSpec) -> Self {
        let state = Self::state_for(&spec);
        Self { spec, state }
    }

    fn state_for(spec: &FieldSpec) -> FieldState {
        match spec.initial_value() {
            FieldValue::Text(text) => {
                FieldState::Text(TextEditor::new(text, spec.kind == FieldKind::MultiLine))
            }
            FieldValue::Flag(flag) => FieldState::Flag(flag),
        }
    }

    #[must_use]
    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    #[must_use]
    pub fn editor(&self) -> Option<&TextEditor> {
        match &self.state {
            FieldState::Text(editor) => Some(editor),
            FieldState::Flag(_) => None,
        }
    }

    #[must_use]
    pub fn editor_mut(&mut self) -> Option<&mut TextEditor> {
        match &mut self.state {
            FieldState::Text(editor) => Some(editor),
            FieldState::Flag(_) => None,
        }
    }

    /// Flip a checkbox. Returns false for text controls.
    pub fn toggle(&mut self) -> bool {
        match &mut self.state {
            FieldState::Flag(flag) => {
                *flag = !*flag;
                true
            }
            FieldState::Text(_) => false,
        }
    }

    /// Replace the value. Returns whether it changed.
    ///
    /// # Errors
    /// Returns [`FormError::KindMismatch`] when the value does not fit the control
    pub fn set_value(&mut self, value: FieldValue) -> Result<bool> {
        match (&mut self.state, value) {
            (FieldState::Text(editor), FieldValue::Text(text)) => Ok(editor.set_text(&text)),
            (FieldState::Flag(flag), FieldValue::Flag(new)) => {
                let changed = *flag != new;
                *flag = new;
                Ok(changed)
            }
            _ => Err(FormError::KindMismatch {
                label: self.spec.label.clone(),
                expected: self.spec.kind.value_name(),
            }),
        }
    }

    /// Restore the initial value
    pub fn reset(&mut self) {
        self.state = Self::state_for(&self.spec);
    }
}

impl FieldControl for Field {
    fn label(&self) -> &str {
        &self.spec.label
    }

    fn kind(&self) -> FieldKind {
        self.spec.kind
    }

    fn is_mandatory(&self) -> bool {
        self.spec.mandatory
    }

    fn read_value(&self) -> FieldValue {
        match &self.state {
            FieldState::Text(editor) => FieldValue::Text(editor.text().to_string()),
            FieldState::Flag(flag) => FieldValue::Flag(*flag),
        }
    }
}

/// Labels of mandatory controls that currently have no value
pub fn missing_mandatory<'a, C, I>(controls: I) -> Vec<String>
where
    C: FieldControl + 'a,
    I: IntoIterator<Item = &'a C>,
{
    controls
        .into_iter()
        .filter(|c| c.is_mandatory() && c.read_value().is_empty())
        .map(|c| c.label().to_string())
        .collect()
}

/// Parse a yes/no style flag as accepted on the command line
///
/// # Errors
/// Returns [`FormError::InvalidFlag`] for anything that is not a recognised flag word
pub fn parse_flag(label: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "yes" | "y" | "true" | "1" | "on" => Ok(true),
        "no" | "n" | "false" | "0" | "off" => Ok(false),
        _ => Err(FormError::InvalidFlag {
            label: label.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Ordered registry of bound controls
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    fields: Vec<Field>,
}

impl FieldRegistry {
    /// Bind one control per spec, in declaration order
    ///
    /// # Errors
    /// Returns an error if the list is empty, a label repeats, or a default
    /// does not fit its control
    pub fn new(mut specs: Vec<FieldSpec>) -> Result<Self> {
        if specs.is_empty() {
            return Err(FormError::EmptyRegistry);
        }

        for spec in &mut specs {
            spec.normalize_default()?;
        }

        let mut seen = HashSet::with_capacity(specs.len());
        for spec in &specs {
            if !seen.insert(spec.label.as_str()) {
                return Err(FormError::DuplicateField(spec.label.clone()));
            }
            if let Some(default) = &spec.default {
                if !spec.kind.accepts(default) {
                    return Err(FormError::KindMismatch {
                        label: spec.label.clone(),
                        expected: spec.kind.value_name(),
                    });
                }
            }
        }

        Ok(Self {
            fields: specs.into_iter().map(Field::new).collect(),
        })
    }

    /// Registry for the `watdo todo` command
    #[must_use]
    pub fn watdo_todo() -> Self {
        Self {
            fields: FieldSpec::watdo_todo().into_iter().map(Field::new).collect(),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.spec.label == label)
    }

    pub fn get_mut(&mut self, label: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.spec.label == label)
    }

    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn at_mut(&mut self, index: usize) -> Option<&mut Field> {
        self.fields.get_mut(index)
    }

    #[must_use]
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.spec.label == label)
    }

    /// Current values in declaration order
    pub fn values(&self) -> impl Iterator<Item = FieldValue> + '_ {
        self.fields.iter().map(FieldControl::read_value)
    }

    /// Set a value by label. Returns whether it changed.
    ///
    /// # Errors
    /// Returns an error for an unknown label or a value of the wrong kind
    pub fn set_value(&mut self, label: &str, value: FieldValue) -> Result<bool> {
        self.get_mut(label)
            .ok_or_else(|| FormError::UnknownField(label.to_string()))?
            .set_value(value)
    }

    /// Set a value from its command-line spelling
    ///
    /// # Errors
    /// Returns an error for an unknown label or an unparseable flag
    pub fn set_from_str(&mut self, label: &str, raw: &str) -> Result<bool> {
        let field = self
            .get_mut(label)
            .ok_or_else(|| FormError::UnknownField(label.to_string()))?;
        let value = match field.kind() {
            FieldKind::Checkbox => FieldValue::Flag(parse_flag(label, raw)?),
            FieldKind::Text | FieldKind::MultiLine => FieldValue::Text(raw.to_string()),
        };
        field.set_value(value)
    }

    /// Restore every control to its initial value
    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.reset();
        }
    }

    #[must_use]
    pub fn missing_mandatory(&self) -> Vec<String> {
        missing_mandatory(&self.fields)
    }
}

impl<'a> IntoIterator for &'a FieldRegistry {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
