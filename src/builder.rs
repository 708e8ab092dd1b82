//! Command builder and trigger state machine
//!
//! The builder owns the field registry, the derived command string and the
//! display surface. Every change to a field recomputes the command and
//! writes it to the display. A trigger validates the mandatory fields and
//! either copies the command (Success) or flags the problem (Error). Both
//! states are transient: they schedule a transition that [`CommandBuilder::tick`]
//! applies once its deadline passes, so time is driven by the caller.

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::clipboard::{ClipboardSink, SystemClipboard};
use crate::command::{self, CommandString, QuotePolicy, DEFAULT_PREFIX};
use crate::config::Config;
use crate::error::Result;
use crate::form::{Field, FieldKind, FieldRegistry, FieldValue};

/// Delay before a transient state resolves
pub const DEFAULT_FEEDBACK_DELAY: Duration = Duration::from_millis(1000);

/// Spaces inserted by Tab in a multi-line field
pub const DEFAULT_TAB_WIDTH: usize = 4;

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Copied!";
pub const DEFAULT_ERROR_MESSAGE: &str = "Missing required parameters!";

/// Builder settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderOptions {
    pub prefix: String,
    pub quote_policy: QuotePolicy,
    pub feedback_delay: Duration,
    pub tab_width: usize,
    pub success_message: String,
    pub error_message: String,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            quote_policy: QuotePolicy::Minimal,
            feedback_delay: DEFAULT_FEEDBACK_DELAY,
            tab_width: DEFAULT_TAB_WIDTH,
            success_message: DEFAULT_SUCCESS_MESSAGE.to_string(),
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
        }
    }
}

impl BuilderOptions {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            prefix: config.command.prefix.clone(),
            quote_policy: config.command.quote_policy,
            feedback_delay: Duration::from_millis(config.form.feedback_delay_ms),
            tab_width: config.form.tab_width,
            success_message: config.form.success_message.clone(),
            error_message: config.form.error_message.clone(),
        }
    }
}

/// Trigger handler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Idle,
    Success,
    Error,
}

/// How the display surface is styled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Normal,
    Success,
    Error,
}

/// Text shown on the display surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Display {
    pub text: String,
    pub tone: Tone,
}

/// Deferred effect of a transient state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Reset every field and show the fresh command
    ReloadForm,
    /// Show the current command again
    RevertDisplay,
}

#[derive(Debug, Clone, Copy)]
struct ScheduledTransition {
    due: Instant,
    transition: Transition,
}

/// Result of a trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The command was copied to the clipboard
    Copied(String),
    /// These mandatory fields were empty
    MissingMandatory(Vec<String>),
    /// The clipboard write failed
    ClipboardFailed(String),
}

/// Builds the command from the registry and handles triggers
pub struct CommandBuilder<C: ClipboardSink = SystemClipboard> {
    registry: FieldRegistry,
    clipboard: C,
    options: BuilderOptions,
    command: CommandString,
    display: Display,
    state: TriggerState,
    pending: Vec<ScheduledTransition>,
}

impl<C: ClipboardSink> CommandBuilder<C> {
    #[must_use]
    pub fn new(registry: FieldRegistry, clipboard: C, options: BuilderOptions) -> Self {
        let mut builder = Self {
            registry,
            clipboard,
            options,
            command: CommandString::default(),
            display: Display {
                text: String::new(),
                tone: Tone::Normal,
            },
            state: TriggerState::Idle,
            pending: Vec::new(),
        };
        builder.refresh();
        builder
    }

    #[must_use]
    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    #[must_use]
    pub fn command(&self) -> &CommandString {
        &self.command
    }

    #[must_use]
    pub fn display(&self) -> &Display {
        &self.display
    }

    #[must_use]
    pub fn state(&self) -> TriggerState {
        self.state
    }

    #[must_use]
    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    #[must_use]
    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    /// Deadline of the earliest scheduled transition
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|p| p.due).min()
    }

    #[must_use]
    pub fn pending_transitions(&self) -> usize {
        self.pending.len()
    }

    /// Recompute the command and write it to the display
    ///
    /// The tone is left alone so a transient message keeps its styling
    /// until its transition runs.
    pub fn refresh(&mut self) {
        self.command = command::serialize(
            &self.options.prefix,
            self.options.quote_policy,
            self.registry.values(),
        );
        self.display.text = self.command.as_str().to_string();
    }

    /// Apply `edit` to the field at `index`, recomputing if it reports a change
    pub fn update<F>(&mut self, index: usize, edit: F) -> bool
    where
        F: FnOnce(&mut Field) -> bool,
    {
        let changed = self.registry.at_mut(index).is_some_and(edit);
        if changed {
            self.refresh();
        }
        changed
    }

    /// Set a field by label
    ///
    /// # Errors
    /// Returns an error for an unknown label or a value of the wrong kind
    pub fn set_value(&mut self, label: &str, value: FieldValue) -> Result<bool> {
        let changed = self.registry.set_value(label, value)?;
        if changed {
            self.refresh();
        }
        Ok(changed)
    }

    /// Set a field from its command-line spelling
    ///
    /// # Errors
    /// Returns an error for an unknown label or an unparseable flag
    pub fn set_from_str(&mut self, label: &str, raw: &str) -> Result<bool> {
        let changed = self.registry.set_from_str(label, raw)?;
        if changed {
            self.refresh();
        }
        Ok(changed)
    }

    /// Tab inside a multi-line field: indent at the caret
    pub fn insert_indent(&mut self, index: usize) -> bool {
        let width = self.options.tab_width;
        self.update(index, |field| {
            if field.spec().kind != FieldKind::MultiLine {
                return false;
            }
            field
                .editor_mut()
                .is_some_and(|editor| editor.insert_indent(width))
        })
    }

    /// Validate the mandatory fields and copy the command
    pub fn trigger(&mut self, now: Instant) -> TriggerOutcome {
        let missing = self.registry.missing_mandatory();
        if !missing.is_empty() {
            debug!("Trigger rejected, missing: {}", missing.join(", "));
            let message = self.options.error_message.clone();
            self.enter(TriggerState::Error, message, Transition::RevertDisplay, now);
            return TriggerOutcome::MissingMandatory(missing);
        }

        let text = self.command.as_str().to_string();
        match self.clipboard.set_text(&text) {
            Ok(()) => {
                info!("Copied command to clipboard: {}", text);
                let message = self.options.success_message.clone();
                self.enter(TriggerState::Success, message, Transition::ReloadForm, now);
                TriggerOutcome::Copied(text)
            }
            Err(e) => {
                warn!("Failed to copy to clipboard: {}", e);
                let reason = e.to_string();
                self.enter(
                    TriggerState::Error,
                    format!("Copy failed: {reason}"),
                    Transition::RevertDisplay,
                    now,
                );
                TriggerOutcome::ClipboardFailed(reason)
            }
        }
    }

    /// Run every transition due at `now`, earliest first
    pub fn tick(&mut self, now: Instant) -> Vec<Transition> {
        if self.pending.is_empty() {
            return Vec::new();
        }

        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.due <= now);
        self.pending = pending;
        due.sort_by_key(|p| p.due);

        due.into_iter()
            .map(|scheduled| {
                self.apply(scheduled.transition);
                scheduled.transition
            })
            .collect()
    }

    fn enter(&mut self, state: TriggerState, message: String, then: Transition, now: Instant) {
        self.state = state;
        self.display = Display {
            text: message,
            tone: match state {
                TriggerState::Success => Tone::Success,
                TriggerState::Error => Tone::Error,
                TriggerState::Idle => Tone::Normal,
            },
        };
        self.pending.push(ScheduledTransition {
            due: now + self.options.feedback_delay,
            transition: then,
        });
    }

    fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::ReloadForm => {
                self.registry.reset();
                info!("Form reloaded");
            }
            Transition::RevertDisplay => {
                // A later successful trigger owns the display until its reload
                if self
                    .pending
                    .iter()
                    .any(|p| p.transition == Transition::ReloadForm)
                {
                    debug!("Revert skipped, reload pending");
                    return;
                }
                debug!("Display reverted to command");
            }
        }
        self.refresh();
        self.display.tone = Tone::Normal;
        self.state = TriggerState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::form::FieldControl;

    fn builder() -> CommandBuilder<MemoryClipboard> {
        CommandBuilder::new(
            FieldRegistry::watdo_todo(),
            MemoryClipboard::new(),
            BuilderOptions::default(),
        )
    }

    fn fill_mandatory(builder: &mut CommandBuilder<MemoryClipboard>) {
        builder.set_from_str("Title", "Groceries").unwrap();
        builder.set_from_str("Category", "home").unwrap();
    }

    #[test]
    fn test_initial_display_shows_command() {
        let builder = builder();
        assert_eq!(builder.state(), TriggerState::Idle);
        assert_eq!(builder.command().as_str(), r#"watdo todo "" "" no "" "" yes no"#);
        assert_eq!(builder.display().text, builder.command().as_str());
        assert_eq!(builder.display().tone, Tone::Normal);
    }

    #[test]
    fn test_change_recomputes_command() {
        let mut builder = builder();
        assert!(builder.set_from_str("Description", "Buy milk").unwrap());
        assert_eq!(builder.command().field_tokens()[4], "\"Buy milk\"");
        assert_eq!(builder.display().text, builder.command().as_str());
    }

    #[test]
    fn test_update_only_refreshes_on_change() {
        let mut builder = builder();
        let index = builder.registry().index_of("Title").unwrap();
        assert!(!builder.update(index, |_| false));
        assert!(builder.update(index, |field| {
            field.editor_mut().is_some_and(|e| e.insert_char('x'))
        }));
        assert!(builder.command().as_str().starts_with("watdo todo x "));
        assert!(!builder.update(99, |_| true));
    }

    #[test]
    fn test_missing_mandatory_shows_error_then_reverts() {
        let mut builder = builder();
        builder.set_from_str("Title", "Groceries").unwrap();
        let before = builder.command().clone();
        let start = Instant::now();

        let outcome = builder.trigger(start);
        assert_eq!(outcome, TriggerOutcome::MissingMandatory(vec!["Category".to_string()]));
        assert_eq!(builder.state(), TriggerState::Error);
        assert_eq!(builder.display().text, DEFAULT_ERROR_MESSAGE);
        assert_eq!(builder.display().tone, Tone::Error);
        assert_eq!(builder.command(), &before);
        assert!(builder.clipboard().contents().is_none());

        assert!(builder.tick(start + Duration::from_millis(999)).is_empty());
        assert_eq!(builder.state(), TriggerState::Error);

        let applied = builder.tick(start + Duration::from_secs(1));
        assert_eq!(applied, [Transition::RevertDisplay]);
        assert_eq!(builder.state(), TriggerState::Idle);
        assert_eq!(builder.display().text, before.as_str());
        assert_eq!(builder.display().tone, Tone::Normal);
        assert_eq!(
            builder.registry().get("Title").map(FieldControl::read_value),
            Some(FieldValue::Text("Groceries".to_string()))
        );
    }

    #[test]
    fn test_success_copies_then_reloads() {
        let mut builder = builder();
        fill_mandatory(&mut builder);
        let expected = builder.command().as_str().to_string();
        let start = Instant::now();

        assert_eq!(builder.trigger(start), TriggerOutcome::Copied(expected.clone()));
        assert_eq!(builder.clipboard().contents(), Some(expected.as_str()));
        assert_eq!(builder.state(), TriggerState::Success);
        assert_eq!(builder.display().text, DEFAULT_SUCCESS_MESSAGE);
        assert_eq!(builder.next_deadline(), Some(start + DEFAULT_FEEDBACK_DELAY));

        let applied = builder.tick(start + DEFAULT_FEEDBACK_DELAY);
        assert_eq!(applied, [Transition::ReloadForm]);
        assert_eq!(builder.state(), TriggerState::Idle);
        assert_eq!(builder.registry().missing_mandatory(), ["Title", "Category"]);
        assert_eq!(builder.display().text, builder.command().as_str());
        assert_eq!(builder.pending_transitions(), 0);
    }

    #[test]
    fn test_clipboard_failure_falls_back_to_error() {
        let mut builder = CommandBuilder::new(
            FieldRegistry::watdo_todo(),
            MemoryClipboard::failing("no display"),
            BuilderOptions::default(),
        );
        fill_mandatory(&mut builder);
        let start = Instant::now();

        let outcome = builder.trigger(start);
        assert!(matches!(outcome, TriggerOutcome::ClipboardFailed(ref r) if r.contains("no display")));
        assert_eq!(builder.state(), TriggerState::Error);
        assert!(builder.display().text.starts_with("Copy failed"));

        builder.tick(start + DEFAULT_FEEDBACK_DELAY);
        assert_eq!(builder.state(), TriggerState::Idle);
        assert!(builder.registry().missing_mandatory().is_empty());
    }

    #[test]
    fn test_overlapping_triggers_schedule_overlapping_transitions() {
        let mut builder = builder();
        let start = Instant::now();
        builder.trigger(start);
        fill_mandatory(&mut builder);
        builder.trigger(start + Duration::from_millis(500));
        assert_eq!(builder.pending_transitions(), 2);

        assert_eq!(
            builder.tick(start + Duration::from_millis(1000)),
            [Transition::RevertDisplay]
        );
        // The pending reload keeps the success feedback up
        assert_eq!(builder.state(), TriggerState::Success);
        assert_eq!(builder.display().text, DEFAULT_SUCCESS_MESSAGE);
        assert_eq!(builder.display().tone, Tone::Success);
        assert_eq!(builder.pending_transitions(), 1);

        assert_eq!(
            builder.tick(start + Duration::from_millis(1500)),
            [Transition::ReloadForm]
        );
        assert_eq!(builder.state(), TriggerState::Idle);
        assert_eq!(builder.display().tone, Tone::Normal);
        assert_eq!(builder.registry().missing_mandatory(), ["Title", "Category"]);
    }

    #[test]
    fn test_error_after_error_still_reverts() {
        let mut builder = builder();
        let start = Instant::now();
        builder.trigger(start);
        builder.trigger(start + Duration::from_millis(500));

        builder.tick(start + Duration::from_millis(1000));
        assert_eq!(builder.state(), TriggerState::Idle);
        assert_eq!(builder.display().text, builder.command().as_str());
        assert_eq!(builder.pending_transitions(), 1);
    }

    #[test]
    fn test_edit_during_error_updates_text_keeps_tone() {
        let mut builder = builder();
        builder.trigger(Instant::now());
        builder.set_from_str("Title", "Groceries").unwrap();
        assert_eq!(builder.display().text, builder.command().as_str());
        assert_eq!(builder.display().tone, Tone::Error);
    }

    #[test]
    fn test_indent_only_in_multiline() {
        let mut builder = builder();
        let title = builder.registry().index_of("Title").unwrap();
        let description = builder.registry().index_of("Description").unwrap();

        assert!(!builder.insert_indent(title));
        assert!(builder.insert_indent(description));
        assert_eq!(builder.command().field_tokens()[4], "\"    \"");
        let caret = builder
            .registry()
            .at(description)
            .and_then(Field::editor)
            .map(|e| e.caret());
        assert_eq!(caret, Some(4));
    }

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        config.form.feedback_delay_ms = 250;
        config.command.quote_policy = QuotePolicy::Always;
        let options = BuilderOptions::from_config(&config);
        assert_eq!(options.feedback_delay, Duration::from_millis(250));
        assert_eq!(options.quote_policy, QuotePolicy::Always);
        assert_eq!(options.prefix, DEFAULT_PREFIX);
    }
}
