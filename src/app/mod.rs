//! Interactive form application
//!
//! Owns the command builder and translates terminal events into field edits
//! and triggers. The event loop polls input and advances the trigger state
//! machine on a fixed tick so transient messages clear on time.

use anyhow::{Context, Result};
use crossterm::{
    cursor::Show,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal as RatatuiTerminal};
use std::io::{self, Stdout};
use std::time::Instant;
use tokio::time::{interval, Duration};
use tracing::{debug, info};

use crate::builder::{BuilderOptions, CommandBuilder, Transition, TriggerOutcome};
use crate::clipboard::{ClipboardSink, SystemClipboard};
use crate::colors::FormPalette;
use crate::config::Config;
use crate::form::{FieldControl, FieldKind, FieldRegistry};
use crate::keybindings::{Action, KeybindingManager};
use crate::ui::form_view::{self, FormLayout, FormView};

/// How often pending transitions are checked
const TICK_RATE_MS: u64 = 50;

/// Input poll timeout
const POLL_TIMEOUT_MS: u64 = 10;

type Backend = CrosstermBackend<Stdout>;

/// The interactive form
pub struct App<C: ClipboardSink = SystemClipboard> {
    builder: CommandBuilder<C>,
    keybindings: KeybindingManager,
    palette: FormPalette,
    help: String,
    focus: usize,
    layout: FormLayout,
    should_quit: bool,
    // Redraw only when something changed
    dirty: bool,
    frame_count: u64,
}

impl App<SystemClipboard> {
    /// Build the form from configuration
    ///
    /// # Errors
    /// Returns an error if the field list or theme in the config is invalid
    pub fn new(config: &Config) -> Result<Self> {
        let registry =
            FieldRegistry::new(config.fields.clone()).context("Invalid field configuration")?;
        let palette = FormPalette::from_theme(&config.theme)?;
        info!(
            "Initializing form with {} fields, prefix '{}'",
            registry.len(),
            config.command.prefix
        );

        Ok(Self::with_parts(
            CommandBuilder::new(
                registry,
                SystemClipboard::new(),
                BuilderOptions::from_config(config),
            ),
            KeybindingManager::from_config(&config.keybindings),
            palette,
        ))
    }
}

impl<C: ClipboardSink> App<C> {
    #[must_use]
    pub fn with_parts(
        builder: CommandBuilder<C>,
        keybindings: KeybindingManager,
        palette: FormPalette,
    ) -> Self {
        Self {
            builder,
            help: form_view::help_line(&keybindings),
            keybindings,
            palette,
            focus: 0,
            layout: FormLayout::default(),
            should_quit: false,
            dirty: true,
            frame_count: 0,
        }
    }

    #[must_use]
    pub fn builder(&self) -> &CommandBuilder<C> {
        &self.builder
    }

    #[must_use]
    pub fn focus(&self) -> usize {
        self.focus
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Set a field before the form opens
    ///
    /// # Errors
    /// Returns an error for an unknown label or a bad yes/no value
    pub fn prefill(&mut self, label: &str, raw: &str) -> Result<()> {
        self.builder
            .set_from_str(label, raw)
            .with_context(|| format!("Cannot set field '{label}'"))?;
        Ok(())
    }

    /// Main event loop
    ///
    /// # Errors
    /// Returns an error if terminal setup, drawing or event reading fails
    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode().context(
            "Failed to enable raw mode. Ensure you're running in a proper terminal emulator.",
        )?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            crossterm::event::EnableMouseCapture,
            crossterm::event::EnableBracketedPaste,
            Show
        )
        .context("Failed to setup terminal features")?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal =
            RatatuiTerminal::new(backend).context("Failed to create terminal backend")?;

        let result = self.event_loop(&mut terminal).await;

        // Restore the terminal even when the loop failed
        execute!(
            terminal.backend_mut(),
            crossterm::event::DisableMouseCapture,
            crossterm::event::DisableBracketedPaste,
            LeaveAlternateScreen,
            Show
        )?;
        disable_raw_mode()?;
        terminal.show_cursor()?;

        info!("Form closed after {} frames", self.frame_count);
        result
    }

    async fn event_loop(&mut self, terminal: &mut RatatuiTerminal<Backend>) -> Result<()> {
        let mut tick = interval(Duration::from_millis(TICK_RATE_MS));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        while !self.should_quit {
            if self.dirty {
                terminal.draw(|f| self.render(f))?;
                self.dirty = false;
                self.frame_count += 1;
            }

            tokio::select! {
                Ok(Ok(has_event)) = tokio::task::spawn_blocking(|| event::poll(std::time::Duration::from_millis(POLL_TIMEOUT_MS))) => {
                    if has_event {
                        match event::read().context("Failed to read terminal event")? {
                            Event::Key(key) => self.handle_key_event(key, Instant::now()),
                            Event::Mouse(mouse) => self.handle_mouse_event(mouse, Instant::now()),
                            Event::Paste(text) => self.handle_paste(&text),
                            Event::Resize(cols, rows) => {
                                debug!("Resized to {}x{}", cols, rows);
                                self.dirty = true;
                            }
                            _ => {}
                        }
                    }
                }

                _ = tick.tick() => {
                    self.tick(Instant::now());
                }
            }
        }

        Ok(())
    }

    fn render(&mut self, f: &mut ratatui::Frame) {
        let view = FormView {
            registry: self.builder.registry(),
            display: self.builder.display(),
            focus: self.focus,
            palette: &self.palette,
            help: &self.help,
        };
        self.layout = form_view::render(f, &view);
    }

    /// Advance scheduled transitions
    pub fn tick(&mut self, now: Instant) {
        let applied = self.builder.tick(now);
        if applied.is_empty() {
            return;
        }
        if applied.contains(&Transition::ReloadForm) {
            self.focus = 0;
        }
        self.dirty = true;
    }

    /// Handle keyboard input
    pub fn handle_key_event(&mut self, key: KeyEvent, now: Instant) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        self.dirty = true;

        // Tab indents inside the description and moves focus elsewhere
        if key.code == KeyCode::Tab && key.modifiers.is_empty() {
            if self.focused_kind() == Some(FieldKind::MultiLine) {
                self.builder.insert_indent(self.focus);
            } else {
                self.focus_next();
            }
            return;
        }

        if let Some(action) = self.keybindings.get_action(key.code, key.modifiers) {
            match action {
                Action::Trigger => self.trigger(now),
                Action::NextField => self.focus_next(),
                Action::PrevField => self.focus_prev(),
                Action::ClearField => {
                    self.builder.update(self.focus, |field| {
                        field.editor_mut().is_some_and(|editor| editor.clear())
                    });
                }
                Action::Quit => {
                    debug!("Quit requested");
                    self.should_quit = true;
                }
            }
            return;
        }

        match self.focused_kind() {
            Some(FieldKind::Checkbox) => {
                if matches!(key.code, KeyCode::Char(' ') | KeyCode::Enter) {
                    self.builder.update(self.focus, |field| field.toggle());
                }
            }
            Some(kind) => self.edit_text(kind, key),
            None => {}
        }
    }

    fn edit_text(&mut self, kind: FieldKind, key: KeyEvent) {
        let extend = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Enter if kind != FieldKind::MultiLine => self.focus_next(),
            KeyCode::Char(_)
                if key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {}
            code => {
                self.builder.update(self.focus, |field| {
                    let Some(editor) = field.editor_mut() else {
                        return false;
                    };
                    match code {
                        KeyCode::Char(c) => editor.insert_char(c),
                        KeyCode::Enter => editor.insert_char('\n'),
                        KeyCode::Backspace => editor.backspace(),
                        KeyCode::Delete => editor.delete(),
                        KeyCode::Left => {
                            editor.move_left(extend);
                            false
                        }
                        KeyCode::Right => {
                            editor.move_right(extend);
                            false
                        }
                        KeyCode::Home => {
                            editor.move_home(extend);
                            false
                        }
                        KeyCode::End => {
                            editor.move_end(extend);
                            false
                        }
                        _ => false,
                    }
                });
            }
        }
    }

    /// Handle mouse input: clicking the command panel triggers
    pub fn handle_mouse_event(&mut self, mouse: MouseEvent, now: Instant) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }

        if self.layout.in_command_panel(mouse.column, mouse.row) {
            self.trigger(now);
            self.dirty = true;
        } else if let Some(index) = self.layout.field_at(mouse.column, mouse.row) {
            self.focus = index;
            if self.focused_kind() == Some(FieldKind::Checkbox) {
                self.builder.update(index, |field| field.toggle());
            }
            self.dirty = true;
        }
    }

    /// Bracketed paste into the focused text field
    pub fn handle_paste(&mut self, text: &str) {
        let changed = self.builder.update(self.focus, |field| {
            field
                .editor_mut()
                .is_some_and(|editor| editor.insert_str(text))
        });
        if changed {
            self.dirty = true;
        }
    }

    fn trigger(&mut self, now: Instant) {
        match self.builder.trigger(now) {
            TriggerOutcome::Copied(_) => debug!("Trigger succeeded"),
            TriggerOutcome::MissingMandatory(missing) => {
                // Jump to the first empty mandatory field
                if let Some(index) = missing
                    .first()
                    .and_then(|label| self.builder.registry().index_of(label))
                {
                    self.focus = index;
                }
            }
            TriggerOutcome::ClipboardFailed(reason) => debug!("Trigger failed: {}", reason),
        }
    }

    fn focused_kind(&self) -> Option<FieldKind> {
        self.builder.registry().at(self.focus).map(FieldControl::kind)
    }

    fn focus_next(&mut self) {
        let len = self.builder.registry().len();
        if len > 0 {
            self.focus = (self.focus + 1) % len;
        }
    }

    fn focus_prev(&mut self) {
        let len = self.builder.registry().len();
        if len > 0 {
            self.focus = (self.focus + len - 1) % len;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{TriggerState, DEFAULT_FEEDBACK_DELAY};
    use crate::clipboard::MemoryClipboard;
    use crate::form::FieldValue;

    fn app() -> App<MemoryClipboard> {
        App::with_parts(
            CommandBuilder::new(
                FieldRegistry::watdo_todo(),
                MemoryClipboard::new(),
                BuilderOptions::default(),
            ),
            KeybindingManager::new(),
            FormPalette::default_dark(),
        )
    }

    fn press(app: &mut App<MemoryClipboard>, code: KeyCode, modifiers: KeyModifiers) {
        app.handle_key_event(KeyEvent::new(code, modifiers), Instant::now());
    }

    fn type_str(app: &mut App<MemoryClipboard>, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    fn value(app: &App<MemoryClipboard>, label: &str) -> Option<FieldValue> {
        app.builder().registry().get(label).map(FieldControl::read_value)
    }

    #[test]
    fn test_typing_updates_command() {
        let mut app = app();
        type_str(&mut app, "Buy milk");
        assert_eq!(value(&app, "Title"), Some(FieldValue::Text("Buy milk".to_string())));
        assert!(app
            .builder()
            .command()
            .as_str()
            .starts_with(r#"watdo todo "Buy milk" "#));
    }

    #[test]
    fn test_tab_moves_focus_outside_description() {
        let mut app = app();
        press(&mut app, KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(app.focus(), 1);
        press(&mut app, KeyCode::BackTab, KeyModifiers::SHIFT);
        assert_eq!(app.focus(), 0);
        press(&mut app, KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(app.focus(), 6);
    }

    #[test]
    fn test_tab_indents_description() {
        let mut app = app();
        let description = app.builder().registry().index_of("Description").unwrap();
        while app.focus() != description {
            press(&mut app, KeyCode::Down, KeyModifiers::NONE);
        }
        type_str(&mut app, "a");
        press(&mut app, KeyCode::Tab, KeyModifiers::NONE);
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        type_str(&mut app, "b");
        assert_eq!(app.focus(), description);
        assert_eq!(
            value(&app, "Description"),
            Some(FieldValue::Text("a    \nb".to_string()))
        );
        assert!(app.builder().command().as_str().contains(r#""a    \nb""#));
    }

    #[test]
    fn test_space_toggles_checkbox() {
        let mut app = app();
        let important = app.builder().registry().index_of("Is Important").unwrap();
        while app.focus() != important {
            press(&mut app, KeyCode::Tab, KeyModifiers::NONE);
        }
        press(&mut app, KeyCode::Char(' '), KeyModifiers::NONE);
        assert_eq!(value(&app, "Is Important"), Some(FieldValue::Flag(true)));
    }

    #[test]
    fn test_trigger_with_missing_field_focuses_it() {
        let mut app = app();
        type_str(&mut app, "Groceries");
        press(&mut app, KeyCode::Char('y'), KeyModifiers::CONTROL);
        assert_eq!(app.builder().state(), TriggerState::Error);
        assert_eq!(app.focus(), 1);
    }

    #[test]
    fn test_successful_trigger_resets_after_delay() {
        let mut app = app();
        type_str(&mut app, "Groceries");
        press(&mut app, KeyCode::Tab, KeyModifiers::NONE);
        type_str(&mut app, "home");

        let start = Instant::now();
        app.handle_key_event(
            KeyEvent::new(KeyCode::Char('y'), KeyModifiers::CONTROL),
            start,
        );
        assert_eq!(app.builder().state(), TriggerState::Success);
        assert_eq!(
            app.builder().clipboard().contents(),
            Some(r#"watdo todo Groceries home no "" "" yes no"#)
        );

        app.tick(start + DEFAULT_FEEDBACK_DELAY);
        assert_eq!(app.builder().state(), TriggerState::Idle);
        assert_eq!(app.focus(), 0);
        assert_eq!(value(&app, "Title"), Some(FieldValue::Text(String::new())));
    }

    #[test]
    fn test_clear_field_and_quit() {
        let mut app = app();
        type_str(&mut app, "oops");
        press(&mut app, KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert_eq!(value(&app, "Title"), Some(FieldValue::Text(String::new())));
        assert!(!app.should_quit());
        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert!(app.should_quit());
    }

    #[test]
    fn test_paste_into_single_line_drops_newlines() {
        let mut app = app();
        app.handle_paste("two\nlines");
        assert_eq!(value(&app, "Title"), Some(FieldValue::Text("twolines".to_string())));
    }

    #[test]
    fn test_release_events_are_ignored() {
        let mut app = app();
        let mut key = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        app.handle_key_event(key, Instant::now());
        assert_eq!(value(&app, "Title"), Some(FieldValue::Text(String::new())));
    }
}
