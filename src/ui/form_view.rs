//! Form rendering
//!
//! Draws one widget per field, the command panel and a help line, and
//! reports where everything landed so mouse clicks can be mapped back.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

use crate::builder::{Display, Tone};
use crate::colors::FormPalette;
use crate::form::{FieldControl, FieldKind, FieldRegistry, FieldValue};
use crate::keybindings::{Action, KeybindingManager};

/// Height of the command panel including borders
const COMMAND_PANEL_HEIGHT: u16 = 5;

/// Minimum height of a multi-line field including borders
const MULTILINE_MIN_HEIGHT: u16 = 5;

/// What to draw
pub struct FormView<'a> {
    pub registry: &'a FieldRegistry,
    pub display: &'a Display,
    pub focus: usize,
    pub palette: &'a FormPalette,
    pub help: &'a str,
}

/// Where things were drawn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormLayout {
    pub fields: Vec<Rect>,
    pub command_panel: Rect,
}

impl FormLayout {
    /// Index of the field under a screen position
    #[must_use]
    pub fn field_at(&self, column: u16, row: u16) -> Option<usize> {
        self.fields.iter().position(|r| contains(*r, column, row))
    }

    #[must_use]
    pub fn in_command_panel(&self, column: u16, row: u16) -> bool {
        contains(self.command_panel, column, row)
    }
}

fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x
        && column < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}

/// Offset that keeps `caret` inside a window of `size` cells
#[must_use]
pub fn scroll_offset(caret: usize, size: u16) -> u16 {
    let size = usize::from(size.max(1));
    let offset = (caret + 1).saturating_sub(size);
    u16::try_from(offset).unwrap_or(u16::MAX)
}

/// Help line advertising the active key combos
#[must_use]
pub fn help_line(keys: &KeybindingManager) -> String {
    format!(
        " {} copy  {}/{} move  Space toggle  {} clear  {} quit ",
        keys.hint(Action::Trigger),
        keys.hint(Action::NextField),
        keys.hint(Action::PrevField),
        keys.hint(Action::ClearField),
        keys.hint(Action::Quit),
    )
}

/// Field title with the mandatory marker
#[must_use]
pub fn field_title(label: &str, mandatory: bool) -> String {
    if mandatory {
        format!(" {label} * ")
    } else {
        format!(" {label} ")
    }
}

/// Draw the whole form
pub fn render(f: &mut Frame, view: &FormView<'_>) -> FormLayout {
    let palette = view.palette;
    let base = Style::default()
        .fg(palette.foreground.into())
        .bg(palette.background.into());

    let mut constraints: Vec<Constraint> = view
        .registry
        .iter()
        .map(|field| match field.kind() {
            FieldKind::Text => Constraint::Length(3),
            FieldKind::MultiLine => Constraint::Min(MULTILINE_MIN_HEIGHT),
            FieldKind::Checkbox => Constraint::Length(1),
        })
        .collect();
    constraints.push(Constraint::Length(COMMAND_PANEL_HEIGHT));
    constraints.push(Constraint::Length(1));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(f.size());

    let field_count = view.registry.len();
    let layout = FormLayout {
        fields: chunks[..field_count].to_vec(),
        command_panel: chunks[field_count],
    };

    for (index, field) in view.registry.iter().enumerate() {
        let area = chunks[index];
        let focused = index == view.focus;
        let accent = if field.is_mandatory() {
            palette.primary
        } else {
            palette.muted
        };

        match field.read_value() {
            FieldValue::Flag(checked) => {
                let mark = if checked { "[x]" } else { "[ ]" };
                let mut label_style = base;
                if field.is_mandatory() {
                    label_style = label_style.fg(palette.primary.into());
                }
                if focused {
                    label_style = label_style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
                }
                let line = Line::from(vec![
                    Span::styled(format!(" {mark} "), base.fg(accent.into())),
                    Span::styled(field_title(field.label(), field.is_mandatory()), label_style),
                ]);
                f.render_widget(Paragraph::new(line).style(base), area);
            }
            FieldValue::Text(text) => {
                let block = Block::default()
                    .borders(Borders::ALL)
                    .border_type(if focused {
                        BorderType::Thick
                    } else {
                        BorderType::Plain
                    })
                    .border_style(Style::default().fg(accent.into()))
                    .title(field_title(field.label(), field.is_mandatory()));
                let inner = block.inner(area);

                let (line, column) = field.editor().map_or((0, 0), |e| e.caret_position());
                let scroll = if field.kind() == FieldKind::MultiLine {
                    (scroll_offset(line, inner.height), 0)
                } else {
                    (0, scroll_offset(column, inner.width))
                };

                let paragraph = Paragraph::new(Text::from(text))
                    .style(base)
                    .block(block)
                    .scroll(scroll);
                f.render_widget(paragraph, area);

                if focused && inner.width > 0 && inner.height > 0 {
                    let x = u16::try_from(column)
                        .unwrap_or(u16::MAX)
                        .saturating_sub(scroll.1)
                        .min(inner.width - 1);
                    let y = u16::try_from(line)
                        .unwrap_or(u16::MAX)
                        .saturating_sub(scroll.0)
                        .min(inner.height - 1);
                    f.set_cursor(inner.x + x, inner.y + y);
                }
            }
        }
    }

    render_command_panel(f, view.display, palette, layout.command_panel);

    let help = Paragraph::new(view.help).style(base.fg(palette.muted.into()));
    f.render_widget(help, chunks[field_count + 1]);

    layout
}

fn render_command_panel(f: &mut Frame, display: &Display, palette: &FormPalette, area: Rect) {
    let color = match display.tone {
        Tone::Normal => palette.foreground,
        Tone::Success => palette.success,
        Tone::Error => palette.error,
    };
    let mut style = Style::default()
        .fg(color.into())
        .bg(palette.background.into());
    if display.tone != Tone::Normal {
        style = style.add_modifier(Modifier::BOLD);
    }

    let panel = Paragraph::new(display.text.as_str())
        .style(style)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color.into()))
                .title(" Command (click to copy) "),
        );
    f.render_widget(panel, area);
}
