//! Headless single-frame rendering of a wizard step.
//!
//! Layout:
//! - Centered window frame titled "Install Wizard"
//! - Content panel titled "Step k of N: <task>" listing the step's fields
//! - Bottom button row: [ Back ] [ Next ] [ Complete ]
//!
//! Drawn into an in-memory backend so it can run in CI/tooling without touching the real
//! terminal (no raw mode / alternate screen).

use anyhow::Result;
use log::info;
use ratatui::backend::TestBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Terminal;

use crate::engine::{StepFlowEngine, StepPage};
use crate::models::{FieldDescriptor, FieldKind, FieldValue};

pub const SMOKE_WIDTH: u16 = 100;
pub const SMOKE_HEIGHT: u16 = 30;

/// Render step `step` (clamped to the configured range) and log the frame.
pub fn smoke(engine: &StepFlowEngine, step: usize) -> Result<()> {
    info!(
        "[PHASE: tui] [STEP: smoke] Rendering single-frame TUI smoke step={}",
        step
    );
    let page = engine.preview_step(step)?;
    let buffer = render_page(&page, SMOKE_WIDTH, SMOKE_HEIGHT)?;
    for line in buffer_lines(&buffer) {
        log::debug!("{}", line.trim_end());
    }
    info!(
        "[PHASE: tui] [STEP: smoke] Rendered '{}' ({}/{})",
        page.step_id, page.step, page.total_steps
    );
    Ok(())
}

/// Draw one frame of `page` and hand back the resulting cell buffer.
pub fn render_page(page: &StepPage, width: u16, height: u16) -> Result<Buffer> {
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend)?;
    terminal.draw(|f| draw(f.size(), f, page))?;
    Ok(terminal.backend().buffer().clone())
}

/// Buffer contents as plain text, one string per row.
pub fn buffer_lines(buffer: &Buffer) -> Vec<String> {
    let width = buffer.area.width as usize;
    if width == 0 {
        return Vec::new();
    }
    buffer
        .content
        .chunks(width)
        .map(|row| row.iter().map(|cell| cell.symbol()).collect())
        .collect()
}

fn draw(area: Rect, f: &mut ratatui::Frame<'_>, page: &StepPage) {
    let window_area = centered_window(area, SMOKE_WIDTH, SMOKE_HEIGHT);

    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("Install Wizard");
    f.render_widget(outer_block, window_area);

    // Inner layout: content + buttons row
    let inner = window_area.inner(&ratatui::layout::Margin {
        vertical: 1,
        horizontal: 1,
    });
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(inner);

    let title = format!(
        "Step {} of {}: {}",
        page.step, page.total_steps, page.task_name
    );
    let content = Paragraph::new(content_text(page))
        .block(Block::default().borders(Borders::ALL).title(title))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false });
    f.render_widget(content, rows[0]);

    draw_buttons(f, rows[1], page);
}

fn content_text(page: &StepPage) -> Text<'static> {
    let mut lines = Vec::new();
    if let Some(feedback) = &page.feedback {
        let color = if feedback.is_error() {
            Color::Red
        } else {
            Color::Cyan
        };
        lines.push(Line::from(Span::styled(
            feedback.message.clone(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));
    }
    for field in &page.fields {
        lines.push(field_line(field));
    }
    Text::from(lines)
}

fn field_line(field: &FieldDescriptor) -> Line<'static> {
    let marker = if field.required { " *" } else { "" };
    let value = match (&field.kind, &field.value) {
        (FieldKind::Info, v) => return Line::from(format!("{} {}", field.label, v).trim().to_string()),
        (FieldKind::Password, FieldValue::Text(s)) => "*".repeat(s.chars().count()),
        (FieldKind::Checkbox, FieldValue::Bool(true)) => "[x]".to_string(),
        (FieldKind::Checkbox, _) => "[ ]".to_string(),
        (FieldKind::Select, v) => format!("{} ({})", v, field.options.join(" / ")),
        (_, v) => v.to_string(),
    };
    Line::from(vec![
        Span::styled(
            format!("{}{}: ", field.label, marker),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(value),
    ])
}

fn centered_window(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    Rect {
        x,
        y,
        width: w,
        height: h,
    }
}

fn draw_buttons(f: &mut ratatui::Frame<'_>, area: Rect, page: &StepPage) {
    let nav = page.navigation;
    let line = Line::from(vec![
        button_text("Back", nav.show_back),
        Span::raw(" "),
        button_text("Next", nav.show_next),
        Span::raw(" "),
        button_text("Complete", nav.show_complete),
    ]);

    let p = Paragraph::new(Text::from(line)).alignment(Alignment::Right);
    f.render_widget(p, area);
}

fn button_text(label: &str, enabled: bool) -> Span<'static> {
    let style = if enabled {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Span::styled(format!("[ {} ]", label), style)
}
