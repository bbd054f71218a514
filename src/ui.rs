use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use crate::app::{App, BackendStatus, InputMode};
use crate::conversation::ChatRole;

const TITLE: &str = "SanchAI Weather";
const USAGE_HINT: &str = "Ask anything, especially about the weather in any city. Weather answers use a real API.";
const EMPTY_HINT: &str = "Start by asking: \"What is the weather of Pune?\"";
const INPUT_PLACEHOLDER: &str = "Type your message…";

const SEND_WIDTH: u16 = 12;

fn role_style(role: ChatRole) -> Style {
    match role {
        ChatRole::User => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ChatRole::Assistant => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, hint, chat log, input row, footer
    let [header_area, hint_area, chat_area, input_row, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let hint = Paragraph::new(Span::styled(USAGE_HINT, Style::default().fg(Color::DarkGray)));
    frame.render_widget(hint, hint_area);

    render_chat(app, frame, chat_area);

    let [input_area, send_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(SEND_WIDTH),
    ])
    .areas(input_row);

    render_input(app, frame, input_area);
    render_send_button(app, frame, send_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let (status_text, status_color) = match app.backend_status {
        BackendStatus::Checking => ("○ checking", Color::DarkGray),
        BackendStatus::Online => ("● online", Color::Green),
        BackendStatus::Offline => ("● offline", Color::Red),
    };

    let title = Line::from(vec![
        Span::styled(format!(" {} ", TITLE), Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!("v{}", env!("CARGO_PKG_VERSION")), Style::default().fg(Color::Gray)),
        Span::raw("  "),
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::styled(format!(" {}", app.endpoint), Style::default().fg(Color::Gray)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store area for mouse hit-testing
    app.chat_area = Some(area);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    let history = app.conversation.history();
    let pending = app.conversation.is_pending();

    let mut lines: Vec<Line> = Vec::new();

    if history.is_empty() {
        lines.push(Line::from(Span::styled(
            EMPTY_HINT,
            Style::default().fg(Color::DarkGray),
        )));
        lines.push(Line::default());
    }

    for msg in history {
        lines.push(Line::from(Span::styled(format!("{}:", msg.role.label()), role_style(msg.role))));
        for line in msg.content.lines() {
            lines.push(Line::from(line.to_string()));
        }
        lines.push(Line::default());
    }

    // Transient placeholder, never part of history
    if pending {
        lines.push(Line::from(Span::styled(
            format!("{}:", ChatRole::Assistant.label()),
            role_style(ChatRole::Assistant),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let wrap = Wrap { trim: false };
    let text = Text::from(lines);

    // Measure with the same word wrapping the log is drawn with
    let inner_width = area.width.saturating_sub(2);
    let total_lines = Paragraph::new(text.clone()).wrap(wrap).line_count(inner_width);
    app.set_chat_layout(
        area.height.saturating_sub(2),
        u16::try_from(total_lines).unwrap_or(u16::MAX),
    );

    let chat = Paragraph::new(text)
        .block(chat_block)
        .wrap(wrap)
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let pending = app.conversation.is_pending();
    let editing = app.input_mode == InputMode::Editing && !pending;

    let border_color = if pending {
        Color::DarkGray
    } else if editing {
        Color::Yellow
    } else {
        Color::Gray
    };

    let title = if pending { " Message (waiting for reply) " } else { " Message " };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let draft = app.conversation.draft();

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if draft.is_empty() && !pending {
        Paragraph::new(Span::styled(INPUT_PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
        // Newlines are kept in the draft but shown as a single glyph
        let visible_text: String = draft
            .chars()
            .map(|c| if c == '\n' { '↵' } else { c })
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        let text_color = if pending { Color::DarkGray } else { Color::Cyan };
        Paragraph::new(visible_text).style(Style::default().fg(text_color))
    };

    frame.render_widget(input.block(input_block), area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_send_button(app: &mut App, frame: &mut Frame, area: Rect) {
    app.send_area = Some(area);

    let pending = app.conversation.is_pending();
    let enabled = app.conversation.can_send();

    let label = if pending { "Sending…" } else { "Send" };
    let style = if enabled {
        Style::default().fg(Color::White).bg(Color::Blue).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let button = Paragraph::new(label)
        .alignment(Alignment::Center)
        .style(style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(if enabled { Color::Blue } else { Color::DarkGray })),
        );

    frame.render_widget(button, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" EDIT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];

    let hints: &[(&str, &str)] = match app.input_mode {
        InputMode::Editing => &[
            (" Enter ", " send "),
            (" Alt/Shift+Enter ", " newline "),
            (" ↑/↓ ", " scroll "),
            (" Esc ", " normal "),
        ],
        InputMode::Normal => &[
            (" i ", " edit "),
            (" j/k ", " scroll "),
            (" g/G ", " top/bottom "),
            (" q ", " quit "),
        ],
    };

    for (key, label) in hints {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(*label, label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
