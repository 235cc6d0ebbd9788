use chatline_core::{ColorTable, Message, Rgb, Role};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::animation::SPINNER;
use crate::app::{App, Button, ChatView, HitAreas, Screen};

const TRACK_WIDTH: usize = 6;
const SEND_BUTTON_WIDTH: u16 = 10;
/// Bubbles use at most this share of the chat width
const BUBBLE_PERCENT: usize = 85;

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Greedy word wrap by character count. Words longer than a row are split.
fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut rows = Vec::new();
    let mut row = String::new();
    let mut row_len = 0;

    for word in text.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for piece in chars.chunks(width) {
            if row_len > 0 && row_len + 1 + piece.len() > width {
                rows.push(std::mem::take(&mut row));
                row_len = 0;
            }
            if row_len > 0 {
                row.push(' ');
                row_len += 1;
            }
            row.extend(piece);
            row_len += piece.len();
        }
    }

    if rows.is_empty() || !row.is_empty() {
        rows.push(row);
    }
    rows
}

/// Style `**bold**` runs of one line on top of `base`. An unpaired marker
/// stays literal.
fn parse_markdown_line(text: &str, base: Style) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut rest = text;

    while let Some(open) = rest.find("**") {
        let after = &rest[open + 2..];
        let Some(close) = after.find("**") else {
            break;
        };
        if close == 0 {
            plain.push_str(&rest[..open + 4]);
            rest = &after[2..];
            continue;
        }

        plain.push_str(&rest[..open]);
        if !plain.is_empty() {
            spans.push(Span::styled(std::mem::take(&mut plain), base));
        }
        spans.push(Span::styled(
            after[..close].to_string(),
            base.add_modifier(Modifier::BOLD),
        ));
        rest = &after[close + 2..];
    }

    plain.push_str(rest);
    if !plain.is_empty() {
        spans.push(Span::styled(plain, base));
    }
    spans
}

fn span_width(spans: &[Span<'_>]) -> usize {
    spans.iter().map(|s| s.content.chars().count()).sum()
}

/// One message as a padded, wrapped bubble.
fn bubble_lines(message: &Message, width: usize, colors: &ColorTable) -> Vec<Line<'static>> {
    let bubble_width = (width * BUBBLE_PERCENT / 100).max(4);
    let inner_width = bubble_width.saturating_sub(2);

    let (style, alignment) = match message.role() {
        Role::User => (
            Style::default()
                .bg(color(colors.chat_user_bubble))
                .fg(color(colors.chat_user_text)),
            Alignment::Right,
        ),
        Role::Assistant => (
            Style::default()
                .bg(color(colors.chat_assistant_bubble))
                .fg(color(colors.chat_assistant_text)),
            Alignment::Left,
        ),
    };

    let rows: Vec<Vec<Span<'static>>> = message
        .text()
        .lines()
        .flat_map(|line| wrap_text_to_width(line, inner_width))
        .map(|line| match message.role() {
            Role::User => vec![Span::styled(line, style)],
            Role::Assistant => parse_markdown_line(&line, style),
        })
        .collect();
    let content_width = rows.iter().map(|r| span_width(r)).max().unwrap_or(0);

    rows.into_iter()
        .map(|mut spans| {
            let fill = content_width - span_width(&spans);
            spans.insert(0, Span::styled(" ", style));
            spans.push(Span::styled(" ".repeat(fill + 1), style));
            Line::from(spans).alignment(alignment)
        })
        .collect()
}

/// All chat lines, pre-wrapped to `width`.
fn chat_lines(
    messages: &[Message],
    pending: bool,
    dots: usize,
    width: usize,
    colors: &ColorTable,
) -> Vec<Line<'static>> {
    if messages.is_empty() && !pending {
        return vec![
            Line::default(),
            Line::from(Span::styled(
                "Send a message to start.",
                Style::default().fg(color(colors.muted_text)),
            ))
            .alignment(Alignment::Center),
        ];
    }

    let mut lines = Vec::new();
    for message in messages {
        lines.extend(bubble_lines(message, width, colors));
        lines.push(Line::default());
    }

    if pending {
        lines.push(Line::from(Span::styled(
            format!(" Thinking{:<3} ", ".".repeat(dots)),
            Style::default()
                .bg(color(colors.chat_assistant_bubble))
                .fg(color(colors.muted_text))
                .add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn theme_switch(progress: f32, colors: &ColorTable) -> Vec<Span<'static>> {
    let knob = ((progress.clamp(0.0, 1.0) * (TRACK_WIDTH - 1) as f32).round()) as usize;
    let track = Style::default().bg(color(colors.toggle_track));

    vec![
        Span::styled(" ".repeat(knob), track),
        Span::styled("●", track.fg(color(colors.toggle_glow))),
        Span::styled(" ".repeat(TRACK_WIDTH - 1 - knob), track),
        Span::raw(" "),
    ]
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let colors = app.theme.colors();
    let area = frame.area();

    frame.render_widget(
        Block::default().style(Style::default().bg(color(colors.screen_bg))),
        area,
    );

    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    app.buttons = HitAreas::default();
    app.buttons.switch = Some(render_header(app, frame, header_area, colors));

    match app.screen {
        Screen::Landing => app.buttons.start = Some(render_landing(app, frame, body_area, colors)),
        Screen::Chat => render_chat(app, frame, body_area, colors),
    }

    render_footer(app, frame, footer_area, colors);
}

/// Returns the switch area.
fn render_header(app: &App, frame: &mut Frame, area: Rect, colors: &ColorTable) -> Rect {
    let switch_width = TRACK_WIDTH as u16 + 1;
    let [title_area, switch_area] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(switch_width)]).areas(area);

    let screen_title = match app.screen {
        Screen::Landing => "",
        Screen::Chat => "Chat",
    };
    let title = Line::from(vec![
        Span::styled(" chatline ", Style::default().fg(color(colors.accent)).bold()),
        Span::styled(screen_title, Style::default().fg(color(colors.text))),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(color(colors.muted_text)),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(color(colors.surface_bg)));
    frame.render_widget(header, title_area);

    let switch = Paragraph::new(Line::from(theme_switch(app.animator.knob_progress(), colors)))
        .style(Style::default().bg(color(colors.surface_bg)));
    frame.render_widget(switch, switch_area);
    switch_area
}

/// Returns the area of the start button row.
fn render_landing(app: &App, frame: &mut Frame, area: Rect, colors: &ColorTable) -> Rect {
    let [_, center, _] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(5),
        Constraint::Min(0),
    ])
    .areas(area);

    let pressed = app.pressed == Some(Button::Start);
    let (button_bg, arrow_bg) = if pressed {
        (colors.accent_active, colors.arrow_bubble_border)
    } else {
        (colors.accent, colors.arrow_bubble_bg)
    };

    let spinner = SPINNER[app.animator.spinner_frame()];
    let button = Line::from(vec![
        Span::styled(
            format!(" {} Get Started ", spinner),
            Style::default()
                .bg(color(button_bg))
                .fg(color(colors.accent_text))
                .bold(),
        ),
        Span::raw(" "),
        Span::styled(
            " → ",
            Style::default().bg(color(arrow_bg)).fg(color(colors.icon)),
        ),
    ]);
    let button_width = (button.width() as u16).min(center.width);
    let button_area = Rect::new(
        center.x + (center.width - button_width) / 2,
        center.y + 2,
        button_width,
        1,
    )
    .intersection(center);

    let lines = vec![
        Line::from(Span::styled(
            "chatline",
            Style::default().fg(color(colors.text)).bold(),
        )),
        Line::default(),
        button,
        Line::default(),
        Line::from(Span::styled(
            "Press Enter or click to start chatting",
            Style::default().fg(color(colors.muted_text)),
        )),
    ];

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), center);
    button_area
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect, colors: &ColorTable) {
    let [messages_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(4)]).areas(area);
    let messages_area = messages_area.inner(ratatui::layout::Margin::new(1, 1));

    // Store area for mouse hit-testing
    app.chat_area = Some(messages_area);

    let dots = app.animator.thinking_dots();
    let Some(chat) = app.chat.as_mut() else {
        return;
    };

    let snapshot = chat.session.snapshot();
    let lines = chat_lines(
        snapshot.messages,
        snapshot.pending,
        dots,
        messages_area.width as usize,
        colors,
    );

    chat.chat_height = messages_area.height;
    chat.total_lines = lines.len().min(u16::MAX as usize) as u16;
    let max_scroll = chat.total_lines.saturating_sub(chat.chat_height);
    if chat.follow {
        chat.scroll = max_scroll;
    } else {
        chat.scroll = chat.scroll.min(max_scroll);
    }

    frame.render_widget(Paragraph::new(lines).scroll((chat.scroll, 0)), messages_area);

    let send_pressed = app.pressed == Some(Button::Send);
    let send_area = render_input(chat, send_pressed, frame, input_area, colors);
    app.buttons.send = Some(send_area);
}

/// Returns the send button area.
fn render_input(
    chat: &ChatView,
    send_pressed: bool,
    frame: &mut Frame,
    area: Rect,
    colors: &ColorTable,
) -> Rect {
    let row = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(color(colors.divider)))
        .style(Style::default().bg(color(colors.input_bg)));
    let inner = row.inner(area);
    frame.render_widget(row, area);

    let [field_area, button_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(SEND_BUTTON_WIDTH),
    ])
    .areas(inner);

    let field_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color(colors.input_border)));

    // Inner width = total width - 2 (for borders)
    let inner_width = field_area.width.saturating_sub(2) as usize;
    let cursor_pos = chat.cursor;
    let scroll_offset = if inner_width == 0 || cursor_pos < inner_width {
        0
    } else {
        cursor_pos - inner_width + 1
    };

    let field = if chat.input.is_empty() {
        Paragraph::new(Span::styled(
            "Type your message",
            Style::default().fg(color(colors.input_placeholder)),
        ))
    } else {
        let visible_text: String = chat
            .input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible_text).style(Style::default().fg(color(colors.input_text)))
    };
    frame.render_widget(field.block(field_block), field_area);

    let label = if chat.session.is_pending() { "..." } else { "Send" };
    let button_bg = if send_pressed && chat.editable() {
        colors.accent_active
    } else {
        colors.chat_user_bubble
    };
    let button = Paragraph::new(vec![Line::default(), Line::from(label)])
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .bg(color(button_bg))
                .fg(color(colors.chat_user_text))
                .bold(),
        );
    frame.render_widget(button, button_area);

    if chat.editable() && inner_width > 0 {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((field_area.x + cursor_x + 1, field_area.y + 1));
    }
    button_area
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect, colors: &ColorTable) {
    let mode_style = Style::default()
        .bg(color(colors.accent))
        .fg(color(colors.accent_text));
    let key_style = Style::default()
        .bg(color(colors.surface_border))
        .fg(color(colors.text));
    let label_style = Style::default()
        .bg(color(colors.surface_bg))
        .fg(color(colors.text));

    let (mode_text, keys): (&str, &[(&str, &str)]) = match app.screen {
        Screen::Landing => (
            " HOME ",
            &[(" Enter ", " chat "), (" t ", " theme "), (" q ", " quit ")],
        ),
        Screen::Chat => (
            " CHAT ",
            &[
                (" Enter ", " send "),
                (" PgUp/PgDn ", " scroll "),
                (" ^T ", " theme "),
                (" Esc ", " back "),
            ],
        ),
    };

    let mut spans = vec![
        Span::styled(mode_text, mode_style),
        Span::styled(" ", label_style),
    ];
    for (key, label) in keys {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(*label, label_style));
    }

    let footer = Paragraph::new(Line::from(spans))
        .style(Style::default().bg(color(colors.surface_bg)));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chatline_core::theme::LIGHT;
    use chatline_core::{Mode, ThemeContext, Transport, TransportError};
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    struct Unused;

    #[async_trait]
    impl Transport for Unused {
        async fn send(&self, _latest: &str, _history: &[Message]) -> Result<String, TransportError> {
            Err(TransportError::Network("not used".to_string()))
        }
    }

    fn draw(app: &mut App) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(60, 16)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();

        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect())
            .collect()
    }

    fn new_app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(ThemeContext::new(Mode::Light), Arc::new(Unused), tx)
    }

    #[test]
    fn test_wrap_respects_width() {
        let lines = wrap_text_to_width("the quick brown fox jumps", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
        assert_eq!(wrap_text_to_width("", 10), vec![String::new()]);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let lines = wrap_text_to_width("see https://example.com/x", 10);
        assert_eq!(lines, vec!["see", "https://ex", "ample.com/", "x"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
    }

    #[test]
    fn test_markdown_bold() {
        let spans = parse_markdown_line("a **b** c", Style::default());
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[1].content, "b");
        assert!(spans[1].style.add_modifier.contains(Modifier::BOLD));

        let spans = parse_markdown_line("a **b", Style::default());
        assert_eq!(span_width(&spans), "a **b".len());

        let spans = parse_markdown_line("**** x", Style::default());
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, "**** x");
    }

    #[test]
    fn test_bubbles_are_rectangular() {
        let message = Message::assistant("short\nand a **much** longer line");
        let lines = bubble_lines(&message, 40, &LIGHT);
        let widths: Vec<usize> = lines.iter().map(|l| span_width(&l.spans)).collect();

        assert_eq!(widths.len(), 2);
        assert_eq!(widths[0], widths[1]);
        assert_eq!(lines[0].alignment, Some(Alignment::Left));
    }

    #[test]
    fn test_user_bubble_right_aligned() {
        let lines = bubble_lines(&Message::user("hi"), 40, &LIGHT);
        assert_eq!(lines[0].alignment, Some(Alignment::Right));
    }

    #[test]
    fn test_switch_knob_positions() {
        let left = theme_switch(0.0, &LIGHT);
        let right = theme_switch(1.0, &LIGHT);
        assert_eq!(left[0].content, "");
        assert_eq!(right[0].content, " ".repeat(TRACK_WIDTH - 1));
    }

    #[test]
    fn test_landing_renders() {
        let mut app = new_app();
        let rows = draw(&mut app);
        assert!(rows.iter().any(|r| r.contains("Get Started")));
        assert!(rows.last().unwrap().contains("HOME"));
    }

    #[test]
    fn test_buttons_are_recorded_where_drawn() {
        let mut app = new_app();
        let rows = draw(&mut app);

        let start = app.buttons.start.unwrap();
        let row: String = rows[start.y as usize]
            .chars()
            .skip(start.x as usize)
            .take(start.width as usize)
            .collect();
        assert!(row.contains("Get Started"));
        assert!(row.contains('→'));
        assert!(app.buttons.switch.is_some());
        assert!(app.buttons.send.is_none());

        app.open_chat();
        draw(&mut app);
        assert!(app.buttons.start.is_none());
        let send = app.buttons.send.unwrap();
        assert_eq!(send.width, SEND_BUTTON_WIDTH);
    }

    #[test]
    fn test_empty_chat_renders_hint() {
        let mut app = new_app();
        app.open_chat();
        let rows = draw(&mut app);

        assert!(rows.iter().any(|r| r.contains("Send a message to start.")));
        assert!(rows.iter().any(|r| r.contains("Type your message")));
        assert!(app.chat_area.is_some());
    }

    #[test]
    fn test_conversation_renders() {
        let mut app = new_app();
        app.open_chat();
        {
            let chat = app.chat.as_mut().unwrap();
            let outbound = chat.session.submit("Hello").unwrap();
            chat.session.complete(chatline_core::Completion {
                session: outbound.session,
                outcome: Ok("Hi there".to_string()),
            });
        }

        let rows = draw(&mut app);
        assert!(rows.iter().any(|r| r.contains("Hello")));
        assert!(rows.iter().any(|r| r.contains("Hi there")));
        assert!(!rows.iter().any(|r| r.contains("Send a message to start.")));
    }

    #[test]
    fn test_pending_shows_thinking_and_locked_button() {
        let mut app = new_app();
        app.open_chat();
        app.chat.as_mut().unwrap().session.submit("Hello").unwrap();

        let rows = draw(&mut app);
        assert!(rows.iter().any(|r| r.contains("Thinking")));
        assert!(rows.iter().any(|r| r.contains("...")));
    }
}
