use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use crate::app::{App, CallState, InputMode, Sender};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    // The chat panel only exists during an active call
    if app.call_state == CallState::Active && app.show_chat {
        let [call_area, chat_area] = Layout::horizontal([
            Constraint::Percentage(50),
            Constraint::Percentage(50),
        ])
        .areas(body_area);

        render_call(app, frame, call_area);
        render_chat(app, frame, chat_area);
    } else {
        app.chat_area = None;
        render_call(app, frame, body_area);
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Interview Practice ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("[{}]", app.backend.project_id()),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.call_state {
        CallState::Inactive => " IDLE ",
        CallState::Connecting => " CONNECTING ",
        CallState::Active => " LIVE ",
        CallState::Finished => " DONE ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match (app.call_state, app.input_mode) {
        (_, InputMode::Editing) => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Shift+Enter ", key_style),
            Span::styled(" newline ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" done ", label_style),
        ],
        (CallState::Inactive | CallState::Finished, _) => vec![
            Span::styled(" s ", key_style),
            Span::styled(" start call ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
        (CallState::Connecting, _) => vec![
            Span::styled(" e ", key_style),
            Span::styled(" cancel ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
        (CallState::Active, _) => {
            let mut hints = vec![
                Span::styled(" e ", key_style),
                Span::styled(" hang up ", label_style),
                Span::styled(" c ", key_style),
                Span::styled(
                    if app.show_chat { " hide chat " } else { " show chat " },
                    label_style,
                ),
            ];
            if app.show_chat {
                hints.extend(vec![
                    Span::styled(" i ", key_style),
                    Span::styled(" type ", label_style),
                    Span::styled(" j/k ", key_style),
                    Span::styled(" scroll ", label_style),
                ]);
            }
            hints.extend(vec![
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ]);
            hints
        }
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_call(app: &App, frame: &mut Frame, area: Rect) {
    let [cards_area, controls_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    let [interviewer_area, candidate_area] = Layout::horizontal([
        Constraint::Percentage(50),
        Constraint::Percentage(50),
    ])
    .areas(cards_area);

    render_interviewer_card(app, frame, interviewer_area);
    render_candidate_card(app, frame, candidate_area);
    render_controls(app, frame, controls_area);
}

fn render_interviewer_card(app: &App, frame: &mut Frame, area: Rect) {
    let border_color = if app.call_state == CallState::Active {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" AI Interviewer ");

    let avatar_style = if app.is_speaking() {
        Style::default().fg(Color::Green).bold()
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let status = match app.call_state {
        CallState::Inactive => Span::styled(
            "Ready when you are",
            Style::default().fg(Color::DarkGray),
        ),
        CallState::Connecting => {
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            Span::styled(format!("Connecting{}", dots), Style::default().fg(Color::Yellow))
        }
        CallState::Active => {
            if app.is_speaking() {
                let dots = ".".repeat((app.animation_frame as usize) + 1);
                Span::styled(
                    format!("Speaking{}", dots),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                )
            } else {
                Span::styled("Listening", Style::default().fg(Color::Green))
            }
        }
        CallState::Finished => Span::styled(
            "Interview ended",
            Style::default().fg(Color::DarkGray),
        ),
    };

    let card = Paragraph::new(vec![
        Line::default(),
        Line::from(Span::styled("(( AI ))", avatar_style)),
        Line::default(),
        Line::from(status),
    ])
    .alignment(Alignment::Center)
    .block(block);

    frame.render_widget(card, area);
}

fn render_candidate_card(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Candidate ");

    let mut lines = vec![
        Line::default(),
        Line::from(Span::styled(
            app.user_name.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];
    if let Some(id) = &app.user_id {
        lines.push(Line::from(Span::styled(
            format!("ID: {}", id),
            Style::default().fg(Color::DarkGray),
        )));
    }
    if let Some(kind) = &app.interview_kind {
        lines.push(Line::from(Span::styled(
            format!("Mode: {}", kind),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let card = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);

    frame.render_widget(card, area);
}

fn render_controls(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let controls = match app.call_state {
        CallState::Inactive | CallState::Finished => Line::from(Span::styled(
            "[ Call ]",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        CallState::Connecting => Line::from(Span::styled(
            "[ Connecting... ]",
            Style::default().fg(Color::Yellow),
        )),
        CallState::Active => Line::from(vec![
            Span::styled(
                "[ End Call ]",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                if app.show_chat { "[ Hide Chat ]" } else { "[ Show Chat ]" },
                Style::default().fg(Color::Cyan),
            ),
        ]),
    };

    let bar = Paragraph::new(controls)
        .alignment(Alignment::Center)
        .block(block);

    frame.render_widget(bar, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store the panel area for mouse hit-testing
    app.chat_area = Some(area);

    let [messages_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(4),
    ])
    .areas(area);

    // Store message area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = messages_area.height.saturating_sub(2);
    app.chat_width = messages_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Interview Chat ");

    let mut lines: Vec<Line> = Vec::new();
    for msg in &app.chat_messages {
        let (label, label_color) = match msg.sender {
            Sender::User => ("You:", Color::Cyan),
            Sender::Agent => ("AI:", Color::Yellow),
        };
        lines.push(Line::from(vec![
            Span::styled(
                label,
                Style::default().fg(label_color).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(msg.time_label(), Style::default().fg(Color::DarkGray)),
        ]));
        for line in msg.content.lines() {
            lines.push(Line::from(line));
        }
        lines.push(Line::default());
    }

    if app.is_speaking() {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, messages_area);

    render_input(app, frame, input_area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing {
            Color::Yellow
        } else {
            Color::DarkGray
        }))
        .title(" Message ");

    // Scroll the draft so the cursor stays inside the two visible rows
    let inner_width = area.width.saturating_sub(2);
    let (cursor_line, cursor_col) = cursor_line_col(&app.input_text, app.input_cursor);
    let scroll_y = cursor_line.saturating_sub(1);
    let scroll_x = if inner_width > 0 && cursor_col >= inner_width {
        cursor_col - inner_width + 1
    } else {
        0
    };

    if app.input_text.is_empty() {
        let placeholder = Paragraph::new(Span::styled(
            "Type your message...",
            Style::default().fg(Color::DarkGray),
        ))
        .block(input_block);
        frame.render_widget(placeholder, area);
    } else {
        let input = Paragraph::new(app.input_text.as_str())
            .style(Style::default().fg(Color::Cyan))
            .scroll((scroll_y, scroll_x))
            .block(input_block);
        frame.render_widget(input, area);
    }

    // Show cursor when editing
    if editing {
        frame.set_cursor_position((
            (area.x + 1).saturating_add(cursor_col - scroll_x),
            (area.y + 1).saturating_add(cursor_line - scroll_y),
        ));
    }
}

/// Line and column of a char cursor within a multi-line draft
fn cursor_line_col(text: &str, cursor: usize) -> (u16, u16) {
    let mut line = 0u16;
    let mut col = 0u16;
    for c in text.chars().take(cursor) {
        if c == '\n' {
            line = line.saturating_add(1);
            col = 0;
        } else {
            col = col.saturating_add(1);
        }
    }
    (line, col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::fixture;
    use crate::app::{ChatMessage, SEED_MESSAGE};
    use ratatui::{backend::TestBackend, Terminal};

    /// Render one frame and flatten the buffer to a string
    fn draw(app: &mut App) -> String {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).expect("terminal");
        terminal.draw(|frame| render(app, frame)).expect("draw");

        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                if let Some(cell) = buffer.cell((x, y)) {
                    text.push_str(cell.symbol());
                }
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn cursor_position_tracks_newlines() {
        assert_eq!(cursor_line_col("hello", 3), (0, 3));
        assert_eq!(cursor_line_col("ab\ncd", 3), (1, 0));
        assert_eq!(cursor_line_col("ab\ncd", 5), (1, 2));
        assert_eq!(cursor_line_col("", 0), (0, 0));
    }

    #[test]
    fn cursor_position_saturates_on_oversized_drafts() {
        let flat = "x".repeat(70_000);
        assert_eq!(cursor_line_col(&flat, 70_000), (0, u16::MAX));

        let tall = "\n".repeat(70_000);
        assert_eq!(cursor_line_col(&tall, 70_000), (u16::MAX, 0));
    }

    #[test]
    fn idle_screen_offers_only_the_call_control() {
        let (mut app, _rx) = fixture(5, 5);
        let frame = draw(&mut app);

        assert!(frame.contains("[ Call ]"));
        assert!(!frame.contains("End Call"));
        assert!(!frame.contains("Show Chat"));
        assert!(!frame.contains("Interview Chat"));
    }

    #[test]
    fn connecting_swaps_the_call_label() {
        let (mut app, _rx) = fixture(5, 5);
        app.call_state = CallState::Connecting;
        let frame = draw(&mut app);

        assert!(frame.contains("[ Connecting... ]"));
        assert!(!frame.contains("[ Call ]"));
        assert!(!frame.contains("End Call"));
    }

    #[test]
    fn active_call_offers_end_and_chat_controls() {
        let (mut app, _rx) = fixture(5, 5);
        app.call_state = CallState::Active;
        let frame = draw(&mut app);

        assert!(frame.contains("[ End Call ]"));
        assert!(frame.contains("[ Show Chat ]"));
        assert!(!frame.contains("[ Call ]"));
    }

    #[test]
    fn finished_call_offers_the_call_control_again() {
        let (mut app, _rx) = fixture(5, 5);
        app.call_state = CallState::Finished;
        let frame = draw(&mut app);

        assert!(frame.contains("[ Call ]"));
        assert!(frame.contains("Interview ended"));
        assert!(!frame.contains("End Call"));
    }

    #[test]
    fn chat_panel_renders_only_during_an_active_call() {
        let (mut app, _rx) = fixture(5, 5);
        app.show_chat = true;

        app.call_state = CallState::Active;
        app.chat_messages.push(ChatMessage::agent(SEED_MESSAGE));
        let frame = draw(&mut app);
        assert!(frame.contains("Interview Chat"));
        assert!(frame.contains("Type your message..."));
        assert!(frame.contains("Hello! I'm your AI"));

        // show_chat survives the call ending, the panel still goes away
        app.call_state = CallState::Finished;
        let frame = draw(&mut app);
        assert!(!frame.contains("Interview Chat"));
        assert!(app.chat_area.is_none());
    }

    #[test]
    fn speaking_indicator_shows_while_a_reply_is_pending() {
        let (mut app, _rx) = fixture(5, 5);
        app.call_state = CallState::Active;
        app.show_chat = true;
        app.pending_responses = 1;
        let frame = draw(&mut app);

        assert!(frame.contains("Thinking"));
        assert!(frame.contains("Speaking"));
    }

    #[test]
    fn candidate_card_shows_identity_from_config() {
        let (mut app, _rx) = fixture(5, 5);
        let frame = draw(&mut app);

        assert!(frame.contains("Alex"));
        assert!(frame.contains("ID: candidate-42"));
    }
}
