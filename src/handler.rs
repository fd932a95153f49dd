use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, CallState, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::CallConnected => app.call_connected(),
        AppEvent::AgentReply(reply) => app.agent_reply(reply),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    let chat_open = app.call_state == CallState::Active && app.show_chat;

    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Call lifecycle
        KeyCode::Char('s') => app.start_call(),
        KeyCode::Char('e') => app.end_call(),

        // Chat visibility (only offered during an active call)
        KeyCode::Char('c') => {
            if app.call_state == CallState::Active {
                app.toggle_chat();
            }
        }

        // Focus the message input
        KeyCode::Char('i') | KeyCode::Tab => {
            if chat_open {
                app.input_mode = InputMode::Editing;
                // Cursor at end of existing text
                app.input_cursor = app.input_text.chars().count();
            }
        }

        // Chat history scrolling
        KeyCode::Char('j') | KeyCode::Down => {
            if chat_open {
                app.scroll_chat_down();
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if chat_open {
                app.scroll_chat_up();
            }
        }
        KeyCode::Char('g') => {
            if chat_open {
                app.chat_scroll = 0;
            }
        }
        KeyCode::Char('G') => {
            if chat_open {
                app.scroll_chat_to_bottom();
            }
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        // Enter sends; Shift+Enter inserts a newline into the draft
        KeyCode::Enter => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                let byte_pos = char_to_byte_index(&app.input_text, app.input_cursor);
                app.input_text.insert(byte_pos, '\n');
                app.input_cursor += 1;
            } else {
                app.send_message();
            }
        }
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input_text, app.input_cursor);
                app.input_text.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input_text.chars().count();
            if app.input_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input_text, app.input_cursor);
                app.input_text.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input_text.chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.input_text.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input_text, app.input_cursor);
            app.input_text.insert(byte_pos, c);
            app.input_cursor += 1;
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            app.scroll_chat_down();
            app.scroll_chat_down();
            app.scroll_chat_down();
        }
        MouseEventKind::ScrollUp => {
            app.scroll_chat_up();
            app.scroll_chat_up();
            app.scroll_chat_up();
        }
        _ => {}
    }
}
