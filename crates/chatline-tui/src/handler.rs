use crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, ChatView, Screen};
use crate::tui::AppEvent;

const WHEEL_LINES: u16 = 3;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(),
        AppEvent::Reply(completion) => app.on_completion(completion),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work on any screen
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => {
                app.should_quit = true;
                return;
            }
            KeyCode::Char('t') => {
                app.toggle_theme();
                return;
            }
            _ => {}
        }
    }

    match app.screen {
        Screen::Landing => handle_landing(app, key),
        Screen::Chat => handle_chat(app, key),
    }
}

fn handle_landing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Char(' ') => app.open_chat(),
        KeyCode::Char('t') => app.toggle_theme(),
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        _ => {}
    }
}

fn handle_chat(app: &mut App, key: KeyEvent) {
    if matches!(key.code, KeyCode::Esc) {
        app.close_chat();
        return;
    }
    if matches!(key.code, KeyCode::Enter) {
        app.submit();
        return;
    }

    let Some(chat) = app.chat.as_mut() else {
        return;
    };

    match key.code {
        KeyCode::Backspace => chat.backspace(),
        KeyCode::Delete => chat.delete(),
        KeyCode::Left => chat.cursor_left(),
        KeyCode::Right => chat.cursor_right(),
        KeyCode::Home => chat.cursor_home(),
        KeyCode::End => chat.cursor_end(),
        KeyCode::Up => chat.scroll_up(1),
        KeyCode::Down => chat.scroll_down(1),
        KeyCode::PageUp => chat.scroll_up(chat.chat_height.max(1)),
        KeyCode::PageDown => chat.scroll_down(chat.chat_height.max(1)),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => chat.insert_char(c),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let (x, y) = (mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            app.pressed = app.buttons.button_at(x, y);
        }
        // A click counts only when released over the button it started on
        MouseEventKind::Up(MouseButton::Left) => {
            if let Some(button) = app.pressed.take() {
                if app.buttons.button_at(x, y) == Some(button) {
                    app.activate(button);
                }
            }
        }
        MouseEventKind::ScrollDown => scroll_chat(app, x, y, |chat| chat.scroll_down(WHEEL_LINES)),
        MouseEventKind::ScrollUp => scroll_chat(app, x, y, |chat| chat.scroll_up(WHEEL_LINES)),
        _ => {}
    }
}

fn scroll_chat(app: &mut App, x: u16, y: u16, scroll: impl FnOnce(&mut ChatView)) {
    let over_chat = app
        .chat_area
        .is_some_and(|area| area.contains((x, y).into()));
    if let (true, Some(chat)) = (over_chat, app.chat.as_mut()) {
        scroll(chat);
    }
}
