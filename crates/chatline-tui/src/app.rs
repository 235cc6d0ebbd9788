use std::path::PathBuf;
use std::sync::Arc;

use chatline_core::{
    Completion, Config, Mode, Outbound, Session, ThemeContext, Transport, TransportError,
};
use ratatui::layout::Rect;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::animation::{AnimationDriver, TickAnimator};
use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Landing,
    Chat,
}

/// Things on screen that react to a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Start,
    Send,
    ThemeSwitch,
}

/// Where each button was last drawn. Reset every frame, so only buttons on
/// the current screen can be hit.
#[derive(Debug, Default, Clone, Copy)]
pub struct HitAreas {
    pub start: Option<Rect>,
    pub send: Option<Rect>,
    pub switch: Option<Rect>,
}

impl HitAreas {
    pub fn button_at(&self, x: u16, y: u16) -> Option<Button> {
        [
            (Button::Start, self.start),
            (Button::Send, self.send),
            (Button::ThemeSwitch, self.switch),
        ]
        .into_iter()
        .find_map(|(button, rect)| {
            rect.filter(|r| r.contains((x, y).into())).map(|_| button)
        })
    }
}

/// Run one send on its own task. A panic inside the transport still yields a
/// completion, so the session never stays pending.
async fn dispatch_supervised(outbound: Outbound, transport: Arc<dyn Transport>) -> Completion {
    let session = outbound.session;
    let call = tokio::spawn(async move { outbound.dispatch(transport.as_ref()).await });

    match call.await {
        Ok(completion) => completion,
        Err(e) => {
            warn!(error = %e, "chat request task died");
            Completion {
                session,
                outcome: Err(TransportError::Aborted(e.to_string())),
            }
        }
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// State of one chat screen visit. Dropping it discards the session.
pub struct ChatView {
    pub session: Session,
    pub input: String,
    pub cursor: usize,
    pub scroll: u16,
    /// Keep the newest message in view
    pub follow: bool,
    // Updated during render
    pub chat_height: u16,
    pub total_lines: u16,
}

impl ChatView {
    pub fn new() -> Self {
        Self {
            session: Session::new(),
            input: String::new(),
            cursor: 0,
            scroll: 0,
            follow: true,
            chat_height: 0,
            total_lines: 0,
        }
    }

    /// Input is locked while a request is in flight.
    pub fn editable(&self) -> bool {
        !self.session.is_pending()
    }

    pub fn insert_char(&mut self, c: char) {
        if !self.editable() {
            return;
        }
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if !self.editable() || self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.remove(byte_pos);
    }

    pub fn delete(&mut self) {
        if !self.editable() {
            return;
        }
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.input.chars().count();
        self.cursor = (self.cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
        self.follow = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max_scroll = self.total_lines.saturating_sub(self.chat_height);
        self.scroll = self.scroll.saturating_add(lines).min(max_scroll);
        self.follow = self.scroll >= max_scroll;
    }
}

impl Default for ChatView {
    fn default() -> Self {
        Self::new()
    }
}

pub struct App {
    pub should_quit: bool,
    pub screen: Screen,
    pub chat: Option<ChatView>,
    pub theme: ThemeContext,
    pub animator: Box<dyn AnimationDriver + Send>,

    // Areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub buttons: HitAreas,
    /// Button under a mouse press that has not been released yet
    pub pressed: Option<Button>,

    theme_updates: watch::Receiver<Mode>,
    transport: Arc<dyn Transport>,
    events: mpsc::UnboundedSender<AppEvent>,
    config_path: Option<PathBuf>,
}

impl App {
    /// The theme must exist before anything that draws with it.
    pub fn new(
        theme: ThemeContext,
        transport: Arc<dyn Transport>,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let theme_updates = theme.subscribe();
        let animator = Box::new(TickAnimator::new(theme.mode()));

        Self {
            should_quit: false,
            screen: Screen::Landing,
            chat: None,
            theme,
            animator,
            chat_area: None,
            buttons: HitAreas::default(),
            pressed: None,
            theme_updates,
            transport,
            events,
            config_path: None,
        }
    }

    /// Persist theme changes to this config file.
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn open_chat(&mut self) {
        self.chat = Some(ChatView::new());
        self.screen = Screen::Chat;
    }

    /// Leave the chat screen. Any reply still in flight will find no session
    /// to land in.
    pub fn close_chat(&mut self) {
        if let Some(chat) = self.chat.take() {
            if chat.session.is_pending() {
                debug!("closing chat with a request in flight");
            }
        }
        self.chat_area = None;
        self.screen = Screen::Landing;
    }

    pub fn submit(&mut self) {
        let Some(chat) = self.chat.as_mut() else {
            return;
        };

        let Ok(outbound) = chat.session.submit(&chat.input) else {
            return;
        };

        chat.input.clear();
        chat.cursor = 0;
        chat.follow = true;

        let transport = Arc::clone(&self.transport);
        let events = self.events.clone();
        tokio::spawn(async move {
            let completion = dispatch_supervised(outbound, transport).await;
            // Fails only when the event loop is gone
            let _ = events.send(AppEvent::Reply(completion));
        });
    }

    pub fn on_completion(&mut self, completion: Completion) {
        match self.chat.as_mut() {
            Some(chat) => {
                if chat.session.complete(completion) {
                    chat.follow = true;
                }
            }
            None => debug!("dropping reply for a closed chat"),
        }
    }

    /// A completed click on `button`.
    pub fn activate(&mut self, button: Button) {
        match button {
            Button::Start => self.open_chat(),
            Button::Send => self.submit(),
            Button::ThemeSwitch => self.toggle_theme(),
        }
    }

    pub fn toggle_theme(&mut self) {
        let mode = self.theme.toggle();

        if let Some(path) = &self.config_path {
            if let Err(e) = Config::save_theme_to(path, mode) {
                warn!("could not save theme: {:#}", e);
            }
        }
    }

    pub fn tick(&mut self) {
        if self.theme_updates.has_changed().unwrap_or(false) {
            let mode = *self.theme_updates.borrow_and_update();
            self.animator.set_mode(mode);
        }
        self.animator.tick();
    }
}
