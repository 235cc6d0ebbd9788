//! Theme context: the active mode, its color table, and change notification.
//!
//! There is no global theme. A [`ThemeContext`] is built once at startup and
//! handed to every consumer's constructor; consumers that need to react to a
//! change hold a [`watch::Receiver`] from [`ThemeContext::subscribe`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::UnknownMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Light,
    Somber,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Light => Mode::Somber,
            Mode::Somber => Mode::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Light => "light",
            Mode::Somber => "somber",
        }
    }

    pub fn colors(self) -> &'static ColorTable {
        match self {
            Mode::Light => &LIGHT,
            Mode::Somber => &SOMBER,
        }
    }
}

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Mode::Light),
            "somber" | "dark" => Ok(Mode::Somber),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn hex(value: u32) -> Self {
        Self((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    pub screen_bg: Rgb,
    pub surface_bg: Rgb,
    pub surface_border: Rgb,
    pub text: Rgb,
    pub muted_text: Rgb,
    pub accent: Rgb,
    pub accent_active: Rgb,
    pub accent_text: Rgb,
    pub icon: Rgb,
    pub chat_user_bubble: Rgb,
    pub chat_user_text: Rgb,
    pub chat_assistant_bubble: Rgb,
    pub chat_assistant_text: Rgb,
    pub input_bg: Rgb,
    pub input_border: Rgb,
    pub input_text: Rgb,
    pub input_placeholder: Rgb,
    pub divider: Rgb,
    pub arrow_bubble_bg: Rgb,
    pub arrow_bubble_border: Rgb,
    /// Track of the theme switch
    pub toggle_track: Rgb,
    /// Glow in the middle of the switch knob
    pub toggle_glow: Rgb,
}

pub static LIGHT: ColorTable = ColorTable {
    screen_bg: Rgb::hex(0xf4f5f7),
    surface_bg: Rgb::hex(0xe4e4e7),
    surface_border: Rgb::hex(0xa1a1aa),
    text: Rgb::hex(0x0f172a),
    muted_text: Rgb::hex(0x64748b),
    accent: Rgb::hex(0x6336f7),
    accent_active: Rgb::hex(0x7348ff),
    accent_text: Rgb::hex(0xffffff),
    icon: Rgb::hex(0x111827),
    chat_user_bubble: Rgb::hex(0x0f172a),
    chat_user_text: Rgb::hex(0xffffff),
    chat_assistant_bubble: Rgb::hex(0xe2e8f0),
    chat_assistant_text: Rgb::hex(0x0f172a),
    input_bg: Rgb::hex(0xffffff),
    input_border: Rgb::hex(0xcbd5e1),
    input_text: Rgb::hex(0x0f172a),
    input_placeholder: Rgb::hex(0x94a3b8),
    divider: Rgb::hex(0xdbe2ea),
    arrow_bubble_bg: Rgb::hex(0xf4f4f5),
    arrow_bubble_border: Rgb::hex(0xa1a1aa),
    toggle_track: Rgb::hex(0x28096b),
    toggle_glow: Rgb::hex(0xfff000),
};

pub static SOMBER: ColorTable = ColorTable {
    screen_bg: Rgb::hex(0x0b0f14),
    surface_bg: Rgb::hex(0x171b25),
    surface_border: Rgb::hex(0x2a3340),
    text: Rgb::hex(0xe5e7eb),
    muted_text: Rgb::hex(0x9aa4b2),
    accent: Rgb::hex(0x3f2a86),
    accent_active: Rgb::hex(0x4d33a3),
    accent_text: Rgb::hex(0xf3f4f6),
    icon: Rgb::hex(0xe5e7eb),
    chat_user_bubble: Rgb::hex(0x1f2937),
    chat_user_text: Rgb::hex(0xf9fafb),
    chat_assistant_bubble: Rgb::hex(0x101720),
    chat_assistant_text: Rgb::hex(0xe5e7eb),
    input_bg: Rgb::hex(0x121826),
    input_border: Rgb::hex(0x2a3340),
    input_text: Rgb::hex(0xe5e7eb),
    input_placeholder: Rgb::hex(0x7b8696),
    divider: Rgb::hex(0x1f2833),
    arrow_bubble_bg: Rgb::hex(0x0f141d),
    arrow_bubble_border: Rgb::hex(0x2a3340),
    toggle_track: Rgb::hex(0x522ba7),
    toggle_glow: Rgb::hex(0xfff000),
};

/// Shared handle to the active theme. Clones observe the same mode.
#[derive(Debug, Clone)]
pub struct ThemeContext {
    mode: Arc<watch::Sender<Mode>>,
}

impl ThemeContext {
    pub fn new(initial: Mode) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { mode: Arc::new(tx) }
    }

    pub fn mode(&self) -> Mode {
        *self.mode.borrow()
    }

    pub fn colors(&self) -> &'static ColorTable {
        self.mode().colors()
    }

    /// Flip the mode and notify subscribers. Returns the new mode.
    pub fn toggle(&self) -> Mode {
        let mut next = Mode::default();
        self.mode.send_modify(|mode| {
            *mode = mode.toggled();
            next = *mode;
        });
        tracing::debug!(mode = %next, "theme toggled");
        next
    }

    pub fn subscribe(&self) -> watch::Receiver<Mode> {
        self.mode.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_flips_and_double_toggle_restores() {
        let theme = ThemeContext::new(Mode::Light);

        assert_eq!(theme.toggle(), Mode::Somber);
        assert_eq!(theme.mode(), Mode::Somber);
        assert_eq!(theme.toggle(), Mode::Light);
        assert_eq!(theme.mode(), Mode::Light);
    }

    #[test]
    fn test_colors_follow_mode() {
        let theme = ThemeContext::new(Mode::Light);
        assert_eq!(theme.colors(), &LIGHT);
        theme.toggle();
        assert_eq!(theme.colors(), &SOMBER);
        assert_eq!(theme.colors().screen_bg, Rgb(0x0b, 0x0f, 0x14));
    }

    #[test]
    fn test_clones_share_mode() {
        let theme = ThemeContext::new(Mode::Somber);
        let handle = theme.clone();
        handle.toggle();
        assert_eq!(theme.mode(), Mode::Light);
    }

    #[test]
    fn test_toggles_from_many_handles_are_not_lost() {
        let theme = ThemeContext::new(Mode::Light);
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let handle = theme.clone();
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        handle.toggle();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        // 1000 flips land back where they started
        assert_eq!(theme.mode(), Mode::Light);
    }

    #[tokio::test]
    async fn test_subscribers_are_notified() {
        let theme = ThemeContext::new(Mode::Light);
        let mut rx = theme.subscribe();
        assert!(!rx.has_changed().unwrap());

        theme.toggle();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Mode::Somber);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Somber".parse::<Mode>(), Ok(Mode::Somber));
        assert_eq!("dark".parse::<Mode>(), Ok(Mode::Somber));
        assert_eq!(" light ".parse::<Mode>(), Ok(Mode::Light));
        assert_eq!("neon".parse::<Mode>(), Err(UnknownMode("neon".to_string())));
        assert_eq!(serde_json::to_string(&Mode::Somber).unwrap(), "\"somber\"");
    }

    #[test]
    fn test_hex_unpacks_channels() {
        assert_eq!(Rgb::hex(0x6336f7), Rgb(0x63, 0x36, 0xf7));
    }
}
