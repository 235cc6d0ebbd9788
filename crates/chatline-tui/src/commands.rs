//! One-shot commands that run without the terminal UI.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chatline_core::{Config, HttpTransport, Mode, Session};

/// What `ask` got back: the reply, or the failure notice when `failed`.
#[derive(Debug)]
pub struct Answer {
    pub text: String,
    pub failed: bool,
}

/// Send one message in a fresh session.
pub async fn ask(config: &Config, text: &str) -> Result<Answer> {
    let transport = HttpTransport::new(config.transport_config()?)?;
    let mut session = Session::new();

    let reply = session.send(text, &transport).await?.text().to_string();
    Ok(Answer {
        text: reply,
        failed: session.last_failed(),
    })
}

/// Values given to `chatline config`.
#[derive(Debug, Default)]
pub struct Settings {
    pub url: Option<String>,
    pub token: Option<String>,
    pub timeout: Option<u64>,
    pub theme: Option<String>,
}

impl Settings {
    fn is_empty(&self) -> bool {
        self.url.is_none() && self.token.is_none() && self.timeout.is_none() && self.theme.is_none()
    }
}

/// Persist `settings` into the file at `path`, or describe the file when no
/// settings were given. Nothing is written if any value is invalid.
pub fn configure(path: &Path, settings: Settings, out: &mut impl Write) -> Result<()> {
    let config = Config::load_from(path)?;

    if settings.is_empty() {
        writeln!(out, "config:   {}", path.display())?;
        writeln!(out, "endpoint: {}", config.endpoint_url.as_deref().unwrap_or("(not set)"))?;
        writeln!(out, "token:    {}", config.masked_token().as_deref().unwrap_or("(not set)"))?;
        writeln!(out, "timeout:  {}s", config.timeout().as_secs())?;
        writeln!(out, "theme:    {}", config.theme)?;
        return Ok(());
    }

    let theme = settings.theme.as_deref().map(str::parse::<Mode>).transpose()?;
    if let Some(url) = &settings.url {
        Config::check_endpoint(url)?;
    }

    let mut config = config.merge(settings.url, settings.token, settings.timeout);
    if let Some(mode) = theme {
        config.theme = mode;
    }

    config
        .save_to(path)
        .with_context(|| format!("Could not write {}", path.display()))?;
    writeln!(out, "Saved {}", path.display())?;
    Ok(())
}
