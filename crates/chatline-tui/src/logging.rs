use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn open_log(dir: &Path) -> Result<(PathBuf, File)> {
    fs::create_dir_all(dir)?;
    let path = dir.join("chatline.log");
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((path, file))
}

/// Log to a file; the terminal belongs to the UI while it runs. When the file
/// cannot be opened the app runs without logging.
pub fn init_file() -> Option<PathBuf> {
    let opened = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("could not determine data directory"))
        .and_then(|dir| open_log(&dir.join("chatline")));

    let (path, file) = match opened {
        Ok(opened) => opened,
        Err(e) => {
            eprintln!("warning: logging disabled: {:#}", e);
            return None;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter("chatline=info,chatline_core=info"))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .ok()?;

    Some(path)
}

/// Log to stderr for the one-shot commands, quiet unless something fails.
pub fn init_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter("warn"))
        .with_writer(std::io::stderr)
        .try_init();
}
