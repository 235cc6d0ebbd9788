use std::sync::Arc;

use anyhow::Result;
use chatline_core::{Config, HttpTransport, ThemeContext, Transport};
use clap::{Parser, Subcommand};
use tracing::info;

mod animation;
mod app;
mod commands;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "chatline", version)]
#[command(about = "Chat with a private LLM endpoint from the terminal")]
struct Cli {
    /// Chat endpoint URL
    #[arg(long, env = "CHATLINE_URL", global = true)]
    url: Option<String>,
    /// Bearer token for the endpoint
    #[arg(long, env = "CHATLINE_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,
    /// Request timeout in seconds
    #[arg(long, env = "CHATLINE_TIMEOUT", global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message and print the reply
    Ask {
        /// Your message
        #[arg(required = true)]
        message: Vec<String>,
    },
    /// Save endpoint settings (or show them when none are given)
    Config {
        /// Theme to start in: light or somber
        #[arg(long)]
        theme: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Ask { message }) => {
            logging::init_stderr();
            let config = Config::load()?.merge(cli.url, cli.token, cli.timeout);

            let answer = commands::ask(&config, &message.join(" ")).await?;
            println!("{}", answer.text);
            if answer.failed {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Commands::Config { theme }) => {
            logging::init_stderr();
            let settings = commands::Settings {
                url: cli.url,
                token: cli.token,
                timeout: cli.timeout,
                theme,
            };
            commands::configure(&Config::get_config_path()?, settings, &mut std::io::stdout())
        }
        None => {
            if let Some(log_path) = logging::init_file() {
                info!(log = %log_path.display(), "starting chatline");
            }
            let config = Config::load()?.merge(cli.url, cli.token, cli.timeout);
            run_tui(config).await
        }
    }
}

async fn run_tui(config: Config) -> Result<()> {
    // Settle configuration before the terminal goes into raw mode
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config.transport_config()?)?);
    let theme = ThemeContext::new(config.theme);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let mut app = App::new(theme, transport, events.sender())
        .with_config_path(Config::get_config_path().ok());

    let result = run(&mut terminal, &mut app, &mut events).await;
    tui::restore()?;
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}
