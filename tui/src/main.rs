//! chatbox Entry Point
//!
//! Launches the terminal chat client, or sends a single message when
//! `--once` is given.
//!
//! # Usage
//!
//! ```bash
//! # Interactive, defaults from ~/.config/chatbox/config.toml
//! chatbox
//!
//! # Point at another server and keep the full history per request
//! chatbox --base-url http://127.0.0.1:8080 --variant role-tagged
//!
//! # One-shot: send, wait, print the transcript
//! chatbox --once "Hello" --attach notes.txt
//!
//! # Debug logging to a file (the terminal is busy with the UI)
//! chatbox --log-file /tmp/chatbox.log --log-level debug
//! ```

use std::fs::OpenOptions;
use std::io::{self, IsTerminal};
use std::panic;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chatbox_conductor::{
    default_config_path, load_config_file, load_config_from_path, ChatboxConfig, ConfigOverrides,
    HttpChatBackend, ReplyOutcome, VariantKind,
};
use chatbox_tui::{App, ConductorClient};

/// chatbox - terminal chat client for a `/api/chat` backend
#[derive(Parser, Debug)]
#[command(name = "chatbox")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Chat server origin (e.g. http://localhost:3000)
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Chat endpoint path
    #[arg(long, value_name = "PATH")]
    endpoint_path: Option<String>,

    /// Transcript shape: paired or role-tagged
    #[arg(long, value_name = "VARIANT")]
    variant: Option<VariantKind>,

    /// Pin the session id instead of generating one
    #[arg(long, value_name = "ID")]
    session_id: Option<String>,

    /// Configuration file path
    #[arg(short = 'c', long, env = "CHATBOX_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Request timeout in milliseconds (0 = none)
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Write logs to this file in interactive mode
    #[arg(long, env = "CHATBOX_LOG_FILE", value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "CHATBOX_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Send one message, print the transcript and exit
    #[arg(long, value_name = "MESSAGE")]
    once: Option<String>,

    /// Files to stage for the one-shot send
    #[arg(long, value_name = "PATH", num_args = 1.., requires = "once")]
    attach: Vec<PathBuf>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            base_url: self.base_url.clone(),
            endpoint_path: self.endpoint_path.clone(),
            timeout_ms: self.timeout_ms,
            variant: self.variant,
            session_id: self.session_id.clone(),
        }
    }
}

/// Initialize logging
///
/// One-shot mode logs to stderr. Interactive mode logs to `--log-file` if
/// given and discards logs otherwise, so nothing is drawn over the UI.
fn init_logging(args: &Args) -> Result<()> {
    let level = &args.log_level;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "chatbox={level},chatbox_tui={level},chatbox_conductor={level}"
        ))
    });

    if args.once.is_some() {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(false),
            )
            .with(filter)
            .init();
    } else if let Some(ref path) = args.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false),
            )
            .with(filter)
            .init();
    }

    Ok(())
}

/// Resolve configuration: CLI > environment > file > defaults
fn resolve_config(args: &Args) -> Result<ChatboxConfig> {
    // An explicit --config must exist; the default path may be missing
    let loaded = match args.config.clone() {
        Some(path) => load_config_file(path),
        None => load_config_from_path(default_config_path()),
    };
    let mut config = loaded.context("Failed to load configuration")?;

    args.overrides().apply(&mut config);
    config.validate().context("Invalid command-line option")?;

    tracing::info!(
        base_url = %config.backend.base_url,
        endpoint = %config.backend.endpoint_path,
        variant = %config.variant,
        source = %config.source(),
        "Configuration resolved"
    );
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let config = resolve_config(&args)?;
    let backend =
        HttpChatBackend::from_settings(&config.backend).context("Failed to create chat client")?;
    let client = ConductorClient::new(backend, config.variant, config.conductor_config());

    if let Some(message) = args.once.clone() {
        return run_once(client, message, &args.attach, &config.bot_label).await;
    }

    // Check if we have a TTY before attempting initialization
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: chatbox requires a terminal (TTY)");
        eprintln!();
        eprintln!("For scripts and pipes, use one-shot mode:");
        eprintln!("  chatbox --once \"Hello\"");
        std::process::exit(1);
    }

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;

    let mut app = App::new(client, config.bot_label.clone());
    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Send one message, wait for the outcome and print the transcript
async fn run_once(
    mut client: ConductorClient,
    message: String,
    attach: &[PathBuf],
    bot_label: &str,
) -> Result<()> {
    client.set_input(message);
    if !attach.is_empty() {
        client
            .select_files(attach)
            .await
            .context("Failed to stage attachments")?;
    }

    if client.send().is_none() {
        bail!("Nothing to send: the message is empty");
    }

    let outcome = client.next_reply().await;

    for line in client.messages(bot_label) {
        println!("{}", line.text());
    }

    match outcome {
        Some(ReplyOutcome::Failed { error, .. }) => {
            Err(error).context("Chat request failed")
        }
        Some(ReplyOutcome::Answered { .. }) | None => Ok(()),
    }
}
