//! `switchboard` command line interface.
//!
//! Usage:
//! ```bash
//! switchboard                          # interactive chat
//! switchboard --provider gemini        # start on a specific text provider
//! switchboard --prompt "Hello"         # one-shot generation
//! switchboard --list-providers
//! switchboard serve --port 8080        # web surface (feature `http`)
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::{Path, PathBuf};

use switchboard::telemetry::{init_logging, LoggingConfig};
use switchboard::{CapabilityKind, GenerationOptions, Orchestrator, Role, SwitchboardConfig};

/// One conversation across text, image and video generation backends
#[derive(Parser)]
#[command(name = "switchboard")]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML configuration file; environment variables override it
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Text provider to use
    #[arg(long, value_name = "NAME")]
    provider: Option<String>,

    /// Send one prompt, print the response and exit
    #[arg(long, value_name = "TEXT")]
    prompt: Option<String>,

    /// List available text providers and exit
    #[arg(long)]
    list_providers: bool,

    /// Skip the welcome banner
    #[arg(long)]
    no_interactive: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the web interface
    Serve {
        /// Bind address (defaults to the configured host)
        #[arg(long)]
        host: Option<String>,

        /// Port (defaults to the configured port)
        #[arg(long)]
        port: Option<u16>,
    },
}

const HELP_TEXT: &str = "\
Commands:
  /help               Show this help message
  /providers          List available AI providers
  /switch <provider>  Switch to a different AI provider
  /image <prompt>     Generate an image
  /video <prompt>     Generate a video
  /reset              Clear conversation history
  /status             Show current status
  /history            Show the conversation so far
  /exit, /quit        Exit";

fn load_config(path: Option<&Path>) -> Result<SwitchboardConfig> {
    let config = match path {
        Some(path) => SwitchboardConfig::from_file(path)
            .with_context(|| format!("failed to read {}", path.display()))?
            .merge_with_env()?,
        None => SwitchboardConfig::from_env()?,
    };
    Ok(config)
}

/// Build the orchestrator, logging why startup failed before the error
/// propagates out of `main`
fn build_orchestrator(config: &SwitchboardConfig) -> Result<Orchestrator> {
    Orchestrator::new(config).map_err(|e| {
        tracing::error!(error = %e, "Failed to start orchestrator");
        println!("{} {}", "Configuration error:".bright_red().bold(), e);
        println!(
            "{}",
            "Set the required API keys in the environment or the config file.".yellow()
        );
        anyhow::Error::new(e).context("failed to start")
    })
}

/// Check a provider named on the command line against the registry
fn ensure_provider(available: &[String], provider: &str) -> Result<()> {
    if available.iter().any(|name| name == provider) {
        return Ok(());
    }
    tracing::error!(provider, "Requested provider is not available");
    anyhow::bail!(
        "Provider '{}' not available. Available: {}",
        provider,
        available.join(", ")
    )
}

fn display_welcome() {
    println!("{}", "🤖 Switchboard".bright_cyan().bold());
    println!(
        "{}",
        "One conversation across OpenAI, Gemini, DeepSeek, Grok and more.".dimmed()
    );
    println!("{}", "Images via DALL-E, videos via Replicate.".dimmed());
    println!();
    println!("{}", HELP_TEXT.dimmed());
}

fn display_status(orchestrator: &Orchestrator) {
    let status = orchestrator.status();
    let selected = |kind: CapabilityKind| {
        status
            .active_selections
            .get(&kind)
            .map(String::as_str)
            .unwrap_or("none")
            .to_string()
    };
    let listed = |kind: CapabilityKind| {
        let identities = &status.identities[&kind];
        if identities.is_empty() {
            "none".to_string()
        } else {
            identities.join(", ")
        }
    };

    println!("{}", "Status".bright_magenta().bold());
    println!("  {:<22} {}", "Current provider".cyan(), selected(CapabilityKind::Text).green());
    println!("  {:<22} {}", "Text providers".cyan(), listed(CapabilityKind::Text));
    println!("  {:<22} {}", "Image generators".cyan(), listed(CapabilityKind::Image));
    println!("  {:<22} {}", "Video generators".cyan(), listed(CapabilityKind::Video));
    println!("  {:<22} {}", "Conversation messages".cyan(), status.conversation_length);
}

fn current_provider(orchestrator: &Orchestrator) -> String {
    orchestrator
        .active_selection(CapabilityKind::Text)
        .unwrap_or("none")
        .to_string()
}

/// Handle a slash command. Returns false when the loop should stop.
async fn run_command(orchestrator: &mut Orchestrator, input: &str) -> bool {
    let (command, argument) = match input.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, argument.trim()),
        None => (input, ""),
    };
    let options = GenerationOptions::default();

    match command.to_lowercase().as_str() {
        "/exit" | "/quit" => {
            println!("{}", "Goodbye! 👋".bright_yellow());
            return false;
        }
        "/help" => display_welcome(),
        "/providers" => {
            let providers = orchestrator.list_identities(CapabilityKind::Text);
            println!("{} {}", "Available providers:".green(), providers.join(", "));
            println!("{} {}", "Current provider:".cyan(), current_provider(orchestrator));
        }
        "/switch" if argument.is_empty() => println!("{}", "Usage: /switch <provider>".red()),
        "/switch" => match orchestrator.try_set_active_selection(CapabilityKind::Text, argument) {
            Ok(()) => println!("{} Switched to {}", "✓".green(), argument),
            Err(e) => println!("{} {}", "✗".red(), e),
        },
        "/reset" => {
            orchestrator.reset();
            println!("{} Conversation history cleared", "✓".green());
        }
        "/status" => display_status(orchestrator),
        "/history" => {
            if orchestrator.history().is_empty() {
                println!("{}", "No messages yet.".dimmed());
            }
            for turn in orchestrator.history().turns() {
                let label = match turn.role {
                    Role::User => "You:".bright_green().bold(),
                    Role::Assistant => "Assistant:".bright_blue().bold(),
                };
                println!("{} {}", label, turn.content);
            }
        }
        "/image" if argument.is_empty() => println!("{}", "Usage: /image <description>".red()),
        "/image" => {
            println!("{}", "Generating image...".yellow());
            let result = orchestrator.generate_image(argument, None, &options).await;
            println!("{} {}", "Image saved to:".green(), result);
        }
        "/video" if argument.is_empty() => println!("{}", "Usage: /video <description>".red()),
        "/video" => {
            println!("{}", "Generating video... (this may take a while)".yellow());
            let result = orchestrator.generate_video(argument, None, &options).await;
            println!("{} {}", "Video saved to:".green(), result);
        }
        other => {
            println!("{} {}", "Unknown command:".red(), other);
            println!("{}", "Type /help for available commands".yellow());
        }
    }
    true
}

async fn run_interactive(orchestrator: &mut Orchestrator) -> Result<()> {
    let mut rl = DefaultEditor::new().context("failed to initialise readline")?;

    loop {
        match rl.readline(&format!("{} ", "You:".bright_cyan().bold())) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line).ok();

                if line.starts_with('/') {
                    if !run_command(orchestrator, line).await {
                        break;
                    }
                    continue;
                }

                println!("{}", "Thinking...".yellow());
                let reply = orchestrator.chat_reply(line, None).await;
                let speaker = reply.backend.unwrap_or_else(|| current_provider(orchestrator));
                println!();
                println!("{}", speaker.to_uppercase().bright_green().bold());
                println!("{}", reply.text);
                println!();
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "Interrupted. Type /exit to quit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye! 👋".bright_yellow());
                break;
            }
            Err(err) => {
                println!("{} {}", "Error:".bright_red().bold(), err);
                break;
            }
        }
    }

    Ok(())
}

#[cfg(feature = "http")]
async fn serve(
    orchestrator: Orchestrator,
    config: &SwitchboardConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    use switchboard::web::WebServer;

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let providers = orchestrator.list_identities(CapabilityKind::Text);
    let current = current_provider(&orchestrator);

    println!("{}", "=".repeat(60));
    println!("{}", "🤖 Switchboard Web Interface".bright_cyan().bold());
    println!("{}", "=".repeat(60));
    println!("Available providers: {}", providers.join(", "));
    println!("Current provider: {}", current);
    println!("\nStarting server at http://127.0.0.1:{}", port);
    if host == "0.0.0.0" {
        println!("{}", "⚠️  Server is accessible from external networks".yellow());
    }
    println!("Press Ctrl+C to stop");
    println!("{}", "=".repeat(60));

    WebServer::new(orchestrator, config)
        .with_bind(host, port)
        .start()
        .await?;
    Ok(())
}

#[cfg(not(feature = "http"))]
async fn serve(
    _orchestrator: Orchestrator,
    _config: &SwitchboardConfig,
    _host: Option<String>,
    _port: Option<u16>,
) -> Result<()> {
    anyhow::bail!("the web interface requires building with `--features http`")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _logging = init_logging(LoggingConfig::from_env()).context("failed to initialise logging")?;

    let config = load_config(cli.config.as_deref())?;
    let mut orchestrator = build_orchestrator(&config)?;

    if cli.list_providers {
        println!(
            "Available providers: {}",
            orchestrator.list_identities(CapabilityKind::Text).join(", ")
        );
        return Ok(());
    }

    if let Some(prompt) = cli.prompt.as_deref() {
        let provider = cli
            .provider
            .clone()
            .unwrap_or_else(|| current_provider(&orchestrator));
        ensure_provider(&orchestrator.list_identities(CapabilityKind::Text), &provider)?;
        let response = orchestrator
            .generate_text(prompt, Some(&provider), &GenerationOptions::default())
            .await;
        println!("Response from {}:\n{}", provider, response);
        return Ok(());
    }

    if let Some(provider) = cli.provider.as_deref() {
        if orchestrator.set_active_selection(CapabilityKind::Text, provider) {
            println!("{} Using {} provider", "✓".green(), provider);
        } else {
            println!("{} Provider {} not available", "✗".red(), provider);
        }
    }

    if let Some(Command::Serve { host, port }) = cli.command {
        return serve(orchestrator, &config, host, port).await;
    }

    if !cli.no_interactive {
        display_welcome();
        println!();
        display_status(&orchestrator);
        println!();
    }

    run_interactive(&mut orchestrator).await
}
