//! Magic-Market Scanner main entry point
//!
//! This is the command-line interface: it gathers the session token and
//! keywords, runs scans, and lets the operator continue, restart or quit
//! after each one.

use anyhow::Context;
use clap::Parser;
use inquire::{InquireError, Password, PasswordDisplayMode, Text};
use magic_market_scanner::config::{load_config_with_hash, Config};
use magic_market_scanner::output::{print_summary, read_snapshot, ScanSummary};
use magic_market_scanner::scanner::{interrupt_channel, scan, Interrupt, InterruptHandle, Termination};
use magic_market_scanner::state::{OperatorCommand, Session, SessionEvent, SessionState};
use magic_market_scanner::{KeywordSet, ResultStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Magic-Market Scanner: watch the marketplace listing for keywords
///
/// Walks every page of the listing, keeps the items whose name contains one
/// of the keywords, and rewrites a JSON snapshot after every new match.
#[derive(Parser, Debug)]
#[command(name = "magic-market-scanner")]
#[command(version)]
#[command(about = "Scan the magic market listing for keywords", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Session cookie, forwarded verbatim (prompted for when absent)
    #[arg(long, env = "MARKET_SESSION_TOKEN", hide_env_values = true)]
    cookie: Option<String>,

    /// Keywords separated by commas (prompted for when absent)
    #[arg(short, long)]
    keywords: Option<String>,

    /// Snapshot file, overriding the configured path
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the summary of an existing snapshot and exit
    #[arg(long)]
    summary: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Token and keywords of the current session
struct SessionInputs {
    token: String,
    keywords: KeywordSet,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(&cli)?;

    if cli.summary {
        return handle_summary(Path::new(&config.output.snapshot_path));
    }

    let (handle, interrupt) = interrupt_channel();
    let handle = Arc::new(handle);
    spawn_interrupt_listener(Arc::clone(&handle));

    run_session(&config, &cli, &handle, interrupt).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("magic_market_scanner=info,warn"),
            1 => EnvFilter::new("magic_market_scanner=debug,info"),
            2 => EnvFilter::new("magic_market_scanner=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file if one was given, then applies CLI overrides
fn load_configuration(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(output) = &cli.output {
        config.output.snapshot_path = output.display().to_string();
    }

    Ok(config)
}

/// Forwards every Ctrl-C to the running scan
fn spawn_interrupt_listener(handle: Arc<InterruptHandle>) {
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Cannot listen for Ctrl-C: {}", e);
                return;
            }
            tracing::info!("Interrupt received, stopping scan");
            handle.trigger();
        }
    });
}

/// Handles the --summary mode: summarizes an existing snapshot
fn handle_summary(path: &Path) -> anyhow::Result<()> {
    println!("Snapshot: {}", path.display());
    let records =
        read_snapshot(path).with_context(|| format!("failed to read {}", path.display()))?;
    print_summary(&ScanSummary::from_records(&records));
    Ok(())
}

/// Runs scans until the operator terminates
async fn run_session(
    config: &Config,
    cli: &Cli,
    handle: &InterruptHandle,
    mut interrupt: Interrupt,
) -> anyhow::Result<()> {
    let mut session = Session::new();
    let mut store = ResultStore::new(config.api.detail_base_url.clone());
    let mut inputs: Option<SessionInputs> = None;

    println!("Every page of the market listing will be scanned for your keywords");
    println!("Matches are saved to: {}\n", config.output.snapshot_path);

    loop {
        if matches!(session.state(), SessionState::Idle | SessionState::Reset) {
            store.clear();
            // Flags only seed the first round; a restart asks again
            let (cookie, keywords) = if session.state() == SessionState::Idle {
                (cli.cookie.clone(), cli.keywords.clone())
            } else {
                (None, None)
            };
            inputs = match blocking_prompt(move || prompt_inputs(cookie, keywords)).await? {
                Some(inputs) => Some(inputs),
                None => {
                    println!("Exited");
                    return Ok(());
                }
            };
        }

        let Some(SessionInputs { token, keywords }) = inputs.as_ref() else {
            anyhow::bail!("no session inputs in state {}", session.state());
        };

        session.apply(SessionEvent::Start)?;
        handle.reset();
        println!("\nScanning for: {}", keywords);
        println!("Press Ctrl+C to stop at any time\n");

        let event = match scan(config, token, keywords, &mut store, &mut interrupt).await {
            Ok(outcome) => {
                match &outcome.termination {
                    Termination::Exhausted => println!("\nAll pages scanned"),
                    Termination::Fatal(e) => println!("\nScan stopped: {}", e),
                    Termination::Interrupted => println!("\nScan interrupted"),
                }
                if outcome.termination == Termination::Interrupted {
                    SessionEvent::ScanInterrupted
                } else {
                    SessionEvent::ScanFinished
                }
            }
            Err(e) => {
                tracing::error!("Scan could not start: {:?}", e);
                println!("\nScan could not start: {}", e);
                SessionEvent::ScanFinished
            }
        };
        session.apply(event)?;

        print_summary(&ScanSummary::from_items(
            store.items(),
            store.detail_base_url(),
        ));
        if !store.is_empty() {
            println!("Results are saved in {}", config.output.snapshot_path);
        }

        let available = session.available_commands();
        let command = blocking_prompt(move || prompt_command(&available)).await?;
        session.apply(SessionEvent::Command(command))?;

        match session.state() {
            SessionState::Exited => {
                println!("Exited");
                return Ok(());
            }
            SessionState::Reset => println!("\nStarting over...\n"),
            SessionState::Resumed => println!("\nContinuing scan...\n"),
            _ => {}
        }
    }
}

/// Runs a blocking prompt off the async worker threads
async fn blocking_prompt<T, F>(prompt: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(prompt)
        .await
        .context("prompt task failed")?
}

/// Collects token and keywords, prompting for what is missing
///
/// Returns `None` if the operator cancels a prompt.
fn prompt_inputs(
    cookie: Option<String>,
    keywords: Option<String>,
) -> anyhow::Result<Option<SessionInputs>> {
    let token = match cookie.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => token.to_string(),
        None => loop {
            let answer = Password::new("Session cookie:")
                .without_confirmation()
                .with_display_mode(PasswordDisplayMode::Masked)
                .prompt();
            match answered(answer)? {
                None => return Ok(None),
                Some(token) if token.trim().is_empty() => println!("The cookie cannot be empty"),
                Some(token) => break token.trim().to_string(),
            }
        },
    };

    let flag_keywords = keywords
        .as_deref()
        .map(KeywordSet::parse)
        .filter(|keywords| !keywords.is_empty());
    let keywords = match flag_keywords {
        Some(keywords) => keywords,
        None => loop {
            let answer = Text::new("Keywords (separated by commas):").prompt();
            match answered(answer)? {
                None => return Ok(None),
                Some(line) => {
                    let keywords = KeywordSet::parse(&line);
                    if keywords.is_empty() {
                        println!("Enter at least one keyword");
                    } else {
                        break keywords;
                    }
                }
            }
        },
    };

    Ok(Some(SessionInputs { token, keywords }))
}

/// Asks the operator what to do next
///
/// A cancelled prompt counts as Terminate.
fn prompt_command(available: &[OperatorCommand]) -> anyhow::Result<OperatorCommand> {
    let choices = available
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" / ");

    loop {
        let answer = Text::new(&format!("{}:", choices)).prompt();
        let Some(line) = answered(answer)? else {
            return Ok(OperatorCommand::Terminate);
        };

        match OperatorCommand::parse(&line) {
            Some(command) if available.contains(&command) => return Ok(command),
            _ => {
                let letters: Vec<String> =
                    available.iter().map(|c| c.shortcut().to_string()).collect();
                println!("Please enter {}", letters.join(", "));
            }
        }
    }
}

/// Maps a cancelled or interrupted prompt to `None`
fn answered(answer: Result<String, InquireError>) -> anyhow::Result<Option<String>> {
    match answer {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
