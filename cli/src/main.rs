use std::io::{self, Write};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::*;
use common::{EventSubmission, StatsPatch};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::time::Duration;

mod client;
mod render;

use client::AgentClient;
use render::{print_event, print_events, print_health, print_stats, print_status};

#[derive(Parser)]
#[command(name = "sentinel-cli", about = "Terminal client for the sentinel agent")]
struct Cli {
    /// Base URL of the agent's HTTP API
    #[arg(long, env = "SENTINEL_URL", default_value = "http://127.0.0.1:8080", global = true)]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Agent uptime and event store summary
    Status,
    /// Live dashboard, refreshed until 'q' is pressed
    Live {
        /// Refresh period in seconds
        #[arg(long, default_value_t = 2)]
        interval: u64,
    },
    /// List events, newest first
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Submit an event
    Submit(SubmitArgs),
    /// Show security counters
    Stats,
    /// Overwrite security counters
    SetStats(SetStatsArgs),
    /// Show subsystem health gauges
    Health,
    /// Log in with the demo account and print the token
    Login {
        #[arg(long, default_value = "admin")]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Check a token
    Verify {
        #[arg(long, env = "SENTINEL_TOKEN")]
        token: String,
    },
    /// Revoke a token
    Logout {
        #[arg(long, env = "SENTINEL_TOKEN")]
        token: String,
    },
}

#[derive(Args)]
struct SubmitArgs {
    /// badge-access | denial-of-service
    #[arg(long)]
    kind: String,
    /// authorized | unauthorized | blocked | detected
    #[arg(long)]
    outcome: String,
    #[arg(long)]
    severity: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    card_id: Option<String>,
    #[arg(long)]
    source_address: Option<String>,
    #[arg(long)]
    description: Option<String>,
}

#[derive(Args)]
struct SetStatsArgs {
    #[arg(long)]
    total_scans: Option<u64>,
    #[arg(long)]
    authorized_access: Option<u64>,
    #[arg(long)]
    unauthorized_attempts: Option<u64>,
    #[arg(long)]
    dos_attacks: Option<u64>,
    #[arg(long)]
    active_threats: Option<u64>,
}

impl From<SubmitArgs> for EventSubmission {
    fn from(args: SubmitArgs) -> Self {
        EventSubmission {
            kind: Some(args.kind),
            outcome: Some(args.outcome),
            severity: args.severity,
            location: args.location,
            card_id: args.card_id,
            source_address: args.source_address,
            description: args.description,
            ..Default::default()
        }
    }
}

impl From<SetStatsArgs> for StatsPatch {
    fn from(args: SetStatsArgs) -> Self {
        StatsPatch {
            total_scans: args.total_scans,
            authorized_access: args.authorized_access,
            unauthorized_attempts: args.unauthorized_attempts,
            dos_attacks: args.dos_attacks,
            active_threats: args.active_threats,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let client = AgentClient::new(&cli.url)?;

    match cli.command {
        Command::Status => print_status(&client.status().await?),
        Command::Live { interval } => run_live(&client, interval.max(1)).await?,
        Command::List { page, limit } => print_events(&client.events(page, limit).await?),
        Command::Submit(args) => {
            let event = client.submit(&args.into()).await?;
            println!("{}", "Event recorded".bright_green().bold());
            print_event(&event);
        }
        Command::Stats => print_stats(&client.stats().await?),
        Command::SetStats(args) => {
            let patch: StatsPatch = args.into();
            if patch.is_empty() {
                println!("{}", "Nothing to update; pass at least one counter flag".yellow());
                return Ok(());
            }
            print_stats(&client.update_stats(&patch).await?);
        }
        Command::Health => print_health(&client.health().await?),
        Command::Login { username, password } => {
            let session = client.login(&username, &password).await?;
            println!("{} {}", "Logged in as".bright_green(), session["username"].as_str().unwrap_or("?").bold());
            println!("{} {}", "Expires:".dimmed(), session["expiresAt"].as_str().unwrap_or("?"));
            println!("{}", session["token"].as_str().unwrap_or_default());
        }
        Command::Verify { token } => {
            let result = client.verify(&token).await?;
            println!(
                "{} {} (expires {})",
                "Token valid for".bright_green(),
                result["user"]["username"].as_str().unwrap_or("?").bold(),
                result["user"]["expiresAt"].as_str().unwrap_or("?")
            );
        }
        Command::Logout { token } => {
            client.logout(&token).await?;
            println!("{}", "Logged out".bright_green());
        }
    }

    Ok(())
}

async fn run_live(client: &AgentClient, interval: u64) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide)?;

    let result = live_loop(client, interval).await;

    // Cleanup
    execute!(stdout, Show, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    result
}

async fn live_loop(client: &AgentClient, interval: u64) -> Result<()> {
    let mut stdout = io::stdout();
    let mut refreshes: u64 = 0;

    loop {
        execute!(stdout, MoveTo(0, 0), Clear(ClearType::All))?;
        // raw mode needs explicit carriage returns, so render with it switched off
        disable_raw_mode()?;
        match tokio::try_join!(client.stats(), client.health(), client.events(1, 10)) {
            Ok((stats, health, page)) => {
                print_stats(&stats);
                print_health(&health);
                print_events(&page);
            }
            Err(e) => {
                println!("{} {} ({:#})", "Agent unreachable at".red().bold(), client.base_url(), e);
            }
        }
        refreshes += 1;
        println!(
            "{}",
            format!("refresh #{} every {}s · press q to quit", refreshes, interval).dimmed()
        );
        stdout.flush()?;
        enable_raw_mode()?;

        // Wait out the interval while watching for 'q'
        let mut waited = Duration::ZERO;
        let period = Duration::from_secs(interval);
        while waited < period {
            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(KeyEvent { code, modifiers, .. }) = event::read()? {
                    match code {
                        KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
                        _ => {}
                    }
                }
            }
            waited += Duration::from_millis(100);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_flags_become_a_submission() {
        let cli = Cli::parse_from([
            "sentinel-cli",
            "submit",
            "--kind",
            "badge-access",
            "--outcome",
            "authorized",
            "--location",
            "Lobby",
        ]);
        let Command::Submit(args) = cli.command else {
            panic!("expected submit");
        };
        let submission: EventSubmission = args.into();
        assert_eq!(submission.kind.as_deref(), Some("badge-access"));
        assert_eq!(submission.location.as_deref(), Some("Lobby"));
        assert!(submission.severity.is_none());
    }

    #[test]
    fn set_stats_only_carries_given_counters() {
        let cli = Cli::parse_from(["sentinel-cli", "set-stats", "--dos-attacks", "5"]);
        let Command::SetStats(args) = cli.command else {
            panic!("expected set-stats");
        };
        let patch: StatsPatch = args.into();
        assert_eq!(patch, StatsPatch { dos_attacks: Some(5), ..Default::default() });
    }

    #[test]
    fn list_defaults() {
        let cli = Cli::parse_from(["sentinel-cli", "list"]);
        let Command::List { page, limit } = cli.command else {
            panic!("expected list");
        };
        assert_eq!((page, limit), (1, 20));
    }
}
