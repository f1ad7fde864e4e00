//! Interactive line-oriented front end over one [`AdminConsole`].

use clap::{Parser, Subcommand};
use log::{debug, warn};
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::{render, AdminConsole, ConsoleError};
use crate::settlement::SettlementOutcome;
use crate::wallet::abbreviate;
use crate::withdrawal::{ActionOrigin, BulkAction, ParseValueError, TimeRange, WithdrawalStatus};

const PROMPT: &str = "withdrawals> ";

#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Show the current page
    #[command(alias = "ls")]
    List,
    /// Re-fetch pending requests
    Refresh,
    /// Time window: 24h, 3d, 7d, 30d or ytd
    Range { range: TimeRange },
    /// Status filter: pending, approved, rejected or all
    Status { status: String },
    /// Action-origin filter: win, lose, withdraw or all
    Origin { origin: String },
    /// Wallet search; no argument clears it
    Search { text: Option<String> },
    /// Go to a page
    Page { page: usize },
    /// Rows per page
    Size { size: usize },
    /// Toggle rows on the current page
    Select {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Select every row on the current page
    SelectAll,
    /// Clear the selection
    Clear,
    /// Pay out the selected requests
    Approve,
    /// Reject the selected requests
    Reject,
    /// Mark the selected requests as reviewed
    Review,
    /// Actions taken in this session
    History,
    /// One history entry
    Details { id: String },
    /// Settled withdrawals from the backend
    Completed { search: Option<String> },
    /// Dashboard metrics
    Metrics,
    /// Set the house balance (SOL)
    Balance { amount: Decimal },
    /// Connect the operator wallet
    Connect,
    /// Disconnect the operator wallet
    Disconnect,
    /// Show the connected wallet
    Whoami,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Output(String),
    Quit,
}

fn parse_all<T>(value: &str) -> Result<Option<T>, ParseValueError>
where
    T: std::str::FromStr<Err = ParseValueError>,
{
    if value.eq_ignore_ascii_case("all") {
        Ok(None)
    } else {
        value.parse().map(Some)
    }
}

/// Runs one shell command against the console.
pub async fn execute(
    console: &mut AdminConsole,
    command: ShellCommand,
) -> Result<Reply, ConsoleError> {
    let needs_wallet = !matches!(
        command,
        ShellCommand::Quit | ShellCommand::Connect | ShellCommand::Disconnect | ShellCommand::Whoami
    );
    if needs_wallet {
        console.ensure_connected()?;
    }

    let output = match command {
        ShellCommand::Quit => return Ok(Reply::Quit),
        ShellCommand::Connect => {
            console.connect().await;
            whoami(console)
        }
        ShellCommand::Disconnect => {
            console.disconnect().await;
            "Wallet disconnected.".to_string()
        }
        ShellCommand::Whoami => whoami(console),
        ShellCommand::List => list(console),
        ShellCommand::Refresh => {
            console.refresh().await?;
            list(console)
        }
        ShellCommand::Range { range } => {
            console.set_time_range(range);
            list(console)
        }
        ShellCommand::Status { status } => match parse_all::<WithdrawalStatus>(&status) {
            Ok(status) => {
                console.set_status_filter(status);
                list(console)
            }
            Err(err) => err.to_string(),
        },
        ShellCommand::Origin { origin } => match parse_all::<ActionOrigin>(&origin) {
            Ok(origin) => {
                console.set_action_filter(origin);
                list(console)
            }
            Err(err) => err.to_string(),
        },
        ShellCommand::Search { text } => {
            console.set_search(text.as_deref().unwrap_or(""));
            list(console)
        }
        ShellCommand::Page { page } => {
            console.set_page(page);
            list(console)
        }
        ShellCommand::Size { size } => {
            console.set_page_size(size);
            list(console)
        }
        ShellCommand::Select { ids } => {
            console.toggle_all(&ids)?;
            list(console)
        }
        ShellCommand::SelectAll => {
            console.select_all(true);
            list(console)
        }
        ShellCommand::Clear => {
            console.select_all(false);
            list(console)
        }
        ShellCommand::Approve => outcome(console.bulk_action(BulkAction::Approve).await?),
        ShellCommand::Reject => outcome(console.bulk_action(BulkAction::Reject).await?),
        ShellCommand::Review => outcome(console.bulk_action(BulkAction::Review).await?),
        ShellCommand::History => render::history(console.history()),
        ShellCommand::Details { id } => match console.transaction_details(&id) {
            Some(details) => render::details(&details),
            None => format!("No history entry {id}."),
        },
        ShellCommand::Completed { search } => {
            let rows = console
                .completed_withdrawals(search.as_deref().unwrap_or(""))
                .await?;
            render::completed(&rows)
        }
        ShellCommand::Metrics => render::metrics(&console.dashboard_metrics().await?),
        ShellCommand::Balance { amount } => {
            render::metrics(&console.update_house_balance(amount).await?)
        }
    };
    Ok(Reply::Output(output))
}

fn list(console: &AdminConsole) -> String {
    let page = render::page(&console.page(), console.selection(), console.filter());
    match console.load_error() {
        Some(error) => format!("{error}\n{page}"),
        None => page,
    }
}

fn whoami(console: &AdminConsole) -> String {
    match console.session().public_key() {
        Some(key) => format!("Connected as {}", abbreviate(&key.to_string())),
        None => "No wallet connected.".to_string(),
    }
}

fn outcome(outcome: SettlementOutcome) -> String {
    match outcome {
        SettlementOutcome::Settled {
            action,
            entry_id,
            request_ids,
            signature,
        } => {
            let mut text = format!(
                "{} {} request(s), history entry {}",
                action.past_tense(),
                request_ids.len(),
                entry_id
            );
            if let Some(signature) = signature {
                text.push_str(&format!("\nSignature: {signature}"));
            }
            text
        }
        SettlementOutcome::Recorded { entry_id } => format!("Recorded as {entry_id}"),
        SettlementOutcome::Skipped => "No wallet connected; nothing was sent.".to_string(),
    }
}

/// Reads commands from stdin until `quit` or end of input.
pub async fn run(console: &mut AdminConsole) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    println!("{}", whoami(console));
    if console.session().is_connected() {
        println!("{}", list(console));
    }

    loop {
        stdout.write_all(PROMPT.as_bytes()).await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        console.sync_wallet().await;
        let command = match ShellLine::try_parse_from(tokens) {
            Ok(parsed) => parsed.command,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        debug!("Shell command {:?}", command);

        match execute(console, command).await {
            Ok(Reply::Output(text)) => println!("{text}"),
            Ok(Reply::Quit) => break,
            // Settlement failures have already been surfaced through the notifier.
            Err(ConsoleError::Settlement(err)) => warn!("Bulk action failed: {}", err),
            Err(err) => println!("Error: {err}"),
        }
    }
    Ok(())
}
