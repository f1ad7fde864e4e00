use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;
use rust_decimal::Decimal;

use crate::backend::HttpBackend;
use crate::chain::RpcChainClient;
use crate::config::{ConfigArgs, ConsoleConfig};
use crate::console::{render, shell, AdminConsole, ConsoleError};
use crate::notify::{ConsoleNotifier, Notifier};
use crate::settlement::SettlementOutcome;
use crate::wallet::{KeypairProvider, WalletProvider, WalletSession};
use crate::withdrawal::{ActionOrigin, BulkAction, TimeRange, WithdrawalStatus};

#[derive(Parser)]
#[command(author, version, about = "Review and settle pending withdrawal requests", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive session
    Shell,

    /// Print one page of pending requests
    List {
        /// Time window (24h/3d/7d/30d/ytd)
        #[arg(short, long, default_value = "ytd")]
        range: TimeRange,

        /// Status filter (pending/approved/rejected); omit for all
        #[arg(short, long)]
        status: Option<WithdrawalStatus>,

        /// Action-origin filter (win/lose/withdraw)
        #[arg(short, long)]
        origin: Option<ActionOrigin>,

        /// Wallet address fragment
        #[arg(long)]
        search: Option<String>,

        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },

    /// Pay out the given requests in one transaction
    Approve {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Reject the given requests
    Reject {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Record a review of the given requests
    Review {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Completed withdrawals known to the backend
    History {
        /// Wallet address fragment
        #[arg(long)]
        search: Option<String>,
    },

    /// Dashboard metrics
    Metrics,

    /// Set the house balance in SOL
    SetHouseBalance { amount: Decimal },
}

pub struct CliHandler {
    console: AdminConsole,
}

impl CliHandler {
    pub fn new(console: AdminConsole) -> Self {
        Self { console }
    }

    /// Wires the production collaborators from validated configuration.
    pub fn from_config(config: &ConsoleConfig) -> anyhow::Result<Self> {
        let chain = Arc::new(
            RpcChainClient::from_url(
                config.rpc_url.clone(),
                config.http_timeout,
                config.poll_interval,
                config.commitment,
            )
            .context("failed to build the RPC client")?,
        );
        let backend = Arc::new(
            HttpBackend::from_url(config.backend_url.clone(), config.http_timeout)
                .context("failed to build the backend client")?,
        );
        let provider = KeypairProvider::detect(&config.keypair_path, config.auto_connect, chain.clone())
            .context("failed to load the operator keypair")?
            .map(|provider| Arc::new(provider) as Arc<dyn WalletProvider>);

        let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);
        let session = WalletSession::new(provider, config.allowlist.clone(), notifier.clone());
        info!(
            "Backend {}, RPC {} ({})",
            config.backend_url, config.rpc_url, config.commitment
        );
        Ok(Self::new(AdminConsole::new(
            session,
            backend,
            chain,
            notifier,
            config.page_size,
        )))
    }

    pub async fn handle_command(&mut self, command: Commands) -> anyhow::Result<()> {
        if let Commands::Shell = command {
            self.console.mount().await;
            return shell::run(&mut self.console).await;
        }

        // A one-shot command is an explicit request to use the wallet.
        self.console.connect().await;
        self.console.ensure_connected()?;

        match command {
            Commands::Shell => {}
            Commands::List {
                range,
                status,
                origin,
                search,
                page,
            } => {
                self.console.set_time_range(range);
                self.console.set_status_filter(status);
                self.console.set_action_filter(origin);
                self.console.set_search(search.as_deref().unwrap_or(""));
                self.console.set_page(page);
                if let Some(error) = self.console.load_error() {
                    println!("{error}");
                }
                println!(
                    "{}",
                    render::page(&self.console.page(), self.console.selection(), self.console.filter())
                );
            }
            Commands::Approve { ids } => self.settle(BulkAction::Approve, ids).await?,
            Commands::Reject { ids } => self.settle(BulkAction::Reject, ids).await?,
            Commands::Review { ids } => self.settle(BulkAction::Review, ids).await?,
            Commands::History { search } => {
                let rows = self
                    .console
                    .completed_withdrawals(search.as_deref().unwrap_or(""))
                    .await?;
                println!("{}", render::completed(&rows));
            }
            Commands::Metrics => {
                println!("{}", render::metrics(&self.console.dashboard_metrics().await?));
            }
            Commands::SetHouseBalance { amount } => {
                let metrics = self.console.update_house_balance(amount).await?;
                println!("{}", render::metrics(&metrics));
            }
        }
        Ok(())
    }

    async fn settle(&mut self, action: BulkAction, ids: Vec<String>) -> Result<(), ConsoleError> {
        match self.console.apply_to(action, &ids).await? {
            SettlementOutcome::Settled {
                request_ids,
                signature,
                ..
            } => {
                println!("{} {} request(s)", action.past_tense(), request_ids.len());
                if let Some(signature) = signature {
                    println!("Signature: {signature}");
                }
            }
            SettlementOutcome::Recorded { entry_id } => println!("Recorded as {entry_id}"),
            SettlementOutcome::Skipped => println!("No wallet connected; nothing was sent."),
        }
        Ok(())
    }
}
