//! VigiChain Admin CLI
//!
//! Command-line front end for the admin backend:
//! - Wallet-signature login and logout
//! - Session inspection and wallet event watching
//! - Wallet, tag, category, report, chain and settings management

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vigichain_admin::api::{ApiClient, Pagination, WalletIdentity};
use vigichain_admin::config::{generate_default_config, Config, LoggingConfig};
use vigichain_admin::resources::{
    filter_wallets, AdminApi, Category, CategoryFilters, CategoryInput, CategoryType, Chain, ChainFilters, ChainInput,
    ChainsApi, CategoriesApi, Report, ReportFilters, ReportStatus, RiskLevel, Setting, SettingFilters,
    SettingsApi, Tag, TagFilters, TagInput, Verification, VerifyAction, Wallet, WalletFilters,
};
use vigichain_admin::session::{FileTokenStore, SessionManager, SessionState};
use vigichain_admin::wallet::signing::short_address;
use vigichain_admin::wallet::{JsonRpcWallet, LocalWallet, WalletProvider};

#[derive(Parser)]
#[command(name = "vigichain-admin")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Admin console for the VigiChain wallet-reputation backend")]
#[command(long_about = "Sign in with an admin wallet, then manage wallets, tags, categories,\nreports, chains and settings on the VigiChain backend.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend API base URL (overrides config)
    #[arg(long, global = true, env = "VIGICHAIN_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,

    /// Config file (default: standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign a login message with the configured wallet
    Login,

    /// Clear the stored session
    Logout,

    /// Show the identity behind the stored session
    Whoami,

    /// Follow wallet account and chain changes until interrupted
    Watch,

    /// Manage tracked wallets
    Wallets {
        #[command(subcommand)]
        action: WalletCommand,
    },

    /// Manage tags
    Tags {
        #[command(subcommand)]
        action: TagCommand,
    },

    /// Manage tag categories
    Categories {
        #[command(subcommand)]
        action: CategoryCommand,
    },

    /// Review wallet reports
    Reports {
        #[command(subcommand)]
        action: ReportCommand,
    },

    /// Manage supported chains
    Chains {
        #[command(subcommand)]
        action: ChainCommand,
    },

    /// Manage backend settings
    Settings {
        #[command(subcommand)]
        action: SettingCommand,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum WalletCommand {
    /// List wallets
    List {
        #[arg(short, long, default_value = "1")]
        page: u32,
        #[arg(short, long, default_value = "10")]
        limit: u32,
        /// Address or tag substring
        #[arg(short, long)]
        search: Option<String>,
        /// Risk level (low, medium, high)
        #[arg(short, long)]
        risk: Option<RiskLevel>,
    },
    /// Show one wallet
    Get { id: String },
    /// Look up a wallet by address
    Address { address: String },
    /// List wallets with a role
    Role { role: String },
    /// Start tracking a wallet
    Create {
        address: String,
        #[arg(long)]
        role: Option<String>,
    },
    /// Stop tracking a wallet
    Delete { id: String },
    /// Run a reputation analysis
    Analyze { id: String },
    /// Block a wallet
    Block { id: String },
    /// Mark a wallet as safe
    MarkSafe { id: String },
    /// Set the reputation score
    Reputation { id: String, score: f64 },
    /// Attach a tag by name
    Tag { id: String, name: String },
    /// Detach a tag by name
    Untag { id: String, name: String },
}

#[derive(Subcommand)]
pub enum TagCommand {
    /// List tags
    List {
        #[arg(short, long, default_value = "1")]
        page: u32,
        #[arg(short, long, default_value = "10")]
        limit: u32,
        /// Category type (positive, negative, neutral)
        #[arg(long)]
        category: Option<CategoryType>,
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one tag
    Get { id: String },
    /// Create a tag
    Create {
        name: String,
        #[arg(long)]
        category_id: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        value: Option<String>,
        #[arg(long = "type")]
        kind: Option<String>,
    },
    /// Delete a tag
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum CategoryCommand {
    /// List categories
    List {
        #[arg(short, long, default_value = "1")]
        page: u32,
        #[arg(short, long, default_value = "10")]
        limit: u32,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long = "type")]
        kind: Option<CategoryType>,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Show one category
    Get { id: String },
    /// Create a category
    Create {
        name: String,
        #[arg(long = "type")]
        kind: CategoryType,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Activate or deactivate a category
    Status {
        id: String,
        #[arg(action = clap::ArgAction::Set)]
        active: bool,
    },
    /// Delete a category
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum ReportCommand {
    /// List reports
    List {
        #[arg(short, long, default_value = "1")]
        page: u32,
        #[arg(short, long, default_value = "10")]
        limit: u32,
        #[arg(long)]
        status: Option<ReportStatus>,
        #[arg(long)]
        tag_id: Option<String>,
    },
    /// Show one report
    Get { id: String },
    /// Counts by status
    Stats,
    /// Approve a report, optionally assigning tags
    Approve {
        id: String,
        #[arg(short, long)]
        reason: String,
        #[arg(short, long)]
        tags: Vec<String>,
    },
    /// Reject a report
    Reject {
        id: String,
        #[arg(short, long)]
        reason: String,
    },
    /// Delete a report
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum ChainCommand {
    /// List chains
    List {
        #[arg(short, long, default_value = "1")]
        page: u32,
        #[arg(short, long, default_value = "10")]
        limit: u32,
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Look up a chain by numeric chain id
    Get { chain_id: u64 },
    /// Add a chain
    Create {
        name: String,
        chain_id: u64,
        #[arg(long)]
        rpc_url: String,
        #[arg(long)]
        explorer_url: String,
    },
    /// Remove a chain
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum SettingCommand {
    /// List settings
    List {
        #[arg(short, long, default_value = "1")]
        page: u32,
        #[arg(short, long, default_value = "10")]
        limit: u32,
        #[arg(short, long)]
        key: Option<String>,
    },
    /// All settings as key/value pairs
    Map,
    /// Show one setting
    Get { key: String },
    /// Create or update a setting
    Set { key: String, value: String },
    /// Delete a setting
    Delete { key: String },
}

/// Everything a command needs
struct App {
    session: Arc<SessionManager>,
    admin: AdminApi,
    rpc_wallet: Option<Arc<JsonRpcWallet>>,
    config: Config,
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path).with_context(|| format!("loading {:?}", path))?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }

    init_logging(&config.logging);

    if let Commands::Config { output } = &cli.command {
        let template = generate_default_config();
        match output {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, &template)?;
                println!("Config written to {:?}", path);
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    let app = App::new(config, cli.format)?;
    app.run(cli.command).await
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vigichain_admin={}", config.level)));

    // logs go to stderr so json output on stdout stays parseable
    if config.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

impl App {
    fn new(config: Config, format: OutputFormat) -> anyhow::Result<Self> {
        let client = ApiClient::new(&config.api).context("building HTTP client")?;
        let request_timeout = Duration::from_secs(config.api.request_timeout_secs);

        let mut rpc_wallet = None;
        let wallet: Option<Arc<dyn WalletProvider>> = match (&config.wallet.private_key, &config.wallet.rpc_url) {
            (Some(key), _) => {
                let wallet = LocalWallet::from_private_key(key, &config.wallet.chain_id)
                    .context("loading wallet private key")?
                    .connected();
                Some(Arc::new(wallet))
            }
            (None, Some(url)) => {
                let wallet = Arc::new(JsonRpcWallet::new(url.clone(), request_timeout)?);
                rpc_wallet = Some(wallet.clone());
                Some(wallet)
            }
            (None, None) => None,
        };
        if let Some(wallet) = &wallet {
            tracing::debug!("Using '{}' wallet provider", wallet.name());
        }

        let tokens = Arc::new(FileTokenStore::new(config.session.cookie_path()));
        let session = SessionManager::new(
            Arc::new(client.clone()),
            wallet,
            tokens,
            config.session.session_config(),
        )
        .with_message_format(config.session.message_format);

        Ok(Self {
            session: Arc::new(session),
            admin: AdminApi::new(client),
            rpc_wallet,
            config,
            format,
        })
    }

    async fn run(&self, command: Commands) -> anyhow::Result<()> {
        match command {
            Commands::Login => self.login().await,
            Commands::Logout => {
                self.session.logout().await;
                println!("Logged out");
                Ok(())
            }
            Commands::Whoami => {
                let identity = self.require_session().await?;
                self.print_identity(&identity, &self.session.state())
            }
            Commands::Watch => self.watch().await,
            Commands::Wallets { action } => {
                self.require_session().await?;
                self.wallets(action).await
            }
            Commands::Tags { action } => {
                self.require_session().await?;
                self.tags(action).await
            }
            Commands::Categories { action } => {
                self.require_session().await?;
                self.categories(action).await
            }
            Commands::Reports { action } => {
                let identity = self.require_session().await?;
                self.reports(action, &identity).await
            }
            Commands::Chains { action } => {
                self.require_session().await?;
                self.chains(action).await
            }
            Commands::Settings { action } => {
                self.require_session().await?;
                self.settings(action).await
            }
            Commands::Config { .. } => Ok(()),
        }
    }

    async fn login(&self) -> anyhow::Result<()> {
        // query first so the state carries the connected account and chain
        if let Err(e) = self.session.bootstrap().await {
            tracing::debug!("No reusable session: {}", e);
        }

        match self.session.login().await {
            Ok(identity) => {
                let state = self.session.state();
                if state.session.as_ref().map(|s| s.is_new_account).unwrap_or(false) {
                    println!("New account registered");
                }
                self.print_identity(&identity, &state)
            }
            Err(e) => bail!(e.user_message()),
        }
    }

    /// Restore the stored session or fail with the reason
    async fn require_session(&self) -> anyhow::Result<WalletIdentity> {
        match self.session.bootstrap().await {
            Ok(Some(identity)) => Ok(identity),
            Ok(None) => bail!("Not logged in. Run `vigichain-admin login` first."),
            Err(e) => bail!(e.user_message()),
        }
    }

    async fn watch(&self) -> anyhow::Result<()> {
        if !self.session.has_wallet() {
            bail!("No wallet configured. Set wallet.private_key or wallet.rpc_url.");
        }
        if let Err(e) = self.session.bootstrap().await {
            eprintln!("{}", e.user_message());
        }

        let _poller = self
            .rpc_wallet
            .as_ref()
            .map(|w| w.watch(Duration::from_millis(self.config.wallet.poll_interval_ms)));
        let _listener = self.session.spawn_listener();

        let mut states = self.session.subscribe();
        self.print_state(&states.borrow_and_update().clone())?;

        loop {
            tokio::select! {
                changed = states.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = states.borrow_and_update().clone();
                    self.print_state(&state)?;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted, stopping watch");
                    break;
                }
            }
        }

        self.session.teardown();
        Ok(())
    }

    async fn wallets(&self, action: WalletCommand) -> anyhow::Result<()> {
        let api = &self.admin.wallets;
        match action {
            WalletCommand::List {
                page,
                limit,
                search,
                risk,
            } => {
                let filters = WalletFilters {
                    search: search.unwrap_or_default(),
                    risk,
                };
                let page = api.list(page, limit).await?;
                self.print_list(&filter_wallets(&page.items, &filters), Some(page.pagination))
            }
            WalletCommand::Get { id } => self.print_one(&api.get(&id).await?),
            WalletCommand::Address { address } => self.print_one(&api.by_address(&address).await?),
            WalletCommand::Role { role } => self.print_list(&api.by_role(&role).await?, None),
            WalletCommand::Create { address, role } => {
                let created = api.create(&address, role.as_deref()).await?;
                self.print_done("Wallet created", created.as_ref())
            }
            WalletCommand::Delete { id } => {
                api.delete(&id).await?;
                self.print_done::<Wallet>("Wallet deleted", None)
            }
            WalletCommand::Analyze { id } => {
                let result = api.analyze(&id).await?;
                if self.format == OutputFormat::Json {
                    return print_json(&result);
                }
                println!("Score: {:.1} ({} risk)", result.score, RiskLevel::from_score(result.score));
                for factor in &result.risk_factors {
                    println!("  [{}] {}: {}", factor.severity, factor.name, factor.description);
                }
                Ok(())
            }
            WalletCommand::Block { id } => {
                let wallet = api.block(&id).await?;
                self.print_done("Wallet blocked", wallet.as_ref())
            }
            WalletCommand::MarkSafe { id } => {
                let wallet = api.mark_safe(&id).await?;
                self.print_done("Wallet marked safe", wallet.as_ref())
            }
            WalletCommand::Reputation { id, score } => {
                let wallet = api.update_reputation(&id, score).await?;
                self.print_done("Reputation updated", wallet.as_ref())
            }
            WalletCommand::Tag { id, name } => {
                let wallet = api.add_tag(&id, &name).await?;
                self.print_done("Tag added", wallet.as_ref())
            }
            WalletCommand::Untag { id, name } => {
                api.remove_tag(&id, &name).await?;
                self.print_done::<Wallet>("Tag removed", None)
            }
        }
    }

    async fn tags(&self, action: TagCommand) -> anyhow::Result<()> {
        let api = &self.admin.tags;
        match action {
            TagCommand::List {
                page,
                limit,
                category,
                search,
            } => {
                let page = api
                    .list(page, limit, &TagFilters { category, search })
                    .await?;
                self.print_list(&page.items, Some(page.pagination))
            }
            TagCommand::Get { id } => self.print_one(&api.get(&id).await?),
            TagCommand::Create {
                name,
                category_id,
                description,
                value,
                kind,
            } => {
                let input = TagInput {
                    name: Some(name),
                    description: Some(description),
                    category_id: Some(category_id),
                    value,
                    kind,
                    is_active: Some(true),
                };
                let created = api.create(&input).await?;
                self.print_done("Tag created", created.as_ref())
            }
            TagCommand::Delete { id } => {
                api.delete(&id).await?;
                self.print_done::<Tag>("Tag deleted", None)
            }
        }
    }

    async fn categories(&self, action: CategoryCommand) -> anyhow::Result<()> {
        let api = &self.admin.categories;
        match action {
            CategoryCommand::List {
                page,
                limit,
                name,
                kind,
                active,
            } => {
                let filters = CategoryFilters {
                    name,
                    kind,
                    is_active: active,
                };
                let page = api
                    .list(page, limit, &filters, &CategoriesApi::default_sorting())
                    .await?;
                self.print_list(&page.items, Some(page.pagination))
            }
            CategoryCommand::Get { id } => self.print_one(&api.get(&id).await?),
            CategoryCommand::Create {
                name,
                kind,
                description,
            } => {
                let input = CategoryInput {
                    name: Some(name),
                    description: Some(description),
                    kind: Some(kind),
                    is_active: Some(true),
                };
                let created = api.create(&input).await?;
                self.print_done("Category created", created.as_ref())
            }
            CategoryCommand::Status { id, active } => {
                let updated = api.update_status(&id, active).await?;
                let message = if active { "Category activated" } else { "Category deactivated" };
                self.print_done(message, updated.as_ref())
            }
            CategoryCommand::Delete { id } => {
                api.delete(&id).await?;
                self.print_done::<Category>("Category deleted", None)
            }
        }
    }

    async fn reports(&self, action: ReportCommand, admin: &WalletIdentity) -> anyhow::Result<()> {
        let api = &self.admin.reports;
        match action {
            ReportCommand::List {
                page,
                limit,
                status,
                tag_id,
            } => {
                let page = api
                    .list(page, limit, &ReportFilters { status, tag_id })
                    .await?;
                self.print_list(&page.items, Some(page.pagination))
            }
            ReportCommand::Get { id } => self.print_one(&api.get(&id).await?),
            ReportCommand::Stats => {
                let stats = api.stats().await?;
                if self.format == OutputFormat::Json {
                    return print_json(&stats);
                }
                println!("Pending:  {}", stats.pending);
                println!("Approved: {}", stats.approved);
                println!("Rejected: {}", stats.rejected);
                println!("Total:    {}", stats.total);
                Ok(())
            }
            ReportCommand::Approve { id, reason, tags } => {
                let verification = Verification {
                    action: VerifyAction::Approve,
                    verified_by: admin.address.clone(),
                    reason,
                    assigned_tags: (!tags.is_empty()).then_some(tags),
                };
                let report = api.verify(&id, &verification).await?;
                self.print_done("Report approved", report.as_ref())
            }
            ReportCommand::Reject { id, reason } => {
                let verification = Verification {
                    action: VerifyAction::Reject,
                    verified_by: admin.address.clone(),
                    reason,
                    assigned_tags: None,
                };
                let report = api.verify(&id, &verification).await?;
                self.print_done("Report rejected", report.as_ref())
            }
            ReportCommand::Delete { id } => {
                api.delete(&id).await?;
                self.print_done::<Report>("Report deleted", None)
            }
        }
    }

    async fn chains(&self, action: ChainCommand) -> anyhow::Result<()> {
        let api = &self.admin.chains;
        match action {
            ChainCommand::List { page, limit, name } => {
                let filters = ChainFilters {
                    name,
                    chain_id: None,
                };
                let page = api
                    .list(page, limit, &filters, &ChainsApi::default_sorting())
                    .await?;
                self.print_list(&page.items, Some(page.pagination))
            }
            ChainCommand::Get { chain_id } => self.print_one(&api.by_chain_id(chain_id).await?),
            ChainCommand::Create {
                name,
                chain_id,
                rpc_url,
                explorer_url,
            } => {
                let input = ChainInput {
                    name,
                    chain_id,
                    rpc_url,
                    explorer_url,
                };
                let created = api.create(&input).await?;
                self.print_done("Chain created", created.as_ref())
            }
            ChainCommand::Delete { id } => {
                api.delete(&id).await?;
                self.print_done::<Chain>("Chain deleted", None)
            }
        }
    }

    async fn settings(&self, action: SettingCommand) -> anyhow::Result<()> {
        let api = &self.admin.settings;
        match action {
            SettingCommand::List { page, limit, key } => {
                let page = api
                    .list(page, limit, &SettingFilters { key }, &SettingsApi::default_sorting())
                    .await?;
                self.print_list(&page.items, Some(page.pagination))
            }
            SettingCommand::Map => {
                let map = api.map().await?;
                if self.format == OutputFormat::Json {
                    return print_json(&map);
                }
                for (key, value) in map {
                    println!("{} = {}", key, value);
                }
                Ok(())
            }
            SettingCommand::Get { key } => self.print_one(&api.get(&key).await?),
            SettingCommand::Set { key, value } => {
                // update in place when the key exists, otherwise create it
                let saved = match api.get(&key).await {
                    Ok(_) => api.update_by_key(&key, &value).await?,
                    Err(e) if e.status() == Some(404) => api.create(&key, &value).await?,
                    Err(e) => return Err(e.into()),
                };
                self.print_done("Setting saved", saved.as_ref())
            }
            SettingCommand::Delete { key } => {
                api.delete_by_key(&key).await?;
                self.print_done::<Setting>("Setting deleted", None)
            }
        }
    }

    // ========================================================================
    // Output
    // ========================================================================

    fn print_identity(&self, identity: &WalletIdentity, state: &SessionState) -> anyhow::Result<()> {
        if self.format == OutputFormat::Json {
            return print_json(identity);
        }
        println!("Address:    {}", identity.address);
        println!("Role:       {}", identity.role);
        println!("Reputation: {:.1}", identity.reputation_score);
        if let Some(chain_id) = &state.chain_id {
            println!("Chain:      {}", chain_id);
        }
        println!("Route:      {}", state.route.path());
        Ok(())
    }

    fn print_state(&self, state: &SessionState) -> anyhow::Result<()> {
        if self.format == OutputFormat::Json {
            return print_json(state);
        }
        let account = state
            .account
            .as_deref()
            .map(short_address)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "[{}] {:<13} account={} chain={} route={}{}",
            chrono::Local::now().format("%H:%M:%S"),
            state.phase.to_string(),
            account,
            state.chain_id.as_deref().unwrap_or("-"),
            state.route.path(),
            state
                .error
                .as_deref()
                .map(|e| format!(" error=\"{}\"", e))
                .unwrap_or_default()
        );
        Ok(())
    }

    fn print_list<T: Serialize + TableRow>(
        &self,
        items: &[T],
        pagination: Option<Pagination>,
    ) -> anyhow::Result<()> {
        if self.format == OutputFormat::Json {
            return match pagination {
                Some(pagination) => print_json(&serde_json::json!({
                    "data": items,
                    "pagination": pagination,
                })),
                None => print_json(&items),
            };
        }

        if items.is_empty() {
            println!("No results.");
            return Ok(());
        }

        print_table(T::HEADERS, items.iter().map(TableRow::row).collect());
        if let Some(p) = pagination {
            println!();
            println!("Page {} of {} ({} total)", p.page, p.pages.max(1), p.total);
        }
        Ok(())
    }

    fn print_one<T: Serialize + TableRow>(&self, item: &T) -> anyhow::Result<()> {
        if self.format == OutputFormat::Json {
            return print_json(item);
        }
        for (header, value) in T::HEADERS.iter().zip(item.row()) {
            println!("{:<12} {}", format!("{}:", header), value);
        }
        Ok(())
    }

    fn print_done<T: Serialize + TableRow>(&self, message: &str, item: Option<&T>) -> anyhow::Result<()> {
        match (self.format, item) {
            (OutputFormat::Json, Some(item)) => print_json(item),
            (OutputFormat::Json, None) => print_json(&serde_json::json!({ "message": message })),
            (OutputFormat::Table, item) => {
                println!("{}", message);
                if let Some(item) = item {
                    println!();
                    self.print_one(item)?;
                }
                Ok(())
            }
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<String>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", line(headers.iter().map(|h| h.to_string()).collect()));
    println!("{}", "-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));
    for row in rows {
        println!("{}", line(row));
    }
}

/// Columns shown in table output
trait TableRow {
    const HEADERS: &'static [&'static str];
    fn row(&self) -> Vec<String>;
}

fn or_dash(value: Option<&str>) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or("-").to_string()
}

impl TableRow for Wallet {
    const HEADERS: &'static [&'static str] = &["ID", "Address", "Score", "Risk", "Role", "Tags"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.address.clone(),
            format!("{:.1}", self.reputation_score),
            self.risk_level().to_string(),
            or_dash(self.role.as_deref()),
            self.tags.join(", "),
        ]
    }
}

impl TableRow for Tag {
    const HEADERS: &'static [&'static str] = &["ID", "Name", "Category", "Type", "Active"];

    fn row(&self) -> Vec<String> {
        let category = self
            .category
            .as_ref()
            .map(|c| c.name.clone())
            .or_else(|| self.category_id.clone());
        vec![
            self.id.clone(),
            self.name.clone(),
            or_dash(category.as_deref()),
            or_dash(Some(&self.kind)),
            self.is_active.to_string(),
        ]
    }
}

impl TableRow for Category {
    const HEADERS: &'static [&'static str] = &["ID", "Name", "Type", "Active", "Description"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.kind.to_string(),
            self.is_active.to_string(),
            self.description.clone(),
        ]
    }
}

impl TableRow for Report {
    const HEADERS: &'static [&'static str] = &["ID", "Wallet", "Reporter", "Status", "Stake", "Tags"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.wallet_address.clone(),
            or_dash(Some(&self.reporter_address)),
            self.status.to_string(),
            self.stake_amount.to_string(),
            self.tags.join(", "),
        ]
    }
}

impl TableRow for Chain {
    const HEADERS: &'static [&'static str] = &["ID", "Name", "Chain ID", "RPC", "Explorer"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.chain_id.to_string(),
            or_dash(Some(&self.rpc_url)),
            or_dash(Some(&self.explorer_url)),
        ]
    }
}

impl TableRow for Setting {
    const HEADERS: &'static [&'static str] = &["ID", "Key", "Value", "Updated"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.key.clone(),
            self.value.clone(),
            or_dash(self.updated_at.as_deref()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_wallet_filters() {
        let cli = Cli::try_parse_from([
            "vigichain-admin",
            "--format",
            "json",
            "wallets",
            "list",
            "--risk",
            "high",
            "--search",
            "mixer",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Wallets {
                action: WalletCommand::List { risk, search, page, .. },
            } => {
                assert_eq!(risk, Some(RiskLevel::High));
                assert_eq!(search.as_deref(), Some("mixer"));
                assert_eq!(page, 1);
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_report_approval_args() {
        let cli = Cli::try_parse_from([
            "vigichain-admin",
            "reports",
            "approve",
            "r1",
            "--reason",
            "confirmed",
            "-t",
            "t1",
            "-t",
            "t2",
        ])
        .unwrap();

        match cli.command {
            Commands::Reports {
                action: ReportCommand::Approve { id, tags, .. },
            } => {
                assert_eq!(id, "r1");
                assert_eq!(tags, vec!["t1", "t2"]);
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_wallet_row() {
        let wallet = Wallet {
            id: "w1".into(),
            address: "0xabc".into(),
            reputation_score: 55.0,
            transaction_history: Vec::new(),
            tags: vec!["a".into(), "b".into()],
            role: None,
            last_analyzed: None,
            created_at: None,
            updated_at: None,
        };
        let row = wallet.row();
        assert_eq!(row.len(), Wallet::HEADERS.len());
        assert_eq!(row[3], "medium");
        assert_eq!(row[4], "-");
        assert_eq!(row[5], "a, b");
    }
}
