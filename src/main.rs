use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use stratus::account::ConfigAccountSource;
use stratus::config::Config;
use stratus::inventory::collector::{Collector, CollectorSettings};
use stratus::inventory::engine::InventoryEngine;
use stratus::inventory::query::ResourceFilter;
use stratus::inventory::resource::ResourceType;
use stratus::inventory::store::ResourceStore;
use stratus::provider::auth::{CachingCredentialProvider, KeyedCredentialProvider};

/// Version injected at compile time via STRATUS_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("STRATUS_VERSION") {
    Some(v) => v,
    None => "dev",
};

/// Multi-account cloud resource inventory
#[derive(Parser, Debug)]
#[command(name = "stratus", version = VERSION, about, long_about = None)]
struct Args {
    /// Provider API endpoint root (overrides the config file)
    #[arg(long)]
    endpoint: Option<String>,

    /// Alternate config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a collection cycle and merge the results into the stored inventory
    Refresh {
        /// Refresh a single account instead of all active accounts
        #[arg(short, long)]
        account: Option<String>,
    },
    /// Filter and page through the stored inventory
    Query {
        /// Account identifier (repeatable; any match)
        #[arg(long = "account")]
        accounts: Vec<String>,
        /// Region (repeatable; any match)
        #[arg(long = "region")]
        regions: Vec<String>,
        /// Resource type: compute, database, object-store, container-service,
        /// container-cluster, network (repeatable; any match)
        #[arg(long = "type")]
        types: Vec<String>,
        /// Status string as reported by the provider (repeatable; any match)
        #[arg(long = "status")]
        statuses: Vec<String>,
        /// Case-insensitive substring match on name or identifier
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        offset: Option<usize>,
    },
    /// Grouped counts by type, status, and region
    Summarize {
        #[arg(long = "account")]
        accounts: Vec<String>,
        #[arg(long = "region")]
        regions: Vec<String>,
        #[arg(long = "type")]
        types: Vec<String>,
        #[arg(long = "status")]
        statuses: Vec<String>,
        #[arg(long)]
        search: Option<String>,
    },
    /// List the configured accounts
    Accounts,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return None;
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {}: {e}", log_path.display());
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("stratus started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("stratus").join("stratus.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".stratus").join("stratus.log");
    }
    PathBuf::from("stratus.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    match args.command {
        Command::Accounts => {
            println!("{}", serde_json::to_string_pretty(&config.accounts)?);
        }
        Command::Refresh { account } => {
            let engine = build_engine(&config, args.endpoint.as_deref())?;
            let report = engine.refresh(account.as_deref()).await?;
            engine.store().save(&Config::state_path()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Query {
            accounts,
            regions,
            types,
            statuses,
            search,
            limit,
            offset,
        } => {
            let filter = ResourceFilter {
                account_ids: accounts,
                regions,
                resource_types: parse_types(&types)?,
                statuses,
                search,
                limit,
                offset,
            };
            let engine = build_engine(&config, args.endpoint.as_deref())?;
            let page = engine.query(&filter).await?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        Command::Summarize {
            accounts,
            regions,
            types,
            statuses,
            search,
        } => {
            let filter = ResourceFilter {
                account_ids: accounts,
                regions,
                resource_types: parse_types(&types)?,
                statuses,
                search,
                ..Default::default()
            };
            let engine = build_engine(&config, args.endpoint.as_deref())?;
            let summary = engine.summarize(&filter).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

fn build_engine(config: &Config, endpoint_override: Option<&str>) -> Result<InventoryEngine> {
    let endpoint = endpoint_override
        .map(str::to_string)
        .unwrap_or_else(|| config.endpoint.clone());
    if endpoint.is_empty() {
        anyhow::bail!(
            "No provider endpoint configured. Set 'endpoint' in the config file or pass --endpoint"
        );
    }

    let secrets = match &config.credentials_path {
        Some(path) => KeyedCredentialProvider::from_file(path)?,
        None => KeyedCredentialProvider::from_map(Default::default()),
    };
    let credentials = Arc::new(CachingCredentialProvider::new(secrets));

    let mut settings = CollectorSettings::from_config(config);
    settings.endpoint = endpoint;
    let collector = Collector::new(credentials, settings);

    let store = ResourceStore::load(&Config::state_path())?;
    let accounts = Arc::new(ConfigAccountSource::new(config.accounts.clone()));

    Ok(InventoryEngine::new(accounts, collector, store))
}

fn parse_types(raw: &[String]) -> Result<Vec<ResourceType>> {
    raw.iter()
        .map(|s| {
            s.parse::<ResourceType>().map_err(|_| {
                anyhow::anyhow!(
                    "unknown resource type '{s}' (expected one of: compute, database, \
                     object-store, container-service, container-cluster, network)"
                )
            })
        })
        .collect()
}
