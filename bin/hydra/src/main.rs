use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::{debug, error, info, warn};
use thiserror::Error;
use tokio::signal;

use config::{Config, ConfigError};
use presenter::{describe, render_detail, render_list, summarize_all, DisplayContext};
use route_client::{
    format_address, Availability, CachePolicy, ChainId, ClientError, FormState, HttpRouteApi,
    Preferences, RequestError, RouteQueryClient, RouteRequest, RouteSearch, TokenRegistry,
};
use storage::RedisClientError;

use crate::store::PreferenceBackend;

mod store;

const API_URL_ENV: &str = "HYDRA_API_URL";

#[derive(Parser, Debug)]
#[command(name = "hydra", about = "Compare cross-chain stablecoin bridge routes")]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List chains known to the backend
    Chains,
    /// List tokens the backend supports on a chain
    Tokens { chain: String },
    /// Check that the backend is reachable
    Health {
        /// Keep polling until interrupted
        #[arg(long)]
        watch: bool,
    },
    /// Search bridge routes
    Routes(RoutesArgs),
    /// Manage the stored token and chain selection
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[derive(clap::Args, Debug)]
struct RoutesArgs {
    #[arg(long)]
    token: Option<String>,
    /// Human decimal amount, e.g. 100 or 0.5
    #[arg(long)]
    amount: Option<String>,
    /// Origin chain id
    #[arg(long)]
    from: Option<String>,
    /// Destination chain id
    #[arg(long)]
    to: Option<String>,
    #[arg(long)]
    from_address: Option<String>,
    #[arg(long)]
    to_address: Option<String>,
    /// Swap origin and destination chains
    #[arg(long)]
    swap: bool,
    /// Ask the backend for its single best route
    #[arg(long)]
    best: bool,
    /// Show the full breakdown of route N from the list
    #[arg(long, value_name = "N")]
    details: Option<usize>,
    /// Ignore the stored selection
    #[arg(long)]
    use_defaults: bool,
}

#[derive(Subcommand, Debug)]
enum PrefsAction {
    Show,
    /// Store a selection; fields not given are taken from the current form
    Save {
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
    },
    Clear,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to load config file: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Preferences error: {0}")]
    Preferences(String),

    #[error("Redis error: {0}")]
    Redis(#[from] RedisClientError),

    #[error("There is no route #{0}; the search returned {1}")]
    NoSuchRoute(usize, usize),
}

type Client = RouteQueryClient<HttpRouteApi>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    simple_logger::SimpleLogger::new().env().init().unwrap();
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    debug!("Args: {:?}", cli);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    // Load configuration from yaml
    let mut config = Config::from_file(&cli.config)?;
    if let Ok(api_url) = std::env::var(API_URL_ENV) {
        info!("Using backend {} from {}", api_url, API_URL_ENV);
        config.api.base_url = api_url;
    }

    let api = HttpRouteApi::new(&config.api.base_url)?;
    let client = RouteQueryClient::new(Arc::new(api), CachePolicy::from(&config.cache));

    match cli.command {
        Command::Chains => list_chains(&client).await,
        Command::Tokens { chain } => list_tokens(&client, &ChainId::from(chain)).await,
        Command::Health { watch: false } => check_health(&client).await,
        Command::Health { watch: true } => {
            watch_health(client, Duration::from_secs(config.cache.health_poll_interval_sec)).await;
            Ok(())
        }
        Command::Routes(args) => {
            let form = if args.use_defaults {
                FormState::default()
            } else {
                store::restore_form_or_default(&config.preferences).await
            };
            find_routes(&config, client, form, args).await
        }
        Command::Prefs { action } => {
            let preferences = PreferenceBackend::build(&config.preferences).await?;
            manage_preferences(&preferences, action).await
        }
    }
}

async fn list_chains(client: &Client) -> Result<(), CliError> {
    for chain in client.list_chains().await?.iter() {
        println!("{:>8}  {}", chain.id, chain.label);
    }
    Ok(())
}

async fn list_tokens(client: &Client, chain: &ChainId) -> Result<(), CliError> {
    for token in client.list_tokens(chain).await?.iter() {
        let address = token.address_on(chain);
        println!("{:<6} {:>2} decimals  {}", token.symbol, token.decimals, format_address(address));
    }
    Ok(())
}

async fn check_health(client: &Client) -> Result<(), CliError> {
    let status = client.health_check().await?;
    println!("Backend is available: {}", status.status.as_deref().unwrap_or("ok"));
    Ok(())
}

async fn watch_health(client: Client, interval: Duration) {
    let mut poller = route_client::spawn_health_poller(client, interval);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = poller.availability.changed() => {
                if changed.is_err() {
                    warn!("Health poller stopped");
                    break;
                }
                match &*poller.availability.borrow_and_update() {
                    Availability::Available(status) => {
                        println!("available: {}", status.status.as_deref().unwrap_or("ok"))
                    }
                    Availability::Unavailable(reason) => println!("unavailable: {}", reason),
                    Availability::Unknown => {}
                }
            }
        }
    }

    poller.handle.abort();
    info!("Stopped watching backend health");
}

async fn find_routes(
    config: &Config,
    client: Client,
    mut form: FormState,
    args: RoutesArgs,
) -> Result<(), CliError> {
    if let Some(token) = args.token {
        form.token_symbol = token;
    }
    if let Some(amount) = args.amount {
        form.amount = amount;
    }
    if let Some(from) = args.from {
        form.from_chain = ChainId::from(from);
    }
    if let Some(to) = args.to {
        form.to_chain = ChainId::from(to);
    }
    if let Some(from_address) = args.from_address {
        form.from_address = from_address;
    }
    if let Some(to_address) = args.to_address {
        form.to_address = to_address;
    }
    if args.swap {
        form.swap_chains();
    }
    debug!("Searching with {:?}", form);

    let registry = TokenRegistry::from_config(config);
    let request = RouteRequest::build(&form, &registry)?;
    let token = registry
        .token(&form.token_symbol)
        .ok_or_else(|| RequestError::UnknownToken(form.token_symbol.clone()))?;
    let context = DisplayContext::new(token)
        .with_precision(config.display.list_decimals, config.display.detail_decimals);

    println!(
        "{} {} from {} to {}",
        form.amount,
        token.symbol,
        registry.chain_label(&form.from_chain),
        registry.chain_label(&form.to_chain)
    );

    let routes = if args.best {
        vec![client.find_best_route(&request).await?.as_ref().clone()]
    } else {
        let search = RouteSearch::new(client);
        let routes = search.submit(request).await?;
        if let Some(warning) = search.stale_warning().await {
            warn!("{}", warning);
        }
        routes.as_ref().clone()
    };

    print!("{}", render_list(&summarize_all(&routes, &context)));

    if let Some(index) = args.details {
        let route = index
            .checked_sub(1)
            .and_then(|index| routes.get(index))
            .ok_or(CliError::NoSuchRoute(index, routes.len()))?;
        println!();
        print!("{}", render_detail(&describe(route, &context)));
    }

    Ok(())
}

async fn manage_preferences(
    preferences: &PreferenceBackend,
    action: PrefsAction,
) -> Result<(), CliError> {
    match action {
        PrefsAction::Show => {
            let stored = preferences.load().await;
            if stored.is_empty() {
                println!("No preferences stored");
            } else {
                println!("token: {}", stored.token_symbol.as_deref().unwrap_or("-"));
                println!("from:  {}", stored.from_chain.as_ref().map_or("-", ChainId::as_str));
                println!("to:    {}", stored.to_chain.as_ref().map_or("-", ChainId::as_str));
            }
        }
        PrefsAction::Save { token, from, to } => {
            let mut form = preferences.restore_form().await;
            if let Some(token) = token {
                form.token_symbol = token;
            }
            if let Some(from) = from {
                form.from_chain = ChainId::from(from);
            }
            if let Some(to) = to {
                form.to_chain = ChainId::from(to);
            }
            preferences.save(&Preferences::from_form(&form)).await?;
            println!("Saved {} from {} to {}", form.token_symbol, form.from_chain, form.to_chain);
        }
        PrefsAction::Clear => {
            preferences.clear().await?;
            println!("Preferences cleared");
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Unable to handle ctrl+c: {}", err);
        }
    };
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("Failed to install signal handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("signal received, shutting down");
}
