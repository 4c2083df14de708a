use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use std::{fmt::Debug, path::PathBuf};
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use promo_server::config::{AppConfig, CliConfig, FileConfig};
use promo_server::error::DomainError;
use promo_server::events::SqliteEventStore;
use promo_server::mailer::LogMailer;
use promo_server::media::LocalMediaStore;
use promo_server::profile::SqliteProfileStore;
use promo_server::server::run_server;
use promo_server::{marketplace_db, Role, RequestsLoggingLevel, SqliteUserStore, UserManager};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the SQLite database files (user.db, marketplace.db).
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Directory for uploaded profile images. Defaults to <db_dir>/media.
    #[clap(long, value_parser = parse_path)]
    pub media_path: Option<PathBuf>,

    /// Path to an optional TOML config file. Its values override the CLI.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Number of days a session token stays valid.
    #[clap(long, default_value_t = 30)]
    pub session_ttl_days: u64,

    /// Interval in hours between expired-session pruning runs.
    #[clap(long, default_value_t = 24)]
    pub prune_interval_hours: u64,

    /// Ensure an admin account with this email exists at startup.
    /// Requires --admin-password. Signup never creates admins.
    #[clap(long)]
    pub admin_email: Option<String>,

    /// Password for the admin account created via --admin-email.
    #[clap(long)]
    pub admin_password: Option<String>,
}

fn seed_admin_account(config: &AppConfig, email: &str, password: &str) -> Result<()> {
    let store = SqliteUserStore::new(config.user_db_path())?;
    let manager = UserManager::new(Box::new(store));
    match manager.register(email, password, Role::Admin) {
        Ok(()) => info!("Created admin account {}", email),
        Err(DomainError::DuplicateIdentity) => info!("Admin account {} already exists", email),
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let cli_config = CliConfig {
        db_dir: cli_args.db_dir,
        media_path: cli_args.media_path,
        port: cli_args.port,
        logging_level: cli_args.logging_level,
        frontend_dir_path: cli_args.frontend_dir_path,
        session_ttl_days: cli_args.session_ttl_days,
        prune_interval_hours: cli_args.prune_interval_hours,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    if let (Some(email), Some(password)) = (&cli_args.admin_email, &cli_args.admin_password) {
        seed_admin_account(&config, email, password)?;
    }

    info!("Opening SQLite databases in {:?}...", config.db_dir);
    let user_store = Box::new(SqliteUserStore::new(config.user_db_path())?);
    let marketplace_conn = marketplace_db::open(config.marketplace_db_path())?;
    let profile_store = Arc::new(SqliteProfileStore::new(marketplace_conn.clone()));
    let event_store = Arc::new(SqliteEventStore::new(marketplace_conn));
    let media_store = Arc::new(LocalMediaStore::new(&config.media_path));
    let mailer = Arc::new(LogMailer);

    // Background pruning of expired session tokens, on its own connection
    if config.prune_interval_hours > 0 {
        let interval_hours = config.prune_interval_hours;
        let ttl_days = config.session_ttl_days;
        let pruning_manager =
            UserManager::new(Box::new(SqliteUserStore::new(config.user_db_path())?));

        info!(
            "Session pruning enabled: {} day TTL, pruning every {} hours",
            ttl_days, interval_hours
        );

        tokio::spawn(async move {
            let interval = Duration::from_secs(interval_hours * 60 * 60);
            let mut ticker = tokio::time::interval(interval);

            // Skip the first immediate tick, wait for the first interval
            ticker.tick().await;

            loop {
                ticker.tick().await;

                match pruning_manager.prune_expired_auth_tokens(ttl_days) {
                    Ok(count) => {
                        if count > 0 {
                            info!("Pruned {} expired session tokens", count);
                        }
                    }
                    Err(e) => {
                        error!("Failed to prune session tokens: {}", e);
                    }
                }
            }
        });
    }

    info!("Ready to serve at port {}!", config.port);
    run_server(
        user_store,
        profile_store,
        event_store,
        media_store,
        mailer,
        config.logging_level,
        config.port,
        config.frontend_dir_path,
        config.session_ttl_days,
    )
    .await
}
