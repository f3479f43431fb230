use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use cabinet_api::{ApiClient, LoginForm, city_options_html, format_role_date};
use clap::{Parser, Subcommand};
use config::{AppConfig, ConfigStore};
use i18n::I18n;
use navigation::{HttpNavigationBackend, MemoryHost, NavigationHelper, NavigationSettings};
use page_controller::{PageController, Rejection};
use session::{SessionStore, default_session_dir_from};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

pub const SESSION_PASSWORD_ENV: &str = "CABINET_SESSION_PASSWORD";

#[derive(Parser, Debug)]
#[command(name = "cabinet")]
#[command(about = "Cabinet management front end from the terminal")]
pub struct CabinetCli {
    /// Directory holding config.json. Defaults to the platform config dir.
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// List every route the server knows about
    Routes,
    /// Print the navigation menu as HTML, highlighting `path`
    Menu {
        #[arg(long, default_value = "/")]
        path: String,
    },
    /// Print the breadcrumb for `path` as HTML
    Breadcrumb {
        #[arg(long, default_value = "/")]
        path: String,
    },
    /// Print the city `<option>` list
    Cities,
    /// Sign in and keep the session token
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Show the signed-in user
    Whoami,
    /// End the session
    Logout,
    /// List roles
    Roles,
}

pub fn run() -> Result<()> {
    let cli = CabinetCli::parse();

    let mut data_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    data_dir.push("cabinet");
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to prepare {}", data_dir.display()))?;
    let _log_guard = init_local_logger(&data_dir.join("logs"));

    let config_store = match &cli.config_dir {
        Some(dir) => ConfigStore::from_dir(dir),
        None => ConfigStore::from_default_location()?,
    };
    let config = match config_store.load_or_init() {
        Ok(config) => config,
        Err(err) => {
            error!("failed to load config: {err:#}");
            AppConfig::default()
        }
    };

    let mut session = SessionStore::new(default_session_dir_from(&data_dir));
    if config.session.encrypt_at_rest {
        let password = std::env::var(SESSION_PASSWORD_ENV).with_context(|| {
            format!("session encryption is enabled but {SESSION_PASSWORD_ENV} is not set")
        })?;
        session.set_password(Some(password));
    }
    debug!(encrypted = session.is_encrypted_mode(), "session store ready");

    let runtime = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
    runtime.block_on(execute(cli.command, &config, session))
}

async fn execute(command: Commands, config: &AppConfig, session: SessionStore) -> Result<()> {
    let pathname = match &command {
        Commands::Menu { path } | Commands::Breadcrumb { path } => page_pathname(config, path),
        _ => page_pathname(config, "/"),
    };
    let controller = build_controller(config, session, &pathname)?;
    let navigation = controller.navigation();
    info!(?command, server = config.server_root(), "running command");

    match command {
        Commands::Routes => {
            let manifest = navigation.load_routes().await?;
            for page in &manifest.all_routes {
                println!("{}\t{}", page.route, page.title);
            }
        }
        Commands::Menu { .. } => println!("{}", navigation.navigation_html().await),
        Commands::Breadcrumb { .. } => println!("{}", navigation.breadcrumb_html().await),
        Commands::Cities => println!("{}", city_options_html()),
        Commands::Login { username, password } => {
            let alert = controller
                .login(&LoginForm { username, password })
                .await
                .map_err(rejection_error)?;
            println!("{alert}");
        }
        Commands::Whoami => match controller.header_info().await? {
            Some(header) => println!("{} ({})", header.full_name, header.role),
            None => bail!("not logged in"),
        },
        Commands::Logout => {
            controller.logout().await;
            println!("logged out");
        }
        Commands::Roles => {
            let roles = controller.load_roles().await.map_err(rejection_error)?;
            for role in roles {
                println!(
                    "{}\t{}\t{}\t{}",
                    role.id,
                    role.name,
                    role.status,
                    format_role_date(role.created_at.as_deref())
                );
            }
        }
    }
    Ok(())
}

fn build_controller(
    config: &AppConfig,
    session: SessionStore,
    pathname: &str,
) -> Result<PageController> {
    let settings = NavigationSettings {
        base_path: config.base_path.clone(),
        title_suffix: config.title_suffix.clone(),
        link_mode: config.link_mode,
    };
    let backend = HttpNavigationBackend::new(
        config.server_root(),
        &settings.base_path,
        config.request_timeout(),
    )?;
    let host = Arc::new(MemoryHost::new(config.server_root(), pathname));
    let navigation = Arc::new(NavigationHelper::new(settings, Arc::new(backend), host));
    let api = ApiClient::new(config.server_root(), config.request_timeout())?;
    Ok(PageController::new(
        navigation,
        api,
        session,
        I18n::new(config.language),
    ))
}

/// Location of the page showing `route` under the configured base.
fn page_pathname(config: &AppConfig, route: &str) -> String {
    format!(
        "{}{}",
        config.base_path.trim_end_matches('/'),
        navigation::normalize_route(route)
    )
}

fn rejection_error(rejection: Rejection) -> anyhow::Error {
    anyhow::anyhow!("{rejection}")
}

pub fn init_local_logger(log_dir: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    if let Err(err) = fs::create_dir_all(log_dir) {
        eprintln!("failed to create log dir `{}`: {err}", log_dir.display());
    }
    let file_appender = tracing_appender::rolling::daily(log_dir, "cabinet.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cabinet_cli=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .json()
        .with_writer(writer)
        .init();

    guard
}
