// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{debug, error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use vitessorm::app_config::{self, Config};
use vitessorm::database::{Connector, SqliteConnector};
use vitessorm::session::{Provider, ProviderRegistry, VitessProvider, PROVIDER_NAME};
use vitessorm::Orm;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "vitessorm", version, about = "Database alias and session store maintenance")]
struct CommandLineOptions {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register every configured alias and report what was detected
    Check,

    /// Create the session table if it does not exist
    InitSessions,

    /// Delete expired sessions
    Gc {
        /// Keep running, collecting every interval until Ctrl-C
        #[arg(short, long)]
        watch: bool,

        /// Seconds between runs in watch mode (overrides the config)
        #[arg(short, long, requires = "watch")]
        interval: Option<u64>,
    },

    /// Print the number of stored sessions
    Count,

    /// Generate shell completions for vitessorm
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// @struct: Custom logger implementation
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and tag for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, tag) = Self::style_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {} {}\x1B[0m",
                color,
                now,
                tag,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // The level is updated after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "vitessorm", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli.config_path, cli.log_level.clone())?;
    log::set_max_level(config.log_level.to_level_filter());

    let connector: Arc<dyn Connector> = Arc::new(SqliteConnector::new());

    match cli.command {
        Commands::Check => run_check(&config, connector),
        Commands::InitSessions => {
            let provider = build_provider(&config, connector)?;
            provider.ensure_table()?;
            Ok(())
        }
        Commands::Gc { watch, interval } => {
            let provider = session_provider(&config, connector)?;
            if watch {
                let secs = interval.unwrap_or(config.session.gc_interval_secs).max(1);
                run_gc_loop(provider, Duration::from_secs(secs)).await
            } else {
                let removed = provider.gc()?;
                println!("{}", removed);
                Ok(())
            }
        }
        Commands::Count => {
            let provider = session_provider(&config, connector)?;
            println!("{}", provider.count()?);
            Ok(())
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    }
}

/// Load the config file, creating a default one when missing
fn load_config(config_path: &str, log_level: Option<CliLogLevel>) -> Result<Config> {
    let mut config = if Path::new(config_path).exists() {
        Config::from_file(config_path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        config.save(config_path)?;
        config
    };

    // Command line log level wins over the file
    if let Some(log_level) = log_level {
        config.log_level = log_level.into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

fn run_check(config: &Config, connector: Arc<dyn Connector>) -> Result<()> {
    let orm = Orm::new(connector);
    let mut failures = 0;

    for db in &config.databases {
        if let Err(e) = db.register(&orm) {
            debug!("Skipping alias `{}`: {}", db.alias, e);
            failures += 1;
        }
    }

    for name in orm.alias_names() {
        let alias = orm.alias(&name)?;
        println!(
            "{:<16} {:<8} tz={:<8} engine={:<8} idle={} open={}",
            alias.name(),
            alias.driver_type(),
            alias.timezone().to_string(),
            alias.engine(),
            alias.max_idle_conns(),
            alias.max_open_conns()
        );
    }

    if failures > 0 {
        anyhow::bail!("{} of {} aliases failed to register", failures, config.databases.len());
    }
    Ok(())
}

/// Concrete provider configured from `config.session`
fn build_provider(config: &Config, connector: Arc<dyn Connector>) -> Result<Arc<VitessProvider>> {
    let provider = VitessProvider::new(connector).with_table(&config.session.table_name);
    provider.init(config.session.max_lifetime_secs, &config.session.save_path)?;
    Ok(Arc::new(provider))
}

/// Provider selected by `config.session.provider`
fn session_provider(config: &Config, connector: Arc<dyn Connector>) -> Result<Arc<dyn Provider>> {
    let registry = ProviderRegistry::new();
    registry.register(PROVIDER_NAME, build_provider(config, connector)?)?;
    Ok(registry.get(&config.session.provider)?)
}

async fn run_gc_loop(provider: Arc<dyn Provider>, every: Duration) -> Result<()> {
    info!("Collecting expired sessions every {}s, Ctrl-C to stop", every.as_secs());
    let mut ticker = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let provider = Arc::clone(&provider);
                let outcome = tokio::task::spawn_blocking(move || provider.gc())
                    .await
                    .context("Session GC task panicked")?;
                match outcome {
                    Ok(removed) => debug!("Session GC pass removed {} rows", removed),
                    Err(e) => error!("Session GC failed: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping session GC");
                return Ok(());
            }
        }
    }
}
