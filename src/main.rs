use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use powerctl::atx::{ActionSequencer, GpioDriver, PinDriver, TargetRegistry};
use powerctl::config::{self, AppConfig};
use powerctl::session::Session;

/// Log level for the application
#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// powerctl command line arguments
#[derive(Parser, Debug)]
#[command(name = "powerctl")]
#[command(version, about = "Pulse power/reboot lines of machines over GPIO", long_about = None)]
struct CliArgs {
    /// Configuration file (default: ~/.config/powerctl/config.toml)
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); overrides the config file
    #[arg(short = 'l', long, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Action tokens to run without the menu (e.g. "11" = power on target 1)
    tokens: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    print_banner();

    // Config is loaded before logging is up so its log_level can apply
    let config_path = args.config.unwrap_or_else(config::default_config_path);
    let config = AppConfig::load(&config_path)?;

    init_logging(args.log_level, args.verbose, &config.log_level);

    tracing::info!("Starting powerctl v{}", env!("CARGO_PKG_VERSION"));
    if config_path.exists() {
        tracing::info!("Config file loaded from {}", config_path.display());
    } else {
        tracing::info!("No config file at {}, using defaults", config_path.display());
    }

    // Validate before any hardware line is claimed
    let registry = TargetRegistry::load(&config)?;

    let driver: Arc<dyn PinDriver> = Arc::new(GpioDriver::open(&config.gpio_chip)?);
    registry.configure_all(driver.as_ref())?;

    let sequencer = ActionSequencer::new(driver.clone(), registry.indicator_line());
    let session = Session::new(registry, sequencer);

    // An interrupt is a request to exit gracefully; whichever way the
    // session ends, the lines are released before the process does.
    let result = tokio::select! {
        result = run_session(&session, &args.tokens) => result,
        _ = tokio::signal::ctrl_c() => {
            println!();
            tracing::info!("Interrupt received, exiting");
            Ok(())
        }
    };

    driver.release_all();
    result?;
    Ok(())
}

/// Run the session in the mode the invocation selects
async fn run_session(session: &Session, tokens: &[String]) -> powerctl::Result<()> {
    if tokens.is_empty() {
        session.run_interactive(BufReader::new(tokio::io::stdin())).await
    } else {
        session.run_batch(tokens).await
    }
}

/// Initialize logging with tracing
///
/// Priority: `RUST_LOG` environment, then the CLI flag (with `-v` counts
/// escalating it), then the config file's `log_level`, then "info".
fn init_logging(cli_level: Option<LogLevel>, verbose_count: u8, config_level: &str) {
    let effective = match verbose_count {
        0 => cli_level.map(LogLevel::as_str),
        1 => Some("debug"),
        _ => Some("trace"),
    };
    let filter = format!("powerctl={}", effective.unwrap_or(config_level));

    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
    {
        eprintln!("failed to initialize tracing: {}", err);
    }
}

/// Print the cyan startup banner
fn print_banner() {
    let title = "- Power controller -";
    let rule = "-".repeat(title.len());
    println!("\n\x1b[96m{}\x1b[0m", rule);
    println!("\x1b[96m{}\x1b[0m", title);
    println!("\x1b[96m{}\x1b[0m\n", rule);
}
