use clap::{Args, Parser, Subcommand};
use eshop_monitor::config::{ConfigLoader, ConfigOverrides};
use eshop_monitor::fetcher::ReqwestFetcher;
use eshop_monitor::monitor::Monitor;
use eshop_monitor::output::{
    self, OutputHandler, console::ConsoleOutput, json::JsonOutput, key_value::KeyValueFileOutput,
};
use eshop_monitor::state::{StateLookup, StateStore};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "eshop-monitor")]
#[command(version = "0.1.0")]
#[command(about = "Watches a page for a numeric value and reports when it changes", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one monitoring cycle (the default)
    Run(RunArgs),
    /// Validate a configuration file
    Check {
        /// Path to the configuration file (JSON/YAML/TOML)
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the persisted state record
    State {
        /// Path to the configuration file (JSON/YAML/TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// State file to read instead of the configured one
        #[arg(long)]
        state_path: Option<PathBuf>,
    },
}

#[derive(Args, Clone)]
struct RunArgs {
    /// Path to the configuration file (JSON/YAML/TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Page to monitor
    #[arg(long)]
    url: Option<String>,

    /// `id` of the span holding the value
    #[arg(long)]
    element_id: Option<String>,

    /// Where the last observed value is kept
    #[arg(long)]
    state_path: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Exit with status 1 when the check fails
    #[arg(long)]
    fail_on_error: bool,

    /// Also write the run result as JSON to this file
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Persistent environment file (upper-case keys) [default: $GITHUB_ENV]
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Step output file (lower-case keys) [default: $GITHUB_OUTPUT]
    #[arg(long)]
    output_file: Option<PathBuf>,
}

/// Sink path from the scheduler's environment. Unset and empty both mean
/// "not running under the scheduler".
fn sink_from_env(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

impl RunArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            url: self.url.clone(),
            element_id: self.element_id.clone(),
            state_path: self.state_path.clone(),
            timeout_secs: self.timeout_secs,
            fail_on_error: self.fail_on_error,
            summary_path: self.summary.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run(cli.run)) {
        Commands::Run(args) => {
            let config = ConfigLoader::resolve(args.config.as_deref(), args.overrides())?;
            log::debug!("Effective config: {:?}", config);

            let fetcher = Arc::new(ReqwestFetcher::new(&config));
            let fail_on_error = config.fail_on_error;
            let summary_path = config.summary_path.clone();
            let monitor = Monitor::new(config, fetcher);

            let result = monitor.run().await;

            let mut handlers: Vec<Box<dyn OutputHandler>> = vec![
                Box::new(ConsoleOutput::default()),
                Box::new(KeyValueFileOutput::env(
                    args.env_file.or_else(|| sink_from_env("GITHUB_ENV")),
                )),
                Box::new(KeyValueFileOutput::step_output(
                    args.output_file.or_else(|| sink_from_env("GITHUB_OUTPUT")),
                )),
            ];
            if let Some(path) = summary_path {
                handlers.push(Box::new(JsonOutput::new(path)));
            }
            output::emit_all(&mut handlers, &result).await;

            // Failures are reported through the sinks; the scheduled job only
            // fails when explicitly asked to.
            if result.is_error() && fail_on_error {
                std::process::exit(1);
            }
        }
        Commands::Check { config } => match ConfigLoader::load(&config) {
            Ok(cfg) => {
                println!("✅ Config is valid:");
                println!("   URL: {}", cfg.url);
                println!("   Element id: {}", cfg.element_id);
                println!("   State file: {}", cfg.state_path.display());
                println!("   Timeout: {}s", cfg.timeout_secs);
            }
            Err(e) => {
                eprintln!("❌ Config error: {}", e);
                std::process::exit(1);
            }
        },
        Commands::State { config, state_path } => {
            let cfg = ConfigLoader::resolve(
                config.as_deref(),
                ConfigOverrides {
                    state_path,
                    ..Default::default()
                },
            )?;
            let store = StateStore::new(cfg.state_path);
            match store.read() {
                StateLookup::Found(record) => {
                    println!("{}", serde_json::to_string_pretty(&record)?);
                }
                StateLookup::Absent => {
                    println!("No state recorded at {}", store.path().display());
                }
            }
        }
    }

    Ok(())
}
