use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use confstack::cli::commands::{
    load::{self, LoadOptions},
    settings as settings_cmd,
};

#[derive(Parser)]
#[command(name = "confstack")]
#[command(
    version,
    about = "Assemble one configuration from objects, files, environment, HTTP and record stores"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load layers and print the merged configuration
    Load {
        #[arg(help = "Layers file (JSON, YAML or TOML)")]
        layers: PathBuf,
        #[arg(long, help = "JSON schema file the configuration must satisfy")]
        schema: Option<PathBuf>,
        #[arg(
            short = 'f',
            long,
            default_value = "json",
            help = "Output format: json, yaml"
        )]
        format: String,
        #[arg(long, help = "Print only the value at this path (e.g. option2.cle1)")]
        get: Option<String>,
        #[arg(long, requires = "get", help = "Value printed when --get finds nothing")]
        default: Option<String>,
        #[arg(long, env = "CONFSTACK_SETTINGS", help = "Settings file")]
        settings: Option<PathBuf>,
    },

    /// Inspect confstack settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Show effective settings (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json"
        )]
        format: String,
        #[arg(long, env = "CONFSTACK_SETTINGS", help = "Settings file")]
        settings: Option<PathBuf>,
    },
    /// Show settings file paths
    Path {
        #[arg(long, env = "CONFSTACK_SETTINGS", help = "Settings file")]
        settings: Option<PathBuf>,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mconfstack encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Load {
            layers,
            schema,
            format,
            get,
            default,
            settings,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(load::run(LoadOptions {
                layers,
                schema,
                format,
                get,
                default,
                settings,
                quiet: cli.quiet,
            }))?;
        }
        Commands::Settings { action } => match action {
            SettingsAction::Show { format, settings } => {
                settings_cmd::show(&format, settings.as_deref())?;
            }
            SettingsAction::Path { settings } => {
                settings_cmd::path(settings.as_deref())?;
            }
        },
    }

    Ok(())
}
