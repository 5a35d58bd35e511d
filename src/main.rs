use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prompt_refiner::cli::{CommandContext, Output, commands};
use prompt_refiner::extract::parser_panic_contained;

#[derive(Parser)]
#[command(name = "prompt-refiner")]
#[command(
    version,
    about = "Turn rough prompts and attachments into structured prompt specifications"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, help = "Config file (default: ./prompt-refiner.toml)")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve POST /refine-prompt
    Serve {
        #[arg(long, help = "Listen address override")]
        host: Option<String>,
        #[arg(long, short, help = "Listen port override")]
        port: Option<u16>,
    },

    /// List drafting models and show which one would be selected
    Models,

    /// Refine a prompt once and print the result
    Refine {
        #[arg(help = "The rough prompt to refine")]
        prompt: String,
        #[arg(long = "file", short, help = "Attachment (PDF, Word or image); repeatable")]
        files: Vec<PathBuf>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        // Caught by the PDF extractor and logged as a parse failure
        if parser_panic_contained() {
            return;
        }

        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mprompt-refiner encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Output::default().error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    // Credentials may live in .env; a missing file is fine
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let output = Output::new(cli.quiet);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve { host, port } => {
            let ctx = CommandContext::load(config_path)?;
            let rt = Runtime::new()?;
            rt.block_on(commands::serve::run(ctx, host, port, &output))?;
        }
        Commands::Models => {
            let ctx = CommandContext::load(config_path)?;
            let rt = Runtime::new()?;
            rt.block_on(commands::models::run(&ctx, &output))?;
        }
        Commands::Refine { prompt, files } => {
            let ctx = CommandContext::load(config_path)?;
            let rt = Runtime::new()?;
            rt.block_on(commands::refine::run(&ctx, &prompt, &files, &output))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                commands::config::show(config_path, &format, &output)?;
            }
            ConfigAction::Path => {
                commands::config::path(config_path, &output)?;
            }
        },
    }

    Ok(())
}
