use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use relpack::Config;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

mod commands;

/// relpack - Build release packages from NuGet-style application packages
#[derive(Parser)]
#[command(name = "relpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a release package from an application package
    Release {
        /// Application package (.nupkg)
        input: PathBuf,

        /// Output file or directory (defaults to {id}-{version}-full.nupkg next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory holding dependency packages (overrides store.packages_dir)
        #[arg(short, long)]
        packages: Option<PathBuf>,
    },

    /// Show the target platform and resolved dependencies of a package
    Deps {
        /// Application package (.nupkg)
        input: PathBuf,

        /// Directory holding dependency packages (overrides store.packages_dir)
        #[arg(short, long)]
        packages: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., store.packages_dir)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cli, &config);

    let result = match cli.command {
        Commands::Release {
            input,
            output,
            packages,
        } => commands::release::run(input, output, packages, &config),
        Commands::Deps { input, packages } => commands::deps::run(input, packages, &config),
        Commands::Config { action } => commands::config::run(&action, config),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "relpack", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log level from the flags, else from `log.level`; `RUST_LOG` wins over both
fn init_tracing(cli: &Cli, config: &Config) {
    let level = match cli.verbose {
        0 if cli.quiet => LevelFilter::ERROR,
        0 => config.log.level.parse().unwrap_or(LevelFilter::WARN),
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
