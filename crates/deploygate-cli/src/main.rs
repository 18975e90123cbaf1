mod client;
mod cmd;
mod duration;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::wait::{WaitArgs, EXIT_ERROR};
use cmd::{config::ConfigSubcommand, serve::ServeArgs, ServerArgs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "deploygate",
    about = "Gate risky deploys behind a human approve/deny decision",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: ./deploygate.yaml when present)
    #[arg(long, global = true, env = "DEPLOYGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the approval service
    Serve {
        #[command(flatten)]
        args: ServeArgs,
    },

    /// Request an approval and block until it is decided or the wait runs out
    ///
    /// Prints one JSON object {id, status} and exits 0 (approved),
    /// 1 (rejected), 2 (timed out) or 3 (error).
    Wait {
        #[command(flatten)]
        args: WaitArgs,
    },

    /// List an org's approvals
    List {
        #[command(flatten)]
        server: ServerArgs,
    },

    /// Inspect and validate configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    // Usage errors share the hard-error code so they never read as a
    // rejection or a timeout. Help and version still exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(EXIT_ERROR);
        }
    };

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Serve { args } => {
            root::load_config(config_path).and_then(|config| cmd::serve::run(config, args).map(|()| 0))
        }
        Commands::Wait { args } => cmd::wait::run(args),
        Commands::List { server } => cmd::list::run(server, cli.json).map(|()| 0),
        Commands::Config { subcommand } => {
            cmd::config::run(config_path, subcommand, cli.json).map(|()| 0)
        }
    };

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            // Print the full error chain (anyhow's alternate Display)
            eprintln!("error: {e:#}");
            std::process::exit(EXIT_ERROR);
        }
    }
}
