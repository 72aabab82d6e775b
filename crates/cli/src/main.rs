mod check;
mod fill;
mod inspect;
mod serve;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Form fill engine toolchain.
#[derive(Parser)]
#[command(name = "opforms", version, about = "Form fill engine toolchain")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill a form interactively on the terminal
    Fill {
        /// Path to the form definition JSON
        form: PathBuf,
        /// Write the submitted response JSON to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Check a form definition for parse and workflow problems
    Check {
        /// Path to the form definition JSON
        form: PathBuf,
    },

    /// Print a structural summary of a form definition
    Inspect {
        /// Path to the form definition JSON
        form: PathBuf,
    },

    /// Start the HTTP API server
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,
        /// Form definition JSON files to pre-load
        #[arg()]
        forms: Vec<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let exit = match cli.command {
        Commands::Fill { form, out } => fill::cmd_fill(&form, out.as_deref()),
        Commands::Check { form } => check::cmd_check(&form, cli.output),
        Commands::Inspect { form } => inspect::cmd_inspect(&form, cli.output),
        Commands::Serve { port, forms } => {
            let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
            match rt.block_on(serve::start_server(port, forms)) {
                Ok(()) => 0,
                Err(e) => {
                    eprintln!("error: {}", e);
                    1
                }
            }
        }
    };
    process::exit(exit);
}

/// Load and parse a form definition file. Errors go to stderr; the caller
/// turns the `None` into a non-zero exit.
pub(crate) fn load_form(path: &std::path::Path) -> Option<opforms_engine::Form> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("error: cannot read {}: {}", path.display(), e);
            return None;
        }
    };
    let doc: serde_json::Value = match serde_json::from_str(&raw) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("error: {} is not valid JSON: {}", path.display(), e);
            return None;
        }
    };
    match opforms_engine::Form::from_json(&doc) {
        Ok(form) => Some(form),
        Err(e) => {
            eprintln!("error: invalid form definition: {}", e);
            None
        }
    }
}
