use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

use phpintel::scan::{self, LogStatusSink};
use phpintel::{Backend, Config, ProjectContext};

/// Lightweight PHP code intelligence.
///
/// Without a subcommand, serves the Language Server Protocol on stdio.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Extra configuration file layered over the user and project files.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Scan project roots and (re)write their index files.
    Scan {
        /// Project roots to scan (defaults to the current directory).
        roots: Vec<PathBuf>,
    },
    /// Print completion candidates for a position in a file.
    Complete {
        /// PHP file whose contents are used as the buffer.
        #[arg(long)]
        file: PathBuf,
        /// Byte offset of the cursor.
        #[arg(long)]
        offset: usize,
        /// Project roots to query (defaults to the current directory).
        #[arg(long = "root")]
        roots: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        None => {
            let config_path = cli.config;
            let (service, socket) =
                LspService::new(move |client| Backend::with_config_override(client, config_path));
            Server::new(tokio::io::stdin(), tokio::io::stdout(), socket)
                .serve(service)
                .await;
            ExitCode::SUCCESS
        }
        Some(Command::Scan { roots }) => run_scan(default_roots(roots), cli.config).await,
        Some(Command::Complete { file, offset, roots }) => {
            run_complete(&file, offset, default_roots(roots), cli.config)
        }
    }
}

fn default_roots(roots: Vec<PathBuf>) -> Vec<PathBuf> {
    if roots.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        roots
    }
}

async fn run_scan(roots: Vec<PathBuf>, config_path: Option<PathBuf>) -> ExitCode {
    let config = Config::load(roots.first().map(PathBuf::as_path), config_path.as_deref());
    let project = ProjectContext::with_roots(config.index_file.clone(), roots);
    let interval = config.progress_interval();

    let sink = std::sync::Arc::new(LogStatusSink);
    let ok = scan::run_with_progress("Scanning project", sink, interval, move |events| {
        scan::scan_project(&project, &config, events).map(|_| ())
    })
    .await;

    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn run_complete(
    file: &std::path::Path,
    offset: usize,
    roots: Vec<PathBuf>,
    config_path: Option<PathBuf>,
) -> ExitCode {
    let buffer = match std::fs::read_to_string(file) {
        Ok(buffer) => buffer,
        Err(e) => {
            tracing::error!("cannot read {}: {}", file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let config = Config::load(roots.first().map(PathBuf::as_path), config_path.as_deref());
    let project = ProjectContext::with_roots(config.index_file.clone(), roots);
    let canonical = std::fs::canonicalize(file).unwrap_or_else(|_| file.to_path_buf());

    match phpintel::on_completion_requested(&buffer, offset, Some(&canonical), &project) {
        Some(candidates) => {
            for candidate in candidates {
                println!("{}\t{}", candidate.label(), candidate.snippet);
            }
            ExitCode::SUCCESS
        }
        None => {
            tracing::warn!("no indexed project root; run `phpintel scan` first");
            ExitCode::FAILURE
        }
    }
}
