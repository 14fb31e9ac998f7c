use clap::Parser;
use commons_archivist::{Archiver, Args, Config, ExitCode, cancel_on_signal};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "commons-archivist")]
#[command(about = "Archive media files and their credits from Wikimedia Commons")]
#[command(long_about = "\
Archive media files and their credits from Wikimedia Commons

Each input is a file page title such as 'File:Example.jpg'. Files are saved
under the destination directory using the title without its namespace, and
one credit line per file can be merged into a Markdown index.

Exit status is a bit set:
   1  generic error (a stage aborted)
   2  query stage failed
   4  fetch stage failed
   8  index stage failed
  16  some queries failed and were ignored
  32  some fetches failed and were ignored")]
#[command(version)]
struct Cli {
    /// File page titles to archive
    #[arg(required = true, value_name = "TITLE")]
    inputs: Vec<String>,

    /// Destination directory for fetched files
    #[arg(short, long)]
    dest: PathBuf,

    /// Markdown index to create or update with credit lines
    #[arg(short, long)]
    index: Option<PathBuf>,

    /// Keep going when individual files fail to query or fetch
    #[arg(long)]
    ignore_individual_errors: bool,

    /// JSON configuration file (API endpoint, user agent, batching)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Contact email or URL sent in the User-Agent (overrides the config file)
    #[arg(long, value_name = "EMAIL_OR_URL")]
    contact: Option<String>,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "commons_archivist=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match Config::from_file(path).await {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, path = %path.display(), "Failed to load config");
                return ExitCode::GENERIC_ERROR.into();
            }
        },
        None => Config::default(),
    };
    if let Some(contact) = cli.contact {
        config.contact = Some(contact);
    }
    if config.contact.is_none() {
        tracing::warn!(
            "No contact configured; Wikimedia asks API clients to identify themselves (use --contact)"
        );
    }

    let token = CancellationToken::new();
    let archiver = match Archiver::from_config(config, token.clone()) {
        Ok(archiver) => archiver,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start");
            return ExitCode::GENERIC_ERROR.into();
        }
    };
    let signals = tokio::spawn(cancel_on_signal(token.clone()));

    let mut args =
        Args::new(cli.inputs, cli.dest).ignore_individual_errors(cli.ignore_individual_errors);
    if let Some(index) = cli.index {
        args = args.with_index(index);
    }

    let exit_code = archiver.run(&args).await;

    token.cancel();
    signals.await.ok();

    exit_code.into()
}
