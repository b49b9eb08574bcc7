//! graft CLI

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use graft_cli::cmd;
use graft_cli::{Cli, Commands, GlobalOpts};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (stderr, RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let opts = GlobalOpts::from(&cli);

    // Ctrl-C aborts in-flight registry requests
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("interrupt received, cancelling");
            on_signal.cancel();
        }
    });

    match cli.command {
        Commands::Init {
            implementation,
            force,
        } => cmd::init::init(&opts, implementation.as_deref(), force).await,
        Commands::List { query } => cmd::list::list(&opts, cancel, query.as_deref()).await,
        Commands::Add { names, force } => cmd::add::add(&opts, cancel, &names, force).await,
        Commands::Diff { names, force } => cmd::diff::diff(&opts, cancel, &names, force).await,
        Commands::Info { name } => cmd::info::info(&opts, cancel, &name).await,
        Commands::Completions { shell } => {
            cmd::completions::completions(shell);
            Ok(())
        }
    }
}
