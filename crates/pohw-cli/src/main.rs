//! pohw-cli
//!
//! Operator CLI for a running PoHW registry node. Talks to `pohw-node`'s
//! JSON-RPC surface; does not touch the store or chain state directly.
//!
//! Usage:
//!   pohw-cli start   [--node-binary <path>] [--config <path>] [--data-dir <path>]
//!   pohw-cli batch   [--rpc <url>]
//!   pohw-cli anchor  --batch-id <id> [--rpc <url>]
//!   pohw-cli sync    [--rpc <url>]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::info;

mod rpc_client;
use rpc_client::RegistryRpcClient;

#[derive(Parser, Debug)]
#[command(name = "pohw-cli", version, about = "Operator CLI for a PoHW registry node")]
struct Args {
    /// Node RPC endpoint.
    #[arg(long, global = true, default_value = "http://127.0.0.1:9944")]
    rpc: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a registry node as a foreground child process.
    Start {
        /// Path to the `pohw-node` binary. Defaults to a sibling on PATH.
        #[arg(long, default_value = "pohw-node")]
        node_binary: PathBuf,
        /// Registry config JSON, forwarded to `pohw-node --config`.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Store directory, forwarded to `pohw-node --data-dir`.
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Request an immediate batch drain.
    Batch,

    /// Request an anchor attempt for an already-drained batch.
    Anchor {
        /// Batch id to anchor.
        #[arg(long)]
        batch_id: String,
    },

    /// Request an immediate, out-of-cycle peer sync.
    Sync,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter("warn,pohw_cli=info").init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::from(0),
        Err(CliError::Fatal(err)) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
        Err(CliError::Network(err)) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

/// §6 exit codes: 0 success, 1 fatal config/store error, 2 network failure
/// surfaced to the operator.
enum CliError {
    Fatal(anyhow::Error),
    Network(anyhow::Error),
}

async fn run(args: Args) -> Result<(), CliError> {
    match args.command {
        Command::Start { node_binary, config, data_dir } => cmd_start(node_binary, config, data_dir),

        Command::Batch => {
            let client = RegistryRpcClient::new(&args.rpc);
            let result = client.request_batch().await.map_err(CliError::Network)?;
            if result.is_null() {
                println!("No pending attestations; nothing drained.");
            } else {
                println!("{}", serde_json::to_string_pretty(&result).map_err(|e| CliError::Fatal(e.into()))?);
            }
            Ok(())
        }

        Command::Anchor { batch_id } => {
            let client = RegistryRpcClient::new(&args.rpc);
            let result = client.request_anchor(&batch_id).await.map_err(CliError::Network)?;
            println!("{}", serde_json::to_string_pretty(&result).map_err(|e| CliError::Fatal(e.into()))?);
            Ok(())
        }

        Command::Sync => {
            let client = RegistryRpcClient::new(&args.rpc);
            let queued = client.request_sync().await.map_err(CliError::Network)?;
            if queued.as_bool().unwrap_or(false) {
                println!("Peer sync requested.");
            } else {
                println!("Peer sync request was not accepted.");
            }
            Ok(())
        }
    }
}

/// Spawns `pohw-node` as a foreground child, forwarding the relevant flags.
/// Fatal (config/store) failures are distinguished from network failures by
/// the fact that this path never reaches the network — any failure here is
/// a local config/process error.
fn cmd_start(node_binary: PathBuf, config: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<(), CliError> {
    let mut cmd = std::process::Command::new(&node_binary);
    if let Some(config) = &config {
        cmd.arg("--config").arg(config);
    }
    if let Some(data_dir) = &data_dir {
        cmd.arg("--data-dir").arg(data_dir);
    }

    info!(binary = %node_binary.display(), "starting registry node");
    let status = cmd
        .status()
        .map_err(|e| CliError::Fatal(anyhow::anyhow!("failed to launch {}: {e}", node_binary.display())))?;

    if status.success() {
        Ok(())
    } else {
        Err(CliError::Fatal(anyhow::anyhow!("registry node exited with {status}")))
    }
}
