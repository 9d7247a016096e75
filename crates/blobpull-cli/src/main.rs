use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

use blobpull_core::app::{PullStepConfig, PullerBuilder, StorageRegistry};
use blobpull_core::domain::{BuildNumber, RunInfo, StorageAccountInfo};
use blobpull_core::impls::{FsWorkspace, HostFixture, LocalDirStorage};

/// Pull build artifacts from a blob store into a workspace.
#[derive(Parser, Debug)]
#[command(name = "blobpull")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one pull step against a host fixture and a directory-backed store.
    Pull(PullArgs),
    /// Manage the storage account registry.
    Account {
        #[command(subcommand)]
        command: AccountCommand,
    },
}

#[derive(Args, Debug)]
struct PullArgs {
    /// Storage account registry (JSON).
    #[arg(long, default_value = "accounts.json")]
    registry: PathBuf,

    /// Pull step configuration (JSON).
    #[arg(long)]
    step: PathBuf,

    /// Host fixture describing jobs, runs and artifact records (JSON).
    #[arg(long)]
    fixture: PathBuf,

    /// Job of the invoking run.
    #[arg(long)]
    job: String,

    /// Build number of the invoking run.
    #[arg(long)]
    build: BuildNumber,

    /// Directory holding one sub-directory per container.
    #[arg(long)]
    blob_root: PathBuf,

    /// Workspace root that download directories are resolved against.
    #[arg(long, default_value = ".")]
    workspace: PathBuf,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    /// Add or replace an account.
    Add {
        #[arg(long, default_value = "accounts.json")]
        registry: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        key: String,
        /// Blob endpoint; blank means the public default.
        #[arg(long, default_value = "")]
        endpoint: String,
    },
    /// Remove an account by name.
    Remove {
        #[arg(long, default_value = "accounts.json")]
        registry: PathBuf,
        #[arg(long)]
        name: String,
    },
    /// List configured accounts (keys are not printed).
    List {
        #[arg(long, default_value = "accounts.json")]
        registry: PathBuf,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}

async fn pull(args: PullArgs) -> Result<()> {
    let registry = StorageRegistry::load(&args.registry).await?;
    let step: PullStepConfig = read_json(&args.step).await?;
    let fixture: HostFixture = read_json(&args.fixture).await?;

    let invoking = fixture
        .find_run(&args.job, args.build)
        .unwrap_or_else(|| RunInfo::new(args.job.clone(), args.build));
    let host = Arc::new(fixture.into_host());

    let puller = PullerBuilder::new()
        .host(host)
        .storage(Arc::new(LocalDirStorage::new(&args.blob_root)))
        .workspace(Arc::new(FsWorkspace::new(&args.workspace)))
        .registry(registry)
        .build()?;

    let report = puller.perform(&step, &invoking).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn account(command: AccountCommand) -> Result<()> {
    match command {
        AccountCommand::Add {
            registry,
            name,
            key,
            endpoint,
        } => {
            let mut accounts = StorageRegistry::load(&registry).await?;
            accounts.upsert(StorageAccountInfo::new(name.clone(), key, endpoint));
            accounts.save(&registry).await?;
            tracing::info!(account = %name, registry = %registry.display(), "account saved");
        }
        AccountCommand::Remove { registry, name } => {
            let mut accounts = StorageRegistry::load(&registry).await?;
            if !accounts.remove(&name) {
                anyhow::bail!("account '{name}' is not configured");
            }
            accounts.save(&registry).await?;
            tracing::info!(account = %name, "account removed");
        }
        AccountCommand::List { registry } => {
            let accounts = StorageRegistry::load(&registry).await?;
            for acc in accounts.accounts() {
                let acc = acc.canonicalized();
                println!("{}\t{}", acc.name, acc.blob_endpoint);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    match cli.command {
        Command::Pull(args) => pull(args).await,
        Command::Account { command } => account(command).await,
    }
}
