//! Command line surface: argument parsing, wiring
//! the concrete filesystem-backed collaborators to a [`Transaction`], and
//! the exit-code/diagnostic-stream conventions: progress messages on the
//! normal stream, warnings/errors on stderr, a non-zero exit on any
//! surfaced fatal failure.
//!
//! `clap` derive `Parser`/`Subcommand` types whose doc comments double as
//! `--help` text.

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use fn_error_context::context;
use reftx_core::{Cancellable, Ref, Subpaths, Transaction, TransactionConfig};

use crate::catalog::FileCatalog;
use crate::oci::HttpOciClient;
use crate::prompt::TerminalPrompt;
use crate::state::FileDeployStore;

/// Install and update sandboxed refs from content-addressed remotes.
#[derive(Debug, Parser)]
#[command(name = "reftx", version, about)]
pub struct Cli {
    /// Operate on the system-wide installation scope instead of the
    /// per-user one.
    #[arg(long, global = true)]
    pub system: bool,

    /// Verbosity (repeat for more: -v, -vv, -vvv). Also controllable via
    /// `RUST_LOG`.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Which request to plan and execute.
    #[command(subcommand)]
    pub command: Command,
}

/// The three request shapes a caller can submit.
#[derive(Debug, Subcommand)]
#[clap(rename_all = "kebab-case")]
pub enum Command {
    /// Install a ref from a remote.
    Install(InstallArgs),
    /// Update an already-installed ref.
    Update(UpdateArgs),
    /// Install a ref sourced from an OCI registry image.
    InstallOci(InstallOciArgs),
}

/// Options shared by every request shape, fixed at transaction construction.
#[derive(Debug, Clone, clap::Args)]
pub struct TransactionArgs {
    /// Skip network fetch; require content already local.
    #[arg(long)]
    pub no_pull: bool,
    /// Fetch but do not activate on disk.
    #[arg(long)]
    pub no_deploy: bool,
    /// Disable runtime dependency expansion.
    #[arg(long)]
    pub no_deps: bool,
    /// Disable related-ref expansion.
    #[arg(long)]
    pub no_related: bool,
    /// Abort the whole batch at the first failing op instead of continuing
    /// and reporting a summary failure at the end.
    #[arg(long)]
    pub stop_on_first_error: bool,
}

/// Arguments to `reftx install`.
#[derive(Debug, clap::Args)]
pub struct InstallArgs {
    /// The remote to install from.
    pub remote: String,
    /// The ref to install, e.g. `app/com.example.Foo/x86_64/stable`.
    #[arg(value_parser = parse_ref)]
    pub reference: Ref,
    /// Restrict to these subpaths instead of installing everything.
    #[arg(long)]
    pub subpath: Vec<String>,
    #[command(flatten)]
    pub txn: TransactionArgs,
}

/// Arguments to `reftx update`.
#[derive(Debug, clap::Args)]
pub struct UpdateArgs {
    /// The ref to update.
    #[arg(value_parser = parse_ref)]
    pub reference: Ref,
    /// Pin the update to this commit instead of the remote's latest.
    #[arg(long)]
    pub commit: Option<String>,
    /// Restrict to these subpaths.
    #[arg(long)]
    pub subpath: Vec<String>,
    #[command(flatten)]
    pub txn: TransactionArgs,
}

/// Arguments to `reftx install-oci`.
#[derive(Debug, clap::Args)]
pub struct InstallOciArgs {
    /// The OCI image URI.
    pub uri: String,
    /// The tag to install.
    pub tag: String,
    #[command(flatten)]
    pub txn: TransactionArgs,
}

fn parse_ref(s: &str) -> Result<Ref, String> {
    Ref::new(s.to_owned()).map_err(|err| err.to_string())
}

fn subpaths_from_flag(subpath: Vec<String>) -> Option<Subpaths> {
    if subpath.is_empty() {
        None
    } else {
        Some(Subpaths::Only(subpath))
    }
}

fn build_config(txn: &TransactionArgs) -> TransactionConfig {
    TransactionConfig::builder()
        .no_pull(txn.no_pull)
        .no_deploy(txn.no_deploy)
        .add_deps(!txn.no_deps)
        .add_related(!txn.no_related)
        .build()
}

/// Where on disk this scope's state and the shared remote catalog live.
struct Dirs {
    state_path: Utf8PathBuf,
    system_state_path: Utf8PathBuf,
    remotes_path: Utf8PathBuf,
    catalog_dir: Utf8PathBuf,
}

#[context("resolving reftx data directories")]
fn resolve_dirs() -> Result<Dirs> {
    let data_dir = dirs::data_dir().context("no data directory for this platform")?;
    let data_dir = Utf8PathBuf::from_path_buf(data_dir).map_err(|p| anyhow::anyhow!("non-utf8 path: {}", p.display()))?;
    let config_dir = dirs::config_dir().context("no config directory for this platform")?;
    let config_dir =
        Utf8PathBuf::from_path_buf(config_dir).map_err(|p| anyhow::anyhow!("non-utf8 path: {}", p.display()))?;
    let base = data_dir.join("reftx");
    Ok(Dirs {
        state_path: base.join("user").join("state.json"),
        system_state_path: Utf8PathBuf::from("/var/lib/reftx/state.json"),
        remotes_path: config_dir.join("reftx").join("remotes.toml"),
        catalog_dir: base.join("catalog"),
    })
}

/// Build the concrete collaborators and dispatch `cli.command` against a
/// fresh [`Transaction`].
pub fn run(cli: Cli) -> Result<()> {
    let dirs = resolve_dirs()?;
    let deploy = if cli.system {
        FileDeployStore::open_system(dirs.system_state_path.clone(), dirs.remotes_path.clone())?
    } else {
        FileDeployStore::open_user(
            dirs.state_path.clone(),
            dirs.remotes_path.clone(),
            dirs.system_state_path.clone(),
            dirs.remotes_path.clone(),
        )?
    };
    let catalog = FileCatalog::new(dirs.catalog_dir.clone(), dirs.remotes_path.clone());
    let oci = HttpOciClient::new()?;
    let prompt = TerminalPrompt;
    let cancellable = Cancellable::new();

    match cli.command {
        Command::Install(args) => {
            let config = build_config(&args.txn);
            let stop_on_first_error = args.txn.stop_on_first_error;
            let mut txn = Transaction::new(&deploy, &catalog, &oci, config).with_prompt(&prompt);
            txn.add_install(&args.remote, args.reference, subpaths_from_flag(args.subpath))?;
            txn.run(stop_on_first_error, &cancellable)?;
        }
        Command::Update(args) => {
            let config = build_config(&args.txn);
            let stop_on_first_error = args.txn.stop_on_first_error;
            let mut txn = Transaction::new(&deploy, &catalog, &oci, config).with_prompt(&prompt);
            txn.add_update(args.reference, subpaths_from_flag(args.subpath), args.commit)?;
            txn.run(stop_on_first_error, &cancellable)?;
        }
        Command::InstallOci(args) => {
            let config = build_config(&args.txn);
            let stop_on_first_error = args.txn.stop_on_first_error;
            let mut txn = Transaction::new(&deploy, &catalog, &oci, config).with_prompt(&prompt);
            txn.add_install_oci(&args.uri, &args.tag)?;
            txn.run(stop_on_first_error, &cancellable)?;
        }
    }

    Ok(())
}
