/// # pagedrop CLI interface
///
/// Command parsing and wiring for the `pagedrop` binary. All publishing logic lives in
/// [`pagedrop_core`]; this module loads settings, builds the HTTP collaborators and renders
/// results.
///
/// For programmatic and integration use, call [`run`] with a constructed [`Cli`].
use crate::auth::Credentials;
use crate::client::ApiClient;
use crate::load_config::load_config;
use crate::object_store::HttpObjectStore;
use crate::render;
use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use pagedrop_core::contract::{Clock, ObjectStore, RemoteApi, TokioClock};
use pagedrop_core::publish::{PublishOptions, Publisher, SyncOptions};
use pagedrop_core::PublishError;
use std::path::PathBuf;

/// Publish local markdown files and folders as hosted sites.
#[derive(Debug, Parser)]
#[clap(
    name = "pagedrop",
    version,
    about = "Publish local markdown files and folders as hosted sites"
)]
pub struct Cli {
    /// More log output on stderr (-v info, -vv debug)
    #[clap(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Settings file [default: <config dir>/pagedrop/config.yaml]
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Publish files or folders as a new site named after the first path
    Publish {
        #[clap(required = true)]
        paths: Vec<PathBuf>,
        /// Replace an existing site with the same name
        #[clap(long)]
        overwrite: bool,
        /// Show what would be uploaded without changing anything
        #[clap(long)]
        dry_run: bool,
        /// Return after uploading instead of waiting for processing
        #[clap(long)]
        no_wait: bool,
    },
    /// Update an existing site: upload new and changed files, remove deleted ones
    Sync {
        #[clap(required = true)]
        paths: Vec<PathBuf>,
        #[clap(long)]
        dry_run: bool,
        #[clap(long)]
        no_wait: bool,
    },
    /// List your sites
    List,
    /// Show processing status of a site
    Status { name: String },
    /// Delete a site and all of its files
    Delete { name: String },
    /// Show the authenticated user
    Whoami,
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Publish { .. } => "publish",
            Commands::Sync { .. } => "sync",
            Commands::List => "list",
            Commands::Status { .. } => "status",
            Commands::Delete { .. } => "delete",
            Commands::Whoami => "whoami",
        }
    }

    fn paths(&self) -> Option<&[PathBuf]> {
        match self {
            Commands::Publish { paths, .. } | Commands::Sync { paths, .. } => {
                Some(paths.as_slice())
            }
            _ => None,
        }
    }
}

/// Async entrypoint for `main` and integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    let command = cli.command.name();
    tracing::info!(command, "command_started");

    // A typo in a path should not need a token or a network round-trip to report.
    if let Some(paths) = cli.command.paths() {
        check_inputs(paths)?;
    }

    let config = load_config(cli.config.as_deref())?;
    let credentials = Credentials::from_config(&config)?;
    let remote = ApiClient::new(&config.api_url, credentials);
    let store = HttpObjectStore::new();
    let clock = TokioClock::new();
    let publisher = Publisher::new(&remote, &store, &clock, config.publish.clone());

    let result = execute(&publisher, cli.command).await;
    match &result {
        Ok(()) => tracing::info!(command, "Command complete"),
        Err(e) => tracing::error!(command, error = %e, "Command failed"),
    }
    result
}

fn check_inputs(paths: &[PathBuf]) -> Result<(), PublishError> {
    match paths.iter().find(|p| !p.exists()) {
        Some(missing) => Err(PublishError::NotFoundOrInvalidPath {
            path: missing.clone(),
        }),
        None => Ok(()),
    }
}

async fn execute<R, S, C>(publisher: &Publisher<'_, R, S, C>, command: Commands) -> Result<()>
where
    R: RemoteApi,
    S: ObjectStore,
    C: Clock,
{
    match command {
        Commands::Publish {
            paths,
            overwrite,
            dry_run,
            no_wait,
        } => {
            let options = PublishOptions {
                overwrite,
                dry_run,
                wait: !no_wait,
            };
            let report = publisher.publish(paths.as_slice(), options).await?;
            print!("{}", render::publish_report("Published", &report));
        }
        Commands::Sync {
            paths,
            dry_run,
            no_wait,
        } => {
            let options = SyncOptions {
                dry_run,
                wait: !no_wait,
            };
            let report = publisher.sync(paths.as_slice(), options).await?;
            print!("{}", render::publish_report("Synced", &report));
        }
        Commands::List => {
            let sites = publisher.list().await?;
            print!("{}", render::sites(&sites));
        }
        Commands::Status { name } => {
            let (site, status) = publisher.status(&name).await?;
            print!("{}", render::site_status(&site, &status));
        }
        Commands::Delete { name } => {
            let (site, receipt) = publisher.delete(&name).await?;
            print!("{}", render::deleted(&site, &receipt));
        }
        Commands::Whoami => {
            let identity = publisher.whoami().await?;
            print!("{}", render::identity(&identity));
        }
    }
    Ok(())
}
