use std::process::ExitCode;
use std::sync::Arc;

use activity_core::config::{load_timeline_config, CoreConfig};
use activity_core::logging::init_tracing;
use activity_protocol::access::Viewer;
use activity_timeline::{
    regenerate_user_creation, render_entries, BulkWriter, FanOut, PgDirectory, PgTimelineStore,
    Registry, TimelineReader,
};
use clap::{ArgGroup, Args, Parser, Subcommand};
use tracing::info;

mod output;

use output::{print_feed, print_refusal, print_regeneration_report, print_user_progress};

#[derive(Parser)]
#[command(name = "activity")]
#[command(about = "Activity timeline maintenance and inspection", long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, env = "ACTIVITY_LOG", default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the "user created" entries of every user, backdated to their join date
    RebuildUserCreation(RebuildArgs),
    /// Print a user or project feed as JSON
    Feed(FeedArgs),
    /// Show version information
    Version,
}

#[derive(Args)]
struct RebuildArgs {
    /// Rows per batched insert (defaults to the configured batch size)
    #[arg(long)]
    batch_size: Option<usize>,
}

#[derive(Args)]
#[command(group(ArgGroup::new("owner").required(true).args(["user", "project"])))]
struct FeedArgs {
    #[arg(long)]
    user: Option<i64>,
    #[arg(long)]
    project: Option<i64>,
    /// For users: the whole profile feed instead of the user's own actions
    #[arg(long, default_value_t = false)]
    profile: bool,
    /// Filter entries for this viewer; omit to see everything
    #[arg(long)]
    viewer: Option<i64>,
    /// Filter entries for an anonymous viewer
    #[arg(long, conflicts_with = "viewer", default_value_t = false)]
    anonymous: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    if let Commands::Version = cli.command {
        println!("activity v{}", env!("CARGO_PKG_VERSION"));
        return Ok(ExitCode::SUCCESS);
    }

    init_tracing(Some(&cli.log_level))?;
    let config = load_timeline_config()?;

    match cli.command {
        Commands::RebuildUserCreation(args) => rebuild_user_creation(&config, args).await,
        Commands::Feed(args) => feed(&config, args).await,
        Commands::Version => Ok(ExitCode::SUCCESS),
    }
}

async fn rebuild_user_creation(config: &CoreConfig, args: RebuildArgs) -> anyhow::Result<ExitCode> {
    if !regeneration_allowed(config) {
        print_refusal(
            "regeneration is disabled while debug mode is on; \
             unset TIMELINE_DEBUG and ACTIVITY_DEBUG first",
        );
        return Ok(ExitCode::FAILURE);
    }

    let store = PgTimelineStore::from_config(config).await?;
    let directory = PgDirectory::new(store.pool().clone());
    let batch_size = args.batch_size.unwrap_or(config.bulk_batch_size);
    info!(batch_size, "starting user creation regeneration");

    let registry = Arc::new(Registry::with_defaults());
    info!(extractors = registry.len(), "extractor registry ready");

    let bulk = BulkWriter::with_batch_size(registry, Arc::new(store), batch_size);
    let fanout = FanOut::new(Arc::new(directory.clone()));

    let report = regenerate_user_creation(&directory, &fanout, &bulk, print_user_progress).await?;
    print_regeneration_report(&report);
    Ok(ExitCode::SUCCESS)
}

/// Regeneration is refused while debug mode is on.
fn regeneration_allowed(config: &CoreConfig) -> bool {
    !config.debug
}

async fn feed(config: &CoreConfig, args: FeedArgs) -> anyhow::Result<ExitCode> {
    let store = PgTimelineStore::from_config(config).await?;
    let directory = PgDirectory::new(store.pool().clone());
    let reader = TimelineReader::new(Arc::new(store), Arc::new(directory.clone()));

    let viewer = match (args.viewer, args.anonymous) {
        (Some(id), _) => Some(Viewer::User(id)),
        (None, true) => Some(Viewer::Anonymous),
        (None, false) => None,
    };

    let mut entries = match (args.user, args.project) {
        (Some(user_id), _) if args.profile => reader.profile_feed(user_id, viewer).await?,
        (Some(user_id), _) => reader.user_feed(user_id, viewer).await?,
        (None, Some(project_id)) => reader.project_feed(project_id, viewer).await?,
        (None, None) => anyhow::bail!("either --user or --project is required"),
    };

    render_entries(&mut entries, &directory).await?;
    print_feed(&entries)?;
    Ok(ExitCode::SUCCESS)
}
