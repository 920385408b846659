use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rackpress::model::Id;
use rackpress::store::{EntityKind, MemoryStore};
use rackpress::{config, generate, output};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("RACKPRESS_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("RACKPRESS_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "rackpress")]
#[command(about = "Static site builder for editorial sites")]
#[command(long_about = "\
Static site builder for editorial sites

Content lives in one TOML store. Pages hold sections, sections hold racks,
and racks hang articles. What appears on a page is decided on the day of the
build: an article shows only once published and until its hanger expires,
empty racks disappear, and empty sections collapse unless told not to.

Content structure:

  content/
  ├── config.toml      # Site config (optional, sparse over stock defaults)
  ├── site.toml        # Pages, sections, racks, hangers, articles, menus...
  └── media/           # Uploaded documents and images → copied to output

Set RUST_LOG=rackpress=debug to see why each article was left out.

Run 'rackpress gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Date to assemble for (YYYY-MM-DD), defaults to the local date
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate content and print the inventory
    Check,
    /// Print one page's assembled content as JSON
    Assemble {
        /// Page slug
        slug: String,
    },
    /// Render the full site
    Build,
    /// Delete a record, detaching whatever pointed at it
    Delete {
        #[arg(value_enum)]
        kind: EntityKind,
        id: Id,
    },
    /// Comment moderation
    #[command(subcommand)]
    Comments(CommentsCommand),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(Subcommand)]
enum CommentsCommand {
    /// List comments awaiting approval
    Pending,
    /// Approve comments by id
    Approve {
        #[arg(required = true)]
        ids: Vec<Id>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();
    let cli = Cli::parse();
    let today = cli
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    match cli.command {
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            config::load_config(&cli.source)?;
            let store = MemoryStore::load(&cli.source)?;
            output::print_check_output(&store, today);
            println!("==> Content is valid");
        }
        Command::Assemble { slug } => {
            let site_config = config::load_config(&cli.source)?;
            let store = MemoryStore::load(&cli.source)?;
            println!(
                "{}",
                generate::page_model_json(&store, &site_config, &slug, today)?
            );
        }
        Command::Build => {
            let site_config = config::load_config(&cli.source)?;
            init_thread_pool(&site_config.processing);
            let store = MemoryStore::load(&cli.source)?;
            println!(
                "==> Building {} for {} → {}",
                cli.source.display(),
                today,
                cli.output.display()
            );
            let summary =
                generate::generate(&store, &site_config, &cli.source, &cli.output, today)?;
            output::print_build_output(&summary);
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Delete { kind, id } => {
            let mut store = MemoryStore::load(&cli.source)?;
            let report = store.delete(kind, id)?;
            store.save(&cli.source)?;
            output::print_delete_report(kind, id, &report);
        }
        Command::Comments(CommentsCommand::Pending) => {
            let store = MemoryStore::load(&cli.source)?;
            output::print_pending_comments(&store);
        }
        Command::Comments(CommentsCommand::Approve { ids }) => {
            let mut store = MemoryStore::load(&cli.source)?;
            let approved = store.approve_comments(&ids)?;
            store.save(&cli.source)?;
            println!("Approved {approved} of {} comments", ids.len());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
