use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use deltacov_core::{DeltacovConfig, OutputFormat, RevisionKind, RevisionRef};
use deltacov_difflens::pipeline::{run_diff, DiffOptions, DiffRequest};
use deltacov_gitstore::{Credentials, RevisionStore, StoreOptions};

const CONFIG_FILE: &str = ".deltacov.toml";
const PASSWORD_ENV: &str = "DELTACOV_GIT_PASSWORD";
const DEFAULT_BASE_BRANCH: &str = "master";

#[derive(Parser)]
#[command(
    name = "deltacov",
    version,
    about = "Find the Java classes and methods that changed between two git revisions",
    long_about = "deltacov computes the incremental coverage scope of a change: the classes\n\
                   that were added or modified between two revisions, with their added or\n\
                   modified methods and changed line ranges.\n\n\
                   Examples:\n  \
                     deltacov diff --kind tag --old v1.0 --new v1.1\n  \
                     deltacov diff --kind branch --old main --new feature/cart --format json\n  \
                     deltacov init                    Create a .deltacov.toml config file"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .deltacov.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for the change-set.\n\n\
                       Formats:\n  \
                         text      Human-readable summary (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Compute the change-set between two revisions
    #[command(long_about = "Compute the change-set between two revisions.\n\n\
        Branches are synchronized with the remote first unless --offline is set.\n\
        Test sources, deleted files, interfaces, and excluded packages or classes\n\
        are left out. Files that fail to parse are reported as diagnostics.\n\n\
        Examples:\n  deltacov diff --kind commit --old 3f2a9c1 --new HEAD\n  \
        deltacov diff --kind tag --old v1.0 --new v1.1 --refresh-branch develop\n  \
        deltacov diff --kind branch --old main --new dev --exclude-package 'com\\.shop\\.dto'\n  \
        deltacov diff --kind branch --new feature/cart    (compared against master)")]
    Diff {
        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// How to interpret --old and --new: branch, tag, or commit
        #[arg(long)]
        kind: RevisionKind,

        /// Base revision (default: master when --kind branch)
        #[arg(long)]
        old: Option<String>,

        /// Revision under test
        #[arg(long)]
        new: String,

        /// Branch to synchronize before resolving tags or commits
        #[arg(long)]
        refresh_branch: Option<String>,

        /// Regex of packages to exclude (repeatable, matched against the whole name)
        #[arg(long)]
        exclude_package: Vec<String>,

        /// Regex of simple class names to exclude (repeatable)
        #[arg(long)]
        exclude_class: Vec<String>,

        /// Do not contact the remote
        #[arg(long)]
        offline: bool,

        /// Files classified per worker
        #[arg(long)]
        chunk_size: Option<usize>,
    },
    /// Create default configuration
    Init,
}

const DEFAULT_CONFIG: &str = r#"# deltacov configuration

[repository]
# remote = "origin"
# offline = false
# username = "ci-bot"   # password is read from DELTACOV_GIT_PASSWORD

[diff]
# chunk_size = 100
# source_extension = "java"
# test_dirs = ["**/src/test/**"]
# rename_threshold = 50

[exclude]
# Regular expressions matched against the whole package or simple class name
# packages = ["com\\.example\\.generated(\\..*)?"]
# classes = [".*Dto", ".*Config"]
"#;

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!("deltacov v{version}: incremental coverage scope for Java\n");

    println!("Quick start:");
    println!("  deltacov init                                        Create a .deltacov.toml config file");
    println!("  deltacov diff --kind tag --old v1.0 --new v1.1       Changed classes between two tags\n");

    println!("All commands:");
    println!("  diff      Compute the change-set between two revisions");
    println!("  init      Create default configuration\n");

    println!("Run 'deltacov <command> --help' for details.");
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<DeltacovConfig> {
    let config = match path {
        Some(path) => DeltacovConfig::from_file(path)?,
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                DeltacovConfig::from_file(default_path)?
            } else {
                DeltacovConfig::default()
            }
        }
    };
    Ok(config)
}

fn store_options(config: &DeltacovConfig, offline: bool) -> StoreOptions {
    let credentials = match (&config.repository.username, std::env::var(PASSWORD_ENV)) {
        (Some(user), Ok(password)) => Some(Credentials::new(user.clone(), password)),
        (Some(_), Err(_)) => {
            tracing::debug!("{PASSWORD_ENV} not set; using default credentials");
            None
        }
        (None, _) => None,
    };
    StoreOptions {
        remote: config.repository.remote.clone(),
        credentials,
        offline: offline || config.repository.offline,
    }
}

fn base_revision(kind: RevisionKind, old: Option<String>) -> Result<String> {
    match (old, kind) {
        (Some(old), _) => Ok(old),
        (None, RevisionKind::Branch) => Ok(DEFAULT_BASE_BRANCH.to_string()),
        (None, _) => miette::bail!("--old is required unless --kind branch"),
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(format = %cli.format, "configuration loaded");

    match cli.command {
        None => print_welcome(),
        Some(Command::Diff {
            repo,
            kind,
            old,
            new,
            refresh_branch,
            exclude_package,
            exclude_class,
            offline,
            chunk_size,
        }) => {
            let mut options = DiffOptions::from_config(&config);
            options.exclude_packages.extend(exclude_package);
            options.exclude_classes.extend(exclude_class);
            if let Some(size) = chunk_size {
                options.chunk_size = size;
            }

            let old = base_revision(kind, old)?;
            let mut request = DiffRequest::new(RevisionRef::new(kind, old), RevisionRef::new(kind, new));
            if let Some(branch) = refresh_branch {
                request = request.with_refresh_branch(branch);
            }

            let mut store = RevisionStore::open(&repo, store_options(&config, offline))?;
            let report = run_diff(&mut store, &request, &options)?;

            match cli.format {
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&report).into_diagnostic()?;
                    println!("{json}");
                }
                OutputFormat::Markdown => print!("{}", report.to_markdown()),
                OutputFormat::Text => print!("{report}"),
            }
        }
        Some(Command::Init) => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                miette::bail!("{CONFIG_FILE} already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {CONFIG_FILE} with default configuration");
        }
    }

    Ok(())
}
