//! Sortd command line and TUI entry point.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sortd::{BatchAborted, Config, DefaultFactory, OrganizeResult, Organizer, OrganizerFactory, Rule};

#[derive(Parser, Debug)]
#[command(name = "sortd")]
#[command(author, version, about = "Pattern-driven file organizer")]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Preview moves without touching the filesystem
    #[arg(short = 'n', long, global = true)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the TUI (default)
    Ui {
        /// Directory to browse (defaults to the current directory)
        dir: Option<PathBuf>,
    },

    /// Organize files by pattern; a single directory is expanded to its files
    Organize {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Move files into a directory without consulting the patterns
    Move {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Destination directory
        #[arg(long, value_name = "DIR")]
        to: PathBuf,
    },

    /// Watch directories and organize new files until Ctrl-C
    Watch {
        /// Directories to watch (defaults to the configured [[watch]] entries)
        dirs: Vec<PathBuf>,
    },

    /// List configured patterns in priority order
    Patterns,

    /// Append a pattern to the config file
    AddPattern {
        #[arg(long)]
        glob: String,

        #[arg(long, value_name = "DIR")]
        dest: PathBuf,

        #[arg(long)]
        prefix: Vec<String>,

        #[arg(long)]
        suffix: Vec<String>,
    },

    /// Validate config file
    Check,

    /// Show the advisory content type of files
    Sniff {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = Config::load(cli.config.as_deref());

    let tui = matches!(cli.command, None | Some(Commands::Ui { .. }));
    init_logging(&cli, loaded.as_ref().ok(), tui)?;

    let factory = DefaultFactory;

    match cli.command {
        None => run_ui(loaded?, None, &factory).await?,
        Some(Commands::Ui { ref dir }) => run_ui(loaded?, dir.clone(), &factory).await?,
        Some(Commands::Organize { ref paths }) => {
            let mut organizer = build(&factory, loaded?, &cli);
            let outcome = match paths.as_slice() {
                [dir] if dir.is_dir() => organizer.organize_dir(dir),
                _ => organizer.organize_by_patterns(paths),
            };
            report(outcome, cli.json)?;
        }
        Some(Commands::Move { ref paths, ref to }) => {
            let mut organizer = build(&factory, loaded?, &cli);
            let outcome = organizer.organize_files(paths, &sortd::expand_path(to));
            report(outcome, cli.json)?;
        }
        Some(Commands::Watch { ref dirs }) => {
            let organizer = build(&factory, loaded?, &cli);
            watch(organizer, dirs, cli.json).await?;
        }
        Some(Commands::Patterns) => {
            let config = loaded?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&config.organize.patterns)?);
            } else if config.organize.patterns.is_empty() {
                println!("No patterns configured");
            } else {
                println!("Patterns:");
                for (i, rule) in config.organize.patterns.iter().enumerate() {
                    println!("  [{}] {}", i + 1, describe(rule));
                }
            }
        }
        Some(Commands::AddPattern {
            ref glob,
            ref dest,
            ref prefix,
            ref suffix,
        }) => {
            let config = loaded?;
            let mut rule = Rule::new(glob.as_str(), dest.as_path());
            for p in prefix {
                rule = rule.with_prefix(p.as_str());
            }
            for s in suffix {
                rule = rule.with_suffix(s.as_str());
            }

            let mut organizer = factory.create(config);
            organizer.add_pattern(rule.clone());
            organizer
                .config()
                .validate()
                .context("Pattern rejected")?;
            organizer.config().save(cli.config.as_deref())?;
            println!("✓ Added pattern {}", describe(&rule));
        }
        Some(Commands::Check) => match loaded {
            Ok(config) => {
                println!("✓ Config is valid");
                println!("  {} patterns", config.organize.patterns.len());
                println!("  {} watch paths", config.watches.len());
                println!("  collision policy: {}", config.settings.collision);
            }
            Err(e) => {
                eprintln!("✗ Config error: {:#}", e);
                std::process::exit(1);
            }
        },
        Some(Commands::Sniff { ref paths }) => {
            for path in paths {
                let kind = sortd::analysis::sniff(path);
                if cli.json {
                    println!(
                        "{}",
                        serde_json::json!({ "path": path, "mime": kind.mime, "category": kind.category })
                    );
                } else {
                    println!(
                        "{} {:<9} {:<28} {}",
                        kind.category.icon(),
                        kind.category.label(),
                        kind.mime.as_deref().unwrap_or("-"),
                        path.display()
                    );
                }
            }
        }
    }

    Ok(())
}

/// Logs go to stderr, except in the TUI where they'd scribble over the screen
fn init_logging(cli: &Cli, config: Option<&Config>, tui: bool) -> Result<()> {
    let fallback = if cli.verbose {
        "debug".to_string()
    } else {
        config.map_or_else(|| "info".to_string(), |c| c.general.log_level.clone())
    };
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("SORTD_LOG").unwrap_or(fallback),
    );

    if tui {
        let log_path = config
            .and_then(|c| c.general.log_file.as_deref())
            .map(sortd::expand_path)
            .unwrap_or_else(Config::default_log_file);
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    Ok(())
}

fn build(factory: &dyn OrganizerFactory, config: Config, cli: &Cli) -> Box<dyn Organizer> {
    let mut organizer = factory.create(config);
    if cli.dry_run {
        organizer.set_dry_run(true);
    }
    organizer
}

async fn run_ui(config: Config, dir: Option<PathBuf>, factory: &dyn OrganizerFactory) -> Result<()> {
    let dir = match dir {
        Some(d) => sortd::expand_path(&d),
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    if !dir.is_dir() {
        bail!("Not a directory: {}", dir.display());
    }
    sortd::app::run(config, dir, factory).await
}

/// Print batch results, exiting with status 1 if the batch stopped early
fn report(outcome: Result<Vec<OrganizeResult>, BatchAborted>, json: bool) -> Result<()> {
    match outcome {
        Ok(results) => print_results(&results, json),
        Err(aborted) => {
            print_results(&aborted.completed, json)?;
            eprintln!(
                "✗ Stopped after {} move(s): {}",
                aborted.moved_count(),
                aborted.error
            );
            std::process::exit(1);
        }
    }
}

fn print_results(results: &[OrganizeResult], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }

    for r in results {
        print_result(r);
    }
    Ok(())
}

fn print_result(r: &OrganizeResult) {
    let src = r.source_path.display();
    match (&r.destination_path, &r.error) {
        (_, Some(err)) => println!("{:<10}  {}: {}", r.status(), src, err),
        (Some(dst), None) => println!("{:<10}  {} -> {}", r.status(), src, dst.display()),
        (None, None) => println!("{:<10}  {}", r.status(), src),
    }
}

fn describe(rule: &Rule) -> String {
    let mut out = format!("{} -> {}", rule.glob, rule.destination.display());
    if !rule.prefixes.is_empty() {
        out.push_str(&format!("  prefixes: {}", rule.prefixes.join(", ")));
    }
    if !rule.suffixes.is_empty() {
        out.push_str(&format!("  suffixes: {}", rule.suffixes.join(", ")));
    }
    out
}

async fn watch(mut organizer: Box<dyn Organizer>, dirs: &[PathBuf], json: bool) -> Result<()> {
    let config = organizer.config().clone();
    let mut watcher = sortd::Watcher::new(
        config.general.polling_interval_secs,
        config.general.debounce_seconds,
    )?;

    if dirs.is_empty() {
        if config.watches.is_empty() {
            bail!("Nothing to watch: pass directories or add [[watch]] entries to the config");
        }
        for w in &config.watches {
            watcher.watch(&sortd::expand_path(&w.path), w.recursive)?;
        }
    } else {
        for dir in dirs {
            watcher.watch(&sortd::expand_path(dir), config.organize.recursive)?;
        }
    }

    let roots: Vec<&Path> = watcher.roots().collect();
    eprintln!("Watching {} folder(s), press Ctrl-C to stop", roots.len());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interval = tokio::time::interval(Duration::from_millis(500));
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = interval.tick() => {
                let results = watcher.process_events(organizer.as_mut());
                if !results.is_empty() {
                    print_results(&results, json)?;
                }
            }
        }
    }

    tracing::info!("Stopped after moving {} file(s)", watcher.files_processed());
    Ok(())
}
