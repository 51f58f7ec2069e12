use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dialoguer::{Confirm, MultiSelect};
use indicatif::{ProgressBar, ProgressStyle};
use notedup::services::delete;
use notedup::services::history::{self, DeletionRecord};
use notedup::services::report::{self, GroupReport};
use notedup::services::scanner::{ScanOptions, scan_documents};
use notedup::{
    DocumentId, DuplicateEngine, DuplicateGroup, EngineError, Language, Normalizer, RunPhase,
    RunProgress, Threshold,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, SystemTime};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "notedup", version, about = "Find near-duplicate notes in a folder")]
struct Cli {
    /// Log filter, e.g. `debug` or `notedup=trace` (overrides RUST_LOG)
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,

    /// Log stage timings and skipped files
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Duplicate workflows
    Duplicates {
        #[command(subcommand)]
        command: Dups,
    },

    /// Work with deletion history
    History {
        #[command(subcommand)]
        command: HistoryCmd,
    },
}

#[derive(Subcommand, Debug)]
enum Dups {
    /// Find and list duplicate groups
    Scan {
        #[command(flatten)]
        detect: DetectArgs,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Show the first N lines of every file
        #[arg(long, value_name = "N", default_value_t = 0)]
        preview: usize,
    },

    /// Delete files from duplicate groups
    Delete {
        #[command(flatten)]
        detect: DetectArgs,
        /// Keep the oldest file of each group and delete the rest, without prompting for a selection
        #[arg(long)]
        keep_oldest: bool,
        /// Only show what would be deleted
        #[arg(long)]
        dry_run: bool,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryCmd {
    /// List all deletion records
    List {
        /// Folder the notes live in
        #[arg(short, long, value_name = "DIR")]
        path: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct DetectArgs {
    /// Folder to scan
    #[arg(short, long, value_name = "DIR")]
    path: PathBuf,
    /// Similarity threshold in percent
    #[arg(
        short,
        long,
        env = "NOTEDUP_THRESHOLD",
        default_value_t = 80,
        value_parser = clap::value_parser!(u8).range(50..=100)
    )]
    threshold: u8,
    /// File extensions to include
    #[arg(long = "ext", value_name = "EXT", default_values_t = vec!["md".to_string()])]
    extensions: Vec<String>,
    /// Stop-word set
    #[arg(long, value_enum, default_value_t = LanguageArg::English)]
    language: LanguageArg,
    /// Also scan hidden files and folders
    #[arg(long)]
    include_hidden: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LanguageArg {
    English,
    None,
}

impl From<LanguageArg> for Language {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::English => Language::English,
            LanguageArg::None => Language::None,
        }
    }
}

/// A completed detection pass, kept for presentation and deletion.
struct Detection {
    engine: DuplicateEngine,
    groups: Vec<DuplicateGroup>,
    documents: usize,
    skipped: usize,
    /// Raised by Ctrl-C, during detection and after it.
    interrupted: Arc<AtomicBool>,
}

#[derive(Serialize)]
struct ScanOutput<'a> {
    root: String,
    threshold: f64,
    documents: usize,
    skipped: usize,
    groups: &'a [GroupReport],
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose, cli.log_level.as_deref()) {
        eprintln!("Warning: failed to initialize logging: {e}");
    }

    match cli.command {
        Commands::Duplicates { command } => match command {
            Dups::Scan {
                detect,
                format,
                preview,
            } => {
                if format == OutputFormat::Text {
                    println!("▶ Scanning for duplicates in: {}", detect.path.display());
                }
                let Some(detection) = find_duplicates(&detect, format == OutputFormat::Text)?
                else {
                    return Ok(());
                };

                let reports = report::build_reports(
                    &detection.engine,
                    &detection.groups,
                    &detect.path,
                    preview,
                );
                match format {
                    OutputFormat::Json => {
                        let output = ScanOutput {
                            root: detect.path.to_string_lossy().into_owned(),
                            threshold: f64::from(detect.threshold),
                            documents: detection.documents,
                            skipped: detection.skipped,
                            groups: &reports,
                        };
                        println!("{}", serde_json::to_string_pretty(&output)?);
                    }
                    OutputFormat::Text => {
                        if reports.is_empty() {
                            println!("No duplicates found.");
                        } else {
                            println!("Found {} duplicate group(s):", reports.len());
                            print!("{}", report::render_text(&reports));
                        }
                    }
                }
            }

            Dups::Delete {
                detect,
                keep_oldest,
                dry_run,
                yes,
            } => {
                println!("▶ Deleting duplicates in: {}", detect.path.display());
                let Some(detection) = find_duplicates(&detect, true)? else {
                    return Ok(());
                };
                delete_duplicates(detection, &detect.path, keep_oldest, dry_run, yes)?;
            }
        },

        Commands::History { command } => match command {
            HistoryCmd::List { path } => {
                let records = history::load(&path).with_context(|| {
                    format!(
                        "Could not open history file {:?}",
                        history::history_path(&path)
                    )
                })?;

                println!("🗂️  Deletion History:");
                for (i, rec) in records.iter().enumerate() {
                    println!(
                        "[{}] {}\n     kept: {:?}\n     deleted: {:?}\n     similarity: {:.2}%\n",
                        i, rec.timestamp, rec.retained, rec.deleted, rec.similarity
                    );
                }
            }
        },
    }

    Ok(())
}

fn init_tracing(verbose: bool, log_level: Option<&str>) -> Result<()> {
    let filter = match log_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(if verbose { "info" } else { "warn" })),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}

/// Read every matching file under `args.path` and run detection on a worker
/// thread. Returns `None` when there are too few documents to compare.
fn find_duplicates(args: &DetectArgs, announce: bool) -> Result<Option<Detection>> {
    let threshold = Threshold::from_percent(f64::from(args.threshold))?;
    let options = ScanOptions {
        extensions: args.extensions.clone(),
        include_hidden: args.include_hidden,
        ..Default::default()
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
    spinner.set_message("Reading notes…");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let scan = scan_documents(&args.path, &options)
        .with_context(|| format!("Failed to scan {}", args.path.display()))?;
    spinner.finish_and_clear();

    let skipped = scan.failures.len();
    if announce && skipped > 0 {
        eprintln!("⚠️  Skipped {skipped} unreadable file(s)");
    }
    let documents = scan.documents.len();

    let engine = DuplicateEngine::new(Normalizer::for_language(args.language.into()));
    let token = engine.cancellation_token();
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        token.store(true, Ordering::Relaxed);
        flag.store(true, Ordering::Relaxed);
    }) {
        tracing::warn!(error = %err, "could not install Ctrl-C handler");
    }

    let (tx, rx) = mpsc::channel::<RunProgress>();
    let worker = thread::spawn(move || {
        let mut engine = engine;
        let result = engine
            .run(scan.documents, threshold, &mut |progress| {
                let _ = tx.send(progress);
            })
            .map(<[DuplicateGroup]>::to_vec);
        (engine, result)
    });

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg:<24} [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    let mut phase = None;
    for progress in rx {
        if phase != Some(progress.phase) {
            phase = Some(progress.phase);
            bar.set_message(phase_label(progress.phase));
        }
        bar.set_length(progress.total as u64);
        bar.set_position(progress.processed as u64);
    }
    bar.finish_and_clear();

    let (engine, result) = worker
        .join()
        .map_err(|_| anyhow::anyhow!("duplicate detection worker panicked"))?;

    match result {
        Ok(groups) => Ok(Some(Detection {
            engine,
            groups,
            documents,
            skipped,
            interrupted,
        })),
        Err(EngineError::InsufficientInput { found }) => {
            println!("Need at least two documents to find duplicates (found {found}).");
            Ok(None)
        }
        Err(err) => Err(err).context("Duplicate detection failed"),
    }
}

fn phase_label(phase: RunPhase) -> &'static str {
    match phase {
        RunPhase::Normalizing => "Normalizing notes",
        RunPhase::Vectorizing => "Building vectors",
        RunPhase::ComputingSimilarity => "Comparing notes",
        RunPhase::Clustering => "Grouping",
        RunPhase::Summarizing => "Summarizing groups",
        RunPhase::Complete => "Done",
    }
}

fn delete_duplicates(
    detection: Detection,
    root: &Path,
    keep_oldest: bool,
    dry_run: bool,
    yes: bool,
) -> Result<()> {
    let Detection {
        mut engine,
        groups,
        interrupted,
        ..
    } = detection;
    if groups.is_empty() {
        println!("No duplicates found.");
        return Ok(());
    }

    let mut deleted_total = 0;
    let mut failed_total = 0;
    let mut stopped = false;
    for (i, group) in groups.iter().enumerate() {
        if interrupted.load(Ordering::Relaxed) {
            stopped = true;
            break;
        }

        let mut ids = group.ids.clone();
        println!(
            "\n✨ Group {} ({:.2}% similar):",
            i + 1,
            group.similarity
        );

        let to_delete: Vec<DocumentId> = if keep_oldest {
            ids.sort_by_key(|id| get_timestamp(Path::new(id.as_str())));
            println!("   🏆 Keeping → {}", relative(&ids[0], root));
            ids[1..].to_vec()
        } else {
            let items: Vec<String> = ids.iter().map(|id| relative(id, root)).collect();
            let chosen = MultiSelect::new()
                .with_prompt("Select the files to delete")
                .items(&items)
                .interact()
                .context("Interactive selection needs a terminal; use --keep-oldest")?;
            chosen.into_iter().map(|index| ids[index].clone()).collect()
        };

        if to_delete.is_empty() {
            println!("   Nothing selected; skipping group.");
            continue;
        }

        if dry_run {
            for id in &to_delete {
                println!("   🗑️  [dry-run] DELETE {}", relative(id, root));
            }
            continue;
        }

        if !yes {
            let confirmed = Confirm::new()
                .with_prompt(format!("Delete {} file(s)?", to_delete.len()))
                .default(false)
                .interact()
                .context("Confirmation needs a terminal; use --yes")?;
            if !confirmed {
                println!("   Skipped.");
                continue;
            }
        }

        let removal = delete::remove_files(&mut engine, &to_delete, &interrupted);
        for id in &removal.deleted {
            println!("   🗑️  Deleted {}", relative(id, root));
        }
        for (id, err) in &removal.failed {
            eprintln!("   ⚠️  Could not delete {}: {err}", relative(id, root));
        }
        deleted_total += removal.deleted.len();
        failed_total += removal.failed.len();

        if !removal.deleted.is_empty() {
            let retained = removal
                .retained(&ids)
                .into_iter()
                .map(ToString::to_string)
                .collect();
            let deleted = removal.deleted.iter().map(ToString::to_string).collect();
            history::append(root, &DeletionRecord::now(retained, deleted, group.similarity))
                .with_context(|| {
                    format!(
                        "Failed to write history file {:?}",
                        history::history_path(root)
                    )
                })?;
        }

        if removal.interrupted {
            stopped = true;
            break;
        }
    }

    if stopped {
        println!("\n⏹️  Interrupted; remaining files were left untouched.");
    }
    if dry_run {
        println!("\n⚠️  Dry-run only; no files were changed.");
        return Ok(());
    }

    println!(
        "\n✅ Deleted {} file(s); {} group(s) still have duplicates. Recorded history in {}",
        deleted_total,
        engine.active_groups().len(),
        history::history_path(root).display()
    );
    if failed_total > 0 {
        anyhow::bail!("{failed_total} file(s) could not be deleted");
    }
    Ok(())
}

fn relative(id: &DocumentId, root: &Path) -> String {
    let path = Path::new(id.as_str());
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Get the creation time (or modification time) of a file, falling back to UNIX_EPOCH on error.
fn get_timestamp(path: &Path) -> SystemTime {
    fs::metadata(path)
        .and_then(|m| m.created().or_else(|_| m.modified()))
        .unwrap_or(SystemTime::UNIX_EPOCH)
}
