// Wed Jul 22 2026 - Alex

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Instant;
use ta_marking_system::config::Config;
use ta_marking_system::exam::ExamSequencer;
use ta_marking_system::input::{discover_exam_files, rubric_file};
use ta_marking_system::output::RunSummary;
use ta_marking_system::rubric::{RubricEntry, RubricStore};
use ta_marking_system::shm::SharedArena;
use ta_marking_system::ui::Banner;
use ta_marking_system::utils::LoggingUtils;
use ta_marking_system::worker::{Worker, WorkerPool};

#[derive(Parser, Debug)]
#[command(author = "Alex")]
#[command(version = "1.0.0")]
#[command(about = "Cooperative exam marking over shared memory", long_about = None)]
struct Args {
    /// Number of marker processes to spawn (at least 2)
    workers: usize,

    #[arg(short, long, default_value = "Input")]
    input_dir: PathBuf,

    #[arg(short, long, default_value = "rubric.txt")]
    rubric: PathBuf,

    #[arg(long)]
    summary: Option<PathBuf>,

    #[arg(long)]
    log_file: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(long)]
    no_banner: bool,

    /// Shrink the simulated grading delays (demos, CI)
    #[arg(long)]
    fast: bool,

    #[arg(long)]
    stall_timeout_ms: Option<u64>,

    #[arg(long)]
    shm_name: Option<String>,
}

fn main() {
    let args = Args::parse();

    let level = LoggingUtils::level_from_verbosity(args.verbose as usize + 1);
    match &args.log_file {
        Some(path) => {
            if let Err(e) = LoggingUtils::init_logger_with_file(level, path) {
                eprintln!("{} Cannot open log file {}: {}", "[!]".red(), path.display(), e);
                std::process::exit(1);
            }
        }
        None => LoggingUtils::init_logger(level),
    }

    if !args.no_banner {
        Banner::new("Exam Marking System")
            .with_subtitle("cooperative marking over shared memory")
            .with_version("1.0.0")
            .print();
    }

    let mut config = Config::new()
        .with_input_dir(args.input_dir)
        .with_rubric_path(args.rubric)
        .with_num_workers(args.workers);
    if args.fast {
        config = config.with_time_scale(0.02);
    }
    if let Some(ms) = args.stall_timeout_ms {
        config.stall_timeout_ms = ms;
    }
    config.shm_name = args.shm_name;
    config.summary_path = args.summary;

    if let Err(e) = config.validate() {
        eprintln!("{} Invalid configuration: {}", "[!]".red(), e);
        std::process::exit(1);
    }

    println!("{} Workers: {}", "[*]".blue(), config.num_workers);
    println!("{} Exam directory: {}", "[*]".blue(), config.input_dir.display());
    println!("{} Rubric: {}", "[*]".blue(), config.rubric_path.display());
    println!();

    let start_time = Instant::now();

    let (exam_files, entries) = match load_inputs(&config) {
        Ok(inputs) => inputs,
        Err(e) => {
            eprintln!("{} Setup failed: {:#}", "[!]".red(), e);
            std::process::exit(1);
        }
    };

    println!("{} Found {} exam files", "[+]".green(), exam_files.len());
    println!("{} Loaded {} rubric entries", "[+]".green(), entries.len());

    let arena = match SharedArena::create(&config.region_name()) {
        Ok(arena) => arena,
        Err(e) => {
            eprintln!("{} Cannot create shared region: {}", "[!]".red(), e);
            std::process::exit(1);
        }
    };
    let state = arena.state();

    println!(
        "{} Shared region {} mapped ({} bytes)",
        "[+]".green(),
        arena.name(),
        arena.size()
    );

    RubricStore::new(state, config.rubric_path.clone()).install(&entries);

    let sequencer = ExamSequencer::new(state);
    if let Err(e) = sequencer.install_paths(&exam_files) {
        eprintln!("{} Cannot install exam list: {}", "[!]".red(), e);
        std::process::exit(1);
    }
    if let Err(e) = sequencer.load(0) {
        eprintln!("{} Cannot load first exam: {}", "[!]".red(), e);
        std::process::exit(1);
    }

    state
        .active_workers
        .store(config.num_workers as u32, Ordering::Release);

    println!("{} Starting {} workers", "[*]".blue(), config.num_workers);
    println!();
    let _ = std::io::stdout().flush();

    let mut pool = match WorkerPool::spawn(config.num_workers, |id| {
        Worker::new(id, state, &config).run();
    }) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("{} {}", "[!]".red(), e);
            std::process::exit(1);
        }
    };

    pool.wait_all();

    println!();
    println!("{} All workers have finished marking", "[+]".green());

    let summary = RunSummary::collect(state, config.num_workers, start_time.elapsed());
    print_summary(&summary);

    if let Some(path) = &config.summary_path {
        match summary.save(path) {
            Ok(()) => println!("{} Summary saved to: {}", "[+]".green(), path.display()),
            Err(e) => eprintln!("{} Failed to save summary: {}", "[!]".red(), e),
        }
    }
}

fn load_inputs(config: &Config) -> anyhow::Result<(Vec<PathBuf>, Vec<RubricEntry>)> {
    let exam_files = discover_exam_files(&config.input_dir)
        .with_context(|| format!("discovering exams in {}", config.input_dir.display()))?;
    let entries = rubric_file::read_entries(&config.rubric_path)
        .with_context(|| format!("reading rubric {}", config.rubric_path.display()))?;
    Ok((exam_files, entries))
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("{}", "Run Summary".cyan().bold());
    println!("{}", "-".repeat(40).cyan());
    println!(
        "  Exams marked: {} of {}",
        summary.exams_loaded.to_string().green(),
        summary.exams_on_disk
    );
    println!(
        "  Questions marked: {}",
        summary.questions_marked.to_string().green()
    );
    println!(
        "  Rubric corrections: {}",
        summary.corrections_made.to_string().green()
    );
    if summary.stalled_workers > 0 {
        println!(
            "  Stalled workers: {}",
            summary.stalled_workers.to_string().yellow()
        );
    }
    println!("  Duration: {:.2}s", summary.duration_secs);
    println!();

    for worker in &summary.per_worker {
        let status = if worker.stalled {
            "stalled".yellow()
        } else {
            "done".green()
        };
        println!(
            "  worker {} [{}]: {} questions, {} corrections, {} advances",
            worker.worker,
            status,
            worker.questions_marked,
            worker.corrections_made,
            worker.exams_advanced
        );
    }
}
