use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use qfs::search::MatchSink;
use qfs::{search, PatternSpec, SearchConfig, SearchResults};
use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Quick File Search: concurrent recursive search for file names.
///
/// With no pattern arguments the tool runs interactively and prompts for
/// everything it needs.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Combined search expression: a literal substring, `a&&b`, `a||b`,
    /// or `/regex/`
    #[arg(short = 't', long = "target")]
    target: Option<String>,

    /// Literal patterns combined with OR (alternative to --target)
    patterns: Vec<String>,

    /// Directory to start from; `here` means the current directory
    /// (default: filesystem root)
    #[arg(short = 'd', long)]
    dir: Option<String>,

    /// Number of worker threads, 1 up to the logical core count
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Save results to a file after the search finishes
    #[arg(short = 's', long, num_args = 0..=1, default_missing_value = "founded.txt")]
    save: Option<PathBuf>,

    /// Do not print matches while the search is running
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Path to a config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = SearchConfig::load_from(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("failed to load configuration: {e}"))?;
    let mut config = file_config.merge_with_cli(SearchConfig {
        expression: cli.target.clone(),
        root_path: cli
            .dir
            .as_deref()
            .map(resolve_dir)
            .transpose()?
            .unwrap_or_else(|| SearchConfig::default().root_path),
        thread_count: cli.threads.unwrap_or_else(|| {
            NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
        }),
        print_live: !cli.quiet,
        save_path: cli.save.clone(),
        log_level: cli.log_level.clone().unwrap_or_else(|| "warn".to_string()),
    });

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    // No pattern from flags, positionals, or config file: go interactive.
    let spec = if let Some(expr) = &config.expression {
        PatternSpec::parse(expr)?
    } else if !cli.patterns.is_empty() {
        PatternSpec::from_tokens(&cli.patterns)?
    } else {
        prompt_for_settings(&mut config)?
    };

    let cores = num_cpus::get();
    if config.thread_count.get() > cores {
        bail!("thread count must be between 1 and {cores}");
    }

    println!(
        "\nStarting search using {} threads...",
        config.thread_count
    );
    println!("Starting from directory: {}", config.root_path.display());
    println!("Search in progress... Please wait.");

    let sink: Option<MatchSink> = config.print_live.then(|| {
        Arc::new(|m: &qfs::SearchMatch| {
            println!("Found {} at: {}", m.file_name.green(), m.path.display());
        }) as MatchSink
    });

    let results = search(&config.root_path, &spec, config.thread_count, sink)?;

    report(&results, config.save_path.as_deref())
}

fn report(results: &SearchResults, save_path: Option<&std::path::Path>) -> Result<()> {
    if results.is_empty() {
        println!("Nothing found");
        return Ok(());
    }

    if let Some(path) = save_path {
        let mut out = String::new();
        for m in results.iter() {
            out.push_str(&m.to_string());
            out.push('\n');
        }
        fs::write(path, out)
            .with_context(|| format!("failed to write results file {}", path.display()))?;
        println!("\n=================================================");
        println!(
            " Search complete! Results saved to '{}'",
            path.display()
        );
        println!(" Found {} results", results.len());
        println!("=================================================");
    } else {
        println!("\n=================================================");
        println!(" Search complete! Found {} results", results.len());
        println!("=================================================");
    }
    Ok(())
}

/// Resolves the `--dir` argument; `here` is an alias for the current
/// working directory.
fn resolve_dir(arg: &str) -> Result<PathBuf> {
    if arg == "here" {
        env::current_dir().context("cannot determine current directory")
    } else {
        Ok(PathBuf::from(arg))
    }
}

/// Interactive mode: asks for the search expression, thread count, starting
/// directory, and output options, re-prompting until each answer is valid.
fn prompt_for_settings(config: &mut SearchConfig) -> Result<PatternSpec> {
    println!(" Quick File Search (QFS)\n");

    let spec = loop {
        let answer = prompt("Enter the file name to search for (case insensitive): ")?;
        match PatternSpec::parse(&answer) {
            Ok(spec) => break spec,
            Err(err) => println!("{err}"),
        }
    };

    let cores = num_cpus::get();
    println!("\nYour system has {cores} logical cores available.");
    config.thread_count = loop {
        let answer = prompt(&format!("Enter how many cores to use for search (1-{cores}): "))?;
        match answer.parse::<usize>() {
            Ok(n) if (1..=cores).contains(&n) => break NonZeroUsize::new(n).unwrap(),
            Ok(_) => println!("Invalid number"),
            Err(_) => println!("Not a number"),
        }
    };

    let answer = prompt("Enter the starting directory (default: root, 'here' for current): ")?;
    if !answer.is_empty() {
        config.root_path = resolve_dir(&answer)?;
    }

    let answer = prompt("Save search results to file? (y/n, default: n): ")?;
    if answer.eq_ignore_ascii_case("y") {
        config.save_path = Some(PathBuf::from("founded.txt"));

        let answer = prompt("Print results during search? (y/n, default: y): ")?;
        if answer.eq_ignore_ascii_case("n") {
            config.print_live = false;
        }
    }

    Ok(spec)
}

/// Prints `message` without a newline and reads one trimmed line of input.
/// End of input is an error: there is nobody left to re-prompt.
fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush()?;

    let mut line = String::new();
    let bytes = io::stdin().lock().read_line(&mut line)?;
    if bytes == 0 {
        bail!("unexpected end of input");
    }
    Ok(line.trim().to_string())
}
