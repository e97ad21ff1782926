//! Command-line interface for recursive bulk ZIP extraction.
//!
//! Searches a folder recursively for zip files and extracts each one into a
//! `<name>_unzipped` folder beside it, optionally deleting the zip afterwards.
//! Options missing from the command line are asked for interactively.

use clap::{Parser, ValueEnum};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process;
use unzipper::{BulkConfig, ExtractError, ExtractOptions, RunSummary, TaskEvent};

#[derive(Parser)]
#[command(name = "bulk-unzip")]
#[command(version, about = "Recursively extract every zip file below a folder", long_about = None)]
struct Cli {
    /// Folder to search recursively for zip files
    #[arg(long)]
    directory: Option<PathBuf>,

    /// Delete each zip file after it is extracted successfully
    #[arg(long, value_enum, ignore_case = true)]
    delete_flag: Option<DeleteFlag>,

    /// Per-archive size limit in bytes
    #[arg(long)]
    size_limit: Option<u64>,

    /// Also print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Exit right after the summary instead of waiting for Enter
    #[arg(long)]
    no_pause: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DeleteFlag {
    /// Delete the zip once extracted
    Y,
    /// Keep the zip
    N,
}

impl DeleteFlag {
    fn parse(input: &str) -> Option<Self> {
        <DeleteFlag as ValueEnum>::from_str(input.trim(), true).ok()
    }
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let pause = !cli.no_pause && io::stdin().is_terminal();

    let result = handle_run(cli);

    let code = match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            match e.downcast_ref::<ExtractError>() {
                Some(ExtractError::InvalidRoot(_)) => 2,
                _ => 1,
            }
        }
    };

    if pause {
        wait_for_enter();
    }
    process::exit(code);
}

fn handle_run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    let root = match cli.directory {
        Some(dir) => dir,
        None => prompt_directory(&mut input, &mut output)?,
    };

    // Refuse to go further (or ask anything else) with a bad root.
    if !root.is_dir() {
        return Err(ExtractError::InvalidRoot(root).into());
    }

    let delete_flag = match cli.delete_flag {
        Some(flag) => flag,
        None => prompt_delete_flag(&mut input, &mut output)?,
    };
    drop(input);

    let mut options = ExtractOptions::default();
    if cli.size_limit.is_some() {
        options.size_limit_bytes = cli.size_limit;
    }

    let config = BulkConfig {
        root,
        delete_after_extract: delete_flag == DeleteFlag::Y,
        options,
    };
    tracing::debug!(
        root = %config.root.display(),
        delete = config.delete_after_extract,
        size_limit = ?config.options.size_limit_bytes,
        "Starting bulk extraction"
    );

    let summary = unzipper::run(&config, &mut |event| println!("{}", describe_event(event)))?;

    println!("{}", describe_summary(&summary));
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

/// Ask for the root folder until a non-empty answer arrives.
fn prompt_directory<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<PathBuf> {
    loop {
        let answer = ask(
            input,
            output,
            "Please enter the folder to recursively query for zip files to unzip",
        )?;
        if !answer.is_empty() {
            return Ok(PathBuf::from(answer));
        }
    }
}

/// Ask for the delete flag until the answer is `y` or `n` (any case).
fn prompt_delete_flag<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> io::Result<DeleteFlag> {
    loop {
        let answer = ask(input, output, "Delete successfully unzipped files? (y, n)")?;
        match DeleteFlag::parse(&answer) {
            Some(flag) => return Ok(flag),
            None => writeln!(output, "Error: '{}' is not one of 'y', 'n'.", answer)?,
        }
    }
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> io::Result<String> {
    write!(output, "{}: ", question)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input closed before an answer was given",
        ));
    }
    Ok(line.trim().to_string())
}

fn describe_event(event: &TaskEvent<'_>) -> String {
    match event {
        TaskEvent::AlreadyExists { task } => {
            format!("{} already exists", task.target_dir.display())
        }
        TaskEvent::Extracted { task, .. } => format!(
            "{} extracted to {}",
            task.source_path.display(),
            task.target_dir.display()
        ),
        TaskEvent::Deleted { task } => format!("{} DELETED", task.source_path.display()),
        TaskEvent::DeleteFailed { task, error } => format!(
            "{} extracted but could not be deleted: {}",
            task.source_path.display(),
            error
        ),
        TaskEvent::Skipped { task, kind, error } => format!(
            "{}: {} was skipped ({})",
            capitalize(kind.describe()),
            task.display_name(),
            error
        ),
    }
}

fn describe_summary(summary: &RunSummary) -> String {
    format!("{} zip files extracted", summary.extracted)
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn wait_for_enter() {
    print!("Press Enter to exit");
    let _ = io::stdout().flush();
    let mut line = String::new();
    let _ = io::stdin().read_line(&mut line);
}
