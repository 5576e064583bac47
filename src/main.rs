//! Segment dumper for IDA Pro databases
//!
//! Opens a database (or a raw binary) headlessly through idalib, then lists
//! its segments and dumps them to disk, either interactively or from the
//! command line.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use sdump::host::console::{
    write_table, ConsoleListView, ConsoleMessages, ConsoleSaveDialog, PresetSaveDialog,
    SharedEditor,
};
use sdump::host::idb::{IdbHost, OpenOptions};
use sdump::table::{header_row, segment_rows, COLUMNS};
use sdump::{expand_path, report_dump, SDumpPlugin, SegmentListResult, SegmentSnapshot, Ui, PLUGIN};
use std::io::Write;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "sdump", version, about = PLUGIN.comment)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the segment table and dump segments interactively
    Run(RunArgs),
    /// Print the segment table
    List(ListArgs),
    /// Dump one segment to a file
    Dump(DumpArgs),
}

#[derive(Args)]
struct DatabaseArgs {
    /// Path to the .i64/.idb database or a raw binary
    path: String,
    /// Output .i64 path when opening a raw binary (defaults to <path>.i64)
    #[arg(long)]
    idb_out: Option<String>,
    /// Force auto-analysis (default: on for raw binaries, off for .i64/.idb)
    #[arg(long)]
    auto_analyse: bool,
    /// Enable IDA console messages (may be verbose)
    #[arg(long)]
    ida_console: bool,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    db: DatabaseArgs,
}

#[derive(Args)]
struct ListArgs {
    #[command(flatten)]
    db: DatabaseArgs,
    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct DumpArgs {
    #[command(flatten)]
    db: DatabaseArgs,
    /// Segment name, or #N for the Nth segment (0-based)
    #[arg(long)]
    segment: String,
    /// Destination file
    #[arg(long)]
    out: String,
}

fn main() -> anyhow::Result<()> {
    // stdout carries the table and messages
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sdump=info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run_session(args),
        Command::List(args) => run_list(args),
        Command::Dump(args) => run_dump(args),
    }
}

fn open_host(args: &DatabaseArgs) -> anyhow::Result<IdbHost> {
    info!("Initializing IDA library");
    idalib::init_library();
    if args.ida_console {
        idalib::enable_console_messages(true);
        info!("IDA console messages enabled");
    }

    let path = expand_path(&args.path);
    let options = OpenOptions {
        idb_out: args.idb_out.as_deref().map(expand_path),
        auto_analyse: args.auto_analyse,
    };
    IdbHost::open(&path, &options)
        .with_context(|| format!("Failed to open database: {}", path.display()))
}

fn run_session(args: RunArgs) -> anyhow::Result<()> {
    let host = open_host(&args.db)?;
    let mut plugin = SDumpPlugin::new();
    let editor = SharedEditor::new()
        .map_err(|e| anyhow::anyhow!("Failed to set up the line editor: {}", e))?;
    let mut ui = Ui {
        view: ConsoleListView::terminal(editor.clone()),
        dialog: ConsoleSaveDialog::terminal(editor),
        messages: ConsoleMessages::stdout(),
    };

    plugin.initialize(&mut ui.messages);
    let report = plugin.invoke(&host, &mut ui, 0);
    plugin.terminate();
    let report = report?;
    info!(
        segments = report.segments,
        done = report.tally.done,
        failed = report.tally.failed,
        cancelled = report.tally.cancelled,
        "Session finished"
    );
    Ok(())
}

fn run_list(args: ListArgs) -> anyhow::Result<()> {
    let host = open_host(&args.db)?;
    let snapshot = SegmentSnapshot::capture(&host)?;
    if args.json {
        let listing = SegmentListResult::from_snapshot(&snapshot);
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        let mut out = std::io::stdout().lock();
        write_table(&mut out, &COLUMNS, &header_row(), &segment_rows(&snapshot))?;
        out.flush()?;
    }
    Ok(())
}

fn run_dump(args: DumpArgs) -> anyhow::Result<()> {
    let host = open_host(&args.db)?;
    let snapshot = SegmentSnapshot::capture(&host)?;
    let segment = snapshot
        .find(&args.segment)
        .ok_or_else(|| sdump::DumpError::SegmentNotFound(args.segment.clone()))?;

    let mut dialog = PresetSaveDialog::new(Some(expand_path(&args.out)));
    let mut messages = ConsoleMessages::stdout();
    let report = report_dump(segment, &host, &mut dialog, &mut messages)?;
    info!(
        path = %report.path.display(),
        size = report.size,
        defined = report.defined,
        "Dump complete"
    );
    Ok(())
}
