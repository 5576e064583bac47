//! Terminal implementations of the interactive host services.
//!
//! Input is read line by line. The table and the save prompt read the same
//! terminal, so they share one line editor through [`SharedEditor`].

use crate::expand_path;
use crate::host::{ListView, Messages, SaveDialog};
use crate::table::{header_row, ChooserSource, ChooserSpec, Column, PopupAction, Row};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::cell::RefCell;
use std::io::{self, BufRead, Cursor, Stdout, Write};
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{debug, warn};

/// A source of input lines.
pub trait LineInput {
    /// Show `prompt` and read the next line without its terminator.
    /// `None` at end of input.
    fn next_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

fn trim_line(mut line: String) -> String {
    let kept = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(kept);
    line
}

/// Line editor with history, shared by every service reading the terminal.
#[derive(Clone)]
pub struct SharedEditor {
    editor: Rc<RefCell<DefaultEditor>>,
}

impl SharedEditor {
    pub fn new() -> Result<Self, ReadlineError> {
        Ok(Self {
            editor: Rc::new(RefCell::new(DefaultEditor::new()?)),
        })
    }
}

impl LineInput for SharedEditor {
    fn next_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let mut editor = self.editor.borrow_mut();
        match editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(e) = editor.add_history_entry(line.as_str()) {
                        debug!(error = %e, "Failed to record history entry");
                    }
                }
                Ok(Some(trim_line(line)))
            }
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => Ok(None),
            Err(ReadlineError::Io(e)) => Err(e),
            Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
        }
    }
}

/// Scripted input; prompts are not echoed.
impl<T: AsRef<[u8]>> LineInput for Cursor<T> {
    fn next_line(&mut self, _prompt: &str) -> io::Result<Option<String>> {
        let mut line = String::new();
        if BufRead::read_line(self, &mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(trim_line(line)))
    }
}

/// Write the header and data rows as aligned text. Data rows are numbered
/// from 1, matching the row indices the list view accepts.
pub fn write_table<W: Write>(
    out: &mut W,
    columns: &[Column],
    header: &Row,
    rows: &[Row],
) -> io::Result<()> {
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            rows.iter()
                .map(|r| r[i].len())
                .chain([header[i].len(), col.width])
                .max()
                .unwrap_or(col.width)
        })
        .collect();
    let number_width = rows.len().to_string().len().max(1);

    write!(out, "{:>number_width$}  ", "#")?;
    write_cells(out, columns, &widths, header)?;
    for (i, row) in rows.iter().enumerate() {
        write!(out, "{:>number_width$}  ", i + 1)?;
        write_cells(out, columns, &widths, row)?;
    }
    Ok(())
}

fn write_cells<W: Write>(
    out: &mut W,
    columns: &[Column],
    widths: &[usize],
    row: &Row,
) -> io::Result<()> {
    let cells: Vec<String> = columns
        .iter()
        .zip(widths)
        .zip(row.iter())
        .map(|((col, &w), cell)| {
            if col.hex {
                format!("{cell:>w$}")
            } else {
                format!("{cell:<w$}")
            }
        })
        .collect();
    writeln!(out, "{}", cells.join("  ").trim_end())
}

/// What the user typed at the table prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Enter key or the dump popup action; the table stays open.
    Activate(usize),
    /// Pick a row and close the table.
    Select(usize),
    Popup(PopupAction),
    List,
    Close,
    Help,
}

impl Command {
    fn parse(line: &str) -> Command {
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            return Command::Help;
        };
        let row = words.next().and_then(|w| w.parse::<usize>().ok());
        match (first.to_ascii_lowercase().as_str(), row) {
            ("dump", Some(n)) => Command::Activate(n),
            ("select", Some(n)) => Command::Select(n),
            ("insert", _) => Command::Popup(PopupAction::Insert),
            ("delete", _) => Command::Popup(PopupAction::Delete),
            ("refresh", _) => Command::Popup(PopupAction::Refresh),
            ("list", _) => Command::List,
            ("q" | "quit" | "close", _) => Command::Close,
            (word, None) => word.parse().map(Command::Activate).unwrap_or(Command::Help),
            _ => Command::Help,
        }
    }
}

const USAGE: &str =
    "Commands: <row> or dump <row> to dump, select <row> to dump and close, list, q to close";

/// Table printed on a terminal, driven by typed commands.
pub struct ConsoleListView<I, W> {
    input: I,
    output: W,
}

impl ConsoleListView<SharedEditor, Stdout> {
    pub fn terminal(editor: SharedEditor) -> Self {
        Self::new(editor, io::stdout())
    }
}

impl<I: LineInput, W: Write> ConsoleListView<I, W> {
    pub fn new(input: I, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn render<S: ChooserSource>(&mut self, spec: &ChooserSpec, source: &S) -> io::Result<()> {
        let rows: Vec<Row> = (1..=source.row_count())
            .filter_map(|i| source.render_row(i))
            .collect();
        let header = source.render_row(0).unwrap_or_else(header_row);
        writeln!(self.output, "{}", spec.title)?;
        write_table(&mut self.output, spec.columns, &header, &rows)?;
        let actions: Vec<String> = spec
            .popup
            .iter()
            .map(|a| {
                if a.is_enabled() {
                    a.label().to_string()
                } else {
                    format!("({})", a.label())
                }
            })
            .collect();
        writeln!(self.output, "Actions: {}", actions.join(", "))?;
        writeln!(self.output, "{USAGE}")?;
        self.output.flush()
    }

    fn run<S: ChooserSource>(
        &mut self,
        spec: &ChooserSpec,
        source: &mut S,
    ) -> io::Result<Option<usize>> {
        self.render(spec, source)?;
        loop {
            self.output.flush()?;
            let Some(line) = self.input.next_line("> ")? else {
                return Ok(None);
            };
            let command = Command::parse(&line);
            debug!(?command, "Table command");
            match command {
                Command::Activate(row) | Command::Select(row)
                    if row == 0 || row > source.row_count() =>
                {
                    writeln!(self.output, "No such row: {row}")?;
                }
                Command::Activate(row) => {
                    source.on_activate(row);
                    self.render(spec, source)?;
                }
                Command::Select(row) => return Ok(Some(row)),
                Command::Popup(action) => {
                    writeln!(self.output, "{}: action disabled", action.label())?;
                }
                Command::List => self.render(spec, source)?,
                Command::Close => return Ok(None),
                Command::Help => writeln!(self.output, "{USAGE}")?,
            }
        }
    }
}

impl<I: LineInput, W: Write> ListView for ConsoleListView<I, W> {
    fn choose<S: ChooserSource>(&mut self, spec: &ChooserSpec, source: &mut S) -> Option<usize> {
        let selection = self.run(spec, source).unwrap_or_else(|e| {
            warn!(error = %e, "Terminal error, closing table");
            None
        });
        source.on_close();
        selection
    }
}

/// Save prompt on a terminal. An empty answer takes the suggested name,
/// `-` or end of input cancels.
pub struct ConsoleSaveDialog<I, W> {
    input: I,
    output: W,
}

impl ConsoleSaveDialog<SharedEditor, Stdout> {
    pub fn terminal(editor: SharedEditor) -> Self {
        Self::new(editor, io::stdout())
    }
}

impl<I: LineInput, W: Write> ConsoleSaveDialog<I, W> {
    pub fn new(input: I, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, default_name: &str) -> io::Result<Option<String>> {
        self.output.flush()?;
        self.input
            .next_line(&format!("Enter a name of the file. [{default_name}]: "))
    }
}

impl<I: LineInput, W: Write> SaveDialog for ConsoleSaveDialog<I, W> {
    fn prompt_save_path(&mut self, default_name: &str) -> Option<PathBuf> {
        let answer = match self.ask(default_name) {
            Ok(answer) => answer?,
            Err(e) => {
                warn!(error = %e, "Failed to read file name");
                return None;
            }
        };
        match answer.trim() {
            "-" => None,
            "" => Some(expand_path(default_name)),
            path => Some(expand_path(path)),
        }
    }
}

/// Dialog that always answers with a path fixed up front.
pub struct PresetSaveDialog {
    path: Option<PathBuf>,
}

impl PresetSaveDialog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl SaveDialog for PresetSaveDialog {
    fn prompt_save_path(&mut self, default_name: &str) -> Option<PathBuf> {
        debug!(default_name, path = ?self.path, "Using preset destination");
        self.path.clone()
    }
}

/// Message window written to a stream.
pub struct ConsoleMessages<W> {
    out: W,
}

impl ConsoleMessages<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleMessages<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Messages for ConsoleMessages<W> {
    fn msg(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            warn!(error = %e, "Failed to write message");
        }
    }

    fn warning(&mut self, text: &str) {
        warn!(message = text.trim_end(), "Warning shown to user");
        if let Err(e) = writeln!(self.out, "Warning: {}", text.trim_end()) {
            warn!(error = %e, "Failed to write warning");
        }
    }
}
