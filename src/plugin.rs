//! Plugin lifecycle: load, run a list→select→dump session, unload.

use crate::error::DumpError;
use crate::host::{ListView, MemoryReader, Messages, SaveDialog, SegmentSource};
use crate::segments::SegmentSnapshot;
use crate::table::{ChooserSource, DumpTally, SegmentTable, SEGMENT_CHOOSER};
use tracing::{info, warn};

/// Registration data shown by the host.
#[derive(Debug, Clone, Copy)]
pub struct PluginInfo {
    pub name: &'static str,
    pub hotkey: &'static str,
    pub comment: &'static str,
    pub help: &'static str,
}

pub const PLUGIN: PluginInfo = PluginInfo {
    name: "SDump",
    hotkey: "Alt-5",
    comment: "This plugin allows you to dump segments to disk.",
    help: "With this plugin you can dump segments to disk while debugging a program. \
           To activate, use Alt-5",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginStatus {
    /// Keep the plugin loaded.
    Ok,
}

/// Interactive services used during a session.
pub struct Ui<V, D, M> {
    pub view: V,
    pub dialog: D,
    pub messages: M,
}

/// What happened during one session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub segments: usize,
    /// Row picked when the table was closed.
    pub selected: Option<usize>,
    pub tally: DumpTally,
}

/// The segment dump plugin. Holds no state between sessions.
#[derive(Debug, Default)]
pub struct SDumpPlugin;

impl SDumpPlugin {
    pub fn new() -> Self {
        Self
    }

    pub fn initialize<M: Messages + ?Sized>(&mut self, messages: &mut M) -> PluginStatus {
        messages.msg(&format!("{} plugin loaded ...\n", PLUGIN.name));
        info!(name = PLUGIN.name, hotkey = PLUGIN.hotkey, "Plugin loaded");
        PluginStatus::Ok
    }

    pub fn terminate(&mut self) {
        info!(name = PLUGIN.name, "Plugin unloaded");
    }

    /// Run one session: snapshot the segments, show the table until the user
    /// closes it, then dump the row picked on close, if any.
    ///
    /// Fails only when the segment list cannot be built, after warning the
    /// user. Individual dumps report through the message window.
    pub fn invoke<H, V, D, M>(
        &mut self,
        host: &H,
        ui: &mut Ui<V, D, M>,
        arg: i32,
    ) -> Result<SessionReport, DumpError>
    where
        H: SegmentSource + MemoryReader + ?Sized,
        V: ListView,
        D: SaveDialog,
        M: Messages,
    {
        info!(arg, "Starting segment dump session");
        let snapshot = match SegmentSnapshot::capture(host) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Failed to list segments");
                let text = match &e {
                    DumpError::AllocationFailure { .. } => {
                        format!("{}: Error while allocating memory...\n", PLUGIN.name)
                    }
                    e => format!("{}: {}\n", PLUGIN.name, e),
                };
                ui.messages.warning(&text);
                return Err(e);
            }
        };

        let Ui {
            view,
            dialog,
            messages,
        } = ui;
        let mut table = SegmentTable::new(&snapshot, host, dialog, messages);
        let selected = view.choose(&SEGMENT_CHOOSER, &mut table);
        if let Some(row) = selected {
            table.on_activate(row);
        }

        let report = SessionReport {
            segments: snapshot.len(),
            selected,
            tally: table.tally(),
        };
        info!(
            segments = report.segments,
            done = report.tally.done,
            failed = report.tally.failed,
            "Segment dump session ended"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::DumpError;
    use crate::host::console::ConsoleListView;
    use crate::host::mock::{MockHost, RecordingMessages, ScriptedDialog};
    use crate::host::AddressWidth;
    use crate::plugin::{PluginStatus, SDumpPlugin, Ui, PLUGIN};
    use crate::table::DumpTally;
    use std::io::Cursor;

    fn scenario_host() -> MockHost {
        MockHost::new(AddressWidth::Bits32)
            .with_segment(".text", 0x1000, 0x1200)
            .with_segment(".data", 0x2000, 0x2010)
            .with_bytes(0x1000, vec![0xCC; 0x200])
            .with_bytes(0x2000, (0u8..16).rev().collect())
    }

    #[test]
    fn initialize_prints_banner() {
        let mut plugin = SDumpPlugin::new();
        let mut messages = RecordingMessages::default();
        assert_eq!(plugin.initialize(&mut messages), PluginStatus::Ok);
        assert_eq!(messages.lines, vec!["SDump plugin loaded ...\n"]);
        assert_eq!(PLUGIN.hotkey, "Alt-5");
        plugin.terminate();
    }

    #[test]
    fn session_dumps_activated_and_selected_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let text_out = dir.path().join("text.bin");
        let data_out = dir.path().join("out.bin");
        let host = scenario_host();
        let mut ui = Ui {
            view: ConsoleListView::new(Cursor::new("1\nselect 2\n"), Vec::new()),
            dialog: ScriptedDialog::new([Some(text_out.clone()), Some(data_out.clone())]),
            messages: RecordingMessages::default(),
        };

        let report = SDumpPlugin::new()
            .invoke(&host, &mut ui, 0)
            .expect("session");
        assert_eq!(report.segments, 2);
        assert_eq!(report.selected, Some(2));
        assert_eq!(
            report.tally,
            DumpTally {
                done: 2,
                failed: 0,
                cancelled: 0
            }
        );
        assert_eq!(std::fs::read(&text_out).expect("text").len(), 0x200);
        assert_eq!(
            std::fs::read(&data_out).expect("data"),
            (0u8..16).rev().collect::<Vec<_>>()
        );
        assert_eq!(
            ui.messages.lines,
            vec![
                "Dumping .text to disk... Done!\n",
                "Dumping .data to disk... Done!\n"
            ]
        );
        assert_eq!(ui.dialog.prompts, vec![".text", ".data"]);
    }

    #[test]
    fn cancelled_session_leaves_no_trace() {
        let host = scenario_host();
        let mut ui = Ui {
            view: ConsoleListView::new(Cursor::new("2\nq\n"), Vec::new()),
            dialog: ScriptedDialog::new([None]),
            messages: RecordingMessages::default(),
        };

        let report = SDumpPlugin::new()
            .invoke(&host, &mut ui, 0)
            .expect("session");
        assert_eq!(report.selected, None);
        assert_eq!(report.tally.cancelled, 1);
        assert!(ui.messages.lines.is_empty());
        assert!(ui.messages.warnings.is_empty());
    }

    #[test]
    fn broken_segment_list_warns() {
        let host = scenario_host().with_reported_count(3);
        let mut ui = Ui {
            view: ConsoleListView::new(Cursor::new(""), Vec::new()),
            dialog: ScriptedDialog::default(),
            messages: RecordingMessages::default(),
        };

        let err = SDumpPlugin::new()
            .invoke(&host, &mut ui, 0)
            .expect_err("capture fails");
        assert!(matches!(err, DumpError::SegmentNotFound(_)));
        assert_eq!(
            ui.messages.warnings,
            vec!["SDump: Segment not found: #2\n"]
        );
    }
}
