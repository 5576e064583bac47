//! The segment table shown to the user.
//!
//! Row 0 is the header, rows `1..=row_count()` are segments. The only
//! action the table accepts is dumping a segment; inserting, deleting and
//! refreshing rows stay disabled.

use crate::dump::report_dump;
use crate::host::{MemoryReader, Messages, SaveDialog};
use crate::segments::SegmentSnapshot;
use tracing::{debug, warn};

pub const COLUMN_COUNT: usize = 4;

pub const HEADER: [&str; COLUMN_COUNT] = ["Segment name", "Start address", "End address", "Size"];

pub const TITLE: &str = "SDump plugin by tamaroth";

/// Display hints for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub title: &'static str,
    pub width: usize,
    /// Values are hexadecimal numbers.
    pub hex: bool,
}

pub const COLUMNS: [Column; COLUMN_COUNT] = [
    Column {
        title: HEADER[0],
        width: 8,
        hex: true,
    },
    Column {
        title: HEADER[1],
        width: 20,
        hex: false,
    },
    Column {
        title: HEADER[2],
        width: 20,
        hex: false,
    },
    Column {
        title: HEADER[3],
        width: 20,
        hex: false,
    },
];

/// Context menu entries offered by the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupAction {
    Insert,
    Delete,
    Dump,
    Refresh,
}

impl PopupAction {
    pub const ALL: [PopupAction; 4] = [
        PopupAction::Insert,
        PopupAction::Delete,
        PopupAction::Dump,
        PopupAction::Refresh,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PopupAction::Insert => "Insert",
            PopupAction::Delete => "Delete",
            PopupAction::Dump => "Dump segment to disk",
            PopupAction::Refresh => "Refresh",
        }
    }

    pub fn is_enabled(self) -> bool {
        matches!(self, PopupAction::Dump)
    }
}

/// Static description of a table handed to the list view.
#[derive(Debug, Clone, Copy)]
pub struct ChooserSpec {
    pub title: &'static str,
    pub columns: &'static [Column],
    pub popup: &'static [PopupAction],
}

pub const SEGMENT_CHOOSER: ChooserSpec = ChooserSpec {
    title: TITLE,
    columns: &COLUMNS,
    popup: &PopupAction::ALL,
};

pub type Row = [String; COLUMN_COUNT];

/// Callbacks the list view invokes while the table is open.
pub trait ChooserSource {
    /// Number of data rows, header excluded.
    fn row_count(&self) -> usize;

    /// Row 0 is the header. `None` past the last row.
    fn render_row(&self, index: usize) -> Option<Row>;

    /// Enter key or the enabled popup action on row `index`. The table stays
    /// open. Returns whether the action succeeded.
    fn on_activate(&mut self, index: usize) -> bool;

    /// The table was closed.
    fn on_close(&mut self);
}

pub fn header_row() -> Row {
    HEADER.map(str::to_string)
}

/// Data rows for every segment in the snapshot, header excluded.
pub fn segment_rows(snapshot: &SegmentSnapshot) -> Vec<Row> {
    (0..snapshot.len())
        .filter_map(|i| segment_row(snapshot, i))
        .collect()
}

fn segment_row(snapshot: &SegmentSnapshot, index: usize) -> Option<Row> {
    let seg = snapshot.get(index)?;
    let width = snapshot.address_width();
    Some([
        seg.name().to_string(),
        width.format(seg.start()),
        width.format(seg.end()),
        width.format(seg.size()),
    ])
}

/// Outcome counts over one session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DumpTally {
    pub done: usize,
    pub failed: usize,
    pub cancelled: usize,
}

/// Table over a segment snapshot that dumps the activated row.
pub struct SegmentTable<'a, R: ?Sized, D, M> {
    snapshot: &'a SegmentSnapshot,
    reader: &'a R,
    dialog: &'a mut D,
    messages: &'a mut M,
    tally: DumpTally,
}

impl<'a, R, D, M> SegmentTable<'a, R, D, M>
where
    R: MemoryReader + ?Sized,
    D: SaveDialog,
    M: Messages,
{
    pub fn new(
        snapshot: &'a SegmentSnapshot,
        reader: &'a R,
        dialog: &'a mut D,
        messages: &'a mut M,
    ) -> Self {
        Self {
            snapshot,
            reader,
            dialog,
            messages,
            tally: DumpTally::default(),
        }
    }

    pub fn tally(&self) -> DumpTally {
        self.tally
    }
}

impl<R, D, M> ChooserSource for SegmentTable<'_, R, D, M>
where
    R: MemoryReader + ?Sized,
    D: SaveDialog,
    M: Messages,
{
    fn row_count(&self) -> usize {
        self.snapshot.len()
    }

    fn render_row(&self, index: usize) -> Option<Row> {
        match index {
            0 => Some(header_row()),
            n => segment_row(self.snapshot, n - 1),
        }
    }

    fn on_activate(&mut self, index: usize) -> bool {
        let Some(segment) = index.checked_sub(1).and_then(|i| self.snapshot.get(i)) else {
            warn!(row = index, "Activated a row without a segment");
            return false;
        };
        match report_dump(segment, self.reader, &mut *self.dialog, &mut *self.messages) {
            Ok(_) => {
                self.tally.done += 1;
                true
            }
            Err(e) if e.is_cancelled() => {
                self.tally.cancelled += 1;
                false
            }
            Err(_) => {
                self.tally.failed += 1;
                false
            }
        }
    }

    fn on_close(&mut self) {
        debug!(
            done = self.tally.done,
            failed = self.tally.failed,
            "Segment table closed"
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::host::mock::{MockHost, RecordingMessages, ScriptedDialog};
    use crate::host::AddressWidth;
    use crate::segments::SegmentSnapshot;
    use crate::table::*;

    fn two_segments() -> MockHost {
        MockHost::new(AddressWidth::Bits32)
            .with_segment(".text", 0x1000, 0x1200)
            .with_segment(".data", 0x2000, 0x2010)
            .with_bytes(0x2000, (0u8..16).collect())
    }

    #[test]
    fn header_and_rows() {
        let host = two_segments();
        let snapshot = SegmentSnapshot::capture(&host).expect("capture");
        let mut dialog = ScriptedDialog::default();
        let mut messages = RecordingMessages::default();
        let table = SegmentTable::new(&snapshot, &host, &mut dialog, &mut messages);

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.render_row(0), Some(header_row()));
        assert_eq!(
            table.render_row(1),
            Some([
                ".text".to_string(),
                "00001000".to_string(),
                "00001200".to_string(),
                "00000200".to_string()
            ])
        );
        assert_eq!(
            table.render_row(2),
            Some([
                ".data".to_string(),
                "00002000".to_string(),
                "00002010".to_string(),
                "00000010".to_string()
            ])
        );
        assert_eq!(table.render_row(3), None);
    }

    #[test]
    fn rows_follow_address_width() {
        let host =
            MockHost::new(AddressWidth::Bits64).with_segment("LOAD", 0x1_0000_0000, 0x1_0000_4000);
        let snapshot = SegmentSnapshot::capture(&host).expect("capture");
        let rows = segment_rows(&snapshot);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][1], "0000000100000000");
        assert_eq!(rows[0][2], "0000000100004000");
        assert_eq!(rows[0][3], "0000000000004000");
    }

    #[test]
    fn empty_binary_has_only_header() {
        let host = MockHost::new(AddressWidth::Bits32);
        let snapshot = SegmentSnapshot::capture(&host).expect("capture");
        let mut dialog = ScriptedDialog::default();
        let mut messages = RecordingMessages::default();
        let table = SegmentTable::new(&snapshot, &host, &mut dialog, &mut messages);
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.render_row(0), Some(header_row()));
        assert_eq!(table.render_row(1), None);
    }

    #[test]
    fn only_dump_popup_enabled() {
        assert_eq!(SEGMENT_CHOOSER.title, "SDump plugin by tamaroth");
        let enabled: Vec<_> = PopupAction::ALL
            .iter()
            .filter(|a| a.is_enabled())
            .map(|a| a.label())
            .collect();
        assert_eq!(enabled, vec!["Dump segment to disk"]);
        assert!(COLUMNS[0].hex);
        assert_eq!(
            COLUMNS.iter().map(|c| c.title).collect::<Vec<_>>(),
            HEADER.to_vec()
        );
    }

    #[test]
    fn activate_dumps_row_and_keeps_counting() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("data.bin");
        let host = two_segments();
        let snapshot = SegmentSnapshot::capture(&host).expect("capture");
        let mut dialog = ScriptedDialog::new([Some(out.clone()), None]);
        let mut messages = RecordingMessages::default();
        let mut table = SegmentTable::new(&snapshot, &host, &mut dialog, &mut messages);

        assert!(table.on_activate(2));
        assert!(!table.on_activate(2));
        assert!(!table.on_activate(0));
        assert!(!table.on_activate(9));
        assert_eq!(
            table.tally(),
            DumpTally {
                done: 1,
                failed: 0,
                cancelled: 1
            }
        );
        table.on_close();

        let bytes = std::fs::read(&out).expect("dump written");
        assert_eq!(bytes, (0u8..16).collect::<Vec<_>>());
        assert_eq!(dialog.prompts, vec![".data", ".data"]);
        assert_eq!(messages.lines, vec!["Dumping .data to disk... Done!\n"]);
    }
}
