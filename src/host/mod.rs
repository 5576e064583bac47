//! Host services consumed by the segment dumper.
//!
//! The host owns the segments and their bytes, and it provides the
//! interactive pieces: the list view, the save dialog and the message
//! window. [`idb`] implements the data side on top of idalib and
//! [`console`] implements the interactive side on a terminal.

pub mod console;
pub mod idb;
#[cfg(test)]
pub(crate) mod mock;

use crate::table::{ChooserSource, ChooserSpec};
use std::path::PathBuf;

/// Size of the host's bounded name buffer, terminator included.
pub const MAX_NAME_LEN: usize = 1024;

/// Byte the host reports for addresses without defined content.
pub const UNDEFINED_BYTE: u8 = 0xFF;

/// Address size of the loaded binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressWidth {
    Bits16,
    Bits32,
    Bits64,
}

impl AddressWidth {
    /// Number of hex digits needed to print any address of this width.
    pub fn hex_digits(self) -> usize {
        match self {
            AddressWidth::Bits16 => 4,
            AddressWidth::Bits32 => 8,
            AddressWidth::Bits64 => 16,
        }
    }

    /// Format an address or size as zero-padded uppercase hex.
    pub fn format(self, value: u64) -> String {
        format!("{:0width$X}", value, width = self.hex_digits())
    }
}

/// Values of one host segment, copied out of the host when queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentDescriptor {
    name: String,
    start: u64,
    end: u64,
}

impl SegmentDescriptor {
    /// Names longer than the host's name buffer are cut at a char boundary.
    pub fn new(name: impl Into<String>, start: u64, end: u64) -> Self {
        let mut name = name.into();
        if name.len() >= MAX_NAME_LEN {
            let mut cut = MAX_NAME_LEN - 1;
            while !name.is_char_boundary(cut) {
                cut -= 1;
            }
            name.truncate(cut);
        }
        Self { name, start, end }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn size(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }
}

/// Segment enumeration.
pub trait SegmentSource {
    fn segment_count(&self) -> usize;

    /// The `index`th segment, `0..segment_count()`.
    fn segment_at(&self, index: usize) -> Option<SegmentDescriptor>;

    fn address_width(&self) -> AddressWidth;
}

/// Raw byte access to the loaded image.
pub trait MemoryReader {
    /// Fill `buf` with the bytes starting at `address`.
    ///
    /// Reads are best-effort: bytes without defined content are filled with
    /// the host's placeholder instead of failing. Returns how many bytes had
    /// defined content.
    fn read_bytes(&self, address: u64, buf: &mut [u8]) -> usize;
}

/// Synchronous "save file" prompt.
pub trait SaveDialog {
    /// `None` when the user cancels.
    fn prompt_save_path(&mut self, default_name: &str) -> Option<PathBuf>;
}

/// Interactive table driven by a [`ChooserSource`].
pub trait ListView {
    /// Runs the table until the user closes it. Calls `source.on_close()`
    /// exactly once before returning. Returns the 1-based row the user
    /// picked when closing, if any.
    fn choose<S: ChooserSource>(&mut self, spec: &ChooserSpec, source: &mut S) -> Option<usize>;
}

/// The host's message window.
pub trait Messages {
    fn msg(&mut self, text: &str);
    fn warning(&mut self, text: &str);
}
