//! In-memory host used by unit tests.

use crate::host::{
    AddressWidth, MemoryReader, Messages, SaveDialog, SegmentDescriptor, SegmentSource,
    UNDEFINED_BYTE,
};
use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;

/// Segments plus sparse byte contents. Addresses without bytes read as
/// [`UNDEFINED_BYTE`].
pub(crate) struct MockHost {
    width: AddressWidth,
    segments: Vec<SegmentDescriptor>,
    memory: BTreeMap<u64, u8>,
    reported_count: Option<usize>,
}

impl MockHost {
    pub fn new(width: AddressWidth) -> Self {
        Self {
            width,
            segments: Vec::new(),
            memory: BTreeMap::new(),
            reported_count: None,
        }
    }

    pub fn with_segment(mut self, name: &str, start: u64, end: u64) -> Self {
        self.segments.push(SegmentDescriptor::new(name, start, end));
        self
    }

    pub fn with_bytes(mut self, start: u64, bytes: Vec<u8>) -> Self {
        for (addr, b) in (start..).zip(bytes) {
            self.memory.insert(addr, b);
        }
        self
    }

    /// Claim more (or fewer) segments than actually exist.
    pub fn with_reported_count(mut self, count: usize) -> Self {
        self.reported_count = Some(count);
        self
    }
}

impl SegmentSource for MockHost {
    fn segment_count(&self) -> usize {
        self.reported_count.unwrap_or(self.segments.len())
    }

    fn segment_at(&self, index: usize) -> Option<SegmentDescriptor> {
        self.segments.get(index).cloned()
    }

    fn address_width(&self) -> AddressWidth {
        self.width
    }
}

impl MemoryReader for MockHost {
    fn read_bytes(&self, address: u64, buf: &mut [u8]) -> usize {
        let mut defined = 0;
        for (addr, slot) in (address..).zip(buf.iter_mut()) {
            match self.memory.get(&addr) {
                Some(b) => {
                    *slot = *b;
                    defined += 1;
                }
                None => *slot = UNDEFINED_BYTE,
            }
        }
        defined
    }
}

/// Answers save prompts from a script; cancels once the script runs out.
#[derive(Default)]
pub(crate) struct ScriptedDialog {
    answers: VecDeque<Option<PathBuf>>,
    pub prompts: Vec<String>,
}

impl ScriptedDialog {
    pub fn new(answers: impl IntoIterator<Item = Option<PathBuf>>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            prompts: Vec::new(),
        }
    }
}

impl SaveDialog for ScriptedDialog {
    fn prompt_save_path(&mut self, default_name: &str) -> Option<PathBuf> {
        self.prompts.push(default_name.to_string());
        self.answers.pop_front().flatten()
    }
}

#[derive(Default)]
pub(crate) struct RecordingMessages {
    pub lines: Vec<String>,
    pub warnings: Vec<String>,
}

impl Messages for RecordingMessages {
    fn msg(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }

    fn warning(&mut self, text: &str) {
        self.warnings.push(text.to_string());
    }
}
