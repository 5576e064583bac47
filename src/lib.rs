//! Segment dumper for IDA Pro databases
//!
//! Lists the segments of a loaded binary in a table and, when the user picks
//! one, copies its raw bytes verbatim into a file chosen through a save
//! prompt.
//!
//! # Architecture
//!
//! Everything the host provides sits behind the traits in [`host`]:
//!
//! - **Data**: [`host::SegmentSource`] and [`host::MemoryReader`],
//!   implemented over idalib by [`host::idb::IdbHost`].
//! - **Interaction**: [`host::ListView`], [`host::SaveDialog`] and
//!   [`host::Messages`], implemented for terminals in [`host::console`].
//!
//! A session ([`plugin::SDumpPlugin::invoke`]) takes a
//! [`segments::SegmentSnapshot`], hands a [`table::SegmentTable`] to the list
//! view and runs [`dump::dump_segment`] for every activated row. The
//! snapshot is dropped when the session returns.
//!
//! # Commands
//!
//! - `run`: interactive session
//! - `list`: print the segment table (or JSON)
//! - `dump`: dump one segment to a given file

use std::path::PathBuf;

pub mod dump;
pub mod error;
pub mod host;
pub mod plugin;
pub mod segments;
pub mod table;
pub mod types;

pub use dump::{default_file_name, dump_segment, report_dump, DumpReport};
pub use error::DumpError;
pub use host::{
    AddressWidth, ListView, MemoryReader, Messages, SaveDialog, SegmentDescriptor, SegmentSource,
};
pub use plugin::{PluginInfo, PluginStatus, SDumpPlugin, SessionReport, Ui, PLUGIN};
pub use segments::SegmentSnapshot;
pub use table::{ChooserSource, SegmentTable};
pub use types::{SegmentInfo, SegmentListResult};

/// Expand `~/` prefix to the user's home directory.
pub fn expand_path(path: &str) -> PathBuf {
    path.strip_prefix("~/")
        .and_then(|stripped| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(stripped)))
        .unwrap_or_else(|| PathBuf::from(path))
}
