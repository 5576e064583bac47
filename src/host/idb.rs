//! Segment and memory services backed by an idalib database.

use crate::error::DumpError;
use crate::host::{AddressWidth, MemoryReader, SegmentDescriptor, SegmentSource, UNDEFINED_BYTE};
use idalib::{IDBOpenOptions, IDB};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Largest single `get_bytes` request. Keeps idalib's own copy of the bytes
/// small no matter how large the segment is.
const READ_CHUNK_SIZE: usize = 1 << 20;

/// Fill `buf` from `address` with `fetch` calls of at most `chunk` bytes.
/// A fetch may come back short over unloaded ranges; the missing bytes become
/// [`UNDEFINED_BYTE`]. Returns the total number of bytes fetched.
pub(crate) fn read_in_chunks<F>(
    address: u64,
    buf: &mut [u8],
    chunk: usize,
    mut fetch: F,
) -> usize
where
    F: FnMut(u64, usize) -> Vec<u8>,
{
    let mut defined = 0;
    for (i, part) in buf.chunks_mut(chunk).enumerate() {
        let addr = address.wrapping_add((i * chunk) as u64);
        let bytes = fetch(addr, part.len());
        let n = bytes.len().min(part.len());
        part[..n].copy_from_slice(&bytes[..n]);
        part[n..].fill(UNDEFINED_BYTE);
        defined += n;
    }
    defined
}

/// How to open the input file.
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    /// Output .i64 when opening a raw binary (defaults to `<path>.i64`).
    pub idb_out: Option<PathBuf>,
    /// Force auto-analysis (always on for raw binaries).
    pub auto_analyse: bool,
}

/// Whether `path` is an existing IDA database rather than a raw binary.
pub fn is_database_path(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    ext == "i64" || ext == "idb"
}

/// Open a database or a raw binary. `idalib::init_library` must have run.
pub fn open_database(path: &Path, options: &OpenOptions) -> Result<IDB, DumpError> {
    let start = Instant::now();
    let db = if is_database_path(path) {
        info!(path = %path.display(), auto_analyse = options.auto_analyse, "Opening existing IDB");
        IDB::open_with(path, options.auto_analyse, true)?
    } else {
        let out_path = options
            .idb_out
            .clone()
            .unwrap_or_else(|| path.with_extension("i64"));
        info!(
            path = %path.display(),
            idb_out = %out_path.display(),
            "Opening raw binary with auto-analysis"
        );
        let mut opts = IDBOpenOptions::new();
        opts.auto_analyse(true);
        opts.idb(&out_path).save(true).open(path)?
    };
    info!(elapsed = start.elapsed().as_secs(), "Database opened");
    Ok(db)
}

/// Host services over an open database.
pub struct IdbHost {
    db: IDB,
}

impl IdbHost {
    pub fn new(db: IDB) -> Self {
        Self { db }
    }

    pub fn open(path: &Path, options: &OpenOptions) -> Result<Self, DumpError> {
        open_database(path, options).map(Self::new)
    }

}

impl SegmentSource for IdbHost {
    fn segment_count(&self) -> usize {
        self.db.segments().count()
    }

    fn segment_at(&self, index: usize) -> Option<SegmentDescriptor> {
        self.db.segments().nth(index).map(|(_id, seg)| {
            SegmentDescriptor::new(
                seg.name().unwrap_or_default(),
                seg.start_address(),
                seg.end_address(),
            )
        })
    }

    fn address_width(&self) -> AddressWidth {
        let meta = self.db.meta();
        if meta.is_64bit() {
            AddressWidth::Bits64
        } else if meta.is_32bit_exactly() {
            AddressWidth::Bits32
        } else {
            AddressWidth::Bits16
        }
    }
}

impl MemoryReader for IdbHost {
    fn read_bytes(&self, address: u64, buf: &mut [u8]) -> usize {
        let defined = read_in_chunks(address, buf, READ_CHUNK_SIZE, |addr, len| {
            self.db.get_bytes(addr, len)
        });
        debug!(
            address = format!("{:#x}", address),
            requested = buf.len(),
            defined,
            "Read bytes"
        );
        defined
    }
}
