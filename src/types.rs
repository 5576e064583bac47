//! Serializable segment listing.

use crate::host::SegmentDescriptor;
use crate::segments::SegmentSnapshot;
use serde::Serialize;

/// Segment info
#[derive(Debug, Clone, Serialize)]
pub struct SegmentInfo {
    pub index: usize,
    pub name: String,
    pub start: String,
    pub end: String,
    pub size: u64,
}

impl SegmentInfo {
    pub fn new(index: usize, seg: &SegmentDescriptor) -> Self {
        Self {
            index,
            name: seg.name().to_string(),
            start: format!("{:#x}", seg.start()),
            end: format!("{:#x}", seg.end()),
            size: seg.size(),
        }
    }
}

/// Listing for every segment of a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentListResult {
    pub segments: Vec<SegmentInfo>,
    pub total: usize,
    pub bits: u32,
}

impl SegmentListResult {
    pub fn from_snapshot(snapshot: &SegmentSnapshot) -> Self {
        let segments: Vec<SegmentInfo> = snapshot
            .iter()
            .enumerate()
            .map(|(i, seg)| SegmentInfo::new(i, seg))
            .collect();
        Self {
            total: segments.len(),
            segments,
            bits: snapshot.address_width().hex_digits() as u32 * 4,
        }
    }
}
