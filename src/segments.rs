//! Segment snapshot taken once per session.

use crate::error::DumpError;
use crate::host::{AddressWidth, SegmentDescriptor, SegmentSource};
use std::mem::size_of;
use tracing::debug;

/// Every segment of the binary, queried once when a session starts.
///
/// The snapshot is never refreshed. It is released as a whole when it goes
/// out of scope at the end of the session.
#[derive(Debug, Clone)]
pub struct SegmentSnapshot {
    segments: Vec<SegmentDescriptor>,
    width: AddressWidth,
}

impl SegmentSnapshot {
    /// List the host's segments in host order.
    pub fn capture<S: SegmentSource + ?Sized>(source: &S) -> Result<Self, DumpError> {
        let count = source.segment_count();
        debug!(count, "Capturing segments");

        let mut segments = Vec::new();
        segments
            .try_reserve_exact(count)
            .map_err(|_| DumpError::AllocationFailure {
                requested: count.saturating_mul(size_of::<SegmentDescriptor>()),
            })?;
        for index in 0..count {
            let seg = source
                .segment_at(index)
                .ok_or_else(|| DumpError::SegmentNotFound(format!("#{index}")))?;
            segments.push(seg);
        }

        Ok(Self {
            segments,
            width: source.address_width(),
        })
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SegmentDescriptor> {
        self.segments.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SegmentDescriptor> {
        self.segments.iter()
    }

    pub fn address_width(&self) -> AddressWidth {
        self.width
    }

    /// Look a segment up by exact name, or by 0-based position written `#N`.
    pub fn find(&self, query: &str) -> Option<&SegmentDescriptor> {
        if let Some(index) = query.strip_prefix('#').and_then(|n| n.parse::<usize>().ok()) {
            return self.get(index);
        }
        self.segments.iter().find(|seg| seg.name() == query)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::DumpError;
    use crate::host::mock::MockHost;
    use crate::host::{AddressWidth, SegmentDescriptor, SegmentSource, MAX_NAME_LEN};
    use crate::segments::SegmentSnapshot;

    #[test]
    fn capture_keeps_host_order() {
        let host = MockHost::new(AddressWidth::Bits32)
            .with_segment(".text", 0x1000, 0x1200)
            .with_segment(".data", 0x2000, 0x2010)
            .with_segment(".bss", 0x3000, 0x3000);
        let snapshot = SegmentSnapshot::capture(&host).expect("capture");

        assert_eq!(snapshot.len(), host.segment_count());
        let names: Vec<_> = snapshot.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec![".text", ".data", ".bss"]);
        assert_eq!(snapshot.get(1).map(|s| s.size()), Some(0x10));
        assert_eq!(snapshot.get(2).map(|s| s.size()), Some(0));
        assert_eq!(snapshot.address_width(), AddressWidth::Bits32);
    }

    #[test]
    fn capture_reports_missing_segment() {
        let host = MockHost::new(AddressWidth::Bits32)
            .with_segment(".text", 0x1000, 0x1200)
            .with_reported_count(2);
        let err = SegmentSnapshot::capture(&host).expect_err("short host");
        assert!(matches!(err, DumpError::SegmentNotFound(ref s) if s == "#1"));
    }

    #[test]
    fn find_by_name_or_index() {
        let host = MockHost::new(AddressWidth::Bits32)
            .with_segment(".text", 0x1000, 0x1200)
            .with_segment(".data", 0x2000, 0x2010);
        let snapshot = SegmentSnapshot::capture(&host).expect("capture");

        assert_eq!(snapshot.find(".data").map(|s| s.start()), Some(0x2000));
        assert_eq!(snapshot.find("#0").map(|s| s.name()), Some(".text"));
        assert!(snapshot.find("#5").is_none());
        assert!(snapshot.find(".rdata").is_none());
    }

    #[test]
    fn long_names_are_bounded() {
        let name = "é".repeat(MAX_NAME_LEN);
        let seg = SegmentDescriptor::new(name, 0, 1);
        assert!(seg.name().len() < MAX_NAME_LEN);
        assert!(seg.name().chars().all(|c| c == 'é'));
    }

    #[test]
    fn inverted_range_has_zero_size() {
        let seg = SegmentDescriptor::new("odd", 0x2000, 0x1000);
        assert_eq!(seg.size(), 0);
    }
}
