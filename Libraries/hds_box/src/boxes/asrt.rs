use serde::{Deserialize, Serialize};

use super::generic::{pretty_line, typed_box, Mp4Box, TypedBox};

// Width of one segment run record: first segment and fragments per segment.
const SEGMENT_RUN_SIZE: usize = 8;

/// One row of a segment run table: from `first_segment` on, every segment holds
/// `fragments_per_segment` fragments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentRunEntry {
    pub first_segment: u32,
    pub fragments_per_segment: u32,
}

// The `AsrtBox` struct represents a Segment Run Table Box.
// Payload layout:
// - 0: version (8 bits)
// - 1: update (24 bits, the full box flags)
// - 4: quality entry count (8 bits), followed by that many zero-terminated strings
// - then: segment run entry count (32 bits), followed by 8 byte `SegmentRunEntry` records
pub struct AsrtBox<'a>(Mp4Box<'a>);

typed_box!(AsrtBox);

impl AsrtBox<'static> {
    pub fn new() -> Self {
        let mut b = AsrtBox(Mp4Box::with_type(Self::BOX_TYPE));
        b.set_version(0);
        b.set_update(0);
        b.set_u8(0, 4); // quality entry count
        b.set_u32(0, 5); // segment run entry count
        b
    }
}

impl AsrtBox<'_> {
    pub fn version(&mut self) -> u8 {
        self.get_u8(0)
    }

    pub fn set_version(&mut self, version: u8) {
        self.set_u8(version, 0)
    }

    pub fn update(&mut self) -> u32 {
        self.get_u24(1)
    }

    pub fn set_update(&mut self, update: u32) {
        self.set_u24(update, 1)
    }

    pub fn quality_entry_count(&mut self) -> u8 {
        self.get_u8(4)
    }

    pub fn quality_entry(&mut self, no: usize) -> String {
        self.get_table_string(4, no)
    }

    pub fn set_quality_entry(&mut self, no: usize, entry: &str) {
        self.set_table_string(4, no, entry)
    }

    fn segment_run_count_offset(&mut self) -> usize {
        let count = self.quality_entry_count() as usize;
        self.skip_strings(5, count)
    }

    pub fn segment_run_entry_count(&mut self) -> u32 {
        let offset = self.segment_run_count_offset();
        self.get_u32(offset)
    }

    /// Stores run `no`, appending zeroed runs when the table is shorter.
    pub fn set_segment_run(&mut self, no: usize, run: SegmentRunEntry) {
        let count_offset = self.segment_run_count_offset();
        let Some(offset) = self.record_slot(count_offset, count_offset + 4, no, SEGMENT_RUN_SIZE)
        else {
            return;
        };
        self.set_u32(run.first_segment, offset);
        self.set_u32(run.fragments_per_segment, offset + 4);
    }

    /// Reads run `no`, or an all zero run past the end of the table.
    pub fn segment_run(&mut self, no: usize) -> SegmentRunEntry {
        let count_offset = self.segment_run_count_offset();
        if no >= self.get_u32(count_offset) as usize {
            return SegmentRunEntry::default();
        }
        let offset = count_offset + 4 + no * SEGMENT_RUN_SIZE;
        SegmentRunEntry {
            first_segment: self.get_u32(offset),
            fragments_per_segment: self.get_u32(offset + 4),
        }
    }

    pub fn to_pretty_string(&mut self, indent: usize) -> String {
        let mut r = String::new();
        pretty_line(&mut r, indent, "[asrt] Segment Run Table");
        let version = self.version();
        pretty_line(&mut r, indent + 1, format_args!("Version {}", version));
        if self.update() != 0 {
            pretty_line(&mut r, indent + 1, "Update");
        } else {
            pretty_line(&mut r, indent + 1, "Replacement or new table");
        }

        let qualities = self.quality_entry_count() as usize;
        pretty_line(&mut r, indent + 1, format_args!("QualityEntryTable ({})", qualities));
        for i in 0..qualities {
            let entry = self.quality_entry(i);
            pretty_line(&mut r, indent + 2, entry);
        }

        let runs = self.segment_run_entry_count() as usize;
        pretty_line(&mut r, indent + 1, format_args!("SegmentRunEntryTable ({})", runs));
        for i in 0..runs {
            let run = self.segment_run(i);
            pretty_line(&mut r, indent + 2, format_args!("FirstSegment {}", run.first_segment));
            pretty_line(
                &mut r,
                indent + 2,
                format_args!("FragmentsPerSegment {}", run.fragments_per_segment),
            );
        }
        r
    }
}

impl<'a> TypedBox<'a> for AsrtBox<'a> {
    const BOX_TYPE: [u8; 4] = *b"asrt";

    fn from_box(inner: Mp4Box<'a>) -> Self {
        AsrtBox(inner)
    }

    fn into_box(self) -> Mp4Box<'a> {
        self.0
    }

    fn to_pretty_string(&mut self, indent: usize) -> String {
        AsrtBox::to_pretty_string(self, indent)
    }
}
