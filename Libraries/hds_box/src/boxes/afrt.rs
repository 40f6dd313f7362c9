use serde::{Deserialize, Serialize};

use super::generic::{pretty_line, typed_box, Mp4Box, TypedBox};

// Width of one fragment run record.
const FRAGMENT_RUN_SIZE: usize = 17;

/// One row of a fragment run table: from `first_fragment` on, fragments start at
/// `first_timestamp` and last `duration` timescale units each.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FragmentRunEntry {
    pub first_fragment: u32,
    pub first_timestamp: u64,
    pub duration: u32,
    pub discontinuity: u8,
}

// The `AfrtBox` struct represents a Fragment Run Table Box.
// Payload layout:
// - 0: version (8 bits)
// - 1: update (24 bits, the full box flags)
// - 4: timescale (32 bits)
// - 8: quality entry count (8 bits), followed by that many zero-terminated strings
// - then: fragment run entry count (32 bits), followed by `FragmentRunEntry` records:
//   first fragment (32 bits), first timestamp (64 bits), duration (32 bits) and
//   discontinuity indicator (8 bits)
pub struct AfrtBox<'a>(Mp4Box<'a>);

typed_box!(AfrtBox);

impl AfrtBox<'static> {
    pub fn new() -> Self {
        let mut b = AfrtBox(Mp4Box::with_type(Self::BOX_TYPE));
        b.set_version(0);
        b.set_update(0);
        b.set_timescale(1000);
        b.set_u8(0, 8); // quality entry count
        b.set_u32(0, 9); // fragment run entry count
        b
    }
}

impl AfrtBox<'_> {
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

    pub fn timescale(&mut self) -> u32 {
        self.get_u32(4)
    }

    pub fn set_timescale(&mut self, timescale: u32) {
        self.set_u32(timescale, 4)
    }

    pub fn quality_entry_count(&mut self) -> u8 {
        self.get_u8(8)
    }

    pub fn quality_entry(&mut self, no: usize) -> String {
        self.get_table_string(8, no)
    }

    pub fn set_quality_entry(&mut self, no: usize, entry: &str) {
        self.set_table_string(8, no, entry)
    }

    fn fragment_run_count_offset(&mut self) -> usize {
        let count = self.quality_entry_count() as usize;
        self.skip_strings(9, count)
    }

    pub fn fragment_run_count(&mut self) -> u32 {
        let offset = self.fragment_run_count_offset();
        self.get_u32(offset)
    }

    /// Stores run `no`, appending zeroed runs when the table is shorter.
    pub fn set_fragment_run(&mut self, no: usize, run: FragmentRunEntry) {
        let count_offset = self.fragment_run_count_offset();
        let Some(offset) = self.record_slot(count_offset, count_offset + 4, no, FRAGMENT_RUN_SIZE)
        else {
            return;
        };
        self.set_u32(run.first_fragment, offset);
        self.set_u64(run.first_timestamp, offset + 4);
        self.set_u32(run.duration, offset + 12);
        self.set_u8(run.discontinuity, offset + 16);
    }

    /// Reads run `no`, or an all zero run past the end of the table.
    pub fn fragment_run(&mut self, no: usize) -> FragmentRunEntry {
        let count_offset = self.fragment_run_count_offset();
        if no >= self.get_u32(count_offset) as usize {
            return FragmentRunEntry::default();
        }
        let offset = count_offset + 4 + no * FRAGMENT_RUN_SIZE;
        FragmentRunEntry {
            first_fragment: self.get_u32(offset),
            first_timestamp: self.get_u64(offset + 4),
            duration: self.get_u32(offset + 12),
            discontinuity: self.get_u8(offset + 16),
        }
    }

    pub fn to_pretty_string(&mut self, indent: usize) -> String {
        let mut r = String::new();
        pretty_line(&mut r, indent, "[afrt] Fragment Run Table");
        if self.update() != 0 {
            pretty_line(&mut r, indent + 1, "Update");
        } else {
            pretty_line(&mut r, indent + 1, "Replacement or new table");
        }
        let timescale = self.timescale();
        pretty_line(&mut r, indent + 1, format_args!("Timescale {}", timescale));

        let qualities = self.quality_entry_count() as usize;
        pretty_line(
            &mut r,
            indent + 1,
            format_args!("QualitySegmentUrlModifiers ({})", qualities),
        );
        for i in 0..qualities {
            let entry = self.quality_entry(i);
            pretty_line(&mut r, indent + 2, entry);
        }

        let runs = self.fragment_run_count() as usize;
        pretty_line(&mut r, indent + 1, format_args!("FragmentRunEntryTable ({})", runs));
        for i in 0..runs {
            let run = self.fragment_run(i);
            pretty_line(&mut r, indent + 2, format_args!("First Fragment {}", run.first_fragment));
            pretty_line(&mut r, indent + 2, format_args!("First Timestamp {}", run.first_timestamp));
            pretty_line(&mut r, indent + 2, format_args!("Duration {}", run.duration));
            pretty_line(&mut r, indent + 2, format_args!("Discontinuity {}", run.discontinuity));
        }
        r
    }
}

impl<'a> TypedBox<'a> for AfrtBox<'a> {
    const BOX_TYPE: [u8; 4] = *b"afrt";

    fn from_box(inner: Mp4Box<'a>) -> Self {
        AfrtBox(inner)
    }

    fn into_box(self) -> Mp4Box<'a> {
        self.0
    }

    fn to_pretty_string(&mut self, indent: usize) -> String {
        AfrtBox::to_pretty_string(self, indent)
    }
}
