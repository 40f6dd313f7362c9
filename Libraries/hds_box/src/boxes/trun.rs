use super::generic::{pretty_line, typed_box, Mp4Box, TypedBox};

pub const DATA_OFFSET: u32 = 0x000001;
pub const FIRST_SAMPLE_FLAGS: u32 = 0x000004;
pub const SAMPLE_DURATION: u32 = 0x000100;
pub const SAMPLE_SIZE: u32 = 0x000200;
pub const SAMPLE_FLAGS: u32 = 0x000400;
pub const SAMPLE_COMPOSITION_OFFSET: u32 = 0x000800;

// Sample flags, as stored in `tfhd` defaults, the first-sample flags and per-sample records.
pub const NO_I_PICTURE: u32 = 0x0100_0000;
pub const IS_I_PICTURE: u32 = 0x0200_0000;
pub const NO_DISPOSABLE: u32 = 0x0040_0000;
pub const IS_DISPOSABLE: u32 = 0x0080_0000;
pub const IS_REDUNDANT: u32 = 0x0010_0000;
pub const NO_REDUNDANT: u32 = 0x0020_0000;
pub const NO_KEY_SAMPLE: u32 = 0x0001_0000;

/// Per-sample fields of a track fragment run. Fields whose flag is clear in the
/// owning box are not stored and read back as 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrunSampleInformation {
    pub sample_duration: u32,
    pub sample_size: u32,
    pub sample_flags: u32,
    pub sample_offset: u32,
}

/// Decodes sample flags into the space separated names used by the pretty printers.
/// Every name is preceded by a space.
pub fn pretty_sample_flags(flags: u32) -> String {
    let mut r = String::new();
    for (flag, name) in [
        (NO_I_PICTURE, " noIPicture"),
        (IS_I_PICTURE, " isIPicture"),
        (NO_DISPOSABLE, " noDisposable"),
        (IS_DISPOSABLE, " isDisposable"),
        (IS_REDUNDANT, " isRedundant"),
        (NO_REDUNDANT, " noRedundant"),
    ] {
        if flags & flag != 0 {
            r.push_str(name);
        }
    }
    if flags & NO_KEY_SAMPLE != 0 {
        r.push_str(" noKeySample");
    } else {
        r.push_str(" isKeySample");
    }
    r
}

// The `TrunBox` struct represents a Track Fragment Run Box.
// Payload layout:
// - 0: version (8 bits)
// - 1: flags (24 bits)
// - 4: sample count (32 bits)
// - 8: data offset (signed 32 bits), if `DATA_OFFSET` is set
// - then: first sample flags (32 bits), if `FIRST_SAMPLE_FLAGS` is set
// - then: one record per sample holding duration, size, flags and composition
//   offset (32 bits each, in that order), each present only when its flag is set
pub struct TrunBox<'a>(Mp4Box<'a>);

typed_box!(TrunBox);

impl TrunBox<'static> {
    pub fn new() -> Self {
        let mut b = TrunBox(Mp4Box::with_type(Self::BOX_TYPE));
        b.set_u8(0, 0); // version
        b.set_flags(0);
        b.set_u32(0, 4); // sample count
        b
    }
}

impl TrunBox<'_> {
    pub fn flags(&mut self) -> u32 {
        self.get_u24(1)
    }

    /// Only stores the flags. Fields already written are not moved.
    pub fn set_flags(&mut self, flags: u32) {
        self.set_u24(flags, 1)
    }

    pub fn sample_count(&mut self) -> u32 {
        self.get_u32(4)
    }

    pub fn data_offset(&mut self) -> i32 {
        if self.flags() & DATA_OFFSET == 0 {
            return 0;
        }
        self.get_u32(8) as i32
    }

    pub fn set_data_offset(&mut self, offset: i32) {
        if self.flags() & DATA_OFFSET != 0 {
            self.set_u32(offset as u32, 8);
        }
    }

    fn first_sample_flags_offset(&mut self) -> usize {
        if self.flags() & DATA_OFFSET != 0 {
            12
        } else {
            8
        }
    }

    pub fn first_sample_flags(&mut self) -> u32 {
        if self.flags() & FIRST_SAMPLE_FLAGS == 0 {
            return 0;
        }
        let offset = self.first_sample_flags_offset();
        self.get_u32(offset)
    }

    pub fn set_first_sample_flags(&mut self, flags: u32) {
        if self.flags() & FIRST_SAMPLE_FLAGS == 0 {
            return;
        }
        let offset = self.first_sample_flags_offset();
        self.set_u32(flags, offset)
    }

    fn records_offset(&mut self) -> usize {
        let flags = self.flags();
        let mut offset = 8;
        if flags & DATA_OFFSET != 0 {
            offset += 4;
        }
        if flags & FIRST_SAMPLE_FLAGS != 0 {
            offset += 4;
        }
        offset
    }

    fn record_width(&mut self) -> usize {
        let flags = self.flags();
        [SAMPLE_DURATION, SAMPLE_SIZE, SAMPLE_FLAGS, SAMPLE_COMPOSITION_OFFSET]
            .iter()
            .filter(|&&f| flags & f != 0)
            .count()
            * 4
    }

    /// Stores the record of sample `no`, raising the sample count when `no` is not
    /// covered yet. Fields whose flag is clear are skipped.
    pub fn set_sample_information(&mut self, no: usize, info: TrunSampleInformation) {
        let flags = self.flags();
        let first = self.records_offset();
        let width = self.record_width();
        let Some(mut offset) = self.record_slot(4, first, no, width) else {
            return;
        };
        for (flag, value) in [
            (SAMPLE_DURATION, info.sample_duration),
            (SAMPLE_SIZE, info.sample_size),
            (SAMPLE_FLAGS, info.sample_flags),
            (SAMPLE_COMPOSITION_OFFSET, info.sample_offset),
        ] {
            if flags & flag != 0 {
                self.set_u32(value, offset);
                offset += 4;
            }
        }
    }

    /// Reads the record of sample `no`. Samples past the count read as all zero.
    pub fn sample_information(&mut self, no: usize) -> TrunSampleInformation {
        let mut info = TrunSampleInformation::default();
        if no >= self.sample_count() as usize {
            return info;
        }
        let flags = self.flags();
        let mut offset = self.records_offset() + no * self.record_width();
        for (flag, field) in [
            (SAMPLE_DURATION, &mut info.sample_duration),
            (SAMPLE_SIZE, &mut info.sample_size),
            (SAMPLE_FLAGS, &mut info.sample_flags),
            (SAMPLE_COMPOSITION_OFFSET, &mut info.sample_offset),
        ] {
            if flags & flag != 0 {
                *field = self.get_u32(offset);
                offset += 4;
            }
        }
        info
    }

    pub fn to_pretty_string(&mut self, indent: usize) -> String {
        let mut r = String::new();
        pretty_line(&mut r, indent, "[trun] Track Fragment Run");
        let version = self.get_u8(0);
        pretty_line(&mut r, indent + 1, format_args!("Version {}", version));

        let flags = self.flags();
        let mut names = String::from("Flags");
        for (flag, name) in [
            (DATA_OFFSET, " dataOffset"),
            (FIRST_SAMPLE_FLAGS, " firstSampleFlags"),
            (SAMPLE_DURATION, " sampleDuration"),
            (SAMPLE_SIZE, " sampleSize"),
            (SAMPLE_FLAGS, " sampleFlags"),
            (SAMPLE_COMPOSITION_OFFSET, " sampleOffsets"),
        ] {
            if flags & flag != 0 {
                names.push_str(name);
            }
        }
        pretty_line(&mut r, indent + 1, names);

        if flags & DATA_OFFSET != 0 {
            let v = self.data_offset();
            pretty_line(&mut r, indent + 1, format_args!("Data Offset {}", v));
        }
        if flags & FIRST_SAMPLE_FLAGS != 0 {
            let v = self.first_sample_flags();
            pretty_line(
                &mut r,
                indent + 1,
                format_args!("Sample Flags{}", pretty_sample_flags(v)),
            );
        }

        let count = self.sample_count();
        pretty_line(&mut r, indent + 1, format_args!("SampleInformation ({}):", count));
        for i in 0..count as usize {
            let info = self.sample_information(i);
            pretty_line(&mut r, indent + 2, format_args!("[{}]", i));
            if flags & SAMPLE_DURATION != 0 {
                pretty_line(&mut r, indent + 3, format_args!("Duration {}", info.sample_duration));
            }
            if flags & SAMPLE_SIZE != 0 {
                pretty_line(&mut r, indent + 3, format_args!("Size {}", info.sample_size));
            }
            if flags & SAMPLE_FLAGS != 0 {
                pretty_line(
                    &mut r,
                    indent + 3,
                    format_args!("Flags{}", pretty_sample_flags(info.sample_flags)),
                );
            }
            if flags & SAMPLE_COMPOSITION_OFFSET != 0 {
                pretty_line(&mut r, indent + 3, format_args!("Offset {}", info.sample_offset));
            }
        }
        r
    }
}

impl<'a> TypedBox<'a> for TrunBox<'a> {
    const BOX_TYPE: [u8; 4] = *b"trun";

    fn from_box(inner: Mp4Box<'a>) -> Self {
        TrunBox(inner)
    }

    fn into_box(self) -> Mp4Box<'a> {
        self.0
    }

    fn to_pretty_string(&mut self, indent: usize) -> String {
        TrunBox::to_pretty_string(self, indent)
    }
}
