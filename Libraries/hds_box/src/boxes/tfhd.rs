use super::generic::{pretty_line, typed_box, Mp4Box, TypedBox};
use super::trun::pretty_sample_flags;

pub const BASE_DATA_OFFSET: u32 = 0x000001;
pub const SAMPLE_DESCRIPTION_INDEX: u32 = 0x000002;
pub const DEFAULT_SAMPLE_DURATION: u32 = 0x000008;
pub const DEFAULT_SAMPLE_SIZE: u32 = 0x000010;
pub const DEFAULT_SAMPLE_FLAGS: u32 = 0x000020;
pub const DURATION_IS_EMPTY: u32 = 0x010000;

// Optional fields in the order they are stored, with their width in bytes.
const OPTIONAL_FIELDS: [(u32, usize); 5] = [
    (BASE_DATA_OFFSET, 8),
    (SAMPLE_DESCRIPTION_INDEX, 4),
    (DEFAULT_SAMPLE_DURATION, 4),
    (DEFAULT_SAMPLE_SIZE, 4),
    (DEFAULT_SAMPLE_FLAGS, 4),
];

// The `TfhdBox` struct represents a Track Fragment Header Box.
// Payload layout:
// - 0: version (8 bits)
// - 1: flags (24 bits), selecting which optional fields follow
// - 4: track ID (32 bits)
// - 8: the optional fields of `OPTIONAL_FIELDS` whose flag is set, in that order
//
// Changing the flags does not move fields that were already written.
pub struct TfhdBox<'a>(Mp4Box<'a>);

typed_box!(TfhdBox);

impl TfhdBox<'static> {
    pub fn new() -> Self {
        let mut b = TfhdBox(Mp4Box::with_type(Self::BOX_TYPE));
        b.set_u8(0, 0); // version
        b.set_flags(0);
        b.set_track_id(0);
        b
    }
}

impl TfhdBox<'_> {
    pub fn flags(&mut self) -> u32 {
        self.get_u24(1)
    }

    pub fn set_flags(&mut self, flags: u32) {
        self.set_u24(flags, 1)
    }

    pub fn track_id(&mut self) -> u32 {
        self.get_u32(4)
    }

    pub fn set_track_id(&mut self, track_id: u32) {
        self.set_u32(track_id, 4)
    }

    // Payload offset of an optional field, `None` when its flag is clear.
    fn field_offset(&mut self, flag: u32) -> Option<usize> {
        let flags = self.flags();
        if flags & flag == 0 {
            return None;
        }
        let mut offset = 8;
        for (field, width) in OPTIONAL_FIELDS {
            if field == flag {
                break;
            }
            if flags & field != 0 {
                offset += width;
            }
        }
        Some(offset)
    }

    fn optional_u32(&mut self, flag: u32) -> u32 {
        match self.field_offset(flag) {
            Some(offset) => self.get_u32(offset),
            None => 0,
        }
    }

    fn set_optional_u32(&mut self, flag: u32, value: u32) {
        if let Some(offset) = self.field_offset(flag) {
            self.set_u32(value, offset);
        }
    }

    pub fn base_data_offset(&mut self) -> u64 {
        match self.field_offset(BASE_DATA_OFFSET) {
            Some(offset) => self.get_u64(offset),
            None => 0,
        }
    }

    pub fn set_base_data_offset(&mut self, base_data_offset: u64) {
        if let Some(offset) = self.field_offset(BASE_DATA_OFFSET) {
            self.set_u64(base_data_offset, offset);
        }
    }

    pub fn sample_description_index(&mut self) -> u32 {
        self.optional_u32(SAMPLE_DESCRIPTION_INDEX)
    }

    pub fn set_sample_description_index(&mut self, index: u32) {
        self.set_optional_u32(SAMPLE_DESCRIPTION_INDEX, index)
    }

    pub fn default_sample_duration(&mut self) -> u32 {
        self.optional_u32(DEFAULT_SAMPLE_DURATION)
    }

    pub fn set_default_sample_duration(&mut self, duration: u32) {
        self.set_optional_u32(DEFAULT_SAMPLE_DURATION, duration)
    }

    pub fn default_sample_size(&mut self) -> u32 {
        self.optional_u32(DEFAULT_SAMPLE_SIZE)
    }

    pub fn set_default_sample_size(&mut self, size: u32) {
        self.set_optional_u32(DEFAULT_SAMPLE_SIZE, size)
    }

    pub fn default_sample_flags(&mut self) -> u32 {
        self.optional_u32(DEFAULT_SAMPLE_FLAGS)
    }

    pub fn set_default_sample_flags(&mut self, flags: u32) {
        self.set_optional_u32(DEFAULT_SAMPLE_FLAGS, flags)
    }

    pub fn to_pretty_string(&mut self, indent: usize) -> String {
        let mut r = String::new();
        pretty_line(&mut r, indent, "[tfhd] Track Fragment Header");
        let version = self.get_u8(0);
        pretty_line(&mut r, indent + 1, format_args!("Version {}", version));

        let flags = self.flags();
        let mut names = String::from("Flags");
        for (flag, name) in [
            (BASE_DATA_OFFSET, " BaseOffset"),
            (SAMPLE_DESCRIPTION_INDEX, " SampleDesc"),
            (DEFAULT_SAMPLE_DURATION, " SampleDura"),
            (DEFAULT_SAMPLE_SIZE, " SampleSize"),
            (DEFAULT_SAMPLE_FLAGS, " SampleFlag"),
            (DURATION_IS_EMPTY, " NoDuration"),
        ] {
            if flags & flag != 0 {
                names.push_str(name);
            }
        }
        pretty_line(&mut r, indent + 1, names);

        let track_id = self.track_id();
        pretty_line(&mut r, indent + 1, format_args!("TrackID {}", track_id));
        if flags & BASE_DATA_OFFSET != 0 {
            let v = self.base_data_offset();
            pretty_line(&mut r, indent + 1, format_args!("Base Offset {}", v));
        }
        if flags & SAMPLE_DESCRIPTION_INDEX != 0 {
            let v = self.sample_description_index();
            pretty_line(&mut r, indent + 1, format_args!("Sample Description Index {}", v));
        }
        if flags & DEFAULT_SAMPLE_DURATION != 0 {
            let v = self.default_sample_duration();
            pretty_line(&mut r, indent + 1, format_args!("Default Sample Duration {}", v));
        }
        if flags & DEFAULT_SAMPLE_SIZE != 0 {
            let v = self.default_sample_size();
            pretty_line(&mut r, indent + 1, format_args!("Default Sample Size {}", v));
        }
        if flags & DEFAULT_SAMPLE_FLAGS != 0 {
            let v = self.default_sample_flags();
            pretty_line(
                &mut r,
                indent + 1,
                format_args!("Default Sample Flags{}", pretty_sample_flags(v)),
            );
        }
        r
    }
}

impl<'a> TypedBox<'a> for TfhdBox<'a> {
    const BOX_TYPE: [u8; 4] = *b"tfhd";

    fn from_box(inner: Mp4Box<'a>) -> Self {
        TfhdBox(inner)
    }

    fn into_box(self) -> Mp4Box<'a> {
        self.0
    }

    fn to_pretty_string(&mut self, indent: usize) -> String {
        TfhdBox::to_pretty_string(self, indent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unflagged_fields_are_ignored() {
        let mut tfhd = TfhdBox::new();
        tfhd.set_track_id(1);
        tfhd.set_default_sample_duration(1000);
        assert_eq!(tfhd.default_sample_duration(), 0);
        assert_eq!(tfhd.boxed_size(), 16);
    }

    #[test]
    fn test_optional_field_offsets() {
        let mut tfhd = TfhdBox::new();
        tfhd.set_flags(BASE_DATA_OFFSET | DEFAULT_SAMPLE_SIZE | DEFAULT_SAMPLE_FLAGS);
        tfhd.set_track_id(2);
        tfhd.set_base_data_offset(0x0102_0304_0506_0708);
        tfhd.set_default_sample_size(512);
        tfhd.set_default_sample_flags(0x0001_0000);

        assert_eq!(tfhd.boxed_size(), 8 + 8 + 8 + 4 + 4);
        assert_eq!(tfhd.get_u64(8), 0x0102_0304_0506_0708);
        assert_eq!(tfhd.get_u32(16), 512);
        assert_eq!(tfhd.get_u32(20), 0x0001_0000);
        assert_eq!(tfhd.sample_description_index(), 0);
        assert_eq!(tfhd.default_sample_duration(), 0);
        assert_eq!(tfhd.default_sample_size(), 512);
    }

    #[test]
    fn test_flag_gated_getter_ignores_raw_bytes() {
        let mut tfhd = TfhdBox::new();
        tfhd.set_u32(99, 8);
        assert_eq!(tfhd.sample_description_index(), 0);
        tfhd.set_flags(SAMPLE_DESCRIPTION_INDEX);
        assert_eq!(tfhd.sample_description_index(), 99);
    }

    #[test]
    fn test_tfhd_pretty_string() {
        let mut tfhd = TfhdBox::new();
        tfhd.set_flags(DEFAULT_SAMPLE_DURATION);
        tfhd.set_track_id(1);
        tfhd.set_default_sample_duration(40);
        let pretty = tfhd.to_pretty_string(0);
        assert!(pretty.starts_with("[tfhd] Track Fragment Header\n"));
        assert!(pretty.contains(" Flags SampleDura\n"));
        assert!(pretty.contains(" TrackID 1\n"));
        assert!(pretty.contains(" Default Sample Duration 40\n"));
    }
}
