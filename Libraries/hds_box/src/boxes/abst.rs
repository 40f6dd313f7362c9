use super::afrt::AfrtBox;
use super::asrt::AsrtBox;
use super::generic::{pretty_line, typed_box, Mp4Box, TypedBox};

// Bits of the profile/live/update byte at payload offset 8.
const PROFILE_MASK: u8 = 0xC0;
const PROFILE_SHIFT: u8 = 6;
const LIVE_BIT: u8 = 0x10;
const UPDATE_BIT: u8 = 0x08;

// First variable-length region, the movie identifier.
const MOVIE_IDENTIFIER_OFFSET: usize = 29;

// The `AbstBox` struct represents a Bootstrap Info Box, the index of an HDS stream.
// Payload layout:
// - 0: version (8 bits)
// - 1: flags (24 bits)
// - 4: bootstrap info version (32 bits)
// - 8: profile (bits 6-7), live (bit 4) and update (bit 3)
// - 9: timescale (32 bits)
// - 13: current media time (64 bits)
// - 21: SMPTE time code offset (64 bits)
// - 29: movie identifier (zero-terminated string)
// - then, in this order:
//   - server entry count (8 bits) and that many strings
//   - quality entry count (8 bits) and that many strings
//   - DRM data (string)
//   - metadata (string)
//   - segment run table count (8 bits) and that many `asrt` boxes
//   - fragment run table count (8 bits) and that many `afrt` boxes
//
// Nothing past offset 29 has a fixed position. Every accessor finds its region by
// walking all regions before it.
pub struct AbstBox<'a>(Mp4Box<'a>);

typed_box!(AbstBox);

impl AbstBox<'static> {
    pub fn new() -> Self {
        let mut b = AbstBox(Mp4Box::with_type(Self::BOX_TYPE));
        b.set_version(0);
        b.set_flags(0);
        b.set_bootstrapinfo_version(0);
        b.set_u8(0, 8);
        b.set_profile(0);
        b.set_live(true);
        b.set_update(false);
        b.set_timescale(1000);
        b.set_current_media_time(0);
        b.set_smpte_time_code_offset(0);
        b.set_string("", MOVIE_IDENTIFIER_OFFSET);
        b.set_u8(0, MOVIE_IDENTIFIER_OFFSET + 1); // server entries
        b.set_u8(0, MOVIE_IDENTIFIER_OFFSET + 2); // quality entries
        b.set_string("", MOVIE_IDENTIFIER_OFFSET + 3); // drm data
        b.set_string("", MOVIE_IDENTIFIER_OFFSET + 4); // metadata
        b.set_u8(0, MOVIE_IDENTIFIER_OFFSET + 5); // segment run tables
        b.set_u8(0, MOVIE_IDENTIFIER_OFFSET + 6); // fragment run tables
        b
    }
}

impl AbstBox<'_> {
    pub fn version(&mut self) -> u8 {
        self.get_u8(0)
    }

    pub fn set_version(&mut self, version: u8) {
        self.set_u8(version, 0)
    }

    pub fn flags(&mut self) -> u32 {
        self.get_u24(1)
    }

    pub fn set_flags(&mut self, flags: u32) {
        self.set_u24(flags, 1)
    }

    pub fn bootstrapinfo_version(&mut self) -> u32 {
        self.get_u32(4)
    }

    pub fn set_bootstrapinfo_version(&mut self, version: u32) {
        self.set_u32(version, 4)
    }

    /// Profile in the range 0-3.
    pub fn profile(&mut self) -> u8 {
        (self.get_u8(8) & PROFILE_MASK) >> PROFILE_SHIFT
    }

    /// Stores the low 2 bits of `profile`, leaving the live and update bits alone.
    pub fn set_profile(&mut self, profile: u8) {
        let b = self.get_u8(8);
        self.set_u8(
            (b & !PROFILE_MASK) | ((profile << PROFILE_SHIFT) & PROFILE_MASK),
            8,
        )
    }

    pub fn live(&mut self) -> bool {
        self.get_u8(8) & LIVE_BIT != 0
    }

    pub fn set_live(&mut self, live: bool) {
        self.set_bit(LIVE_BIT, live)
    }

    pub fn update(&mut self) -> bool {
        self.get_u8(8) & UPDATE_BIT != 0
    }

    pub fn set_update(&mut self, update: bool) {
        self.set_bit(UPDATE_BIT, update)
    }

    fn set_bit(&mut self, bit: u8, value: bool) {
        let b = self.get_u8(8);
        let b = if value { b | bit } else { b & !bit };
        self.set_u8(b, 8)
    }

    pub fn timescale(&mut self) -> u32 {
        self.get_u32(9)
    }

    pub fn set_timescale(&mut self, timescale: u32) {
        self.set_u32(timescale, 9)
    }

    pub fn current_media_time(&mut self) -> u64 {
        self.get_u64(13)
    }

    pub fn set_current_media_time(&mut self, time: u64) {
        self.set_u64(time, 13)
    }

    pub fn smpte_time_code_offset(&mut self) -> u64 {
        self.get_u64(21)
    }

    pub fn set_smpte_time_code_offset(&mut self, offset: u64) {
        self.set_u64(offset, 21)
    }

    pub fn movie_identifier(&mut self) -> String {
        self.get_string(MOVIE_IDENTIFIER_OFFSET)
    }

    pub fn set_movie_identifier(&mut self, identifier: &str) {
        self.set_string(identifier, MOVIE_IDENTIFIER_OFFSET)
    }

    fn server_count_offset(&mut self) -> usize {
        self.skip_strings(MOVIE_IDENTIFIER_OFFSET, 1)
    }

    pub fn server_entry_count(&mut self) -> u8 {
        let offset = self.server_count_offset();
        self.get_u8(offset)
    }

    pub fn server_entry(&mut self, no: usize) -> String {
        let offset = self.server_count_offset();
        self.get_table_string(offset, no)
    }

    pub fn set_server_entry(&mut self, no: usize, entry: &str) {
        let offset = self.server_count_offset();
        self.set_table_string(offset, no, entry)
    }

    fn quality_count_offset(&mut self) -> usize {
        let offset = self.server_count_offset();
        let count = self.get_u8(offset) as usize;
        self.skip_strings(offset + 1, count)
    }

    pub fn quality_entry_count(&mut self) -> u8 {
        let offset = self.quality_count_offset();
        self.get_u8(offset)
    }

    pub fn quality_entry(&mut self, no: usize) -> String {
        let offset = self.quality_count_offset();
        self.get_table_string(offset, no)
    }

    pub fn set_quality_entry(&mut self, no: usize, entry: &str) {
        let offset = self.quality_count_offset();
        self.set_table_string(offset, no, entry)
    }

    fn drm_data_offset(&mut self) -> usize {
        let offset = self.quality_count_offset();
        let count = self.get_u8(offset) as usize;
        self.skip_strings(offset + 1, count)
    }

    pub fn drm_data(&mut self) -> String {
        let offset = self.drm_data_offset();
        self.get_string(offset)
    }

    pub fn set_drm_data(&mut self, drm_data: &str) {
        let offset = self.drm_data_offset();
        self.set_string(drm_data, offset)
    }

    fn metadata_offset(&mut self) -> usize {
        let offset = self.drm_data_offset();
        self.skip_strings(offset, 1)
    }

    pub fn metadata(&mut self) -> String {
        let offset = self.metadata_offset();
        self.get_string(offset)
    }

    pub fn set_metadata(&mut self, metadata: &str) {
        let offset = self.metadata_offset();
        self.set_string(metadata, offset)
    }

    fn segment_run_table_count_offset(&mut self) -> usize {
        let offset = self.metadata_offset();
        self.skip_strings(offset, 1)
    }

    pub fn segment_run_table_count(&mut self) -> u8 {
        let offset = self.segment_run_table_count_offset();
        self.get_u8(offset)
    }

    /// Borrows segment run table `no`, or `None` past the count.
    pub fn segment_run_table(&mut self, no: usize) -> Option<AsrtBox<'_>> {
        let offset = self.segment_run_table_count_offset();
        self.get_table_box(offset, no).map(AsrtBox::from_box)
    }

    /// Stores a copy of `table` as segment run table `no`. Tables missing before
    /// `no` are added as empty boxes.
    pub fn set_segment_run_table(&mut self, no: usize, table: &AsrtBox<'_>) {
        let offset = self.segment_run_table_count_offset();
        self.set_table_box(offset, no, table)
    }

    fn fragment_run_table_count_offset(&mut self) -> usize {
        let offset = self.segment_run_table_count_offset();
        let count = self.get_u8(offset) as usize;
        self.skip_boxes(offset + 1, count)
    }

    pub fn fragment_run_table_count(&mut self) -> u8 {
        let offset = self.fragment_run_table_count_offset();
        self.get_u8(offset)
    }

    /// Borrows fragment run table `no`, or `None` past the count.
    pub fn fragment_run_table(&mut self, no: usize) -> Option<AfrtBox<'_>> {
        let offset = self.fragment_run_table_count_offset();
        self.get_table_box(offset, no).map(AfrtBox::from_box)
    }

    pub fn set_fragment_run_table(&mut self, no: usize, table: &AfrtBox<'_>) {
        let offset = self.fragment_run_table_count_offset();
        self.set_table_box(offset, no, table)
    }

    pub fn to_pretty_string(&mut self, indent: usize) -> String {
        let mut r = String::new();
        pretty_line(&mut r, indent, "[abst] Bootstrap Info");
        let version = self.version();
        pretty_line(&mut r, indent + 1, format_args!("Version {}", version));
        let bootstrapinfo_version = self.bootstrapinfo_version();
        pretty_line(
            &mut r,
            indent + 1,
            format_args!("BootstrapinfoVersion {}", bootstrapinfo_version),
        );
        let profile = self.profile();
        pretty_line(&mut r, indent + 1, format_args!("Profile {}", profile));
        if self.live() {
            pretty_line(&mut r, indent + 1, "Live");
        } else {
            pretty_line(&mut r, indent + 1, "Recorded");
        }
        if self.update() {
            pretty_line(&mut r, indent + 1, "Update");
        } else {
            pretty_line(&mut r, indent + 1, "Replacement or new table");
        }
        let timescale = self.timescale();
        pretty_line(&mut r, indent + 1, format_args!("Timescale {}", timescale));
        let time = self.current_media_time();
        pretty_line(&mut r, indent + 1, format_args!("CurrMediaTime {}", time));
        let smpte = self.smpte_time_code_offset();
        pretty_line(&mut r, indent + 1, format_args!("SmpteTimeCodeOffset {}", smpte));
        let movie = self.movie_identifier();
        pretty_line(&mut r, indent + 1, format_args!("MovieIdentifier {}", movie));

        let servers = self.server_entry_count() as usize;
        pretty_line(&mut r, indent + 1, format_args!("ServerEntryTable ({})", servers));
        for i in 0..servers {
            let entry = self.server_entry(i);
            pretty_line(&mut r, indent + 2, entry);
        }
        let qualities = self.quality_entry_count() as usize;
        pretty_line(&mut r, indent + 1, format_args!("QualityEntryTable ({})", qualities));
        for i in 0..qualities {
            let entry = self.quality_entry(i);
            pretty_line(&mut r, indent + 2, entry);
        }
        let drm = self.drm_data();
        pretty_line(&mut r, indent + 1, format_args!("DrmData {}", drm));
        let metadata = self.metadata();
        pretty_line(&mut r, indent + 1, format_args!("MetaData {}", metadata));

        let segment_tables = self.segment_run_table_count() as usize;
        pretty_line(
            &mut r,
            indent + 1,
            format_args!("SegmentRunTableEntries ({})", segment_tables),
        );
        for i in 0..segment_tables {
            if let Some(mut table) = self.segment_run_table(i) {
                r.push_str(&table.to_pretty_string(indent + 2));
            }
        }
        let fragment_tables = self.fragment_run_table_count() as usize;
        pretty_line(
            &mut r,
            indent + 1,
            format_args!("FragmentRunTableEntries ({})", fragment_tables),
        );
        for i in 0..fragment_tables {
            if let Some(mut table) = self.fragment_run_table(i) {
                r.push_str(&table.to_pretty_string(indent + 2));
            }
        }
        r
    }
}

impl<'a> TypedBox<'a> for AbstBox<'a> {
    const BOX_TYPE: [u8; 4] = *b"abst";

    fn from_box(inner: Mp4Box<'a>) -> Self {
        AbstBox(inner)
    }

    fn into_box(self) -> Mp4Box<'a> {
        self.0
    }

    fn to_pretty_string(&mut self, indent: usize) -> String {
        AbstBox::to_pretty_string(self, indent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxes::afrt::FragmentRunEntry;
    use crate::boxes::asrt::SegmentRunEntry;

    #[test]
    fn test_new_abst_defaults() {
        let mut abst = AbstBox::new();
        assert_eq!(abst.boxed_size(), 44);
        assert_eq!(abst.payload()[8], LIVE_BIT);
        assert!(abst.live());
        assert!(!abst.update());
        assert_eq!(abst.profile(), 0);
        assert_eq!(abst.timescale(), 1000);
        assert_eq!(abst.movie_identifier(), "");
        assert_eq!(abst.server_entry_count(), 0);
        assert_eq!(abst.quality_entry_count(), 0);
        assert_eq!(abst.segment_run_table_count(), 0);
        assert_eq!(abst.fragment_run_table_count(), 0);
        assert_eq!(abst.boxed_size(), 44);
    }

    #[test]
    fn test_bitfield_setters_touch_only_their_bits() {
        let mut abst = AbstBox::new();
        abst.set_profile(3);
        abst.set_update(true);
        assert_eq!(abst.payload()[8], 0xC0 | LIVE_BIT | UPDATE_BIT);

        abst.set_live(false);
        assert_eq!(abst.payload()[8], 0xC0 | UPDATE_BIT);
        assert_eq!(abst.profile(), 3);

        abst.set_profile(1);
        abst.set_update(false);
        assert_eq!(abst.payload()[8], 0x40);
        assert_eq!(abst.profile(), 1);
        assert!(!abst.live());
    }

    #[test]
    fn test_string_regions_shift_later_regions() {
        let mut abst = AbstBox::new();
        abst.set_metadata("meta");
        abst.set_drm_data("drm");
        abst.set_quality_entry(0, "hd");
        abst.set_server_entry(1, "s2");
        abst.set_movie_identifier("abc");

        assert_eq!(abst.movie_identifier(), "abc");
        assert_eq!(abst.server_entry_count(), 2);
        assert_eq!(abst.server_entry(0), "");
        assert_eq!(abst.server_entry(1), "s2");
        assert_eq!(abst.quality_entry(0), "hd");
        assert_eq!(abst.drm_data(), "drm");
        assert_eq!(abst.metadata(), "meta");
        assert_eq!(abst.segment_run_table_count(), 0);
        assert_eq!(abst.boxed_size(), 44 + 3 + 1 + 3 + 3 + 3 + 4);
    }

    #[test]
    fn test_nested_run_tables() {
        let mut asrt = AsrtBox::new();
        asrt.set_segment_run(
            0,
            SegmentRunEntry {
                first_segment: 1,
                fragments_per_segment: 10,
            },
        );
        let mut afrt = AfrtBox::new();
        afrt.set_fragment_run(
            0,
            FragmentRunEntry {
                first_fragment: 1,
                first_timestamp: 0,
                duration: 4000,
                discontinuity: 0,
            },
        );

        let mut abst = AbstBox::new();
        abst.set_fragment_run_table(0, &afrt);
        abst.set_segment_run_table(0, &asrt);
        assert_eq!(abst.segment_run_table_count(), 1);
        assert_eq!(abst.fragment_run_table_count(), 1);
        assert_eq!(
            abst.boxed_size(),
            44 + asrt.boxed_size() + afrt.boxed_size()
        );

        {
            let mut table = abst.segment_run_table(0).unwrap();
            assert_eq!(table.segment_run(0).fragments_per_segment, 10);
        }
        {
            let mut table = abst.fragment_run_table(0).unwrap();
            assert_eq!(table.fragment_run(0).duration, 4000);
        }
        assert!(abst.fragment_run_table(1).is_none());

        // Replacing a table with a bigger one shifts the fragment run tables.
        asrt.set_quality_entry(0, "quality");
        abst.set_segment_run_table(0, &asrt);
        {
            let mut table = abst.segment_run_table(0).unwrap();
            assert_eq!(table.quality_entry(0), "quality");
            assert_eq!(table.segment_run(0).first_segment, 1);
        }
        {
            let mut table = abst.fragment_run_table(0).unwrap();
            assert_eq!(table.fragment_run(0).duration, 4000);
        }
        assert_eq!(abst.segment_run_table_count(), 1);
    }

    #[test]
    fn test_sparse_nested_table_gets_empty_placeholders() {
        let mut abst = AbstBox::new();
        abst.set_segment_run_table(2, &AsrtBox::new());
        assert_eq!(abst.segment_run_table_count(), 3);
        assert_eq!(abst.segment_run_table(0).unwrap().boxed_size(), 8);
        assert!(abst.segment_run_table(2).unwrap().is_type(b"asrt"));
        assert_eq!(abst.fragment_run_table_count(), 0);
        assert_eq!(abst.boxed_size(), 44 + 8 + 8 + 17);
    }

    #[test]
    fn test_abst_pretty_string() {
        let mut abst = AbstBox::new();
        abst.set_movie_identifier("movie");
        abst.set_server_entry(0, "srv");
        abst.set_segment_run_table(0, &AsrtBox::new());
        let pretty = abst.to_pretty_string(0);
        assert!(pretty.starts_with("[abst] Bootstrap Info\n Version 0\n BootstrapinfoVersion 0\n"));
        assert!(pretty.contains(" Profile 0\n Live\n Replacement or new table\n Timescale 1000\n"));
        assert!(pretty.contains(" MovieIdentifier movie\n ServerEntryTable (1)\n  srv\n"));
        assert!(pretty.contains(" SegmentRunTableEntries (1)\n  [asrt] Segment Run Table\n"));
        assert!(pretty.ends_with(" FragmentRunTableEntries (0)\n"));
    }
}
