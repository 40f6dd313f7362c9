use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::boxes::{
    abst::AbstBox,
    afrt::{AfrtBox, FragmentRunEntry},
    asrt::{AsrtBox, SegmentRunEntry},
    generic::{Mp4Box, HEADER_SIZE},
    mfhd::MfhdBox,
    moof::MoofBox,
    tfhd::{self, TfhdBox},
    trun::{self, TrunBox, TrunSampleInformation},
};
use crate::error::Result;

/// Describes a segment run table to embed in a bootstrap box.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SegmentRunTableConfig {
    pub update: u32,
    pub qualities: Vec<String>,
    pub runs: Vec<SegmentRunEntry>,
}

/// Describes a fragment run table to embed in a bootstrap box.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FragmentRunTableConfig {
    pub update: u32,
    pub timescale: u32,
    pub qualities: Vec<String>,
    pub runs: Vec<FragmentRunEntry>,
}

impl Default for FragmentRunTableConfig {
    fn default() -> Self {
        FragmentRunTableConfig {
            update: 0,
            timescale: 1000,
            qualities: Vec::new(),
            runs: Vec::new(),
        }
    }
}

/// Describes a bootstrap box. Every field is optional in JSON.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub bootstrapinfo_version: u32,
    pub profile: u8,
    pub live: bool,
    pub update: bool,
    pub timescale: u32,
    pub current_media_time: u64,
    pub smpte_time_code_offset: u64,
    pub movie_identifier: String,
    pub servers: Vec<String>,
    pub qualities: Vec<String>,
    pub drm_data: String,
    pub metadata: String,
    pub segment_run_tables: Vec<SegmentRunTableConfig>,
    pub fragment_run_tables: Vec<FragmentRunTableConfig>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        BootstrapConfig {
            bootstrapinfo_version: 0,
            profile: 0,
            live: true,
            update: false,
            timescale: 1000,
            current_media_time: 0,
            smpte_time_code_offset: 0,
            movie_identifier: String::new(),
            servers: Vec::new(),
            qualities: Vec::new(),
            drm_data: String::new(),
            metadata: String::new(),
            segment_run_tables: Vec::new(),
            fragment_run_tables: Vec::new(),
        }
    }
}

impl BootstrapConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

/// One sample of a fragment. A field that is set on any sample is stored for
/// every sample, missing values as 0.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SampleConfig {
    pub duration: Option<u32>,
    pub size: Option<u32>,
    pub flags: Option<u32>,
    pub composition_offset: Option<u32>,
}

/// Describes a movie fragment. Optional header fields are only stored, and
/// their flag only raised, when they are given.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FragmentConfig {
    pub sequence_number: u32,
    pub track_id: u32,
    pub base_data_offset: Option<u64>,
    pub sample_description_index: Option<u32>,
    pub default_sample_duration: Option<u32>,
    pub default_sample_size: Option<u32>,
    pub default_sample_flags: Option<u32>,
    pub duration_is_empty: bool,
    pub data_offset: Option<i32>,
    pub first_sample_flags: Option<u32>,
    pub samples: Vec<SampleConfig>,
}

impl Default for FragmentConfig {
    fn default() -> Self {
        FragmentConfig {
            sequence_number: 1,
            track_id: 1,
            base_data_offset: None,
            sample_description_index: None,
            default_sample_duration: None,
            default_sample_size: None,
            default_sample_flags: None,
            duration_is_empty: false,
            data_offset: None,
            first_sample_flags: None,
            samples: Vec::new(),
        }
    }
}

impl FragmentConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

fn create_segment_run_table(config: &SegmentRunTableConfig) -> AsrtBox<'static> {
    let mut asrt = AsrtBox::new();
    asrt.set_update(config.update);
    for (i, quality) in config.qualities.iter().enumerate() {
        asrt.set_quality_entry(i, quality);
    }
    for (i, run) in config.runs.iter().enumerate() {
        asrt.set_segment_run(i, *run);
    }
    asrt
}

fn create_fragment_run_table(config: &FragmentRunTableConfig) -> AfrtBox<'static> {
    let mut afrt = AfrtBox::new();
    afrt.set_update(config.update);
    afrt.set_timescale(config.timescale);
    for (i, quality) in config.qualities.iter().enumerate() {
        afrt.set_quality_entry(i, quality);
    }
    for (i, run) in config.runs.iter().enumerate() {
        afrt.set_fragment_run(i, *run);
    }
    afrt
}

/// Builds a bootstrap box, including its segment and fragment run tables.
pub fn create_bootstrap(config: &BootstrapConfig) -> AbstBox<'static> {
    let mut abst = AbstBox::new();
    abst.set_bootstrapinfo_version(config.bootstrapinfo_version);
    abst.set_profile(config.profile);
    abst.set_live(config.live);
    abst.set_update(config.update);
    abst.set_timescale(config.timescale);
    abst.set_current_media_time(config.current_media_time);
    abst.set_smpte_time_code_offset(config.smpte_time_code_offset);
    abst.set_movie_identifier(&config.movie_identifier);
    for (i, server) in config.servers.iter().enumerate() {
        abst.set_server_entry(i, server);
    }
    for (i, quality) in config.qualities.iter().enumerate() {
        abst.set_quality_entry(i, quality);
    }
    abst.set_drm_data(&config.drm_data);
    abst.set_metadata(&config.metadata);
    for (i, table) in config.segment_run_tables.iter().enumerate() {
        abst.set_segment_run_table(i, &create_segment_run_table(table));
    }
    for (i, table) in config.fragment_run_tables.iter().enumerate() {
        abst.set_fragment_run_table(i, &create_fragment_run_table(table));
    }
    debug!(
        size = abst.boxed_size(),
        segment_run_tables = config.segment_run_tables.len(),
        fragment_run_tables = config.fragment_run_tables.len(),
        "created bootstrap box"
    );
    abst
}

fn create_mfhd(config: &FragmentConfig) -> MfhdBox<'static> {
    let mut mfhd = MfhdBox::new();
    mfhd.set_sequence_number(config.sequence_number);
    mfhd
}

fn create_tfhd(config: &FragmentConfig) -> TfhdBox<'static> {
    let mut flags = 0;
    for (present, flag) in [
        (config.base_data_offset.is_some(), tfhd::BASE_DATA_OFFSET),
        (config.sample_description_index.is_some(), tfhd::SAMPLE_DESCRIPTION_INDEX),
        (config.default_sample_duration.is_some(), tfhd::DEFAULT_SAMPLE_DURATION),
        (config.default_sample_size.is_some(), tfhd::DEFAULT_SAMPLE_SIZE),
        (config.default_sample_flags.is_some(), tfhd::DEFAULT_SAMPLE_FLAGS),
        (config.duration_is_empty, tfhd::DURATION_IS_EMPTY),
    ] {
        if present {
            flags |= flag;
        }
    }

    let mut tfhd = TfhdBox::new();
    tfhd.set_flags(flags);
    tfhd.set_track_id(config.track_id);
    if let Some(v) = config.base_data_offset {
        tfhd.set_base_data_offset(v);
    }
    if let Some(v) = config.sample_description_index {
        tfhd.set_sample_description_index(v);
    }
    if let Some(v) = config.default_sample_duration {
        tfhd.set_default_sample_duration(v);
    }
    if let Some(v) = config.default_sample_size {
        tfhd.set_default_sample_size(v);
    }
    if let Some(v) = config.default_sample_flags {
        tfhd.set_default_sample_flags(v);
    }
    tfhd
}

fn create_trun(config: &FragmentConfig, with_data_offset: bool) -> TrunBox<'static> {
    let mut flags = 0;
    if with_data_offset || config.data_offset.is_some() {
        flags |= trun::DATA_OFFSET;
    }
    if config.first_sample_flags.is_some() {
        flags |= trun::FIRST_SAMPLE_FLAGS;
    }
    for sample in &config.samples {
        for (present, flag) in [
            (sample.duration.is_some(), trun::SAMPLE_DURATION),
            (sample.size.is_some(), trun::SAMPLE_SIZE),
            (sample.flags.is_some(), trun::SAMPLE_FLAGS),
            (sample.composition_offset.is_some(), trun::SAMPLE_COMPOSITION_OFFSET),
        ] {
            if present {
                flags |= flag;
            }
        }
    }

    let mut trun = TrunBox::new();
    trun.set_flags(flags);
    // Stored even when unset, since a media segment measures the run before filling it in.
    trun.set_data_offset(config.data_offset.unwrap_or(0));
    if let Some(v) = config.first_sample_flags {
        trun.set_first_sample_flags(v);
    }
    for (i, sample) in config.samples.iter().enumerate() {
        trun.set_sample_information(
            i,
            TrunSampleInformation {
                sample_duration: sample.duration.unwrap_or(0),
                sample_size: sample.size.unwrap_or(0),
                sample_flags: sample.flags.unwrap_or(0),
                sample_offset: sample.composition_offset.unwrap_or(0),
            },
        );
    }
    trun
}

fn assemble_fragment(
    mfhd: &MfhdBox<'_>,
    tfhd: &TfhdBox<'_>,
    trun: &TrunBox<'_>,
) -> MoofBox<'static> {
    let mut moof = MoofBox::new();
    moof.add_content(mfhd);
    moof.add_content(tfhd);
    moof.add_content(trun);
    moof
}

/// Builds a movie fragment holding `mfhd`, `tfhd` and `trun`, in that order.
pub fn create_fragment(config: &FragmentConfig) -> MoofBox<'static> {
    let mfhd = create_mfhd(config);
    let tfhd = create_tfhd(config);
    let trun = create_trun(config, false);
    let moof = assemble_fragment(&mfhd, &tfhd, &trun);
    debug!(
        size = moof.boxed_size(),
        sequence_number = config.sequence_number,
        samples = config.samples.len(),
        "created movie fragment"
    );
    moof
}

/// Builds a movie fragment followed by an `mdat` box carrying `payload`.
///
/// The run's data offset is set to the start of the payload, counted from the
/// start of the movie fragment, overriding any offset in `config`.
pub fn create_media_segment(config: &FragmentConfig, payload: &[u8]) -> Vec<u8> {
    let mfhd = create_mfhd(config);
    let tfhd = create_tfhd(config);
    let mut trun = create_trun(config, true);

    // The data offset field is already in place, so filling it in keeps every size.
    let moof_size = HEADER_SIZE + mfhd.boxed_size() + tfhd.boxed_size() + trun.boxed_size();
    trun.set_data_offset((moof_size + HEADER_SIZE) as i32);
    let moof = assemble_fragment(&mfhd, &tfhd, &trun);

    let mut mdat = Mp4Box::with_type(*b"mdat");
    mdat.set_bytes(payload, 0);

    let mut segment = Vec::with_capacity(moof.boxed_size() + mdat.boxed_size());
    segment.extend_from_slice(moof.as_box());
    segment.extend_from_slice(mdat.as_box());
    debug!(
        moof_size = moof.boxed_size(),
        payload = payload.len(),
        "created media segment"
    );
    segment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxes::generic::TypedBox;
    use crate::reader::parse_boxes;

    #[test]
    fn test_bootstrap_from_json() {
        let config = BootstrapConfig::from_json(
            r#"{
                "movie_identifier": "live",
                "servers": ["http://a", "http://b"],
                "segment_run_tables": [{ "runs": [{ "first_segment": 1, "fragments_per_segment": 4 }] }],
                "fragment_run_tables": [{ "runs": [{ "first_fragment": 1, "duration": 4000 }] }]
            }"#,
        )
        .unwrap();
        assert!(config.live);
        assert_eq!(config.timescale, 1000);
        assert_eq!(config.fragment_run_tables[0].timescale, 1000);

        let mut abst = create_bootstrap(&config);
        assert_eq!(abst.movie_identifier(), "live");
        assert_eq!(abst.server_entry_count(), 2);
        assert_eq!(abst.server_entry(1), "http://b");
        assert_eq!(
            abst.segment_run_table(0).unwrap().segment_run(0).fragments_per_segment,
            4
        );
        assert_eq!(abst.fragment_run_table(0).unwrap().fragment_run(0).duration, 4000);
    }

    #[test]
    fn test_invalid_json_is_a_config_error() {
        assert!(matches!(
            FragmentConfig::from_json("{ \"track_id\": \"one\" }"),
            Err(crate::Error::Config(_))
        ));
    }

    #[test]
    fn test_fragment_children() {
        let config = FragmentConfig {
            sequence_number: 9,
            default_sample_duration: Some(40),
            samples: vec![
                SampleConfig {
                    size: Some(100),
                    ..Default::default()
                },
                SampleConfig {
                    size: Some(200),
                    flags: Some(trun::NO_KEY_SAMPLE),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let moof = create_fragment(&config);
        let children = moof.children();
        assert_eq!(children.len(), 3);

        let mut mfhd = MfhdBox::from_box(Mp4Box::view(children[0].as_box()));
        assert_eq!(mfhd.sequence_number(), 9);
        let mut tfhd = TfhdBox::from_box(Mp4Box::view(children[1].as_box()));
        assert_eq!(tfhd.default_sample_duration(), 40);
        let mut trun = TrunBox::from_box(Mp4Box::view(children[2].as_box()));
        assert_eq!(trun.flags(), trun::SAMPLE_SIZE | trun::SAMPLE_FLAGS);
        assert_eq!(trun.sample_count(), 2);
        assert_eq!(trun.sample_information(0).sample_flags, 0);
        assert_eq!(trun.sample_information(1).sample_size, 200);
    }

    #[test]
    fn test_media_segment_data_offset_points_at_payload() {
        let config = FragmentConfig {
            samples: vec![SampleConfig {
                size: Some(4),
                ..Default::default()
            }],
            ..Default::default()
        };
        let segment = create_media_segment(&config, &[1, 2, 3, 4]);
        let boxes = parse_boxes(&segment).unwrap();
        assert_eq!(boxes.len(), 2);
        assert!(boxes[1].is_type(b"mdat"));

        let moof = MoofBox::from_box(Mp4Box::view(boxes[0].as_box()));
        let children = moof.children();
        let mut trun = TrunBox::from_box(Mp4Box::view(children[2].as_box()));
        let offset = trun.data_offset() as usize;
        assert_eq!(&segment[offset..offset + 4], &[1, 2, 3, 4]);
    }
}
