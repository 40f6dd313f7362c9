//! Property-based tests for in-place resizing and table insertion

use proptest::prelude::*;

use hds_box::boxes::abst::AbstBox;
use hds_box::boxes::asrt::{AsrtBox, SegmentRunEntry};
use hds_box::Mp4Box;

/// Owned box with the given payload
fn box_with_payload(payload: &[u8]) -> Mp4Box<'static> {
    let mut b = Mp4Box::with_type(*b"test");
    b.set_bytes(payload, 0);
    b
}

/// Payload plus a region (position, current) inside it
fn arb_payload_and_region() -> impl Strategy<Value = (Vec<u8>, usize, usize)> {
    prop::collection::vec(any::<u8>(), 0..128).prop_flat_map(|payload| {
        let len = payload.len();
        (Just(payload), 0..=len).prop_flat_map(|(payload, position)| {
            let rest = payload.len() - position;
            (Just(payload), Just(position), 0..=rest)
        })
    })
}

/// String without NUL bytes
fn arb_entry() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9:/._-]{0,24}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Resizing keeps the bytes around the region and zero fills growth
    #[test]
    fn reserve_preserves_surrounding_bytes(
        (payload, position, current) in arb_payload_and_region(),
        wanted in 0usize..64,
    ) {
        let mut b = box_with_payload(&payload);
        b.reserve(position, current, wanted).unwrap();

        let new_len = payload.len() - current + wanted;
        prop_assert_eq!(b.payload_size(), new_len);
        prop_assert_eq!(b.boxed_size(), 8 + new_len);
        prop_assert_eq!(&b.as_box()[0..4], &((8 + new_len) as u32).to_be_bytes()[..]);
        prop_assert_eq!(&b.payload()[..position], &payload[..position]);
        prop_assert_eq!(&b.payload()[position + wanted..], &payload[position + current..]);
        if wanted > current {
            prop_assert!(b.payload()[position + current..position + wanted].iter().all(|&x| x == 0));
        }
        prop_assert!(b.capacity() >= b.boxed_size());
    }

    /// Growing then shrinking the same region gives the original box back
    #[test]
    fn reserve_grow_then_shrink_is_identity(
        (payload, position, _current) in arb_payload_and_region(),
        grow in 1usize..64,
    ) {
        let mut b = box_with_payload(&payload);
        let original = b.as_box().to_vec();
        b.reserve(position, 0, grow).unwrap();
        b.reserve(position, grow, 0).unwrap();
        prop_assert_eq!(b.as_box(), &original[..]);
    }

    /// The length prefix follows every write, including writes past the end
    #[test]
    fn length_prefix_tracks_writes(
        writes in prop::collection::vec((0usize..200, any::<u32>()), 1..20),
    ) {
        let mut b = Mp4Box::new();
        let mut end = 0;
        for (offset, value) in &writes {
            b.set_u32(*value, *offset);
            end = end.max(offset + 4);
        }
        prop_assert_eq!(b.boxed_size(), 8 + end);
        prop_assert_eq!(b.as_box().len(), 8 + end);
        prop_assert_eq!(
            u32::from_be_bytes(b.as_box()[0..4].try_into().unwrap()) as usize,
            8 + end
        );
    }

    /// Setting server entry N past the count fills the gap with empty entries
    #[test]
    fn server_table_insertion(
        initial in prop::collection::vec(arb_entry(), 0..5),
        index in 0usize..10,
        entry in arb_entry(),
        metadata in arb_entry(),
    ) {
        let mut abst = AbstBox::new();
        abst.set_metadata(&metadata);
        for (i, e) in initial.iter().enumerate() {
            abst.set_server_entry(i, e);
        }
        abst.set_server_entry(index, &entry);

        let count = initial.len().max(index + 1);
        prop_assert_eq!(abst.server_entry_count() as usize, count);
        for i in 0..count {
            let expected = if i == index {
                entry.as_str()
            } else if i < initial.len() {
                initial[i].as_str()
            } else {
                ""
            };
            prop_assert_eq!(abst.server_entry(i), expected);
        }
        prop_assert_eq!(abst.metadata(), metadata);
    }

    /// Rewriting a quality entry leaves the run records behind it intact
    #[test]
    fn segment_runs_survive_quality_rewrites(
        runs in prop::collection::vec((any::<u32>(), any::<u32>()), 1..10),
        first in arb_entry(),
        second in arb_entry(),
    ) {
        let mut asrt = AsrtBox::new();
        asrt.set_quality_entry(0, &first);
        for (i, (first_segment, fragments_per_segment)) in runs.iter().enumerate() {
            asrt.set_segment_run(i, SegmentRunEntry {
                first_segment: *first_segment,
                fragments_per_segment: *fragments_per_segment,
            });
        }
        asrt.set_quality_entry(0, &second);

        prop_assert_eq!(asrt.quality_entry(0), second.clone());
        prop_assert_eq!(asrt.segment_run_entry_count() as usize, runs.len());
        for (i, (first_segment, fragments_per_segment)) in runs.iter().enumerate() {
            let run = asrt.segment_run(i);
            prop_assert_eq!(run.first_segment, *first_segment);
            prop_assert_eq!(run.fragments_per_segment, *fragments_per_segment);
        }
        prop_assert_eq!(asrt.boxed_size(), 17 + second.len() + 1 + 8 * runs.len());
    }
}
