// This module contains the box types used by HTTP Dynamic Streaming.
// Every box is stored as its encoded bytes; the typed boxes only add field accessors
// on top of the raw `Mp4Box`.
//
// The following submodules are included:
//
// - `generic`: Contains the raw `Mp4Box`, its resize primitive and the `TypedBox` trait.
// - `abst`: Defines the Bootstrap Info Box, the index of an HDS stream.
// - `afrt`: Defines the Fragment Run Table Box, which maps fragments to timestamps.
// - `asrt`: Defines the Segment Run Table Box, which maps segments to fragment counts.
// - `mfhd`: Defines the Movie Fragment Header Box, which carries the fragment sequence number.
// - `moof`: Defines the Movie Fragment Box, a container for the fragment's boxes.
// - `tfhd`: Defines the Track Fragment Header Box, which provides per-track defaults.
// - `trun`: Defines the Track Fragment Run Box, which lists the samples of a run.

pub mod abst;
pub mod afrt;
pub mod asrt;
pub mod generic;
pub mod mfhd;
pub mod moof;
pub mod tfhd;
pub mod trun;
