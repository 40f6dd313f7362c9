//! # HTTP Dynamic Streaming Box Overview
//!
//! HTTP Dynamic Streaming (HDS) describes a stream with a handful of binary records taken
//! from the MP4 family: a bootstrap box that tells a player which fragments exist, and
//! movie fragment boxes that describe the samples inside one fragment.
//!
//! ## Structure of a Box
//! Every record is a **box**:
//! - **Box Header**: 4 bytes of total size (header included, big-endian) followed by a
//!   4-character type (e.g. `abst`, `moof`).
//! - **Box Payload**: fixed fields, zero-terminated strings, counted tables or other boxes.
//!
//! ### Boxes Implemented Here
//! 1. **Bootstrap Info Box (`abst`)**:
//!    - Timing information, server and quality entries, DRM data and metadata.
//!    - Embeds segment run tables (`asrt`) and fragment run tables (`afrt`).
//!
//! 2. **Segment Run Table Box (`asrt`)**:
//!    - Maps segments to the number of fragments they contain.
//!
//! 3. **Fragment Run Table Box (`afrt`)**:
//!    - Maps fragments to timestamps and durations.
//!
//! 4. **Movie Fragment Box (`moof`)** with **`mfhd`**, **`tfhd`** and **`trun`**:
//!    - Sequence number, per-track defaults and per-sample information of one fragment.
//!
//! ## Editing in Place
//! Boxes are kept as their encoded bytes. Setters write straight into the buffer, growing
//! or shrinking it and shifting whatever follows, so a box is always ready to be sent with
//! [`boxes::generic::Mp4Box::as_box`]. The position of a field behind a variable-length
//! region is recomputed on every access by walking the regions before it.
//!
//! ## Implementation in This Library
//! - The `boxes` module defines the raw box and the typed boxes on top of it.
//! - The `reader` module slices boxes out of a byte stream.
//! - The `writer` module builds bootstrap and fragment boxes from a configuration.

pub mod boxes;
pub mod error;
pub mod reader;
pub mod writer;

pub use boxes::generic::{Mp4Box, TypedBox, HEADER_SIZE};
pub use error::{Error, Result};

pub fn format_fourcc(fourcc: &[u8; 4]) -> String {
    std::str::from_utf8(fourcc).unwrap_or("????").to_string()
}

pub fn format_capped_bytes(data: &[u8]) -> String {
    let capped = &data[..data.len().min(8)];
    if data.len() > 8 {
        format!("{:?} ...", capped)
    } else {
        format!("{:?}", capped)
    }
}
