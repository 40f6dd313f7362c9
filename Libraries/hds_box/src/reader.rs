use std::fs;
use std::path::Path;

use bytes::BytesMut;
use tracing::{debug, trace};

use crate::boxes::generic::{Mp4Box, HEADER_SIZE};
use crate::error::{Error, Result};
use crate::format_fourcc;

/// Slices every complete box off the front of `stream`.
///
/// A trailing partial box is left in the stream so more bytes can be appended
/// before the next call. Reading also stops at a box with an invalid size, which
/// stays in the stream as well.
pub fn read_boxes(stream: &mut BytesMut) -> Vec<Mp4Box<'static>> {
    let mut boxes = Vec::new();
    loop {
        let mut b = Mp4Box::new();
        match b.read(stream) {
            Ok(()) => {
                trace!(
                    box_type = %format_fourcc(&b.box_type()),
                    size = b.boxed_size(),
                    "read box"
                );
                boxes.push(b);
            }
            Err(Error::Incomplete { need, have }) => {
                if have > 0 {
                    debug!(need, have, "stopping at incomplete box");
                }
                break;
            }
            Err(e) => {
                debug!(error = %e, remaining = stream.len(), "stopping at malformed box");
                break;
            }
        }
    }
    boxes
}

/// Borrows every box of `data` without copying.
///
/// Fails when `data` does not end exactly at a box boundary.
pub fn parse_boxes(data: &[u8]) -> Result<Vec<Mp4Box<'_>>> {
    let mut boxes = Vec::new();
    let mut rest = data;
    while !rest.is_empty() {
        if rest.len() < HEADER_SIZE {
            return Err(Error::Incomplete {
                need: HEADER_SIZE,
                have: rest.len(),
            });
        }
        let b = Mp4Box::view(rest);
        let size = b.boxed_size();
        if size < HEADER_SIZE {
            return Err(Error::InvalidSize(size));
        }
        if size > rest.len() {
            return Err(Error::Incomplete {
                need: size,
                have: rest.len(),
            });
        }
        boxes.push(b);
        rest = &rest[size..];
    }
    Ok(boxes)
}

/// Reads every complete box of a file into owned boxes.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<Mp4Box<'static>>> {
    let data = fs::read(path.as_ref())?;
    let total = data.len();
    let mut stream = BytesMut::from(&data[..]);
    let boxes = read_boxes(&mut stream);
    if !stream.is_empty() {
        debug!(
            path = %path.as_ref().display(),
            trailing = stream.len(),
            total,
            "ignoring trailing bytes"
        );
    }
    Ok(boxes)
}
