use tracing::trace;

use super::generic::{pretty_line, typed_box, Mp4Box, TypedBox, HEADER_SIZE};

// The `MoofBox` struct represents a Movie Fragment Box.
// Its payload is nothing but complete child boxes (typically `mfhd` followed by
// track fragment boxes) stored back to back, without a count.
pub struct MoofBox<'a>(Mp4Box<'a>);

typed_box!(MoofBox);

impl MoofBox<'static> {
    pub fn new() -> Self {
        MoofBox(Mp4Box::with_type(Self::BOX_TYPE))
    }
}

impl MoofBox<'_> {
    /// Borrows every child box, in storage order. Walking stops at a child whose
    /// declared size cannot be right.
    pub fn children(&self) -> Vec<Mp4Box<'_>> {
        let mut children = Vec::new();
        let mut offset = 0;
        while offset < self.payload_size() {
            let Some(child) = self.view_at(offset) else {
                trace!(offset, "trailing bytes after last child");
                break;
            };
            let size = child.boxed_size();
            if size < HEADER_SIZE || size > self.payload_size() - offset {
                trace!(offset, size, "child with invalid size");
                break;
            }
            offset += size;
            children.push(child);
        }
        children
    }

    /// Appends a copy of `child` at the end of the payload.
    pub fn add_content(&mut self, child: &Mp4Box<'_>) {
        let end = self.payload_size();
        self.set_bytes(child.as_box(), end);
    }

    pub fn to_pretty_string(&mut self, indent: usize) -> String {
        let mut r = String::new();
        pretty_line(&mut r, indent, "[moof] Movie Fragment Box");
        for mut child in self.children() {
            r.push_str(&child.to_pretty_string(indent + 1));
        }
        r
    }
}

impl<'a> TypedBox<'a> for MoofBox<'a> {
    const BOX_TYPE: [u8; 4] = *b"moof";

    fn from_box(inner: Mp4Box<'a>) -> Self {
        MoofBox(inner)
    }

    fn into_box(self) -> Mp4Box<'a> {
        self.0
    }

    fn to_pretty_string(&mut self, indent: usize) -> String {
        MoofBox::to_pretty_string(self, indent)
    }
}
