use super::generic::{pretty_line, typed_box, Mp4Box, TypedBox};

// The `MfhdBox` struct represents a Movie Fragment Header Box.
// Payload layout:
// - 0: version (8 bits)
// - 1: flags (24 bits)
// - 4: sequence number (32 bits), typically starting at 1 and incremented per fragment
pub struct MfhdBox<'a>(Mp4Box<'a>);

typed_box!(MfhdBox);

impl MfhdBox<'static> {
    pub fn new() -> Self {
        let mut b = MfhdBox(Mp4Box::with_type(Self::BOX_TYPE));
        b.set_u32(0, 0); // version + flags
        b.set_sequence_number(0);
        b
    }
}

impl MfhdBox<'_> {
    pub fn sequence_number(&mut self) -> u32 {
        self.get_u32(4)
    }

    pub fn set_sequence_number(&mut self, sequence_number: u32) {
        self.set_u32(sequence_number, 4)
    }

    pub fn to_pretty_string(&mut self, indent: usize) -> String {
        let mut r = String::new();
        pretty_line(&mut r, indent, "[mfhd] Movie Fragment Header");
        pretty_line(
            &mut r,
            indent + 1,
            format_args!("SequenceNumber {}", self.sequence_number()),
        );
        r
    }
}

impl<'a> TypedBox<'a> for MfhdBox<'a> {
    const BOX_TYPE: [u8; 4] = *b"mfhd";

    fn from_box(inner: Mp4Box<'a>) -> Self {
        MfhdBox(inner)
    }

    fn into_box(self) -> Mp4Box<'a> {
        self.0
    }

    fn to_pretty_string(&mut self, indent: usize) -> String {
        MfhdBox::to_pretty_string(self, indent)
    }
}
