use byteorder::{BigEndian, ByteOrder};
use bytes::{Buf, BytesMut};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::{format_capped_bytes, format_fourcc};

use super::{
    abst::AbstBox, afrt::AfrtBox, asrt::AsrtBox, mfhd::MfhdBox, moof::MoofBox, tfhd::TfhdBox,
    trun::TrunBox,
};

/// Size of the box header: 4 bytes of length followed by the 4 byte type.
pub const HEADER_SIZE: usize = 8;

// Backing bytes of a box. Owned buffers always hold exactly `boxed_size()` bytes,
// spare room lives in the vector capacity.
enum Storage<'a> {
    Owned(Vec<u8>),
    Borrowed(&'a [u8]),
}

// The `Mp4Box` struct is one complete length-prefixed record:
// - bytes 0..4: total size of the box, header included (big-endian)
// - bytes 4..8: the four character type
// - bytes 8.. : the payload
//
// Every accessor takes an offset relative to the start of the payload. Reads and
// writes past the end grow the box so the access fits; when growing is impossible
// (borrowed view, allocation failure) getters return zero and setters do nothing.
pub struct Mp4Box<'a> {
    storage: Storage<'a>,
}

impl Mp4Box<'static> {
    /// Creates an empty owned box: 8 bytes, length 8, type `\0\0\0\0`.
    pub fn new() -> Self {
        let mut data = Vec::with_capacity(HEADER_SIZE);
        data.extend_from_slice(&(HEADER_SIZE as u32).to_be_bytes());
        data.extend_from_slice(&[0; 4]);
        Mp4Box {
            storage: Storage::Owned(data),
        }
    }

    /// Creates an empty owned box with the given type.
    pub fn with_type(box_type: [u8; 4]) -> Self {
        let mut b = Self::new();
        b.set_box_type(box_type);
        b
    }

    /// Takes ownership of a buffer that starts with a complete box.
    /// Bytes past the declared size are dropped.
    pub fn from_bytes(mut data: Vec<u8>) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::Incomplete {
                need: HEADER_SIZE,
                have: data.len(),
            });
        }
        let size = BigEndian::read_u32(&data[0..4]) as usize;
        if size < HEADER_SIZE {
            return Err(Error::InvalidSize(size));
        }
        if data.len() < size {
            return Err(Error::Incomplete {
                need: size,
                have: data.len(),
            });
        }
        data.truncate(size);
        Ok(Mp4Box {
            storage: Storage::Owned(data),
        })
    }
}

impl Default for Mp4Box<'_> {
    fn default() -> Self {
        Mp4Box::new()
    }
}

impl<'a> Mp4Box<'a> {
    /// Wraps borrowed bytes without copying them. The first 4 bytes are taken as
    /// the declared size. The view can be inspected but never modified.
    pub fn view(data: &'a [u8]) -> Self {
        let size = data
            .get(0..4)
            .map_or(data.len(), |b| BigEndian::read_u32(b) as usize);
        Mp4Box {
            storage: Storage::Borrowed(&data[..size.min(data.len())]),
        }
    }

    /// Whether this box owns (and may resize) its buffer.
    pub fn is_owned(&self) -> bool {
        matches!(self.storage, Storage::Owned(_))
    }

    fn bytes(&self) -> &[u8] {
        match &self.storage {
            Storage::Owned(data) => data,
            Storage::Borrowed(data) => data,
        }
    }

    fn bytes_mut(&mut self) -> Option<&mut Vec<u8>> {
        match &mut self.storage {
            Storage::Owned(data) => Some(data),
            Storage::Borrowed(_) => None,
        }
    }

    /// Slices one complete box off the front of `stream` into an owned buffer.
    ///
    /// On failure the stream is left untouched, so the caller can append more
    /// bytes and try again.
    pub fn read(&mut self, stream: &mut BytesMut) -> Result<()> {
        if !self.is_owned() {
            return Err(Error::NotOwned);
        }
        if stream.len() < 4 {
            return Err(Error::Incomplete {
                need: HEADER_SIZE,
                have: stream.len(),
            });
        }
        let size = BigEndian::read_u32(&stream[0..4]) as usize;
        if size < HEADER_SIZE {
            debug!(size, "rejecting box with a size smaller than its header");
            return Err(Error::InvalidSize(size));
        }
        if stream.len() < size {
            trace!(need = size, have = stream.len(), "box not complete yet");
            return Err(Error::Incomplete {
                need: size,
                have: stream.len(),
            });
        }

        let mut data = Vec::new();
        data.try_reserve_exact(size)?;
        data.extend_from_slice(&stream[..size]);
        stream.advance(size);
        self.storage = Storage::Owned(data);
        Ok(())
    }

    /// Total size of the box including the header, as stored in its first 4 bytes.
    pub fn boxed_size(&self) -> usize {
        self.bytes()
            .get(0..4)
            .map_or(0, |b| BigEndian::read_u32(b) as usize)
    }

    /// Size of the box without the 8 byte header.
    pub fn payload_size(&self) -> usize {
        self.boxed_size().saturating_sub(HEADER_SIZE)
    }

    /// Number of bytes the box can hold without reallocating.
    pub fn capacity(&self) -> usize {
        match &self.storage {
            Storage::Owned(data) => data.capacity(),
            Storage::Borrowed(data) => data.len(),
        }
    }

    /// The complete box, header included.
    pub fn as_box(&self) -> &[u8] {
        let data = self.bytes();
        &data[..self.boxed_size().min(data.len())]
    }

    /// The payload, header excluded.
    pub fn payload(&self) -> &[u8] {
        self.as_box().get(HEADER_SIZE..).unwrap_or(&[])
    }

    /// Resets the box to an empty owned 8 byte box. A view is detached from the
    /// bytes it borrowed, which stay untouched.
    pub fn clear(&mut self) {
        *self = Mp4Box::new();
    }

    /// The four character type at bytes 4..8.
    pub fn box_type(&self) -> [u8; 4] {
        let mut box_type = [0; 4];
        if let Some(b) = self.bytes().get(4..HEADER_SIZE) {
            box_type.copy_from_slice(b);
        }
        box_type
    }

    pub fn is_type(&self, box_type: &[u8; 4]) -> bool {
        self.box_type() == *box_type
    }

    pub fn set_box_type(&mut self, box_type: [u8; 4]) {
        if let Some(data) = self.bytes_mut() {
            data[4..HEADER_SIZE].copy_from_slice(&box_type);
        }
    }

    /// Resizes the payload region at `position` from `current` to `wanted` bytes.
    ///
    /// Bytes after the region are shifted so they stay directly behind it, and the
    /// length prefix is updated. Grown space is zero filled. Shrinking never
    /// releases capacity. Offsets past `position` computed before the call are
    /// stale afterwards.
    pub fn reserve(&mut self, position: usize, current: usize, wanted: usize) -> Result<()> {
        if current == wanted {
            return Ok(());
        }
        let total = self.boxed_size();
        let start = HEADER_SIZE + position;
        let Some(data) = self.bytes_mut() else {
            return Err(Error::NotOwned);
        };
        if start + current > total {
            return Err(Error::OutOfRange {
                position,
                current,
                total,
            });
        }

        if wanted > current {
            let grow = wanted - current;
            let new_total = total + grow;
            if new_total > u32::MAX as usize {
                return Err(Error::TooLarge(new_total));
            }
            data.try_reserve_exact(grow)?;
            let tail = start + current;
            data.splice(tail..tail, std::iter::repeat(0).take(grow));
            BigEndian::write_u32(&mut data[0..4], new_total as u32);
        } else {
            let shrink = current - wanted;
            data.drain(start + wanted..start + current);
            BigEndian::write_u32(&mut data[0..4], (total - shrink) as u32);
        }
        Ok(())
    }

    // Makes sure `width` bytes at `offset` lie inside the box, growing it at the end
    // if needed.
    fn ensure(&mut self, offset: usize, width: usize) -> bool {
        let total = self.boxed_size();
        let end = HEADER_SIZE + offset + width;
        if end <= total {
            return true;
        }
        match self.reserve(total.saturating_sub(HEADER_SIZE), 0, end - total) {
            Ok(()) => true,
            Err(e) => {
                trace!(offset, width, error = %e, "cannot grow box to cover access");
                false
            }
        }
    }

    /// Reads a big-endian integer without growing the box.
    pub(crate) fn peek_uint(&self, offset: usize, width: usize) -> Option<u64> {
        let start = HEADER_SIZE + offset;
        if start + width > self.boxed_size() {
            return None;
        }
        self.bytes()
            .get(start..start + width)
            .map(|b| BigEndian::read_uint(b, width))
    }

    fn get_uint(&mut self, offset: usize, width: usize) -> u64 {
        if !self.ensure(offset, width) {
            return 0;
        }
        self.peek_uint(offset, width).unwrap_or(0)
    }

    fn set_uint(&mut self, value: u64, offset: usize, width: usize) {
        if !self.ensure(offset, width) {
            return;
        }
        let start = HEADER_SIZE + offset;
        let mask = if width == 8 {
            u64::MAX
        } else {
            (1u64 << (width * 8)) - 1
        };
        if let Some(data) = self.bytes_mut() {
            BigEndian::write_uint(&mut data[start..start + width], value & mask, width);
        }
    }

    pub fn get_u8(&mut self, offset: usize) -> u8 {
        self.get_uint(offset, 1) as u8
    }

    pub fn set_u8(&mut self, value: u8, offset: usize) {
        self.set_uint(value as u64, offset, 1)
    }

    pub fn get_u16(&mut self, offset: usize) -> u16 {
        self.get_uint(offset, 2) as u16
    }

    pub fn set_u16(&mut self, value: u16, offset: usize) {
        self.set_uint(value as u64, offset, 2)
    }

    /// 24-bit integer, as used for full box flags.
    pub fn get_u24(&mut self, offset: usize) -> u32 {
        self.get_uint(offset, 3) as u32
    }

    /// Only the low 24 bits of `value` are stored.
    pub fn set_u24(&mut self, value: u32, offset: usize) {
        self.set_uint(value as u64, offset, 3)
    }

    pub fn get_u32(&mut self, offset: usize) -> u32 {
        self.get_uint(offset, 4) as u32
    }

    pub fn set_u32(&mut self, value: u32, offset: usize) {
        self.set_uint(value as u64, offset, 4)
    }

    pub fn get_u64(&mut self, offset: usize) -> u64 {
        self.get_uint(offset, 8)
    }

    pub fn set_u64(&mut self, value: u64, offset: usize) {
        self.set_uint(value, offset, 8)
    }

    /// Borrows `len` raw payload bytes at `offset`, if they lie inside the box.
    pub fn get_bytes(&self, offset: usize, len: usize) -> Option<&[u8]> {
        self.payload().get(offset..offset + len)
    }

    /// Overwrites raw payload bytes at `offset`, growing the box if they run past
    /// the end.
    pub fn set_bytes(&mut self, bytes: &[u8], offset: usize) {
        if !self.ensure(offset, bytes.len()) {
            return;
        }
        let start = HEADER_SIZE + offset;
        if let Some(data) = self.bytes_mut() {
            data[start..start + bytes.len()].copy_from_slice(bytes);
        }
    }

    /// Length of the zero-terminated string at `offset`, terminator excluded.
    /// A string without terminator runs up to the end of the box.
    pub fn get_string_len(&self, offset: usize) -> usize {
        match self.as_box().get(HEADER_SIZE + offset..) {
            Some(rest) => rest.iter().position(|&c| c == 0).unwrap_or(rest.len()),
            None => 0,
        }
    }

    /// Reads the zero-terminated string at `offset`. A string starting past the
    /// end of the box is created empty.
    pub fn get_string(&mut self, offset: usize) -> String {
        if HEADER_SIZE + offset >= self.boxed_size() && !self.ensure(offset, 1) {
            return String::new();
        }
        let len = self.get_string_len(offset);
        let start = HEADER_SIZE + offset;
        self.as_box()
            .get(start..start + len)
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }

    /// Replaces the zero-terminated string at `offset`, shifting everything behind
    /// it when the length changes. Input is cut at its first NUL.
    pub fn set_string(&mut self, value: &str, offset: usize) {
        let value = value.as_bytes();
        let value = &value[..value.iter().position(|&c| c == 0).unwrap_or(value.len())];

        let current = self.get_string_len(offset);
        // No terminator yet: the string is new or runs to the end of the box.
        if HEADER_SIZE + offset + current >= self.boxed_size() && !self.ensure(offset + current, 1)
        {
            return;
        }
        if current != value.len() {
            if let Err(e) = self.reserve(offset, current + 1, value.len() + 1) {
                trace!(offset, error = %e, "cannot resize string");
                return;
            }
        }
        let start = HEADER_SIZE + offset;
        if let Some(data) = self.bytes_mut() {
            data[start..start + value.len()].copy_from_slice(value);
            data[start + value.len()] = 0;
        }
    }

    /// Offset just past `count` consecutive strings starting at `offset`.
    pub(crate) fn skip_strings(&self, mut offset: usize, count: usize) -> usize {
        for _ in 0..count {
            offset += self.get_string_len(offset) + 1;
        }
        offset
    }

    /// Offset just past `count` consecutive boxes starting at `offset`.
    pub(crate) fn skip_boxes(&self, mut offset: usize, count: usize) -> usize {
        for _ in 0..count {
            offset += self.peek_uint(offset, 4).unwrap_or(0) as usize;
        }
        offset
    }

    /// Borrows the box stored in the payload at `offset`.
    pub fn view_at(&self, offset: usize) -> Option<Mp4Box<'_>> {
        let rest = self.payload().get(offset..)?;
        if rest.len() < HEADER_SIZE {
            return None;
        }
        Some(Mp4Box::view(rest))
    }

    /// Sets string `no` of a table whose 8-bit entry count sits at `count_offset`,
    /// directly followed by the entries. Missing entries before `no` are added as
    /// empty strings.
    pub(crate) fn set_table_string(&mut self, count_offset: usize, no: usize, value: &str) {
        let count = self.get_u8(count_offset) as usize;
        let first = count_offset + 1;
        let offset = if no < count {
            self.skip_strings(first, no)
        } else {
            if no >= u8::MAX as usize {
                trace!(no, "string table is full");
                return;
            }
            let end = self.skip_strings(first, count);
            let missing = no - count;
            if let Err(e) = self.reserve(end, 0, missing + 1) {
                trace!(no, error = %e, "cannot grow string table");
                return;
            }
            self.set_u8((no + 1) as u8, count_offset);
            end + missing
        };
        self.set_string(value, offset);
    }

    /// Reads string `no` of a counted table, or an empty string past the count.
    pub(crate) fn get_table_string(&mut self, count_offset: usize, no: usize) -> String {
        let count = self.get_u8(count_offset) as usize;
        if no >= count {
            return String::new();
        }
        let offset = self.skip_strings(count_offset + 1, no);
        self.get_string(offset)
    }

    /// Stores a copy of `child` as box `no` of a table whose 8-bit count sits at
    /// `count_offset`. Missing boxes before `no` are added as empty 8 byte boxes.
    pub(crate) fn set_table_box(&mut self, count_offset: usize, no: usize, child: &Mp4Box<'_>) {
        let count = self.get_u8(count_offset) as usize;
        let first = count_offset + 1;
        let bytes = child.as_box();

        if no < count {
            let offset = self.skip_boxes(first, no);
            let current = self.peek_uint(offset, 4).unwrap_or(0) as usize;
            if let Err(e) = self.reserve(offset, current, bytes.len()) {
                trace!(no, error = %e, "cannot resize nested box");
                return;
            }
            self.set_bytes(bytes, offset);
            return;
        }

        if no >= u8::MAX as usize {
            trace!(no, "box table is full");
            return;
        }
        let end = self.skip_boxes(first, count);
        let placeholders = (no - count) * HEADER_SIZE;
        if let Err(e) = self.reserve(end, 0, placeholders + bytes.len()) {
            trace!(no, error = %e, "cannot grow box table");
            return;
        }
        for i in 0..no - count {
            self.set_u32(HEADER_SIZE as u32, end + i * HEADER_SIZE);
        }
        self.set_bytes(bytes, end + placeholders);
        self.set_u8((no + 1) as u8, count_offset);
    }

    /// Borrows box `no` of a counted box table, or `None` past the count.
    pub(crate) fn get_table_box(&mut self, count_offset: usize, no: usize) -> Option<Mp4Box<'_>> {
        let count = self.get_u8(count_offset) as usize;
        if no >= count {
            return None;
        }
        let offset = self.skip_boxes(count_offset + 1, no);
        self.view_at(offset)
    }

    /// Offset of fixed-size record `no` in a table whose 32-bit count sits at
    /// `count_offset` and whose records start at `first`. Records past the count
    /// are added zero filled and the count raised to cover `no`.
    pub(crate) fn record_slot(
        &mut self,
        count_offset: usize,
        first: usize,
        no: usize,
        width: usize,
    ) -> Option<usize> {
        let count = self.get_u32(count_offset) as usize;
        if no >= count {
            if no >= u32::MAX as usize {
                return None;
            }
            let end = first + count * width;
            if !self.ensure(end, 0) {
                return None;
            }
            if let Err(e) = self.reserve(end, 0, (no + 1 - count) * width) {
                trace!(no, error = %e, "cannot grow record table");
                return None;
            }
            self.set_u32((no + 1) as u32, count_offset);
        }
        Some(first + no * width)
    }

    /// Tries to reinterpret this box as a typed box, checking the type first.
    pub fn downcast<T: TypedBox<'a>>(self) -> std::result::Result<T, Self> {
        if self.is_type(&T::BOX_TYPE) {
            Ok(T::from_box(self))
        } else {
            Err(self)
        }
    }

    /// Human readable dump, dispatched on the box type.
    pub fn to_pretty_string(&mut self, indent: usize) -> String {
        match &self.box_type() {
            b"mfhd" => self.pretty_as::<MfhdBox>(indent),
            b"moof" => self.pretty_as::<MoofBox>(indent),
            b"tfhd" => self.pretty_as::<TfhdBox>(indent),
            b"trun" => self.pretty_as::<TrunBox>(indent),
            b"abst" => self.pretty_as::<AbstBox>(indent),
            b"afrt" => self.pretty_as::<AfrtBox>(indent),
            b"asrt" => self.pretty_as::<AsrtBox>(indent),
            other => format!(
                "{}Unimplemented pretty-printing for box {}\n",
                " ".repeat(indent),
                format_fourcc(other)
            ),
        }
    }

    fn pretty_as<T: TypedBox<'a>>(&mut self, indent: usize) -> String {
        let mut typed = T::from_box(std::mem::take(self));
        let pretty = typed.to_pretty_string(indent);
        *self = typed.into_box();
        pretty
    }
}

impl std::fmt::Debug for Mp4Box<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mp4Box")
            .field("box_size", &self.boxed_size())
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("owned", &self.is_owned())
            .field("payload", &format_capped_bytes(self.payload()))
            .finish()
    }
}

// The `TypedBox` trait is implemented by every box with a known layout. A typed
// box is the same bytes as an `Mp4Box` with field accessors on top, so converting
// in either direction never copies.
pub trait TypedBox<'a>: Sized {
    /// The four character type this box is stamped with.
    const BOX_TYPE: [u8; 4];

    /// Reinterprets a box without checking its type.
    fn from_box(inner: Mp4Box<'a>) -> Self;

    fn into_box(self) -> Mp4Box<'a>;

    fn to_pretty_string(&mut self, indent: usize) -> String;
}

/// Appends one indented line to a pretty-print buffer.
pub(crate) fn pretty_line(out: &mut String, indent: usize, line: impl std::fmt::Display) {
    out.push_str(&" ".repeat(indent));
    out.push_str(&line.to_string());
    out.push('\n');
}

// Implements the plumbing shared by every typed box newtype: deref to the raw
// box, conversions and `Debug`.
macro_rules! typed_box {
    ($name:ident) => {
        impl<'a> std::ops::Deref for $name<'a> {
            type Target = $crate::boxes::generic::Mp4Box<'a>;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl<'a> std::ops::DerefMut for $name<'a> {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl<'a> From<$name<'a>> for $crate::boxes::generic::Mp4Box<'a> {
            fn from(b: $name<'a>) -> Self {
                b.0
            }
        }

        impl Default for $name<'static> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Debug for $name<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.0).finish()
            }
        }
    };
}

pub(crate) use typed_box;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_box_is_header_only() {
        let b = Mp4Box::new();
        assert_eq!(b.boxed_size(), 8);
        assert_eq!(b.payload_size(), 0);
        assert_eq!(b.as_box(), &[0, 0, 0, 8, 0, 0, 0, 0]);
        assert!(b.is_owned());
    }

    #[test]
    fn test_get_past_end_grows() {
        let mut b = Mp4Box::with_type(*b"test");
        assert_eq!(b.get_u32(10), 0);
        assert_eq!(b.boxed_size(), 8 + 10 + 4);
        assert_eq!(b.as_box().len(), 22);
        assert_eq!(&b.as_box()[0..4], &22u32.to_be_bytes());
    }

    #[test]
    fn test_integer_round_trip() {
        let mut b = Mp4Box::with_type(*b"test");
        b.set_u8(0xAB, 0);
        b.set_u16(0x1234, 1);
        b.set_u24(0xFF_123456, 3);
        b.set_u32(0xDEADBEEF, 6);
        b.set_u64(0x0102_0304_0506_0708, 10);
        assert_eq!(b.get_u8(0), 0xAB);
        assert_eq!(b.get_u16(1), 0x1234);
        assert_eq!(b.get_u24(3), 0x123456);
        assert_eq!(b.get_u32(6), 0xDEADBEEF);
        assert_eq!(b.get_u64(10), 0x0102_0304_0506_0708);
        assert_eq!(b.boxed_size(), 8 + 18);
        assert_eq!(&b.payload()[3..6], &[0x12, 0x34, 0x56]);
    }

    #[test]
    fn test_reserve_grow_and_shrink() {
        let mut b = Mp4Box::with_type(*b"test");
        b.set_bytes(&[1, 2, 3, 4, 5, 6], 0);

        b.reserve(2, 1, 4).unwrap();
        assert_eq!(b.boxed_size(), 8 + 9);
        assert_eq!(&b.payload()[..2], &[1, 2]);
        assert_eq!(b.payload()[2], 3);
        assert_eq!(&b.payload()[6..], &[4, 5, 6]);

        b.reserve(2, 4, 0).unwrap();
        assert_eq!(b.payload(), &[1, 2, 4, 5, 6]);
        assert_eq!(b.boxed_size(), 8 + 5);
        assert!(b.capacity() >= 8 + 9);
    }

    #[test]
    fn test_reserve_rejects_region_outside_box() {
        let mut b = Mp4Box::with_type(*b"test");
        b.set_u32(1, 0);
        assert!(matches!(
            b.reserve(2, 4, 8),
            Err(Error::OutOfRange { .. })
        ));
        assert_eq!(b.boxed_size(), 12);
    }

    #[test]
    fn test_string_resize_keeps_trailing_bytes() {
        let mut b = Mp4Box::with_type(*b"test");
        b.set_string("abc", 0);
        b.set_u32(0xCAFEBABE, 4);
        assert_eq!(b.get_string(0), "abc");

        b.set_string("longer string", 0);
        assert_eq!(b.get_string(0), "longer string");
        assert_eq!(b.get_u32(14), 0xCAFEBABE);
        assert_eq!(b.boxed_size(), 8 + 14 + 4);

        b.set_string("", 0);
        assert_eq!(b.get_string(0), "");
        assert_eq!(b.get_u32(1), 0xCAFEBABE);
        assert_eq!(b.boxed_size(), 8 + 1 + 4);
    }

    #[test]
    fn test_get_string_past_end_creates_empty_string() {
        let mut b = Mp4Box::with_type(*b"test");
        assert_eq!(b.get_string(3), "");
        assert_eq!(b.boxed_size(), 8 + 4);
        assert_eq!(b.get_string_len(3), 0);
    }

    #[test]
    fn test_view_is_read_only() {
        let mut owner = Mp4Box::with_type(*b"test");
        owner.set_u32(42, 0);
        let bytes = owner.as_box().to_vec();

        let mut view = Mp4Box::view(&bytes);
        assert!(!view.is_owned());
        assert_eq!(view.get_u32(0), 42);
        view.set_u32(7, 0);
        assert_eq!(view.get_u32(0), 42);
        assert_eq!(view.get_u32(4), 0);
        assert_eq!(view.boxed_size(), 12);
        assert!(matches!(view.reserve(0, 0, 4), Err(Error::NotOwned)));
        view.set_string("nope", 0);
        assert_eq!(view.as_box(), bytes.as_slice());
        assert!(matches!(
            view.read(&mut BytesMut::from(&bytes[..])),
            Err(Error::NotOwned)
        ));
    }

    #[test]
    fn test_read_leaves_partial_box_in_stream() {
        let mut stream = BytesMut::from(&[0u8, 0, 0, 12, b'f', b'r', b'e', b'e', 1, 2][..]);
        let mut b = Mp4Box::new();
        assert!(matches!(
            b.read(&mut stream),
            Err(Error::Incomplete { need: 12, have: 10 })
        ));
        assert_eq!(stream.len(), 10);

        stream.extend_from_slice(&[3, 4, 9]);
        b.read(&mut stream).unwrap();
        assert_eq!(b.boxed_size(), 12);
        assert!(b.is_type(b"free"));
        assert_eq!(b.payload(), &[1, 2, 3, 4]);
        assert_eq!(&stream[..], &[9]);
    }

    #[test]
    fn test_read_rejects_undersized_box() {
        let mut stream = BytesMut::from(&[0u8, 0, 0, 4, b'b', b'a', b'd', b'!'][..]);
        let mut b = Mp4Box::new();
        assert!(matches!(b.read(&mut stream), Err(Error::InvalidSize(4))));
        assert_eq!(stream.len(), 8);
    }

    #[test]
    fn test_clear_resets_box() {
        let mut b = Mp4Box::with_type(*b"test");
        b.set_u64(1, 0);
        b.clear();
        assert_eq!(b.boxed_size(), 8);
        assert_eq!(b.box_type(), [0; 4]);
    }

    #[test]
    fn test_unknown_box_pretty_string() {
        let mut b = Mp4Box::with_type(*b"free");
        assert_eq!(
            b.to_pretty_string(2),
            "  Unimplemented pretty-printing for box free\n"
        );
    }
}
