use byteorder::{ByteOrder, LittleEndian};

/// Fixed-capacity little-endian byte buffer with a monotonic write cursor.
///
/// The capacity is decided once, up front, from the sizing pass. Writing past
/// it is a programmer error: it means a sizer and an emitter disagreed about
/// some node, so every operation asserts. The buffer starts out zeroed, which
/// is what gives fixed-width character fields their zero padding.
pub struct ByteSink {
    buf: Box<[u8]>,
    cursor: usize,
}

impl ByteSink {
    pub fn new(capacity: usize) -> ByteSink {
        ByteSink {
            buf: vec![0; capacity].into_boxed_slice(),
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Position of the next byte to be written.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether every byte of the buffer has been written.
    pub fn is_full(&self) -> bool {
        self.cursor == self.buf.len()
    }

    /// The bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.cursor]
    }

    /// Consume the sink, returning the whole buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf.into_vec()
    }

    fn check_capacity(&self, count: usize) {
        assert!(
            self.cursor + count <= self.buf.len(),
            "byte sink overflow: {} + {} > {}",
            self.cursor,
            count,
            self.buf.len()
        );
    }

    pub fn emit_u8(&mut self, value: u8) {
        self.check_capacity(1);
        self.buf[self.cursor] = value;
        self.cursor += 1;
    }

    pub fn emit_u16(&mut self, value: u16) {
        self.check_capacity(2);
        LittleEndian::write_u16(&mut self.buf[self.cursor..], value);
        self.cursor += 2;
    }

    pub fn emit_u32(&mut self, value: u32) {
        self.check_capacity(4);
        LittleEndian::write_u32(&mut self.buf[self.cursor..], value);
        self.cursor += 4;
    }

    pub fn emit_i8(&mut self, value: i8) {
        self.emit_u8(value as u8)
    }

    pub fn emit_i16(&mut self, value: i16) {
        self.check_capacity(2);
        LittleEndian::write_i16(&mut self.buf[self.cursor..], value);
        self.cursor += 2;
    }

    pub fn emit_i32(&mut self, value: i32) {
        self.check_capacity(4);
        LittleEndian::write_i32(&mut self.buf[self.cursor..], value);
        self.cursor += 4;
    }

    /// Write a fixed-width character field of `count` bytes.
    ///
    /// Copies at most `count` bytes from `s`; when `s` is shorter, the
    /// remaining bytes keep their zero fill.
    pub fn emit_chars(&mut self, count: usize, s: &str) {
        self.check_capacity(count);
        let bytes = s.as_bytes();
        let copied = count.min(bytes.len());
        self.buf[self.cursor..self.cursor + copied].copy_from_slice(&bytes[..copied]);
        self.cursor += count;
    }

    pub fn emit_bytes(&mut self, src: &[u8]) {
        self.check_capacity(src.len());
        self.buf[self.cursor..self.cursor + src.len()].copy_from_slice(src);
        self.cursor += src.len();
    }

    pub fn emit_fill(&mut self, count: usize, value: u8) {
        self.check_capacity(count);
        self.buf[self.cursor..self.cursor + count].fill(value);
        self.cursor += count;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn primitives_are_little_endian() {
        let mut sink = ByteSink::new(13);
        sink.emit_u8(0xAB);
        sink.emit_u16(0x1234);
        sink.emit_u32(0xDEADBEEF);
        sink.emit_i16(-2);
        sink.emit_i32(-1);
        assert!(sink.is_full());
        assert_eq!(
            sink.into_bytes(),
            vec![0xAB, 0x34, 0x12, 0xEF, 0xBE, 0xAD, 0xDE, 0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn short_char_fields_stay_zero_padded() {
        let mut sink = ByteSink::new(8);
        sink.emit_chars(8, "HELLO");
        assert_eq!(sink.into_bytes(), b"HELLO\0\0\0");
    }

    #[test]
    fn long_char_fields_are_truncated() {
        let mut sink = ByteSink::new(4);
        sink.emit_chars(4, "OVERLONG");
        assert_eq!(sink.into_bytes(), b"OVER");
    }

    #[test]
    fn fill_and_bytes_advance_the_cursor() {
        let mut sink = ByteSink::new(6);
        sink.emit_fill(3, 0xCC);
        sink.emit_bytes(&[1, 2]);
        assert_eq!(sink.cursor(), 5);
        assert!(!sink.is_full());
        assert_eq!(sink.as_bytes(), &[0xCC, 0xCC, 0xCC, 1, 2]);
    }

    #[test]
    #[should_panic(expected = "byte sink overflow")]
    fn writing_past_capacity_panics() {
        let mut sink = ByteSink::new(1);
        sink.emit_u16(7);
    }
}
