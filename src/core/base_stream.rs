use super::error::PdfResult;

/// Common interface for reading the backing byte source of a document.
///
/// Implementations must provide the core positional reads; this trait
/// provides default implementations for the derived operations (peeking,
/// fixed-width integers, sub-range copies).
pub trait BaseStream {
    /// Total length of the stream in bytes.
    fn length(&self) -> usize;

    /// Current position in the stream.
    fn pos(&self) -> usize;

    /// Sets the current position in the stream.
    fn set_pos(&mut self, pos: usize) -> PdfResult<()>;

    /// Reads and returns a single byte, advancing the position.
    fn get_byte(&mut self) -> PdfResult<u8>;

    /// Reads `length` bytes, advancing the position.
    fn get_bytes(&mut self, length: usize) -> PdfResult<Vec<u8>>;

    /// Returns a byte range without changing the current position.
    fn get_byte_range(&self, begin: usize, end: usize) -> PdfResult<Vec<u8>>;

    /// Creates a sub-stream sharing this stream's backing storage.
    fn make_sub_stream(&self, start: usize, length: usize) -> PdfResult<Box<dyn BaseStream>>;

    /// Reads a single byte without advancing the position.
    fn peek_byte(&mut self) -> PdfResult<u8> {
        let pos = self.pos();
        let byte = self.get_byte()?;
        self.set_pos(pos)?;
        Ok(byte)
    }

    /// Reads `length` bytes without advancing the position.
    fn peek_bytes(&mut self, length: usize) -> PdfResult<Vec<u8>> {
        let pos = self.pos();
        let bytes = self.get_bytes(length)?;
        self.set_pos(pos)?;
        Ok(bytes)
    }

    /// Reads the trailing `n` bytes of the stream without moving its cursor.
    fn tail_bytes(&self, n: usize) -> PdfResult<Vec<u8>> {
        let len = self.length();
        let begin = len.saturating_sub(n);
        self.get_byte_range(begin, len)
    }

    /// Reads one line (up to and including `\n`, `\r`, or `\r\n`), returning
    /// the content without the terminator. Returns `None` at end of stream.
    fn read_line(&mut self) -> PdfResult<Option<Vec<u8>>> {
        if self.pos() >= self.length() {
            return Ok(None);
        }
        let mut line = Vec::new();
        loop {
            if self.pos() >= self.length() {
                break;
            }
            let byte = self.get_byte()?;
            if byte == b'\n' {
                break;
            }
            if byte == b'\r' {
                if self.pos() < self.length() {
                    if let Ok(next) = self.peek_byte() {
                        if next == b'\n' {
                            self.get_byte()?;
                        }
                    }
                }
                break;
            }
            line.push(byte);
        }
        Ok(Some(line))
    }
}
