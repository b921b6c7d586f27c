use super::base_stream::BaseStream;
use super::error::{PdfError, PdfResult};
use std::sync::Arc;

/// An in-memory byte stream backed by a shared, reference-counted buffer.
///
/// Sub-streaming is cheap: `make_sub_stream` clones the `Arc` and narrows the
/// `start`/`length` view rather than copying bytes.
pub struct MemStream {
    data: Arc<Vec<u8>>,
    start: usize,
    length: usize,
    pos: usize,
}

impl MemStream {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let length = bytes.len();
        MemStream {
            data: Arc::new(bytes),
            start: 0,
            length,
            pos: 0,
        }
    }

    fn from_shared(data: Arc<Vec<u8>>, start: usize, length: usize) -> Self {
        MemStream {
            data,
            start,
            length,
            pos: 0,
        }
    }
}

impl BaseStream for MemStream {
    fn length(&self) -> usize {
        self.length
    }

    fn pos(&self) -> usize {
        self.pos
    }

    fn set_pos(&mut self, pos: usize) -> PdfResult<()> {
        self.pos = pos;
        Ok(())
    }

    fn get_byte(&mut self) -> PdfResult<u8> {
        if self.pos >= self.length {
            return Err(PdfError::io("unexpected end of stream"));
        }
        let byte = self.data[self.start + self.pos];
        self.pos += 1;
        Ok(byte)
    }

    fn get_bytes(&mut self, length: usize) -> PdfResult<Vec<u8>> {
        let end = self.pos + length;
        if end > self.length {
            return Err(PdfError::io("unexpected end of stream"));
        }
        let slice = &self.data[self.start + self.pos..self.start + end];
        self.pos = end;
        Ok(slice.to_vec())
    }

    fn get_byte_range(&self, begin: usize, end: usize) -> PdfResult<Vec<u8>> {
        if end > self.length || begin > end {
            return Err(PdfError::io(format!("invalid byte range {begin}..{end}")));
        }
        Ok(self.data[self.start + begin..self.start + end].to_vec())
    }

    fn make_sub_stream(&self, start: usize, length: usize) -> PdfResult<Box<dyn BaseStream>> {
        if start + length > self.length {
            return Err(PdfError::io("sub-stream out of range"));
        }
        Ok(Box::new(MemStream::from_shared(
            Arc::clone(&self.data),
            self.start + start,
            length,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_byte_and_eof() {
        let mut s = MemStream::from_bytes(vec![1, 2, 3]);
        assert_eq!(s.get_byte().unwrap(), 1);
        assert_eq!(s.get_byte().unwrap(), 2);
        assert_eq!(s.get_byte().unwrap(), 3);
        assert!(s.get_byte().is_err());
    }

    #[test]
    fn test_sub_stream_shares_backing() {
        let s = MemStream::from_bytes(b"hello world".to_vec());
        let mut sub = s.make_sub_stream(6, 5).unwrap();
        assert_eq!(sub.get_bytes(5).unwrap(), b"world");
    }

    #[test]
    fn test_tail_bytes() {
        let s = MemStream::from_bytes(b"0123456789".to_vec());
        assert_eq!(s.tail_bytes(4).unwrap(), b"6789");
        assert_eq!(s.tail_bytes(100).unwrap(), b"0123456789");
    }

    #[test]
    fn test_read_line_terminators() {
        let mut s = MemStream::from_bytes(b"abc\r\ndef\nghi\rjkl".to_vec());
        assert_eq!(s.read_line().unwrap(), Some(b"abc".to_vec()));
        assert_eq!(s.read_line().unwrap(), Some(b"def".to_vec()));
        assert_eq!(s.read_line().unwrap(), Some(b"ghi".to_vec()));
        assert_eq!(s.read_line().unwrap(), Some(b"jkl".to_vec()));
        assert_eq!(s.read_line().unwrap(), None);
    }
}
