use super::error::{PdfError, PdfResult};
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};

/// Write-side counterpart of `BaseStream`, used by `create`/`close`. Its
/// shape mirrors `BaseStream` for symmetry: position tracking, explicit
/// byte writes.
pub trait WriteSink {
    fn write_bytes(&mut self, bytes: &[u8]) -> PdfResult<()>;

    /// Current write position, used to record an object's file offset.
    fn tell(&mut self) -> PdfResult<u64>;
}

/// A `WriteSink` backed by a real file on disk, created/truncated per
/// create+truncate, mode 0666.
pub struct FileSink {
    file: File,
}

impl FileSink {
    pub fn create(path: &std::path::Path) -> PdfResult<Self> {
        let file = File::create(path).map_err(PdfError::from)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o666);
            let _ = file.set_permissions(perms);
        }
        Ok(FileSink { file })
    }
}

impl WriteSink for FileSink {
    fn write_bytes(&mut self, bytes: &[u8]) -> PdfResult<()> {
        self.file.write_all(bytes).map_err(PdfError::from)
    }

    fn tell(&mut self) -> PdfResult<u64> {
        self.file.stream_position().map_err(PdfError::from)
    }
}

/// An in-memory `WriteSink`, used by tests that don't want to touch disk.
pub struct MemSink {
    pub buf: Vec<u8>,
}

impl MemSink {
    pub fn new() -> Self {
        MemSink { buf: Vec::new() }
    }
}

impl Default for MemSink {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteSink for MemSink {
    fn write_bytes(&mut self, bytes: &[u8]) -> PdfResult<()> {
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn tell(&mut self) -> PdfResult<u64> {
        Ok(self.buf.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mem_sink_tracks_position() {
        let mut sink = MemSink::new();
        sink.write_bytes(b"%PDF-2.0\n").unwrap();
        assert_eq!(sink.tell().unwrap(), 9);
        sink.write_bytes(b"more").unwrap();
        assert_eq!(sink.tell().unwrap(), 13);
    }
}
