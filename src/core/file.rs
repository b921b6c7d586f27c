use super::base_stream::BaseStream;
use super::error::{PdfError, PdfResult};
use super::lexer::Lexer;
use super::objstm::{self, DEFAULT_MAX_OBJECTS_PER_STREAM};
use super::pagetree::{self, PageRecord};
use super::parser::Parser;
use super::registry::ObjectRegistry;
use super::sink::{FileSink, WriteSink};
use super::stream::MemStream;
use super::value::PdfObject;
use super::writer;
use super::xref::XrefLoader;
use rustc_hash::FxHashSet;
use std::path::Path;

/// Whether a file handle is bound for reading or writing, matching
/// the read/write lifecycle below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
}

/// The per-object-stream cap, floor 1000. Passed to `PdfFile::open`.
#[derive(Debug, Clone, Copy)]
pub struct LoaderConfig {
    pub max_objects_per_stream: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            max_objects_per_stream: DEFAULT_MAX_OBJECTS_PER_STREAM,
        }
    }
}

/// One opened or newly created PDF document. Owns its registry and
/// flattened page list; their lifetimes end when this value is dropped or
/// `close`d.
pub struct PdfFile {
    name: Option<String>,
    version: String,
    mode: Mode,
    registry: ObjectRegistry,
    pages: Vec<PageRecord>,
    root_ref: Option<(u32, u16)>,
    info: Option<PdfObject>,
    id: Option<PdfObject>,
    next_object_number: u32,
    sink: Option<Box<dyn WriteSink>>,
}

impl PdfFile {
    /// Opens an existing PDF for reading. `on_error` is invoked exactly
    /// once if the open fails.
    pub fn open(path: &Path, config: LoaderConfig, mut on_error: impl FnMut(&str)) -> PdfResult<Self> {
        Self::open_inner(path, config).inspect_err(|e| on_error(&e.to_string()))
    }

    fn open_inner(path: &Path, config: LoaderConfig) -> PdfResult<Self> {
        let data = std::fs::read(path)?;
        let mut stream = MemStream::from_bytes(data);

        let version = parse_header(&mut stream)?;

        let mut registry = ObjectRegistry::new();
        let (loaded, pending_compressed) = {
            let mut loader = XrefLoader::new(&mut registry);
            let loaded = loader.load(&mut stream)?;
            (loaded, loader.pending_compressed.clone())
        };

        let mut decoded_streams = FxHashSet::default();
        for &(_obj_num, stream_num, _index) in &pending_compressed {
            if !decoded_streams.insert(stream_num) {
                continue;
            }
            let offset = registry
                .find(stream_num)
                .ok_or_else(|| PdfError::object_stream(format!("object stream {stream_num} not found")))?
                .offset;
            let value = materialize_object(&mut stream, &registry, offset)?;
            let data = value
                .as_stream_data()
                .ok_or_else(|| PdfError::object_stream(format!("object {stream_num} is not a stream")))?
                .to_vec();
            objstm::decode_object_stream(&value, &data, config.max_objects_per_stream, &mut registry)?;
        }

        // Materialize every uncompressed object's value up front. Entries
        // with a zero offset originated from an object stream and already
        // carry their value (see `decode_object_stream`); every file
        // begins with a header line, so no uncompressed object legitimately
        // starts at byte 0.
        let offsets: Vec<(u32, u64)> = registry
            .iter()
            .filter(|r| r.offset > 0)
            .map(|r| (r.number, r.offset))
            .collect();
        for (number, offset) in offsets {
            let value = materialize_object(&mut stream, &registry, offset)?;
            registry.set_value(number, value);
        }

        let root_ref = loaded
            .root
            .as_ref()
            .ok_or_else(|| PdfError::catalog("trailer /Root is not an indirect reference"))?;
        let catalog_value = registry
            .find(root_ref.0)
            .ok_or_else(|| PdfError::catalog(format!("root object {} not found", root_ref.0)))?
            .value
            .clone();
        let pages = pagetree::flatten_page_tree(&registry, &catalog_value)?;

        let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        let next_object_number = registry.iter().map(|r| r.number).max().map(|n| n + 1).unwrap_or(1);

        Ok(PdfFile {
            name,
            version,
            mode: Mode::Read,
            registry,
            pages,
            root_ref: Some(root_ref),
            info: loaded.info,
            id: loaded.id,
            next_object_number,
            sink: None,
        })
    }

    /// Creates a new PDF for writing. Default version is `"2.0"` when
    /// `version` is `None`.
    pub fn create(path: &Path, version: Option<&str>, mut on_error: impl FnMut(&str)) -> PdfResult<Self> {
        Self::create_inner(path, version).inspect_err(|e| on_error(&e.to_string()))
    }

    fn create_inner(path: &Path, version: Option<&str>) -> PdfResult<Self> {
        let version = version.unwrap_or("2.0").to_string();
        let mut sink: Box<dyn WriteSink> = Box::new(FileSink::create(path)?);
        writer::write_header(sink.as_mut(), &version)?;

        let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        Ok(PdfFile {
            name,
            version,
            mode: Mode::Write,
            registry: ObjectRegistry::new(),
            pages: Vec::new(),
            root_ref: None,
            info: None,
            id: None,
            next_object_number: 1,
            sink: Some(sink),
        })
    }

    /// Designates the catalog object written via `create_object` as this
    /// file's `/Root`. Write-mode only; required before `close` commits the
    /// trailer (the generalized xref/trailer writer needs a root to point
    /// at).
    pub fn set_root(&mut self, number: u32, generation: u16) {
        self.root_ref = Some((number, generation));
    }

    /// Closes the file. For write mode, this is the unique point at which
    /// the xref table and trailer are committed. The
    /// returned boolean is the conjunction of trailer emission and
    /// byte-stream close success.
    pub fn close(mut self) -> bool {
        if self.mode != Mode::Write {
            return true;
        }
        let Some(mut sink) = self.sink.take() else {
            return false;
        };
        let Some(root) = self.root_ref else {
            return false;
        };
        writer::write_xref_and_trailer(sink.as_mut(), &self.registry, root, None, self.id.as_ref()).is_ok()
    }

    pub fn find_object(&self, number: u32) -> Option<&PdfObject> {
        self.registry.find(number).map(|r| &r.value)
    }

    pub fn get_object(&self, index: usize) -> Option<&PdfObject> {
        self.registry.get(index).map(|r| &r.value)
    }

    pub fn num_objects(&self) -> usize {
        self.registry.count()
    }

    pub fn get_page(&self, index: usize) -> Option<&PdfObject> {
        self.pages.get(index).map(|p| &p.dict)
    }

    pub fn num_pages(&self) -> usize {
        self.pages.len()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn id(&self) -> Option<&PdfObject> {
        self.id.as_ref()
    }

    /// Appends a new object in write mode, writing it immediately and
    /// recording its file offset. Returns its assigned object number, or
    /// `None` in read mode.
    pub fn create_object(&mut self, dict: PdfObject) -> Option<u32> {
        if self.mode != Mode::Write {
            return None;
        }
        let number = self.next_object_number;
        let offset = writer::write_object(self.sink.as_mut()?.as_mut(), number, 0, &dict).ok()?;
        self.next_object_number += 1;
        self.registry.add_with_value(number, 0, offset, dict);
        Some(number)
    }
}

/// Header validation: first line must be `%PDF-1.d` or
/// `%PDF-2.d`, digit required.
fn parse_header(stream: &mut dyn BaseStream) -> PdfResult<String> {
    stream.set_pos(0)?;
    let line = stream
        .read_line()?
        .ok_or_else(|| PdfError::header("file is empty"))?;
    let text = String::from_utf8_lossy(&line);
    let version = text
        .strip_prefix("%PDF-")
        .ok_or_else(|| PdfError::header(format!("missing '%PDF-' header, found: {text}")))?;

    let mut chars = version.chars();
    let major = chars
        .next()
        .ok_or_else(|| PdfError::header("header version is empty"))?;
    if major != '1' && major != '2' {
        return Err(PdfError::header(format!("unsupported major version in header: {text}")));
    }
    if chars.next() != Some('.') {
        return Err(PdfError::header(format!("malformed header version: {text}")));
    }
    let minor = chars
        .next()
        .ok_or_else(|| PdfError::header(format!("header version missing minor digit: {text}")))?;
    if !minor.is_ascii_digit() {
        return Err(PdfError::header(format!("malformed header version: {text}")));
    }
    Ok(format!("{major}.{minor}"))
}

/// Parses the indirect object at `offset`, resolving its stream body (if
/// any) by following its `/Length` exactly one hop through `registry` when
/// `/Length` is itself an indirect reference. This replaces the unsafe
/// re-entrant self-pointer `fetch()` trick with a plain recursive call: a
/// `/Length` object is always a bare integer, so the recursion bottoms out
/// immediately without needing a shared mutable self-reference.
fn materialize_object(
    stream: &mut dyn BaseStream,
    registry: &ObjectRegistry,
    offset: u64,
) -> PdfResult<PdfObject> {
    let remaining = stream.length() - offset as usize;
    let sub = stream.make_sub_stream(offset as usize, remaining)?;
    let lexer = Lexer::new(sub)?;
    let mut parser = Parser::new(lexer)?;
    let (_number, _generation, mut value, stream_rel_offset) = parser.parse_indirect_object()?;

    if let Some(rel) = stream_rel_offset {
        let dict = value
            .as_dict()
            .ok_or_else(|| PdfError::parse("stream object has no dictionary"))?;
        let length_obj = dict
            .get("Length")
            .ok_or_else(|| PdfError::parse("stream object missing /Length"))?;
        let length = match length_obj {
            PdfObject::Number(n) => *n as usize,
            PdfObject::Ref { number, .. } => {
                let length_offset = registry
                    .find(*number)
                    .ok_or_else(|| PdfError::parse(format!("indirect /Length object {number} not found")))?
                    .offset;
                let resolved = materialize_object(stream, registry, length_offset)?;
                resolved
                    .as_i64()
                    .ok_or_else(|| PdfError::parse("indirect /Length did not resolve to a number"))?
                    as usize
            }
            other => return Err(PdfError::parse(format!("/Length must be a number or reference, found {other:?}"))),
        };
        let data_start = offset as usize + rel;
        let raw = stream.get_byte_range(data_start, data_start + length)?;
        value = PdfObject::Stream { dict: Box::new(value), data: raw };
    }

    Ok(value)
}
