use super::base_stream::BaseStream;
use super::error::{PdfError, PdfResult};
use super::filters::{apply_png_predictor, decode_stream};
use super::lexer::Lexer;
use super::parser::Parser;
use super::registry::ObjectRegistry;
use super::value::PdfObject;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

/// Byte window scanned from end-of-file for `startxref`. Deliberately narrow: PDFs that bury `startxref` deeper than this
/// are malformed for this engine's purposes.
const TAIL_SCAN_WINDOW: usize = 32;

/// Loads a PDF's cross-reference chain, populating an `ObjectRegistry` with
/// one record per live indirect object.
pub struct XrefLoader<'a> {
    registry: &'a mut ObjectRegistry,
    /// Object numbers of compressed entries discovered while walking the
    /// chain, queued for the object-stream decoder to materialize.
    pub pending_compressed: Vec<(u32, u32, u32)>,
}

/// Outcome of a successful load: the resolved trailer dictionary and the
/// root/info/encrypt/id entries it names.
pub struct LoadedTrailer {
    pub trailer: PdfObject,
    pub root: PdfObject,
    pub info: Option<PdfObject>,
    pub id: Option<PdfObject>,
}

impl<'a> XrefLoader<'a> {
    pub fn new(registry: &'a mut ObjectRegistry) -> Self {
        XrefLoader {
            registry,
            pending_compressed: Vec::new(),
        }
    }

    /// Runs the full load algorithm against `stream`, returning the
    /// resolved trailer. `stream` must be positioned anywhere; its length
    /// is used to find the tail scan window.
    pub fn load(&mut self, stream: &mut dyn BaseStream) -> PdfResult<LoadedTrailer> {
        let start_offset = self.find_startxref(stream)?;

        let mut visited = FxHashSet::default();
        let mut next_offset = Some(start_offset);
        let mut merged_trailer: Option<PdfObject> = None;

        while let Some(offset) = next_offset {
            if !visited.insert(offset) {
                return Err(PdfError::xref_format("cyclic /Prev chain in cross-reference sections"));
            }

            let (trailer, prev) = self.load_section(stream, offset)?;

            if merged_trailer.is_none() {
                merged_trailer = Some(trailer.clone());
            }

            next_offset = prev;
        }

        let trailer = merged_trailer
            .ok_or_else(|| PdfError::xref_format("no cross-reference section was loaded"))?;

        let root = trailer
            .get("Root")
            .cloned()
            .ok_or_else(|| PdfError::catalog("Missing Root object"))?;
        let info = trailer.get("Info").cloned();
        let id = trailer.get("ID").cloned();

        Ok(LoadedTrailer { trailer, root, info, id })
    }

    /// Scans the last 32 bytes for `startxref`,
    /// followed by an integer offset.
    fn find_startxref(&self, stream: &dyn BaseStream) -> PdfResult<u64> {
        let tail = stream.tail_bytes(TAIL_SCAN_WINDOW)?;
        let marker = b"startxref";
        let marker_pos = tail
            .windows(marker.len())
            .rposition(|w| w == marker)
            .ok_or_else(|| PdfError::xref_locate("'startxref' not found in tail scan window"))?;

        let rest = &tail[marker_pos + marker.len()..];
        let digits_start = rest.iter().position(|b| b.is_ascii_digit());
        let digits_start = match digits_start {
            Some(i) => i,
            None => return Err(PdfError::xref_locate("no offset following 'startxref'")),
        };
        let digits_end = rest[digits_start..]
            .iter()
            .position(|b| !b.is_ascii_digit())
            .map(|i| digits_start + i)
            .unwrap_or(rest.len());

        let text = std::str::from_utf8(&rest[digits_start..digits_end])
            .map_err(|_| PdfError::xref_locate("startxref offset is not valid UTF-8"))?;
        text.parse::<u64>()
            .map_err(|_| PdfError::xref_locate("startxref offset is not a valid integer"))
    }

    /// Loads one cross-reference section (classical table or stream) at
    /// `offset`, returning its trailer and the `/Prev` offset to chain to,
    /// if any.
    fn load_section(
        &mut self,
        stream: &mut dyn BaseStream,
        offset: u64,
    ) -> PdfResult<(PdfObject, Option<u64>)> {
        stream.set_pos(offset as usize)?;

        // Peek far enough to tell a classical "xref" keyword apart from an
        // xref-stream object header ("N G obj").
        let peek = stream.peek_bytes(4)?;
        if peek.starts_with(b"xref") {
            self.load_classical_table(stream)
        } else {
            self.load_xref_stream(stream, offset)
        }
    }

    /// Classical xref table: a `xref` keyword
    /// followed by one or more subsections, then a `trailer` dictionary.
    fn load_classical_table(
        &mut self,
        stream: &mut dyn BaseStream,
    ) -> PdfResult<(PdfObject, Option<u64>)> {
        let keyword = stream.get_bytes(4)?;
        if &keyword != b"xref" {
            return Err(PdfError::xref_format("expected 'xref' keyword"));
        }
        skip_eol(stream)?;

        loop {
            skip_whitespace(stream)?;
            let peek = stream.peek_bytes(7.min(stream.length() - stream.pos()))?;
            if peek.starts_with(b"trailer") {
                stream.get_bytes(7)?;
                break;
            }

            let (start, count) = read_subsection_header(stream)?;
            for i in 0..count {
                let entry_bytes = stream.get_bytes(20)?;
                let (raw_offset, raw_gen, kind) = parse_classical_entry(&entry_bytes)?;
                let number = start + i as u32;
                if kind == b'n' {
                    let generation = super::parser::validate_generation(raw_gen as f64)?;
                    self.registry.add(number, generation, raw_offset);
                }
            }
        }

        skip_whitespace(stream)?;
        let lexer = Lexer::new(stream.make_sub_stream(stream.pos(), stream.length() - stream.pos())?)?;
        let mut parser = Parser::new(lexer)?;
        let trailer = parser.get_object()?;
        if trailer.as_dict().is_none() {
            return Err(PdfError::xref_format("trailer is not a dictionary"));
        }

        let prev = trailer.get("Prev").and_then(|p| p.as_f64()).map(|n| n as u64);
        Ok((trailer, prev))
    }

    /// Xref-stream object: `N G obj << ... >>
    /// stream ... endstream`.
    fn load_xref_stream(
        &mut self,
        stream: &mut dyn BaseStream,
        offset: u64,
    ) -> PdfResult<(PdfObject, Option<u64>)> {
        let remaining = stream.length() - offset as usize;
        let sub = stream.make_sub_stream(offset as usize, remaining)?;
        let lexer = Lexer::new(sub)?;
        let mut parser = Parser::new(lexer)?;
        let (number, generation, value, stream_rel_offset) = parser.parse_indirect_object()?;
        if generation != 0 {
            return Err(PdfError::xref_format("xref stream object must have generation 0"));
        }

        let dict = value
            .as_dict()
            .ok_or_else(|| PdfError::xref_format("xref stream object has no dictionary"))?;
        if dict.get("Type").and_then(|t| t.as_name()) != Some("XRef") {
            return Err(PdfError::xref_format("xref stream missing /Type /XRef"));
        }

        // The xref-stream object is itself a live indirect object; register
        // it before decoding its body so first-write-wins covers it too.
        self.registry.add(number, generation, offset);

        let stream_rel_offset = stream_rel_offset
            .ok_or_else(|| PdfError::xref_format("xref stream object has no stream body"))?;
        let length = dict
            .get("Length")
            .and_then(|l| l.as_i64())
            .ok_or_else(|| PdfError::xref_format("xref stream missing /Length"))? as usize;

        let raw = stream.get_byte_range(offset as usize + stream_rel_offset, offset as usize + stream_rel_offset + length)?;
        let filter = dict.get("Filter").and_then(|f| f.as_name());
        let mut decoded = decode_stream(&raw, filter)?;

        if let Some(parms) = dict.get("DecodeParms").and_then(|p| p.as_dict()) {
            let predictor = parms.get("Predictor").and_then(|p| p.as_i64()).unwrap_or(1);
            if (10..=15).contains(&predictor) {
                let colors = parms.get("Colors").and_then(|c| c.as_i64()).unwrap_or(1) as usize;
                let bpc = parms
                    .get("BitsPerComponent")
                    .and_then(|b| b.as_i64())
                    .unwrap_or(8) as usize;
                let columns = parms.get("Columns").and_then(|c| c.as_i64()).unwrap_or(1) as usize;
                decoded = apply_png_predictor(&decoded, colors, bpc, columns)?;
            }
        }

        let w = dict
            .get("W")
            .and_then(|w| w.as_array())
            .ok_or_else(|| PdfError::xref_format("xref stream missing /W"))?;
        if w.len() != 3 {
            return Err(PdfError::xref_format("/W must have exactly 3 entries"));
        }
        let widths: SmallVec<[usize; 3]> = w
            .iter()
            .map(|n| n.as_i64().ok_or_else(|| PdfError::xref_format("/W entries must be integers")).map(|n| n as usize))
            .collect::<PdfResult<_>>()?;
        let (w0, w1, w2) = (widths[0], widths[1], widths[2]);
        if w1 < 1 || w2 > 2 || w0 + w1 + w2 > 32 {
            return Err(PdfError::xref_format(
                "/W out of bounds: field 2 must be >=1, field 3 must be <=2, total <=32 bits",
            ));
        }

        let size = dict
            .get("Size")
            .and_then(|s| s.as_i64())
            .ok_or_else(|| PdfError::xref_format("xref stream missing /Size"))? as u32;

        let (index_start, index_count) = match dict.get("Index").and_then(|i| i.as_array()) {
            Some(pairs) => {
                if pairs.len() != 2 {
                    return Err(PdfError::xref_format(
                        "/Index with more than one range pair is not supported",
                    ));
                }
                let start = pairs[0].as_i64().ok_or_else(|| PdfError::xref_format("/Index entries must be integers"))? as u32;
                let count = pairs[1].as_i64().ok_or_else(|| PdfError::xref_format("/Index entries must be integers"))? as u32;
                (start, count)
            }
            None => (0, size),
        };

        let record_width = w0 + w1 + w2;
        if decoded.len() < index_count as usize * record_width {
            return Err(PdfError::xref_format("xref stream data shorter than /Index range implies"));
        }

        for i in 0..index_count {
            let rec = &decoded[i as usize * record_width..(i as usize + 1) * record_width];
            let field0 = if w0 == 0 { 1 } else { read_be(&rec[0..w0]) };
            let field1 = read_be(&rec[w0..w0 + w1]);
            let field2 = read_be(&rec[w0 + w1..w0 + w1 + w2]);
            let number = index_start + i;

            match field0 {
                0 => {} // free entry, nothing to register
                1 => {
                    let generation = super::parser::validate_generation(field2 as f64)?;
                    self.registry.add(number, generation, field1);
                }
                2 => {
                    self.pending_compressed.push((number, field1 as u32, field2 as u32));
                }
                other => return Err(PdfError::xref_format(format!("unknown xref entry type {other}"))),
            }
        }

        let prev = dict.get("Prev").and_then(|p| p.as_f64()).map(|n| n as u64);
        Ok((value, prev))
    }
}

fn read_be(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

fn skip_eol(stream: &mut dyn BaseStream) -> PdfResult<()> {
    let b = stream.peek_byte()?;
    if b == b'\r' {
        stream.get_byte()?;
        if stream.pos() < stream.length() && stream.peek_byte()? == b'\n' {
            stream.get_byte()?;
        }
    } else if b == b'\n' {
        stream.get_byte()?;
    }
    Ok(())
}

fn skip_whitespace(stream: &mut dyn BaseStream) -> PdfResult<()> {
    while stream.pos() < stream.length() {
        let b = stream.peek_byte()?;
        if b == b' ' || b == b'\t' || b == b'\r' || b == b'\n' {
            stream.get_byte()?;
        } else {
            break;
        }
    }
    Ok(())
}

/// Reads `"<start> <count>"` on its own line, the header of one classical
/// xref subsection.
fn read_subsection_header(stream: &mut dyn BaseStream) -> PdfResult<(u32, u32)> {
    let mut digits = Vec::new();
    let mut numbers = Vec::new();

    loop {
        if stream.pos() >= stream.length() {
            return Err(PdfError::xref_format("unexpected end of xref subsection header"));
        }
        let b = stream.get_byte()?;
        if b.is_ascii_digit() {
            digits.push(b);
        } else if b == b' ' || b == b'\r' || b == b'\n' {
            if !digits.is_empty() {
                let text = std::str::from_utf8(&digits)
                    .map_err(|_| PdfError::xref_format("non-UTF8 subsection header"))?;
                numbers.push(
                    text.parse::<u32>()
                        .map_err(|_| PdfError::xref_format("invalid subsection header integer"))?,
                );
                digits.clear();
            }
            if numbers.len() == 2 && (b == b'\n' || b == b'\r') {
                if b == b'\r' && stream.pos() < stream.length() && stream.peek_byte()? == b'\n' {
                    stream.get_byte()?;
                }
                break;
            }
        } else {
            return Err(PdfError::xref_format("malformed xref subsection header"));
        }
    }

    if numbers.len() != 2 {
        return Err(PdfError::xref_format("xref subsection header must have two integers"));
    }
    Ok((numbers[0], numbers[1]))
}

/// Parses one fixed 20-byte classical xref entry: a 10-digit offset, a
/// 5-digit generation, a type byte (`n` or `f`), and a 2-byte terminator
/// that must be one of "\r\n", " \n", or " \r".
fn parse_classical_entry(entry: &[u8]) -> PdfResult<(u64, u32, u8)> {
    if entry.len() != 20 {
        return Err(PdfError::xref_format("xref entry is not 20 bytes"));
    }
    let offset_text = std::str::from_utf8(&entry[0..10])
        .map_err(|_| PdfError::xref_format("xref entry offset is not ASCII"))?;
    let gen_text = std::str::from_utf8(&entry[11..16])
        .map_err(|_| PdfError::xref_format("xref entry generation is not ASCII"))?;
    let kind = entry[17];
    if kind != b'n' && kind != b'f' {
        return Err(PdfError::xref_format("xref entry type must be 'n' or 'f'"));
    }
    let terminator = &entry[18..20];
    let terminator_ok = terminator == b"\r\n" || terminator == b" \n" || terminator == b" \r";
    if !terminator_ok {
        return Err(PdfError::xref_format("xref entry terminator must be CRLF, SPLF, or SPCR"));
    }

    let offset = offset_text
        .parse::<u64>()
        .map_err(|_| PdfError::xref_format("xref entry offset is not a valid integer"))?;
    let generation = gen_text
        .parse::<u32>()
        .map_err(|_| PdfError::xref_format("xref entry generation is not a valid integer"))?;
    Ok((offset, generation, kind))
}
