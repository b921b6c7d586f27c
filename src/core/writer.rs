use super::error::PdfResult;
use super::registry::ObjectRegistry;
use super::sink::WriteSink;
use super::value::PdfObject;

/// Writes the two mandatory header lines for a new file: `%PDF-<version>`
/// and the binary-marker comment.
pub fn write_header(sink: &mut dyn WriteSink, version: &str) -> PdfResult<()> {
    sink.write_bytes(format!("%PDF-{version}\n").as_bytes())?;
    sink.write_bytes(&[b'%', 0xE2, 0xE3, 0xCF, 0xD3, b'\n'])?;
    Ok(())
}

/// Serializes one object's header (`N G obj`), its value, and `endobj`,
/// returning the byte offset the object started at (for its xref entry).
pub fn write_object(
    sink: &mut dyn WriteSink,
    number: u32,
    generation: u16,
    value: &PdfObject,
) -> PdfResult<u64> {
    let offset = sink.tell()?;
    sink.write_bytes(format!("{number} {generation} obj\n").as_bytes())?;
    let mut buf = Vec::new();
    serialize(value, &mut buf);
    sink.write_bytes(&buf)?;
    sink.write_bytes(b"\nendobj\n")?;
    Ok(offset)
}

/// Emits the classical xref table and trailer covering every object the
/// registry holds, then `startxref`/`%%EOF`. This is the unique
/// trailer-commit point, run once at `close()` in write mode.
pub fn write_xref_and_trailer(
    sink: &mut dyn WriteSink,
    registry: &ObjectRegistry,
    root: (u32, u16),
    info: Option<(u32, u16)>,
    id: Option<&PdfObject>,
) -> PdfResult<()> {
    let size = registry.iter().map(|r| r.number).max().map(|n| n + 1).unwrap_or(1);

    let xref_offset = sink.tell()?;
    sink.write_bytes(format!("xref\n0 {size}\n").as_bytes())?;
    sink.write_bytes(b"0000000000 65535 f \n")?;
    for number in 1..size {
        match registry.find(number) {
            Some(record) => {
                sink.write_bytes(
                    format!("{:010} {:05} n \n", record.offset, record.generation).as_bytes(),
                )?;
            }
            None => sink.write_bytes(b"0000000000 00000 f \n")?,
        }
    }

    let mut trailer = format!("trailer\n<< /Size {size} /Root {} {} R", root.0, root.1);
    if let Some((num, gen)) = info {
        trailer.push_str(&format!(" /Info {num} {gen} R"));
    }
    sink.write_bytes(trailer.as_bytes())?;
    if let Some(id_array) = id {
        sink.write_bytes(b" /ID ")?;
        let mut buf = Vec::new();
        serialize(id_array, &mut buf);
        sink.write_bytes(&buf)?;
    }
    sink.write_bytes(b" >>\n")?;
    sink.write_bytes(format!("startxref\n{xref_offset}\n%%EOF").as_bytes())?;
    Ok(())
}

fn serialize(value: &PdfObject, out: &mut Vec<u8>) {
    match value {
        PdfObject::Null => out.extend_from_slice(b"null"),
        PdfObject::Eof => out.extend_from_slice(b"null"),
        PdfObject::Boolean(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
        PdfObject::Number(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                out.extend_from_slice(format!("{}", *n as i64).as_bytes());
            } else {
                out.extend_from_slice(format!("{n}").as_bytes());
            }
        }
        PdfObject::String(s) => {
            out.push(b'(');
            for &b in s {
                if b == b'(' || b == b')' || b == b'\\' {
                    out.push(b'\\');
                }
                out.push(b);
            }
            out.push(b')');
        }
        PdfObject::HexString(s) => {
            out.push(b'<');
            for &b in s {
                out.extend_from_slice(format!("{b:02X}").as_bytes());
            }
            out.push(b'>');
        }
        PdfObject::Name(n) => {
            out.push(b'/');
            for b in n.bytes() {
                if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b'-' {
                    out.push(b);
                } else {
                    out.extend_from_slice(format!("#{b:02X}").as_bytes());
                }
            }
        }
        PdfObject::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                serialize(item, out);
            }
            out.push(b']');
        }
        PdfObject::Dict(fields) => {
            out.extend_from_slice(b"<< ");
            for (key, val) in fields {
                out.push(b'/');
                out.extend_from_slice(key.as_bytes());
                out.push(b' ');
                serialize(val, out);
                out.push(b' ');
            }
            out.extend_from_slice(b">>");
        }
        PdfObject::Ref { number, generation } => {
            out.extend_from_slice(format!("{number} {generation} R").as_bytes());
        }
        PdfObject::Stream { dict, data } => {
            serialize(dict, out);
            out.extend_from_slice(b"\nstream\n");
            out.extend_from_slice(data);
            out.extend_from_slice(b"\nendstream");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sink::MemSink;
    use std::collections::HashMap;

    #[test]
    fn test_write_header() {
        let mut sink = MemSink::new();
        write_header(&mut sink, "2.0").unwrap();
        assert_eq!(&sink.buf[0..9], b"%PDF-2.0\n");
        assert_eq!(&sink.buf[9..10], b"%");
        assert_eq!(&sink.buf[10..14], &[0xE2, 0xE3, 0xCF, 0xD3]);
    }

    #[test]
    fn test_serialize_name_with_escape() {
        let mut out = Vec::new();
        serialize(&PdfObject::Name("A B".to_string()), &mut out);
        assert_eq!(out, b"/A#20B");
    }

    #[test]
    fn test_write_object_records_offset() {
        let mut sink = MemSink::new();
        sink.write_bytes(b"preamble").unwrap();
        let mut dict = HashMap::new();
        dict.insert("Type".to_string(), PdfObject::Name("Catalog".to_string()));
        let offset = write_object(&mut sink, 1, 0, &PdfObject::Dict(dict)).unwrap();
        assert_eq!(offset, 8);
        assert!(String::from_utf8_lossy(&sink.buf).contains("1 0 obj"));
    }

    #[test]
    fn test_write_xref_and_trailer_roundtrip_shape() {
        let mut registry = ObjectRegistry::new();
        registry.add(1, 0, 42);
        let mut sink = MemSink::new();
        write_xref_and_trailer(&mut sink, &registry, (1, 0), None, None).unwrap();
        let text = String::from_utf8_lossy(&sink.buf);
        assert!(text.starts_with("xref\n0 2\n"));
        assert!(text.contains("trailer"));
        assert!(text.contains("startxref"));
        assert!(text.ends_with("%%EOF"));
    }
}
