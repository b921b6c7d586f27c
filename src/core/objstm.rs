use super::base_stream::BaseStream;
use super::error::{PdfError, PdfResult};
use super::filters::{apply_png_predictor, decode_stream};
use super::lexer::Lexer;
use super::parser::Parser;
use super::registry::ObjectRegistry;
use super::stream::MemStream;
use super::value::PdfObject;

/// Upper bound on how many objects a single object stream may carry before
/// the decoder treats it as malformed (at least 1000, configurable).
pub const DEFAULT_MAX_OBJECTS_PER_STREAM: usize = 1000;

/// Decodes one `/Type /ObjStm` object and materializes every object it
/// carries into `registry`, skipping any object number the registry
/// already holds (first-write-wins, matching the xref loader's rule).
pub fn decode_object_stream(
    stream_dict: &PdfObject,
    raw_data: &[u8],
    max_objects_per_stream: usize,
    registry: &mut ObjectRegistry,
) -> PdfResult<()> {
    let dict = stream_dict
        .as_dict()
        .ok_or_else(|| PdfError::object_stream("object stream value has no dictionary"))?;
    if dict.get("Type").and_then(|t| t.as_name()) != Some("ObjStm") {
        return Err(PdfError::object_stream("expected /Type /ObjStm"));
    }

    let n = dict
        .get("N")
        .and_then(|n| n.as_i64())
        .ok_or_else(|| PdfError::object_stream("object stream missing /N"))? as usize;
    let first = dict
        .get("First")
        .and_then(|f| f.as_i64())
        .ok_or_else(|| PdfError::object_stream("object stream missing /First"))? as usize;

    if n > max_objects_per_stream {
        return Err(PdfError::object_stream(format!(
            "object stream carries {n} objects, exceeding the configured cap of {max_objects_per_stream}"
        )));
    }

    let filter = dict.get("Filter").and_then(|f| f.as_name());
    let mut decoded = decode_stream(raw_data, filter)?;

    if let Some(parms) = dict.get("DecodeParms").and_then(|p| p.as_dict()) {
        let predictor = parms.get("Predictor").and_then(|p| p.as_i64()).unwrap_or(1);
        if (10..=15).contains(&predictor) {
            let colors = parms.get("Colors").and_then(|c| c.as_i64()).unwrap_or(1) as usize;
            let bpc = parms.get("BitsPerComponent").and_then(|b| b.as_i64()).unwrap_or(8) as usize;
            let columns = parms.get("Columns").and_then(|c| c.as_i64()).unwrap_or(1) as usize;
            decoded = apply_png_predictor(&decoded, colors, bpc, columns)?;
        }
    }

    if first > decoded.len() {
        return Err(PdfError::object_stream("/First is past the end of the decoded stream"));
    }

    let preamble = parse_preamble(&decoded[..first], n)?;

    for (i, &(obj_num, rel_offset)) in preamble.iter().enumerate() {
        let body_start = first + rel_offset;
        let body_end = if i + 1 < preamble.len() {
            first + preamble[i + 1].1
        } else {
            decoded.len()
        };
        if body_start > body_end || body_end > decoded.len() {
            return Err(PdfError::object_stream("object stream preamble offsets out of range"));
        }

        if registry.find(obj_num).is_some() {
            continue;
        }

        let slice = decoded[body_start..body_end].to_vec();
        let sub = Box::new(MemStream::from_bytes(slice)) as Box<dyn BaseStream>;
        let lexer = Lexer::new(sub)?;
        let mut parser = Parser::new(lexer)?;
        let value = parser.get_object()?;

        registry.add_with_value(obj_num, 0, 0, value);
    }

    Ok(())
}

/// The preamble is `N` pairs of `(object number, relative
/// offset)` integers, read with the same tokenizer used for the rest of the
/// stream; parsing stops ("pushes back") at the first non-integer token,
/// which in a well-formed stream is exactly after the Nth pair.
fn parse_preamble(preamble_bytes: &[u8], n: usize) -> PdfResult<Vec<(u32, usize)>> {
    let sub = Box::new(MemStream::from_bytes(preamble_bytes.to_vec())) as Box<dyn BaseStream>;
    let lexer = Lexer::new(sub)?;
    let mut parser = Parser::new(lexer)?;

    let mut pairs = Vec::with_capacity(n);
    for _ in 0..n {
        let num = match parser.get_object()? {
            PdfObject::Number(v) if v >= 0.0 => v as u32,
            other => {
                return Err(PdfError::object_stream(format!(
                    "expected object number in preamble, found {other:?}"
                )))
            }
        };
        let offset = match parser.get_object()? {
            PdfObject::Number(v) if v >= 0.0 => v as usize,
            other => {
                return Err(PdfError::object_stream(format!(
                    "expected offset in preamble, found {other:?}"
                )))
            }
        };
        pairs.push((num, offset));
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn stream_dict(n: i64, first: i64) -> PdfObject {
        let mut dict = HashMap::new();
        dict.insert("Type".to_string(), PdfObject::Name("ObjStm".to_string()));
        dict.insert("N".to_string(), PdfObject::Number(n as f64));
        dict.insert("First".to_string(), PdfObject::Number(first as f64));
        PdfObject::Dict(dict)
    }

    #[test]
    fn test_decode_two_objects() {
        let preamble = b"1 0 2 8 ";
        let bodies = b"(Hello) /Foo";
        let mut raw = Vec::new();
        raw.extend_from_slice(preamble);
        raw.extend_from_slice(bodies);

        let dict = stream_dict(2, preamble.len() as i64);
        let mut registry = ObjectRegistry::new();
        decode_object_stream(&dict, &raw, DEFAULT_MAX_OBJECTS_PER_STREAM, &mut registry).unwrap();

        assert_eq!(registry.count(), 2);
        assert_eq!(registry.find(1).unwrap().value, PdfObject::String(b"Hello".to_vec()));
        assert_eq!(registry.find(2).unwrap().value, PdfObject::Name("Foo".to_string()));
    }

    #[test]
    fn test_existing_registry_entry_is_not_overwritten() {
        let preamble = b"1 0 ";
        let raw = {
            let mut v = Vec::new();
            v.extend_from_slice(preamble);
            v.extend_from_slice(b"/FromStream");
            v
        };
        let dict = stream_dict(1, preamble.len() as i64);
        let mut registry = ObjectRegistry::new();
        registry.add_with_value(1, 0, 0, PdfObject::Name("AlreadyThere".to_string()));

        decode_object_stream(&dict, &raw, DEFAULT_MAX_OBJECTS_PER_STREAM, &mut registry).unwrap();
        assert_eq!(registry.find(1).unwrap().value, PdfObject::Name("AlreadyThere".to_string()));
    }

    #[test]
    fn test_object_count_over_cap_is_error() {
        let dict = stream_dict(5, 0);
        let mut registry = ObjectRegistry::new();
        let err = decode_object_stream(&dict, b"", 4, &mut registry).unwrap_err();
        assert!(matches!(err, PdfError::ObjectStream(_)));
    }

    #[test]
    fn test_wrong_type_is_error() {
        let mut dict = HashMap::new();
        dict.insert("Type".to_string(), PdfObject::Name("XRef".to_string()));
        let value = PdfObject::Dict(dict);
        let mut registry = ObjectRegistry::new();
        let err = decode_object_stream(&value, b"", DEFAULT_MAX_OBJECTS_PER_STREAM, &mut registry).unwrap_err();
        assert!(matches!(err, PdfError::ObjectStream(_)));
    }
}
