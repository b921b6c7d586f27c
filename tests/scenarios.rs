//! End-to-end scenarios against the public `pdf_core` surface: opening
//! classical and stream-form xref PDFs, incremental updates, and the
//! documented hard-error boundaries.

use pdf_core::core::objstm;
use pdf_core::core::registry::ObjectRegistry;
use pdf_core::core::stream::MemStream;
use pdf_core::core::xref::XrefLoader;
use pdf_core::{BaseStream, LoaderConfig, PdfError, PdfFile};
use std::io::Write;

fn write_temp_pdf(bytes: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.pdf");
    std::fs::File::create(&path).unwrap().write_all(bytes).unwrap();
    (dir, path)
}

fn be24(n: u32) -> [u8; 3] {
    [(n >> 16) as u8, (n >> 8) as u8, n as u8]
}

#[test]
fn scenario_minimal_classical_pdf() {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n");
    let obj1 = buf.len();
    buf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
    let obj2 = buf.len();
    buf.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n");
    let obj3 = buf.len();
    buf.extend_from_slice(b"3 0 obj\n<< /Type /Page /Parent 2 0 R >>\nendobj\n");
    let xref_offset = buf.len();
    buf.extend_from_slice(b"xref\n0 4\n");
    buf.extend_from_slice(b"0000000000 65535 f \n");
    buf.extend_from_slice(format!("{obj1:010} 00000 n \n").as_bytes());
    buf.extend_from_slice(format!("{obj2:010} 00000 n \n").as_bytes());
    buf.extend_from_slice(format!("{obj3:010} 00000 n \n").as_bytes());
    buf.extend_from_slice(b"trailer\n<< /Size 4 /Root 1 0 R >>\n");
    buf.extend_from_slice(format!("startxref\n{xref_offset}\n%%EOF").as_bytes());

    let (_dir, path) = write_temp_pdf(&buf);
    let file = PdfFile::open(&path, LoaderConfig::default(), |_| {}).unwrap();

    assert_eq!(file.num_objects(), 4);
    assert_eq!(file.num_pages(), 1);
    assert_eq!(file.version(), "1.7");
    assert!(file.find_object(1).is_some());
    assert_eq!(
        file.get_page(0).unwrap().get("Type").and_then(|t| t.as_name()),
        Some("Page")
    );
}

#[test]
fn scenario_xref_stream_with_object_stream() {
    // W = [1, 3, 1], Index = [10, 3]: records for objects 10, 11, 12.
    // Object 11 is itself an object stream owning object 12.
    let mut buf = Vec::new();
    buf.extend_from_slice(b"%PDF-1.7\n");

    let obj10_offset = buf.len() as u32;
    buf.extend_from_slice(b"10 0 obj\n<< /Marker /Ten >>\nendobj\n");

    let preamble = b"12 0 ";
    let body = b"<< /Marker /Twelve >>";
    let mut objstm_data = Vec::new();
    objstm_data.extend_from_slice(preamble);
    objstm_data.extend_from_slice(body);

    let obj11_offset = buf.len() as u32;
    buf.extend_from_slice(
        format!(
            "11 0 obj\n<< /Type /ObjStm /N 1 /First {} /Length {} >>\nstream\n",
            preamble.len(),
            objstm_data.len()
        )
        .as_bytes(),
    );
    buf.extend_from_slice(&objstm_data);
    buf.extend_from_slice(b"\nendstream\nendobj\n");

    let mut records = Vec::new();
    records.push(0x01);
    records.extend_from_slice(&be24(obj10_offset));
    records.push(0x00);
    records.push(0x01);
    records.extend_from_slice(&be24(obj11_offset));
    records.push(0x00);
    records.push(0x02);
    records.extend_from_slice(&be24(11));
    records.push(0x00);

    let xref_offset = buf.len();
    buf.extend_from_slice(
        format!(
            "30 0 obj\n<< /Type /XRef /Size 13 /W [1 3 1] /Index [10 3] /Root 10 0 R /Length {} >>\nstream\n",
            records.len()
        )
        .as_bytes(),
    );
    buf.extend_from_slice(&records);
    buf.extend_from_slice(b"\nendstream\nendobj\n");
    buf.extend_from_slice(format!("startxref\n{xref_offset}\n%%EOF").as_bytes());

    let mut stream = MemStream::from_bytes(buf);
    let mut registry = ObjectRegistry::new();
    let pending = {
        let mut loader = XrefLoader::new(&mut registry);
        loader.load(&mut stream).unwrap();
        loader.pending_compressed.clone()
    };

    assert_eq!(pending, vec![(12, 11, 0)]);

    let owner_offset = registry.find(11).unwrap().offset;
    let owner_remaining = stream.length() - owner_offset as usize;
    let sub = stream.make_sub_stream(owner_offset as usize, owner_remaining).unwrap();
    let lexer = pdf_core::Lexer::new(sub).unwrap();
    let mut parser = pdf_core::Parser::new(lexer).unwrap();
    let (_num, _gen, dict_value, stream_rel_offset) = parser.parse_indirect_object().unwrap();
    let rel = stream_rel_offset.unwrap();
    let length = dict_value.get("Length").unwrap().as_i64().unwrap() as usize;
    let raw = stream
        .get_byte_range(owner_offset as usize + rel, owner_offset as usize + rel + length)
        .unwrap();
    let stream_value = pdf_core::PdfObject::Stream {
        dict: Box::new(dict_value),
        data: raw,
    };

    objstm::decode_object_stream(&stream_value, &raw_data(&stream_value), 1000, &mut registry).unwrap();

    // 10, 11, and 12 per the xref-stream's own /Index range, plus the
    // xref-stream object (30) registered as a live indirect object in its
    // own right.
    assert_eq!(registry.count(), 4);
    assert!(registry.find(10).is_some());
    assert!(registry.find(11).is_some());
    assert!(registry.find(30).is_some());
    assert_eq!(
        registry.find(12).unwrap().value.get("Marker").and_then(|m| m.as_name()),
        Some("Twelve")
    );
}

fn raw_data(value: &pdf_core::PdfObject) -> Vec<u8> {
    value.as_stream_data().unwrap().to_vec()
}

#[test]
fn scenario_incremental_update_prefers_newer_revision() {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"%PDF-1.7\n");

    let old_obj5 = buf.len();
    buf.extend_from_slice(b"5 0 obj\n<< /Marker /Old >>\nendobj\n");
    let obj1 = buf.len();
    buf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
    let obj2 = buf.len();
    buf.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [] /Count 0 >>\nendobj\n");
    let base_xref_offset = buf.len();
    buf.extend_from_slice(b"xref\n0 3\n");
    buf.extend_from_slice(b"0000000000 65535 f \n");
    buf.extend_from_slice(format!("{old_obj5:010} 00000 n \n").as_bytes());
    buf.extend_from_slice(format!("{obj2:010} 00000 n \n").as_bytes());
    buf.extend_from_slice(b"trailer\n<< /Size 3 /Root 1 0 R >>\n");

    let new_obj5 = buf.len();
    buf.extend_from_slice(b"5 0 obj\n<< /Marker /New >>\nendobj\n");
    let update_xref_offset = buf.len();
    buf.extend_from_slice(b"xref\n5 1\n");
    buf.extend_from_slice(format!("{new_obj5:010} 00000 n \n").as_bytes());
    buf.extend_from_slice(
        format!("trailer\n<< /Size 3 /Root 1 0 R /Prev {base_xref_offset} >>\n").as_bytes(),
    );
    buf.extend_from_slice(format!("startxref\n{update_xref_offset}\n%%EOF").as_bytes());

    let _ = obj1;
    let mut stream = MemStream::from_bytes(buf);
    let mut registry = ObjectRegistry::new();
    let mut loader = XrefLoader::new(&mut registry);
    loader.load(&mut stream).unwrap();

    assert_eq!(registry.find(5).unwrap().offset, new_obj5 as u64);
}

#[test]
fn scenario_malformed_header_reports_once() {
    let (_dir, path) = write_temp_pdf(b"%PDF-3.0\n");
    let mut errors = Vec::new();
    let result = PdfFile::open(&path, LoaderConfig::default(), |msg| errors.push(msg.to_string()));
    assert!(result.is_err());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("3.0"));
}

#[test]
fn scenario_missing_root_is_rejected() {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"%PDF-1.7\n");
    buf.extend_from_slice(b"xref\n0 1\n0000000000 65535 f \n");
    let xref_offset = 9;
    buf.extend_from_slice(b"trailer\n<< /Size 1 >>\n");
    buf.extend_from_slice(format!("startxref\n{xref_offset}\n%%EOF").as_bytes());

    let (_dir, path) = write_temp_pdf(&buf);
    let err = PdfFile::open(&path, LoaderConfig::default(), |_| {}).unwrap_err();
    assert!(matches!(err, PdfError::Catalog(_)));
}

#[test]
fn scenario_unsupported_multi_segment_index_is_rejected() {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"%PDF-1.7\n");
    let records: Vec<u8> = Vec::new();
    let xref_offset = buf.len();
    buf.extend_from_slice(
        b"30 0 obj\n<< /Type /XRef /Size 20 /W [1 3 1] /Index [0 1 10 1] /Root 1 0 R /Length 0 >>\nstream\n",
    );
    buf.extend_from_slice(&records);
    buf.extend_from_slice(b"\nendstream\nendobj\n");
    buf.extend_from_slice(format!("startxref\n{xref_offset}\n%%EOF").as_bytes());

    let mut stream = MemStream::from_bytes(buf);
    let mut registry = ObjectRegistry::new();
    let mut loader = XrefLoader::new(&mut registry);
    let err = loader.load(&mut stream).unwrap_err();
    assert!(matches!(err, PdfError::XrefFormat(_)));
    assert!(err.to_string().contains("more than one range pair"));
}
