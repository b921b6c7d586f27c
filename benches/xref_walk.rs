/// Benchmarks for cross-reference chain walking.
///
/// Run with: cargo bench
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pdf_core::core::registry::ObjectRegistry;
use pdf_core::core::stream::MemStream;
use pdf_core::core::xref::XrefLoader;

/// Builds a synthetic PDF with `revisions` incremental updates chained via
/// `/Prev`, each redefining one shared object and introducing one new one.
fn synthetic_incremental_pdf(revisions: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"%PDF-1.7\n");

    let shared_offset = buf.len();
    buf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
    let pages_offset = buf.len();
    buf.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [] /Count 0 >>\nendobj\n");
    let base_xref_offset = buf.len();
    buf.extend_from_slice(b"xref\n0 3\n");
    buf.extend_from_slice(b"0000000000 65535 f \n");
    buf.extend_from_slice(format!("{shared_offset:010} 00000 n \n").as_bytes());
    buf.extend_from_slice(format!("{pages_offset:010} 00000 n \n").as_bytes());
    buf.extend_from_slice(b"trailer\n<< /Size 3 /Root 1 0 R >>\n");

    let mut prev_xref_offset = base_xref_offset;
    let mut next_obj_num = 3u32;
    for _ in 0..revisions {
        let obj_offset = buf.len();
        buf.extend_from_slice(format!("{next_obj_num} 0 obj\n<< /Marker /Rev >>\nendobj\n").as_bytes());
        let xref_offset = buf.len();
        buf.extend_from_slice(format!("xref\n{next_obj_num} 1\n").as_bytes());
        buf.extend_from_slice(format!("{obj_offset:010} 00000 n \n").as_bytes());
        buf.extend_from_slice(
            format!("trailer\n<< /Size {} /Root 1 0 R /Prev {prev_xref_offset} >>\n", next_obj_num + 1)
                .as_bytes(),
        );
        prev_xref_offset = xref_offset;
        next_obj_num += 1;
    }

    buf.extend_from_slice(format!("startxref\n{prev_xref_offset}\n%%EOF").as_bytes());
    buf
}

fn benchmark_xref_chain_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("xref_chain_walk");

    for &revisions in &[1usize, 10, 100] {
        let pdf = synthetic_incremental_pdf(revisions);
        group.throughput(Throughput::Bytes(pdf.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(revisions), &pdf, |b, pdf| {
            b.iter(|| {
                let mut stream = MemStream::from_bytes(black_box(pdf.clone()));
                let mut registry = ObjectRegistry::new();
                let mut loader = XrefLoader::new(&mut registry);
                loader.load(&mut stream).unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_xref_chain_walk);
criterion_main!(benches);
