/// Stream decoding: decompression filters and the PNG-predictor post-pass
/// shared by xref streams and object streams.
use super::error::{PdfError, PdfResult};
use flate2::read::ZlibDecoder;
use std::io::Read;

/// Decodes a FlateDecode (zlib/deflate) compressed stream.
pub fn decode_flate(compressed_data: &[u8]) -> PdfResult<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(compressed_data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| PdfError::object_stream(format!("FlateDecode error: {e}")))?;
    Ok(decompressed)
}

/// Decodes a stream based on its `/Filter` entry. Only `FlateDecode` and the
/// absence of a filter are supported; anything else is an error. General
/// filter/value manipulation belongs to a higher layer — this engine only
/// needs the one filter its own xref-stream and object-stream paths use.
pub fn decode_stream(data: &[u8], filter_name: Option<&str>) -> PdfResult<Vec<u8>> {
    match filter_name {
        Some("FlateDecode") => decode_flate(data),
        Some(filter) => Err(PdfError::object_stream(format!("unsupported filter: {filter}"))),
        None => Ok(data.to_vec()),
    }
}

/// Reverses a PNG-style predictor (values 10-14 per `/DecodeParms
/// /Predictor`) applied on top of FlateDecode, as used by xref streams and
/// object streams. `columns` is the row width in samples, `colors` the
/// number of color components, `bits_per_component` the sample bit depth.
pub fn apply_png_predictor(
    data: &[u8],
    colors: usize,
    bits_per_component: usize,
    columns: usize,
) -> PdfResult<Vec<u8>> {
    let bytes_per_pixel = ((colors * bits_per_component) as f64 / 8.0).ceil().max(1.0) as usize;
    let row_bytes = ((colors * bits_per_component * columns) as f64 / 8.0).ceil() as usize;
    if row_bytes == 0 {
        return Err(PdfError::object_stream("PNG predictor: zero-width row"));
    }

    let mut out = Vec::with_capacity(data.len());
    let mut prev_row = vec![0u8; row_bytes];
    let mut pos = 0;

    while pos + 1 + row_bytes <= data.len() {
        let tag = data[pos];
        let row = &data[pos + 1..pos + 1 + row_bytes];
        let mut decoded = vec![0u8; row_bytes];

        for i in 0..row_bytes {
            let left = if i >= bytes_per_pixel { decoded[i - bytes_per_pixel] } else { 0 };
            let up = prev_row[i];
            let up_left = if i >= bytes_per_pixel { prev_row[i - bytes_per_pixel] } else { 0 };

            decoded[i] = match tag {
                0 => row[i],
                1 => row[i].wrapping_add(left),
                2 => row[i].wrapping_add(up),
                3 => row[i].wrapping_add(((left as u16 + up as u16) / 2) as u8),
                4 => row[i].wrapping_add(paeth(left, up, up_left)),
                other => {
                    return Err(PdfError::object_stream(format!(
                        "unsupported PNG predictor tag: {other}"
                    )))
                }
            };
        }

        out.extend_from_slice(&decoded);
        prev_row = decoded;
        pos += 1 + row_bytes;
    }

    Ok(out)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let (a, b, c) = (a as i32, b as i32, c as i32);
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();
    if pa <= pb && pa <= pc {
        a as u8
    } else if pb <= pc {
        b as u8
    } else {
        c as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_flate_roundtrip() {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let original = b"Hello, PDF world! This is test data.";
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(original).unwrap();
        let compressed = encoder.finish().unwrap();

        let decompressed = decode_flate(&compressed).unwrap();
        assert_eq!(&decompressed[..], original);
    }

    #[test]
    fn test_decode_stream_no_filter() {
        let original = b"raw bytes";
        let result = decode_stream(original, None).unwrap();
        assert_eq!(&result[..], original);
    }

    #[test]
    fn test_decode_stream_unsupported_filter() {
        assert!(decode_stream(b"x", Some("DCTDecode")).is_err());
    }

    #[test]
    fn test_png_predictor_none_tag_is_identity() {
        // Two rows of 3 bytes, tag 0 (None) on every row.
        let data = vec![0u8, 1, 2, 3, 0, 4, 5, 6];
        let out = apply_png_predictor(&data, 1, 8, 3).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_png_predictor_sub_tag() {
        // One row, tag 1 (Sub): decoded[i] = raw[i] + decoded[i-1].
        let data = vec![1u8, 10, 5, 5];
        let out = apply_png_predictor(&data, 1, 8, 3).unwrap();
        assert_eq!(out, vec![10, 15, 20]);
    }
}
