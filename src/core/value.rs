use std::collections::HashMap;

/// A parsed PDF value. Construction, mutation, and printing of individual
/// values beyond what the engine itself needs (trailer/dictionary reads,
/// writer serialization) are an external collaborator's concern per
/// this type only carries the shapes the engine must inspect.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfObject {
    Null,
    Boolean(bool),
    Number(f64),
    String(Vec<u8>),
    HexString(Vec<u8>),
    Name(String),
    Array(Vec<PdfObject>),
    Dict(HashMap<String, PdfObject>),
    /// An indirect reference, `number generation R`.
    Ref { number: u32, generation: u16 },
    /// A stream object: its dictionary plus the raw (still-encoded) body.
    Stream {
        dict: Box<PdfObject>,
        data: Vec<u8>,
    },
    Eof,
}

impl PdfObject {
    pub fn is_null(&self) -> bool {
        matches!(self, PdfObject::Null)
    }

    pub fn as_dict(&self) -> Option<&HashMap<String, PdfObject>> {
        match self {
            PdfObject::Dict(d) => Some(d),
            PdfObject::Stream { dict, .. } => dict.as_dict(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[PdfObject]> {
        match self {
            PdfObject::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            PdfObject::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PdfObject::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_f64().map(|n| n as i64)
    }

    pub fn as_ref(&self) -> Option<(u32, u16)> {
        match self {
            PdfObject::Ref { number, generation } => Some((*number, *generation)),
            _ => None,
        }
    }

    pub fn as_stream_data(&self) -> Option<&[u8]> {
        match self {
            PdfObject::Stream { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Looks up a key in this value if it is a dictionary (or a stream's
    /// dictionary).
    pub fn get(&self, key: &str) -> Option<&PdfObject> {
        self.as_dict().and_then(|d| d.get(key))
    }
}
