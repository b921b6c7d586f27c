use std::fmt;

/// Error type for the document engine.
///
/// Every fatal condition the loader, registry, object-stream decoder, or
/// page-tree flattener can hit maps to one of these variants. There is no
/// "recoverable" variant at this layer: per the error-handling design, a
/// parse inconsistency is fatal for the open attempt that hit it.
#[derive(Debug, Clone)]
pub enum PdfError {
    /// Seek/read/write/open/close of the backing descriptor failed.
    Io(String),

    /// A pool failed to grow (e.g. a fallible capacity reservation).
    Allocation,

    /// The `%PDF-x.y` header line is missing or malformed.
    Header(String),

    /// `startxref` could not be located in the tail scan window.
    XrefLocate(String),

    /// A classical or stream-form xref section is malformed.
    XrefFormat(String),

    /// Decoding a compressed object stream failed.
    ObjectStream(String),

    /// The trailer's `Root` entry is missing or unresolvable.
    Catalog(String),

    /// A page-tree node has the wrong `Type` or is missing its dictionary.
    PageTree(String),

    /// A value failed to tokenize or parse.
    Parse(String),
}

impl fmt::Display for PdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfError::Io(msg) => write!(f, "I/O error: {msg}"),
            PdfError::Allocation => write!(f, "allocation failure"),
            PdfError::Header(msg) => write!(f, "header error: {msg}"),
            PdfError::XrefLocate(msg) => write!(f, "unable to find start of xref table: {msg}"),
            PdfError::XrefFormat(msg) => write!(f, "malformed cross-reference data: {msg}"),
            PdfError::ObjectStream(msg) => write!(f, "object stream error: {msg}"),
            PdfError::Catalog(msg) => write!(f, "catalog error: {msg}"),
            PdfError::PageTree(msg) => write!(f, "page tree error: {msg}"),
            PdfError::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl PdfError {
    pub fn io<S: Into<String>>(msg: S) -> Self {
        PdfError::Io(msg.into())
    }

    pub fn header<S: Into<String>>(msg: S) -> Self {
        PdfError::Header(msg.into())
    }

    pub fn xref_locate<S: Into<String>>(msg: S) -> Self {
        PdfError::XrefLocate(msg.into())
    }

    pub fn xref_format<S: Into<String>>(msg: S) -> Self {
        PdfError::XrefFormat(msg.into())
    }

    pub fn object_stream<S: Into<String>>(msg: S) -> Self {
        PdfError::ObjectStream(msg.into())
    }

    pub fn catalog<S: Into<String>>(msg: S) -> Self {
        PdfError::Catalog(msg.into())
    }

    pub fn page_tree<S: Into<String>>(msg: S) -> Self {
        PdfError::PageTree(msg.into())
    }

    pub fn parse<S: Into<String>>(msg: S) -> Self {
        PdfError::Parse(msg.into())
    }
}

impl std::error::Error for PdfError {}

impl From<std::io::Error> for PdfError {
    fn from(e: std::io::Error) -> Self {
        PdfError::Io(e.to_string())
    }
}

/// Result type alias used throughout the crate.
pub type PdfResult<T> = Result<T, PdfError>;
