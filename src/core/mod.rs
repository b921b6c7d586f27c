pub mod base_stream;
pub mod error;
pub mod file;
pub mod filters;
pub mod lexer;
pub mod objstm;
pub mod pagetree;
pub mod parser;
pub mod registry;
pub mod sink;
pub mod stream;
pub mod value;
pub mod writer;
pub mod xref;

pub use base_stream::BaseStream;
pub use error::{PdfError, PdfResult};
pub use file::{LoaderConfig, Mode, PdfFile};
pub use lexer::{Lexer, Token};
pub use pagetree::PageRecord;
pub use parser::Parser;
pub use registry::{ObjectRecord, ObjectRegistry};
pub use sink::{FileSink, MemSink, WriteSink};
pub use stream::MemStream;
pub use value::PdfObject;
pub use xref::{LoadedTrailer, XrefLoader};
