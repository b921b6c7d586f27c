pub mod core;

pub use core::{
    BaseStream, FileSink, Lexer, LoaderConfig, MemSink, MemStream, Mode, ObjectRecord,
    ObjectRegistry, PageRecord, Parser, PdfError, PdfFile, PdfObject, PdfResult, Token, WriteSink,
};
