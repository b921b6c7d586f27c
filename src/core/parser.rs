use super::error::{PdfError, PdfResult};
use super::lexer::{Lexer, Token};
use super::value::PdfObject;
use std::collections::HashMap;

/// Validates and narrows a generation number read as `f64` to `u16`.
///
/// Generation number range is [0, 65535]; values outside this
/// range are a hard parse error."
pub fn validate_generation(n: f64) -> PdfResult<u16> {
    if n < 0.0 || n > 65535.0 || n.fract() != 0.0 {
        return Err(PdfError::parse(format!("generation number out of range: {n}")));
    }
    Ok(n as u16)
}

/// Builds `PdfObject` values from a token stream, with two-token lookahead
/// so indirect references (`N G R`) and stream headers (dict followed by
/// the `stream` keyword) can be recognized.
pub struct Parser {
    lexer: Lexer,
    buf1: Option<Token>,
    buf2: Option<Token>,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> PdfResult<Self> {
        let buf1 = Some(lexer.get_object()?);
        let buf2 = Some(lexer.get_object()?);
        Ok(Parser { lexer, buf1, buf2 })
    }

    fn shift(&mut self) -> PdfResult<()> {
        self.buf1 = self.buf2.take();
        self.buf2 = Some(self.lexer.get_object()?);
        Ok(())
    }

    pub fn get_object(&mut self) -> PdfResult<PdfObject> {
        let token = self
            .buf1
            .take()
            .ok_or_else(|| PdfError::parse("parser lookahead buffer is empty"))?;
        self.shift()?;

        match token {
            Token::ArrayStart => self.parse_array(),
            Token::DictStart => self.parse_dictionary(),
            Token::ArrayEnd => Err(PdfError::parse("unexpected array end token")),
            Token::DictEnd => Err(PdfError::parse("unexpected dictionary end token")),
            Token::Number(n) => {
                if let Some(Token::Number(generation)) = &self.buf1 {
                    if let Some(Token::Command(cmd)) = &self.buf2 {
                        if cmd == "R" {
                            let number = n as u32;
                            let generation = validate_generation(*generation)?;
                            self.shift()?;
                            self.shift()?;
                            return Ok(PdfObject::Ref { number, generation });
                        }
                    }
                }
                Ok(PdfObject::Number(n))
            }
            Token::Eof => Ok(PdfObject::Eof),
            Token::Boolean(b) => Ok(PdfObject::Boolean(b)),
            Token::Null => Ok(PdfObject::Null),
            Token::String(s) => Ok(PdfObject::String(s)),
            Token::HexString(s) => Ok(PdfObject::HexString(s)),
            Token::Name(n) => Ok(PdfObject::Name(n)),
            Token::Command(c) => Ok(PdfObject::Name(c)),
        }
    }

    fn parse_array(&mut self) -> PdfResult<PdfObject> {
        let mut array = Vec::new();
        loop {
            if let Some(Token::ArrayEnd) = &self.buf1 {
                self.shift()?;
                break;
            }
            if let Some(Token::Eof) = &self.buf1 {
                return Err(PdfError::parse("unterminated array"));
            }
            array.push(self.get_object()?);
        }
        Ok(PdfObject::Array(array))
    }

    fn parse_dictionary(&mut self) -> PdfResult<PdfObject> {
        let mut dict = HashMap::new();
        loop {
            if let Some(Token::DictEnd) = &self.buf1 {
                self.shift()?;
                break;
            }
            if let Some(Token::Eof) = &self.buf1 {
                return Err(PdfError::parse("unterminated dictionary"));
            }

            let key = match &self.buf1 {
                Some(Token::Name(name)) => name.clone(),
                Some(other) => {
                    return Err(PdfError::parse(format!(
                        "expected dictionary key, found {other:?}"
                    )));
                }
                None => return Err(PdfError::parse("empty lookahead in dictionary")),
            };
            self.shift()?;

            if let Some(Token::DictEnd) = &self.buf1 {
                dict.insert(key, PdfObject::Null);
                break;
            }

            let value = self.get_object()?;
            dict.insert(key, value);
        }
        Ok(PdfObject::Dict(dict))
    }

    /// Reads an indirect object header `N G obj`, returning its number and
    /// generation, followed by the value that begins at this position. If a
    /// `stream` keyword follows the value's dictionary, `stream_offset` on
    /// success is the byte offset (in the underlying source) of the first
    /// byte after the `stream` keyword's line terminator, per the format's
    /// "stream-data offset" object-record field.
    pub fn parse_indirect_object(&mut self) -> PdfResult<(u32, u16, PdfObject, Option<usize>)> {
        let number = match self.get_object()? {
            PdfObject::Number(n) if n >= 0.0 => n as u32,
            other => return Err(PdfError::parse(format!("expected object number, found {other:?}"))),
        };
        let generation = match self.get_object()? {
            PdfObject::Number(n) => validate_generation(n)?,
            other => return Err(PdfError::parse(format!("expected generation number, found {other:?}"))),
        };
        match self.get_object()? {
            PdfObject::Name(ref cmd) if cmd == "obj" => {}
            other => return Err(PdfError::parse(format!("expected 'obj' keyword, found {other:?}"))),
        }

        let value = self.get_object()?;

        let stream_offset = self.lexer.take_stream_data_offset();

        Ok((number, generation, value, stream_offset))
    }

    pub fn has_more(&self) -> bool {
        !matches!(&self.buf1, Some(Token::Eof))
    }
}
