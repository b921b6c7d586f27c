use super::base_stream::BaseStream;
use super::error::{PdfError, PdfResult};

/// Tokens produced by the `Lexer`: whitespace- or delimiter-terminated PDF
/// lexemes, one level below parsed values.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Eof,
    Boolean(bool),
    Null,
    Number(f64),
    String(Vec<u8>),
    HexString(Vec<u8>),
    Name(String),
    Command(String),
    ArrayStart,
    ArrayEnd,
    DictStart,
    DictEnd,
}

/// Tokenizes a PDF byte stream into `Token`s.
pub struct Lexer {
    stream: Box<dyn BaseStream>,
    current_char: i32,
    str_buf: Vec<u8>,
    /// Set when `get_command` recognizes the literal `stream` keyword: the
    /// byte offset of the first byte of the stream body, i.e. right after
    /// the mandatory EOL that follows the keyword.
    stream_data_offset: Option<usize>,
}

impl Lexer {
    pub fn new(mut stream: Box<dyn BaseStream>) -> PdfResult<Self> {
        let current_char = Self::read_char(&mut stream)?;
        Ok(Lexer {
            stream,
            current_char,
            str_buf: Vec::new(),
            stream_data_offset: None,
        })
    }

    /// Returns and clears the stream-data offset recorded by the most
    /// recent `stream` keyword token, if any.
    pub fn take_stream_data_offset(&mut self) -> Option<usize> {
        self.stream_data_offset.take()
    }

    fn read_char(stream: &mut Box<dyn BaseStream>) -> PdfResult<i32> {
        match stream.get_byte() {
            Ok(byte) => Ok(byte as i32),
            Err(PdfError::Io(_)) => Ok(-1),
            Err(e) => Err(e),
        }
    }

    fn next_char(&mut self) -> PdfResult<i32> {
        self.current_char = Self::read_char(&mut self.stream)?;
        Ok(self.current_char)
    }

    fn peek_char(&mut self) -> PdfResult<i32> {
        match self.stream.peek_byte() {
            Ok(byte) => Ok(byte as i32),
            Err(PdfError::Io(_)) => Ok(-1),
            Err(e) => Err(e),
        }
    }

    fn is_whitespace(ch: i32) -> bool {
        matches!(ch, 0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x20)
    }

    fn is_delimiter(ch: i32) -> bool {
        matches!(
            ch,
            0x28 | 0x29 | 0x3C | 0x3E | 0x5B | 0x5D | 0x7B | 0x7D | 0x2F | 0x25
        )
    }

    fn is_special(ch: i32) -> bool {
        Self::is_whitespace(ch) || Self::is_delimiter(ch)
    }

    fn skip_whitespace_and_comments(&mut self) -> PdfResult<()> {
        let mut comment = false;
        loop {
            let ch = self.current_char;
            if ch < 0 {
                break;
            }
            if comment {
                if ch == 0x0A || ch == 0x0D {
                    comment = false;
                }
            } else if ch == 0x25 {
                comment = true;
            } else if !Self::is_whitespace(ch) {
                break;
            }
            self.next_char()?;
        }
        Ok(())
    }

    pub fn get_object(&mut self) -> PdfResult<Token> {
        self.skip_whitespace_and_comments()?;
        let ch = self.current_char;
        if ch < 0 {
            return Ok(Token::Eof);
        }
        match ch {
            0x30..=0x39 | 0x2B | 0x2D | 0x2E => self.get_number(),
            0x28 => self.get_string(),
            0x2F => self.get_name(),
            0x5B => {
                self.next_char()?;
                Ok(Token::ArrayStart)
            }
            0x5D => {
                self.next_char()?;
                Ok(Token::ArrayEnd)
            }
            0x3C => {
                let next_ch = self.next_char()?;
                if next_ch == 0x3C {
                    self.next_char()?;
                    Ok(Token::DictStart)
                } else {
                    self.get_hex_string()
                }
            }
            0x3E => {
                let next_ch = self.next_char()?;
                if next_ch == 0x3E {
                    self.next_char()?;
                    Ok(Token::DictEnd)
                } else {
                    Err(PdfError::parse(format!("unexpected character: >{next_ch}")))
                }
            }
            0x29 => {
                self.next_char()?;
                Err(PdfError::parse(format!("illegal character: {ch}")))
            }
            _ => self.get_command(),
        }
    }

    fn get_number(&mut self) -> PdfResult<Token> {
        let mut ch = self.current_char;
        let mut e_notation = false;
        let mut divide_by = 0.0;
        let mut sign = 1.0;

        if ch == 0x2D {
            sign = -1.0;
            ch = self.next_char()?;
            if ch == 0x2D {
                ch = self.next_char()?;
            }
        } else if ch == 0x2B {
            ch = self.next_char()?;
        }

        if ch == 0x0A || ch == 0x0D {
            loop {
                ch = self.next_char()?;
                if ch != 0x0A && ch != 0x0D {
                    break;
                }
            }
        }

        if ch == 0x2E {
            divide_by = 10.0;
            ch = self.next_char()?;
        }

        if !(0x30..=0x39).contains(&ch) {
            if Self::is_whitespace(ch) || ch == 0x28 || ch == 0x3C || ch == -1 {
                return Ok(Token::Number(0.0));
            }
            return Err(PdfError::parse(format!("invalid number (charCode {ch})")));
        }

        let mut base_value = (ch - 0x30) as f64;
        let mut power_value = 0;
        let mut power_value_sign = 1;

        loop {
            ch = self.next_char()?;
            if ch < 0 {
                break;
            }
            if (0x30..=0x39).contains(&ch) {
                let digit = (ch - 0x30) as f64;
                if e_notation {
                    power_value = power_value * 10 + (ch - 0x30);
                } else {
                    if divide_by != 0.0 {
                        divide_by *= 10.0;
                    }
                    base_value = base_value * 10.0 + digit;
                }
            } else if ch == 0x2E {
                if divide_by == 0.0 {
                    divide_by = 1.0;
                } else {
                    break;
                }
            } else if ch == 0x2D {
                // ignore a minus in the middle, matching common reader leniency
            } else if ch == 0x45 || ch == 0x65 {
                let peek_ch = self.peek_char()?;
                if peek_ch == 0x2B || peek_ch == 0x2D {
                    power_value_sign = if peek_ch == 0x2D { -1 } else { 1 };
                    self.next_char()?;
                } else if !(0x30..=0x39).contains(&peek_ch) {
                    break;
                }
                e_notation = true;
            } else {
                break;
            }
        }

        let mut result = base_value;
        if divide_by != 0.0 {
            result /= divide_by;
        }
        if e_notation {
            result *= 10_f64.powi(power_value_sign * power_value);
        }

        Ok(Token::Number(sign * result))
    }

    fn get_string(&mut self) -> PdfResult<Token> {
        let mut num_paren = 1;
        self.str_buf.clear();
        let mut ch = self.next_char()?;

        loop {
            let mut char_buffered = false;
            match ch {
                -1 => break,
                0x28 => {
                    num_paren += 1;
                    self.str_buf.push(b'(');
                }
                0x29 => {
                    num_paren -= 1;
                    if num_paren == 0 {
                        self.next_char()?;
                        break;
                    }
                    self.str_buf.push(b')');
                }
                0x5C => {
                    ch = self.next_char()?;
                    match ch {
                        -1 => break,
                        0x6E => self.str_buf.push(b'\n'),
                        0x72 => self.str_buf.push(b'\r'),
                        0x74 => self.str_buf.push(b'\t'),
                        0x62 => self.str_buf.push(0x08),
                        0x66 => self.str_buf.push(0x0C),
                        0x5C | 0x28 | 0x29 => self.str_buf.push(ch as u8),
                        0x30..=0x37 => {
                            let mut x = (ch & 0x0F) as u8;
                            ch = self.next_char()?;
                            char_buffered = true;
                            if (0x30..=0x37).contains(&ch) {
                                x = (x << 3) + (ch & 0x0F) as u8;
                                ch = self.next_char()?;
                                if (0x30..=0x37).contains(&ch) {
                                    char_buffered = false;
                                    x = (x << 3) + (ch & 0x0F) as u8;
                                }
                            }
                            self.str_buf.push(x);
                        }
                        0x0D => {
                            if self.peek_char()? == 0x0A {
                                self.next_char()?;
                            }
                        }
                        0x0A => {}
                        _ => self.str_buf.push(ch as u8),
                    }
                }
                _ => self.str_buf.push(ch as u8),
            }
            if !char_buffered {
                ch = self.next_char()?;
            }
        }

        Ok(Token::String(self.str_buf.clone()))
    }

    fn to_hex_digit(ch: i32) -> i32 {
        if (0x30..=0x39).contains(&ch) {
            ch & 0x0F
        } else if (0x41..=0x46).contains(&ch) || (0x61..=0x66).contains(&ch) {
            (ch & 0x0F) + 9
        } else {
            -1
        }
    }

    fn get_hex_string(&mut self) -> PdfResult<Token> {
        self.str_buf.clear();
        let mut ch = self.current_char;
        let mut first_digit = -1;

        loop {
            if ch < 0 {
                break;
            } else if ch == 0x3E {
                self.next_char()?;
                break;
            } else if Self::is_whitespace(ch) {
                ch = self.next_char()?;
                continue;
            } else {
                let digit = Self::to_hex_digit(ch);
                if digit != -1 {
                    if first_digit == -1 {
                        first_digit = digit;
                    } else {
                        self.str_buf.push(((first_digit << 4) | digit) as u8);
                        first_digit = -1;
                    }
                }
                ch = self.next_char()?;
            }
        }

        if first_digit != -1 {
            self.str_buf.push((first_digit << 4) as u8);
        }

        Ok(Token::HexString(self.str_buf.clone()))
    }

    fn get_name(&mut self) -> PdfResult<Token> {
        self.str_buf.clear();
        let mut ch = self.next_char()?;

        while ch >= 0 && !Self::is_special(ch) {
            if ch == 0x23 {
                ch = self.next_char()?;
                if Self::is_special(ch) {
                    self.str_buf.push(b'#');
                    break;
                }
                let x = Self::to_hex_digit(ch);
                if x != -1 {
                    let previous_ch = ch;
                    ch = self.next_char()?;
                    let x2 = Self::to_hex_digit(ch);
                    if x2 == -1 {
                        self.str_buf.push(b'#');
                        self.str_buf.push(previous_ch as u8);
                        if Self::is_special(ch) {
                            break;
                        }
                        self.str_buf.push(ch as u8);
                        ch = self.next_char()?;
                        continue;
                    }
                    self.str_buf.push(((x << 4) | x2) as u8);
                } else {
                    self.str_buf.push(b'#');
                    self.str_buf.push(ch as u8);
                }
            } else {
                self.str_buf.push(ch as u8);
            }
            ch = self.next_char()?;
        }

        Ok(Token::Name(String::from_utf8_lossy(&self.str_buf).to_string()))
    }

    fn get_command(&mut self) -> PdfResult<Token> {
        let mut buf = String::new();
        let mut ch = self.current_char;

        while ch >= 0 && !Self::is_special(ch) {
            if buf.len() >= 128 {
                return Err(PdfError::parse("command token too long"));
            }
            buf.push(ch as u8 as char);
            ch = self.next_char()?;
        }

        if buf == "stream" {
            // Exactly one EOL marker (CRLF or LF; a lone CR is tolerated)
            // separates the keyword from the raw stream body.
            if ch == 0x0D {
                ch = self.next_char()?;
                if ch == 0x0A {
                    self.next_char()?;
                }
            } else if ch == 0x0A {
                self.next_char()?;
            }
            self.stream_data_offset = Some(if self.current_char >= 0 {
                self.stream.pos() - 1
            } else {
                self.stream.pos()
            });
        }

        match buf.as_str() {
            "true" => Ok(Token::Boolean(true)),
            "false" => Ok(Token::Boolean(false)),
            "null" => Ok(Token::Null),
            _ => Ok(Token::Command(buf)),
        }
    }
}
