//! CIF 2.0 text reader.
//!
//! Builds a [`Document`] through the public container API, so every name and
//! packet rule the document model enforces also applies to parsed input.
//! Handles all value forms: bare, single/double/triple-quoted, semicolon text
//! fields, `.` and `?`, lists `[...]`, and tables `{'key':value ...}`.

use tracing::debug;

use crate::config::ParseOptions;
use crate::dom::{Block, Container, Document, Frame, Packet};
use crate::status::{CifError, Result, SyntaxCode};
use crate::value::{List, Number, Quoting, Table, Value};

/// Parse CIF text into a [`Document`] with default options.
pub fn parse(input: &str) -> Result<Document> {
    parse_with(input, &ParseOptions::default())
}

/// Parse CIF text into a [`Document`].
pub fn parse_with(input: &str, options: &ParseOptions) -> Result<Document> {
    let doc = Parser::new(input, options).parse_document()?;
    debug!(blocks = doc.len(), bytes = input.len(), "parsed document");
    Ok(doc)
}

fn syntax(code: SyntaxCode, offset: usize) -> CifError {
    CifError::Syntax { code, offset }
}

// ---------------------------------------------------------------------------
// Internal tokenizer / parser
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Token {
    DataBlock(String),
    LoopStart,
    SaveStart(String),
    SaveEnd,
    Reserved,
    Name(String),
    Val(Value),
    /// A quoted string immediately followed by `:`.
    Key(String),
    ListOpen,
    ListClose,
    TableOpen,
    TableClose,
    Eof,
}

impl Token {
    fn starts_value(&self) -> bool {
        matches!(self, Token::Val(_) | Token::ListOpen | Token::TableOpen)
    }
}

/// A token and the byte offset it starts at.
type Spanned = (Token, usize);

struct Parser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    at_line_start: bool,
    pending: Option<Spanned>,
    options: &'a ParseOptions,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, options: &'a ParseOptions) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            at_line_start: true,
            pending: None,
            options,
        }
    }

    fn next(&mut self) -> Result<Spanned> {
        if let Some(t) = self.pending.take() {
            return Ok(t);
        }
        self.scan_token()
    }

    fn push_back(&mut self, token: Spanned) {
        debug_assert!(self.pending.is_none());
        self.pending = Some(token);
    }

    // --- Tokenizer ---

    fn skip_whitespace_and_comments(&mut self) {
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'\n' => {
                    self.pos += 1;
                    self.at_line_start = true;
                }
                b'#' => {
                    while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn scan_token(&mut self) -> Result<Spanned> {
        self.skip_whitespace_and_comments();
        let start = self.pos;
        if self.pos >= self.bytes.len() {
            return Ok((Token::Eof, start));
        }

        let b = self.bytes[self.pos];

        // Semicolon text field (only valid at line start)
        if b == b';' && self.at_line_start {
            return Ok((self.scan_text_field()?, start));
        }

        self.at_line_start = false;

        let token = match b {
            b'[' => {
                self.pos += 1;
                Token::ListOpen
            }
            b']' => {
                self.pos += 1;
                Token::ListClose
            }
            b'{' => {
                self.pos += 1;
                Token::TableOpen
            }
            b'}' => {
                self.pos += 1;
                Token::TableClose
            }
            b'\'' | b'"' => {
                let text = self.scan_quoted(b)?;
                if self.bytes.get(self.pos) == Some(&b':') {
                    self.pos += 1;
                    Token::Key(text)
                } else {
                    Token::Val(Value::Str(text, Quoting::Quoted))
                }
            }
            _ => {
                while self.pos < self.bytes.len() {
                    let c = self.bytes[self.pos];
                    if c.is_ascii_whitespace() || matches!(c, b'[' | b']' | b'{' | b'}') {
                        break;
                    }
                    self.pos += 1;
                }
                self.classify_unquoted(&self.input[start..self.pos])
            }
        };
        Ok((token, start))
    }

    fn scan_quoted(&mut self, quote: u8) -> Result<String> {
        let start = self.pos;
        if self.bytes[start..].starts_with(&[quote; 3]) {
            let body = start + 3;
            let delimiter = if quote == b'\'' { "'''" } else { "\"\"\"" };
            let len = self.input[body..]
                .find(delimiter)
                .ok_or_else(|| syntax(SyntaxCode::MissingEndQuote, start))?;
            self.pos = body + len + 3;
            return Ok(self.input[body..body + len].to_string());
        }

        // single-delimited strings end at the first matching quote on the same line
        let body = start + 1;
        let rest = &self.bytes[body..];
        match rest
            .iter()
            .position(|&c| c == quote || c == b'\n' || c == b'\r')
        {
            Some(len) if rest[len] == quote => {
                self.pos = body + len + 1;
                Ok(self.input[body..body + len].to_string())
            }
            _ => Err(syntax(SyntaxCode::MissingEndQuote, start)),
        }
    }

    fn scan_text_field(&mut self) -> Result<Token> {
        let start = self.pos;
        self.pos += 1; // skip opening ;
        self.at_line_start = false;
        let content_start = self.pos;

        loop {
            // Advance to next newline
            while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                self.pos += 1;
            }
            if self.pos >= self.bytes.len() {
                return Err(syntax(SyntaxCode::UnclosedText, start));
            }
            self.pos += 1; // skip \n

            // Check if next line starts with ;
            if self.pos < self.bytes.len() && self.bytes[self.pos] == b';' {
                // Content excludes the line terminator before closing ;
                let mut content_end = self.pos - 1;
                if content_end > content_start && self.bytes[content_end - 1] == b'\r' {
                    content_end -= 1;
                }
                let text = self.input[content_start..content_end].to_string();
                self.pos += 1; // skip closing ;
                return Ok(Token::Val(Value::Str(text, Quoting::Quoted)));
            }
        }
    }

    fn classify_unquoted(&self, s: &str) -> Token {
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("data_") {
            Token::DataBlock(s[5..].to_string())
        } else if lower == "loop_" {
            Token::LoopStart
        } else if lower.starts_with("save_") {
            if s.len() == 5 {
                Token::SaveEnd
            } else {
                Token::SaveStart(s[5..].to_string())
            }
        } else if lower == "global_" || lower == "stop_" {
            Token::Reserved
        } else if s.starts_with('_') {
            Token::Name(s.to_string())
        } else if s == "." {
            Token::Val(Value::Inapplicable)
        } else if s == "?" {
            Token::Val(Value::Unknown)
        } else if let Some(n) = self.number(s) {
            Token::Val(Value::Number(n))
        } else {
            Token::Val(Value::text(s))
        }
    }

    fn number(&self, s: &str) -> Option<Number> {
        if self.options.numbers {
            s.parse().ok()
        } else {
            None
        }
    }

    // --- Structure parsing ---

    fn parse_document(&mut self) -> Result<Document> {
        let mut doc = Document::new();
        loop {
            match self.next()? {
                (Token::Eof, _) => break,
                (Token::DataBlock(code), _) => {
                    let block = doc.create_block(&code)?;
                    self.parse_block(block)?;
                }
                (_, at) => return Err(syntax(SyntaxCode::NoBlockHeader, at)),
            }
        }
        Ok(doc)
    }

    fn parse_block(&mut self, block: &mut Block) -> Result<()> {
        loop {
            let (token, at) = self.next()?;
            match token {
                Token::Eof | Token::DataBlock(_) => {
                    self.push_back((token, at));
                    return Ok(());
                }
                Token::SaveStart(code) => {
                    if !self.options.allow_frames {
                        return Err(syntax(SyntaxCode::FrameNotAllowed, at));
                    }
                    let frame = block.create_frame(&code)?;
                    self.parse_frame(frame)?;
                }
                Token::SaveEnd => return Err(syntax(SyntaxCode::UnexpectedTerm, at)),
                other => self.parse_content(block, other, at)?,
            }
        }
    }

    fn parse_frame(&mut self, frame: &mut Frame) -> Result<()> {
        loop {
            let (token, at) = self.next()?;
            match token {
                Token::SaveEnd => return Ok(()),
                Token::Eof => return Err(syntax(SyntaxCode::EofInFrame, at)),
                Token::DataBlock(_) => return Err(syntax(SyntaxCode::NoFrameTerminator, at)),
                Token::SaveStart(_) => return Err(syntax(SyntaxCode::FrameNotAllowed, at)),
                other => self.parse_content(frame, other, at)?,
            }
        }
    }

    /// Items and loops: everything a block and a frame have in common.
    fn parse_content(&mut self, container: &mut Container, token: Token, at: usize) -> Result<()> {
        match token {
            Token::LoopStart => self.parse_loop(container),
            Token::Name(name) => {
                let (token, vat) = self.next()?;
                if !token.starts_value() {
                    return Err(syntax(SyntaxCode::MissingValue, vat));
                }
                let value = self.parse_value(token, vat)?;
                if container.contains_item(&name) {
                    return Err(CifError::DuplicateItemName(name));
                }
                container.set_value(&name, value)
            }
            Token::Val(_) | Token::Key(_) | Token::ListOpen | Token::TableOpen => {
                Err(syntax(SyntaxCode::UnexpectedValue, at))
            }
            Token::ListClose | Token::TableClose => {
                Err(syntax(SyntaxCode::UnexpectedDelimiter, at))
            }
            Token::Reserved => Err(syntax(SyntaxCode::ReservedWord, at)),
            Token::DataBlock(_) | Token::SaveStart(_) | Token::SaveEnd | Token::Eof => Err(
                CifError::Internal("structural token reached the item parser".into()),
            ),
        }
    }

    fn parse_loop(&mut self, container: &mut Container) -> Result<()> {
        let mut names = Vec::new();

        // Collect names
        loop {
            match self.next()? {
                (Token::Name(n), _) => names.push(n),
                other => {
                    self.push_back(other);
                    break;
                }
            }
        }

        // Collect values
        let mut values = Vec::new();
        loop {
            let (token, at) = self.next()?;
            if !token.starts_value() {
                self.push_back((token, at));
                break;
            }
            values.push(self.parse_value(token, at)?);
        }

        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut lp = container.create_loop(None, &refs)?;
        if values.is_empty() {
            return Err(CifError::EmptyLoop);
        }
        let leftover = values.len() % names.len();
        if leftover != 0 {
            return Err(CifError::PartialPacket(names[leftover].clone()));
        }
        for row in values.chunks(names.len()) {
            let packet = Packet::from_items(refs.iter().copied().zip(row.iter().cloned()))?;
            lp.add_packet(&packet)?;
        }
        Ok(())
    }

    fn parse_value(&mut self, token: Token, at: usize) -> Result<Value> {
        match token {
            Token::Val(v) => Ok(v),
            Token::ListOpen => self.parse_list(at),
            Token::TableOpen => self.parse_table(at),
            _ => Err(syntax(SyntaxCode::MissingValue, at)),
        }
    }

    fn parse_list(&mut self, open: usize) -> Result<Value> {
        let mut list = List::new();
        loop {
            let (token, at) = self.next()?;
            match token {
                Token::ListClose => return Ok(Value::List(list)),
                Token::TableClose => return Err(syntax(SyntaxCode::UnexpectedDelimiter, at)),
                t if t.starts_value() => list.push(self.parse_value(t, at)?),
                _ => return Err(syntax(SyntaxCode::MissingDelimiter, open)),
            }
        }
    }

    fn parse_table(&mut self, open: usize) -> Result<Value> {
        let mut table = Table::new();
        loop {
            let (token, at) = self.next()?;
            match token {
                Token::TableClose => return Ok(Value::Table(table)),
                Token::Key(key) => {
                    let (token, vat) = self.next()?;
                    if !token.starts_value() {
                        return Err(syntax(SyntaxCode::MissingValue, vat));
                    }
                    let value = self.parse_value(token, vat)?;
                    table.set(&key, value)?;
                }
                Token::Val(Value::Str(_, Quoting::Unquoted)) => {
                    return Err(syntax(SyntaxCode::UnquotedKey, at))
                }
                Token::Val(_) | Token::ListOpen | Token::TableOpen => {
                    return Err(syntax(SyntaxCode::MissingKey, at))
                }
                Token::ListClose => return Err(syntax(SyntaxCode::UnexpectedDelimiter, at)),
                _ => return Err(syntax(SyntaxCode::MissingDelimiter, open)),
            }
        }
    }
}
