//! Template tokenizer.
//!
//! A forward-only scanner over template bytes. Markup is recognized at each
//! `<`, interpolations at each opening delimiter found in text. Every token is
//! reported as byte ranges through [`Callbacks`]; nothing is allocated.

use memchr::memmem;
use portrait_relief::ErrorCode;

/// Quote style of an attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteType {
    NoValue,
    Unquoted,
    Single,
    Double,
}

/// Receiver of tokenizer events. All positions are byte offsets.
pub trait Callbacks {
    fn on_text(&mut self, start: usize, end: usize);
    /// Range of the expression between the delimiters.
    fn on_interpolation(&mut self, start: usize, end: usize);

    fn on_open_tag_name(&mut self, start: usize, end: usize);
    /// `end` is the index of the closing `>`.
    fn on_open_tag_end(&mut self, end: usize);
    /// `end` is the index of the closing `>`.
    fn on_self_closing_tag(&mut self, end: usize);
    /// Name range of a closing tag, plus the index of its `>`.
    fn on_close_tag(&mut self, start: usize, end: usize, gt: usize);

    fn on_attrib_name(&mut self, start: usize, end: usize);
    fn on_attrib_data(&mut self, start: usize, end: usize);
    /// `end` is the index of the closing quote for quoted values, else the
    /// end of the value or name.
    fn on_attrib_end(&mut self, quote: QuoteType, end: usize);

    /// Range of the comment body between `<!--` and `-->`.
    fn on_comment(&mut self, start: usize, end: usize);

    fn on_end(&mut self);
    fn on_error(&mut self, code: ErrorCode, index: usize);
}

#[inline]
pub fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\n' | b'\t' | b'\r' | b'\x0C')
}

/// Bytes that end a tag or attribute name.
#[inline]
fn ends_name(c: u8) -> bool {
    c == b'/' || c == b'>' || is_whitespace(c)
}

pub struct Tokenizer<'a, C: Callbacks> {
    src: &'a [u8],
    pos: usize,
    /// Start of the pending text run
    text_start: usize,
    open: &'a [u8],
    close: &'a [u8],
    callbacks: C,
}

impl<'a, C: Callbacks> Tokenizer<'a, C> {
    pub fn new(input: &'a str, callbacks: C) -> Self {
        Self::with_delimiters(input, callbacks, b"{{", b"}}")
    }

    pub fn with_delimiters(input: &'a str, callbacks: C, open: &'a [u8], close: &'a [u8]) -> Self {
        Self {
            src: input.as_bytes(),
            pos: 0,
            text_start: 0,
            open,
            close,
            callbacks,
        }
    }

    /// Tokenize the input and hand back the callbacks.
    pub fn tokenize(mut self) -> C {
        while self.pos < self.src.len() {
            if self.src[self.pos] == b'<' {
                self.markup();
            } else if !self.open.is_empty() && self.src[self.pos..].starts_with(self.open) {
                self.interpolation();
            } else {
                self.pos += 1;
            }
        }
        self.flush_text(self.src.len());
        self.callbacks.on_end();
        self.callbacks
    }

    fn flush_text(&mut self, end: usize) {
        if end > self.text_start {
            self.callbacks.on_text(self.text_start, end);
        }
    }

    /// Continue text after `index`.
    fn resume_text(&mut self, index: usize) {
        self.pos = index;
        self.text_start = index;
    }

    fn find(&self, needle: &[u8], from: usize) -> Option<usize> {
        memmem::find(&self.src[from..], needle).map(|offset| from + offset)
    }

    fn skip_whitespace(&mut self) {
        while self.src.get(self.pos).copied().is_some_and(is_whitespace) {
            self.pos += 1;
        }
    }

    fn interpolation(&mut self) {
        let open_at = self.pos;
        self.flush_text(open_at);
        let start = open_at + self.open.len();
        match self.find(self.close, start) {
            Some(end) => {
                self.callbacks.on_interpolation(start, end);
                self.resume_text(end + self.close.len());
            }
            None => {
                self.callbacks.on_error(ErrorCode::EofInInterpolation, self.src.len());
                // The unterminated interpolation stays text
                self.text_start = open_at;
                self.pos = self.src.len();
            }
        }
    }

    fn markup(&mut self) {
        let lt = self.pos;
        let rest = &self.src[lt + 1..];
        match rest.first().copied() {
            Some(c) if c.is_ascii_alphabetic() => {
                self.flush_text(lt);
                self.open_tag(lt + 1);
            }
            Some(b'/') => {
                self.flush_text(lt);
                self.close_tag(lt + 2);
            }
            Some(b'!') if rest.starts_with(b"!--") => {
                self.flush_text(lt);
                self.comment(lt + 4);
            }
            Some(b'!' | b'?') => {
                self.flush_text(lt);
                // Declarations and processing instructions are dropped
                match self.find(b">", lt) {
                    Some(gt) => self.resume_text(gt + 1),
                    None => self.resume_text(self.src.len()),
                }
            }
            _ => {
                // A lone `<` starts a new text run
                self.flush_text(lt);
                self.text_start = lt;
                self.pos = lt + 1;
            }
        }
    }

    fn comment(&mut self, start: usize) {
        match self.find(b"-->", start) {
            Some(end) => {
                self.callbacks.on_comment(start, end);
                self.resume_text(end + 3);
            }
            None => {
                let end = self.src.len();
                self.callbacks.on_error(ErrorCode::EofInComment, end);
                self.callbacks.on_comment(start.min(end), end);
                self.resume_text(end);
            }
        }
    }

    fn read_name(&mut self, stop: impl Fn(u8) -> bool) -> (usize, usize) {
        let start = self.pos;
        while self.src.get(self.pos).is_some_and(|&c| !stop(c)) {
            self.pos += 1;
        }
        (start, self.pos)
    }

    fn eof_in_tag(&mut self) {
        let end = self.src.len();
        self.callbacks.on_error(ErrorCode::EofInTag, end);
        self.resume_text(end);
    }

    fn open_tag(&mut self, name_start: usize) {
        self.pos = name_start;
        let (start, end) = self.read_name(ends_name);
        self.callbacks.on_open_tag_name(start, end);

        loop {
            self.skip_whitespace();
            match self.src.get(self.pos).copied() {
                None => return self.eof_in_tag(),
                Some(b'>') => {
                    self.callbacks.on_open_tag_end(self.pos);
                    return self.resume_text(self.pos + 1);
                }
                Some(b'/') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    if self.src.get(self.pos) == Some(&b'>') {
                        self.callbacks.on_self_closing_tag(self.pos);
                        return self.resume_text(self.pos + 1);
                    }
                }
                Some(_) => {
                    if !self.attribute() {
                        return self.eof_in_tag();
                    }
                }
            }
        }
    }

    /// One attribute at `pos`. Returns false at end of input.
    fn attribute(&mut self) -> bool {
        let name_start = self.pos;
        self.pos += 1;
        let (_, name_end) = self.read_name(|c| c == b'=' || ends_name(c));
        self.callbacks.on_attrib_name(name_start, name_end);

        self.skip_whitespace();
        if self.src.get(self.pos) != Some(&b'=') {
            self.callbacks.on_attrib_end(QuoteType::NoValue, name_end);
            return self.pos < self.src.len();
        }
        self.pos += 1;
        self.skip_whitespace();

        let quote = match self.src.get(self.pos).copied() {
            None => return false,
            Some(b'"') => QuoteType::Double,
            Some(b'\'') => QuoteType::Single,
            Some(_) => {
                let (start, end) = self.read_name(|c| c == b'>' || is_whitespace(c));
                self.callbacks.on_attrib_data(start, end);
                self.callbacks.on_attrib_end(QuoteType::Unquoted, end);
                return true;
            }
        };
        let quote_char = self.src[self.pos];
        let start = self.pos + 1;
        let Some(end) = memchr::memchr(quote_char, &self.src[start..]).map(|offset| start + offset) else {
            self.pos = self.src.len();
            return false;
        };
        self.callbacks.on_attrib_data(start, end);
        self.callbacks.on_attrib_end(quote, end);
        self.pos = end + 1;
        true
    }

    fn close_tag(&mut self, after_slash: usize) {
        self.pos = after_slash;
        self.skip_whitespace();
        match self.src.get(self.pos).copied() {
            None => return self.eof_in_tag(),
            Some(b'>') => {
                self.callbacks.on_error(ErrorCode::MissingEndTagName, self.pos);
                return self.resume_text(self.pos + 1);
            }
            Some(_) => {}
        }

        let (start, end) = self.read_name(|c| c == b'>' || is_whitespace(c));
        match self.find(b">", end) {
            Some(gt) => {
                self.callbacks.on_close_tag(start, end, gt);
                self.resume_text(gt + 1);
            }
            None => self.eof_in_tag(),
        }
    }
}
