//! Extraction of the string literals of an XPM file.
//!
//! XPM files are C source, but the only parts carrying image data are the
//! string literals. The lexer keeps the contents of each string, drops C
//! comments, and uses the newlines found outside of strings to separate one
//! logical line from the next. Everything else (the array declaration, commas,
//! braces) falls away.

/// Contents of one (or several adjacent) string literals of the input, with the
/// quotes removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct SourceLine {
    /// Line of the input on which the first byte of `text` appeared (1-based)
    pub(super) line: u64,
    pub(super) text: Vec<u8>,
}

/// Iterator over the logical lines of an XPM file.
///
/// This never fails: an unterminated string or comment at the end of the input
/// keeps whatever was collected up to that point. Comments do not nest, and
/// comment markers inside a string literal are plain data.
pub(super) struct Lexer<'a> {
    data: &'a [u8],
    pos: usize,
    /// Current line of the input (1-based)
    line: u64,
    in_quote: bool,
    in_comment: bool,
}

impl<'a> Lexer<'a> {
    pub(super) fn new(data: &'a [u8]) -> Lexer<'a> {
        Lexer {
            data,
            pos: 0,
            line: 1,
            in_quote: false,
            in_comment: false,
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = SourceLine;

    fn next(&mut self) -> Option<SourceLine> {
        let mut text = Vec::new();
        let mut start = self.line;

        while let Some(&b) = self.data.get(self.pos) {
            let next = self.data.get(self.pos + 1).copied();

            if !self.in_quote && b == b'/' && next == Some(b'*') {
                self.in_comment = true;
                self.pos += 2;
                continue;
            }
            if self.in_comment && b == b'*' && next == Some(b'/') {
                self.in_comment = false;
                self.pos += 2;
                continue;
            }

            self.pos += 1;
            if b == b'\n' {
                self.line += 1;
            }

            if self.in_comment {
                continue;
            }
            if b == b'"' {
                self.in_quote = !self.in_quote;
                continue;
            }

            if b == b'\n' {
                // Inside a string, a raw newline also ends the logical line
                if !text.is_empty() {
                    return Some(SourceLine { line: start, text });
                }
            } else if self.in_quote {
                if text.is_empty() {
                    start = self.line;
                }
                text.push(b);
            }
        }

        if text.is_empty() {
            None
        } else {
            Some(SourceLine { line: start, text })
        }
    }
}

/// Split `data` into all of its logical lines
pub(super) fn tokenize(data: &[u8]) -> Vec<SourceLine> {
    Lexer::new(data).collect()
}
