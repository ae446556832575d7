//! Splitting raw diff text into lines of words.
//!
//! The tokenizer knows nothing about diffs. It reads bytes one at a time and
//! groups them into [`Line`]s, each an ordered list of words:
//!
//! - a single space ends the current word (consecutive spaces produce empty
//!   words, so nothing is lost)
//! - `\n` ends the current line
//! - a tab is either part of a word or a line break, see [`TabMode`]
//! - every other byte belongs to the current word
//!
//! Joining a line's words with `" "` gives back the original line.
//!
//! ```
//! use diffparser::tokenize::tokenize;
//!
//! let lines: Vec<_> = tokenize("@@ -1 +1 @@\n+hello  world".as_bytes())
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(lines.len(), 2);
//! assert_eq!(lines[0].words(), ["@@", "-1", "+1", "@@"]);
//! assert_eq!(lines[1].words(), ["+hello", "", "world"]);
//! assert_eq!(lines[1].number(), 2);
//! ```

use std::io::{self, BufRead};

/// How a tab byte is treated while splitting lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TabMode {
    /// Tabs are ordinary content and stay inside the current word
    #[default]
    Literal,
    /// Tabs end the current line, like `\n`
    LineBreak,
}

/// One line of input split on single spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    number: usize,
    words: Vec<String>,
}

impl Line {
    /// Build a line from its 1-based position and words.
    pub fn new(number: usize, words: Vec<String>) -> Self {
        Self { number, words }
    }

    /// 1-based position of this line in the input
    pub fn number(&self) -> usize {
        self.number
    }

    /// Words of this line, in input order. Never empty for tokenized input.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Consume the line, returning its words
    pub fn into_words(self) -> Vec<String> {
        self.words
    }

    /// The line text, with words re-joined by single spaces
    pub fn text(&self) -> String {
        self.words.join(" ")
    }
}

/// Lazy iterator of [`Line`]s read from a byte stream.
///
/// Yields `Err` once if the reader fails and then stops.
pub struct Tokenizer<R> {
    bytes: io::Bytes<R>,
    tab_mode: TabMode,
    word: Vec<u8>,
    words: Vec<String>,
    /// Whether any byte was consumed since the last line break
    dirty: bool,
    line_number: usize,
    done: bool,
}

impl<R: BufRead> Tokenizer<R> {
    pub fn new(reader: R) -> Self {
        Self::with_tab_mode(reader, TabMode::default())
    }

    pub fn with_tab_mode(reader: R, tab_mode: TabMode) -> Self {
        Self {
            bytes: reader.bytes(),
            tab_mode,
            word: Vec::new(),
            words: Vec::new(),
            dirty: false,
            line_number: 0,
            done: false,
        }
    }

    fn is_line_break(&self, byte: u8) -> bool {
        match byte {
            b'\n' => true,
            b'\t' => self.tab_mode == TabMode::LineBreak,
            _ => false,
        }
    }

    fn flush_word(&mut self) {
        let word = std::mem::take(&mut self.word);
        self.words.push(match String::from_utf8(word) {
            Ok(word) => word,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        });
    }

    fn finish_line(&mut self) -> Line {
        self.flush_word();
        self.dirty = false;
        self.line_number += 1;
        Line::new(self.line_number, std::mem::take(&mut self.words))
    }
}

impl<R: BufRead> Iterator for Tokenizer<R> {
    type Item = io::Result<Line>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let byte = match self.bytes.next() {
                Some(Ok(byte)) => byte,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    // Keep a final line that has no trailing line break
                    if self.dirty {
                        return Some(Ok(self.finish_line()));
                    }
                    return None;
                }
            };

            if byte == b' ' {
                self.flush_word();
            } else if self.is_line_break(byte) {
                return Some(Ok(self.finish_line()));
            } else {
                self.word.push(byte);
            }
            self.dirty = true;
        }
    }
}

/// Tokenize `reader` with default options.
pub fn tokenize<R: BufRead>(reader: R) -> Tokenizer<R> {
    Tokenizer::new(reader)
}
