//! Parse `git diff` output into a tree of changed files and hunks.
//!
//! Parsing runs in two stages over a single pass of the input:
//!
//! 1. [`tokenize`] splits the byte stream into [`Line`]s of words
//! 2. [`build::DiffBuilder`] classifies each line and grows a [`Diff`]
//!
//! ```
//! let text = "\
//! diff --git a/foo.go b/foo.go
//! index e69de29..4b825dc 100644
//! --- a/foo.go
//! +++ b/foo.go
//! @@ -0,0 +1,2 @@
//! +line one
//! +line two
//! ";
//! let diff = diffparser::parse_str(text).unwrap();
//! let file = &diff.files()[0];
//! assert_eq!(file.file_out(), "b/foo.go");
//! assert_eq!(file.metadata(), Some("e69de29..4b825dc 100644"));
//!
//! let hunk = &file.chunks()[0];
//! assert_eq!(hunk.new_range(), "+1,2");
//! assert_eq!(hunk.added_text().collect::<Vec<_>>(), ["line one", "line two"]);
//! ```

use error_set::error_set;
use log::debug;
use std::io::{self, BufRead, BufReader, Read};

pub mod build;
pub mod diff;
pub mod tokenize;

pub use build::{IgnoredLine, LineKind};
pub use diff::{Chunk, Diff, DiffChunk, HunkRange, IndexLine};
pub use tokenize::{Line, TabMode, Tokenizer};

use build::DiffBuilder;

error_set! {
    /// Top-level error for parsing a diff
    ParseError := {
        /// Reading the input failed
        Io(std::io::Error),
        /// No `diff --git` header was found and files were required
        #[display("Diff contains no file blocks")]
        EmptyInput,
    } || StructuralError || MalformedLineError

    /// A line appeared before the header it belongs to
    StructuralError := {
        #[display("Line {line_number}: {kind} line before any `diff --git` header")]
        MissingFileHeader { line_number: usize, kind: LineKind },
        #[display("Line {line_number}: {kind} line before any `@@` hunk header")]
        MissingHunkHeader { line_number: usize, kind: LineKind },
    }

    /// A header line is missing words it needs
    MalformedLineError := {
        #[display("Line {line_number}: {kind} line has {found} tokens, expected at least {expected}")]
        MissingTokens {
            line_number: usize,
            kind: LineKind,
            expected: usize,
            found: usize,
        },
        #[display("Line {line_number}: `diff --git` header has an empty path")]
        EmptyPath { line_number: usize },
    }
}

/// Knobs for a single parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Whether a tab ends a line or is kept as content
    pub tab_mode: TabMode,
    /// Fail with [`ParseError::EmptyInput`] when no file block is found
    pub require_files: bool,
}

impl ParseOptions {
    /// Default options: literal tabs, empty input allowed
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tab_mode(mut self, tab_mode: TabMode) -> Self {
        self.tab_mode = tab_mode;
        self
    }

    #[must_use]
    pub fn require_files(mut self, require_files: bool) -> Self {
        self.require_files = require_files;
        self
    }
}

/// Parser over a buffered diff stream.
///
/// # Examples
///
/// ```
/// use diffparser::{DiffParser, ParseError, ParseOptions};
///
/// let options = ParseOptions::new().require_files(true);
/// let result = DiffParser::new("".as_bytes()).with_options(options).parse();
/// assert!(matches!(result, Err(ParseError::EmptyInput)));
/// ```
pub struct DiffParser<R> {
    reader: R,
    options: ParseOptions,
}

impl<R: BufRead> DiffParser<R> {
    /// Parser over `reader` with default options
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            options: ParseOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Read the whole stream and build the diff tree.
    ///
    /// Lines are classified as they are read; the tokenized input is never
    /// held in memory as a whole.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] on the first unreadable, malformed or
    /// out-of-order line, or on empty input when files are required.
    pub fn parse(self) -> Result<Diff, ParseError> {
        let lines = Tokenizer::with_tab_mode(self.reader, self.options.tab_mode);
        assemble(lines, self.options)
    }
}

/// Parse a diff from any reader with default options.
///
/// # Errors
///
/// See [`DiffParser::parse`].
pub fn parse<R: Read>(reader: R) -> Result<Diff, ParseError> {
    DiffParser::new(BufReader::new(reader)).parse()
}

/// Parse a diff held in memory with default options.
///
/// # Errors
///
/// See [`DiffParser::parse`].
pub fn parse_str(text: &str) -> Result<Diff, ParseError> {
    DiffParser::new(text.as_bytes()).parse()
}

/// Build a diff from lines that were already tokenized.
///
/// # Errors
///
/// Returns [`StructuralError`] or [`MalformedLineError`] variants of
/// [`ParseError`] for the first offending line.
pub fn parse_lines<I>(lines: I) -> Result<Diff, ParseError>
where
    I: IntoIterator<Item = Line>,
{
    assemble(lines.into_iter().map(Ok), ParseOptions::default())
}

fn assemble<I>(lines: I, options: ParseOptions) -> Result<Diff, ParseError>
where
    I: Iterator<Item = io::Result<Line>>,
{
    let mut builder = DiffBuilder::new();
    for line in lines {
        builder.push(line?)?;
    }

    let diff = builder.finish();
    if options.require_files && diff.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    debug!("parsed {} file(s)", diff.len());
    Ok(diff)
}
