use super::hunk::Chunk;
use nom::bytes::complete::tag;
use nom::character::complete::{digit1, hex_digit1, space1};
use nom::combinator::{all_consuming, map, opt};
use nom::sequence::preceded;
use nom::{IResult, Parser};

/// Decoded `index` line: blob ids before and after, plus the file mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexLine<'a> {
    /// Abbreviated blob id of the old side
    pub old: &'a str,
    /// Abbreviated blob id of the new side
    pub new: &'a str,
    /// File mode, absent when the mode changed or the file was added/deleted
    pub mode: Option<&'a str>,
}

impl<'a> IndexLine<'a> {
    /// Decode `<hex>..<hex>[ <mode>]`.
    ///
    /// ```
    /// use diffparser::IndexLine;
    ///
    /// let index = IndexLine::parse("e69de29..4b825dc 100644").unwrap();
    /// assert_eq!(index.old, "e69de29");
    /// assert_eq!(index.new, "4b825dc");
    /// assert_eq!(index.mode, Some("100644"));
    /// ```
    #[must_use]
    pub fn parse(metadata: &'a str) -> Option<Self> {
        let (_, index) = all_consuming(index_line).parse(metadata).ok()?;
        Some(index)
    }
}

fn index_line(input: &str) -> IResult<&str, IndexLine<'_>> {
    map(
        (
            hex_digit1,
            tag(".."),
            hex_digit1,
            opt(preceded(space1, digit1)),
        ),
        |(old, _, new, mode)| IndexLine { old, new, mode },
    )
    .parse(input)
}

/// All hunks for one changed file, opened by a `diff --git` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffChunk {
    pub(crate) file_in: String,
    pub(crate) file_out: String,
    pub(crate) metadata: Option<String>,
    pub(crate) chunks: Vec<Chunk>,
}

impl DiffChunk {
    pub(crate) fn new(file_in: String, file_out: String) -> Self {
        Self {
            file_in,
            file_out,
            metadata: None,
            chunks: Vec::new(),
        }
    }

    /// Path on the old side, as written in the header (e.g. `a/foo.go`)
    pub fn file_in(&self) -> &str {
        &self.file_in
    }

    /// Path on the new side, as written in the header (e.g. `b/foo.go`)
    pub fn file_out(&self) -> &str {
        &self.file_out
    }

    /// Everything after `index`, joined with single spaces
    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }

    /// The `index` line decoded, if present and well formed
    pub fn index(&self) -> Option<IndexLine<'_>> {
        self.metadata.as_deref().and_then(IndexLine::parse)
    }

    /// Hunks in input order
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Number of added lines across all hunks
    pub fn added_count(&self) -> usize {
        self.chunks.iter().map(|chunk| chunk.added().len()).sum()
    }

    /// Number of removed lines across all hunks
    pub fn removed_count(&self) -> usize {
        self.chunks.iter().map(|chunk| chunk.removed().len()).sum()
    }
}
