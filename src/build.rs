//! Folding tokenized lines into a [`Diff`] tree.
//!
//! [`DiffBuilder`] keeps two cursors, the file opened by the last
//! `diff --git` header and the hunk opened by the last `@@` header, and
//! dispatches every line on its first word:
//!
//! | First word        | Kind                     | Needs         |
//! |-------------------|--------------------------|---------------|
//! | `diff` `--git`    | [`LineKind::FileHeader`] | 4 words       |
//! | `index`           | [`LineKind::Index`]      | open file     |
//! | `---` / `+++`     | [`LineKind::FileMarker`] | no open hunk  |
//! | `@@`              | [`LineKind::HunkHeader`] | open file     |
//! | `-...`            | [`LineKind::Removed`]    | open hunk     |
//! | `+...`            | [`LineKind::Added`]      | open hunk     |
//! | `\...`            | [`LineKind::NoNewline`]  | nothing       |
//! | anything else     | [`LineKind::Ignored`]    | nothing       |
//!
//! Git only prints the `---`/`+++` markers before the first `@@` of a file,
//! so once a hunk is open they are removed/added lines whose content starts
//! with `--` or `++`.
//!
//! The first line that lacks its context or its required words stops the
//! build with an error.

use crate::diff::{Chunk, Diff, DiffChunk};
use crate::tokenize::Line;
use crate::{MalformedLineError, ParseError, StructuralError};
use log::{debug, trace};
use std::fmt;

/// Why a line was skipped without changing the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredLine {
    /// Unchanged line inside a hunk (starts with a space)
    Context,
    /// Empty line
    Blank,
    /// Git extended header such as `new file mode` or `rename from`
    ExtendedHeader,
    /// Anything not covered by another kind
    Unrecognized,
}

impl fmt::Display for IgnoredLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IgnoredLine::Context => "context",
            IgnoredLine::Blank => "blank",
            IgnoredLine::ExtendedHeader => "extended header",
            IgnoredLine::Unrecognized => "unrecognized",
        })
    }
}

/// Classification of a single diff line by its first word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `diff --git <file_in> <file_out>`
    FileHeader,
    /// `index <metadata...>`
    Index,
    /// `--- <path>` or `+++ <path>`
    FileMarker,
    /// `@@ <old_range> <new_range> @@ [heading]`
    HunkHeader,
    /// `-<content>`
    Removed,
    /// `+<content>`
    Added,
    /// `\ No newline at end of file`
    NoNewline,
    Ignored(IgnoredLine),
}

impl LineKind {
    /// Git extended header keywords that may sit between `diff --git` and `---`
    const EXTENDED_HEADERS: [&'static str; 7] = [
        "old",
        "new",
        "deleted",
        "similarity",
        "dissimilarity",
        "rename",
        "copy",
    ];

    /// Classify a tokenized line. `hunk_open` tells whether an `@@` header
    /// is in effect for the current file.
    ///
    /// ```
    /// use diffparser::build::{IgnoredLine, LineKind};
    ///
    /// let words = |text: &str| text.split(' ').map(String::from).collect::<Vec<_>>();
    /// assert_eq!(LineKind::classify(&words("@@ -1 +1 @@"), false), LineKind::HunkHeader);
    /// assert_eq!(LineKind::classify(&words("+added"), true), LineKind::Added);
    /// assert_eq!(LineKind::classify(&words("+++ b/foo"), false), LineKind::FileMarker);
    /// assert_eq!(LineKind::classify(&words("+++ counter"), true), LineKind::Added);
    /// assert_eq!(
    ///     LineKind::classify(&words(" context"), true),
    ///     LineKind::Ignored(IgnoredLine::Context)
    /// );
    /// ```
    pub fn classify(words: &[String], hunk_open: bool) -> Self {
        let Some(first) = words.first() else {
            return LineKind::Ignored(IgnoredLine::Blank);
        };

        match first.as_str() {
            "diff" if words.get(1).is_some_and(|word| word == "--git") => LineKind::FileHeader,
            "index" => LineKind::Index,
            "---" if hunk_open => LineKind::Removed,
            "+++" if hunk_open => LineKind::Added,
            "---" | "+++" => LineKind::FileMarker,
            "@@" => LineKind::HunkHeader,
            "" if words.len() == 1 => LineKind::Ignored(IgnoredLine::Blank),
            "" => LineKind::Ignored(IgnoredLine::Context),
            word if Self::EXTENDED_HEADERS.contains(&word) => {
                LineKind::Ignored(IgnoredLine::ExtendedHeader)
            }
            word if word.starts_with('-') => LineKind::Removed,
            word if word.starts_with('+') => LineKind::Added,
            word if word.starts_with('\\') => LineKind::NoNewline,
            _ => LineKind::Ignored(IgnoredLine::Unrecognized),
        }
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineKind::FileHeader => f.write_str("`diff --git`"),
            LineKind::Index => f.write_str("`index`"),
            LineKind::FileMarker => f.write_str("`---`/`+++`"),
            LineKind::HunkHeader => f.write_str("`@@`"),
            LineKind::Removed => f.write_str("removed `-`"),
            LineKind::Added => f.write_str("added `+`"),
            LineKind::NoNewline => f.write_str("no-newline marker"),
            LineKind::Ignored(reason) => write!(f, "ignored {reason}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Old,
    New,
}

impl Side {
    fn sign(self) -> char {
        match self {
            Side::Old => '-',
            Side::New => '+',
        }
    }
}

/// Incremental builder for a [`Diff`].
///
/// Feed lines in input order with [`push`](Self::push), then take the tree
/// with [`finish`](Self::finish).
///
/// ```
/// use diffparser::build::DiffBuilder;
/// use diffparser::tokenize::tokenize;
///
/// let text = "diff --git a/x b/x\n@@ -1 +1 @@\n-old\n+new\n";
/// let mut builder = DiffBuilder::new();
/// for line in tokenize(text.as_bytes()) {
///     builder.push(line.unwrap()).unwrap();
/// }
/// let diff = builder.finish();
/// assert_eq!(diff.files()[0].chunks()[0].added(), [vec!["new".to_string()]]);
/// ```
#[derive(Debug, Default)]
pub struct DiffBuilder {
    diff: Diff,
    current_file: Option<usize>,
    current_chunk: Option<usize>,
    /// Side of the last `-`/`+` line in the current hunk, for `\` markers
    last_change: Option<Side>,
}

impl DiffBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `line` and apply it to the tree.
    ///
    /// # Errors
    ///
    /// - [`StructuralError`] if the line needs an open file or hunk that
    ///   does not exist
    /// - [`MalformedLineError`] if a header line lacks required words
    pub fn push(&mut self, line: Line) -> Result<(), ParseError> {
        match LineKind::classify(line.words(), self.current_chunk.is_some()) {
            LineKind::FileHeader => self.open_file(line)?,
            LineKind::Index => self.set_metadata(line)?,
            // Paths are already known from the `diff --git` header
            LineKind::FileMarker => {}
            LineKind::HunkHeader => self.open_chunk(line)?,
            LineKind::Removed => self.push_change(line, Side::Old)?,
            LineKind::Added => self.push_change(line, Side::New)?,
            LineKind::NoNewline => self.mark_missing_newline(&line),
            LineKind::Ignored(reason) => {
                trace!("line {}: skipping {reason} line", line.number());
                self.last_change = None;
            }
        }
        Ok(())
    }

    /// Hand out the completed tree
    pub fn finish(self) -> Diff {
        self.diff
    }

    fn open_file(&mut self, line: Line) -> Result<(), MalformedLineError> {
        let number = line.number();
        let found = line.words().len();

        let mut words = line.into_words().into_iter().skip(2);
        let (Some(file_in), Some(file_out)) = (words.next(), words.next()) else {
            return Err(missing_words(number, LineKind::FileHeader, 4, found));
        };
        if file_in.is_empty() || file_out.is_empty() {
            return Err(MalformedLineError::EmptyPath {
                line_number: number,
            });
        }

        debug!("line {number}: file {file_in} -> {file_out}");
        self.diff.files.push(DiffChunk::new(file_in, file_out));
        self.current_file = Some(self.diff.files.len() - 1);
        self.current_chunk = None;
        self.last_change = None;
        Ok(())
    }

    fn set_metadata(&mut self, line: Line) -> Result<(), ParseError> {
        require_words(&line, LineKind::Index, 2)?;
        let file = self.current_file_mut(line.number(), LineKind::Index)?;
        file.metadata = Some(line.words()[1..].join(" "));
        Ok(())
    }

    fn open_chunk(&mut self, line: Line) -> Result<(), ParseError> {
        let number = line.number();
        let found = line.words().len();

        let words = line.into_words();
        let heading = match words.get(3..) {
            Some([close, rest @ ..]) if close == "@@" && rest.iter().any(|word| !word.is_empty()) => {
                Some(rest.join(" "))
            }
            _ => None,
        };
        let mut words = words.into_iter().skip(1);
        let (Some(old_range), Some(new_range)) = (words.next(), words.next()) else {
            return Err(missing_words(number, LineKind::HunkHeader, 3, found).into());
        };

        let file = self.current_file_mut(number, LineKind::HunkHeader)?;
        debug!("line {number}: hunk {old_range} {new_range}");
        file.chunks.push(Chunk::new(old_range, new_range, heading));
        let index = file.chunks.len() - 1;
        self.current_chunk = Some(index);
        self.last_change = None;
        Ok(())
    }

    fn push_change(&mut self, line: Line, side: Side) -> Result<(), StructuralError> {
        let kind = match side {
            Side::Old => LineKind::Removed,
            Side::New => LineKind::Added,
        };
        let chunk = self.current_chunk_mut().ok_or(StructuralError::MissingHunkHeader {
            line_number: line.number(),
            kind,
        })?;

        let mut words = line.into_words();
        if let Some(first) = words.first_mut()
            && let Some(rest) = first.strip_prefix(side.sign())
        {
            *first = rest.to_string();
        }

        match side {
            Side::Old => chunk.removed.push(words),
            Side::New => chunk.added.push(words),
        }
        self.last_change = Some(side);
        Ok(())
    }

    fn mark_missing_newline(&mut self, line: &Line) {
        let side = self.last_change;
        match (self.current_chunk_mut(), side) {
            (Some(chunk), Some(Side::Old)) => chunk.old_missing_final_newline = true,
            (Some(chunk), Some(Side::New)) => chunk.new_missing_final_newline = true,
            _ => trace!(
                "line {}: no-newline marker without a preceding change line",
                line.number()
            ),
        }
    }

    fn current_file_mut(
        &mut self,
        line_number: usize,
        kind: LineKind,
    ) -> Result<&mut DiffChunk, StructuralError> {
        let missing = StructuralError::MissingFileHeader { line_number, kind };
        match self.current_file {
            Some(index) => self.diff.files.get_mut(index).ok_or(missing),
            None => Err(missing),
        }
    }

    fn current_chunk_mut(&mut self) -> Option<&mut Chunk> {
        let file = self.diff.files.get_mut(self.current_file?)?;
        file.chunks.get_mut(self.current_chunk?)
    }
}

fn missing_words(
    line_number: usize,
    kind: LineKind,
    expected: usize,
    found: usize,
) -> MalformedLineError {
    MalformedLineError::MissingTokens {
        line_number,
        kind,
        expected,
        found,
    }
}

fn require_words(line: &Line, kind: LineKind, expected: usize) -> Result<(), MalformedLineError> {
    let found = line.words().len();
    if found < expected {
        return Err(missing_words(line.number(), kind, expected, found));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tokenize::tokenize;
    use similar_asserts::assert_eq;

    fn build(text: &str) -> Result<Diff, ParseError> {
        let mut builder = DiffBuilder::new();
        for line in tokenize(text.as_bytes()) {
            builder.push(line.unwrap())?;
        }
        Ok(builder.finish())
    }

    fn words(text: &str) -> Vec<String> {
        text.split(' ').map(String::from).collect()
    }

    #[test]
    fn classify_header_lines() {
        assert_eq!(
            LineKind::classify(&words("diff --git a/x b/x"), false),
            LineKind::FileHeader
        );
        assert_eq!(LineKind::classify(&words("index 1..2"), false), LineKind::Index);
        assert_eq!(LineKind::classify(&words("--- a/x"), false), LineKind::FileMarker);
        assert_eq!(LineKind::classify(&words("+++ /dev/null"), false), LineKind::FileMarker);
        assert_eq!(LineKind::classify(&words("@@ -1 +1 @@"), false), LineKind::HunkHeader);
    }

    #[test]
    fn classify_change_lines() {
        assert_eq!(LineKind::classify(&words("-"), false), LineKind::Removed);
        assert_eq!(LineKind::classify(&words("-gone"), false), LineKind::Removed);
        assert_eq!(LineKind::classify(&words("+"), false), LineKind::Added);
        assert_eq!(LineKind::classify(&words("+++counter;"), false), LineKind::Added);
        assert_eq!(LineKind::classify(&words("--- a/x"), true), LineKind::Removed);
        assert_eq!(LineKind::classify(&words("+++ b/x"), true), LineKind::Added);
        assert_eq!(
            LineKind::classify(&words("\\ No newline at end of file"), false),
            LineKind::NoNewline
        );
    }

    #[test]
    fn classify_ignored_lines() {
        assert_eq!(
            LineKind::classify(&words(""), false),
            LineKind::Ignored(IgnoredLine::Blank)
        );
        assert_eq!(LineKind::classify(&[], false), LineKind::Ignored(IgnoredLine::Blank));
        assert_eq!(
            LineKind::classify(&words(" unchanged"), false),
            LineKind::Ignored(IgnoredLine::Context)
        );
        assert_eq!(
            LineKind::classify(&words("new file mode 100644"), false),
            LineKind::Ignored(IgnoredLine::ExtendedHeader)
        );
        assert_eq!(
            LineKind::classify(&words("rename from old.rs"), false),
            LineKind::Ignored(IgnoredLine::ExtendedHeader)
        );
        assert_eq!(
            LineKind::classify(&words("diff --cc merged.rs"), false),
            LineKind::Ignored(IgnoredLine::Unrecognized)
        );
        assert_eq!(
            LineKind::classify(&words("Binary files a/x and b/x differ"), false),
            LineKind::Ignored(IgnoredLine::Unrecognized)
        );
    }

    #[test]
    fn kind_display() {
        assert_eq!(LineKind::HunkHeader.to_string(), "`@@`");
        assert_eq!(
            LineKind::Ignored(IgnoredLine::ExtendedHeader).to_string(),
            "ignored extended header"
        );
    }

    #[test]
    fn build_single_hunk() {
        let diff = build(
            "diff --git a/foo.go b/foo.go\n\
             index e69de29..4b825dc 100644\n\
             --- a/foo.go\n\
             +++ b/foo.go\n\
             @@ -0,0 +1,2 @@\n\
             +line one\n\
             +line two\n",
        )
        .unwrap();

        let file = &diff.files()[0];
        assert_eq!(file.file_in(), "a/foo.go");
        assert_eq!(file.file_out(), "b/foo.go");
        assert_eq!(file.metadata(), Some("e69de29..4b825dc 100644"));

        let chunk = &file.chunks()[0];
        assert_eq!(chunk.old_range(), "-0,0");
        assert_eq!(chunk.new_range(), "+1,2");
        assert!(chunk.removed().is_empty());
        assert_eq!(chunk.added(), [words("line one"), words("line two")]);
    }

    #[test]
    fn context_lines_are_skipped() {
        let diff = build(
            "diff --git a/x b/x\n\
             @@ -1,3 +1,3 @@\n \
             keep\n\
             -old\n\
             +new\n \
             keep too\n",
        )
        .unwrap();
        let chunk = &diff.files()[0].chunks()[0];
        assert_eq!(chunk.removed(), [words("old")]);
        assert_eq!(chunk.added(), [words("new")]);
    }

    #[test]
    fn hunk_heading_is_captured() {
        let diff = build("diff --git a/x b/x\n@@ -10,2 +10,3 @@ fn main() {\n").unwrap();
        assert_eq!(diff.files()[0].chunks()[0].heading(), Some("fn main() {"));
    }

    #[test]
    fn hunk_without_heading() {
        let diff = build("diff --git a/x b/x\n@@ -1 +1 @@\n@@ -5 +5\n").unwrap();
        let chunks = diff.files()[0].chunks();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].heading(), None);
        assert_eq!(chunks[1].heading(), None);
        assert_eq!(chunks[1].new_range(), "+5");
    }

    #[test]
    fn trailing_space_after_hunk_header_is_not_a_heading() {
        let diff = build("diff --git a/x b/x\n@@ -1 +1 @@ \n@@ -3 +3 @@  \n").unwrap();
        let chunks = diff.files()[0].chunks();
        assert_eq!(chunks[0].heading(), None);
        assert_eq!(chunks[1].heading(), None);
    }

    #[test]
    fn changed_line_keeps_inner_spacing() {
        let diff = build("diff --git a/x b/x\n@@ -1 +1 @@\n-  two  spaces\n+\n").unwrap();
        let chunk = &diff.files()[0].chunks()[0];
        assert_eq!(chunk.removed_text().collect::<Vec<_>>(), vec!["  two  spaces"]);
        assert_eq!(chunk.added(), [vec![String::new()]]);
    }

    #[test]
    fn file_markers_do_not_touch_the_tree() {
        let diff = build("diff --git a/x b/x\n--- /dev/null\n+++ b/x\n").unwrap();
        assert_eq!(diff.files()[0].file_in(), "a/x");
        assert!(diff.files()[0].chunks().is_empty());
    }

    #[test]
    fn marker_lookalikes_inside_hunk_are_changes() {
        let diff = build(
            "diff --git a/q.sql b/q.sql\n\
             --- a/q.sql\n\
             +++ b/q.sql\n\
             @@ -1,2 +1,2 @@\n\
             --- old comment\n\
             -select 1;\n\
             +++ new counter\n\
             +select 2;\n\
             diff --git a/r.sql b/r.sql\n\
             --- a/r.sql\n\
             +++ b/r.sql\n",
        )
        .unwrap();

        let chunk = &diff.files()[0].chunks()[0];
        assert_eq!(
            chunk.removed_text().collect::<Vec<_>>(),
            vec!["-- old comment", "select 1;"]
        );
        assert_eq!(
            chunk.added_text().collect::<Vec<_>>(),
            vec!["++ new counter", "select 2;"]
        );
        assert_eq!(chunk.old_span().map(|range| range.count as usize), Some(chunk.removed().len()));

        let next = &diff.files()[1];
        assert_eq!(next.file_out(), "b/r.sql");
        assert!(next.chunks().is_empty());
    }

    #[test]
    fn missing_newline_marks_last_side() {
        let diff = build(
            "diff --git a/x b/x\n\
             @@ -3 +3,2 @@\n\
             -no newline\n\
             \\ No newline at end of file\n\
             +no newline\n\
             +new line\n\
             \\ No newline at end of file\n",
        )
        .unwrap();
        let chunk = &diff.files()[0].chunks()[0];
        assert!(chunk.old_missing_final_newline());
        assert!(chunk.new_missing_final_newline());
    }

    #[test]
    fn missing_newline_after_context_is_ignored() {
        let diff = build(
            "diff --git a/x b/x\n\
             @@ -1,2 +1,2 @@\n\
             -a\n\
             +b\n \
             last\n\
             \\ No newline at end of file\n",
        )
        .unwrap();
        let chunk = &diff.files()[0].chunks()[0];
        assert!(!chunk.old_missing_final_newline());
        assert!(!chunk.new_missing_final_newline());
    }

    #[test]
    fn stray_missing_newline_marker_is_skipped() {
        let diff = build("\\ No newline at end of file\n").unwrap();
        assert!(diff.is_empty());
    }

    #[test]
    fn new_file_resets_hunk_cursor() {
        let result = build(
            "diff --git a/x b/x\n\
             @@ -1 +1 @@\n\
             +in x\n\
             diff --git a/y b/y\n\
             +orphan\n",
        );
        assert!(matches!(
            result,
            Err(ParseError::MissingHunkHeader {
                line_number: 5,
                kind: LineKind::Added
            })
        ));
    }

    #[test]
    fn removed_line_before_hunk() {
        let result = build("diff --git a/x b/x\n-orphan\n");
        assert!(matches!(
            result,
            Err(ParseError::MissingHunkHeader {
                line_number: 2,
                kind: LineKind::Removed
            })
        ));
    }

    #[test]
    fn hunk_before_file_header() {
        let result = build("@@ -1 +1 @@\n");
        assert!(matches!(
            result,
            Err(ParseError::MissingFileHeader {
                line_number: 1,
                kind: LineKind::HunkHeader
            })
        ));
    }

    #[test]
    fn index_before_file_header() {
        let result = build("index abc..def 100644\n");
        assert!(matches!(
            result,
            Err(ParseError::MissingFileHeader {
                line_number: 1,
                kind: LineKind::Index
            })
        ));
    }

    #[test]
    fn short_file_header() {
        let result = build("diff --git a/foo.go\n");
        assert!(matches!(
            result,
            Err(ParseError::MissingTokens {
                line_number: 1,
                kind: LineKind::FileHeader,
                expected: 4,
                found: 3
            })
        ));
    }

    #[test]
    fn empty_path_in_file_header() {
        let result = build("diff --git  b/x\n");
        assert!(matches!(
            result,
            Err(ParseError::EmptyPath { line_number: 1 })
        ));
    }

    #[test]
    fn short_hunk_header() {
        let result = build("diff --git a/x b/x\n@@ -1\n");
        assert!(matches!(
            result,
            Err(ParseError::MissingTokens {
                line_number: 2,
                kind: LineKind::HunkHeader,
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn bare_index_line() {
        let result = build("diff --git a/x b/x\nindex\n");
        assert!(matches!(
            result,
            Err(ParseError::MissingTokens {
                line_number: 2,
                kind: LineKind::Index,
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn malformed_line_is_reported_before_missing_context() {
        let result = build("@@ -1\n");
        assert!(matches!(result, Err(ParseError::MissingTokens { .. })));
    }

    #[test]
    fn error_messages() {
        let err = build("diff --git a/foo.go\n").unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"Line 1: `diff --git` line has 3 tokens, expected at least 4");

        let err = build("@@ -1 +1 @@\n").unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"Line 1: `@@` line before any `diff --git` header");

        let err = build("diff --git a/x b/x\n+early\n").unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"Line 2: added `+` line before any `@@` hunk header");
    }
}
