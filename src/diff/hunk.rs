use nom::character::complete::{char, u32 as decimal};
use nom::combinator::{all_consuming, map, opt};
use nom::sequence::preceded;
use nom::{IResult, Parser};

/// Decoded `start,count` pair from a hunk header range token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkRange {
    pub start: u32,
    /// Number of lines covered; git omits it when it is 1
    pub count: u32,
}

impl HunkRange {
    /// Decode a range token such as `-12,4` or `+7`, where `sign` is the
    /// expected leading character.
    ///
    /// ```
    /// use diffparser::HunkRange;
    ///
    /// assert_eq!(HunkRange::parse("-12,4", '-'), Some(HunkRange { start: 12, count: 4 }));
    /// assert_eq!(HunkRange::parse("+7", '+'), Some(HunkRange { start: 7, count: 1 }));
    /// assert_eq!(HunkRange::parse("+7", '-'), None);
    /// ```
    #[must_use]
    pub fn parse(token: &str, sign: char) -> Option<Self> {
        let (_, range) = all_consuming(preceded(char(sign), range_body))
            .parse(token)
            .ok()?;
        Some(range)
    }

    /// Whether this range covers no lines (pure insertion or deletion side)
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

fn range_body(input: &str) -> IResult<&str, HunkRange> {
    map(
        (decimal, opt(preceded(char(','), decimal))),
        |(start, count)| HunkRange {
            start,
            count: count.unwrap_or(1),
        },
    )
    .parse(input)
}

/// A single hunk from a git diff.
///
/// Range tokens are kept exactly as written in the `@@` header. Changed lines
/// are kept as word lists with the leading `-`/`+` removed, so `+line one`
/// is stored as `["line", "one"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    pub(crate) old_range: String,
    pub(crate) new_range: String,
    pub(crate) heading: Option<String>,
    pub(crate) removed: Vec<Vec<String>>,
    pub(crate) added: Vec<Vec<String>>,
    pub(crate) old_missing_final_newline: bool,
    pub(crate) new_missing_final_newline: bool,
}

impl Chunk {
    pub(crate) fn new(old_range: String, new_range: String, heading: Option<String>) -> Self {
        Self {
            old_range,
            new_range,
            heading,
            ..Self::default()
        }
    }

    /// Raw old-side range token, including its `-` sign
    pub fn old_range(&self) -> &str {
        &self.old_range
    }

    /// Raw new-side range token, including its `+` sign
    pub fn new_range(&self) -> &str {
        &self.new_range
    }

    /// Decoded old-side range, `None` if the token is not `-start[,count]`
    pub fn old_span(&self) -> Option<HunkRange> {
        HunkRange::parse(&self.old_range, '-')
    }

    /// Decoded new-side range, `None` if the token is not `+start[,count]`
    pub fn new_span(&self) -> Option<HunkRange> {
        HunkRange::parse(&self.new_range, '+')
    }

    /// Function context git prints after the closing `@@`
    pub fn heading(&self) -> Option<&str> {
        self.heading.as_deref()
    }

    pub fn removed(&self) -> &[Vec<String>] {
        &self.removed
    }

    pub fn added(&self) -> &[Vec<String>] {
        &self.added
    }

    /// Removed lines as text
    pub fn removed_text(&self) -> impl Iterator<Item = String> + '_ {
        self.removed.iter().map(|words| words.join(" "))
    }

    /// Added lines as text
    pub fn added_text(&self) -> impl Iterator<Item = String> + '_ {
        self.added.iter().map(|words| words.join(" "))
    }

    /// Whether the last removed line had no trailing newline in the old file
    pub fn old_missing_final_newline(&self) -> bool {
        self.old_missing_final_newline
    }

    /// Whether the last added line has no trailing newline in the new file
    pub fn new_missing_final_newline(&self) -> bool {
        self.new_missing_final_newline
    }
}
