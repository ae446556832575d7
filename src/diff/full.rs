use super::file::DiffChunk;
use crate::ParseError;
use std::str::FromStr;

/// A complete git diff containing changes for multiple files.
///
/// Files appear in the order of their `diff --git` headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    pub(crate) files: Vec<DiffChunk>,
}

impl Diff {
    /// Changed files in input order
    pub fn files(&self) -> &[DiffChunk] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DiffChunk> {
        self.files.iter()
    }

    pub fn into_files(self) -> Vec<DiffChunk> {
        self.files
    }

    /// New-side path of every changed file
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(DiffChunk::file_out)
    }
}

impl<'a> IntoIterator for &'a Diff {
    type Item = &'a DiffChunk;
    type IntoIter = std::slice::Iter<'a, DiffChunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

impl FromStr for Diff {
    type Err = ParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        crate::parse_str(text)
    }
}
