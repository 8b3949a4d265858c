//! Source location tracking.
//!
//! A [`SourceLocation`] describes the extent of a token or AST node:
//! a half-open byte range into the file, plus 1-based start/end line and
//! column for human-readable output. Locations can be merged into a
//! covering span, which is how the parser builds node spans out of the
//! first and last consumed token.

mod source_map;

pub use source_map::{SourceFile, SourceMap};

/// A unique identifier for a source file.
///
/// FileIds are assigned sequentially as files are added to the [`SourceMap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub usize);

impl FileId {
    #[inline]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn index(&self) -> usize {
        self.0
    }

    /// A dummy FileId for testing.
    pub const DUMMY: FileId = FileId(0);
}

impl Default for FileId {
    #[inline]
    fn default() -> Self {
        Self::DUMMY
    }
}

/// A source extent.
///
/// `start..end` is a half-open byte range: for any token, the slice of the
/// source between `start` and `end` is exactly the lexeme. Lines and
/// columns are 1-based and inclusive of the first and last character.
///
/// Invalid locations carry sentinel values and are skipped by diagnostic
/// rendering.
///
/// # Examples
///
/// ```
/// use mirac_util::span::{FileId, SourceLocation};
///
/// let kw = SourceLocation::new(FileId(0), 0, 3, 1, 1, 1, 3);
/// let name = SourceLocation::new(FileId(0), 4, 8, 1, 1, 5, 8);
/// let merged = kw.merge(name);
/// assert_eq!(merged.start, 0);
/// assert_eq!(merged.end, 8);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceLocation {
    /// File the span points into
    pub file: FileId,
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
    /// Line of the first character (1-based)
    pub start_line: u32,
    /// Line of the last character (1-based)
    pub end_line: u32,
    /// Column of the first character (1-based)
    pub start_column: u32,
    /// Column of the last character (1-based)
    pub end_column: u32,
    valid: bool,
}

impl SourceLocation {
    /// The invalid location. Does not participate in diagnostics.
    pub const INVALID: SourceLocation = SourceLocation {
        file: FileId(0),
        start: 0,
        end: 0,
        start_line: 0,
        end_line: 0,
        start_column: 0,
        end_column: 0,
        valid: false,
    };

    #[allow(clippy::too_many_arguments)]
    #[inline]
    pub fn new(
        file: FileId,
        start: usize,
        end: usize,
        start_line: u32,
        end_line: u32,
        start_column: u32,
        end_column: u32,
    ) -> Self {
        Self {
            file,
            start,
            end,
            start_line,
            end_line,
            start_column,
            end_column,
            valid: true,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Length of the span in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Merge two locations into a covering span.
    ///
    /// The result takes its file and start fields from `self` and its end
    /// fields from `other`. Merging with an invalid location yields the
    /// invalid location.
    #[must_use]
    pub fn merge(self, other: SourceLocation) -> SourceLocation {
        if !self.valid || !other.valid {
            return SourceLocation::INVALID;
        }

        SourceLocation {
            file: self.file,
            start: self.start,
            end: other.end,
            start_line: self.start_line,
            end_line: other.end_line,
            start_column: self.start_column,
            end_column: other.end_column,
            valid: true,
        }
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::INVALID
    }
}
