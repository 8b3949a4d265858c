//! Source files and the source map.

use std::sync::Arc;

use super::FileId;

/// An immutable source file: name, full text, and precomputed line slices.
///
/// Line slices exclude their terminators and handle `\n`, `\r`, and `\r\n`
/// uniformly. The slices partition the text modulo terminators.
///
/// # Examples
///
/// ```
/// use mirac_util::span::SourceFile;
///
/// let file = SourceFile::new(0, "demo.mira", "mod demo {\n}\n");
/// assert_eq!(file.line(1), Some("mod demo {"));
/// assert_eq!(file.line(2), Some("}"));
/// ```
#[derive(Clone)]
pub struct SourceFile {
    id: FileId,
    name: String,
    content: Arc<str>,
    /// Byte ranges of each line, terminators excluded
    lines: Arc<[(usize, usize)]>,
}

impl SourceFile {
    pub fn new(id: usize, name: impl Into<String>, content: impl Into<Arc<str>>) -> Self {
        let content = content.into();
        let lines = Self::compute_lines(&content);
        Self {
            id: FileId(id),
            name: name.into(),
            content,
            lines,
        }
    }

    fn compute_lines(content: &str) -> Arc<[(usize, usize)]> {
        let bytes = content.as_bytes();
        let mut lines = Vec::new();
        let mut start = 0;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'\n' => {
                    lines.push((start, i));
                    i += 1;
                    start = i;
                }
                b'\r' => {
                    lines.push((start, i));
                    // \r\n counts as a single terminator
                    i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                    start = i;
                }
                _ => i += 1,
            }
        }

        if start < bytes.len() {
            lines.push((start, bytes.len()));
        }

        lines.into()
    }

    #[inline]
    pub fn id(&self) -> FileId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Number of lines in the file.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Fetch line `line` (1-based) as a borrowed slice, without its
    /// terminator. Returns `None` if the line number is out of range.
    pub fn line(&self, line: usize) -> Option<&str> {
        let (start, end) = *self.lines.get(line.checked_sub(1)?)?;
        Some(&self.content[start..end])
    }

    /// Byte offset at which line `line` (1-based) starts.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.lines.get(line.checked_sub(1)?).map(|&(start, _)| start)
    }
}

impl std::fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("line_count", &self.line_count())
            .finish()
    }
}

/// Registry of all source files in a compilation.
///
/// # Examples
///
/// ```
/// use mirac_util::span::SourceMap;
///
/// let mut map = SourceMap::new();
/// let id = map.add_file("main.mira", "mod m {}");
/// assert_eq!(map.get(id).unwrap().name(), "main.mira");
/// ```
#[derive(Default)]
pub struct SourceMap {
    files: Vec<Arc<SourceFile>>,
}

impl SourceMap {
    #[inline]
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Add a source file, returning its [`FileId`].
    pub fn add_file(&mut self, name: impl Into<String>, content: impl Into<Arc<str>>) -> FileId {
        let id = self.files.len();
        let file = SourceFile::new(id, name, content);
        let file_id = file.id();
        self.files.push(Arc::new(file));
        file_id
    }

    #[inline]
    pub fn get(&self, id: FileId) -> Option<Arc<SourceFile>> {
        self.files.get(id.0).cloned()
    }

    #[inline]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}
