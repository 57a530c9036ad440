//! Text splitters used by ingestion.
//!
//! - [`RecursiveSplitter`]: sliding character window with overlap that prefers
//!   to cut at paragraph, then line, then word boundaries.
//! - [`split_markdown`]: ATX heading splitter (levels 1-4) producing
//!   header-scoped segments.
//!
//! Both work on byte spans of the input so that every window can be traced
//! back to its exact position in the source file. Sizes are counted in
//! characters.
use std::collections::VecDeque;
use thiserror::Error;

use crate::types::HeaderPath;

/// Paragraph, line, word, then raw character boundary.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

pub const MAX_HEADER_LEVEL: usize = 4;

/// Half-open byte range `[start, end)` into the text that was split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }

    fn shifted(self, by: usize) -> Self {
        Self { start: self.start + by, end: self.end + by }
    }
}

#[derive(Debug, Clone, Copy)]
struct Piece {
    start: usize,
    end: usize,
    chars: usize,
}

#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Windows over `text`, in order. Consecutive windows share at most
    /// `chunk_overlap` characters and together cover `text` without gaps.
    pub fn split_spans(&self, text: &str) -> Vec<Span> {
        if text.is_empty() {
            return Vec::new();
        }
        let mut pieces = Vec::new();
        self.collect_pieces(text, 0, &self.separators, &mut pieces);
        self.merge(&pieces)
    }

    pub fn split_text<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.split_spans(text).into_iter().map(|s| s.slice(text)).collect()
    }

    /// Break `text` (which starts at byte `offset` of the full input) into
    /// pieces no longer than `chunk_size` characters.
    fn collect_pieces(&self, text: &str, offset: usize, separators: &[String], out: &mut Vec<Piece>) {
        let chars = text.chars().count();
        if chars <= self.chunk_size {
            out.push(Piece { start: offset, end: offset + text.len(), chars });
            return;
        }
        match separators.split_first() {
            Some((sep, rest)) if !sep.is_empty() => {
                if !text.contains(sep.as_str()) {
                    self.collect_pieces(text, offset, rest, out);
                    return;
                }
                for (start, part) in split_keeping_separator(text, sep) {
                    self.collect_pieces(part, offset + start, rest, out);
                }
            }
            _ => {
                for (i, c) in text.char_indices() {
                    out.push(Piece { start: offset + i, end: offset + i + c.len_utf8(), chars: 1 });
                }
            }
        }
    }

    fn merge(&self, pieces: &[Piece]) -> Vec<Span> {
        let mut spans = Vec::new();
        let mut window: VecDeque<Piece> = VecDeque::new();
        let mut window_chars = 0usize;
        for &piece in pieces {
            if !window.is_empty() && window_chars + piece.chars > self.chunk_size {
                spans.push(window_span(&window));
                // keep a tail of at most `chunk_overlap` chars that still leaves room for `piece`
                while let Some(front) = window.front() {
                    if window_chars > self.chunk_overlap || window_chars + piece.chars > self.chunk_size {
                        window_chars -= front.chars;
                        window.pop_front();
                    } else {
                        break;
                    }
                }
            }
            window_chars += piece.chars;
            window.push_back(piece);
        }
        if !window.is_empty() {
            spans.push(window_span(&window));
        }
        spans
    }
}

fn window_span(window: &VecDeque<Piece>) -> Span {
    match (window.front(), window.back()) {
        (Some(first), Some(last)) => Span { start: first.start, end: last.end },
        _ => Span { start: 0, end: 0 },
    }
}

/// Split at `separator`, keeping it attached to the preceding part.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<(usize, &'a str)> {
    let mut parts = Vec::new();
    let mut start = 0;
    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        parts.push((start, &text[start..end]));
        start = end;
    }
    if start < text.len() {
        parts.push((start, &text[start..]));
    }
    parts
}

/// A header-scoped section of a markdown document. The heading line itself is
/// part of `span`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub span: Span,
    pub headers: HeaderPath,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HeaderSplitError {
    #[error("code fence opened on line {line} is never closed")]
    UnterminatedFence { line: usize },
    #[error("front matter opened on line 1 is never closed")]
    UnterminatedFrontMatter,
}

/// Result of heading-based splitting. `Fallback` means the caller should split
/// the whole file uniformly and attach no header metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitOutcome {
    Structured(Vec<Segment>),
    Fallback(HeaderSplitError),
}

impl SplitOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, SplitOutcome::Fallback(_))
    }
}

pub fn split_markdown(text: &str) -> SplitOutcome {
    match split_headers(text) {
        Ok(segments) => SplitOutcome::Structured(segments),
        Err(e) => SplitOutcome::Fallback(e),
    }
}

struct Fence {
    marker: char,
    len: usize,
    line: usize,
}

fn fence_marker(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start();
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == marker).count();
    (len >= 3).then_some((marker, len))
}

/// `Some((level, text))` for an ATX heading of level 1..=4. At most three
/// leading spaces; deeper indentation is an indented code block.
fn heading(line: &str) -> Option<(usize, String)> {
    let unindented = line.trim_start_matches(' ');
    if line.len() - unindented.len() > 3 {
        return None;
    }
    let trimmed = unindented.trim_end();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > MAX_HEADER_LEVEL {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    Some((level, rest.trim().to_string()))
}

/// Split on headings `#` through `####`, outside fenced code and front matter.
///
/// Segments are contiguous and cover the whole input. A whitespace-only
/// preamble is folded into the first heading's segment.
pub fn split_headers(text: &str) -> Result<Vec<Segment>, HeaderSplitError> {
    let mut segments = Vec::new();
    let mut headers = HeaderPath::default();
    let mut seg_start = 0usize;
    let mut fence: Option<Fence> = None;
    let mut in_front_matter = false;
    let mut offset = 0usize;

    for (idx, line) in text.split_inclusive('\n').enumerate() {
        let line_no = idx + 1;
        let line_start = offset;
        offset += line.len();
        let content = line.trim_end_matches(['\n', '\r']);

        if idx == 0 && content.trim_end() == "---" {
            in_front_matter = true;
            continue;
        }
        if in_front_matter {
            let t = content.trim_end();
            if t == "---" || t == "..." {
                in_front_matter = false;
            }
            continue;
        }
        if let Some(open) = &fence {
            if let Some((marker, len)) = fence_marker(content) {
                let rest = content.trim_start().trim_start_matches(marker);
                if marker == open.marker && len >= open.len && rest.trim().is_empty() {
                    fence = None;
                }
            }
            continue;
        }
        if let Some((marker, len)) = fence_marker(content) {
            fence = Some(Fence { marker, len, line: line_no });
            continue;
        }
        let Some((level, title)) = heading(content) else { continue };

        let preamble_blank = segments.is_empty() && headers.is_empty() && text[seg_start..line_start].trim().is_empty();
        if line_start > seg_start && !preamble_blank {
            segments.push(Segment { span: Span { start: seg_start, end: line_start }, headers: headers.clone() });
            seg_start = line_start;
        }
        headers.enter(level, title);
    }

    if let Some(open) = fence {
        return Err(HeaderSplitError::UnterminatedFence { line: open.line });
    }
    if in_front_matter {
        return Err(HeaderSplitError::UnterminatedFrontMatter);
    }
    if seg_start < text.len() {
        segments.push(Segment { span: Span { start: seg_start, end: text.len() }, headers });
    }
    Ok(segments)
}

/// A window over the source file together with the headers it falls under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub span: Span,
    pub headers: HeaderPath,
}

/// Re-split every segment with `splitter`, keeping each window inside its
/// segment. Spans are relative to the original text.
pub fn resplit_segments(text: &str, segments: &[Segment], splitter: &RecursiveSplitter) -> Vec<Window> {
    segments
        .iter()
        .flat_map(|seg| {
            splitter
                .split_spans(seg.span.slice(text))
                .into_iter()
                .map(move |s| Window { span: s.shifted(seg.span.start), headers: seg.headers.clone() })
        })
        .collect()
}

/// Converts monotonically increasing byte offsets into character offsets.
pub(crate) struct CharCursor<'a> {
    text: &'a str,
    byte: usize,
    chars: usize,
}

impl<'a> CharCursor<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self { text, byte: 0, chars: 0 }
    }

    pub(crate) fn chars_at(&mut self, byte: usize) -> usize {
        if byte < self.byte {
            return self.text[..byte].chars().count();
        }
        self.chars += self.text[self.byte..byte].chars().count();
        self.byte = byte;
        self.chars
    }
}
