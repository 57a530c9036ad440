//! Domain types shared by the ingestion and retrieval sides.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub type ChunkId = String;

/// Kind of source file, decided purely by extension.
///
/// The label (`as_str`) is what gets persisted in the `file_type` column and
/// shown in the `[Source: … | Type: …]` context header.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileType {
    Markdown,
    R,
    RMarkdown,
    Quarto,
}

impl FileType {
    /// Processing order used by ingestion.
    pub const ALL: [FileType; 4] = [FileType::Markdown, FileType::R, FileType::RMarkdown, FileType::Quarto];

    /// Case-sensitive extension match: `.r` or `.MD` are not picked up.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str())? {
            "md" => Some(FileType::Markdown),
            "R" => Some(FileType::R),
            "Rmd" => Some(FileType::RMarkdown),
            "qmd" => Some(FileType::Quarto),
            _ => None,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == label)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileType::Markdown => "markdown",
            FileType::R => "R",
            FileType::RMarkdown => "Rmd",
            FileType::Quarto => "qmd",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            FileType::Markdown => "md",
            FileType::R => "R",
            FileType::RMarkdown => "Rmd",
            FileType::Quarto => "qmd",
        }
    }

    /// Human readable group name for progress output.
    pub fn display_name(self) -> &'static str {
        match self {
            FileType::Markdown => "markdown",
            FileType::R => "R",
            FileType::RMarkdown => "R Markdown",
            FileType::Quarto => "Quarto",
        }
    }

    pub fn is_markdown_family(self) -> bool {
        !matches!(self, FileType::R)
    }

    /// Language tag attached to code chunks.
    pub fn language(self) -> Option<&'static str> {
        match self {
            FileType::R => Some("R"),
            _ => None,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Heading texts for levels 1..=4 enclosing a chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeaderPath {
    pub header1: Option<String>,
    pub header2: Option<String>,
    pub header3: Option<String>,
    pub header4: Option<String>,
}

impl HeaderPath {
    pub fn is_empty(&self) -> bool {
        self.levels().into_iter().all(Option::is_none)
    }

    pub fn levels(&self) -> [&Option<String>; 4] {
        [&self.header1, &self.header2, &self.header3, &self.header4]
    }

    pub fn get(&self, level: usize) -> Option<&str> {
        match level {
            1 => self.header1.as_deref(),
            2 => self.header2.as_deref(),
            3 => self.header3.as_deref(),
            4 => self.header4.as_deref(),
            _ => None,
        }
    }

    /// Enter a heading: sets `level` and clears every deeper level.
    pub fn enter(&mut self, level: usize, text: String) {
        let slots = [&mut self.header1, &mut self.header2, &mut self.header3, &mut self.header4];
        for (i, slot) in slots.into_iter().enumerate() {
            let slot_level = i + 1;
            if slot_level == level {
                *slot = Some(text.clone());
            } else if slot_level > level {
                *slot = None;
            }
        }
    }

    /// `"Intro > Install"` style rendering, skipping unset levels.
    pub fn joined(&self) -> String {
        self.levels().iter().filter_map(|h| h.as_deref()).collect::<Vec<_>>().join(" > ")
    }
}

/// A chunk of a source file, the unit of embedding and retrieval.
///
/// - `id`: `"{source}:{chunk_index}"`
/// - `source`: path relative to the ingestion root, `/`-separated
/// - `start`: character offset of `text` within the source file
/// - `overlap`: leading characters of `text` already covered by the previous chunk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub source: String,
    pub file_type: FileType,
    pub language: Option<String>,
    pub headers: HeaderPath,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub start: usize,
    pub overlap: usize,
}

impl Chunk {
    /// The part of `text` not shared with the previous chunk.
    pub fn fresh_text(&self) -> &str {
        match self.text.char_indices().nth(self.overlap) {
            Some((byte, _)) => &self.text[byte..],
            None => "",
        }
    }
}

/// Which collection a retrieval hit came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Origin {
    Docs,
    Code,
}

/// A raw similarity-search hit. `score` is a similarity: higher is better.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub score: f32,
}
