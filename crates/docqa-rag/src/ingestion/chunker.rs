//! Recursive-boundary text chunking
//!
//! Text is split at the coarsest boundary that yields pieces no longer than the
//! chunk size: paragraphs, then lines, then sentences, then words, and finally single
//! characters. Adjacent pieces are merged greedily back up to the chunk size, so a
//! chunk only ends mid-sentence when a sentence alone exceeds the limit.
//!
//! Sizes are counted in characters. Chunks are verbatim slices of the page text.

use std::collections::VecDeque;
use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

use crate::types::Chunk;
use super::parser::PageContent;

/// Split boundaries, coarsest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Paragraph,
    Line,
    Sentence,
    Word,
    Character,
}

const BOUNDARIES: [Boundary; 5] = [
    Boundary::Paragraph,
    Boundary::Line,
    Boundary::Sentence,
    Boundary::Word,
    Boundary::Character,
];

/// A byte range of the page text with its length in characters
#[derive(Debug, Clone, Copy)]
struct Piece {
    start: usize,
    end: usize,
    chars: usize,
}

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Characters carried over from the end of one chunk into the next
    overlap: usize,
}

impl RecursiveChunker {
    /// Create a new chunker. `overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Chunk every page of a document. Chunks never span pages.
    pub fn split(&self, document_id: &str, pages: &[PageContent]) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for page in pages {
            for span in self.split_text(&page.content) {
                chunks.push(Chunk {
                    document_id: document_id.to_string(),
                    index: chunks.len() as u32,
                    page_number: page.page_number,
                    byte_start: span.start,
                    byte_end: span.end,
                    content: page.content[span].to_string(),
                });
            }
        }

        chunks
    }

    /// Byte ranges of the chunks for a single text, in order
    pub fn split_text(&self, text: &str) -> Vec<Range<usize>> {
        let mut spans = Vec::new();
        self.split_range(text, 0..text.len(), 0, &mut spans);
        spans
    }

    fn split_range(&self, text: &str, range: Range<usize>, level: usize, out: &mut Vec<Range<usize>>) {
        let slice = &text[range.clone()];
        if slice.trim().is_empty() {
            return;
        }
        if slice.chars().count() <= self.chunk_size {
            out.push(range);
            return;
        }

        let Some(boundary) = BOUNDARIES.get(level) else {
            // Unreachable with a character boundary last, kept as a hard cut
            self.hard_cut(text, range, out);
            return;
        };

        let mut window: VecDeque<Piece> = VecDeque::new();
        let mut window_chars = 0usize;
        // Window holds pieces not yet emitted
        let mut fresh = false;

        for piece in split_pieces(slice, range.start, *boundary) {
            if piece.chars > self.chunk_size {
                if fresh {
                    emit(text, &window, out);
                }
                window.clear();
                window_chars = 0;
                fresh = false;
                self.split_range(text, piece.start..piece.end, level + 1, out);
                continue;
            }

            if window_chars + piece.chars > self.chunk_size {
                if fresh {
                    emit(text, &window, out);
                }
                while let Some(front) = window.front() {
                    if window_chars > self.overlap || window_chars + piece.chars > self.chunk_size {
                        window_chars -= front.chars;
                        window.pop_front();
                    } else {
                        break;
                    }
                }
            }

            window.push_back(piece);
            window_chars += piece.chars;
            fresh = true;
        }

        if fresh {
            emit(text, &window, out);
        }
    }

    fn hard_cut(&self, text: &str, range: Range<usize>, out: &mut Vec<Range<usize>>) {
        let slice = &text[range.clone()];
        let mut start = range.start;
        let mut count = 0usize;

        for (offset, _) in slice.char_indices() {
            if count == self.chunk_size {
                out.push(start..range.start + offset);
                start = range.start + offset;
                count = 0;
            }
            count += 1;
        }
        if start < range.end {
            out.push(start..range.end);
        }
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new(500, 0)
    }
}

/// Push the window's span unless it is whitespace only
fn emit(text: &str, window: &VecDeque<Piece>, out: &mut Vec<Range<usize>>) {
    if let (Some(first), Some(last)) = (window.front(), window.back()) {
        let span = first.start..last.end;
        if !text[span.clone()].trim().is_empty() {
            out.push(span);
        }
    }
}

/// Split `slice` (located at `base` in the page text) at one boundary kind.
/// The pieces are contiguous and cover the slice exactly.
fn split_pieces(slice: &str, base: usize, boundary: Boundary) -> Vec<Piece> {
    let parts: Vec<&str> = match boundary {
        Boundary::Paragraph => slice.split_inclusive("\n\n").collect(),
        Boundary::Line => slice.split_inclusive('\n').collect(),
        Boundary::Sentence => slice.split_sentence_bounds().collect(),
        Boundary::Word => slice.split_inclusive(' ').collect(),
        Boundary::Character => {
            return slice
                .char_indices()
                .map(|(offset, ch)| Piece {
                    start: base + offset,
                    end: base + offset + ch.len_utf8(),
                    chars: 1,
                })
                .collect();
        }
    };

    let mut offset = base;
    parts
        .into_iter()
        .map(|part| {
            let piece = Piece {
                start: offset,
                end: offset + part.len(),
                chars: part.chars().count(),
            };
            offset = piece.end;
            piece
        })
        .collect()
}
