//! Overlapping character windows over source text.
//!
//! Sizes are counted in chars, not bytes. Each window ends at the latest
//! paragraph break, line break or space that keeps it in bounds, falling back
//! to a hard cut. The next window starts `overlap` chars before the previous
//! end, so dropping the first `overlap` chars of every window after the first
//! and concatenating gives back the input.

use crate::error::ChunkingError;

pub const DEFAULT_MAX_SIZE: usize = 1000;
pub const DEFAULT_OVERLAP: usize = 200;

const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    max_size: usize,
    overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self { Self { max_size: DEFAULT_MAX_SIZE, overlap: DEFAULT_OVERLAP } }
}

impl Chunker {
    pub fn new(max_size: usize, overlap: usize) -> Result<Self, ChunkingError> {
        if max_size == 0 {
            return Err(ChunkingError::ZeroMaxSize);
        }
        if overlap >= max_size {
            return Err(ChunkingError::OverlapTooLarge { max_size, overlap });
        }
        Ok(Self { max_size, overlap })
    }

    pub fn max_size(&self) -> usize { self.max_size }

    pub fn overlap(&self) -> usize { self.overlap }

    pub fn split(&self, text: &str) -> Vec<String> {
        // Byte offset of every char, plus the end of the text.
        let offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
        let n = offsets.len() - 1;
        let mut chunks = Vec::new();
        let mut start = 0usize;
        while start < n {
            if n - start <= self.max_size {
                chunks.push(text[offsets[start]..].to_string());
                break;
            }
            let end = self.cut_point(text, &offsets, start);
            chunks.push(text[offsets[start]..offsets[end]].to_string());
            start = end - self.overlap;
        }
        chunks
    }

    /// Char index at which the window starting at `start` ends.
    fn cut_point(&self, text: &str, offsets: &[usize], start: usize) -> usize {
        let hard_end = start + self.max_size;
        // A cut must leave room past the overlap and not waste more than half the window.
        let min_cut = start + (self.overlap + 1).max(self.max_size / 2);
        let window = &text[offsets[start]..offsets[hard_end]];
        for sep in SEPARATORS {
            if let Some(pos) = window.rfind(sep) {
                let cut_byte = offsets[start] + pos + sep.len();
                if let Ok(cut) = offsets.binary_search(&cut_byte) {
                    if cut >= min_cut {
                        return cut;
                    }
                }
            }
        }
        hard_end
    }
}

/// Split with explicit parameters; see [`Chunker`].
pub fn split(text: &str, max_size: usize, overlap: usize) -> Result<Vec<String>, ChunkingError> {
    Ok(Chunker::new(max_size, overlap)?.split(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_parameters() {
        assert_eq!(Chunker::new(0, 0), Err(ChunkingError::ZeroMaxSize));
        assert_eq!(Chunker::new(10, 10), Err(ChunkingError::OverlapTooLarge { max_size: 10, overlap: 10 }));
    }

    #[test]
    fn prefers_paragraph_over_line_break() {
        let c = Chunker::new(20, 2).expect("chunker");
        let text = "aaaaaaaa\nbbb\n\ncccc dddddddddddddd";
        let pieces = c.split(text);
        assert_eq!(pieces[0], "aaaaaaaa\nbbb\n\n");
    }

    #[test]
    fn hard_cut_without_boundaries() {
        let c = Chunker::new(4, 1).expect("chunker");
        assert_eq!(c.split("abcdefghij"), vec!["abcd", "defg", "ghij"]);
    }
}
