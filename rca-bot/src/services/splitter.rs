//! Recursive character splitter.
//!
//! Text is split on the first separator that occurs in it, keeping the
//! separator at the start of the following piece. Small pieces are merged
//! back up to `chunk_size` characters with up to `chunk_overlap` characters
//! carried over from the previous chunk; oversized pieces are split again
//! with the remaining separators. Every chunk is a slice of the input.

use std::collections::VecDeque;
use std::ops::Range;

use crate::config::SplitterConfig;
use crate::error::{RcaBotError, Result};

pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RcaBotError::Config(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(RcaBotError::Config(format!(
                "chunk overlap ({chunk_overlap}) must be smaller than chunk size ({chunk_size})"
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(ToString::to_string).collect(),
        })
    }

    pub fn from_config(config: &SplitterConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut ranges = Vec::new();
        self.split_range(text, 0..text.len(), &self.separators, &mut ranges);

        ranges
            .into_iter()
            .filter_map(|range| trimmed(text, range))
            .map(|range| &text[range])
            .collect()
    }

    fn split_range(
        &self,
        text: &str,
        range: Range<usize>,
        separators: &[String],
        out: &mut Vec<Range<usize>>,
    ) {
        let piece = &text[range.clone()];

        let mut separator = separators.last().map_or("", String::as_str);
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if piece.contains(candidate.as_str()) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut small = Vec::new();
        for split in split_keeping_separator(piece, range.start, separator) {
            if char_len(text, &split) < self.chunk_size {
                small.push(split);
                continue;
            }

            if !small.is_empty() {
                self.merge(text, &small, out);
                small.clear();
            }
            if remaining.is_empty() {
                out.push(split);
            } else {
                self.split_range(text, split, remaining, out);
            }
        }

        if !small.is_empty() {
            self.merge(text, &small, out);
        }
    }

    /// Greedily joins consecutive pieces into chunks of at most `chunk_size`
    /// characters, keeping a tail of at most `chunk_overlap` characters.
    fn merge(&self, text: &str, pieces: &[Range<usize>], out: &mut Vec<Range<usize>>) {
        let mut current: VecDeque<(Range<usize>, usize)> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(text, piece);

            if total + len > self.chunk_size && !current.is_empty() {
                if let Some(joined) = span(&current) {
                    out.push(joined);
                }

                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    let Some((_, front_len)) = current.pop_front() else {
                        break;
                    };
                    total -= front_len;
                }
            }

            current.push_back((piece.clone(), len));
            total += len;
        }

        if let Some(joined) = span(&current) {
            out.push(joined);
        }
    }
}

fn split_keeping_separator(piece: &str, offset: usize, separator: &str) -> Vec<Range<usize>> {
    if separator.is_empty() {
        return piece
            .char_indices()
            .map(|(i, c)| offset + i..offset + i + c.len_utf8())
            .collect();
    }

    let mut ranges = Vec::new();
    let mut start = 0;
    for (i, _) in piece.match_indices(separator) {
        if i > start {
            ranges.push(offset + start..offset + i);
        }
        start = i;
    }
    if start < piece.len() {
        ranges.push(offset + start..offset + piece.len());
    }
    ranges
}

fn span(pieces: &VecDeque<(Range<usize>, usize)>) -> Option<Range<usize>> {
    let first = pieces.front()?;
    let last = pieces.back()?;
    Some(first.0.start..last.0.end)
}

fn char_len(text: &str, range: &Range<usize>) -> usize {
    text[range.clone()].chars().count()
}

fn trimmed(text: &str, range: Range<usize>) -> Option<Range<usize>> {
    let slice = &text[range.clone()];
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return None;
    }
    let start = range.start + (slice.len() - slice.trim_start().len());
    Some(start..start + trimmed.len())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn merges_words_up_to_chunk_size() {
        let splitter = RecursiveSplitter::new(9, 4).unwrap();
        assert_eq!(
            splitter.split("one two three four"),
            vec!["one two", "three", "four"]
        );
    }

    #[test]
    fn carries_overlap_into_next_chunk() {
        let splitter = RecursiveSplitter::new(10, 4).unwrap();
        assert_eq!(splitter.split("ab cd ef gh"), vec!["ab cd ef", "ef gh"]);
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let splitter = RecursiveSplitter::new(20, 0).unwrap();
        let text = "first paragraph.\n\nsecond paragraph.";
        assert_eq!(
            splitter.split(text),
            vec!["first paragraph.", "second paragraph."]
        );
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let splitter = RecursiveSplitter::new(4000, 200).unwrap();
        let text = "lorem ipsum ".repeat(250);
        assert_eq!(text.len(), 3000);

        let chunks = splitter.split(&text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], text.trim());
    }

    #[test]
    fn long_words_fall_back_to_characters() {
        let splitter = RecursiveSplitter::new(4, 0).unwrap();
        let chunks = splitter.split("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let splitter = RecursiveSplitter::new(3, 0).unwrap();
        let chunks = splitter.split("ééé ééé");
        assert!(chunks.iter().all(|c| c.chars().count() <= 3));
        assert_eq!(chunks.concat().replace(' ', ""), "éééééé");
    }

    #[test]
    fn chunks_are_substrings_within_limit() {
        let splitter = RecursiveSplitter::new(50, 10).unwrap();
        let text = "The database failover started at 02:14.\n\nReplication lag grew \
                    beyond the alert threshold while the primary was saturated.\n\
                    Operators paused writes and promoted the replica manually.";

        let chunks = splitter.split(text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(text.contains(chunk), "not a substring: {chunk:?}");
            assert!(chunk.chars().count() <= 50);
            assert_eq!(chunk.trim(), *chunk);
        }
    }

    #[test]
    fn whitespace_only_text_yields_nothing() {
        let splitter = RecursiveSplitter::new(10, 2).unwrap();
        assert!(splitter.split(" \n\n \n ").is_empty());
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        assert!(RecursiveSplitter::new(10, 10).is_err());
        assert!(RecursiveSplitter::new(0, 0).is_err());
    }
}
