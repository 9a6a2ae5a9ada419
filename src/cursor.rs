use crate::error::{ReaderError, ReaderResult};
use crate::text::{self, SentenceBounds};

/// Word list plus the current reading position.
///
/// `index` ranges over `0..=words.len()`; `words.len()` means "past the last word".
/// The sentence bounds are cached and refreshed on every index change, so a
/// read never sees bounds belonging to a previous position.
#[derive(Debug, Clone, Default)]
pub struct ReadingCursor {
    words: Vec<String>,
    index: usize,
    bounds: Option<SentenceBounds>,
}

impl ReadingCursor {
    pub fn new(words: Vec<String>) -> Self {
        let bounds = text::sentence_bounds(&words, 0);
        Self { words, index: 0, bounds }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.words.len()
    }

    pub fn current_word(&self) -> Option<&str> {
        self.words.get(self.index).map(String::as_str)
    }

    /// Move the cursor. Callers clamp first; anything past `len()` is rejected
    /// and leaves the cursor where it was.
    pub fn set_index(&mut self, index: usize) -> ReaderResult<()> {
        if index > self.words.len() {
            return Err(ReaderError::out_of_range(index, 0, self.words.len()));
        }
        self.index = index;
        self.bounds = text::sentence_bounds(&self.words, index);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.index = 0;
        self.bounds = text::sentence_bounds(&self.words, 0);
    }

    pub fn replace_words(&mut self, words: Vec<String>) {
        self.words = words;
        self.reset();
    }

    pub fn sentence_bounds(&self) -> Option<SentenceBounds> {
        self.bounds
    }
}
