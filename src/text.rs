use std::ops::Range;

const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Inclusive word-index range of the sentence around a cursor position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceBounds {
    pub start: usize,
    pub end: usize,
}

/// Byte ranges of the whitespace-delimited tokens of `text`, in order.
///
/// Both `tokenize` and `locate_word` walk the text through this iterator, so a
/// word index always refers to the same token in either direction.
pub fn token_spans(text: &str) -> impl Iterator<Item = Range<usize>> + '_ {
    let mut start: Option<usize> = None;
    text.char_indices()
        .map(Some)
        .chain(std::iter::once(None))
        .filter_map(move |item| match item {
            Some((i, c)) if c.is_whitespace() => start.take().map(|s| s..i),
            Some((i, _)) => {
                if start.is_none() {
                    start = Some(i);
                }
                None
            }
            None => start.take().map(|s| s..text.len()),
        })
}

/// Split text on runs of whitespace, keeping punctuation and casing per word
pub fn tokenize(text: &str) -> Vec<String> {
    token_spans(text).map(|span| text[span].to_string()).collect()
}

pub fn ends_sentence(word: &str) -> bool {
    word.ends_with(SENTENCE_TERMINATORS)
}

/// Sentence around `index`.
///
/// The start is the word after the nearest preceding sentence-final word (or 0),
/// the end is the nearest sentence-final word at or after `index` (or the last
/// word). An index past the end is treated as the last word. Returns `None`
/// for an empty word list.
pub fn sentence_bounds<S: AsRef<str>>(words: &[S], index: usize) -> Option<SentenceBounds> {
    if words.is_empty() {
        return None;
    }
    let index = index.min(words.len() - 1);

    let start = words[..index]
        .iter()
        .rposition(|w| ends_sentence(w.as_ref()))
        .map(|i| i + 1)
        .unwrap_or(0);

    let end = words[index..]
        .iter()
        .position(|w| ends_sentence(w.as_ref()))
        .map(|offset| index + offset)
        .unwrap_or(words.len() - 1);

    Some(SentenceBounds { start, end })
}

/// Map a word index back to the byte range of that token in `text`.
///
/// Only meaningful when `words` came from tokenizing `text`; after an import
/// the two may diverge and the range can point at a different token.
pub fn locate_word<S: AsRef<str>>(text: &str, words: &[S], index: usize) -> Option<Range<usize>> {
    if index >= words.len() {
        return None;
    }
    token_spans(text).nth(index)
}

/// Join `words[from..]` into one utterance
pub fn join_from<S: AsRef<str>>(words: &[S], from: usize) -> String {
    words
        .get(from..)
        .unwrap_or_default()
        .iter()
        .map(|w| w.as_ref())
        .collect::<Vec<_>>()
        .join(" ")
}
