//! Streaming text-to-speech segmentation.
//!
//! Response text arrives in arbitrary fragments; speaking each fragment as-is
//! clips words, while waiting for the full response wastes the stream. The
//! buffer accumulates fragments and releases a segment as soon as a
//! grammatically sound unit exists, keeping a short tail in reserve so the
//! next segment does not start mid-phrase.

/// Characters that end a sentence. The danda (`।`) is the Hindi full stop.
const SENTENCE_ENDINGS: [char; 4] = ['.', '!', '?', '।'];
/// Characters that end a phrase within a sentence.
const PHRASE_ENDINGS: [char; 3] = [',', ';', ':'];

/// A phrase break this short sounds clipped when spoken alone.
const MIN_WORDS_AT_PHRASE_END: usize = 4;
/// Past this many words we stop waiting for punctuation.
const MAX_WORDS_WITHOUT_BREAK: usize = 8;
/// With an inner phrase break present, release a little earlier.
const MIN_WORDS_WITH_INNER_BREAK: usize = 6;

/// Accumulates incoming response text until a speakable boundary is reached.
///
/// Emitted segments exactly partition the pushed text: concatenating them (in
/// order, plus whatever `flush` returns) reproduces the input byte for byte.
#[derive(Debug, Default)]
pub struct SegmentBuffer {
    buffer: String,
}

impl SegmentBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Discards everything accumulated but not yet emitted.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Appends one incoming chunk and returns any segments that became ready.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);
        let mut ready = Vec::new();
        while let Some(segment) = self.take_ready() {
            ready.push(segment);
        }
        ready
    }

    /// Drains whatever remains as a final segment, on stream completion.
    pub fn flush(&mut self) -> Option<String> {
        if self.buffer.trim().is_empty() {
            self.buffer.clear();
            return None;
        }
        Some(std::mem::take(&mut self.buffer))
    }

    /// Evaluates the release conditions in priority order.
    fn take_ready(&mut self) -> Option<String> {
        let content = self.buffer.trim_end();
        if content.is_empty() {
            return None;
        }
        let words = content.split_whitespace().count();
        let last = content.chars().next_back()?;

        if SENTENCE_ENDINGS.contains(&last) {
            return Some(std::mem::take(&mut self.buffer));
        }
        if PHRASE_ENDINGS.contains(&last) && words >= MIN_WORDS_AT_PHRASE_END {
            return Some(std::mem::take(&mut self.buffer));
        }
        if words >= MAX_WORDS_WITHOUT_BREAK {
            // Keep two words back for smoother continuation.
            return self.take_all_but(2);
        }
        if words >= MIN_WORDS_WITH_INNER_BREAK
            && content.chars().any(|c| PHRASE_ENDINGS.contains(&c))
        {
            return self.take_all_but(1);
        }
        None
    }

    /// Splits the buffer at the start of the last `keep` words; the head is
    /// emitted (trailing whitespace included) and the tail stays buffered.
    fn take_all_but(&mut self, keep: usize) -> Option<String> {
        let split_at = start_of_last_words(&self.buffer, keep)?;
        if split_at == 0 {
            return None;
        }
        let tail = self.buffer.split_off(split_at);
        Some(std::mem::replace(&mut self.buffer, tail))
    }
}

/// Byte offset where the last `keep` whitespace-delimited words begin, or
/// `None` when the text has no more than `keep` words.
fn start_of_last_words(text: &str, keep: usize) -> Option<usize> {
    let mut starts = Vec::new();
    let mut in_word = false;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            in_word = false;
        } else if !in_word {
            in_word = true;
            starts.push(i);
        }
    }
    if starts.len() <= keep {
        return None;
    }
    Some(starts[starts.len() - keep])
}
