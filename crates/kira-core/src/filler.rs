//! Filler acknowledgments spoken while the backend is still retrieving.
//!
//! A short phrase right after the utterance masks backend latency. Chit-chat
//! gets none: the real answer arrives fast enough and an acknowledgment would
//! sound stilted.

use rand::seq::SliceRandom;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    ChitChat,
    Clarification,
    NewQuery,
}

const GREETINGS: &[&str] = &[
    "hello",
    "hi",
    "hey",
    "good morning",
    "good evening",
    "thanks",
    "thank you",
    "okay",
    "ok",
    "bye",
];

const CLARIFIERS: &[&str] = &[
    "what about",
    "and if",
    "is it",
    "does it",
    "why",
    "how long",
    "what if",
];

/// Heuristic intent classification of an utterance.
pub fn detect_intent(utterance: &str) -> Intent {
    let q = utterance.trim().to_lowercase();
    if GREETINGS.contains(&q.as_str()) || q.split_whitespace().count() < 2 {
        return Intent::ChitChat;
    }
    if CLARIFIERS.iter().any(|c| q.starts_with(c)) {
        return Intent::Clarification;
    }
    Intent::NewQuery
}

pub const ENGLISH_FILLERS: &[&str] = &[
    "That sounds like a serious situation, let me double check the specific section.",
    "Okay, I see what you're asking, let me look that up.",
    "Right, let me confirm the latest provisions.",
    "Let me check the files for you.",
    "One moment, I'm pulling up the relevant sections.",
];

pub const HINDI_FILLERS: &[&str] = &[
    "एक पल, मैं संबंधित धाराएँ देख रही हूँ।",
    "ठीक है, मैं इसे अभी देखती हूँ।",
    "समझ गई, मैं फ़ाइलें देख रही हूँ।",
];

pub fn phrases_for(language: &str) -> &'static [&'static str] {
    if language.starts_with("hi") {
        HINDI_FILLERS
    } else {
        ENGLISH_FILLERS
    }
}

/// A random acknowledgment for the utterance, or `None` for chit-chat.
pub fn pick(language: &str, utterance: &str) -> Option<&'static str> {
    if detect_intent(utterance) == Intent::ChitChat {
        return None;
    }
    phrases_for(language).choose(&mut rand::thread_rng()).copied()
}
