//! Output voice selection.
//!
//! Selection runs per utterance: platforms load their voice inventory
//! asynchronously, so the set seen at session start is not the set available
//! a few utterances later.

/// One synthesis voice offered by the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceInfo {
    pub name: String,
    /// BCP 47 style tag, e.g. `hi-IN` or `en-GB`.
    pub lang: String,
    /// Marked by the platform as its default voice.
    pub default: bool,
}

impl VoiceInfo {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
            default: false,
        }
    }
}

fn normalize(tag: &str) -> String {
    tag.trim().replace('_', "-").to_lowercase()
}

fn primary(tag: &str) -> String {
    normalize(tag)
        .split('-')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Picks the best available voice for `target_lang`, in priority order:
/// exact tag, same primary language, a regionally-accented voice for the
/// target's region, the platform default, then whatever comes first.
pub fn pick_voice<'a>(voices: &'a [VoiceInfo], target_lang: &str) -> Option<&'a VoiceInfo> {
    if voices.is_empty() {
        return None;
    }

    let target = normalize(target_lang);
    let target_primary = primary(target_lang);
    let target_region = target.split('-').nth(1).map(str::to_string);

    voices
        .iter()
        .find(|v| normalize(&v.lang) == target)
        .or_else(|| voices.iter().find(|v| primary(&v.lang) == target_primary))
        .or_else(|| {
            let region = target_region.as_ref()?;
            voices
                .iter()
                .find(|v| normalize(&v.lang).ends_with(&format!("-{region}")))
        })
        .or_else(|| voices.iter().find(|v| v.default))
        .or_else(|| voices.first())
}
