//! Transcript boundary: events, locales and the source trait

use serde::{Deserialize, Serialize};

/// Events emitted by a transcript source
#[derive(Debug, Clone, PartialEq)]
pub enum SttEvent {
    /// Partial transcription (may be rewritten, display only)
    Partial(String),
    /// Final transcription (definitive)
    Final(FinalSegment),
}

/// A finalized utterance with the recognizer's confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalSegment {
    pub text: String,
    /// Recognizer confidence in [0, 1]
    pub confidence: f32,
}

impl FinalSegment {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Segment as delivered by an external recognizer
///
/// Only segments with `is_final == true` may reach the command pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    #[serde(rename = "final")]
    pub is_final: bool,
    #[serde(default)]
    pub confidence: f32,
}

impl From<TranscriptSegment> for SttEvent {
    fn from(segment: TranscriptSegment) -> Self {
        if segment.is_final {
            SttEvent::Final(FinalSegment::new(segment.text, segment.confidence))
        } else {
            SttEvent::Partial(segment.text)
        }
    }
}

/// Supported languages for command recognition
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// Every rule locale is active
    #[default]
    Auto,
    /// English
    English,
    /// French
    French,
    /// Other language (ISO 639-1 code), no dedicated rules
    Other(String),
}

impl Language {
    /// Returns the ISO 639-1 code of the language
    pub fn code(&self) -> &str {
        match self {
            Language::Auto => "auto",
            Language::English => "en",
            Language::French => "fr",
            Language::Other(code) => code,
        }
    }

    /// Creates a language from an ISO 639-1 code or locale tag (`en-US`, `fr_FR`)
    pub fn from_code(code: &str) -> Self {
        let lower = code.trim().to_lowercase();
        let primary = lower
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_string();
        match primary.as_str() {
            "" | "auto" => Language::Auto,
            "en" | "english" => Language::English,
            "fr" | "french" | "français" => Language::French,
            _ => Language::Other(primary),
        }
    }

    /// Whether rules written for `rule_language` apply when this language is selected
    pub fn accepts(&self, rule_language: &Language) -> bool {
        match self {
            Language::Auto | Language::Other(_) => true,
            selected => selected == rule_language,
        }
    }
}

/// Source of transcript events (speech recognizer, replayed script, ...)
///
/// The command pipeline only ever consumes what `poll` hands out.
#[cfg_attr(test, mockall::automock)]
pub trait TranscriptSource: Send {
    /// Sets the recognition language
    fn set_language(&mut self, language: Language);

    /// Returns the current language
    fn language(&self) -> &Language;

    /// Retrieves the next transcript event
    ///
    /// Returns `None` if no event is available.
    fn poll(&mut self) -> Option<SttEvent>;

    /// Finalizes any pending partial text
    fn flush(&mut self);

    /// Resets the source state
    fn reset(&mut self);

    /// Returns the source name
    fn name(&self) -> &str;

    /// Checks whether the source can produce events
    fn is_ready(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_codes_accept_locale_tags() {
        assert_eq!(Language::from_code("en-US"), Language::English);
        assert_eq!(Language::from_code("fr_FR"), Language::French);
        assert_eq!(Language::from_code("AUTO"), Language::Auto);
        assert_eq!(Language::from_code("de"), Language::Other("de".to_string()));
        assert_eq!(Language::French.code(), "fr");
    }

    #[test]
    fn auto_accepts_every_rule_locale() {
        assert!(Language::Auto.accepts(&Language::English));
        assert!(Language::Auto.accepts(&Language::French));
        assert!(Language::English.accepts(&Language::English));
        assert!(!Language::English.accepts(&Language::French));
    }

    #[test]
    fn only_final_segments_become_final_events() {
        let partial = TranscriptSegment {
            text: "add 3".to_string(),
            is_final: false,
            confidence: 0.4,
        };
        let final_segment = TranscriptSegment {
            text: "add 3 chairs at 40".to_string(),
            is_final: true,
            confidence: 1.7,
        };

        assert_eq!(SttEvent::from(partial), SttEvent::Partial("add 3".to_string()));
        match SttEvent::from(final_segment) {
            SttEvent::Final(segment) => {
                assert_eq!(segment.text, "add 3 chairs at 40");
                assert_eq!(segment.confidence, 1.0);
            }
            other => panic!("expected final event, got {:?}", other),
        }
    }

    #[test]
    fn segment_wire_shape_uses_final_flag() {
        let segment: TranscriptSegment =
            serde_json::from_str(r#"{"text":"set tax to 10","final":true,"confidence":0.8}"#)
                .expect("valid segment json");
        assert!(segment.is_final);
        assert_eq!(segment.text, "set tax to 10");
    }
}
