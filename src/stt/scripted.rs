//! Scripted transcript source
//!
//! Replays typed or recorded utterances as if a recognizer produced them:
//! every pushed chunk surfaces as a partial, `flush` finalizes the utterance.

use super::engine::{FinalSegment, Language, SttEvent, TranscriptSource};
use std::collections::VecDeque;

/// Transcript source fed from text instead of audio
pub struct ScriptedSource {
    language: Language,
    pending: String,
    confidence: f32,
    events: VecDeque<SttEvent>,
}

impl ScriptedSource {
    /// Confidence attached to replayed utterances
    pub const REPLAY_CONFIDENCE: f32 = 1.0;

    /// Creates an empty source
    pub fn new() -> Self {
        Self {
            language: Language::Auto,
            pending: String::new(),
            confidence: Self::REPLAY_CONFIDENCE,
            events: VecDeque::new(),
        }
    }

    /// Creates a source with one finalized utterance per non-blank line
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut source = Self::new();
        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }
            source.push_text(line);
            source.flush();
        }
        source
    }

    /// Appends a chunk of the current utterance and emits the running partial
    pub fn push_text(&mut self, chunk: &str) {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            return;
        }
        if !self.pending.is_empty() {
            self.pending.push(' ');
        }
        self.pending.push_str(chunk);
        self.events.push_back(SttEvent::Partial(self.pending.clone()));
    }

    /// Sets the confidence attached to the next finalized utterance
    pub fn set_confidence(&mut self, confidence: f32) {
        self.confidence = confidence;
    }

    /// Number of events not yet polled
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}

impl TranscriptSource for ScriptedSource {
    fn set_language(&mut self, language: Language) {
        self.language = language;
        tracing::debug!("Scripted source language set: {:?}", self.language);
    }

    fn language(&self) -> &Language {
        &self.language
    }

    fn poll(&mut self) -> Option<SttEvent> {
        self.events.pop_front()
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.pending);
        self.events
            .push_back(SttEvent::Final(FinalSegment::new(text, self.confidence)));
        self.confidence = Self::REPLAY_CONFIDENCE;
    }

    fn reset(&mut self) {
        self.pending.clear();
        self.events.clear();
        self.confidence = Self::REPLAY_CONFIDENCE;
        tracing::debug!("Scripted source reset");
    }

    fn name(&self) -> &str {
        "Scripted"
    }

    fn is_ready(&self) -> bool {
        true
    }
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self::new()
    }
}
