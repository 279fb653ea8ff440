//! Command matcher
//!
//! Applies the rule table to a normalized utterance. Always returns a
//! command: the first matching rule's kind and payload, or `Unrecognized`.

use super::normalizer::normalize;
use super::rules::{Rule, RULES};
use super::types::{CommandKind, StructuredCommand};
use crate::stt::Language;
use std::sync::Arc;

/// Confidence attached to every rule-based match
pub const RULE_CONFIDENCE: f32 = 0.9;

/// Receives match attempts, for tracing and diagnostics
#[cfg_attr(test, mockall::automock)]
pub trait MatchObserver: Send + Sync {
    /// A rule claimed the utterance
    fn on_match(&self, utterance: &str, rule_index: usize, kind: CommandKind);

    /// No rule claimed the utterance
    fn on_miss(&self, utterance: &str);
}

/// Logs match attempts at debug level
pub struct TracingObserver;

impl MatchObserver for TracingObserver {
    fn on_match(&self, utterance: &str, rule_index: usize, kind: CommandKind) {
        tracing::debug!(rule = rule_index, kind = kind.as_str(), "Matched '{}'", utterance);
    }

    fn on_miss(&self, utterance: &str) {
        tracing::debug!("No rule for '{}'", utterance);
    }
}

/// Rule-based matcher for one language selection
pub struct CommandMatcher {
    language: Language,
    rules: Vec<(usize, &'static Rule)>,
    observer: Arc<dyn MatchObserver>,
}

impl CommandMatcher {
    /// Matcher over the rules accepted by `language`, in table order
    pub fn new(language: Language) -> Self {
        let rules = RULES
            .iter()
            .enumerate()
            .filter(|(_, rule)| language.accepts(rule.language()))
            .collect();

        Self {
            language,
            rules,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replaces the match observer
    pub fn with_observer(mut self, observer: Arc<dyn MatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Number of active rules
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Normalizes then matches a raw utterance
    pub fn match_utterance(&self, utterance: &str) -> StructuredCommand {
        self.match_normalized(&normalize(utterance), utterance)
    }

    /// Matches already-normalized text; `raw` is kept on the command as-is
    pub fn match_normalized(&self, normalized: &str, raw: &str) -> StructuredCommand {
        if normalized.is_empty() {
            self.observer.on_miss(normalized);
            return StructuredCommand::unrecognized(raw);
        }

        for (index, rule) in &self.rules {
            if let Some(payload) = rule.apply(normalized) {
                self.observer.on_match(normalized, *index, rule.kind());
                return StructuredCommand {
                    kind: rule.kind(),
                    payload,
                    raw: raw.to_string(),
                    confidence: RULE_CONFIDENCE,
                };
            }
        }

        self.observer.on_miss(normalized);
        StructuredCommand::unrecognized(raw)
    }
}

impl Default for CommandMatcher {
    fn default() -> Self {
        Self::new(Language::Auto)
    }
}
