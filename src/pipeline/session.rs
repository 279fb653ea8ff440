//! Dictation session
//!
//! Owns the invoice being dictated and runs one finalized utterance at a
//! time through normalize → match → translate → apply.

use super::realtime::PipelineError;
use crate::command::{translate, CommandKind, CommandMatcher};
use crate::invoice::{self, Invoice};
use crate::stt::{Language, SttEvent, TranscriptSegment};
use chrono::{Local, NaiveDate};
use serde::Serialize;

/// Outcome of one utterance, shown to the user as transient feedback
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum Feedback {
    /// Mutation applied; `changed` is false for silent no-ops (unknown item)
    Applied {
        kind: CommandKind,
        utterance: String,
        changed: bool,
    },
    /// Mutation refused by the invoice engine, invoice unchanged
    Rejected {
        kind: CommandKind,
        utterance: String,
        reason: String,
    },
    /// Command not understood
    Unrecognized { utterance: String },
    /// Navigation request for the hosting UI
    Navigate { target: CommandKind, utterance: String },
    /// Blank utterance, nothing to interpret
    Ignored,
}

impl Feedback {
    /// Whether the invoice may have changed
    pub fn is_applied(&self) -> bool {
        matches!(self, Feedback::Applied { changed: true, .. })
    }
}

type Clock = Box<dyn Fn() -> NaiveDate + Send + Sync>;

/// Single-writer owner of one invoice
pub struct Session {
    invoice: Invoice,
    matcher: CommandMatcher,
    clock: Clock,
    processed: u64,
}

impl Session {
    /// Session over `invoice`, reset dates taken from the local clock
    pub fn new(invoice: Invoice, matcher: CommandMatcher) -> Self {
        Self {
            invoice,
            matcher,
            clock: Box::new(|| Local::now().date_naive()),
            processed: 0,
        }
    }

    /// Replaces the clock used when the invoice is reset
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Processes a segment from the recognizer.
    ///
    /// Handing over a non-final segment is a caller bug and is refused.
    pub fn process(&mut self, segment: &TranscriptSegment) -> Result<Feedback, PipelineError> {
        if !segment.is_final {
            return Err(PipelineError::NotFinal(segment.text.clone()));
        }
        Ok(self.process_final(&segment.text))
    }

    /// Processes a transcript event; partial text is display-only and dropped
    pub fn handle_event(&mut self, event: SttEvent) -> Option<Feedback> {
        match event {
            SttEvent::Partial(text) => {
                tracing::trace!("Partial transcript ignored: '{}'", text);
                None
            }
            SttEvent::Final(segment) => Some(self.process_final(&segment.text)),
        }
    }

    /// Runs one finalized utterance to completion
    pub fn process_final(&mut self, utterance: &str) -> Feedback {
        self.processed += 1;

        if utterance.trim().is_empty() {
            return Feedback::Ignored;
        }

        let command = self.matcher.match_utterance(utterance);
        if command.kind.is_navigation() {
            tracing::info!("Navigation requested: {}", command.kind.as_str());
            return Feedback::Navigate {
                target: command.kind,
                utterance: utterance.to_string(),
            };
        }

        let Some(mutation) = translate(&command) else {
            tracing::info!("Command not understood: '{}'", utterance);
            return Feedback::Unrecognized {
                utterance: utterance.to_string(),
            };
        };

        match invoice::apply(&self.invoice, &mutation, (self.clock)()) {
            Ok(next) => {
                let changed = next != self.invoice;
                tracing::debug!(changed, "Applied {}", mutation.label());
                self.invoice = next;
                Feedback::Applied {
                    kind: command.kind,
                    utterance: utterance.to_string(),
                    changed,
                }
            }
            Err(e) => {
                tracing::warn!("Rejected {} '{}': {}", mutation.label(), utterance, e);
                Feedback::Rejected {
                    kind: command.kind,
                    utterance: utterance.to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn invoice(&self) -> &Invoice {
        &self.invoice
    }

    /// Owned copy of the current invoice for renderers
    pub fn snapshot(&self) -> Invoice {
        self.invoice.clone()
    }

    /// Number of finalized utterances processed so far
    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn language(&self) -> &Language {
        self.matcher.language()
    }

    /// Switches the rule locale, keeping the invoice
    pub fn set_language(&mut self, language: Language) {
        self.matcher = CommandMatcher::new(language);
    }
}
