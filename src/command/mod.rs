//! Voice command interpretation
//!
//! Normalizes an utterance, matches it against the bilingual rule table and
//! translates the resulting command into a typed invoice mutation.

mod matcher;
mod normalizer;
mod rules;
mod translator;
mod types;

pub use matcher::{CommandMatcher, MatchObserver, TracingObserver, RULE_CONFIDENCE};
pub use normalizer::normalize;
pub use rules::{parse_number, Rule, RULES};
pub use translator::translate;
pub use types::{keys, CommandKind, Payload, PayloadValue, StructuredCommand};

#[cfg(test)]
pub use matcher::MockMatchObserver;
