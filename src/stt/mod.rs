//! Transcript boundary
//!
//! Events, locales and sources that feed finalized utterances to the pipeline.

mod engine;
mod scripted;

pub use engine::{FinalSegment, Language, SttEvent, TranscriptSegment, TranscriptSource};
pub use scripted::ScriptedSource;

#[cfg(test)]
pub use engine::MockTranscriptSource;
