//! Dictation pipeline
//!
//! Handles the flow finalized transcript → command → invoice mutation.

mod realtime;
mod session;

pub use realtime::{DictationPipeline, PipelineConfig, PipelineError, PipelineStatus};
pub use session::{Feedback, Session};
