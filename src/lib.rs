//! voice-invoice - build an invoice by dictation
//!
//! Finalized transcript segments are matched against a bilingual (English,
//! French) rule table, translated into typed mutations and applied by a pure
//! invoice engine that keeps every total consistent.

pub mod command;
pub mod config;
pub mod invoice;
pub mod ipc;
pub mod pipeline;
pub mod stt;
