//! IPC module
//!
//! Commands a UI shell calls to drive dictation and read the invoice.

mod commands;

pub use commands::{
    get_invoice, get_status, start_dictation, stop_dictation, submit_segment, subscribe_feedback,
    AppState, StatusResponse,
};
