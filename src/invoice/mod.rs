//! Invoice aggregate and its state engine
//!
//! The engine is the only place that changes an invoice and the only place
//! that validates mutation values.

mod engine;
mod model;
mod mutation;

pub use engine::{apply, InvoiceError};
pub use model::{Invoice, LineItem, DEFAULT_DUE_IN_DAYS};
pub use mutation::{CalendarDate, DueDate, ItemChanges, ItemRef, MutationRequest, NewLineItem};
