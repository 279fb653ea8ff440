//! Typed mutation requests applied by the invoice engine

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reference to a line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum ItemRef {
    /// Item identity
    Id(Uuid),
    /// 1-based position in insertion order ("item 2")
    Position(usize),
    /// Last item in insertion order
    Last,
}

/// Calendar date as dictated, validated by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl CalendarDate {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }
}

/// Due date request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueDate {
    /// Fixed calendar date
    On(CalendarDate),
    /// Offset from the issue date
    InDays(u32),
}

/// Input for appending a line item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

/// Fields to change on an existing line item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemChanges {
    pub description: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
}

impl ItemChanges {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.quantity.is_none() && self.unit_price.is_none()
    }
}

/// One request per invoice-affecting command kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum MutationRequest {
    AddItem(NewLineItem),
    RemoveItem {
        target: ItemRef,
    },
    UpdateItem {
        target: ItemRef,
        changes: ItemChanges,
    },
    SetCustomer {
        name: Option<String>,
        address: Option<String>,
    },
    SetTaxRate {
        /// Fraction, 0.10 for 10%
        rate: Decimal,
    },
    SetInvoiceNumber {
        number: String,
    },
    SetIssueDate {
        date: CalendarDate,
    },
    SetDueDate {
        due: DueDate,
    },
    SetNotes {
        notes: String,
    },
    Reset,
}

impl MutationRequest {
    /// Short label used in logs and feedback
    pub fn label(&self) -> &'static str {
        match self {
            MutationRequest::AddItem(_) => "add_item",
            MutationRequest::RemoveItem { .. } => "remove_item",
            MutationRequest::UpdateItem { .. } => "update_item",
            MutationRequest::SetCustomer { .. } => "set_customer",
            MutationRequest::SetTaxRate { .. } => "set_tax_rate",
            MutationRequest::SetInvoiceNumber { .. } => "set_invoice_number",
            MutationRequest::SetIssueDate { .. } => "set_issue_date",
            MutationRequest::SetDueDate { .. } => "set_due_date",
            MutationRequest::SetNotes { .. } => "set_notes",
            MutationRequest::Reset => "reset",
        }
    }
}
