//! Structured commands produced by the matcher

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Recognized command kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    AddItem,
    RemoveItem,
    UpdateItem,
    SetCustomer,
    SetTaxRate,
    SetInvoiceNumber,
    SetDate,
    SetDueDate,
    SetNotes,
    Reset,
    ShowPreview,
    GenerateDocument,
    Unrecognized,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::AddItem => "add_item",
            CommandKind::RemoveItem => "remove_item",
            CommandKind::UpdateItem => "update_item",
            CommandKind::SetCustomer => "set_customer",
            CommandKind::SetTaxRate => "set_tax_rate",
            CommandKind::SetInvoiceNumber => "set_invoice_number",
            CommandKind::SetDate => "set_date",
            CommandKind::SetDueDate => "set_due_date",
            CommandKind::SetNotes => "set_notes",
            CommandKind::Reset => "reset",
            CommandKind::ShowPreview => "show_preview",
            CommandKind::GenerateDocument => "generate_document",
            CommandKind::Unrecognized => "unrecognized",
        }
    }

    /// Kinds that only trigger navigation and never touch the invoice
    pub fn is_navigation(&self) -> bool {
        matches!(self, CommandKind::ShowPreview | CommandKind::GenerateDocument)
    }
}

/// Payload keys shared by the rule table and the translator
pub mod keys {
    pub const DESCRIPTION: &str = "description";
    pub const QUANTITY: &str = "quantity";
    pub const UNIT_PRICE: &str = "unit_price";
    pub const CUSTOMER_NAME: &str = "customer_name";
    pub const CUSTOMER_ADDRESS: &str = "customer_address";
    pub const TAX_PERCENT: &str = "tax_percent";
    pub const ITEM: &str = "item";
    pub const INVOICE_NUMBER: &str = "invoice_number";
    pub const NOTES: &str = "notes";
    pub const YEAR: &str = "year";
    pub const MONTH: &str = "month";
    pub const DAY: &str = "day";
    pub const DAYS: &str = "days";

    /// Item reference meaning "the last item", whatever the locale said
    pub const LAST: &str = "last";
}

/// Loosely-typed payload value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Text(String),
    Number(Decimal),
}

/// Payload extracted by a rule
pub type Payload = BTreeMap<&'static str, PayloadValue>;

/// Result of matching one utterance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredCommand {
    pub kind: CommandKind,
    pub payload: Payload,
    /// Utterance as received, before normalization
    pub raw: String,
    /// Match confidence in [0, 1]
    pub confidence: f32,
}

impl StructuredCommand {
    pub fn unrecognized(raw: impl Into<String>) -> Self {
        Self {
            kind: CommandKind::Unrecognized,
            payload: Payload::new(),
            raw: raw.into(),
            confidence: 0.0,
        }
    }

    pub fn is_recognized(&self) -> bool {
        self.kind != CommandKind::Unrecognized
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.payload.get(key) {
            Some(PayloadValue::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn number(&self, key: &str) -> Option<Decimal> {
        match self.payload.get(key) {
            Some(PayloadValue::Number(number)) => Some(*number),
            _ => None,
        }
    }
}
