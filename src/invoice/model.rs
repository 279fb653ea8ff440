//! Invoice aggregate and line items

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default payment terms, in days after the issue date
pub const DEFAULT_DUE_IN_DAYS: u32 = 30;

/// Line item on an invoice.
///
/// `total` is derived from `quantity * unit_price` and recomputed by the
/// engine on every mutation touching the item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: Uuid,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total: Decimal,
}

impl LineItem {
    /// `None` when the total does not fit in a decimal
    pub fn new(id: Uuid, description: String, quantity: Decimal, unit_price: Decimal) -> Option<Self> {
        Some(Self {
            id,
            description,
            quantity,
            unit_price,
            total: quantity.checked_mul(unit_price)?,
        })
    }

    pub(crate) fn recompute(&mut self) -> Option<()> {
        self.total = self.quantity.checked_mul(self.unit_price)?;
        Some(())
    }
}

/// Invoice being assembled by dictation.
///
/// Plain values only, so renderers and caches can read and write it as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub customer_name: String,
    pub customer_address: String,
    pub items: Vec<LineItem>,
    /// Fraction, 0.10 for 10%
    pub tax_rate: Decimal,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
    /// Payment terms used for the default due date
    #[serde(default = "default_due_in_days")]
    pub due_in_days: u32,
    /// Line items created so far, seeds item ids
    #[serde(default)]
    pub(crate) item_seq: u64,
}

fn default_due_in_days() -> u32 {
    DEFAULT_DUE_IN_DAYS
}

impl Invoice {
    /// Creates an empty invoice issued on `issue_date`, due 30 days later
    pub fn new(issue_date: NaiveDate) -> Self {
        Self::with_terms(issue_date, DEFAULT_DUE_IN_DAYS)
    }

    /// Creates an empty invoice with custom payment terms
    pub fn with_terms(issue_date: NaiveDate, due_in_days: u32) -> Self {
        Self::empty(Uuid::new_v4(), issue_date, due_in_days)
    }

    /// Empty invoice for an existing session identity
    pub(crate) fn empty(invoice_id: Uuid, issue_date: NaiveDate, due_in_days: u32) -> Self {
        Self {
            invoice_id,
            invoice_number: default_invoice_number(issue_date),
            issue_date,
            due_date: due_date_after(issue_date, due_in_days),
            customer_name: String::new(),
            customer_address: String::new(),
            items: Vec::new(),
            tax_rate: Decimal::ZERO,
            subtotal: Decimal::ZERO,
            tax: Decimal::ZERO,
            total: Decimal::ZERO,
            notes: None,
            due_in_days,
            item_seq: 0,
        }
    }

    /// Number of line items
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Line item at a 1-based position
    pub fn item_at(&self, position: usize) -> Option<&LineItem> {
        position.checked_sub(1).and_then(|index| self.items.get(index))
    }

    /// Fresh id for the next line item, derived from the invoice identity
    pub(crate) fn next_item_id(&mut self) -> Uuid {
        self.item_seq += 1;
        Uuid::new_v5(&self.invoice_id, &self.item_seq.to_be_bytes())
    }

    /// Re-derives every item total, then subtotal, tax and total.
    ///
    /// Returns `None` on decimal overflow, leaving the totals partly updated.
    pub(crate) fn recompute_totals(&mut self) -> Option<()> {
        for item in &mut self.items {
            item.recompute()?;
        }
        self.subtotal = checked_sum(self.items.iter().map(|item| item.total))?;
        self.tax = self.subtotal.checked_mul(self.tax_rate)?;
        self.total = self.subtotal.checked_add(self.tax)?;
        Some(())
    }

    /// Checks the arithmetic and range invariants of the aggregate
    pub fn invariants_hold(&self) -> bool {
        let items_ok = self.items.iter().all(|item| {
            item.quantity.checked_mul(item.unit_price) == Some(item.total)
                && item.quantity >= Decimal::ZERO
                && item.unit_price >= Decimal::ZERO
        });
        let subtotal = checked_sum(self.items.iter().map(|item| item.total));

        items_ok
            && self.tax_rate >= Decimal::ZERO
            && subtotal == Some(self.subtotal)
            && self.subtotal.checked_mul(self.tax_rate) == Some(self.tax)
            && self.subtotal.checked_add(self.tax) == Some(self.total)
    }
}

fn checked_sum(values: impl Iterator<Item = Decimal>) -> Option<Decimal> {
    values.fold(Some(Decimal::ZERO), |sum, value| sum?.checked_add(value))
}

/// System-assigned invoice number until the user dictates one
fn default_invoice_number(issue_date: NaiveDate) -> String {
    format!("INV-{}", issue_date.format("%Y%m%d"))
}

fn due_date_after(issue_date: NaiveDate, days: u32) -> NaiveDate {
    issue_date
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}
