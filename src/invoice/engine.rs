//! Invoice state engine
//!
//! Pure reducer: `(invoice, mutation) -> invoice'`. Every branch ends by
//! re-deriving item totals, subtotal, tax and total, so the aggregate
//! invariants hold whatever order mutations arrive in. Requests that would
//! break a range invariant are rejected and the caller keeps its invoice.

use super::model::{Invoice, LineItem};
use super::mutation::{CalendarDate, DueDate, ItemChanges, ItemRef, MutationRequest, NewLineItem};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Semantic rejections of a well-formed mutation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvoiceError {
    #[error("Quantity cannot be negative: {0}")]
    NegativeQuantity(Decimal),

    #[error("Unit price cannot be negative: {0}")]
    NegativeUnitPrice(Decimal),

    #[error("Tax rate cannot be negative: {0}")]
    NegativeTaxRate(Decimal),

    #[error("Item description cannot be empty")]
    EmptyDescription,

    #[error("Invoice number cannot be empty")]
    EmptyInvoiceNumber,

    #[error("Invalid date: {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("Due date out of range: {0} days after issue")]
    DueDateOutOfRange(u32),

    #[error("Amount too large to compute invoice totals")]
    AmountOverflow,
}

/// Applies one mutation to `invoice`.
///
/// `today` is only read by [`MutationRequest::Reset`], which starts a fresh
/// invoice issued that day. Missing item targets are a silent no-op.
pub fn apply(
    invoice: &Invoice,
    mutation: &MutationRequest,
    today: NaiveDate,
) -> Result<Invoice, InvoiceError> {
    let mut next = invoice.clone();

    match mutation {
        MutationRequest::AddItem(item) => add_item(&mut next, item)?,
        MutationRequest::RemoveItem { target } => {
            if let Some(index) = resolve(&next, target) {
                next.items.remove(index);
            }
        }
        MutationRequest::UpdateItem { target, changes } => update_item(&mut next, target, changes)?,
        MutationRequest::SetCustomer { name, address } => {
            if let Some(name) = name {
                next.customer_name = name.trim().to_string();
            }
            if let Some(address) = address {
                next.customer_address = address.trim().to_string();
            }
        }
        MutationRequest::SetTaxRate { rate } => {
            if *rate < Decimal::ZERO {
                return Err(InvoiceError::NegativeTaxRate(*rate));
            }
            next.tax_rate = rate.normalize();
        }
        MutationRequest::SetInvoiceNumber { number } => {
            let number = number.trim();
            if number.is_empty() {
                return Err(InvoiceError::EmptyInvoiceNumber);
            }
            next.invoice_number = number.to_uppercase();
        }
        MutationRequest::SetIssueDate { date } => {
            next.issue_date = calendar_date(date)?;
        }
        MutationRequest::SetDueDate { due } => {
            next.due_date = match due {
                DueDate::On(date) => calendar_date(date)?,
                DueDate::InDays(days) => next
                    .issue_date
                    .checked_add_days(chrono::Days::new(u64::from(*days)))
                    .ok_or(InvoiceError::DueDateOutOfRange(*days))?,
            };
        }
        MutationRequest::SetNotes { notes } => {
            let notes = notes.trim();
            next.notes = if notes.is_empty() {
                None
            } else {
                Some(notes.to_string())
            };
        }
        MutationRequest::Reset => {
            let item_seq = next.item_seq;
            next = Invoice::empty(invoice.invoice_id, today, invoice.due_in_days);
            next.item_seq = item_seq;
        }
    }

    next.recompute_totals().ok_or(InvoiceError::AmountOverflow)?;
    debug_assert!(next.invariants_hold());
    Ok(next)
}

fn add_item(invoice: &mut Invoice, item: &NewLineItem) -> Result<(), InvoiceError> {
    let description = item.description.trim();
    if description.is_empty() {
        return Err(InvoiceError::EmptyDescription);
    }
    check_quantity(item.quantity)?;
    check_unit_price(item.unit_price)?;

    let id = invoice.next_item_id();
    let line = LineItem::new(
        id,
        description.to_string(),
        item.quantity.normalize(),
        item.unit_price.normalize(),
    )
    .ok_or(InvoiceError::AmountOverflow)?;
    invoice.items.push(line);
    Ok(())
}

fn update_item(
    invoice: &mut Invoice,
    target: &ItemRef,
    changes: &ItemChanges,
) -> Result<(), InvoiceError> {
    let description = match &changes.description {
        Some(description) if description.trim().is_empty() => {
            return Err(InvoiceError::EmptyDescription)
        }
        Some(description) => Some(description.trim().to_string()),
        None => None,
    };
    if let Some(quantity) = changes.quantity {
        check_quantity(quantity)?;
    }
    if let Some(unit_price) = changes.unit_price {
        check_unit_price(unit_price)?;
    }

    let Some(index) = resolve(invoice, target) else {
        return Ok(());
    };
    let item = &mut invoice.items[index];
    if let Some(description) = description {
        item.description = description;
    }
    if let Some(quantity) = changes.quantity {
        item.quantity = quantity.normalize();
    }
    if let Some(unit_price) = changes.unit_price {
        item.unit_price = unit_price.normalize();
    }
    item.recompute().ok_or(InvoiceError::AmountOverflow)?;
    Ok(())
}

/// Index of the referenced item, `None` when nothing matches
fn resolve(invoice: &Invoice, target: &ItemRef) -> Option<usize> {
    match target {
        ItemRef::Id(id) => invoice.items.iter().position(|item| item.id == *id),
        ItemRef::Position(position) => position
            .checked_sub(1)
            .filter(|index| *index < invoice.items.len()),
        ItemRef::Last => invoice.items.len().checked_sub(1),
    }
}

fn check_quantity(quantity: Decimal) -> Result<(), InvoiceError> {
    if quantity < Decimal::ZERO {
        return Err(InvoiceError::NegativeQuantity(quantity));
    }
    Ok(())
}

fn check_unit_price(unit_price: Decimal) -> Result<(), InvoiceError> {
    if unit_price < Decimal::ZERO {
        return Err(InvoiceError::NegativeUnitPrice(unit_price));
    }
    Ok(())
}

fn calendar_date(date: &CalendarDate) -> Result<NaiveDate, InvoiceError> {
    NaiveDate::from_ymd_opt(date.year, date.month, date.day).ok_or(InvoiceError::InvalidDate {
        year: date.year,
        month: date.month,
        day: date.day,
    })
}
