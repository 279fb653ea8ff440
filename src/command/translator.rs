//! Structured command to typed mutation
//!
//! Keeps the loosely-typed payload at the matcher boundary. Missing or
//! unusable payload values fall back to defaults here: quantity 1, amounts 0.

use super::types::{keys, CommandKind, PayloadValue, StructuredCommand};
use crate::invoice::{CalendarDate, DueDate, ItemChanges, ItemRef, MutationRequest, NewLineItem};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Maps a recognized command to the mutation it requests.
///
/// Returns `None` for kinds that do not touch the invoice (navigation,
/// unrecognized speech) and for commands whose payload cannot name a
/// date.
pub fn translate(command: &StructuredCommand) -> Option<MutationRequest> {
    match command.kind {
        CommandKind::AddItem => Some(MutationRequest::AddItem(NewLineItem {
            description: text(command, keys::DESCRIPTION).unwrap_or_default(),
            quantity: command.number(keys::QUANTITY).unwrap_or(Decimal::ONE),
            unit_price: command.number(keys::UNIT_PRICE).unwrap_or(Decimal::ZERO),
        })),
        CommandKind::RemoveItem => Some(MutationRequest::RemoveItem {
            target: item_ref(command),
        }),
        CommandKind::UpdateItem => Some(MutationRequest::UpdateItem {
            target: item_ref(command),
            changes: ItemChanges {
                description: text(command, keys::DESCRIPTION),
                quantity: command.number(keys::QUANTITY),
                unit_price: command.number(keys::UNIT_PRICE),
            },
        }),
        CommandKind::SetCustomer => Some(MutationRequest::SetCustomer {
            name: text(command, keys::CUSTOMER_NAME),
            address: text(command, keys::CUSTOMER_ADDRESS),
        }),
        CommandKind::SetTaxRate => Some(MutationRequest::SetTaxRate {
            rate: command.number(keys::TAX_PERCENT).unwrap_or(Decimal::ZERO) / Decimal::ONE_HUNDRED,
        }),
        CommandKind::SetInvoiceNumber => Some(MutationRequest::SetInvoiceNumber {
            number: text(command, keys::INVOICE_NUMBER).unwrap_or_default(),
        }),
        CommandKind::SetDate => calendar_date(command).map(|date| MutationRequest::SetIssueDate { date }),
        CommandKind::SetDueDate => due_date(command).map(|due| MutationRequest::SetDueDate { due }),
        CommandKind::SetNotes => Some(MutationRequest::SetNotes {
            notes: text(command, keys::NOTES).unwrap_or_default(),
        }),
        CommandKind::Reset => Some(MutationRequest::Reset),
        CommandKind::ShowPreview | CommandKind::GenerateDocument | CommandKind::Unrecognized => None,
    }
}

fn text(command: &StructuredCommand, key: &str) -> Option<String> {
    command.text(key).map(str::to_string)
}

fn item_ref(command: &StructuredCommand) -> ItemRef {
    match command.payload.get(keys::ITEM) {
        Some(PayloadValue::Number(position)) => {
            // Fractional or negative positions never name an item
            ItemRef::Position(position.to_usize().filter(|_| position.fract().is_zero()).unwrap_or(0))
        }
        Some(PayloadValue::Text(text)) if text == keys::LAST => ItemRef::Last,
        Some(PayloadValue::Text(text)) => Uuid::parse_str(text)
            .map(ItemRef::Id)
            .unwrap_or(ItemRef::Position(0)),
        None => ItemRef::Last,
    }
}

fn calendar_date(command: &StructuredCommand) -> Option<CalendarDate> {
    let year = command.number(keys::YEAR)?.to_i32()?;
    let month = command.number(keys::MONTH)?.to_u32()?;
    let day = command.number(keys::DAY)?.to_u32()?;
    Some(CalendarDate::new(year, month, day))
}

// Offsets past u32 saturate so the engine reports them out of range
fn due_date(command: &StructuredCommand) -> Option<DueDate> {
    match command.payload.get(keys::DAYS) {
        Some(PayloadValue::Number(days)) => Some(DueDate::InDays(days.to_u32().unwrap_or(u32::MAX))),
        Some(PayloadValue::Text(_)) => Some(DueDate::InDays(u32::MAX)),
        None => calendar_date(command).map(DueDate::On),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::matcher::CommandMatcher;
    use crate::command::types::Payload;
    use std::str::FromStr;

    fn translated(utterance: &str) -> Option<MutationRequest> {
        translate(&CommandMatcher::default().match_utterance(utterance))
    }

    fn dec(text: &str) -> Decimal {
        Decimal::from_str(text).expect("valid decimal")
    }

    #[test]
    fn add_item_with_quantity_and_price() {
        assert_eq!(
            translated("Add 5 units of paint at 20 each"),
            Some(MutationRequest::AddItem(NewLineItem {
                description: "paint".to_string(),
                quantity: Decimal::from(5),
                unit_price: Decimal::from(20),
            }))
        );
    }

    #[test]
    fn add_item_defaults_quantity_to_one() {
        assert_eq!(
            translated("add consulting at 150"),
            Some(MutationRequest::AddItem(NewLineItem {
                description: "consulting".to_string(),
                quantity: Decimal::ONE,
                unit_price: Decimal::from(150),
            }))
        );
    }

    #[test]
    fn locales_produce_identical_mutations() {
        let pairs = [
            ("add 3 widgets at 40", "ajouter 3 widgets à 40"),
            ("remove the last item", "supprimer le dernier article"),
            ("remove item 2", "supprimer l'article 2"),
            ("set tax to 10%", "tva à 10 %"),
            ("customer is acme", "client acme"),
            ("due in 45 days", "échéance dans 45 jours"),
            ("invoice date 15/03/2026", "date de la facture 15/03/2026"),
        ];

        for (english, french) in pairs {
            let left = translated(english);
            assert!(left.is_some(), "no mutation for '{}'", english);
            assert_eq!(left, translated(french), "'{}' vs '{}'", english, french);
        }
    }

    #[test]
    fn huge_due_offsets_saturate() {
        for utterance in [
            "due in 99999999999 days",
            "due in 1234567890123456789012345678901234567890 days",
            "échéance dans 4294967296 jours",
        ] {
            assert_eq!(
                translated(utterance),
                Some(MutationRequest::SetDueDate {
                    due: DueDate::InDays(u32::MAX)
                }),
                "'{}'",
                utterance
            );
        }
    }

    #[test]
    fn tax_percent_becomes_a_fraction() {
        assert_eq!(
            translated("set tax rate to 8.5 percent"),
            Some(MutationRequest::SetTaxRate { rate: dec("0.085") })
        );
        assert_eq!(
            translated("TVA à 20,5 %"),
            Some(MutationRequest::SetTaxRate { rate: dec("0.205") })
        );
    }

    #[test]
    fn item_references() {
        assert_eq!(
            translated("delete line 3"),
            Some(MutationRequest::RemoveItem {
                target: ItemRef::Position(3)
            })
        );
        assert_eq!(
            translated("supprimer la dernière ligne"),
            Some(MutationRequest::RemoveItem { target: ItemRef::Last })
        );
    }

    #[test]
    fn explicit_item_id_is_honored() {
        let id = Uuid::new_v4();
        let mut payload = Payload::new();
        payload.insert(keys::ITEM, PayloadValue::Text(id.to_string()));
        let command = StructuredCommand {
            kind: CommandKind::RemoveItem,
            payload,
            raw: String::new(),
            confidence: 1.0,
        };

        assert_eq!(
            translate(&command),
            Some(MutationRequest::RemoveItem {
                target: ItemRef::Id(id)
            })
        );
    }

    #[test]
    fn update_carries_only_spoken_fields() {
        assert_eq!(
            translated("change the quantity of item 2 to 7"),
            Some(MutationRequest::UpdateItem {
                target: ItemRef::Position(2),
                changes: ItemChanges {
                    quantity: Some(Decimal::from(7)),
                    ..ItemChanges::default()
                },
            })
        );
        assert_eq!(
            translated("rename the last item to premium paint"),
            Some(MutationRequest::UpdateItem {
                target: ItemRef::Last,
                changes: ItemChanges {
                    description: Some("premium paint".to_string()),
                    ..ItemChanges::default()
                },
            })
        );
    }

    #[test]
    fn customer_fields_are_independent() {
        assert_eq!(
            translated("customer address 12 rue de la paix, paris"),
            Some(MutationRequest::SetCustomer {
                name: None,
                address: Some("12 rue de la paix, paris".to_string()),
            })
        );
        assert_eq!(
            translated("bill to globex"),
            Some(MutationRequest::SetCustomer {
                name: Some("globex".to_string()),
                address: None,
            })
        );
    }

    #[test]
    fn dates_translate_to_calendar_values() {
        assert_eq!(
            translated("due date 2026-04-30"),
            Some(MutationRequest::SetDueDate {
                due: DueDate::On(CalendarDate::new(2026, 4, 30))
            })
        );
        // Invalid calendar values are still forwarded, the engine rejects them
        assert_eq!(
            translated("invoice date 31/02/2026"),
            Some(MutationRequest::SetIssueDate {
                date: CalendarDate::new(2026, 2, 31)
            })
        );
    }

    #[test]
    fn reset_and_notes() {
        assert_eq!(translated("new invoice"), Some(MutationRequest::Reset));
        assert_eq!(
            translated("note: payment by bank transfer"),
            Some(MutationRequest::SetNotes {
                notes: "payment by bank transfer".to_string()
            })
        );
    }

    #[test]
    fn navigation_and_unknown_speech_do_not_mutate() {
        assert_eq!(translated("show preview"), None);
        assert_eq!(translated("generate pdf"), None);
        assert_eq!(translated("what a lovely day"), None);
    }

    #[test]
    fn missing_payload_falls_back_to_defaults() {
        let command = StructuredCommand {
            kind: CommandKind::AddItem,
            payload: Payload::new(),
            raw: String::new(),
            confidence: 0.9,
        };

        assert_eq!(
            translate(&command),
            Some(MutationRequest::AddItem(NewLineItem {
                description: String::new(),
                quantity: Decimal::ONE,
                unit_price: Decimal::ZERO,
            }))
        );
    }
}
