//! Pattern rule table
//!
//! One ordered list of `(locale, kind, pattern, extractor)` rules over
//! normalized text. Rules are evaluated in order and the first match wins, so
//! within a locale the more specific phrasings come first:
//! "add 5 units of paint at 20 each" must be claimed by the quantity rule
//! before the generic "add X P" rule can swallow "5 units of paint".
//!
//! Patterns are compiled once, on first use.

use super::types::{keys, CommandKind, Payload, PayloadValue};
use crate::stt::Language;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Maps the captures of a rule's own pattern to a payload
pub type Extract = fn(&Captures<'_>) -> Payload;

/// A single recognition rule
pub struct Rule {
    language: Language,
    kind: CommandKind,
    pattern: Regex,
    extract: Extract,
}

impl Rule {
    fn new(language: Language, kind: CommandKind, pattern: &str, extract: Extract) -> Self {
        let pattern = Regex::new(pattern)
            .unwrap_or_else(|e| panic!("invalid {:?} rule pattern {}: {}", kind, pattern, e));
        Self {
            language,
            kind,
            pattern,
            extract,
        }
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Payload extracted from `normalized`, `None` when the pattern does not match
    pub fn apply(&self, normalized: &str) -> Option<Payload> {
        self.pattern
            .captures(normalized)
            .map(|captures| (self.extract)(&captures))
    }
}

/// The complete rule table, English rules first
pub static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    let mut rules = english_rules();
    rules.extend(french_rules());
    rules
});

/// Amount with comma or dot decimal separator
const NUM: &str = r"-?\d+(?:[.,]\d+)?";

/// ISO (2026-03-15) or day-first (15/03/2026, 15.03.2026) date
const DATE: &str = r"(?:(?P<iso_year>\d{4})-(?P<iso_month>\d{1,2})-(?P<iso_day>\d{1,2})|(?P<dmy_day>\d{1,2})[/.-](?P<dmy_month>\d{1,2})[/.-](?P<dmy_year>\d{4}))";

const CURRENCY: &str = r"(?: ?(?:€|\$|euros?|dollars?))?";

fn english_rules() -> Vec<Rule> {
    use CommandKind::*;

    let num = NUM;
    let date = DATE;
    let currency = CURRENCY;
    let price = format!(
        r"\$?(?P<unit_price>{num}){currency}(?: (?:each|apiece|a piece|per unit|per item))?"
    );
    let item = r"(?:(?:item|line)(?: number)? (?P<item>\d+)|(?:the )?(?P<last>last)(?: item| line| one| entry)?)";
    let set = r"(?:(?:set|change|update|make) )?(?:the )?";
    let connector = r"(?:is |to |as |: ?)?";

    let en = |kind, pattern: String, extract: Extract| {
        Rule::new(Language::English, kind, &pattern, extract)
    };

    vec![
        // Navigation and whole-invoice phrases
        en(ShowPreview, r"^(?:(?:show|open|display|see)(?: me)? (?:the )?(?:invoice )?preview|preview(?: (?:the )?invoice)?)$".to_string(), no_payload),
        en(GenerateDocument, r"^(?:generate|create|export|download|make) (?:the |a |an )?(?:invoice )?(?:pdf|document)$".to_string(), no_payload),
        en(Reset, r"^(?:(?:start (?:a )?)?new invoice|(?:reset|clear)(?: the)? invoice|start over)$".to_string(), no_payload),
        // Notes before "add": "add note ..." is not an item
        en(SetNotes, format!(r"^(?:(?:add|set) )?(?:a |the )?notes?:? {connector}(?P<notes>.+)$"), fields),
        // Item updates
        en(UpdateItem, format!(r"^(?:change|set|update|make) (?:the )?(?:quantity|qty) (?:of |for |on )?{item} to (?P<quantity>{num})$"), fields_with_item),
        en(UpdateItem, format!(r"^(?:change|set|update|make) (?:the )?(?:unit )?price (?:of |for |on )?{item} to {price}$"), fields_with_item),
        en(UpdateItem, format!(r"^(?:change|set|update) (?:the )?description (?:of |for )?{item} to (?P<description>.+)$"), fields_with_item),
        en(UpdateItem, format!(r"^rename {item} (?:to|as) (?P<description>.+)$"), fields_with_item),
        en(RemoveItem, format!(r"^(?:remove|delete|drop|scratch) (?:the )?{item}$"), fields_with_item),
        // Customer: address is more specific than name
        en(SetCustomer, format!(r"^{set}(?:customer|client|billing) address {connector}(?P<customer_address>.+)$"), fields),
        en(SetCustomer, format!(r"^{set}(?:customer|client)(?: name)? {connector}(?P<customer_name>.+)$"), fields),
        en(SetCustomer, r"^bill to (?P<customer_name>.+)$".to_string(), fields),
        en(SetTaxRate, format!(r"^{set}(?:tax|vat|gst|sales tax)(?: rate)? (?:to |at |is |of |= ?)?(?P<tax_percent>{num}) ?(?:%|percent|per cent)?$"), fields),
        en(SetInvoiceNumber, format!(r"^{set}invoice (?:number|no|num|#)\.? {connector}(?P<invoice_number>.+)$"), fields),
        // Due date before issue date
        en(SetDueDate, format!(r"^{set}(?:payment )?(?:due date|due) (?:is |to |as |on |: ?)?{date}$"), calendar),
        en(SetDueDate, r"^(?:(?:set|make) )?(?:the )?(?:invoice |payment )?(?:due date|due|payable|payment terms?) (?:in |of |within )?(?P<days>\d+) days?$".to_string(), fields),
        en(SetDate, format!(r"^{set}(?:invoice date|issue date|date)(?: of issue)? (?:is |to |as |on |: ?)?{date}$"), calendar),
        // Items, most specific phrasing first
        en(AddItem, format!(r"^add (?P<quantity>{num}) (?:units?|pieces?|pcs|items?|boxes|box|packs?) of (?P<description>.+?) (?:at|for|@) {price}$"), fields),
        en(AddItem, format!(r"^add (?P<quantity>{num}) (?P<description>.+?) (?:at|for|@) {price}$"), fields),
        en(AddItem, format!(r"^add (?P<description>.+?) (?:at|for|@) {price}$"), fields),
        en(AddItem, format!(r"^add (?P<quantity>{num}) (?P<description>.+) \$?(?P<unit_price>{num}){currency}$"), fields),
        en(AddItem, format!(r"^add (?P<description>.+) \$?(?P<unit_price>{num}){currency}$"), fields),
    ]
}

fn french_rules() -> Vec<Rule> {
    use CommandKind::*;

    let num = NUM;
    let date = DATE;
    let currency = CURRENCY;
    let price = format!(
        r"(?P<unit_price>{num}){currency}(?: (?:chacun|chacune|l'unité|la pièce|pièce|par unité|par article))?"
    );
    let item = r"(?:(?:l'|la |le )?(?:article|ligne|élément)(?: numéro| n°)? (?P<item>\d+)|(?:le |la )?(?P<last>derni(?:er|ère))(?: article| ligne| élément)?)";
    let set = r"(?:(?:définir|changer|mettre|modifier|fixer) )?";
    let add = r"(?:ajoute|ajouter|ajoutez|rajoute|rajouter)";
    let at = r"(?:à|a|pour|au prix de)";

    let fr = |kind, pattern: String, extract: Extract| {
        Rule::new(Language::French, kind, &pattern, extract)
    };

    vec![
        // Navigation and whole-invoice phrases
        fr(ShowPreview, r"^(?:(?:afficher|affiche|montrer|montre|voir) )?(?:l'|un )?aperçu(?: de la facture)?$".to_string(), no_payload),
        fr(GenerateDocument, r"^(?:générer|génère|créer|crée|exporter|exporte|télécharger) (?:le |la |un )?(?:pdf|document|facture en pdf)$".to_string(), no_payload),
        fr(Reset, r"^(?:(?:créer une |commencer une )?nouvelle facture|recommencer|réinitialiser(?: la)? facture)$".to_string(), no_payload),
        // Notes before "ajouter": "ajouter une note ..." is not an item
        fr(SetNotes, format!(r"^(?:(?:{add}|mettre|mets) )?(?:une |la )?(?:notes?|remarques?)(?: :|:)? (?P<notes>.+)$"), fields),
        // Item updates
        fr(UpdateItem, format!(r"^(?:changer|modifier|mettre|passer) (?:la )?quantité (?:de |du |pour )?{item} (?:à|a|en) (?P<quantity>{num})$"), fields_with_item),
        fr(UpdateItem, format!(r"^(?:changer|modifier|mettre|passer) (?:le )?prix(?: unitaire)? (?:de |du |pour )?{item} (?:à|a|en) {price}$"), fields_with_item),
        fr(UpdateItem, format!(r"^(?:changer|modifier) (?:la )?description (?:de |du )?{item} (?:en|par|à) (?P<description>.+)$"), fields_with_item),
        fr(UpdateItem, format!(r"^renommer {item} en (?P<description>.+)$"), fields_with_item),
        fr(RemoveItem, format!(r"^(?:supprime|supprimer|supprimez|retire|retirer|retirez|enlève|enlever|enlevez|efface|effacer) {item}$"), fields_with_item),
        // Customer: address is more specific than name
        fr(SetCustomer, format!(r"^{set}(?:l')?adresse(?: du client| client| de facturation)?(?: est| :|:)? (?P<customer_address>.+)$"), fields),
        fr(SetCustomer, format!(r"^{set}(?:le )?(?:nom du client|client)(?: est| :|:)? (?P<customer_name>.+)$"), fields),
        fr(SetCustomer, r"^factur(?:er|ez|e) à (?P<customer_name>.+)$".to_string(), fields),
        fr(SetTaxRate, format!(r"^{set}(?:la |le )?(?:taux de tva|taux de taxe|tva|taxe)(?: est de| est| à| a| de)? (?P<tax_percent>{num}) ?(?:%|pour ?cent)?$"), fields),
        fr(SetInvoiceNumber, format!(r"^{set}(?:le )?(?:numéro de (?:la )?facture|facture numéro|facture n°)(?: est| :|:)? (?P<invoice_number>.+)$"), fields),
        // Due date before issue date
        fr(SetDueDate, format!(r"^{set}(?:la )?(?:date d'échéance|échéance|date limite de paiement)(?: est| :|:)? (?:le |au )?{date}$"), calendar),
        fr(SetDueDate, r"^(?:(?:la )?date d'échéance|échéance|payable|paiement) (?:à |sous |dans |de )?(?P<days>\d+) jours?$".to_string(), fields),
        fr(SetDate, format!(r"^{set}(?:la )?date(?: de (?:la )?facture| d'émission| de facturation)?(?: est| :|:)? (?:le |au )?{date}$"), calendar),
        // Items, most specific phrasing first
        fr(AddItem, format!(r"^{add} (?P<quantity>{num}) (?:unités?|pièces?|boîtes?|lots?) (?:de |d')(?P<description>.+?) {at} {price}$"), fields),
        fr(AddItem, format!(r"^{add} (?P<quantity>{num}) (?P<description>.+?) {at} {price}$"), fields),
        fr(AddItem, format!(r"^{add} (?P<description>.+?) {at} {price}$"), fields),
        fr(AddItem, format!(r"^{add} (?P<quantity>{num}) (?P<description>.+) (?P<unit_price>{num}){currency}$"), fields),
        fr(AddItem, format!(r"^{add} (?P<description>.+) (?P<unit_price>{num}){currency}$"), fields),
    ]
}

/// Capture groups copied as text
const TEXT_GROUPS: [&str; 5] = [
    keys::DESCRIPTION,
    keys::CUSTOMER_NAME,
    keys::CUSTOMER_ADDRESS,
    keys::INVOICE_NUMBER,
    keys::NOTES,
];

/// Capture groups parsed as amounts
const NUMBER_GROUPS: [&str; 4] = [keys::QUANTITY, keys::UNIT_PRICE, keys::TAX_PERCENT, keys::DAYS];

fn no_payload(_: &Captures<'_>) -> Payload {
    Payload::new()
}

fn fields(captures: &Captures<'_>) -> Payload {
    let mut payload = Payload::new();
    for key in TEXT_GROUPS {
        if let Some(text) = captures.name(key) {
            payload.insert(key, PayloadValue::Text(text.as_str().trim().to_string()));
        }
    }
    for key in NUMBER_GROUPS {
        if let Some(number) = captures.name(key) {
            payload.insert(key, number_value(number.as_str()));
        }
    }
    payload
}

/// `fields` plus the item reference, every "last" synonym folded to one token
fn fields_with_item(captures: &Captures<'_>) -> Payload {
    let mut payload = fields(captures);
    if captures.name("last").is_some() {
        payload.insert(keys::ITEM, PayloadValue::Text(keys::LAST.to_string()));
    } else if let Some(position) = captures.name("item") {
        payload.insert(keys::ITEM, number_value(position.as_str()));
    }
    payload
}

fn calendar(captures: &Captures<'_>) -> Payload {
    let parts = if captures.name("iso_year").is_some() {
        ["iso_year", "iso_month", "iso_day"]
    } else {
        ["dmy_year", "dmy_month", "dmy_day"]
    };

    let mut payload = Payload::new();
    for (key, group) in [keys::YEAR, keys::MONTH, keys::DAY].into_iter().zip(parts) {
        if let Some(value) = captures.name(group) {
            payload.insert(key, number_value(value.as_str()));
        }
    }
    payload
}

/// Parses a dictated amount, accepting a comma decimal separator
pub fn parse_number(text: &str) -> Option<Decimal> {
    Decimal::from_str(&text.trim().replace(',', ".")).ok()
}

/// Digits too long for a decimal stay as text, the translator then falls back to defaults
fn number_value(text: &str) -> PayloadValue {
    match parse_number(text) {
        Some(number) => PayloadValue::Number(number),
        None => PayloadValue::Text(text.to_string()),
    }
}
