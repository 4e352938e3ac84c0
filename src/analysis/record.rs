//! Packaged receipt record handed to the presentation layer

use serde::{Deserialize, Serialize};

use crate::analysis::extract::ExtractionRecord;
use crate::analysis::fields::FieldName;

/// Placeholder for a field no pattern matched
pub const NOT_FOUND: &str = "Not found";

/// Final extraction result. Every field is either a value or [`NOT_FOUND`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptRecord {
    pub address: String,
    pub date: String,
    pub item: String,
    pub order_id: String,
    pub subtotal: String,
    pub tax: String,
    pub title: String,
    pub total_price: String,
    /// Raw concatenated OCR text
    pub full_text: String,
    /// Legacy alias of `title`
    pub name: String,
    /// Legacy alias of `total_price`
    pub amount: String,
}

fn or_sentinel(value: &str) -> String {
    if value.is_empty() {
        NOT_FOUND.to_string()
    } else {
        value.to_string()
    }
}

impl ReceiptRecord {
    pub fn from_extraction(extraction: &ExtractionRecord) -> Self {
        let field = |name: FieldName| or_sentinel(extraction.get(name));

        Self {
            address: field(FieldName::Address),
            date: field(FieldName::Date),
            item: field(FieldName::Item),
            order_id: field(FieldName::OrderId),
            subtotal: field(FieldName::Subtotal),
            tax: field(FieldName::Tax),
            title: field(FieldName::Title),
            total_price: field(FieldName::TotalPrice),
            full_text: extraction.full_text.clone(),
            name: field(FieldName::Title),
            amount: field(FieldName::TotalPrice),
        }
    }

    /// Value of a field
    pub fn get(&self, field: FieldName) -> &str {
        match field {
            FieldName::Address => &self.address,
            FieldName::Date => &self.date,
            FieldName::Item => &self.item,
            FieldName::OrderId => &self.order_id,
            FieldName::Subtotal => &self.subtotal,
            FieldName::Tax => &self.tax,
            FieldName::Title => &self.title,
            FieldName::TotalPrice => &self.total_price,
        }
    }

    /// Field key/value pairs in declaration order (aliases and full text excluded)
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        FieldName::ALL.iter().map(move |&f| (f.key(), self.get(f)))
    }
}
