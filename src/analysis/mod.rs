//! Receipt Analysis
//!
//! Turns OCR text blocks into the structured receipt record: per-field pattern
//! cascades, the two-pass extractor and the packaged result.

pub mod extract;
pub mod fields;
pub mod record;

pub use extract::{concat_text, ExtractionRecord, FieldExtractor};
pub use fields::{
    builtin_rules, normalize_whitespace, Cascade, CascadeTable, FieldName, GroupSelector,
    PatternRule, RuleSpec, ValueFormat,
};
pub use record::{ReceiptRecord, NOT_FOUND};
