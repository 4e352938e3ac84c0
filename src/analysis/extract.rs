//! Two-pass field extraction
//!
//! Pass 1 runs each still-empty field's cascade over the in-scope text blocks in
//! input order. Pass 2 runs the cascades of fields that are still empty over the
//! concatenated text of all blocks. A value set in pass 1 is never replaced.

use tracing::debug;

use crate::analysis::fields::{CascadeTable, FieldName};
use crate::analysis::record::ReceiptRecord;
use crate::vision::ocr::TextBlock;
use crate::vision::roi::{in_scope, Region};

/// Raw extraction output; empty strings mean "not found"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionRecord {
    values: [String; FieldName::COUNT],
    /// Every block's text followed by a newline, in input order
    pub full_text: String,
}

impl ExtractionRecord {
    pub fn get(&self, field: FieldName) -> &str {
        &self.values[field.index()]
    }

    pub fn is_empty(&self, field: FieldName) -> bool {
        self.values[field.index()].is_empty()
    }

    pub fn set(&mut self, field: FieldName, value: String) {
        self.values[field.index()] = value;
    }

    /// Fields that have no value yet
    pub fn missing(&self) -> Vec<FieldName> {
        FieldName::ALL
            .iter()
            .copied()
            .filter(|&field| self.is_empty(field))
            .collect()
    }

    /// Substitute the sentinel for missing fields
    pub fn package(&self) -> ReceiptRecord {
        ReceiptRecord::from_extraction(self)
    }
}

/// Concatenate block texts, each terminated by a newline
pub fn concat_text(blocks: &[TextBlock]) -> String {
    let mut full_text = String::with_capacity(blocks.iter().map(|b| b.text.len() + 1).sum());
    for block in blocks {
        full_text.push_str(&block.text);
        full_text.push('\n');
    }
    full_text
}

/// Receipt field extractor.
///
/// Holds no per-call state, so one instance can serve any thread.
#[derive(Debug, Clone, Copy)]
pub struct FieldExtractor<'a> {
    cascades: &'a CascadeTable,
}

impl Default for FieldExtractor<'static> {
    fn default() -> Self {
        Self::new(CascadeTable::builtin())
    }
}

impl<'a> FieldExtractor<'a> {
    pub fn new(cascades: &'a CascadeTable) -> Self {
        Self { cascades }
    }

    /// Run both passes over the text blocks
    pub fn extract(&self, blocks: &[TextBlock], regions: &[Region]) -> ExtractionRecord {
        let mut record = ExtractionRecord {
            full_text: concat_text(blocks),
            ..Default::default()
        };

        for (index, block) in blocks.iter().enumerate() {
            if !in_scope(&block.bounds, regions) {
                continue;
            }
            for field in FieldName::ALL {
                if !record.is_empty(field) {
                    continue;
                }
                if let Some(value) = self.cascades.evaluate(field, &block.text) {
                    debug!("{} filled from block {}: {:?}", field, index, value);
                    record.set(field, value);
                }
            }
        }

        for field in record.missing() {
            if let Some(value) = self.cascades.evaluate(field, &record.full_text) {
                debug!("{} filled from full text: {:?}", field, value);
                record.set(field, value);
            }
        }

        record
    }

    /// Extract and package in one step
    pub fn extract_record(&self, blocks: &[TextBlock], regions: &[Region]) -> ReceiptRecord {
        self.extract(blocks, regions).package()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::record::NOT_FOUND;
    use crate::vision::geometry::Rect;

    fn block(text: &str, left: f32, top: f32) -> TextBlock {
        TextBlock::new(text, Rect::new(left, top, left + 100.0, top + 20.0))
    }

    fn region(left: f32, top: f32, right: f32, bottom: f32) -> Region {
        Region {
            bounds: Rect::new(left, top, right, bottom),
        }
    }

    #[test]
    fn test_total_without_regions() {
        let record = FieldExtractor::default().extract(&[block("Total: $42.50", 0.0, 0.0)], &[]);
        assert_eq!(record.get(FieldName::TotalPrice), "$42.50");
    }

    #[test]
    fn test_order_id_from_first_block() {
        let blocks = vec![block("ORDER ID: #A1B2C3", 0.0, 0.0), block("random text", 0.0, 30.0)];
        let record = FieldExtractor::default().extract(&blocks, &[]);
        assert_eq!(record.get(FieldName::OrderId), "A1B2C3");
    }

    #[test]
    fn test_in_scope_block_wins() {
        let blocks = vec![
            block("Subtotal: $99.00", 0.0, 500.0),
            block("Subtotal: $10.00", 0.0, 0.0),
        ];
        let regions = vec![region(0.0, 0.0, 200.0, 50.0)];
        let record = FieldExtractor::default().extract(&blocks, &regions);
        assert_eq!(record.get(FieldName::Subtotal), "$10.00");
    }

    #[test]
    fn test_fallback_uses_full_text() {
        // The date block lies outside every region, so only pass 2 can see it
        let blocks = vec![block("Total: 5.00", 0.0, 0.0), block("Date: 01/02/2024", 0.0, 500.0)];
        let regions = vec![region(0.0, 0.0, 200.0, 50.0)];
        let record = FieldExtractor::default().extract(&blocks, &regions);
        assert_eq!(record.get(FieldName::TotalPrice), "$5.00");
        assert_eq!(record.get(FieldName::Date), "01/02/2024");
    }

    #[test]
    fn test_pass_one_value_not_overwritten() {
        // Full text would match the higher-priority labelled rule, but pass 1
        // already filled the field from the in-scope block
        let blocks = vec![block("ref #QWERTY12", 0.0, 0.0), block("Order ID: 42", 0.0, 500.0)];
        let regions = vec![region(0.0, 0.0, 200.0, 50.0)];
        let record = FieldExtractor::default().extract(&blocks, &regions);
        assert_eq!(record.get(FieldName::OrderId), "QWERTY12");
    }

    #[test]
    fn test_later_blocks_fill_remaining_fields() {
        let blocks = vec![block("Tax: 1.00", 0.0, 0.0), block("Tax: 2.00\nGrand Total 9.00", 0.0, 30.0)];
        let record = FieldExtractor::default().extract(&blocks, &[]);
        assert_eq!(record.get(FieldName::Tax), "$1.00");
        assert_eq!(record.get(FieldName::TotalPrice), "$9.00");
    }

    #[test]
    fn test_full_text_concatenation() {
        let blocks = vec![block("A", 0.0, 0.0), block("B\nC", 0.0, 30.0)];
        assert_eq!(concat_text(&blocks), "A\nB\nC\n");
        assert_eq!(concat_text(&[]), "");
    }

    #[test]
    fn test_street_address_without_label() {
        let record =
            FieldExtractor::default().extract(&[block("123 Main Street, Springfield", 0.0, 0.0)], &[]);
        assert_eq!(record.get(FieldName::Address), "123 Main Street, Springfield");
    }

    #[test]
    fn test_missing_date_is_not_found() {
        let packaged = FieldExtractor::default().extract_record(&[block("hello world", 0.0, 0.0)], &[]);
        assert_eq!(packaged.date, NOT_FOUND);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let blocks = vec![
            block("WALMART SUPERCENTER", 0.0, 0.0),
            block("Date: 03/14/2024", 0.0, 30.0),
            block("Bananas 1.99\nSubtotal 1.99\nTax 0.12\nTotal 2.11", 0.0, 60.0),
        ];
        let extractor = FieldExtractor::default();
        let first = extractor.extract(&blocks, &[]);
        for _ in 0..5 {
            assert_eq!(extractor.extract(&blocks, &[]), first);
        }
    }

    #[test]
    fn test_empty_input() {
        let record = FieldExtractor::default().extract(&[], &[]);
        assert_eq!(record.missing().len(), FieldName::COUNT);
        assert_eq!(record.full_text, "");
    }
}
