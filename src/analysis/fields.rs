//! Receipt fields and their pattern cascades
//!
//! Every field owns an ordered list of pattern rules. Rules are tried in declaration
//! order and the first one producing a non-empty value wins, so earlier rules always
//! take priority over later ones for the same text.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ScanError;

/// The eight business fields extracted from a receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    Address,
    Date,
    Item,
    OrderId,
    Subtotal,
    Tax,
    Title,
    TotalPrice,
}

impl FieldName {
    pub const COUNT: usize = 8;

    /// All fields in declaration order
    pub const ALL: [FieldName; Self::COUNT] = [
        FieldName::Address,
        FieldName::Date,
        FieldName::Item,
        FieldName::OrderId,
        FieldName::Subtotal,
        FieldName::Tax,
        FieldName::Title,
        FieldName::TotalPrice,
    ];

    /// Key used in the packaged output record
    pub fn key(&self) -> &'static str {
        match self {
            FieldName::Address => "address",
            FieldName::Date => "date",
            FieldName::Item => "item",
            FieldName::OrderId => "order_id",
            FieldName::Subtotal => "subtotal",
            FieldName::Tax => "tax",
            FieldName::Title => "title",
            FieldName::TotalPrice => "total_price",
        }
    }

    /// Substring the object detector uses in its class label for this field
    pub fn detector_class(&self) -> &'static str {
        match self {
            FieldName::Address => "address",
            FieldName::Date => "date",
            FieldName::Item => "item",
            FieldName::OrderId => "orderid",
            FieldName::Subtotal => "subtotal",
            FieldName::Tax => "tax",
            FieldName::Title => "title",
            FieldName::TotalPrice => "totalprice",
        }
    }

    /// How matched values for this field are formatted
    pub fn value_format(&self) -> ValueFormat {
        match self {
            FieldName::Subtotal | FieldName::Tax | FieldName::TotalPrice => ValueFormat::Currency,
            _ => ValueFormat::Text,
        }
    }

    /// Which capture group carries the value for this field
    pub fn group_selector(&self) -> GroupSelector {
        match self {
            FieldName::Date => GroupSelector::Last,
            _ => GroupSelector::First,
        }
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Capture group a rule reads its value from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupSelector {
    #[default]
    First,
    Last,
}

/// Post-processing applied to a matched value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    /// Trimmed, whitespace runs collapsed
    #[default]
    Text,
    /// Like `Text`, prefixed with `$`
    Currency,
}

/// Trim and collapse internal whitespace runs into single spaces
pub fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A single compiled pattern in a field cascade
#[derive(Debug, Clone)]
pub struct PatternRule {
    pattern: Regex,
    group: GroupSelector,
    format: ValueFormat,
}

impl PatternRule {
    pub fn new(pattern: Regex, group: GroupSelector, format: ValueFormat) -> Self {
        Self { pattern, group, format }
    }

    /// Find the pattern anywhere in `text` and return the formatted value
    pub fn apply(&self, text: &str) -> Option<String> {
        let captures = self.pattern.captures(text)?;
        let group = match self.group {
            GroupSelector::First => captures.get(1),
            GroupSelector::Last => captures.get(captures.len() - 1),
        }?;

        let value = normalize_whitespace(group.as_str());
        if value.is_empty() {
            return None;
        }

        Some(match self.format {
            ValueFormat::Text => value,
            ValueFormat::Currency => format!("${}", value),
        })
    }
}

/// Ordered pattern rules for one field
#[derive(Debug, Clone)]
pub struct Cascade {
    field: FieldName,
    rules: Vec<PatternRule>,
}

impl Cascade {
    pub fn field(&self) -> FieldName {
        self.field
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// Evaluate rules in order; the first non-empty value wins
    pub fn evaluate(&self, text: &str) -> Option<String> {
        self.rules.iter().find_map(|rule| rule.apply(text))
    }
}

/// Declarative description of a pattern rule before compilation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Field whose cascade receives this rule
    pub field: FieldName,
    /// Regular expression; the value is read from a capture group
    pub pattern: String,
    /// Match ignoring letter case
    #[serde(default = "default_case_insensitive")]
    pub case_insensitive: bool,
    /// `^`/`$` match at line boundaries
    #[serde(default)]
    pub multi_line: bool,
    /// Unicode-aware `\w`, `\s`, `\d` and case folding. When off, these are ASCII-only.
    #[serde(default = "default_unicode")]
    pub unicode: bool,
}

fn default_case_insensitive() -> bool {
    true
}

fn default_unicode() -> bool {
    true
}

impl RuleSpec {
    pub fn new(field: FieldName, pattern: impl Into<String>) -> Self {
        Self {
            field,
            pattern: pattern.into(),
            case_insensitive: true,
            multi_line: false,
            unicode: true,
        }
    }

    pub fn case_sensitive(mut self) -> Self {
        self.case_insensitive = false;
        self
    }

    pub fn multi_line(mut self) -> Self {
        self.multi_line = true;
        self
    }

    /// Restrict character classes and case folding to ASCII
    pub fn ascii(mut self) -> Self {
        self.unicode = false;
        self
    }

    /// Compile into a rule using the field's group selector and value format
    pub fn compile(&self) -> Result<PatternRule, ScanError> {
        let pattern = RegexBuilder::new(&self.pattern)
            .case_insensitive(self.case_insensitive)
            .multi_line(self.multi_line)
            .unicode(self.unicode)
            .build()
            .map_err(|source| ScanError::InvalidPattern {
                field: self.field,
                pattern: self.pattern.clone(),
                source,
            })?;

        Ok(PatternRule::new(
            pattern,
            self.field.group_selector(),
            self.field.value_format(),
        ))
    }
}

const MONTHS: &str = "jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec";
const AMOUNT: &str = r"[:\s]*\$?\s*([0-9,]+\.?[0-9]*)";
const NUMERIC_DATE: &str = r"(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})";

/// Built-in rules, in cascade order per field. All of them match ASCII only.
pub fn builtin_rules() -> Vec<RuleSpec> {
    use FieldName::*;

    let rules = vec![
        // Address: labelled, then street-shaped
        RuleSpec::new(Address, r"address[:\s]*([\w\s,.-]+?)(?:\n|$|phone|tel|email|zip)"),
        RuleSpec::new(Address, r"ship\s*to[:\s]*([\w\s,.-]+?)(?:\n|$|phone|tel|email)"),
        RuleSpec::new(Address, r"billing[:\s]*address[:\s]*([\w\s,.-]+?)(?:\n|$|phone|tel)"),
        RuleSpec::new(
            Address,
            r"(\d+\s+[\w\s]+(?:street|st|avenue|ave|road|rd|drive|dr|lane|ln|blvd|boulevard)[\w\s,]*)",
        ),
        // Date: labelled numeric, bare numeric, then month names
        RuleSpec::new(Date, format!(r"date[:\s]*{}", NUMERIC_DATE)),
        RuleSpec::new(Date, format!(r"order\s*date[:\s]*{}", NUMERIC_DATE)),
        RuleSpec::new(Date, NUMERIC_DATE).case_sensitive(),
        RuleSpec::new(Date, r"(\d{2,4}[/-]\d{1,2}[/-]\d{1,2})").case_sensitive(),
        RuleSpec::new(Date, format!(r"({})[a-z]*[\s,]+\d{{1,2}}[\s,]+\d{{2,4}}", MONTHS)),
        RuleSpec::new(Date, format!(r"\d{{1,2}}\s+({})[a-z]*\s+\d{{2,4}}", MONTHS)),
        // Item: labelled, then a description line followed by a price
        RuleSpec::new(Item, r"item[:\s]*([\w\s.-]+?)(?:\n|qty|quantity|price|\$)"),
        RuleSpec::new(Item, r"product[:\s]*([\w\s.-]+?)(?:\n|qty|quantity|price|\$)"),
        RuleSpec::new(Item, r"description[:\s]*([\w\s.-]+?)(?:\n|qty|quantity|price|\$)"),
        RuleSpec::new(Item, r"([A-Za-z][\w\s.-]{3,})\s+\$?\d+\.\d{2}").case_sensitive(),
        // Order id: labelled, then a bare #-prefixed token
        RuleSpec::new(OrderId, r"order[\s#]*id[:\s#]*([A-Za-z0-9-]+)"),
        RuleSpec::new(OrderId, r"order[\s#]*number[:\s#]*([A-Za-z0-9-]+)"),
        RuleSpec::new(OrderId, r"receipt[\s#]*number[:\s#]*([A-Za-z0-9-]+)"),
        RuleSpec::new(OrderId, r"transaction[\s#]*id[:\s#]*([A-Za-z0-9-]+)"),
        RuleSpec::new(OrderId, r"#([A-Za-z0-9-]{6,})").case_sensitive(),
        // Amounts
        RuleSpec::new(Subtotal, format!("subtotal{}", AMOUNT)),
        RuleSpec::new(Subtotal, format!(r"sub[\s-]*total{}", AMOUNT)),
        RuleSpec::new(Subtotal, format!(r"before\s*tax{}", AMOUNT)),
        RuleSpec::new(Tax, format!("tax{}", AMOUNT)),
        RuleSpec::new(Tax, format!(r"sales\s*tax{}", AMOUNT)),
        RuleSpec::new(Tax, format!("vat{}", AMOUNT)),
        RuleSpec::new(Tax, format!("gst{}", AMOUNT)),
        // Title: labelled, then an upper-case line
        RuleSpec::new(Title, r"title[:\s]*([\w\s.-]+?)(?:\n|address|phone|date)"),
        RuleSpec::new(Title, r"business\s*name[:\s]*([\w\s.-]+?)(?:\n|address|phone)"),
        RuleSpec::new(Title, r"company[:\s]*([\w\s.-]+?)(?:\n|address|phone)"),
        RuleSpec::new(Title, r"^([A-Z][A-Z\s&.-]{3,})$").case_sensitive().multi_line(),
        RuleSpec::new(TotalPrice, format!("total{}", AMOUNT)),
        RuleSpec::new(TotalPrice, format!(r"grand\s*total{}", AMOUNT)),
        RuleSpec::new(TotalPrice, format!(r"amount\s*due{}", AMOUNT)),
        RuleSpec::new(TotalPrice, format!(r"final\s*total{}", AMOUNT)),
    ];

    rules.into_iter().map(RuleSpec::ascii).collect()
}

/// One cascade per field, indexed by [`FieldName`]
#[derive(Debug, Clone)]
pub struct CascadeTable {
    cascades: Vec<Cascade>,
}

static BUILTIN: Lazy<CascadeTable> = Lazy::new(|| {
    CascadeTable::compile(&builtin_rules()).expect("built-in field patterns must compile")
});

impl CascadeTable {
    /// Shared table of the built-in cascades
    pub fn builtin() -> &'static CascadeTable {
        &BUILTIN
    }

    /// Compile rule specs into cascades, keeping the relative order of each field's rules
    pub fn compile(specs: &[RuleSpec]) -> Result<Self, ScanError> {
        let mut cascades: Vec<Cascade> = FieldName::ALL
            .iter()
            .map(|&field| Cascade { field, rules: Vec::new() })
            .collect();

        for spec in specs {
            let rule = spec.compile()?;
            cascades[spec.field.index()].rules.push(rule);
        }

        Ok(Self { cascades })
    }

    /// Built-in cascades followed by `extra` rules at lowest priority
    pub fn with_extra_rules(extra: &[RuleSpec]) -> Result<Self, ScanError> {
        let mut table = Self::builtin().clone();
        for spec in extra {
            let rule = spec.compile()?;
            table.cascades[spec.field.index()].rules.push(rule);
        }
        Ok(table)
    }

    pub fn cascade(&self, field: FieldName) -> &Cascade {
        &self.cascades[field.index()]
    }

    /// Evaluate one field's cascade against `text`
    pub fn evaluate(&self, field: FieldName, text: &str) -> Option<String> {
        self.cascade(field).evaluate(text)
    }
}
