//! Comparison table model (comparison-*.csv).
//! Three plan columns plus optional Sublines / Hide / ModalContent.

use crate::csv::{parse_records, Record};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComparisonRow {
    pub features: String,
    pub free_plan: String,
    pub tabby_plan: String,
    pub subline: String,
    pub hidden: bool,
    pub modal_content: String,
}

impl ComparisonRow {
    pub fn from_record(record: &Record) -> Self {
        let get = |key: &str| record.get(key).map(|v| v.trim().to_string()).unwrap_or_default();
        Self {
            features: get("features"),
            free_plan: get("freeplan"),
            tabby_plan: get("tabby+aed49/month"),
            subline: get("sublines"),
            hidden: get("hide") == "X",
            modal_content: get("modalcontent"),
        }
    }

    /// A row with only a feature label acts as a section heading.
    pub fn is_section_divider(&self) -> bool {
        self.free_plan.is_empty() && self.tabby_plan.is_empty() && self.subline.is_empty()
    }
}

/// Rows without a feature label are skipped.
pub fn parse_comparison(text: &str) -> Vec<ComparisonRow> {
    parse_records(text)
        .iter()
        .map(ComparisonRow::from_record)
        .filter(|row| !row.features.is_empty())
        .collect()
}

/// Rows shown for the current state of the "show hidden" toggle.
pub fn visible_rows(rows: &[ComparisonRow], show_hidden: bool) -> Vec<&ComparisonRow> {
    rows.iter().filter(|r| show_hidden || !r.hidden).collect()
}

/// Modal text for a feature, matched case-insensitively on the trimmed label.
pub fn modal_content<'a>(rows: &'a [ComparisonRow], feature: &str) -> Option<&'a str> {
    let wanted = feature.trim().to_lowercase();
    rows.iter()
        .find(|r| r.features.to_lowercase() == wanted)
        .map(|r| r.modal_content.as_str())
        .filter(|c| !c.is_empty())
}

/// How a plan cell is badged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Badge {
    Free,
    Paid,
    Basic,
    NotAvailable,
    Plain,
}

impl Badge {
    /// First match wins, in this order: free, paid, basic, not available.
    pub fn classify(content: &str) -> Self {
        let lower = content.to_lowercase();
        if lower.contains("free") {
            Badge::Free
        } else if lower.contains("paid") {
            Badge::Paid
        } else if lower.contains("basic") {
            Badge::Basic
        } else if lower.contains("not available") {
            Badge::NotAvailable
        } else {
            Badge::Plain
        }
    }

    pub fn css_class(self) -> Option<&'static str> {
        match self {
            Badge::Free => Some("free-text"),
            Badge::Paid => Some("paid-text"),
            Badge::Basic => Some("basic-text"),
            Badge::NotAvailable => Some("not-available-text"),
            Badge::Plain => None,
        }
    }

    pub fn suffix(self) -> Option<&'static str> {
        match self {
            Badge::Free => Some("✓"),
            Badge::Paid => Some("✗"),
            _ => None,
        }
    }
}
