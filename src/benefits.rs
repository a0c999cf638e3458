//! Benefits library model.
//! Seven-column rows from benefits-library.csv and the country/product filter
//! chips applied on top of them.

use std::collections::BTreeSet;
use std::fmt;

use crate::csv::Record;

/// One record of the benefits library. Identity is its position in the list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BenefitRow {
    pub country: String,
    pub product: String,
    /// `Type` column; comma-joined.
    pub kind: String,
    pub features: String,
    pub free_plan: String,
    pub tabby_plan: String,
    pub description: String,
}

impl BenefitRow {
    pub fn from_record(record: &Record) -> Self {
        let get = |key: &str| record.get(key).cloned().unwrap_or_default();
        Self {
            country: get("country"),
            product: get("product"),
            kind: get("type"),
            features: get("features"),
            free_plan: get("freeplan"),
            tabby_plan: get("tabby+aed49/month"),
            description: get("description"),
        }
    }

    /// Values in CSV column order.
    pub fn fields(&self) -> [&str; 7] {
        [
            &self.country,
            &self.product,
            &self.kind,
            &self.features,
            &self.free_plan,
            &self.tabby_plan,
            &self.description,
        ]
    }
}

pub fn parse_benefits(text: &str) -> Vec<BenefitRow> {
    crate::csv::parse_records(text)
        .iter()
        .map(BenefitRow::from_record)
        .collect()
}

/// A filter chip. Ordering puts countries before products.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Filter {
    Uae,
    Ksa,
    TabbyCard,
    Bnpl,
}

impl Filter {
    pub const ALL: [Filter; 4] = [Filter::Uae, Filter::Ksa, Filter::TabbyCard, Filter::Bnpl];

    /// Value of the chip's `data-filter` attribute.
    pub fn key(self) -> &'static str {
        match self {
            Filter::Uae => "uae",
            Filter::Ksa => "ksa",
            Filter::TabbyCard => "tabbycard",
            Filter::Bnpl => "bnpl",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    fn is_country(self) -> bool {
        matches!(self, Filter::Uae | Filter::Ksa)
    }

    /// Lower-cased cell value a single active chip matches.
    fn single_match(self) -> &'static str {
        match self {
            Filter::Uae => "uae",
            Filter::Ksa => "ksa",
            Filter::TabbyCard => "tabby card",
            Filter::Bnpl => "bnpl",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Active chips.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterSet {
    active: BTreeSet<Filter>,
}

impl FilterSet {
    /// Flips a chip; returns whether it is now active.
    pub fn toggle(&mut self, filter: Filter) -> bool {
        if !self.active.remove(&filter) {
            self.active.insert(filter);
            return true;
        }
        false
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Filter> + '_ {
        self.active.iter().copied()
    }
}

/// Value a group of chips requires: one chip matches that value, both chips
/// match only rows listing both.
fn group_target(active: &[Filter], both: &'static str) -> Option<&'static str> {
    match active {
        [] => None,
        [single] => Some(single.single_match()),
        _ => Some(both),
    }
}

/// Rows visible under `filters`. With no chips active every row is returned.
pub fn apply_filters(rows: &[BenefitRow], filters: &FilterSet) -> Vec<BenefitRow> {
    if filters.is_empty() {
        return rows.to_vec();
    }
    let (countries, products): (Vec<Filter>, Vec<Filter>) =
        filters.iter().partition(|f| f.is_country());

    let country = group_target(&countries, "uae, ksa");
    let product = group_target(&products, "tabby card, bnpl");

    rows.iter()
        .filter(|row| country.is_none_or(|want| row.country.trim().to_lowercase() == want))
        .filter(|row| product.is_none_or(|want| row.product.trim().to_lowercase() == want))
        .cloned()
        .collect()
}
