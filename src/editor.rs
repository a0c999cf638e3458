//! Benefits library editor.
//! Holds the parsed rows and active filters, validates a new benefit, appends
//! it, and asks GitHub (via a repository dispatch) to persist the full CSV.
//!
//! The append happens before the dispatch and is kept when the dispatch fails,
//! so local and remote rows can diverge until the next reload.

use std::fmt;

use tracing::{error, info};

use crate::benefits::{apply_filters, BenefitRow, FilterSet};
use crate::credentials::CredentialProvider;
use crate::csv::serialize_benefits;
use crate::github::{DispatchEvent, Dispatcher};

pub const INCOMPLETE_FORM: &str = "are you stupid or something? fill in everything marked with *";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Country {
    Uae,
    Ksa,
}

impl Country {
    pub const ALL: [Country; 2] = [Country::Uae, Country::Ksa];

    pub fn label(self) -> &'static str {
        match self {
            Country::Uae => "UAE",
            Country::Ksa => "KSA",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Product {
    TabbyCard,
    Bnpl,
}

impl Product {
    pub const ALL: [Product; 2] = [Product::TabbyCard, Product::Bnpl];

    pub fn label(self) -> &'static str {
        match self {
            Product::TabbyCard => "Tabby Card",
            Product::Bnpl => "BNPL",
        }
    }
}

/// Raw "add benefit" form input.
#[derive(Clone, Debug, Default)]
pub struct BenefitForm {
    pub countries: Vec<Country>,
    pub products: Vec<Product>,
    pub types: Vec<String>,
    pub feature: String,
    pub free_plan: String,
    pub tabby_plan: String,
    pub description: String,
}

fn join_choice<T: Copy + PartialEq>(picked: &[T], label: fn(T) -> &'static str, both: &str) -> String {
    let mut unique: Vec<T> = Vec::new();
    for p in picked {
        if !unique.contains(p) {
            unique.push(*p);
        }
    }
    match unique.as_slice() {
        [] => String::new(),
        [one] => label(*one).to_string(),
        _ => both.to_string(),
    }
}

impl BenefitForm {
    pub fn to_row(&self) -> BenefitRow {
        BenefitRow {
            country: join_choice(&self.countries, Country::label, "UAE, KSA"),
            product: join_choice(&self.products, Product::label, "Tabby Card, BNPL"),
            kind: self.types.join(", "),
            features: self.feature.trim().to_string(),
            free_plan: self.free_plan.trim().to_string(),
            tabby_plan: self.tabby_plan.trim().to_string(),
            description: self.description.trim().to_string(),
        }
    }
}

/// Starred fields must be filled; type and description are optional.
pub fn validate(row: &BenefitRow) -> Result<(), SubmitError> {
    let required = [
        &row.country,
        &row.product,
        &row.features,
        &row.free_plan,
        &row.tabby_plan,
    ];
    if required.iter().any(|f| f.is_empty()) {
        return Err(SubmitError::Incomplete);
    }
    Ok(())
}

#[derive(Debug)]
pub enum SubmitError {
    Incomplete,
    /// Token lookup or dispatch failed; the row stays appended.
    Save(String),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::Incomplete => f.write_str(INCOMPLETE_FORM),
            SubmitError::Save(reason) => write!(f, "Failed to save benefit: {}", reason),
        }
    }
}

impl std::error::Error for SubmitError {}

/// State of the save button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveState {
    Ready,
    Saving,
}

pub struct Editor {
    rows: Vec<BenefitRow>,
    pub filters: FilterSet,
    save: SaveState,
}

impl Editor {
    pub fn new(rows: Vec<BenefitRow>) -> Self {
        Self {
            rows,
            filters: FilterSet::default(),
            save: SaveState::Ready,
        }
    }

    pub fn rows(&self) -> &[BenefitRow] {
        &self.rows
    }

    pub fn save_state(&self) -> SaveState {
        self.save
    }

    /// Rows under the current filters.
    pub fn view(&self) -> Vec<BenefitRow> {
        apply_filters(&self.rows, &self.filters)
    }

    /// Validates, appends and dispatches. Returns the refreshed view.
    ///
    /// On success the state stays `Saving` until the page is reloaded; on
    /// failure it drops back to `Ready`.
    pub async fn submit(
        &mut self,
        form: &BenefitForm,
        credentials: &dyn CredentialProvider,
        dispatcher: &dyn Dispatcher,
    ) -> Result<Vec<BenefitRow>, SubmitError> {
        let row = form.to_row();
        validate(&row)?;

        info!(features = %row.features, "adding benefit");
        self.rows.push(row);
        let view = self.view();

        self.save = SaveState::Saving;
        match self.push_csv(credentials, dispatcher).await {
            Ok(()) => Ok(view),
            Err(reason) => {
                error!(error = %reason, "Error updating CSV");
                self.save = SaveState::Ready;
                Err(SubmitError::Save(reason))
            }
        }
    }

    async fn push_csv(
        &self,
        credentials: &dyn CredentialProvider,
        dispatcher: &dyn Dispatcher,
    ) -> Result<(), String> {
        let csv = serialize_benefits(&self.rows);
        let token = credentials.token().map_err(|e| e.to_string())?;
        let event = DispatchEvent::update_csv(csv);

        dispatcher.dispatch(&token, &event).await.map_err(|e| {
            e.message()
                .map(str::to_string)
                .unwrap_or_else(|| "Failed to update CSV file".to_string())
        })?;
        info!(rows = self.rows.len(), "dispatched update-csv");
        Ok(())
    }
}
