//! Interactive "add benefit" form on the terminal.

use anyhow::{Context, Result};
use dialoguer::{Input, MultiSelect};

use crate::editor::{BenefitForm, Country, Product};

fn text(prompt: &str) -> Result<String> {
    Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .with_context(|| format!("Failed to read '{}'", prompt))
}

fn pick<T: Copy>(prompt: &str, options: &[T], label: fn(T) -> &'static str) -> Result<Vec<T>> {
    let labels: Vec<&str> = options.iter().map(|o| label(*o)).collect();
    let picked = MultiSelect::new()
        .with_prompt(prompt)
        .items(&labels)
        .interact()
        .with_context(|| format!("Failed to read '{}'", prompt))?;
    Ok(picked.into_iter().map(|i| options[i]).collect())
}

/// Splits "Rewards, Cashback" into its parts.
pub fn split_types(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn ask_form() -> Result<BenefitForm> {
    Ok(BenefitForm {
        countries: pick("Country *", &Country::ALL, Country::label)?,
        products: pick("Product *", &Product::ALL, Product::label)?,
        types: split_types(&text("Type (comma separated)")?),
        feature: text("Feature *")?,
        free_plan: text("Free Plan *")?,
        tabby_plan: text("Tabby+ (AED 49/month) *")?,
        description: text("Description")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_types() {
        assert_eq!(split_types(" Rewards,, Cashback "), vec!["Rewards", "Cashback"]);
        assert!(split_types("").is_empty());
    }
}
