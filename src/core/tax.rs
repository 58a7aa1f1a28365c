use std::collections::HashMap;

use serde::Serialize;

use super::error::TaxError;
use super::types::{FilingStatus, Jurisdiction, TaxBracket};

/// Whole-dollar tables start the next bracket one unit above the previous upper bound.
const BOUND_TOLERANCE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxBreakdown {
    pub taxable_income: f64,
    pub standard_deduction: f64,
    pub federal_tax: f64,
    pub state_tax: f64,
    pub total_tax: f64,
}

impl TaxBreakdown {
    /// All-zero result used when bracket data is missing and the caller must carry on.
    pub fn neutral() -> Self {
        Self {
            taxable_income: 0.0,
            standard_deduction: 0.0,
            federal_tax: 0.0,
            state_tax: 0.0,
            total_tax: 0.0,
        }
    }
}

/// Bracket rows grouped by filing status and jurisdiction, each group sorted by lower bound.
#[derive(Debug, Clone, Default)]
pub struct TaxTable {
    groups: HashMap<(FilingStatus, Jurisdiction), Vec<TaxBracket>>,
}

impl TaxTable {
    pub fn new(brackets: Vec<TaxBracket>) -> Self {
        let mut groups: HashMap<(FilingStatus, Jurisdiction), Vec<TaxBracket>> = HashMap::new();
        for bracket in brackets {
            groups
                .entry((bracket.status, bracket.jurisdiction))
                .or_default()
                .push(bracket);
        }
        for rows in groups.values_mut() {
            rows.sort_by(|a, b| a.lower_bound.total_cmp(&b.lower_bound));
        }
        Self { groups }
    }

    pub fn brackets(&self, status: FilingStatus, jurisdiction: Jurisdiction) -> &[TaxBracket] {
        self.groups
            .get(&(status, jurisdiction))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Standard deduction carried by the lowest federal bracket of the status.
    pub fn standard_deduction(&self, status: FilingStatus) -> Option<f64> {
        self.brackets(status, Jurisdiction::Federal)
            .first()
            .map(|b| b.standard_deduction)
    }

    /// Checks every group covers `[0, inf)` without overlap and with rates in `[0, 1]`.
    pub fn validate(&self) -> Vec<TaxError> {
        let mut keys = self.groups.keys().copied().collect::<Vec<_>>();
        keys.sort_by_key(|(status, jurisdiction)| (status.as_str(), jurisdiction.to_string()));

        let mut problems = Vec::new();
        for (status, jurisdiction) in keys {
            let rows = self.brackets(status, jurisdiction);
            if let Err(reason) = check_group(rows) {
                problems.push(TaxError::InvalidBrackets {
                    status,
                    jurisdiction,
                    reason,
                });
            }
        }
        problems
    }
}

fn check_group(rows: &[TaxBracket]) -> Result<(), String> {
    let Some(first) = rows.first() else {
        return Err("group is empty".to_string());
    };
    if first.lower_bound.abs() > 1e-9 {
        return Err(format!(
            "first bracket starts at {} instead of 0",
            first.lower_bound
        ));
    }

    for bracket in rows {
        if !(0.0..=1.0).contains(&bracket.rate) {
            return Err(format!("rate {} is outside [0, 1]", bracket.rate));
        }
        if bracket.upper() <= bracket.lower_bound {
            return Err(format!(
                "bracket starting at {} has upper bound {}",
                bracket.lower_bound,
                bracket.upper()
            ));
        }
    }

    for pair in rows.windows(2) {
        let prev_upper = pair[0].upper();
        let next_lower = pair[1].lower_bound;
        if next_lower < prev_upper {
            return Err(format!(
                "bracket starting at {next_lower} overlaps bracket ending at {prev_upper}"
            ));
        }
        if next_lower - prev_upper > BOUND_TOLERANCE {
            return Err(format!("gap between {prev_upper} and {next_lower}"));
        }
    }

    if rows.last().and_then(|b| b.upper_bound).is_some() {
        return Err("top bracket has a finite upper bound".to_string());
    }
    Ok(())
}

/// Progressive tax over brackets sorted by ascending lower bound.
pub fn compute_tax(taxable_income: f64, brackets: &[TaxBracket]) -> f64 {
    let mut tax = 0.0;
    for bracket in brackets {
        if taxable_income <= bracket.lower_bound {
            break;
        }
        let taxed = taxable_income.min(bracket.upper()) - bracket.lower_bound;
        tax += bracket.rate * taxed;
    }
    tax
}

pub fn compute_tax_by_status(
    income: f64,
    status: FilingStatus,
    table: &TaxTable,
) -> Result<TaxBreakdown, TaxError> {
    let Some(standard_deduction) = table.standard_deduction(status) else {
        return Err(TaxError::MissingTaxData {
            status,
            jurisdiction: Jurisdiction::Federal,
        });
    };
    let federal = table.brackets(status, Jurisdiction::Federal);
    let state = table.brackets(status, Jurisdiction::State);
    if state.is_empty() {
        return Err(TaxError::MissingTaxData {
            status,
            jurisdiction: Jurisdiction::State,
        });
    }

    let taxable_income = (income - standard_deduction).max(0.0);
    let federal_tax = compute_tax(taxable_income, federal);
    let state_tax = compute_tax(taxable_income, state);

    Ok(TaxBreakdown {
        taxable_income,
        standard_deduction,
        federal_tax,
        state_tax,
        total_tax: federal_tax + state_tax,
    })
}
