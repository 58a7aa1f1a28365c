//! Monthly budget planning for one participant: salary, tax, lifestyle costs and savings.
//!
//! The result of a balanced plan is the [`ParticipantRecord`] that feeds the cohort projection.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::cohort::format_currency;
use super::error::BudgetError;
use super::tax::{TaxBreakdown, TaxTable, compute_tax_by_status};
use super::types::{
    CareerCatalog, CareerProfile, FilingStatus, LifestyleOption, MilitaryService,
    ParticipantRecord,
};

pub const SAVINGS_CATEGORY: &str = "Savings";
pub const MILITARY_SERVICE_CATEGORY: &str = "Military Service";
pub const MILITARY_OPTION: &str = "Military";
pub const WHATEVER_IS_LEFT: &str = "Whatever is left";

/// A remaining budget within half a cent of zero counts as balanced.
const BALANCE_TOLERANCE: f64 = 0.005;

#[derive(Debug, Clone, Default)]
pub struct LifestyleCatalog {
    options: Vec<LifestyleOption>,
}

impl LifestyleCatalog {
    pub fn new(options: Vec<LifestyleOption>) -> Self {
        Self { options }
    }

    /// Spending categories in file order, excluding savings.
    pub fn spending_categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for option in &self.options {
            let category = option.category.as_str();
            if category != SAVINGS_CATEGORY && !categories.contains(&category) {
                categories.push(category);
            }
        }
        categories
    }

    pub fn options_for(&self, category: &str, military: MilitaryService) -> Vec<&LifestyleOption> {
        self.options
            .iter()
            .filter(|o| o.category == category && is_option_available(&o.option, military))
            .collect()
    }

    pub fn savings_options(&self) -> Vec<&LifestyleOption> {
        self.options
            .iter()
            .filter(|o| o.category == SAVINGS_CATEGORY)
            .collect()
    }

    fn find(&self, category: &str, option: &str) -> Option<&LifestyleOption> {
        self.options
            .iter()
            .find(|o| o.category == category && o.option == option)
    }
}

/// The `Military` lifestyle option is reserved for full-time service.
pub fn is_option_available(option: &str, military: MilitaryService) -> bool {
    option != MILITARY_OPTION || military == MilitaryService::FullTime
}

/// Annual income used for tax: school careers budget on their during-school amount.
pub fn salary_basis(career: &CareerProfile) -> f64 {
    if career.requires_school {
        career.savings_during_school
    } else {
        career.average_salary
    }
}

pub fn monthly_income_after_tax(salary: f64, tax: &TaxBreakdown) -> f64 {
    (salary - tax.federal_tax - tax.state_tax) / 12.0
}

/// Parses `"15%"` into `0.15`. Anything without a numeric percentage yields `None`.
pub fn parse_percentage(raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim();
    if !raw.contains('%') {
        return None;
    }
    let value = raw.trim_end_matches('%').trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value / 100.0)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifestyleSelection {
    pub category: String,
    pub option: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRequest {
    pub name: String,
    pub career: String,
    pub filing_status: FilingStatus,
    #[serde(default)]
    pub military_service: MilitaryService,
    #[serde(default)]
    pub selections: Vec<LifestyleSelection>,
    pub savings_choice: String,
}

impl BudgetRequest {
    fn selection_for(&self, category: &str) -> Option<&str> {
        self.selections
            .iter()
            .find(|s| s.category == category)
            .map(|s| s.option.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceLine {
    pub category: String,
    pub choice: String,
    pub cost: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    Balanced,
    Surplus,
    Overspent,
}

impl BudgetStatus {
    fn from_remaining(remaining: f64) -> Self {
        if remaining.abs() < BALANCE_TOLERANCE {
            BudgetStatus::Balanced
        } else if remaining > 0.0 {
            BudgetStatus::Surplus
        } else {
            BudgetStatus::Overspent
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    pub name: String,
    pub career: String,
    pub filing_status: FilingStatus,
    pub military_service: MilitaryService,
    pub annual_salary: f64,
    pub tax: TaxBreakdown,
    pub monthly_income_after_tax: f64,
    pub expenses: f64,
    pub choices: Vec<ChoiceLine>,
    pub savings: f64,
    pub remaining_budget: f64,
    pub status: BudgetStatus,
    pub warnings: Vec<String>,
}

impl BudgetSummary {
    /// Accepts the plan as a submission. Requires a name and a balanced budget.
    pub fn into_record(self) -> Result<ParticipantRecord, BudgetError> {
        if self.name.trim().is_empty() {
            return Err(BudgetError::MissingName);
        }
        if self.status != BudgetStatus::Balanced {
            return Err(BudgetError::Unbalanced {
                remaining: self.remaining_budget,
            });
        }
        Ok(ParticipantRecord {
            name: self.name.trim().to_string(),
            career: self.career,
            military_service: self.military_service,
            savings: self.savings,
        })
    }
}

pub fn plan_budget(
    request: &BudgetRequest,
    careers: &CareerCatalog,
    lifestyle: &LifestyleCatalog,
    taxes: &TaxTable,
) -> Result<BudgetSummary, BudgetError> {
    let career = careers
        .get(&request.career)
        .ok_or_else(|| BudgetError::UnknownCareer(request.career.clone()))?;

    let mut warnings = Vec::new();
    let annual_salary = salary_basis(career);
    let tax = match compute_tax_by_status(annual_salary, request.filing_status, taxes) {
        Ok(tax) => tax,
        Err(err) => {
            warn!("{err}; budgeting with zero tax");
            warnings.push(format!("Tax data is missing or invalid: {err}"));
            TaxBreakdown::neutral()
        }
    };
    let monthly_income = monthly_income_after_tax(annual_salary, &tax);

    let mut remaining = monthly_income;
    let mut expenses = 0.0;
    let mut choices = vec![ChoiceLine {
        category: MILITARY_SERVICE_CATEGORY.to_string(),
        choice: request.military_service.to_string(),
        cost: 0.0,
    }];

    for category in lifestyle.spending_categories() {
        let choice = request
            .selection_for(category)
            .ok_or_else(|| BudgetError::MissingChoice(category.to_string()))?;
        let option = lifestyle
            .find(category, choice)
            .ok_or_else(|| BudgetError::UnknownOption {
                category: category.to_string(),
                option: choice.to_string(),
            })?;
        if !is_option_available(&option.option, request.military_service) {
            return Err(BudgetError::RestrictedOption {
                option: option.option.clone(),
                military: request.military_service.to_string(),
            });
        }

        let cost = option.monthly_cost;
        if remaining - cost < 0.0 {
            warnings.push(format!(
                "Choosing {choice} for {category} exceeds your budget by {}",
                format_currency((remaining - cost).abs())
            ));
        }
        remaining -= cost;
        expenses += cost;
        choices.push(ChoiceLine {
            category: category.to_string(),
            choice: choice.to_string(),
            cost,
        });
    }

    let savings = if request.savings_choice.eq_ignore_ascii_case(WHATEVER_IS_LEFT) {
        let all = remaining;
        remaining = 0.0;
        all
    } else {
        let option = lifestyle
            .find(SAVINGS_CATEGORY, &request.savings_choice)
            .ok_or_else(|| BudgetError::UnknownOption {
                category: SAVINGS_CATEGORY.to_string(),
                option: request.savings_choice.clone(),
            })?;
        let savings = parse_percentage(option.percentage.as_deref())
            .map(|pct| pct * monthly_income)
            .unwrap_or(0.0);
        if savings > remaining {
            warnings.push(format!(
                "Your savings choice exceeds your budget by {}",
                format_currency((remaining - savings).abs())
            ));
        }
        remaining -= savings;
        savings
    };
    choices.push(ChoiceLine {
        category: SAVINGS_CATEGORY.to_string(),
        choice: request.savings_choice.clone(),
        cost: savings,
    });

    Ok(BudgetSummary {
        name: request.name.clone(),
        career: career.profession.clone(),
        filing_status: request.filing_status,
        military_service: request.military_service,
        annual_salary,
        tax,
        monthly_income_after_tax: monthly_income,
        expenses,
        choices,
        savings,
        remaining_budget: remaining,
        status: BudgetStatus::from_remaining(remaining),
        warnings,
    })
}
