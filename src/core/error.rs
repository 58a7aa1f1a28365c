use super::types::{FilingStatus, Jurisdiction};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaxError {
    #[error("no {jurisdiction} tax brackets for filing status {status}")]
    MissingTaxData {
        status: FilingStatus,
        jurisdiction: Jurisdiction,
    },

    #[error("{status} {jurisdiction} brackets are invalid: {reason}")]
    InvalidBrackets {
        status: FilingStatus,
        jurisdiction: Jurisdiction,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BudgetError {
    #[error("unknown career '{0}'")]
    UnknownCareer(String),

    #[error("no '{option}' option in lifestyle category '{category}'")]
    UnknownOption { category: String, option: String },

    #[error("option '{option}' is not available with {military} military service")]
    RestrictedOption { option: String, military: String },

    #[error("no choice made for lifestyle category '{0}'")]
    MissingChoice(String),

    #[error("participant name must not be empty")]
    MissingName,

    #[error("budget is not balanced: {remaining:.2} remaining")]
    Unbalanced { remaining: f64 },
}
