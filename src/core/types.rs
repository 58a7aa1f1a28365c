use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Months covered by a projection unless configured otherwise (25 years).
pub const HORIZON_MONTHS: u32 = 25 * 12;
/// Last month that can carry a loan-schedule value. Independent of the horizon.
pub const LOAN_SCHEDULE_MONTHS: u32 = 180;
pub const ANNUAL_SAVINGS_RATE: f64 = 0.05;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum FilingStatus {
    Single,
    Married,
}

impl FilingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FilingStatus::Single => "Single",
            FilingStatus::Married => "Married",
        }
    }
}

impl fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(FilingStatus::Single),
            "married" => Ok(FilingStatus::Married),
            other => Err(format!("unknown filing status '{other}'")),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Jurisdiction {
    Federal,
    State,
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Jurisdiction::Federal => "Federal",
            Jurisdiction::State => "State",
        })
    }
}

impl FromStr for Jurisdiction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "federal" => Ok(Jurisdiction::Federal),
            "state" => Ok(Jurisdiction::State),
            other => Err(format!("unknown tax jurisdiction '{other}'")),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum MilitaryService {
    #[default]
    #[serde(rename = "No")]
    No,
    #[serde(rename = "Part Time")]
    PartTime,
    #[serde(rename = "Full Time")]
    FullTime,
}

impl MilitaryService {
    pub fn as_str(self) -> &'static str {
        match self {
            MilitaryService::No => "No",
            MilitaryService::PartTime => "Part Time",
            MilitaryService::FullTime => "Full Time",
        }
    }
}

impl fmt::Display for MilitaryService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MilitaryService {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "" | "no" | "none" => Ok(MilitaryService::No),
            "part time" => Ok(MilitaryService::PartTime),
            "full time" => Ok(MilitaryService::FullTime),
            other => Err(format!("unknown military service option '{other}'")),
        }
    }
}

/// One row of a progressive bracket table. `upper_bound: None` is an open top bracket.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxBracket {
    pub status: FilingStatus,
    pub jurisdiction: Jurisdiction,
    pub lower_bound: f64,
    pub upper_bound: Option<f64>,
    pub rate: f64,
    pub standard_deduction: f64,
}

impl TaxBracket {
    pub fn upper(&self) -> f64 {
        self.upper_bound.unwrap_or(f64::INFINITY)
    }
}

/// Monthly loan amounts for months `1..=LOAN_SCHEDULE_MONTHS`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoanSchedule {
    values: Vec<f64>,
}

impl LoanSchedule {
    /// Entries past the loan window are dropped; non-finite entries become zero.
    pub fn new(mut values: Vec<f64>) -> Self {
        values.truncate(LOAN_SCHEDULE_MONTHS as usize);
        for value in &mut values {
            if !value.is_finite() {
                *value = 0.0;
            }
        }
        Self { values }
    }

    pub fn value_for_month(&self, month: u32) -> f64 {
        if month == 0 || month > LOAN_SCHEDULE_MONTHS {
            return 0.0;
        }
        self.values
            .get(month as usize - 1)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CareerProfile {
    pub profession: String,
    pub requires_school: bool,
    pub years_in_school: f64,
    pub savings_during_school: f64,
    pub average_salary: f64,
    /// The worksheet's own `Savings` figure. Listed to the career picker only;
    /// projections use the participant's budgeted savings instead.
    pub savings_after_school: f64,
    pub loan_schedule: LoanSchedule,
}

impl CareerProfile {
    /// Zero-filled profile used when a participant's career has no reference row.
    pub fn unmatched() -> Self {
        Self {
            profession: String::new(),
            requires_school: false,
            years_in_school: 0.0,
            savings_during_school: 0.0,
            average_salary: 0.0,
            savings_after_school: 0.0,
            loan_schedule: LoanSchedule::default(),
        }
    }
}

/// Careers in file order with lookup by profession.
#[derive(Debug, Clone, Default)]
pub struct CareerCatalog {
    careers: Vec<CareerProfile>,
    index: HashMap<String, usize>,
    duplicates: Vec<String>,
}

impl CareerCatalog {
    pub fn new(careers: Vec<CareerProfile>) -> Self {
        let mut index = HashMap::with_capacity(careers.len());
        let mut duplicates = Vec::new();
        for (idx, career) in careers.iter().enumerate() {
            if index.contains_key(&career.profession) {
                duplicates.push(career.profession.clone());
            } else {
                index.insert(career.profession.clone(), idx);
            }
        }
        Self {
            careers,
            index,
            duplicates,
        }
    }

    pub fn get(&self, profession: &str) -> Option<&CareerProfile> {
        self.index.get(profession).map(|&idx| &self.careers[idx])
    }

    pub fn professions(&self) -> Vec<&str> {
        self.careers
            .iter()
            .enumerate()
            .filter(|(idx, c)| self.index.get(&c.profession) == Some(idx))
            .map(|(_, c)| c.profession.as_str())
            .collect()
    }

    /// Professions that appeared more than once; only the first row is used.
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.careers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.careers.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Career")]
    pub career: String,
    #[serde(rename = "Military Service")]
    pub military_service: MilitaryService,
    #[serde(rename = "Savings")]
    pub savings: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LifestyleOption {
    pub category: String,
    pub option: String,
    pub monthly_cost: f64,
    pub percentage: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyNetWorth {
    pub month: u32,
    pub net_worth: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectionResult {
    pub points: Vec<MonthlyNetWorth>,
}

impl ProjectionResult {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn final_net_worth(&self) -> f64 {
        self.points.last().map(|p| p.net_worth).unwrap_or(0.0)
    }
}

/// One (participant, month) row of the long-format series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongSeriesRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Profession")]
    pub profession: String,
    #[serde(rename = "Month")]
    pub month: u32,
    #[serde(rename = "Net Worth")]
    pub net_worth: f64,
    #[serde(rename = "Net Worth Label")]
    pub label: String,
}
