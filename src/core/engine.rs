use super::types::{
    ANNUAL_SAVINGS_RATE, CareerProfile, HORIZON_MONTHS, LoanSchedule, MonthlyNetWorth,
    ProjectionResult,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionConfig {
    pub horizon_months: u32,
    pub annual_savings_rate: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            horizon_months: HORIZON_MONTHS,
            annual_savings_rate: ANNUAL_SAVINGS_RATE,
        }
    }
}

impl ProjectionConfig {
    pub fn monthly_savings_rate(&self) -> f64 {
        (1.0 + self.annual_savings_rate).powf(1.0 / 12.0) - 1.0
    }
}

/// Monthly inputs of one participant after the career join.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionInputs {
    pub years_in_school: f64,
    pub savings_during_school: f64,
    pub savings_after_school: f64,
    pub loan_schedule: LoanSchedule,
}

impl ProjectionInputs {
    /// Career phase data with the participant's own post-lifestyle savings after school.
    pub fn from_career(career: &CareerProfile, participant_savings: f64) -> Self {
        Self {
            years_in_school: career.years_in_school,
            savings_during_school: career.savings_during_school,
            savings_after_school: participant_savings,
            loan_schedule: career.loan_schedule.clone(),
        }
    }

    pub fn months_in_school(&self) -> u32 {
        if !self.years_in_school.is_finite() || self.years_in_school <= 0.0 {
            return 0;
        }
        (self.years_in_school * 12.0).floor() as u32
    }
}

#[derive(Debug, Clone, Copy)]
struct SavingsState {
    balance: f64,
}

impl SavingsState {
    fn step(&mut self, monthly_rate: f64, deposit: f64) {
        self.balance *= 1.0 + monthly_rate;
        self.balance += deposit;
    }
}

pub fn project(inputs: &ProjectionInputs, config: &ProjectionConfig) -> ProjectionResult {
    let monthly_rate = config.monthly_savings_rate();
    let months_in_school = inputs.months_in_school();
    let during = finite_or_zero(inputs.savings_during_school);
    let after = finite_or_zero(inputs.savings_after_school);

    let mut state = SavingsState { balance: 0.0 };
    let mut points = Vec::with_capacity(config.horizon_months as usize);

    for month in 1..=config.horizon_months {
        let deposit = if month <= months_in_school {
            during
        } else {
            after
        };
        state.step(monthly_rate, deposit);
        let loan_value = inputs.loan_schedule.value_for_month(month);
        points.push(MonthlyNetWorth {
            month,
            net_worth: state.balance + loan_value,
        });
    }

    ProjectionResult { points }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
