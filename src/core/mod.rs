mod animation;
mod budget;
mod cohort;
mod engine;
mod error;
mod tax;
mod types;

pub use animation::{AnimationFrame, AnimationSpec, Bar, PlaybackControl, Slider, SliderStep, build_animation};
pub use budget::{
    BudgetRequest, BudgetStatus, BudgetSummary, ChoiceLine, LifestyleCatalog, LifestyleSelection,
    MILITARY_OPTION, SAVINGS_CATEGORY, WHATEVER_IS_LEFT, is_option_available,
    monthly_income_after_tax, parse_percentage, plan_budget, salary_basis,
};
pub use cohort::{CohortSeries, IntegrityIssue, build_series, format_accounting, format_currency};
pub use engine::{ProjectionConfig, ProjectionInputs, project};
pub use error::{BudgetError, TaxError};
pub use tax::{TaxBreakdown, TaxTable, compute_tax, compute_tax_by_status};
pub use types::{
    ANNUAL_SAVINGS_RATE, CareerCatalog, CareerProfile, FilingStatus, HORIZON_MONTHS, Jurisdiction,
    LOAN_SCHEDULE_MONTHS, LifestyleOption, LoanSchedule, LongSeriesRow, MilitaryService,
    MonthlyNetWorth, ParticipantRecord, ProjectionResult, TaxBracket,
};
