use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::core::{
    AnimationSpec, BudgetError, BudgetRequest, BudgetSummary, CareerCatalog, CohortSeries,
    FilingStatus, IntegrityIssue, LifestyleCatalog, LifestyleOption, LifestyleSelection,
    LongSeriesRow,
    MilitaryService, ParticipantRecord, ProjectionConfig, TaxBreakdown, TaxError, TaxTable,
    build_animation, build_series, compute_tax_by_status, format_currency, plan_budget,
};
use crate::tables::{self, TableError};

/// Longest projection the CLI accepts (100 years).
const MAX_HORIZON_MONTHS: u32 = 1_200;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliFilingStatus {
    Single,
    Married,
}

impl From<CliFilingStatus> for FilingStatus {
    fn from(value: CliFilingStatus) -> Self {
        match value {
            CliFilingStatus::Single => FilingStatus::Single,
            CliFilingStatus::Married => FilingStatus::Married,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliMilitaryService {
    No,
    PartTime,
    FullTime,
}

impl From<CliMilitaryService> for MilitaryService {
    fn from(value: CliMilitaryService) -> Self {
        match value {
            CliMilitaryService::No => MilitaryService::No,
            CliMilitaryService::PartTime => MilitaryService::PartTime,
            CliMilitaryService::FullTime => MilitaryService::FullTime,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "networth",
    about = "Career budget simulator: progressive tax, monthly budget and 25-year net worth projection"
)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug, Clone)]
struct ProjectionArgs {
    #[arg(
        long,
        default_value_t = 300,
        help = "Number of months to project (25 years by default)"
    )]
    horizon_months: u32,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Annual growth rate of savings in percent, compounded monthly"
    )]
    annual_savings_rate: f64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Project every participant and write the long-format net worth series
    Project {
        #[arg(long, default_value = "participant_data.csv")]
        participants: PathBuf,
        #[arg(long, default_value = "Skillset_cost_worksheet_CSV.csv")]
        careers: PathBuf,
        #[arg(long, default_value = "financial_model_plot.csv")]
        output: PathBuf,
        #[arg(long, help = "Also write the bar chart race description as JSON")]
        animation: Option<PathBuf>,
        #[command(flatten)]
        projection: ProjectionArgs,
    },
    /// Compute federal and state tax for an annual income
    Tax {
        #[arg(long, default_value = "2024_Tax_worksheet_CSV.csv")]
        taxes: PathBuf,
        #[arg(long)]
        income: f64,
        #[arg(long, value_enum, default_value_t = CliFilingStatus::Single)]
        status: CliFilingStatus,
    },
    /// Plan a monthly budget and optionally submit it as a participant
    Budget {
        #[arg(long, default_value = "2024_Tax_worksheet_CSV.csv")]
        taxes: PathBuf,
        #[arg(long, default_value = "Skillset_cost_worksheet_CSV.csv")]
        careers: PathBuf,
        #[arg(long, default_value = "Lifestyle_decisions_CSV.csv")]
        lifestyle: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long)]
        career: String,
        #[arg(long, value_enum, default_value_t = CliFilingStatus::Single)]
        status: CliFilingStatus,
        #[arg(long, value_enum, default_value_t = CliMilitaryService::No)]
        military_service: CliMilitaryService,
        #[arg(
            long = "choice",
            value_parser = parse_selection,
            help = "Lifestyle choice as CATEGORY=OPTION; repeat per category"
        )]
        choices: Vec<LifestyleSelection>,
        #[arg(long, default_value = "Whatever is left")]
        savings: String,
        #[arg(long, help = "Append the participant when the budget is balanced")]
        submit: bool,
        #[arg(long, default_value = "participant_data.csv")]
        participants: PathBuf,
    },
    /// Serve the JSON HTTP API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
        #[arg(long, default_value = "2024_Tax_worksheet_CSV.csv")]
        taxes: PathBuf,
        #[arg(long, default_value = "Skillset_cost_worksheet_CSV.csv")]
        careers: PathBuf,
        #[arg(long, default_value = "Lifestyle_decisions_CSV.csv")]
        lifestyle: PathBuf,
        #[arg(long, default_value = "participant_data.csv")]
        participants: PathBuf,
        #[command(flatten)]
        projection: ProjectionArgs,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Tax(#[from] TaxError),
    #[error(transparent)]
    Budget(#[from] BudgetError),
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

fn parse_selection(raw: &str) -> Result<LifestyleSelection, String> {
    let Some((category, option)) = raw.split_once('=') else {
        return Err(format!("expected CATEGORY=OPTION, got '{raw}'"));
    };
    let (category, option) = (category.trim(), option.trim());
    if category.is_empty() || option.is_empty() {
        return Err(format!("expected CATEGORY=OPTION, got '{raw}'"));
    }
    Ok(LifestyleSelection {
        category: category.to_string(),
        option: option.to_string(),
    })
}

fn build_projection_config(args: &ProjectionArgs) -> Result<ProjectionConfig, String> {
    if args.horizon_months == 0 {
        return Err("--horizon-months must be > 0".to_string());
    }
    if args.horizon_months > MAX_HORIZON_MONTHS {
        return Err(format!("--horizon-months must be <= {MAX_HORIZON_MONTHS}"));
    }
    if !args.annual_savings_rate.is_finite() || args.annual_savings_rate <= -100.0 {
        return Err("--annual-savings-rate must be > -100".to_string());
    }
    Ok(ProjectionConfig {
        horizon_months: args.horizon_months,
        annual_savings_rate: args.annual_savings_rate / 100.0,
    })
}

/// Loads the tax table and logs every integrity problem once.
fn load_checked_taxes(path: &Path) -> Result<TaxTable, TableError> {
    let taxes = tables::load_tax_table(path)?;
    for problem in taxes.validate() {
        warn!("{problem}");
    }
    Ok(taxes)
}

pub async fn run(cli: Cli) -> Result<(), CommandError> {
    match cli.command {
        Command::Project {
            participants,
            careers,
            output,
            animation,
            projection,
        } => {
            let config =
                build_projection_config(&projection).map_err(CommandError::InvalidArgument)?;
            let participants = tables::load_participants(&participants)?;
            let careers = tables::load_careers(&careers)?;
            let series = build_series(&participants, &careers, &config);
            tables::save_series(&output, &series.rows)?;
            info!(
                participants = participants.len(),
                rows = series.rows.len(),
                issues = series.issues.len(),
                "wrote net worth series to {}",
                output.display()
            );
            if let Some(path) = animation {
                tables::save_json(&path, &build_animation(&series.rows))?;
                info!("wrote animation description to {}", path.display());
            }
            Ok(())
        }
        Command::Tax {
            taxes,
            income,
            status,
        } => {
            if !income.is_finite() || income < 0.0 {
                return Err(CommandError::InvalidArgument(
                    "--income must be >= 0".to_string(),
                ));
            }
            let taxes = load_checked_taxes(&taxes)?;
            let breakdown = compute_tax_by_status(income, status.into(), &taxes)?;
            print_tax(income, &breakdown);
            Ok(())
        }
        Command::Budget {
            taxes,
            careers,
            lifestyle,
            name,
            career,
            status,
            military_service,
            choices,
            savings,
            submit,
            participants,
        } => {
            let taxes = load_checked_taxes(&taxes)?;
            let careers = tables::load_careers(&careers)?;
            let lifestyle = tables::load_lifestyle(&lifestyle)?;
            let request = BudgetRequest {
                name,
                career,
                filing_status: status.into(),
                military_service: military_service.into(),
                selections: choices,
                savings_choice: savings,
            };
            let summary = plan_budget(&request, &careers, &lifestyle, &taxes)?;
            print_budget(&summary);
            if submit {
                let record = summary.into_record()?;
                tables::append_participant(&participants, &record)?;
                println!("Your budget has been submitted!");
            }
            Ok(())
        }
        Command::Serve {
            port,
            taxes,
            careers,
            lifestyle,
            participants,
            projection,
        } => {
            let config =
                build_projection_config(&projection).map_err(CommandError::InvalidArgument)?;
            let state = AppState {
                taxes: load_checked_taxes(&taxes)?,
                careers: tables::load_careers(&careers)?,
                lifestyle: tables::load_lifestyle(&lifestyle)?,
                participants_path: participants,
                config,
                submissions: Mutex::new(()),
            };
            run_http_server(port, Arc::new(state)).await?;
            Ok(())
        }
    }
}

fn print_tax(income: f64, tax: &TaxBreakdown) {
    println!("Annual Salary: {}", format_currency(income));
    println!("Standard Deduction: {}", format_currency(tax.standard_deduction));
    println!("Taxable Income: {}", format_currency(tax.taxable_income));
    println!("Federal Tax: {}", format_currency(tax.federal_tax));
    println!("State Tax: {}", format_currency(tax.state_tax));
    println!("Total Tax: {}", format_currency(tax.total_tax));
}

fn print_budget(summary: &BudgetSummary) {
    print_tax(summary.annual_salary, &summary.tax);
    println!(
        "Monthly Income After Tax: {}",
        format_currency(summary.monthly_income_after_tax)
    );
    for line in &summary.choices {
        println!(
            "{}: {} - {}",
            line.category,
            line.choice,
            format_currency(line.cost)
        );
    }
    for warning in &summary.warnings {
        println!("Warning: {warning}");
    }
    println!(
        "Remaining Budget: {}",
        format_currency(summary.remaining_budget)
    );
}

pub struct AppState {
    taxes: TaxTable,
    careers: CareerCatalog,
    lifestyle: LifestyleCatalog,
    participants_path: PathBuf,
    config: ProjectionConfig,
    submissions: Mutex<()>,
}

type SharedState = Arc<AppState>;

fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/careers", get(careers_handler))
        .route("/api/lifestyle", get(lifestyle_handler))
        .route("/api/tax", post(tax_handler))
        .route("/api/budget", post(budget_handler))
        .route("/api/submit", post(submit_handler))
        .route("/api/series", get(series_handler))
        .route("/api/animation", get(animation_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16, state: SharedState) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("networth HTTP API listening on http://{addr}");
    axum::serve(listener, router(state)).await
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CareerResponse<'a> {
    profession: &'a str,
    requires_school: bool,
    years_in_school: f64,
    average_salary: f64,
    savings_after_school: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LifestyleQuery {
    #[serde(default)]
    military_service: MilitaryService,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OptionResponse<'a> {
    option: &'a str,
    monthly_cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    percentage: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CategoryResponse<'a> {
    category: &'a str,
    options: Vec<OptionResponse<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LifestyleResponse<'a> {
    military_service: MilitaryService,
    categories: Vec<CategoryResponse<'a>>,
    savings: Vec<OptionResponse<'a>>,
}

impl<'a> From<&'a LifestyleOption> for OptionResponse<'a> {
    fn from(option: &'a LifestyleOption) -> Self {
        Self {
            option: &option.option,
            monthly_cost: option.monthly_cost,
            percentage: option.percentage.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaxPayload {
    income: f64,
    filing_status: FilingStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    record: ParticipantRecord,
    summary: BudgetSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeriesResponse {
    participants: usize,
    rows: Vec<LongSeriesRow>,
    issues: Vec<IntegrityIssue>,
}

async fn careers_handler(State(state): State<SharedState>) -> Response {
    let careers = state
        .careers
        .professions()
        .into_iter()
        .filter_map(|p| state.careers.get(p))
        .map(|c| CareerResponse {
            profession: &c.profession,
            requires_school: c.requires_school,
            years_in_school: c.years_in_school,
            average_salary: c.average_salary,
            savings_after_school: c.savings_after_school,
        })
        .collect::<Vec<_>>();
    json_response(StatusCode::OK, careers)
}

/// Choices a participant with the given service may pick, per category.
async fn lifestyle_handler(
    State(state): State<SharedState>,
    Query(query): Query<LifestyleQuery>,
) -> Response {
    let military = query.military_service;
    let categories = state
        .lifestyle
        .spending_categories()
        .into_iter()
        .map(|category| CategoryResponse {
            category,
            options: state
                .lifestyle
                .options_for(category, military)
                .into_iter()
                .map(OptionResponse::from)
                .collect(),
        })
        .collect();
    let savings = state
        .lifestyle
        .savings_options()
        .into_iter()
        .map(OptionResponse::from)
        .collect();
    json_response(
        StatusCode::OK,
        LifestyleResponse {
            military_service: military,
            categories,
            savings,
        },
    )
}

async fn tax_handler(State(state): State<SharedState>, Json(payload): Json<TaxPayload>) -> Response {
    if !payload.income.is_finite() || payload.income < 0.0 {
        return error_response(StatusCode::BAD_REQUEST, "income must be >= 0");
    }
    match compute_tax_by_status(payload.income, payload.filing_status, &state.taxes) {
        Ok(breakdown) => json_response(StatusCode::OK, breakdown),
        Err(err) => error_response(StatusCode::UNPROCESSABLE_ENTITY, &err.to_string()),
    }
}

async fn budget_handler(
    State(state): State<SharedState>,
    Json(request): Json<BudgetRequest>,
) -> Response {
    match plan_budget(&request, &state.careers, &state.lifestyle, &state.taxes) {
        Ok(summary) => json_response(StatusCode::OK, summary),
        Err(err) => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    }
}

async fn submit_handler(
    State(state): State<SharedState>,
    Json(request): Json<BudgetRequest>,
) -> Response {
    let summary = match plan_budget(&request, &state.careers, &state.lifestyle, &state.taxes) {
        Ok(summary) => summary,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    };
    let record = match summary.clone().into_record() {
        Ok(record) => record,
        Err(err) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, &err.to_string()),
    };

    let _guard = state.submissions.lock().await;
    if let Err(err) = tables::append_participant(&state.participants_path, &record) {
        warn!("{err}");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to save submission");
    }
    info!(participant = %record.name, career = %record.career, "accepted submission");
    json_response(StatusCode::CREATED, SubmitResponse { record, summary })
}

async fn load_series(state: &AppState) -> Result<CohortSeries, Response> {
    let _guard = state.submissions.lock().await;
    let participants = tables::load_participants(&state.participants_path).map_err(|err| {
        warn!("{err}");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to read participants")
    })?;
    Ok(build_series(&participants, &state.careers, &state.config))
}

async fn series_handler(State(state): State<SharedState>) -> Response {
    match load_series(&state).await {
        Ok(series) => json_response(
            StatusCode::OK,
            SeriesResponse {
                participants: series.participant_count(state.config.horizon_months),
                rows: series.rows,
                issues: series.issues,
            },
        ),
        Err(response) => response,
    }
}

async fn animation_handler(State(state): State<SharedState>) -> Response {
    match load_series(&state).await {
        Ok(series) => {
            let spec: AnimationSpec = build_animation(&series.rows);
            json_response(StatusCode::OK, spec)
        }
        Err(response) => response,
    }
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CareerProfile, HORIZON_MONTHS, Jurisdiction, LoanSchedule, TaxBracket};

    fn sample_state(participants_path: PathBuf) -> SharedState {
        let bracket = |jurisdiction, rate| TaxBracket {
            status: FilingStatus::Single,
            jurisdiction,
            lower_bound: 0.0,
            upper_bound: None,
            rate,
            standard_deduction: 0.0,
        };
        let option = |category: &str, option: &str, cost: f64, pct: Option<&str>| LifestyleOption {
            category: category.to_string(),
            option: option.to_string(),
            monthly_cost: cost,
            percentage: pct.map(str::to_string),
        };
        Arc::new(AppState {
            taxes: TaxTable::new(vec![
                bracket(Jurisdiction::Federal, 0.10),
                bracket(Jurisdiction::State, 0.05),
            ]),
            careers: CareerCatalog::new(vec![CareerProfile {
                profession: "Electrician".to_string(),
                requires_school: false,
                years_in_school: 0.0,
                savings_during_school: 0.0,
                average_salary: 36_000.0,
                savings_after_school: 250.0,
                loan_schedule: LoanSchedule::default(),
            }]),
            lifestyle: LifestyleCatalog::new(vec![
                option("Housing", "Apartment", 1_000.0, None),
                option("Housing", "Military", 0.0, None),
                option("Savings", "Ten percent", 0.0, Some("10%")),
                option("Savings", "Whatever is left", 0.0, None),
            ]),
            participants_path,
            config: ProjectionConfig::default(),
            submissions: Mutex::new(()),
        })
    }

    fn budget_request(savings_choice: &str) -> BudgetRequest {
        serde_json::from_str(&format!(
            r#"{{
              "name": "Ava",
              "career": "Electrician",
              "filingStatus": "Single",
              "militaryService": "No",
              "selections": [{{"category": "Housing", "option": "Apartment"}}],
              "savingsChoice": "{savings_choice}"
            }}"#
        ))
        .expect("request json parses")
    }

    fn temp_participants(tag: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "networth-api-{tag}-{}.csv",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn projection_config_converts_percent_and_validates() {
        let config = build_projection_config(&ProjectionArgs {
            horizon_months: 300,
            annual_savings_rate: 5.0,
        })
        .expect("valid config");
        assert_eq!(config, ProjectionConfig::default());

        let err = build_projection_config(&ProjectionArgs {
            horizon_months: 0,
            annual_savings_rate: 5.0,
        })
        .expect_err("zero horizon");
        assert!(err.contains("--horizon-months"));

        let err = build_projection_config(&ProjectionArgs {
            horizon_months: 12,
            annual_savings_rate: -100.0,
        })
        .expect_err("rate at -100%");
        assert!(err.contains("--annual-savings-rate"));
    }

    #[test]
    fn projection_horizon_is_capped() {
        let at_cap = build_projection_config(&ProjectionArgs {
            horizon_months: MAX_HORIZON_MONTHS,
            annual_savings_rate: 5.0,
        })
        .expect("cap itself is allowed");
        assert_eq!(at_cap.horizon_months, 1_200);

        let err = build_projection_config(&ProjectionArgs {
            horizon_months: 4_000_000_000,
            annual_savings_rate: 5.0,
        })
        .expect_err("horizon past the cap");
        assert_eq!(err, "--horizon-months must be <= 1200");
    }

    #[tokio::test]
    async fn cli_rejects_oversized_horizon_before_loading_files() {
        let cli = Cli::try_parse_from(["networth", "project", "--horizon-months", "5000"])
            .expect("cli parses");
        let err = run(cli).await.expect_err("horizon past the cap");
        assert!(matches!(err, CommandError::InvalidArgument(ref msg) if msg.contains("--horizon-months")));
    }

    #[test]
    fn selection_parser_requires_category_and_option() {
        let selection = parse_selection(" Housing = Apartment ").expect("valid");
        assert_eq!(selection.category, "Housing");
        assert_eq!(selection.option, "Apartment");
        assert!(parse_selection("Housing").is_err());
        assert!(parse_selection("=Apartment").is_err());
    }

    #[test]
    fn cli_parses_budget_command_with_repeated_choices() {
        let cli = Cli::try_parse_from([
            "networth",
            "budget",
            "--name",
            "Ava",
            "--career",
            "Nurse",
            "--status",
            "married",
            "--military-service",
            "full-time",
            "--choice",
            "Housing=Military",
            "--choice",
            "Transportation=Bus",
            "--submit",
        ])
        .expect("cli parses");
        match cli.command {
            Command::Budget {
                status,
                military_service,
                choices,
                savings,
                submit,
                ..
            } => {
                assert_eq!(status, CliFilingStatus::Married);
                assert_eq!(military_service, CliMilitaryService::FullTime);
                assert_eq!(choices.len(), 2);
                assert_eq!(savings, "Whatever is left");
                assert!(submit);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_project_defaults_match_file_names() {
        let cli = Cli::try_parse_from(["networth", "project"]).expect("cli parses");
        match cli.command {
            Command::Project {
                participants,
                output,
                animation,
                projection,
                ..
            } => {
                assert_eq!(participants, PathBuf::from("participant_data.csv"));
                assert_eq!(output, PathBuf::from("financial_model_plot.csv"));
                assert!(animation.is_none());
                assert_eq!(projection.horizon_months, HORIZON_MONTHS);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[tokio::test]
    async fn tax_endpoint_reports_missing_status_as_unprocessable() {
        let state = sample_state(temp_participants("tax"));
        let ok = tax_handler(
            State(state.clone()),
            Json(TaxPayload {
                income: 36_000.0,
                filing_status: FilingStatus::Single,
            }),
        )
        .await;
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(
            ok.headers().get(header::CACHE_CONTROL),
            Some(&HeaderValue::from_static("no-store"))
        );

        let missing = tax_handler(
            State(state),
            Json(TaxPayload {
                income: 36_000.0,
                filing_status: FilingStatus::Married,
            }),
        )
        .await;
        assert_eq!(missing.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn submit_appends_only_balanced_budgets() {
        let path = temp_participants("submit");
        let state = sample_state(path.clone());

        let rejected = submit_handler(State(state.clone()), Json(budget_request("Ten percent"))).await;
        assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!path.exists());

        let accepted =
            submit_handler(State(state.clone()), Json(budget_request("Whatever is left"))).await;
        assert_eq!(accepted.status(), StatusCode::CREATED);

        let participants = tables::load_participants(&path).expect("participants saved");
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].name, "Ava");
        assert!((participants[0].savings - 1_550.0).abs() < 1e-6);

        let series = load_series(&state).await.expect("series builds");
        assert_eq!(series.rows.len(), HORIZON_MONTHS as usize);
        assert!(series.issues.is_empty());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn budget_endpoint_rejects_unknown_career() {
        let state = sample_state(temp_participants("budget"));
        let mut request = budget_request("Whatever is left");
        request.career = "Pilot".to_string();
        let response = budget_handler(State(state), Json(request)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    async fn lifestyle_json(service: MilitaryService) -> serde_json::Value {
        let state = sample_state(temp_participants("lifestyle"));
        let response = lifestyle_handler(
            State(state),
            Query(LifestyleQuery {
                military_service: service,
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&body).expect("lifestyle json")
    }

    fn housing_options(body: &serde_json::Value) -> Vec<String> {
        body["categories"][0]["options"]
            .as_array()
            .expect("housing options")
            .iter()
            .map(|o| o["option"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[tokio::test]
    async fn lifestyle_endpoint_offers_military_housing_only_to_full_time() {
        let part_time = lifestyle_json(MilitaryService::PartTime).await;
        assert_eq!(part_time["militaryService"], "Part Time");
        assert_eq!(part_time["categories"][0]["category"], "Housing");
        assert_eq!(housing_options(&part_time), vec!["Apartment"]);

        let full_time = lifestyle_json(MilitaryService::FullTime).await;
        assert_eq!(housing_options(&full_time), vec!["Apartment", "Military"]);

        let savings = full_time["savings"].as_array().expect("savings options");
        assert_eq!(savings.len(), 2);
        assert_eq!(savings[0]["percentage"], "10%");
        assert!(savings[1].get("percentage").is_none());
    }

    #[test]
    fn lifestyle_query_defaults_to_no_service() {
        let query: LifestyleQuery = serde_json::from_str("{}").expect("empty query");
        assert_eq!(query.military_service, MilitaryService::No);
        let query: LifestyleQuery =
            serde_json::from_str(r#"{"militaryService": "Full Time"}"#).expect("full time");
        assert_eq!(query.military_service, MilitaryService::FullTime);
    }

    #[tokio::test]
    async fn careers_endpoint_lists_worksheet_savings() {
        let state = sample_state(temp_participants("careers"));
        let response = careers_handler(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let careers: serde_json::Value = serde_json::from_slice(&body).expect("careers json");
        assert_eq!(careers[0]["profession"], "Electrician");
        assert_eq!(careers[0]["savingsAfterSchool"], 250.0);
    }

    #[tokio::test]
    async fn series_of_missing_participant_file_is_empty() {
        let state = sample_state(temp_participants("empty"));
        let response = series_handler(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
