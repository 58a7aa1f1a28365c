//! CSV tables: tax brackets, careers, lifestyle options, participants and the long series.
//!
//! Headers and cells are trimmed. Money cells accept `$`, thousands separators and
//! accounting parentheses; cells that do not parse are treated as absent.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::Serialize;
use tracing::{debug, warn};

use crate::core::{
    CareerCatalog, CareerProfile, FilingStatus, Jurisdiction, LOAN_SCHEDULE_MONTHS,
    LifestyleCatalog, LifestyleOption, LoanSchedule, LongSeriesRow, MilitaryService,
    ParticipantRecord, TaxBracket, TaxTable,
};

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {table} table: {source}")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("{table} table is missing required column '{column}'")]
    MissingColumn { table: &'static str, column: String },

    #[error("{table} table row {row}: {message}")]
    InvalidRow {
        table: &'static str,
        row: usize,
        message: String,
    },

    #[error("failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),
}

const TAX: &str = "tax";
const CAREER: &str = "career";
const PARTICIPANT: &str = "participant";
const LIFESTYLE: &str = "lifestyle";
const SERIES: &str = "series";

struct Columns {
    table: &'static str,
    index: HashMap<String, usize>,
}

impl Columns {
    fn from_headers(table: &'static str, headers: &StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim().to_ascii_lowercase(), idx))
            .collect();
        Self { table, index }
    }

    fn optional(&self, name: &str) -> Option<usize> {
        self.index.get(&name.to_ascii_lowercase()).copied()
    }

    fn require(&self, name: &str) -> Result<usize, TableError> {
        self.optional(name).ok_or_else(|| TableError::MissingColumn {
            table: self.table,
            column: name.to_string(),
        })
    }
}

fn cell(record: &StringRecord, idx: Option<usize>) -> Option<&str> {
    let value = record.get(idx?)?.trim();
    (!value.is_empty()).then_some(value)
}

/// Lenient money parse: `$1,234.50`, `-20000`, `(1,000)`.
pub fn parse_money(raw: &str) -> Option<f64> {
    let mut text = raw.trim();
    let mut negative = false;
    if let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        negative = true;
        text = inner;
    }
    let cleaned = text
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect::<String>();
    let value = cleaned.parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(if negative { -value } else { value })
}

fn parse_rate(raw: &str) -> Option<f64> {
    match raw.trim().strip_suffix('%') {
        Some(pct) => parse_money(pct).map(|v| v / 100.0),
        None => parse_money(raw),
    }
}

fn parse_flag(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|v| v.to_ascii_lowercase()).as_deref(),
        Some("yes" | "y" | "true" | "1")
    )
}

fn money_or_zero(record: &StringRecord, idx: Option<usize>) -> f64 {
    cell(record, idx).and_then(parse_money).unwrap_or(0.0)
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader)
}

fn open(path: &Path) -> Result<File, TableError> {
    File::open(path).map_err(|source| TableError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn columns<R: Read>(table: &'static str, rdr: &mut csv::Reader<R>) -> Result<Columns, TableError> {
    let headers = rdr
        .headers()
        .map_err(|source| TableError::Csv { table, source })?;
    Ok(Columns::from_headers(table, headers))
}

/// Reference tables are all-or-nothing: one undecodable row fails the load.
fn records<R: Read>(
    table: &'static str,
    reader: R,
) -> Result<(Columns, Vec<StringRecord>), TableError> {
    let mut rdr = csv_reader(reader);
    let cols = columns(table, &mut rdr)?;
    let rows = rdr
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TableError::Csv { table, source })?;
    Ok((cols, rows))
}

pub fn read_tax_table<R: Read>(reader: R) -> Result<TaxTable, TableError> {
    let (cols, rows) = records(TAX, reader)?;
    let status_col = cols.require("Status")?;
    let type_col = cols.require("Type")?;
    let lower_col = cols.require("Lower Bound")?;
    let upper_col = cols.require("Upper Bound")?;
    let rate_col = cols.require("Rate")?;
    let deduction_col = cols.optional("Standard Deduction");

    let mut brackets = Vec::with_capacity(rows.len());
    for (idx, record) in rows.iter().enumerate() {
        let row = idx + 2;
        let status = cell(record, Some(status_col)).map(str::parse::<FilingStatus>);
        let jurisdiction = cell(record, Some(type_col)).map(str::parse::<Jurisdiction>);
        let (Some(Ok(status)), Some(Ok(jurisdiction))) = (status, jurisdiction) else {
            warn!(row, "skipping tax row with unrecognised Status or Type");
            continue;
        };

        let invalid = |message: &str| TableError::InvalidRow {
            table: TAX,
            row,
            message: message.to_string(),
        };
        let lower_bound = cell(record, Some(lower_col))
            .and_then(parse_money)
            .ok_or_else(|| invalid("Lower Bound is not a number"))?;
        let upper_bound = match cell(record, Some(upper_col)) {
            None => None,
            Some(raw) => Some(parse_money(raw).ok_or_else(|| invalid("Upper Bound is not a number"))?),
        };
        let rate = cell(record, Some(rate_col))
            .and_then(parse_rate)
            .ok_or_else(|| invalid("Rate is not a number"))?;

        brackets.push(TaxBracket {
            status,
            jurisdiction,
            lower_bound,
            upper_bound,
            rate,
            standard_deduction: money_or_zero(record, deduction_col),
        });
    }

    debug!(rows = brackets.len(), "loaded tax brackets");
    Ok(TaxTable::new(brackets))
}

pub fn read_careers<R: Read>(reader: R) -> Result<CareerCatalog, TableError> {
    let (cols, rows) = records(CAREER, reader)?;
    let profession_col = cols.require("Profession")?;
    let requires_school_col = cols.optional("Requires School");
    let years_col = cols.optional("Years in School");
    let during_col = cols.optional("Savings During School");
    let salary_col = cols.optional("Average Salary");
    let savings_col = cols.optional("Savings");
    let month_cols = (1..=LOAN_SCHEDULE_MONTHS)
        .map(|m| cols.optional(&format!("month {m}")))
        .collect::<Vec<_>>();

    let mut careers = Vec::with_capacity(rows.len());
    for record in &rows {
        let Some(profession) = cell(record, Some(profession_col)) else {
            continue;
        };
        let loans = month_cols
            .iter()
            .map(|&col| money_or_zero(record, col))
            .collect::<Vec<_>>();
        careers.push(CareerProfile {
            profession: profession.to_string(),
            requires_school: parse_flag(cell(record, requires_school_col)),
            years_in_school: money_or_zero(record, years_col).max(0.0),
            savings_during_school: money_or_zero(record, during_col),
            average_salary: money_or_zero(record, salary_col),
            savings_after_school: money_or_zero(record, savings_col),
            loan_schedule: LoanSchedule::new(loans),
        });
    }

    debug!(careers = careers.len(), "loaded career profiles");
    Ok(CareerCatalog::new(careers))
}

/// The participant log is append-only and user-fed, so a row that cannot be
/// decoded is skipped with a warning instead of failing the whole cohort.
pub fn read_participants<R: Read>(reader: R) -> Result<Vec<ParticipantRecord>, TableError> {
    let mut rdr = csv_reader(reader);
    let cols = columns(PARTICIPANT, &mut rdr)?;
    let name_col = cols.require("Name")?;
    let career_col = cols.require("Career")?;
    let military_col = cols.optional("Military Service");
    let savings_col = cols.optional("Savings");

    let mut participants = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(source) if source.is_io_error() => {
                return Err(TableError::Csv {
                    table: PARTICIPANT,
                    source,
                });
            }
            Err(err) => {
                warn!(row = idx + 2, "skipping participant row: {err}");
                continue;
            }
        };
        let military_service = match cell(&record, military_col).map(str::parse::<MilitaryService>) {
            None => MilitaryService::No,
            Some(Ok(service)) => service,
            Some(Err(err)) => {
                warn!(row = idx + 2, "{err}; using No");
                MilitaryService::No
            }
        };
        participants.push(ParticipantRecord {
            name: cell(&record, Some(name_col)).unwrap_or_default().to_string(),
            career: cell(&record, Some(career_col)).unwrap_or_default().to_string(),
            military_service,
            savings: money_or_zero(&record, savings_col),
        });
    }
    Ok(participants)
}

pub fn read_lifestyle<R: Read>(reader: R) -> Result<LifestyleCatalog, TableError> {
    let (cols, rows) = records(LIFESTYLE, reader)?;
    let category_col = cols.require("Category")?;
    let option_col = cols.require("Option")?;
    let cost_col = cols.optional("Monthly Cost");
    let percentage_col = cols.optional("Percentage");

    let options = rows
        .iter()
        .filter_map(|record| {
            Some(LifestyleOption {
                category: cell(record, Some(category_col))?.to_string(),
                option: cell(record, Some(option_col))?.to_string(),
                monthly_cost: money_or_zero(record, cost_col),
                percentage: cell(record, percentage_col).map(str::to_string),
            })
        })
        .collect();
    Ok(LifestyleCatalog::new(options))
}

pub fn write_series<W: Write>(writer: W, rows: &[LongSeriesRow]) -> Result<(), TableError> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    for row in rows {
        wtr.serialize(row)
            .map_err(|source| TableError::Csv { table: SERIES, source })?;
    }
    wtr.flush().map_err(|source| TableError::Io {
        path: "series output".to_string(),
        source,
    })
}

pub fn load_tax_table(path: &Path) -> Result<TaxTable, TableError> {
    read_tax_table(open(path)?)
}

pub fn load_careers(path: &Path) -> Result<CareerCatalog, TableError> {
    read_careers(open(path)?)
}

pub fn load_lifestyle(path: &Path) -> Result<LifestyleCatalog, TableError> {
    read_lifestyle(open(path)?)
}

/// A participant file that does not exist yet is an empty cohort.
pub fn load_participants(path: &Path) -> Result<Vec<ParticipantRecord>, TableError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    read_participants(open(path)?)
}

pub fn save_series(path: &Path, rows: &[LongSeriesRow]) -> Result<(), TableError> {
    let file = File::create(path).map_err(|source| TableError::Io {
        path: path.display().to_string(),
        source,
    })?;
    write_series(file, rows)
}

pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), TableError> {
    let file = File::create(path).map_err(|source| TableError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}

/// Appends one submission, writing the header only when the file is new or empty.
pub fn append_participant(path: &Path, record: &ParticipantRecord) -> Result<(), TableError> {
    let io_err = |source| TableError::Io {
        path: path.display().to_string(),
        source,
    };
    let needs_header = std::fs::metadata(path)
        .map(|m| m.len() == 0)
        .unwrap_or(true);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;

    let mut wtr = WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    wtr.serialize(record)
        .map_err(|source| TableError::Csv {
            table: PARTICIPANT,
            source,
        })?;
    wtr.flush().map_err(io_err)
}
