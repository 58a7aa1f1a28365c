use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use super::engine::{ProjectionConfig, ProjectionInputs, project};
use super::types::{CareerCatalog, CareerProfile, LongSeriesRow, ParticipantRecord};

/// Reference-data problem found while building a series. Reported once per distinct cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IntegrityIssue {
    #[serde(rename_all = "camelCase")]
    MissingCareer {
        career: String,
        first_participant: String,
    },
    #[serde(rename_all = "camelCase")]
    DuplicateCareer { profession: String },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::MissingCareer {
                career,
                first_participant,
            } => write!(
                f,
                "career '{career}' (first chosen by '{first_participant}') has no reference row; \
                 its financial fields are treated as zero"
            ),
            IntegrityIssue::DuplicateCareer { profession } => write!(
                f,
                "profession '{profession}' appears more than once; only the first row is used"
            ),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CohortSeries {
    pub rows: Vec<LongSeriesRow>,
    pub issues: Vec<IntegrityIssue>,
}

impl CohortSeries {
    pub fn participant_count(&self, horizon_months: u32) -> usize {
        if horizon_months == 0 {
            return 0;
        }
        self.rows.len() / horizon_months as usize
    }
}

struct JoinedRow<'a> {
    participant: &'a ParticipantRecord,
    career: Option<&'a CareerProfile>,
}

fn join<'a>(
    participants: &'a [ParticipantRecord],
    careers: &'a CareerCatalog,
    issues: &mut Vec<IntegrityIssue>,
) -> Vec<JoinedRow<'a>> {
    let mut reported = HashSet::new();
    participants
        .iter()
        .map(|participant| {
            let career = careers.get(&participant.career);
            if career.is_none() && reported.insert(participant.career.as_str()) {
                let issue = IntegrityIssue::MissingCareer {
                    career: participant.career.clone(),
                    first_participant: participant.name.clone(),
                };
                warn!("{issue}");
                issues.push(issue);
            }
            JoinedRow {
                participant,
                career,
            }
        })
        .collect()
}

/// Joins participants to careers, projects each one and flattens to long rows.
///
/// Rows are grouped by participant in input order with months ascending inside each group.
pub fn build_series(
    participants: &[ParticipantRecord],
    careers: &CareerCatalog,
    config: &ProjectionConfig,
) -> CohortSeries {
    let mut issues = careers
        .duplicates()
        .iter()
        .collect::<HashSet<_>>()
        .into_iter()
        .map(|profession| IntegrityIssue::DuplicateCareer {
            profession: profession.clone(),
        })
        .collect::<Vec<_>>();
    issues.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
    for issue in &issues {
        warn!("{issue}");
    }

    let joined = join(participants, careers, &mut issues);
    let unmatched = CareerProfile::unmatched();

    let mut rows = Vec::with_capacity(joined.len() * config.horizon_months as usize);
    for row in joined {
        let career = row.career.unwrap_or(&unmatched);
        let inputs = ProjectionInputs::from_career(career, row.participant.savings);
        let projection = project(&inputs, config);
        debug!(
            participant = %row.participant.name,
            profession = %career.profession,
            final_net_worth = projection.final_net_worth(),
            "projected participant"
        );

        rows.extend(projection.points.into_iter().map(|point| LongSeriesRow {
            name: row.participant.name.clone(),
            profession: career.profession.clone(),
            month: point.month,
            net_worth: point.net_worth,
            label: format_accounting(point.net_worth),
        }));
    }

    CohortSeries { rows, issues }
}

/// `$1,234.56` for non-negative amounts, `($1,234.56)` for negative ones.
pub fn format_accounting(amount: f64) -> String {
    let body = format_currency(amount.abs());
    if amount < 0.0 {
        format!("({body})")
    } else {
        body
    }
}

/// `$` plus thousands separators and two decimals. Negative values keep a leading `-`.
pub fn format_currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}
