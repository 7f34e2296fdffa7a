use std::cmp::Ordering;
use std::str::FromStr;

use crate::ashby::models::Candidate;
use crate::errors::AppError;

/// The only pipeline stage this tool works with.
pub const APPLICATION_REVIEW_STAGE: &str = "Application Review";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    Date,
}

impl FromStr for SortKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortKey::Name),
            "date" => Ok(SortKey::Date),
            other => Err(AppError::InvalidArgument(format!(
                "unknown sort key '{other}' (expected 'name' or 'date')"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn is_ascending(self) -> bool {
        self == SortOrder::Ascending
    }
}

impl FromStr for SortOrder {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Ascending),
            "desc" => Ok(SortOrder::Descending),
            other => Err(AppError::InvalidArgument(format!(
                "unknown sort order '{other}' (expected 'asc' or 'desc')"
            ))),
        }
    }
}

/// Keeps the candidates whose current stage is exactly `stage_name` and orders them by
/// `key`.
///
/// The sort is stable in both directions: equal keys keep their input order, and
/// candidates without a value for the key always come last.
pub fn filter_and_sort(
    candidates: Vec<Candidate>,
    stage_name: &str,
    key: SortKey,
    ascending: bool,
) -> Vec<Candidate> {
    let mut retained: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| c.stage.as_deref() == Some(stage_name))
        .collect();

    retained.sort_by(|a, b| match key {
        SortKey::Name => compare_missing_last(a.name.as_ref(), b.name.as_ref(), ascending),
        SortKey::Date => compare_missing_last(
            a.application_date.as_ref(),
            b.application_date.as_ref(),
            ascending,
        ),
    });

    retained
}

fn compare_missing_last<T: Ord>(a: Option<&T>, b: Option<&T>, ascending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if ascending => a.cmp(b),
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
