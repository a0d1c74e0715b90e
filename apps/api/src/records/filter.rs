use std::collections::HashSet;
use std::str::FromStr;

use serde::Deserialize;

use crate::models::options::{GraduationYear, UnknownOption};
use crate::records::kinds::RecordKind;

/// Raw list-page query string: `?q=&category=&year=`. Empty values mean
/// "no filter".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
}

impl ListQuery {
    pub fn into_filter<C>(self) -> Result<RecordFilter<C>, UnknownOption>
    where
        C: FromStr<Err = UnknownOption>,
    {
        Ok(RecordFilter {
            query: self.q.unwrap_or_default(),
            category: parse_selected(self.category)?,
            year: parse_selected(self.year)?,
        })
    }
}

fn parse_selected<T: FromStr<Err = UnknownOption>>(
    raw: Option<String>,
) -> Result<Option<T>, UnknownOption> {
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some),
    }
}

/// Conjunction of three predicates. Each one left at its default matches
/// every row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFilter<C> {
    /// Case-insensitive substring of `company_name` or `job_type`.
    pub query: String,
    pub category: Option<C>,
    pub year: Option<GraduationYear>,
}

impl<C> Default for RecordFilter<C> {
    fn default() -> Self {
        Self {
            query: String::new(),
            category: None,
            year: None,
        }
    }
}

impl<C: Copy + Eq> RecordFilter<C> {
    /// Keeps the rows matching every predicate, preserving input order.
    pub fn apply<'a, K>(&self, rows: &'a [K::Row]) -> Vec<&'a K::Row>
    where
        K: RecordKind<Category = C>,
    {
        let needle = self.query.to_lowercase();
        rows.iter()
            .filter(|row| self.matches::<K>(row, &needle))
            .collect()
    }

    fn matches<K>(&self, row: &K::Row, needle: &str) -> bool
    where
        K: RecordKind<Category = C>,
    {
        let header = K::header(row);
        let matches_search = header.company_name.to_lowercase().contains(needle)
            || header.job_type.to_lowercase().contains(needle);
        let matches_category = self.category.map_or(true, |c| K::category(row) == c);
        let matches_year = self.year.map_or(true, |y| header.graduation_year == y);
        matches_search && matches_category && matches_year
    }
}

/// Distinct graduation years present in `rows`, sorted ascending by label.
pub fn year_options<K: RecordKind>(rows: &[K::Row]) -> Vec<GraduationYear> {
    let mut seen = HashSet::new();
    let mut years: Vec<GraduationYear> = rows
        .iter()
        .map(|row| K::header(row).graduation_year)
        .filter(|year| seen.insert(*year))
        .collect();
    years.sort_by(|a, b| a.label().cmp(b.label()));
    years
}
