/*
 * comms-dashboard
 * Copyright © 2023 Centre for Policy Dialogue
 *
 * comms-dashboard is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * comms-dashboard is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with comms-dashboard. If not, see <https://www.gnu.org/licenses/>
 * and navigate to version 3 of the GNU General Public License.
 */

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use serde::Serialize;
use crate::common::*;
use crate::parse::CannotParse;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Date,
    Metric(Metric)
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ascending,
    Descending
}

/// The table's sort column, if any, and its direction
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct SortConfig {
    pub key: Option<SortKey>,
    pub direction: Direction
}

impl SortConfig {
    pub fn by(key: SortKey, direction: Direction) -> Self {
        Self { key: Some(key), direction }
    }

    /// Clicking a column heading: the same column flips to descending once, anything
    /// else sorts ascending
    pub fn toggle(self, key: SortKey) -> Self {
        let direction = match self {
            Self { key: Some(current), direction: Direction::Ascending } if current == key => Direction::Descending,
            _ => Direction::Ascending
        };
        Self::by(key, direction)
    }
}

impl FromStr for SortKey {
    type Err = CannotParse;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("date") {
            Ok(Self::Date)
        } else {
            Ok(Self::Metric(Metric::from_str(value)?))
        }
    }
}

impl Display for SortKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Date => f.write_str("Date"),
            Self::Metric(metric) => Display::fmt(metric, f)
        }
    }
}

fn compare_rows(key: SortKey, a: &CanonicalRow, b: &CanonicalRow) -> Ordering {
    match key {
        // Undated rows sort first, as if at the start of time
        SortKey::Date => a.date().cmp(&b.date()),
        SortKey::Metric(metric) => a.metric(metric).cmp(&b.metric(metric))
    }
}

/// Sorted view of the rows. The input is left untouched; without a sort column the
/// rows come back in their original order
pub fn sort_rows<'r>(rows: &[&'r CanonicalRow], config: SortConfig) -> Vec<&'r CanonicalRow> {
    let mut sorted = rows.to_vec();
    if let Some(key) = config.key {
        match config.direction {
            Direction::Ascending => sorted.sort_by(|a, b| compare_rows(key, a, b)),
            Direction::Descending => sorted.sort_by(|a, b| compare_rows(key, b, a))
        }
    }
    sorted
}

/// A row of the table as displayed
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct TableRow {
    pub date: String,
    #[serde(flatten)]
    pub counts: MetricTotals
}

impl From<&CanonicalRow> for TableRow {
    fn from(row: &CanonicalRow) -> Self {
        Self { date: row.display_date(), counts: row.metrics() }
    }
}

#[cfg(test)]
mod tests {
    use crate::analysis::fill_years;
    use super::*;

    fn rows() -> Vec<CanonicalRow> {
        fill_years([("3.1.2024", "5"), ("1.1", "x"), ("2.1", "9"), ("4.1", "5")].map(|(date, calls)| {
            let mut row = RawRow::default();
            row.populate(DATE_COLUMN, date);
            row.populate(Metric::Calls.column(), calls);
            row
        }))
    }

    fn dates(rows: &[&CanonicalRow]) -> Vec<String> {
        rows.iter().map(|row| row.display_date()).collect()
    }

    #[test]
    fn no_key_keeps_order() {
        let rows = rows();
        let view = rows.iter().collect::<Vec<_>>();
        assert_eq!(view, sort_rows(&view, SortConfig::default()));
    }

    #[test]
    fn sort_by_date() {
        let rows = rows();
        let view = rows.iter().collect::<Vec<_>>();
        let ascending = sort_rows(&view, SortConfig::by(SortKey::Date, Direction::Ascending));
        assert_eq!(vec!["01/01/2024", "02/01/2024", "03/01/2024", "04/01/2024"], dates(&ascending));
        let descending = sort_rows(&view, SortConfig::by(SortKey::Date, Direction::Descending));
        assert_eq!(vec!["04/01/2024", "03/01/2024", "02/01/2024", "01/01/2024"], dates(&descending));
        // Input untouched
        assert_eq!("03/01/2024", view[0].display_date());
    }

    #[test]
    fn sort_by_metric_reads_bad_counts_as_zero() {
        let rows = rows();
        let view = rows.iter().collect::<Vec<_>>();
        let sorted = sort_rows(&view, SortConfig::by(SortKey::Metric(Metric::Calls), Direction::Ascending));
        assert_eq!(vec![0, 5, 5, 9], sorted.iter().map(|row| row.metric(Metric::Calls)).collect::<Vec<_>>());
        let sorted = sort_rows(&view, SortConfig::by(SortKey::Metric(Metric::Calls), Direction::Descending));
        assert_eq!(vec![9, 5, 5, 0], sorted.iter().map(|row| row.metric(Metric::Calls)).collect::<Vec<_>>());
    }

    #[test]
    fn resorting_is_idempotent() {
        let rows = rows();
        let view = rows.iter().collect::<Vec<_>>();
        for config in [
            SortConfig::by(SortKey::Metric(Metric::Calls), Direction::Ascending),
            SortConfig::by(SortKey::Date, Direction::Descending)
        ] {
            let once = sort_rows(&view, config);
            assert_eq!(once, sort_rows(&once, config));
        }
    }

    #[test]
    fn toggling_columns() {
        let config = SortConfig::default().toggle(SortKey::Date);
        assert_eq!(SortConfig::by(SortKey::Date, Direction::Ascending), config);
        let config = config.toggle(SortKey::Date);
        assert_eq!(SortConfig::by(SortKey::Date, Direction::Descending), config);
        let config = config.toggle(SortKey::Date);
        assert_eq!(SortConfig::by(SortKey::Date, Direction::Ascending), config);
        let config = config.toggle(SortKey::Metric(Metric::Emails));
        assert_eq!(SortConfig::by(SortKey::Metric(Metric::Emails), Direction::Ascending), config);
    }

    #[test]
    fn sort_key_names() {
        assert_eq!(Ok(SortKey::Date), "date".parse());
        assert_eq!(Ok(SortKey::Metric(Metric::Fourth)), "fourth".parse());
        assert!("weather".parse::<SortKey>().is_err());
    }
}
