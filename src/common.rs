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

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::ops::{Index, IndexMut};
use chrono::NaiveDate;
use serde::Serialize;

/// The column holding the date of each row
pub const DATE_COLUMN: &str = "B";

/// A raw value as read from a spreadsheet cell
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(Box<str>),
    Number(f64)
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl CellValue {
    /// The textual form of the cell, as the spreadsheet would show it without formatting
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Empty => Cow::Borrowed(""),
            Self::Text(text) => Cow::Borrowed(text.as_ref()),
            Self::Number(number) => Cow::Owned(number.to_string())
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::Number(_) => false
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(Box::from(value))
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value.into_boxed_str())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_text())
    }
}

/// One of the four tracked communication channels
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Calls,
    Emails,
    EFilings,
    /// Administrative filings of the fourth kind. Summed like the others
    Fourth
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Calls, Metric::Emails, Metric::EFilings, Metric::Fourth];

    /// The spreadsheet column holding this metric
    pub fn column(self) -> &'static str {
        match self {
            Self::Calls => "C",
            Self::Emails => "D",
            Self::EFilings => "E",
            Self::Fourth => "F"
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Calls => "calls",
            Self::Emails => "emails",
            Self::EFilings => "efilings",
            Self::Fourth => "fourth"
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Calls => "Calls",
            Self::Emails => "E-mails",
            Self::EFilings => "E-filings",
            Self::Fourth => "Fourth category"
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One value for each metric. Never partial
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize)]
pub struct PerMetric<T> {
    pub calls: T,
    pub emails: T,
    pub efilings: T,
    pub fourth: T
}

impl<T> PerMetric<T> {
    pub fn from_fn<F>(mut f: F) -> Self where F: FnMut(Metric) -> T {
        Self {
            calls: f(Metric::Calls),
            emails: f(Metric::Emails),
            efilings: f(Metric::EFilings),
            fourth: f(Metric::Fourth)
        }
    }

    pub fn map<U, F>(&self, mut f: F) -> PerMetric<U> where F: FnMut(Metric, &T) -> U {
        PerMetric::from_fn(|metric| f(metric, &self[metric]))
    }
}

impl<T> Index<Metric> for PerMetric<T> {
    type Output = T;

    fn index(&self, metric: Metric) -> &T {
        match metric {
            Metric::Calls => &self.calls,
            Metric::Emails => &self.emails,
            Metric::EFilings => &self.efilings,
            Metric::Fourth => &self.fourth
        }
    }
}

impl<T> IndexMut<Metric> for PerMetric<T> {
    fn index_mut(&mut self, metric: Metric) -> &mut T {
        match metric {
            Metric::Calls => &mut self.calls,
            Metric::Emails => &mut self.emails,
            Metric::EFilings => &mut self.efilings,
            Metric::Fourth => &mut self.fourth
        }
    }
}

/// Summed counts per metric
pub type MetricTotals = PerMetric<u64>;

impl MetricTotals {
    /// Combined count across every metric
    pub fn combined(&self) -> u64 {
        Metric::ALL.iter().fold(0u64, |sum, metric| sum.saturating_add(self[*metric]))
    }

    pub fn accumulate(&mut self, other: &MetricTotals) {
        for metric in Metric::ALL {
            self[metric] = self[metric].saturating_add(other[metric]);
        }
    }
}

/// A row as delivered by ingestion, keyed by column letter
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawRow {
    cells: HashMap<Box<str>, CellValue>
}

impl RawRow {
    pub fn populate<K, V>(&mut self, column: K, value: V) where K: Into<Box<str>>, V: Into<CellValue> {
        self.cells.insert(column.into(), value.into());
    }

    /// Missing cells read as empty
    pub fn cell(&self, column: &str) -> &CellValue {
        self.cells.get(column).unwrap_or(&EMPTY_CELL)
    }

    pub fn date_cell(&self) -> &CellValue {
        self.cell(DATE_COLUMN)
    }

    pub fn metric_cell(&self, metric: Metric) -> &CellValue {
        self.cell(metric.column())
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(CellValue::is_blank)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

impl<K, V> FromIterator<(K, V)> for RawRow where K: Into<Box<str>>, V: Into<CellValue> {
    fn from_iter<I: IntoIterator<Item=(K, V)>>(iter: I) -> Self {
        let mut row = RawRow::default();
        for (column, value) in iter {
            row.populate(column, value);
        }
        row
    }
}

/// A row whose date cell has passed through year inference
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CanonicalRow {
    row: RawRow
}

impl CanonicalRow {
    pub(crate) fn new(row: RawRow) -> Self {
        Self { row }
    }

    pub fn date_cell(&self) -> &CellValue {
        self.row.date_cell()
    }

    pub fn metric_cell(&self, metric: Metric) -> &CellValue {
        self.row.metric_cell(metric)
    }

    pub fn cell(&self, column: &str) -> &CellValue {
        self.row.cell(column)
    }
}

/// An inclusive range of calendar dates. A missing end is unbounded
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize)]
pub struct DateBound {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>
}

impl DateBound {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from: Some(from), to: Some(to) }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

impl Display for DateBound {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        fn write_end(f: &mut Formatter<'_>, end: Option<NaiveDate>) -> std::fmt::Result {
            match end {
                Some(date) => write!(f, "{}", date.format("%d/%m/%Y")),
                None => f.write_str("..")
            }
        }
        write_end(f, self.from)?;
        f.write_str(" - ")?;
        write_end(f, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn bound_is_inclusive() {
        let bound = DateBound::between(date(2024, 1, 1), date(2024, 1, 31));
        assert!(bound.contains(date(2024, 1, 1)));
        assert!(bound.contains(date(2024, 1, 31)));
        assert!(!bound.contains(date(2023, 12, 31)));
        assert!(!bound.contains(date(2024, 2, 1)));
    }

    #[test]
    fn open_bounds() {
        let bound = DateBound { from: None, to: Some(date(2024, 1, 1)) };
        assert!(bound.contains(date(1999, 1, 1)));
        assert!(!bound.contains(date(2024, 1, 2)));
        assert!(DateBound::unbounded().contains(date(2024, 6, 6)));
    }

    #[test]
    fn missing_cells_are_empty() {
        let row: RawRow = [("B", "1.1.2024")].into_iter().collect();
        assert_eq!(&CellValue::Empty, row.metric_cell(Metric::Calls));
        assert_eq!(&CellValue::from("1.1.2024"), row.date_cell());
    }

    #[test]
    fn number_text_form() {
        assert_eq!("45000", CellValue::Number(45000.0).as_text());
        assert_eq!("4.1", CellValue::Number(4.1).as_text());
        assert!(CellValue::from("   ").is_blank());
    }

    #[test]
    fn combined_totals() {
        let mut totals = MetricTotals { calls: 1, emails: 2, efilings: 3, fourth: 4 };
        assert_eq!(10, totals.combined());
        totals.accumulate(&MetricTotals { calls: 1, ..Default::default() });
        assert_eq!(2, totals[Metric::Calls]);
    }
}
